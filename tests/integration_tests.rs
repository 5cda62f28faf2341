// Integration tests for PawMatch

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pawmatch::config::Settings;
use pawmatch::core::{record_swipe, DogMatcher, Matcher, Prompts};
use pawmatch::models::{
    GeoPoint, ImageRef, LostDogNotice, PetProfile, ReconcileOutcome, SizeClass, StrayDogReport,
    SwipeDecision,
};
use pawmatch::routes::{configure_routes, AppState};
use pawmatch::services::{
    CacheManager, GenerationOptions, JsonObject, MediaPart, MemoryStore, MockOracle,
    NotificationSink, OracleError, PetStore, Stores, SwipeStore, VisionOracle,
};

/// Reports the first byte of the second image as the similarity score
#[derive(Default)]
struct ByteOracle {
    calls: AtomicUsize,
}

#[async_trait]
impl VisionOracle for ByteOracle {
    async fn generate_json(
        &self,
        _prompt: &str,
        parts: &[MediaPart],
        _options: &GenerationOptions,
    ) -> Result<JsonObject, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let score = match parts.get(1) {
            Some(MediaPart::Inline { data, .. }) => data.first().copied().unwrap_or(0),
            _ => 0,
        };
        let value = json!({"similarity_score": score, "is_match": false});
        Ok(value.as_object().cloned().unwrap_or_default())
    }

    async fn upload_video(&self, _path: &Path) -> Result<MediaPart, OracleError> {
        Err(OracleError::Upload("not supported".to_string()))
    }
}

fn lost_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap()
}

fn notice() -> LostDogNotice {
    LostDogNotice {
        image: ImageRef::Inline(vec![0]),
        lost_at: Some(lost_at()),
        location: Some(GeoPoint { latitude: 1.0, longitude: 1.0 }),
    }
}

fn sighting(id: &str, similarity: u8, lat: f64, lon: f64, hours_after: i64) -> StrayDogReport {
    StrayDogReport {
        report_id: id.to_string(),
        image: ImageRef::Inline(vec![similarity]),
        reported_at: Some(lost_at() + Duration::hours(hours_after)),
        location: Some(GeoPoint { latitude: lat, longitude: lon }),
    }
}

fn create_pet(pet_id: &str, owner_id: &str) -> PetProfile {
    PetProfile {
        pet_id: pet_id.to_string(),
        owner_id: owner_id.to_string(),
        name: pet_id.to_string(),
        size: SizeClass::Medium,
        age_months: 18,
        vaccinated: true,
        neutered: false,
        sociability: 70.0,
        playfulness: 80.0,
        emotional_stability: 60.0,
        activity_level: 75.0,
        ai_tags: None,
        created_at: None,
    }
}

#[tokio::test]
async fn test_reconcile_filters_far_report_and_notifies_owner() {
    let oracle = Arc::new(ByteOracle::default());
    let matcher = DogMatcher::new(oracle.clone(), "compare".to_string());
    let store = MemoryStore::new();

    let candidates = vec![
        sighting("A", 95, 1.001, 1.001, 1),
        sighting("B", 99, 10.0, 10.0, 1),
    ];

    let outcome = matcher
        .reconcile(&notice(), &candidates, Some("owner-1"), Some(&store))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome {
            is_match: true,
            similarity_score: 95.0,
            matched_report_ids: vec!["A".to_string()],
        }
    );
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);

    let notifications = store.list_notifications(Some("owner-1")).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].matched_report_ids, vec!["A".to_string()]);
}

#[tokio::test]
async fn test_reconcile_never_matches_outside_time_window() {
    let oracle = Arc::new(ByteOracle::default());
    let matcher = DogMatcher::new(oracle.clone(), "compare".to_string());

    let candidates = vec![
        sighting("late", 99, 1.0, 1.0, 73),
        sighting("early", 99, 1.0, 1.0, -100),
    ];

    let outcome = matcher.reconcile(&notice(), &candidates, None, None).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::no_match());
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reconcile_empty_candidates_skips_oracle() {
    let oracle = Arc::new(ByteOracle::default());
    let matcher = DogMatcher::new(oracle.clone(), "compare".to_string());
    let store = MemoryStore::new();

    let outcome = matcher
        .reconcile(&notice(), &[], Some("owner-1"), Some(&store))
        .await
        .unwrap();

    assert!(!outcome.is_match);
    assert_eq!(outcome.similarity_score, 0.0);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    assert!(store.list_notifications(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_score_is_max_over_evaluated_candidates_only() {
    let oracle = Arc::new(ByteOracle::default());
    let matcher = DogMatcher::new(oracle, "compare".to_string());

    let candidates = vec![
        sighting("low", 40, 1.0, 1.0, 2),
        sighting("filtered", 99, 1.0, 1.0, 200),
        sighting("mid", 65, 1.0, 1.0, 3),
    ];

    let outcome = matcher.reconcile(&notice(), &candidates, None, None).await.unwrap();

    assert!(!outcome.is_match);
    assert_eq!(outcome.similarity_score, 65.0);
    assert!(outcome.matched_report_ids.is_empty());
}

#[tokio::test]
async fn test_concurrent_mutual_likes_create_one_match() {
    let store = MemoryStore::new();
    store.create_pet(&create_pet("rex", "alice")).await.unwrap();
    store.create_pet(&create_pet("luna", "bob")).await.unwrap();

    record_swipe(&store, &store, "rex", "luna", SwipeDecision::Like).await.unwrap();

    let (first, second) = tokio::join!(
        record_swipe(&store, &store, "luna", "rex", SwipeDecision::Like),
        record_swipe(&store, &store, "luna", "rex", SwipeDecision::Like),
    );

    let matched = [first.unwrap(), second.unwrap()]
        .iter()
        .filter(|outcome| outcome.matched)
        .count();
    assert_eq!(matched, 1);
    assert_eq!(store.list_matches("rex").await.unwrap().len(), 1);
}

fn app_state() -> AppState {
    AppState {
        stores: Stores::from_backend(Arc::new(MemoryStore::new()), "memory"),
        cache: Arc::new(CacheManager::local(100, 60)),
        matcher: Matcher::new(50),
        oracle: Arc::new(MockOracle::new()),
        prompts: Arc::new(Prompts::builtin()),
        settings: Arc::new(Settings::default()),
    }
}

#[actix_web::test]
async fn test_health_endpoint_reports_backend() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_stray_report_with_same_photo_notifies_owner() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    // "hello" in base64
    let photo = "aGVsbG8=";

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/stray-reports")
        .set_json(json!({
            "reportId": "stray-1",
            "imageBase64": photo,
            "location": {"latitude": 1.0005, "longitude": 1.0005}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/match-lost-dog")
        .set_json(json!({
            "ownerId": "owner-7",
            "noticeImageBase64": photo,
            "location": {"latitude": 1.0, "longitude": 1.0}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["isMatch"], true);
    assert_eq!(body["similarityScore"], 95.0);
    assert_eq!(body["matchedReportIds"], json!(["stray-1"]));
    assert_eq!(body["candidateCount"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/ai/notifications?ownerId=owner-7")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["matchedReportIds"], json!(["stray-1"]));
}

#[actix_web::test]
async fn test_match_lost_dog_rejects_ambiguous_image() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/match-lost-dog")
        .set_json(json!({
            "ownerId": "owner-7",
            "noticeImageBase64": "aGVsbG8=",
            "noticeImagePath": "/tmp/lost.jpg"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn test_swipe_flow_over_http() {
    let state = app_state();
    state.stores.pets.create_pet(&create_pet("rex", "alice")).await.unwrap();
    state.stores.pets.create_pet(&create_pet("luna", "bob")).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?petId=rex")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"][0]["petId"], "luna");

    for (pet, target) in [("rex", "luna"), ("luna", "rex")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/swipe")
            .set_json(json!({"petId": pet, "targetPetId": target, "action": "like"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["match"], pet == "luna");
    }

    // the swipe invalidated the cached deck
    let req = test::TestRequest::get()
        .uri("/api/v1/matches?petId=rex")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"], json!([]));

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .set_json(json!({"petId": "rex", "targetPetId": "luna", "action": "superlike"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
