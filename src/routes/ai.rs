use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{merge_candidates, CoreError};
use crate::models::{
    AnalyzePhotoRequest, AnalyzeVideoRequest, MatchLostDogRequest, MatchLostDogResponse,
    NotificationsQuery, PhotoAnalysis, StrayDogReport, StrayReportRequest, StrayReportView,
};
use crate::routes::{core_error_response, validation_failed, AppState};

/// Configure vision-oracle routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai")
            .route("/analyze-photo", web::post().to(analyze_photo))
            .route("/analyze-video", web::post().to(analyze_video))
            .route("/stray-reports", web::post().to(upsert_stray_report))
            .route("/stray-reports", web::get().to(list_stray_reports))
            .route("/match-lost-dog", web::post().to(match_lost_dog))
            .route("/notifications", web::get().to(list_notifications)),
    );
}

async fn ensure_pet_exists(state: &AppState, pet_id: &str) -> Result<(), CoreError> {
    match state.stores.pets.get_pet(pet_id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound(format!("Pet not found: {}", pet_id))),
    }
}

/// Tag a pet photo and store the tags on the pet
///
/// POST /api/v1/ai/analyze-photo
async fn analyze_photo(
    state: web::Data<AppState>,
    req: web::Json<AnalyzePhotoRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let result = tag_photo(&state, &req).await;

    match result {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => core_error_response("Photo analysis failed", e),
    }
}

async fn tag_photo(
    state: &AppState,
    req: &AnalyzePhotoRequest,
) -> Result<PhotoAnalysis, CoreError> {
    let image = req.image()?;
    ensure_pet_exists(state, &req.pet_id).await?;
    state
        .photo_analyzer()
        .analyze_and_persist(&req.pet_id, &image, state.stores.pets.as_ref())
        .await
}

/// Score a pet video and append the result to its dynamic info
///
/// POST /api/v1/ai/analyze-video
async fn analyze_video(
    state: web::Data<AppState>,
    req: web::Json<AnalyzeVideoRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    if let Err(e) = ensure_pet_exists(&state, &req.pet_id).await {
        return core_error_response("Video analysis failed", e);
    }

    match state
        .video_analyzer()
        .analyze_and_persist(&req.pet_id, &req.video_path, state.stores.pets.as_ref())
        .await
    {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => core_error_response("Video analysis failed", e),
    }
}

/// POST /api/v1/ai/stray-reports
async fn upsert_stray_report(
    state: web::Data<AppState>,
    req: web::Json<StrayReportRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let report = match req.into_inner().into_report() {
        Ok(report) => report,
        Err(e) => return core_error_response("Invalid stray report", e.into()),
    };

    match state.stores.strays.upsert_report(&report).await {
        Ok(()) => {
            tracing::info!("Stored stray report {}", report.report_id);
            HttpResponse::Ok().json(StrayReportView::from(&report))
        }
        Err(e) => core_error_response("Failed to store stray report", e.into()),
    }
}

/// GET /api/v1/ai/stray-reports
async fn list_stray_reports(state: web::Data<AppState>) -> impl Responder {
    match state.stores.strays.list_reports().await {
        Ok(reports) => {
            let views: Vec<StrayReportView> = reports.iter().map(StrayReportView::from).collect();
            HttpResponse::Ok().json(views)
        }
        Err(e) => core_error_response("Failed to list stray reports", e.into()),
    }
}

/// Reconcile a lost-dog notice against stray reports
///
/// POST /api/v1/ai/match-lost-dog
///
/// Candidates are the stored reports (unless `useStoredReports` is false)
/// merged with `candidateReports` by report id, inline entries winning.
/// Threshold fields override the configured defaults for this call only.
async fn match_lost_dog(
    state: web::Data<AppState>,
    req: web::Json<MatchLostDogRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let result = reconcile_request(&state, &req).await;

    match result {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => core_error_response("Lost-dog reconciliation failed", e),
    }
}

async fn reconcile_request(
    state: &AppState,
    req: &MatchLostDogRequest,
) -> Result<MatchLostDogResponse, CoreError> {
    let notice = req.notice()?;

    let stored = if req.use_stored_reports {
        state.stores.strays.list_reports().await?
    } else {
        Vec::new()
    };
    let inline = req
        .candidate_reports
        .iter()
        .cloned()
        .map(StrayReportRequest::into_report)
        .collect::<Result<Vec<StrayDogReport>, _>>()?;
    let candidates = merge_candidates(stored, inline);

    let mut thresholds = state.settings.reconcile.thresholds();
    if let Some(value) = req.similarity_threshold {
        thresholds.similarity_threshold = value;
    }
    if let Some(value) = req.max_distance_km {
        thresholds.max_distance_km = value;
    }
    if let Some(value) = req.max_time_gap_hours {
        thresholds.max_time_gap_hours = value;
    }

    tracing::info!(
        "Reconciling lost-dog notice against {} candidate reports",
        candidates.len()
    );

    let outcome = state
        .dog_matcher(thresholds)
        .reconcile(
            &notice,
            &candidates,
            req.owner_id.as_deref(),
            Some(state.stores.notifications.as_ref()),
        )
        .await?;

    Ok(MatchLostDogResponse {
        outcome,
        candidate_count: candidates.len(),
    })
}

/// GET /api/v1/ai/notifications?ownerId={ownerId}
async fn list_notifications(
    state: web::Data<AppState>,
    query: web::Query<NotificationsQuery>,
) -> impl Responder {
    match state
        .stores
        .notifications
        .list_notifications(query.owner_id.as_deref())
        .await
    {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(e) => core_error_response("Failed to list notifications", e.into()),
    }
}
