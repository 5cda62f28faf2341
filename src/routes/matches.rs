use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{list_matches, record_swipe, CoreError};
use crate::models::{
    CreatePetRequest, ErrorResponse, FindCandidatesQuery, FindCandidatesResponse, HealthResponse,
    PetQuery, SwipeDecision, SwipeRequest, SwipeResponse,
};
use crate::routes::{core_error_response, validation_failed, AppState};
use crate::services::CacheKey;

/// Configure pet, ranking and swipe routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/pets", web::post().to(create_pet))
        .route("/pets/{pet_id}", web::get().to(get_pet))
        .route("/matches", web::get().to(find_candidates))
        .route("/matches/list", web::get().to(get_matches))
        .route("/swipe", web::post().to(swipe));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.stores.pets.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.stores.backend.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Register a pet
///
/// POST /api/v1/pets
async fn create_pet(
    state: web::Data<AppState>,
    req: web::Json<CreatePetRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let pet = req.into_inner().into_profile(uuid::Uuid::new_v4().to_string());

    match state.stores.pets.create_pet(&pet).await {
        Ok(()) => {
            tracing::info!("Registered pet {} for owner {}", pet.pet_id, pet.owner_id);
            HttpResponse::Created().json(pet)
        }
        Err(e) => core_error_response("Failed to create pet", e.into()),
    }
}

/// GET /api/v1/pets/{pet_id}
async fn get_pet(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let pet_id = path.into_inner();

    match state.stores.pets.get_pet(&pet_id).await {
        Ok(Some(pet)) => HttpResponse::Ok().json(pet),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Pet not found".to_string(),
            message: format!("No pet with id {}", pet_id),
            status_code: 404,
        }),
        Err(e) => core_error_response("Failed to fetch pet", e.into()),
    }
}

/// Ranked swipe candidates
///
/// GET /api/v1/matches?petId={petId}&limit={limit}
///
/// Cached per pet and limit until the pet swipes again.
async fn find_candidates(
    state: web::Data<AppState>,
    query: web::Query<FindCandidatesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for find_candidates: {:?}", errors);
        return validation_failed(errors);
    }

    let pet_id = &query.pet_id;
    let limit = query
        .limit
        .map(usize::from)
        .unwrap_or(state.settings.matching.default_limit)
        .clamp(1, state.matcher.max_limit());

    let cache_key = CacheKey::candidates(pet_id, limit);
    match state.cache.get::<FindCandidatesResponse>(&cache_key).await {
        Ok(Some(cached)) => {
            tracing::debug!("Serving candidates for {} from cache", pet_id);
            return HttpResponse::Ok().json(cached);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Candidate cache lookup failed for {}: {}", pet_id, e),
    }

    let focal = match state.stores.pets.get_pet(pet_id).await {
        Ok(Some(pet)) => pet,
        Ok(None) => {
            return core_error_response(
                "Pet not found",
                CoreError::NotFound(format!("Pet not found: {}", pet_id)),
            )
        }
        Err(e) => return core_error_response("Failed to fetch pet", e.into()),
    };

    let swiped = match state.stores.swipes.swiped_target_ids(pet_id).await {
        Ok(ids) => ids,
        Err(e) => return core_error_response("Failed to fetch swipe history", e.into()),
    };

    let candidates = match state
        .stores
        .pets
        .list_candidates(&swiped, &focal.owner_id)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => return core_error_response("Failed to query candidates", e.into()),
    };

    let result = state.matcher.rank(&focal, candidates, &swiped, limit);
    let response = FindCandidatesResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache candidates for {}: {}", pet_id, e);
    }

    tracing::info!(
        "Returning {} candidates for pet {} (from {} in pool)",
        response.matches.len(),
        pet_id,
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// Record a swipe
///
/// POST /api/v1/swipe
///
/// Request body:
/// ```json
/// {
///   "petId": "string",
///   "targetPetId": "string",
///   "action": "like|pass"
/// }
/// ```
async fn swipe(state: web::Data<AppState>, req: web::Json<SwipeRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let Some(decision) = SwipeDecision::parse(&req.action) else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid action".to_string(),
            message: "Action must be one of: like, pass".to_string(),
            status_code: 400,
        });
    };

    let outcome = match record_swipe(
        state.stores.pets.as_ref(),
        state.stores.swipes.as_ref(),
        &req.pet_id,
        &req.target_pet_id,
        decision,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => return core_error_response("Failed to record swipe", e),
    };

    if let Err(e) = state
        .cache
        .invalidate_prefix(&CacheKey::candidates_prefix(&req.pet_id))
        .await
    {
        tracing::warn!("Failed to invalidate cache: {}", e);
    }

    let message = if outcome.matched {
        "It's a match!"
    } else {
        "Swipe recorded"
    };

    HttpResponse::Ok().json(SwipeResponse {
        matched: outcome.matched,
        match_id: outcome.match_id,
        message: message.to_string(),
    })
}

/// GET /api/v1/matches/list?petId={petId}
async fn get_matches(state: web::Data<AppState>, query: web::Query<PetQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    match list_matches(
        state.stores.pets.as_ref(),
        state.stores.swipes.as_ref(),
        &query.pet_id,
    )
    .await
    {
        Ok(matches) => HttpResponse::Ok().json(serde_json::json!({
            "petId": query.pet_id,
            "matches": matches,
            "count": matches.len(),
        })),
        Err(e) => core_error_response("Failed to list matches", e),
    }
}
