use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use crate::core::{filter_lost_for_map, filter_stray_for_map, MapWindow};
use crate::models::{
    CreateLostPostingRequest, ErrorResponse, GeoPoint, LostDogPosting, MapQuery, PostingStatus,
    StrayReportView, UpdateStatusQuery,
};
use crate::routes::{core_error_response, validation_failed, AppState};

/// Configure lost-dog posting and map routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/lost-dogs", web::post().to(create_posting))
        .route("/lost-dogs", web::get().to(list_postings))
        .route("/lost-dogs/{posting_id}/status", web::patch().to(update_status))
        .route("/map/stray", web::get().to(map_stray))
        .route("/map/lost", web::get().to(map_lost));
}

/// POST /api/v1/lost-dogs
async fn create_posting(
    state: web::Data<AppState>,
    req: web::Json<CreateLostPostingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let req = req.into_inner();
    let now = Utc::now();
    let posting = LostDogPosting {
        id: uuid::Uuid::new_v4().to_string(),
        breed: req.breed,
        description: req.description,
        lost_at: req.lost_at.unwrap_or(now),
        location: req.location.map(GeoPoint::from),
        address: req.address,
        contact: req.contact,
        photo_path: req.photo_path,
        status: PostingStatus::Pending,
        created_at: now,
    };

    match state.stores.lost.create_posting(&posting).await {
        Ok(()) => {
            tracing::info!("Published lost-dog posting {}", posting.id);
            HttpResponse::Created().json(posting)
        }
        Err(e) => core_error_response("Failed to create posting", e.into()),
    }
}

/// GET /api/v1/lost-dogs
async fn list_postings(state: web::Data<AppState>) -> impl Responder {
    match state.stores.lost.list_postings().await {
        Ok(postings) => HttpResponse::Ok().json(postings),
        Err(e) => core_error_response("Failed to list postings", e.into()),
    }
}

/// PATCH /api/v1/lost-dogs/{posting_id}/status?status=pending|found
async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<UpdateStatusQuery>,
) -> impl Responder {
    let posting_id = path.into_inner();

    let Some(status) = PostingStatus::parse(&query.status) else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid status".to_string(),
            message: "Status must be one of: pending, found".to_string(),
            status_code: 400,
        });
    };

    match state.stores.lost.update_status(&posting_id, status).await {
        Ok(Some(posting)) => {
            tracing::info!("Posting {} marked {}", posting_id, status.as_str());
            HttpResponse::Ok().json(posting)
        }
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Posting not found".to_string(),
            message: format!("No lost-dog posting with id {}", posting_id),
            status_code: 404,
        }),
        Err(e) => core_error_response("Failed to update posting", e.into()),
    }
}

fn window(query: &MapQuery) -> MapWindow {
    MapWindow::new(query.lat, query.lng, query.radius, query.days, Utc::now())
}

/// Stray reports within the radius (metres) and/or the last `days` days
///
/// GET /api/v1/map/stray?lat=&lng=&radius=&days=
async fn map_stray(state: web::Data<AppState>, query: web::Query<MapQuery>) -> impl Responder {
    let reports = match state.stores.strays.list_reports().await {
        Ok(reports) => reports,
        Err(e) => return core_error_response("Failed to list stray reports", e.into()),
    };

    let visible: Vec<StrayReportView> = filter_stray_for_map(&reports, &window(&query))
        .into_iter()
        .map(StrayReportView::from)
        .collect();

    HttpResponse::Ok().json(visible)
}

/// Lost postings still pending, within the radius and/or the last `days` days
///
/// GET /api/v1/map/lost?lat=&lng=&radius=&days=
async fn map_lost(state: web::Data<AppState>, query: web::Query<MapQuery>) -> impl Responder {
    let postings = match state.stores.lost.list_postings().await {
        Ok(postings) => postings,
        Err(e) => return core_error_response("Failed to list postings", e.into()),
    };

    let visible = filter_lost_for_map(&postings, &window(&query));
    HttpResponse::Ok().json(visible)
}
