// Route exports
pub mod ai;
pub mod lost;
pub mod matches;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::config::Settings;
use crate::core::{CoreError, DogMatcher, Matcher, PhotoAnalyzer, Prompts, VideoAnalyzer};
use crate::models::{ErrorResponse, ReconcileThresholds};
use crate::services::{CacheManager, OracleError, StoreError, Stores, VisionOracle};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub cache: Arc<CacheManager>,
    pub matcher: Matcher,
    pub oracle: Arc<dyn VisionOracle>,
    pub prompts: Arc<Prompts>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn dog_matcher(&self, thresholds: ReconcileThresholds) -> DogMatcher {
        let reconcile = &self.settings.reconcile;
        DogMatcher::new(self.oracle.clone(), self.prompts.lost_dog_match.clone())
            .with_thresholds(thresholds)
            .with_temperature(reconcile.temperature)
            .with_oracle_timeout(std::time::Duration::from_secs(reconcile.oracle_timeout_secs))
            .with_max_concurrent(reconcile.max_concurrent_comparisons)
    }

    pub fn photo_analyzer(&self) -> PhotoAnalyzer {
        PhotoAnalyzer::new(
            self.oracle.clone(),
            self.prompts.photo_analysis.clone(),
            self.settings.analysis.photo_temperature,
        )
    }

    pub fn video_analyzer(&self) -> VideoAnalyzer {
        VideoAnalyzer::new(
            self.oracle.clone(),
            self.prompts.video_behavior.clone(),
            self.settings.analysis.video_temperature,
        )
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(ai::configure)
            .configure(lost::configure),
    );
}

/// 400 response for a request that failed `validator` checks
pub(crate) fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Map an engine error onto the HTTP error body
pub(crate) fn core_error_response(context: &str, err: CoreError) -> HttpResponse {
    let (mut builder, status_code) = match &err {
        CoreError::Validation(_) | CoreError::MissingResource(_) => {
            (HttpResponse::BadRequest(), 400)
        }
        CoreError::NotFound(_) | CoreError::Store(StoreError::NotFound(_)) => {
            (HttpResponse::NotFound(), 404)
        }
        CoreError::Store(StoreError::Conflict(_)) => (HttpResponse::Conflict(), 409),
        CoreError::Oracle(OracleError::Timeout(_)) => (HttpResponse::GatewayTimeout(), 504),
        CoreError::Oracle(_) => (HttpResponse::BadGateway(), 502),
        CoreError::Store(_) => (HttpResponse::InternalServerError(), 500),
    };

    if status_code >= 500 {
        tracing::error!("{}: {}", context, err);
    } else {
        tracing::info!("{}: {}", context, err);
    }

    builder.json(ErrorResponse {
        error: context.to_string(),
        message: err.to_string(),
        status_code,
    })
}
