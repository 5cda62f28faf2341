use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pawmatch::config::{Settings, StorageBackend};
use pawmatch::core::{Matcher, Prompts};
use pawmatch::routes::{self, AppState};
use pawmatch::services::{
    CacheManager, GeminiClient, MemoryStore, MockOracle, PostgresClient, Stores, VisionOracle,
};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_stores(settings: &Settings) -> std::io::Result<Stores> {
    match settings.storage.backend {
        StorageBackend::Postgres => {
            let client = PostgresClient::from_settings(&settings.database)
                .await
                .map_err(|e| {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections
            );
            Ok(Stores::from_backend(Arc::new(client), "postgres"))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Ok(Stores::from_backend(Arc::new(MemoryStore::new()), "memory"))
        }
    }
}

async fn build_cache(settings: &Settings) -> CacheManager {
    let cache = &settings.cache;
    if !cache.enabled {
        info!("Redis cache disabled, using in-process cache only");
        return CacheManager::local(cache.l1_cache_size, cache.ttl_secs);
    }

    match CacheManager::new(&cache.redis_url, cache.l1_cache_size, cache.ttl_secs).await {
        Ok(c) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                cache.l1_cache_size, cache.ttl_secs
            );
            c
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), running with in-process cache only", e);
            CacheManager::local(cache.l1_cache_size, cache.ttl_secs)
        }
    }
}

fn build_oracle(settings: &Settings) -> std::io::Result<Arc<dyn VisionOracle>> {
    let gemini = &settings.gemini;
    let has_key = gemini
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());

    if gemini.mock_mode || !has_key {
        if !gemini.mock_mode {
            warn!("No Gemini API key configured, falling back to the offline oracle");
        }
        info!("Vision oracle: offline mock");
        return Ok(Arc::new(MockOracle::new()));
    }

    let client = GeminiClient::from_settings(gemini).map_err(|e| {
        error!("Failed to initialize Gemini client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    info!(
        "Vision oracle: Gemini (image: {}, video: {})",
        gemini.image_model, gemini.video_model
    );
    Ok(Arc::new(client))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings);

    info!("Starting PawMatch service...");

    let stores = build_stores(&settings).await?;
    let cache = Arc::new(build_cache(&settings).await);
    let oracle = build_oracle(&settings)?;

    let prompts = Prompts::load(settings.analysis.prompts_dir.as_deref()).map_err(|e| {
        error!("Failed to load prompts: {}", e);
        std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())
    })?;

    let matcher = Matcher::new(settings.matching.max_limit);

    info!(
        "Reconciliation thresholds: {:?}",
        settings.reconcile.thresholds()
    );

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    // Build application state
    let app_state = AppState {
        stores,
        cache,
        matcher,
        oracle,
        prompts: Arc::new(prompts),
        settings: Arc::new(settings),
    };

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
