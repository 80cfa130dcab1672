use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use donor_match::config::{LogFormat, Settings};
use donor_match::core::Matcher;
use donor_match::routes::{self, matches::AppState};
use donor_match::services::{AddressResolver, DisabledResolver, NominatimResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

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

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Text => subscriber.init(),
    }
}

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| io_error(format!("Configuration error: {}", e)))?;

    init_logging(&settings.logging.level, settings.logging.format);

    info!("Starting donor matching service...");

    let policy = settings.matching.scoring_policy().map_err(|e| {
        error!("Invalid scoring policy: {}", e);
        io_error(format!("Invalid scoring policy: {}", e))
    })?;

    let matcher = Matcher::new(policy)
        .and_then(|m| m.with_constraints(settings.matching.constraints()))
        .map_err(|e| io_error(format!("Invalid matching settings: {}", e)))?;

    info!(
        "Matcher initialized with policy {:?} and constraints {:?}",
        matcher.policy(),
        matcher.constraints()
    );

    let geocoding = &settings.geocoding;
    let resolver: Arc<dyn AddressResolver> = if geocoding.enabled {
        let cache_capacity = geocoding.cache_capacity.unwrap_or(1024);
        let cache_ttl = geocoding.cache_ttl_secs.unwrap_or(24 * 60 * 60);
        let resolver = NominatimResolver::new(
            geocoding.endpoint.clone(),
            geocoding.user_agent.clone(),
            Duration::from_secs(geocoding.timeout_secs.unwrap_or(10)),
            cache_capacity,
            Duration::from_secs(cache_ttl),
        )
        .map_err(|e| io_error(format!("Failed to build geocoding client: {}", e)))?;
        info!(
            "Geocoding via {} (cache: {} entries, TTL: {}s)",
            geocoding.endpoint, cache_capacity, cache_ttl
        );
        Arc::new(resolver)
    } else {
        warn!("Geocoding disabled - records without stored coordinates will be skipped");
        Arc::new(DisabledResolver)
    };

    let app_state = AppState { matcher, resolver };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let json_limit = settings.server.json_limit_bytes;

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(
                web::JsonConfig::default()
                    .limit(json_limit)
                    .error_handler(handle_json_payload_error),
            )
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
