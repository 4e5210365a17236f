use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod analytics;
mod channel_input;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod youtube_client;

use config::AppConfig;
use youtube_client::YouTubeClient;

// Shared by every handler through `Extension<Arc<AppState>>`
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub youtube: YouTubeClient,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Configuration - YouTube API: {}, Google OAuth: {}, secure cookies: {}",
        if config.youtube_api_key.is_some() { "✅" } else { "❌" },
        if config.google_credentials().is_some() { "✅" } else { "❌" },
        config.cookie_secure
    );

    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    let youtube = YouTubeClient::new(reqwest::Client::new(), config.youtube_api_key.clone());
    if !youtube.is_configured() {
        tracing::warn!("YOUTUBE_API_KEY not found. Channel lookups will return 503.");
    }

    let cors = match HeaderValue::from_str(&config.frontend_url) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(e) => {
            tracing::error!("FRONTEND_URL is not a valid origin: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    let shared_state = Arc::new(AppState {
        db_pool,
        youtube,
        config,
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/test-db", get(db_status))
        .route("/test/db-status", get(db_status))
        .merge(handlers::auth::auth_routes())
        .merge(handlers::users::user_routes())
        .merge(handlers::videos::video_routes())
        .merge(handlers::youtube::youtube_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(cors)
        .layer(Extension(shared_state));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on 0.0.0.0:{}", port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,channel_hub=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,channel_hub=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::info!("📺 Channel hub starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Channel hub backend is running" }))
}

async fn db_status(Extension(state): Extension<Arc<AppState>>) -> Response {
    match db::ping(&state.db_pool).await {
        Ok(()) => Json(json!({
            "status": "Connected",
            "message": "Database connection is healthy",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "Disconnected",
                    "message": "Database connection failed",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
