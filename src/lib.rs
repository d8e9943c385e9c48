//! Essay Circle Backend - library for app logic and testing

pub mod analysis;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod tasks;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::{AppConfig, StorageBackend, DEV_MESSAGE_KEY};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::Stores;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("seeding failed: {0}")]
    Seed(#[from] AppError),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local frontend dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ]
        });

    // Cookies travel cross-origin, so origins must be explicit.
    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/essays",
            get(routes::essays::list_essays).post(routes::essays::create_essay),
        )
        .route(
            "/api/essays/batch-analyze",
            post(routes::essays::batch_analyze),
        )
        .route(
            "/api/essays/{id}",
            get(routes::essays::get_essay)
                .put(routes::essays::update_essay)
                .delete(routes::essays::delete_essay),
        )
        .route(
            "/api/essays/{id}/analyze",
            post(routes::essays::analyze_essay),
        )
        .route(
            "/api/essays/{id}/user-corrections",
            get(routes::essays::list_user_corrections)
                .post(routes::essays::create_user_correction),
        )
        .route("/api/essays/{id}/like", post(routes::essays::toggle_like))
        .route("/api/essays/{id}/likes", get(routes::essays::like_count))
        .route(
            "/api/essays/{id}/peer-reviews",
            get(routes::peer_reviews::list_for_essay).post(routes::peer_reviews::create),
        )
        .route(
            "/api/user-corrections/{id}/like",
            post(routes::essays::like_user_correction),
        )
        .route(
            "/api/peer-reviews/{id}",
            get(routes::peer_reviews::get).patch(routes::peer_reviews::update),
        )
        .route(
            "/api/peer-reviews/{id}/corrections",
            post(routes::peer_reviews::add_correction),
        )
        .route("/api/profile", post(routes::profiles::create_profile))
        .route(
            "/api/profile/{user_id}",
            get(routes::profiles::get_profile).put(routes::profiles::update_profile),
        )
        .route("/api/users", get(routes::profiles::list_users))
        .route(
            "/api/friendships",
            post(routes::friendships::create_friendship),
        )
        .route(
            "/api/friendships/{id}",
            get(routes::friendships::list_friendships).put(routes::friendships::update_friendship),
        )
        .route("/api/messages", post(routes::messages::send_message))
        .route("/api/messages/{id}", get(routes::messages::list_messages))
        .route(
            "/api/messages/{id}/read",
            patch(routes::messages::mark_read),
        )
        .route(
            "/api/inspirations",
            get(routes::inspirations::list_inspirations),
        )
        .route(
            "/api/inspirations/{id}",
            get(routes::inspirations::get_inspiration),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Pick and prepare the store backend named in the configuration.
async fn open_stores(config: &AppConfig) -> Result<Stores, StartupError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory stores; data is lost on restart");
            Ok(Stores::in_memory())
        }
        StorageBackend::Postgres => {
            let pool = db::init_pool(&config.db).await?;
            db::run_migrations(&pool).await?;
            Ok(Stores::postgres(pool))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards must live until the server exits or buffered log lines are lost.
    let _log_guards = logging::init(&logging::LogSettings::from_env());

    routes::health::init_start_time();

    let config = AppConfig::from_env();

    if config.is_production() && config.message_key == DEV_MESSAGE_KEY {
        return Err(StartupError::Config(
            "MESSAGE_ENCRYPTION_KEY must be set to a unique secret in production".to_string(),
        ));
    }

    let stores = open_stores(&config).await?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| StartupError::Config(format!("invalid HOST/PORT: {e}")))?;
    let seed = config.seed_inspirations;

    let state = AppState::new(config, stores);
    if seed {
        state.inspirations.seed_if_empty().await?;
    }

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_app(AppState::in_memory());
        let res = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = create_app(AppState::in_memory());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let app = create_app(AppState::in_memory());
        let res = app
            .oneshot(
                Request::post("/api/essays")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"t","content":"c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
