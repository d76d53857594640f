use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use http::{header, Method};
use std::net::SocketAddr;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod session_store;

mod models {
    pub mod user;
    pub mod session;
}

mod repositories {
    pub mod user;
}

mod services {
    pub mod auth;
}

mod handlers {
    pub mod auth;
    pub mod users;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let state = AppState::new(&config).await?;

    db::init_schema(&state.db).await?;
    tracing::info!("Database schema ready");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let public_routes = Router::new()
        .route("/", get(|| async { "It's alive!" }))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users", get(handlers::users::list_users))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_session,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors);

    let sweep_state = state.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            match sweep_state.sessions.sweep_expired().await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::info!("Expiry sweep purged {} sessions", purged);
                }
                Err(e) => {
                    tracing::error!("Expiry sweep failed: {}", e);
                }
            }
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
