use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};

use http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chirp::config::Config;
use chirp::handlers;
use chirp::middleware_layer;
use chirp::state::AppState;

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
    tracing::info!("Configuration loaded successfully");

    let state = AppState::new(&config)?;
    tracing::info!("AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(86400));

    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        // Logout extracts its own bearer token: a second logout with a
        // revoked token must succeed, which the auth gate would prevent.
        .route("/api/auth/logout", post(handlers::auth::logout))
        .layer(tower_governor::GovernorLayer::new(auth_governor_conf))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/api/users/{username}", get(handlers::users::get_user))
        .route(
            "/api/users/{username}/tweets",
            get(handlers::tweets::list_user_tweets),
        )
        .route(
            "/api/users/{username}/followers",
            get(handlers::follows::followers),
        )
        .route(
            "/api/users/{username}/following",
            get(handlers::follows::following),
        )
        .route("/api/tweets/{tweet_id}", get(handlers::tweets::get_tweet))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users/me", get(handlers::users::me))
        .route("/api/tweets", post(handlers::tweets::create_tweet))
        .route(
            "/api/tweets/{tweet_id}",
            delete(handlers::tweets::delete_tweet),
        )
        .route("/api/timeline", get(handlers::tweets::timeline))
        .route(
            "/api/users/{username}/follow",
            post(handlers::follows::follow_user),
        )
        .route(
            "/api/users/{username}/follow",
            delete(handlers::follows::unfollow_user),
        )
        .route_layer(from_fn_with_state(
            state.sessions.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route(
            "/api/admin/users/{user_id}",
            delete(handlers::admin::deactivate_user),
        )
        .route(
            "/api/admin/tweets/{tweet_id}",
            delete(handlers::admin::delete_any_tweet),
        )
        .route_layer(from_fn(middleware_layer::auth::require_admin))
        .route_layer(from_fn_with_state(
            state.sessions.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors);

    // The revocation ledger only grows with logouts of not-yet-expired
    // tokens; an hourly delete of expired entries keeps it bounded.
    let sweep_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            tracing::info!("Running scheduled sweep of expired revocation entries...");
            match sweep_state.sessions.sweep_expired().await {
                Ok(removed) => {
                    tracing::info!("Sweep completed, removed {} entries", removed);
                }
                Err(e) => {
                    tracing::error!("Sweep failed: {}", e);
                }
            }
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
