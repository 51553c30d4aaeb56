use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollbooth::auth::SupabaseIdentity;
use tollbooth::config::Config;
use tollbooth::handlers;
use tollbooth::payments::CreemClient;
use tollbooth::state::AppState;
use tollbooth::store::SupabaseStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tollbooth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.supabase_url.is_empty() {
        tracing::warn!("SUPABASE_URL is not set; store and auth calls will fail");
    }

    // Browser calls come from the frontend origin only; webhooks are
    // server-to-server and unaffected by CORS.
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_base_url
                .parse::<HeaderValue>()
                .expect("FRONTEND_BASE_URL must be a valid origin"),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let state = AppState {
        store: Arc::new(SupabaseStore::new(&config)),
        checkout: Arc::new(CreemClient::new(&config)),
        identity: Arc::new(SupabaseIdentity::new(&config)),
        webhook_secret: config.creem_webhook_secret.clone(),
        frontend_base_url: config.frontend_base_url.clone(),
    };

    let app = handlers::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Tollbooth server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
