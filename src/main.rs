mod gemini;
mod media;
mod models;
mod prompts;
mod routes;
mod schema;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::gemini::{GatewayConfig, GeminiClient};
use crate::routes::{app, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = GatewayConfig::from_env();
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; every generation call will fail");
    }
    let state = AppState {
        store: Arc::default(),
        gemini: Arc::new(GeminiClient::new(config)),
    };

    let router = app(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting server");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), router).await.unwrap();
}
