use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use anilist_client::AniListClient;
use gemini_client::GeminiClient;
use roastd_core::config::Config;
use roastd_core::RoastService;

mod routes;

use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roastd=info".parse()?))
        .init();

    let config = Config::from_env();

    let anilist = Arc::new(AniListClient::new());
    let gemini = Arc::new(GeminiClient::new(&config.gemini_api_key, &config.gemini_model));

    let service = RoastService::new(anilist.clone(), anilist.clone(), gemini);

    let state = Arc::new(AppState {
        service,
        anilist,
        rate_limiter: Mutex::new(HashMap::new()),
    });

    let app = routes::router(state, &config);

    let addr = format!("{}:{}", config.host, config.port);
    info!(model = %config.gemini_model, "roastd starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
