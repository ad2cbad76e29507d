use anyhow::Context;
use chefia::{
    cache::RecipeCache,
    config::Config,
    gemini::GeminiClient,
    http::{self, AppState},
    service::RecipeService,
    store::SupabaseStore,
};
use chefia_auth::Auth;
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(environment = %config.environment, "Configuration loaded");

    let http_client = Client::new();

    let generator = GeminiClient::new(config.gemini.clone())?;
    let store = SupabaseStore::new(&config.supabase, http_client.clone());
    let verifier = Auth::new(&config.supabase.url, &config.supabase.anon_key, http_client);

    let service = RecipeService::new(
        Arc::new(generator),
        RecipeCache::new(config.cache.clone()),
        Arc::new(store),
    );
    let state = AppState::new(service, Arc::new(verifier), &config);
    let app = http::app(state, &config);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server running on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
