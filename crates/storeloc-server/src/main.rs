mod api;
mod middleware;

use std::sync::Arc;

use storeloc_db::StoreRepository;
use storeloc_geocode::{ZipResolver, ZippopotamClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = storeloc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting storeloc-server");

    let kv = storeloc_db::open_store(&config).await?;
    let geocoder =
        ZippopotamClient::with_base_url(config.geocoder_timeout_secs, &config.geocoder_base_url)?;
    let state = AppState {
        repo: StoreRepository::new(Arc::clone(&kv)),
        resolver: Arc::new(ZipResolver::new(Arc::new(geocoder), Arc::clone(&kv))),
        kv,
    };

    let auth = AuthState::from_env(config.is_development())?;
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
