mod api;
mod middleware;

use std::sync::Arc;

use kaitori_places::PlacesClient;
use kaitori_resolver::DemographicsService;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::QuotaGuard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = kaitori_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting kaitori-server");

    let demographics = Arc::new(DemographicsService::from_config(&config)?);
    let places = config
        .google_maps_api_key
        .as_deref()
        .map(|key| PlacesClient::new(key, config.http_timeout_secs))
        .transpose()?
        .map(Arc::new);
    if places.is_none() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; supermarket search disabled");
    }

    let quota = QuotaGuard::per_minute(config.rate_limit_per_minute);
    if quota.is_none() {
        tracing::warn!("KAITORI_RATE_LIMIT_PER_MINUTE is 0; upstream quota guard disabled");
    }
    let app = build_app(
        AppState {
            demographics,
            places,
        },
        quota,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
