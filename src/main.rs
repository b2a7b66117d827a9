//! Binary entry point: configuration, logging and the HTTP server

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use campus_graphql::config::Config;
use campus_graphql::schema::{build_schema, Services};
use campus_graphql::server::{build_router, GRAPHQL_PATH};
use campus_graphql::store::InMemoryStore;
use campus_graphql::token::TokenKeys;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_tracing(config.as_ref().is_ok_and(|c| c.json_logs));
    let config = config?;

    let store = Arc::new(InMemoryStore::new());
    let services = Services::new(store, TokenKeys::from_secret(&config.jwt_secret));
    let schema = build_schema(services.clone());
    let router = build_router(schema, services);

    let listener = tokio::net::TcpListener::bind(config.listen_on()).await?;
    let addr = listener.local_addr()?;
    info!("graphql server listening on http://{addr}{GRAPHQL_PATH}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
