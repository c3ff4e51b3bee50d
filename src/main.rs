use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use signsrv::ca::CaIdentity;
use signsrv::config::Settings;
use signsrv::error::SignError;
use signsrv::service::SigningService;
use signsrv::{http, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing();
    let settings = Settings::parse();

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), SignError> {
    // Without CA material there is nothing to serve.
    let ca = CaIdentity::load(&settings.ca_paths())?;
    let policy = settings.validity_policy()?;
    let node_name = settings.resolved_node_name();

    info!(
        ceiling_days = policy.ceiling_days(),
        output_format = ?settings.output_format,
        node = %node_name,
        "signing policy configured"
    );

    let service = Arc::new(SigningService::new(
        ca,
        policy,
        settings.output_format,
        node_name,
    ));
    let router = http::create_router(service);

    let addr = settings.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SignError::StartupFailure(format!("failed to bind {addr}: {e}")))?;

    info!("listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SignError::StartupFailure(format!("server error: {e}")))?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
