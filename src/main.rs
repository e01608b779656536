use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paydebit::application::debit::DebitService;
use paydebit::config::Config;
use paydebit::infrastructure::open_store;
use paydebit::interfaces::http::{self, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .into_diagnostic()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    // The store handle is built once and shared by every request.
    let store = open_store(&config).await.into_diagnostic()?;
    let service = DebitService::new(store, config.retry_policy());
    let state = AppState::new(service, config.echo_invalid_payload);

    let listener = TcpListener::bind(config.bind).await.into_diagnostic()?;
    tracing::info!(addr = %config.bind, route = http::PAY_ROUTE, "listening");

    http::serve(listener, state, shutdown_signal())
        .await
        .into_diagnostic()?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
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
}
