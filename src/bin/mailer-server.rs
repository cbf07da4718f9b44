use anyhow::Result;
use mailer_api::Application;
use mailer_metrics::TracingService;
use mailer_models::Config;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    TracingService::init().map_err(|e| anyhow::anyhow!(e))?;

    info!("Starting Mailer Service");

    let config = Config::load()?;
    info!(
        bind = %config.server.bind,
        port = config.server.port,
        db_url = %config.data.db_url,
        workers = config.delivery.workers,
        "Configuration loaded"
    );

    let app = Application::build(config.clone()).await?;
    let listener = TcpListener::bind(config.bind_addr()).await?;

    app.run(listener, shutdown_signal()).await?;

    info!("Mailer Service stopped");
    Ok(())
}
