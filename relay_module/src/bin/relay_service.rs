use std::sync::Mutex;

use tracing::info;

use relay_module::service::{run_server, ServiceConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = ServiceConfig::from_env()?;
    run_server(config, shutdown_signal()).await?;
    info!("relay service stopped");
    Ok(())
}

fn init_tracing() -> Result<(), BoxError> {
    match std::env::var("RELAY_LOG_FILE").ok().filter(|v| !v.trim().is_empty()) {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_target(false).init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("interrupt received; shutting down"),
        _ = terminate => info!("termination signal received; shutting down"),
    }
}
