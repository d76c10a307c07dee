use crate::sink::telegram::Telegram;
use crate::source::ytdlp::Ytdlp;
use crate::state::AppState;
use crate::util::config::Config;
use crate::util::http::build_client;
use dotenv::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::main;
use tokio::net;
use tokio::signal;
use tracing::Level;
use tracing_subscriber::fmt;

mod constants;
mod middlewares;
mod models;
mod routes;
mod sink;
mod source;
mod state;
mod util;

#[main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match Config::new() {
        Ok(config) => config,
        Err(error) => {
            init_logger(Level::INFO);
            tracing::error!("Failed to load configuration: {}", error);
            return ExitCode::FAILURE;
        }
    };

    init_logger(config.log_level());

    let client = match build_client() {
        Ok(client) => client,
        Err(error) => {
            tracing::error!("Failed to create reqwest client: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let downloader = Ytdlp::new(&config.ytdlp);
    preflight(&downloader).await;

    let state = Arc::new(AppState::new(
        config.authorization(),
        Arc::new(downloader),
        Arc::new(Telegram::new(&config.telegram, client)),
        config.max_concurrent_jobs(),
    ));

    let app = routes::router(state);

    let listener = match net::TcpListener::bind((config.address(), config.port())).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(
                "Failed to bind {}:{}: {}",
                config.address(),
                config.port(),
                error
            );
            return ExitCode::FAILURE;
        }
    };

    if let Ok(address) = listener.local_addr() {
        tracing::info!("Server is bound to {}", address);
    }

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server stopped unexpectedly: {}", error);
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shut down");

    ExitCode::SUCCESS
}

fn init_logger(level: Level) {
    let subscriber = fmt()
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_target(true)
        .with_max_level(level)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Global logger was already set");
    }
}

/// Checks what the container image is expected to provide. Nothing here is
/// fatal; a missing binary shows up again as a failed job.
async fn preflight(downloader: &Ytdlp) {
    match downloader.version().await {
        Some(version) => tracing::info!("Found yt-dlp [Version: {}]", version),
        None => tracing::warn!("yt-dlp is not available, every download will fail"),
    }

    match downloader.cookies() {
        Some(path) if path.is_file() => {
            tracing::info!("Using cookies from {}", path.display())
        }
        Some(path) => tracing::warn!(
            "Cookies file {} does not exist, downloading without it",
            path.display()
        ),
        None => tracing::debug!("No cookies file configured"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", error);
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

    tracing::info!("Shutdown signal received, draining in-flight jobs");
}
