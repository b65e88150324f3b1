use clap::Parser;
use tracing::{error, info, warn};

use cooked::assets::AssetStore;
use cooked::config::Config;
use cooked::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::parse();
    if let Err(err) = cfg.validate() {
        eprintln!("cooked: {err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cooked=info".parse()?),
        )
        .init();

    if cfg.tls_skip_verify {
        warn!("TLS certificate verification disabled for upstream fetches");
    }

    info!(
        listen = %cfg.listen,
        cache_ttl = %humantime::format_duration(cfg.cache_ttl),
        cache_max_size = cfg.cache_max_size,
        fetch_timeout = %humantime::format_duration(cfg.fetch_timeout),
        max_file_size = cfg.max_file_size,
        allowed_upstreams = %cfg.allowed_upstreams,
        default_theme = %cfg.default_theme,
        tls_skip_verify = cfg.tls_skip_verify,
        "config loaded"
    );

    let listen = cfg.listen.clone();
    let app = server::build(cfg, AssetStore::embedded())
        .inspect_err(|e| error!(error = %e, "failed to build server"))?;

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .inspect_err(|e| error!(error = %e, listen = %listen, "listen failed"))?;

    info!(listen = %listen, version = cooked::VERSION, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| error!(error = %e, "shutdown error"))?;

    info!("shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutting down");
}
