//! Serve command implementation

use crate::api::RequestProcessor;
use crate::backend::create_generator;
use crate::cli::ServeArgs;
use crate::config::{BridgeportConfig, ConfigError, LogFormat, LoggingConfig};
use crate::server::Server;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
///
/// A missing config file is not an error; defaults are used instead.
pub fn load_config_with_overrides(args: &ServeArgs) -> Result<BridgeportConfig, ConfigError> {
    let mut config = if args.config.exists() {
        BridgeportConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        BridgeportConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref model_name) = args.model_name {
        config.api.model_name = model_name.clone();
    }
    if let Some(ref version) = args.api_version {
        config.api.version = version.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(kind) = args.backend {
        config.backend.kind = kind;
    }
    if let Some(ref url) = args.backend_url {
        config.backend.url = url.clone();
    }
    if let Some(ref model) = args.backend_model {
        config.backend.model = model.clone();
    }

    Ok(config.normalized())
}

/// Initialize tracing based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, events are also written there without ANSI colors, rotating by size,
/// from a background thread. The returned guard flushes that thread on drop.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter_str = crate::logging::build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file = crate::logging::file_writer(config).with_context(|| {
        let path = config.file.as_deref().unwrap_or(Path::new(""));
        format!("Failed to open log file {}", path.display())
    })?;
    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match config.format {
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(guard)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
///
/// Configuration errors are returned as [`ConfigError`] inside the `anyhow` chain so
/// the binary can pick its exit code.
pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    // 1. Load, merge and validate configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    let _log_guard = init_tracing(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting bridgeport");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Backend
    let generator =
        create_generator(&config.backend).context("Failed to create text-generation backend")?;
    tracing::info!(
        backend = generator.name(),
        url = %config.backend.url,
        model = %config.backend.model,
        "Backend configured"
    );

    // 4. Bind and serve
    let config = Arc::new(config);
    let processor = RequestProcessor::new(Arc::clone(&config), generator);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        base_path = processor.base_path(),
        model = %config.api.model_name,
        "bridgeport listening"
    );

    let server = Server::new(processor);
    let registry = server.registry();
    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    server.serve(listener, cancel_token).await;

    tracing::info!(live_connections = registry.len(), "bridgeport stopped");
    Ok(())
}
