//! Serve command implementation
//!
//! Runs a small echo service wrapped by [`log_exchange`], which makes it easy
//! to see what the logger emits for real traffic.

use crate::cli::ServeArgs;
use crate::config::{ConfigError, LogFormat, VeilConfig};
use crate::exchange::{log_exchange, HttpLogger};
use crate::logging::LogContext;
use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{any, get},
    Extension, Router,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load a config file if it exists (defaults otherwise), then apply `VEIL_*`
/// environment overrides.
pub fn load_config_file(path: &Path) -> Result<VeilConfig, ConfigError> {
    let config = if path.exists() {
        VeilConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        VeilConfig::default()
    };
    Ok(config.with_env_overrides())
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &ServeArgs) -> Result<VeilConfig, ConfigError> {
    let mut config = load_config_file(&args.config)?;

    // CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.log_level().bypasses_redaction() {
        eprintln!("WARNING: Log level is debug. Redaction is disabled; masked fields stay masked.");
        eprintln!("         Credentials will appear in logs. Use only for local troubleshooting.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Hard cap on request bodies accepted by the echo service (10MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Echo service behind the exchange logger.
///
/// - `GET /health` answers `ok` (ignored by the default config)
/// - any method on `/echo` returns the request body with its content type
/// - `GET /whoami` returns the log id assigned to the request
pub fn build_router(logger: Arc<HttpLogger>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/echo", any(echo))
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(logger, log_exchange))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body)
}

async fn whoami(Extension(ctx): Extension<LogContext>) -> impl IntoResponse {
    axum::Json(serde_json::json!({ "log_id": ctx.log_id() }))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
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
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!("Starting veil echo server");
    tracing::debug!(?config, "Loaded configuration");
    for key in config.policy().overlapping_keys() {
        tracing::warn!(key, "Field is both redacted and masked; redaction wins");
    }

    // 3. Build the logger and router
    let logger = Arc::new(HttpLogger::from_config(&config));
    let app = build_router(logger);

    // 4. Bind and serve
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "veil listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    tracing::info!("veil stopped");
    Ok(())
}
