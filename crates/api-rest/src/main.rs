//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when you want the REST server (with OpenAPI/Swagger UI) without
//! the workspace's `filedock-run` binary. Both read the same environment variables.

use filedock_core::config::{max_file_size_from_env_value, upload_dir_from_env_value};
use filedock_core::{CoreConfig, DEFAULT_REST_ADDR};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the filedock REST API server
///
/// # Environment Variables
/// - `FILEDOCK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `UPLOAD_PATH`: Upload directory (default: "uploads" under the working directory)
/// - `MAX_FILE_SIZE`: Request body limit in bytes (default: 100 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("filedock=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FILEDOCK_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let upload_dir =
        upload_dir_from_env_value(std::env::var("UPLOAD_PATH").ok(), &std::env::current_dir()?);
    let max_file_size = max_file_size_from_env_value(std::env::var("MAX_FILE_SIZE").ok())?;
    let cfg = Arc::new(CoreConfig::new(upload_dir, max_file_size)?);

    tracing::info!(
        "-- Starting filedock REST API on {} (uploads: {})",
        addr,
        cfg.upload_dir().display()
    );

    let app = api_rest::router(cfg);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
