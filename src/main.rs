use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filedock_core::config::{max_file_size_from_env_value, upload_dir_from_env_value};
use filedock_core::{CoreConfig, DEFAULT_REST_ADDR};

/// Main entry point for the filedock server
///
/// Resolves configuration once, makes sure the upload directory exists and serves the REST
/// API until interrupted.
///
/// # Environment Variables
/// - `FILEDOCK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `UPLOAD_PATH`: Upload directory, relative to the working directory unless absolute
///   (default: "uploads")
/// - `MAX_FILE_SIZE`: Request body limit in bytes (default: 104857600)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedock=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("FILEDOCK_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let upload_dir =
        upload_dir_from_env_value(std::env::var("UPLOAD_PATH").ok(), &std::env::current_dir()?);
    let max_file_size = max_file_size_from_env_value(std::env::var("MAX_FILE_SIZE").ok())?;
    let cfg = Arc::new(CoreConfig::new(upload_dir, max_file_size)?);

    if let Err(e) = std::fs::create_dir_all(cfg.upload_dir()) {
        anyhow::bail!(
            "Upload directory cannot be created: {} ({})",
            cfg.upload_dir().display(),
            e
        );
    }

    tracing::info!("++ Starting filedock REST on {}", rest_addr);
    tracing::info!("++ Upload directory: {}", cfg.upload_dir().display());
    tracing::info!("++ Max file size: {} bytes", cfg.max_file_size());

    let app = api_rest::router(cfg);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("-- Shutting down");
            }
        })
        .await?;

    Ok(())
}
