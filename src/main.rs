//! Line server binary entry point.
//!
//! Parses the configuration, builds the index of the served file and starts serving. Any error
//! of the served file ends the process with a non-zero exit code.

use anyhow::{Context, Result};
use indexed_line_server::{server, LineService, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_args();
    if let Err(err) = config.validate() {
        tracing::error!("Invalid configuration: {}", err);
        return Err(err.into());
    }

    tracing::info!(
        "Configuration loaded: file={:?}, bind={}, sample distance={}, line ending={:?}",
        config.file,
        config.bind,
        config.sample_distance,
        config.line_ending
    );

    // Lookups are only served once preprocessing is complete
    let service = match LineService::open(&config.file, &config.index_config()).await {
        Ok(service) => service,
        Err(err) => {
            tracing::error!("Preprocessing of {} failed: {}", config.file.display(), err);
            return Err(err)
                .with_context(|| format!("failed to preprocess {}", config.file.display()));
        }
    };

    if let Err(err) = server::run(service, config.bind).await {
        tracing::error!("Line server stopped: {}", err);
        return Err(err.into());
    }

    Ok(())
}
