//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin,
//! applies them to a fresh application context, and writes responses and
//! state-change events to stdout.
//!
//! All tracing output goes to stderr so that stdout remains a clean JSON
//! protocol channel.

use eburon::AppConfig;
use eburon::AppContext;
use eburon::host::stdio::run_stdio_bridge;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "failed to load config");
        anyhow::anyhow!("eburon-host config: {e}")
    })?;

    tracing::info!("eburon-host starting");

    run_stdio_bridge(AppContext::new(&config))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "eburon-host exited with error");
            anyhow::anyhow!("eburon-host failed: {e}")
        })?;

    tracing::info!("eburon-host shut down cleanly");
    Ok(())
}
