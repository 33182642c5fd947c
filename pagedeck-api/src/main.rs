use anyhow::Context;
use pagedeck_api::{app_with_config, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagedeck_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let bind_addr = config.bind_addr;
    info!(
        "Compressor: {} (timeout {:?}), staging in {}",
        config.ghostscript.program.display(),
        config.ghostscript.timeout,
        config.temp_dir().display()
    );

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("pagedeck API listening on http://{}", bind_addr);

    axum::serve(listener, app_with_config(config)).await?;
    Ok(())
}
