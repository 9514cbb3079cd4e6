use anyhow::Context;

use unitrack_infra::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    unitrack_observability::init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let app = unitrack_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
