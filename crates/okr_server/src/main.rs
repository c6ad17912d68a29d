use anyhow::{anyhow, Context, Result};
use log::info;
use okr_core::db::{open_db, open_db_in_memory};
use okr_server::generator::generator_from_url;
use okr_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env().context("failed to read server configuration")?;

    let log_dir = config
        .log_dir
        .to_str()
        .ok_or_else(|| anyhow!("log directory is not valid UTF-8"))?;
    okr_core::init_logging(&config.log_level, log_dir).map_err(|err| anyhow!(err))?;

    let conn = match &config.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .context("failed to open OKR database")?;

    let generator = generator_from_url(config.generator_url.as_deref(), config.generator_timeout)
        .context("failed to build OKR generator client")?;

    let app = build_router(AppState::new(conn, generator));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        "event=server_start module=server status=ok bind={} persistent_db={} generator_configured={}",
        config.bind_addr,
        config.db_path.is_some(),
        config.generator_url.is_some()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
