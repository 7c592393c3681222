mod bootstrap_helpers;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use wutbot_cli::{load_env_file, BotConfig, Cli, ENV_FILE_NAME};
use wutbot_connection::connect_and_run;

use crate::bootstrap_helpers::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let env_loaded = load_env_file(Path::new(ENV_FILE_NAME))?;
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = BotConfig::from_cli(&cli)?;
    if !config.owner.is_configured() {
        tracing::warn!("owner account is not configured; owner commands are disabled");
    }
    tracing::info!(
        nick = %config.connection.nick,
        server = %config.connection.server,
        channels = ?config.channels,
        sasl = config.connection.sasl.is_some(),
        concurrency_limit = config.concurrency_limit,
        env_file = env_loaded,
        user_agent = %config.user_agent,
        "starting wutbot"
    );

    let router = Arc::new(config.build_router()?);
    connect_and_run(&config.connection, router)
        .await
        .with_context(|| format!("irc session with {} failed", config.connection.server))
}
