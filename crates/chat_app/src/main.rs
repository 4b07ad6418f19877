mod cli;
mod platform;

use anyhow::Context;
use chat_engine::EngineConfig;
use clap::Parser;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    chat_logging::initialize(cli.log_destination(), cli.log_level())
        .context("initializing logging")?;

    let mut config = EngineConfig::from_env().context("reading CHAT_* environment")?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    platform::run_app(config)
}
