//! Command-line interface for the chat client.
//!
//! Flags override the `CHAT_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use chat_engine::EngineConfig;
use chat_logging::LogDestination;
use clap::Parser;
use log::LevelFilter;

/// chat-client - send messages and follow their processing status
#[derive(Parser, Debug)]
#[command(name = "chat-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// User id sent with every request
    #[arg(long, value_name = "ID")]
    pub user_id: Option<String>,

    /// Delay between status queries in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Status queries per message before giving up
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Log file path
    #[arg(long, value_name = "PATH", default_value = "chat_client.log")]
    pub log_file: PathBuf,

    /// Mirror log output to the terminal
    #[arg(long)]
    pub log_to_terminal: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(user_id) = &self.user_id {
            config.user_id = user_id.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll.interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.max_attempts {
            config.poll.max_attempts = attempts;
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        if self.log_to_terminal {
            LogDestination::Both(self.log_file.clone())
        } else {
            LogDestination::File(self.log_file.clone())
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
