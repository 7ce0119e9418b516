pub mod discover;
pub mod inspect;

use std::path::PathBuf;

use camfleet_common::config::Config;
use camfleet_common::credentials::Credentials;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "camfleet")]
#[command(about = "Discover and manage a fleet of network cameras.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Username used to open device sessions
    #[arg(short, long, global = true, default_value = "")]
    pub username: String,

    /// Password used to open device sessions
    #[arg(short, long, global = true, default_value = "")]
    pub password: String,

    /// Print less; repeat to print only results
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// Seconds to wait for a discovery cycle to end
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,

    /// Delay between replayed discovery records, in milliseconds
    #[arg(long, global = true, default_value_t = 0)]
    pub pace_ms: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a discovery capture and list the resulting fleet
    #[command(alias = "d")]
    Discover { capture: PathBuf },
    /// Replay a discovery capture and show one device
    #[command(alias = "i")]
    Inspect { capture: PathBuf, endpoint: String },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            quiet: self.quiet,
            ..Config::default()
        }
        .with_credentials(Credentials::new(&self.username, &self.password))
    }
}
