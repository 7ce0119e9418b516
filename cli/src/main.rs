mod capture;
mod commands;
mod terminal;

use std::time::Duration;

use commands::{CommandLine, Commands, discover, inspect};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.quiet)?;

    let cfg = commands.config();
    let replay = capture::ReplayOptions {
        wait: Duration::from_secs(commands.timeout),
        pace: Duration::from_millis(commands.pace_ms),
    };

    let result = match commands.command {
        Commands::Discover { capture } => {
            print::header("discovering devices", cfg.quiet);
            discover::discover(&capture, &cfg, &replay).await
        }
        Commands::Inspect { capture, endpoint } => {
            print::header("inspecting device", cfg.quiet);
            inspect::inspect(&capture, &endpoint, &cfg, &replay).await
        }
    };

    print::end_of_program(cfg.quiet);
    result
}
