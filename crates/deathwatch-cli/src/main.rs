mod prompt;
mod render;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Crate targets enabled by `--debug`. Dependencies stay at `warn`.
const DEBUG_FILTER: &str = "warn,deathwatch=debug,deathwatch_transport=debug,\
    deathwatch_protocol=debug,deathwatch_session=debug,deathwatch_watch=debug,\
    deathwatch_tick=debug";

#[derive(Parser, Debug)]
#[command(
    name = "deathwatch",
    version,
    about = "Log into the Tibia account portal and watch a character for new deaths"
)]
pub(crate) struct Cli {
    /// Account email (prompted when missing)
    #[arg(long, env = "DEATHWATCH_EMAIL", global = true)]
    email: Option<String>,
    /// Account password (prompted when missing)
    #[arg(long, env = "DEATHWATCH_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    /// Character to watch; omit to choose from the account's characters
    #[arg(long, short, global = true)]
    character: Option<String>,
    /// Seconds between polls
    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=3600),
        global = true
    )]
    interval: u64,
    /// Report every poll whose newest death is dated today, instead of
    /// only deaths not seen before
    #[arg(long, global = true)]
    same_day: bool,
    /// Print diagnostic logs to stderr
    #[arg(long, global = true)]
    debug: bool,
    /// Save every fetched page into this directory
    #[arg(long, global = true)]
    dump_dir: Option<PathBuf>,
    /// Portal origin
    #[arg(
        long,
        env = "DEATHWATCH_BASE_URL",
        default_value = "https://www.tibia.com",
        global = true
    )]
    base_url: String,
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// List the characters on the account
    Roster,
    /// Show a character's deaths once
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a character's deaths, then poll for new ones
    Watch {
        /// Start watching without asking
        #[arg(long, short)]
        yes: bool,
    },
}

/// `RUST_LOG` wins; otherwise `--debug` enables this workspace's logs.
/// `None` means no subscriber is installed.
fn log_filter(debug: bool) -> Option<tracing_subscriber::EnvFilter> {
    let level = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => v,
        _ if debug => DEBUG_FILTER.to_string(),
        _ => return None,
    };
    Some(
        tracing_subscriber::EnvFilter::try_new(level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEBUG_FILTER)),
    )
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let Some(filter) = log_filter(debug) else {
        return;
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
