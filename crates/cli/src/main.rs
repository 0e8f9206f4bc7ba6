mod config_commands;
mod simulate_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chatbridge", about = "chatbridge: mirror a Slack channel and a Discord channel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides the default search in ./ and ~/.config/chatbridge/).
    #[arg(long, global = true, env = "CHATBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Replay a file of inbound events through a bridge wired to in-memory
    /// platforms and print every outbound call.
    Simulate {
        /// JSON-lines file, one inbound event per line.
        #[arg(long)]
        events: PathBuf,
        /// Print collected metrics in Prometheus text format afterwards.
        #[arg(long)]
        show_metrics: bool,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so simulate output on stdout stays clean.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "chatbridge starting");

    match cli.command {
        Commands::Check { verbose } => config_commands::check(cli.config.as_deref(), verbose),
        Commands::Simulate {
            events,
            show_metrics,
        } => simulate_commands::simulate(cli.config.as_deref(), &events, show_metrics).await,
    }
}
