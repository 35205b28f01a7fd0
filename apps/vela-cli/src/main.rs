mod commands;
mod obs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vela")]
#[command(about = "Vela technical-signal backtesting CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  vela backtest --config configs/sample.toml --out runs/\n  vela backtest --config configs/sample.toml --json\n  vela analyze --config configs/sample.toml --symbol AAPL\n"
)]
struct Cli {
    /// Log filter (overridden by VELA_LOG).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    /// Log format: text or json.
    #[arg(long, default_value = "text", global = true)]
    log_format: String,
    /// Expose Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run a backtest described by a TOML config and write its artifacts.
    Backtest {
        #[arg(long)]
        config: PathBuf,
        /// Output directory override.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the flat JSON summary instead of the text report.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the latest technical signals for one symbol.
    Analyze {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Print the flat JSON result instead of the signal table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let result = match cli.command {
        CliCommand::Backtest { config, out, json } => commands::backtest(config, out, json),
        CliCommand::Analyze {
            config,
            symbol,
            json,
        } => commands::analyze(config, symbol, json),
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
