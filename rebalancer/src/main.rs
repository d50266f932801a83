//! CLI entry point for the pvdot rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::info;

use pvdot_exchange::Exchange;
use pvdot_exchange::binance::BinanceExchange;
use pvdot_rebalancer::audit::AuditLog;
use pvdot_rebalancer::config::Config;
use pvdot_rebalancer::error::{Error, Result};
use pvdot_rebalancer::execution::{self, Runner};
use pvdot_rebalancer::target;

#[derive(Parser)]
#[command(name = "pvdot")]
#[command(about = "Periodic spot portfolio rebalancer")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single rebalance tick
    Run {
        /// Log the orders instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebalance at every interval close
    Watch {
        /// Log the orders instead of submitting them
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Check the exchange connection and print last prices
    Status,

    /// Print the balances the engine would use
    Balances,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let level = if config.strategy.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    let ticking = matches!(cli.command, Command::Run { .. } | Command::Watch { .. });
    if let Err(e) = dispatch(&config, cli.command) {
        if ticking && e.is_tick_fatal() {
            eprintln!("\nTick aborted: {e}");
            process::exit(2);
        }
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn connect(config: &Config) -> Result<BinanceExchange> {
    let ex = &config.exchange;
    let mut exchange = BinanceExchange::from_env(&ex.api_key_env, &ex.secret_key_env, ex.testnet)
        .map_err(|e| Error::Connection(e.to_string()))?;
    exchange
        .connect()
        .map_err(|e| Error::Connection(e.to_string()))?;
    info!(
        "connected to Binance {}",
        if ex.testnet { "testnet" } else { "mainnet" }
    );
    Ok(exchange)
}

fn runner(config: &Config, dry_run: bool) -> Result<Runner<BinanceExchange>> {
    let exchange = connect(config)?;
    let audit = AuditLog::open(&config.audit_path())?;
    let runner = Runner::new(config, exchange, target::from_config(config)?)?.with_audit(audit);
    Ok(if dry_run {
        runner.with_dry_run(true)
    } else {
        runner
    })
}

fn dispatch(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Run { dry_run } => {
            let summary = runner(config, dry_run)?.tick()?;
            println!(
                "{} generated, {} submitted, {} failed. Audit logged to {}",
                summary.generated,
                summary.submitted,
                summary.failed,
                config.audit_path().display()
            );
            Ok(())
        }
        Command::Watch { dry_run, ticks } => {
            let s = &config.strategy;
            info!(
                "watching {} every {} (window {}), threshold {}",
                config.symbols().join(","),
                s.interval,
                s.window,
                s.threshold
            );
            runner(config, dry_run)?.watch(s.interval, ticks)
        }
        Command::Status => execution::check_status(config, &connect(config)?),
        Command::Balances => execution::show_balances(config, &connect(config)?),
    }
}
