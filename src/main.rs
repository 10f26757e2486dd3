use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blindfold_engine::engines::engine_facade::{BlindfoldEngine, EngineConfig};
use blindfold_engine::uci::uci_top::run_stdio_loop;

#[derive(Parser)]
#[command(name = "blindfold-engine")]
#[command(about = "UCI chess engine that plays at a chosen rating level")]
struct Args {
    /// Level key to start with (see the `levels` command)
    #[arg(short, long, default_value = "intermediate")]
    level: String,

    /// Seed for reproducible move choices
    #[arg(short, long)]
    seed: Option<u64>,

    /// Answer immediately instead of simulating think time
    #[arg(long)]
    instant: bool,

    /// Log filter, e.g. `debug` or `blindfold_engine=trace` (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter '{directives}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if args.instant {
        EngineConfig::instant()
    } else {
        EngineConfig::default()
    };
    config.seed = args.seed;

    let engine = BlindfoldEngine::with_config(config);
    engine
        .initialize()
        .await
        .context("failed to initialize engine")?;
    run_stdio_loop(engine, &args.level)
        .await
        .context("UCI loop failed")?;
    Ok(())
}
