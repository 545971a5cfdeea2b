mod stats;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use pressure::{Coordinator, MemoryCeiling, Mode, RedisStore, RunConfig, RunReport, StoreAddress};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Redis host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Redis port
    #[arg(long, default_value_t = 6379)]
    port: u16,

    /// Redis password
    #[arg(long, env = "MEMFILL_PASS", default_value = "", hide_env_values = true)]
    pass: String,

    /// Redis database number
    #[arg(long, default_value_t = 0)]
    db: i64,

    /// Whether to run get or set commands
    #[arg(long, default_value = "get")]
    mode: String,

    /// Number of parallel workers
    #[arg(long, default_value_t = 100)]
    workers: usize,

    /// Length of generated values
    #[arg(long, default_value_t = 50_000)]
    length: usize,

    /// Max memory in Mo (0 for unlimited)
    #[arg(long, default_value_t = 0)]
    max: u64,

    /// Prefix to append to keys
    #[arg(long, default_value = "")]
    prefix: String,

    /// Seed for generated values and keys
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            address: StoreAddress {
                host: self.host,
                port: self.port,
                pass: self.pass,
                db: self.db,
            },
            mode: Mode::from(self.mode.as_str()),
            workers: self.workers,
            length: self.length,
            ceiling: MemoryCeiling::from_megabytes(self.max),
            prefix: self.prefix,
            seed: self.seed,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(config: RunConfig) -> Result<RunReport, Box<dyn std::error::Error>> {
    config.validate()?;

    tracing::info!("Connecting to store at {}", config.address);
    let store = RedisStore::connect(&config.address).await?;

    let coordinator = Coordinator::new(Arc::new(store), config);
    let signal = coordinator.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping workers");
            signal.trip();
        }
    });

    let report = coordinator.run().await?;
    stats::log_summary(&report);

    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.into_config()).await {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
