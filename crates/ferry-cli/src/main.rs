use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ferry_core::FerryError;
use ferry_core::app::AppBuilder;
use ferry_core::config::FerryConfig;
use ferry_core::queue::{JsonQueueStore, QueueStore};
use tracing::{error, info};

mod logging;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(version, about = "Copy finished instrument raw files to a remote archive", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "FERRY_CONFIG", default_value = "ferry.toml", global = true)]
    config: PathBuf,

    /// Write JSON log lines to this file instead of stderr
    #[arg(long, env = "FERRY_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the instrument log and transfer closed files
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Print queue counts as JSON
    Status,
}

/// Values that take precedence over the configuration file.
#[derive(Args)]
struct Overrides {
    /// orbitrap-velos, q-exactive or custom
    #[arg(long, env = "FERRY_INSTRUMENT", global = true)]
    instrument: Option<String>,

    #[arg(long, env = "FERRY_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, env = "FERRY_QUEUE_FILE", global = true)]
    queue_file: Option<PathBuf>,

    #[arg(long, env = "FERRY_POLL_INTERVAL_SECS", global = true)]
    poll_interval_secs: Option<u64>,

    #[arg(long, env = "FERRY_RETENTION_DAYS", global = true)]
    retention_days: Option<u32>,

    #[arg(long, env = "FERRY_COPY_TOOL", global = true)]
    copy_tool: Option<PathBuf>,

    #[arg(long, env = "FERRY_IDENTITY_FILE", global = true)]
    identity_file: Option<PathBuf>,

    #[arg(long, env = "FERRY_REMOTE_USER", global = true)]
    remote_user: Option<String>,

    #[arg(long, env = "FERRY_REMOTE_HOST", global = true)]
    remote_host: Option<String>,

    #[arg(long, env = "FERRY_REMOTE_DIR", global = true)]
    remote_dir: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut FerryConfig) {
        if let Some(v) = self.instrument {
            config.instrument = v;
        }
        if let Some(v) = self.log_dir {
            config.log_dir = v;
        }
        if let Some(v) = self.queue_file {
            config.queue_file = v;
        }
        if let Some(v) = self.poll_interval_secs {
            config.poll_interval_secs = v;
        }
        if let Some(v) = self.retention_days {
            config.retention_days = Some(v);
        }
        if let Some(v) = self.copy_tool {
            config.copy_tool = v;
        }
        if let Some(v) = self.identity_file {
            config.identity_file = v;
        }
        if let Some(v) = self.remote_user {
            config.remote.user = v;
        }
        if let Some(v) = self.remote_host {
            config.remote.host = v;
        }
        if let Some(v) = self.remote_dir {
            config.remote.directory = v;
        }
    }
}

fn load_config(path: &Path, overrides: Overrides) -> Result<FerryConfig, FerryError> {
    let mut config = FerryConfig::from_file(path)?;
    overrides.apply(&mut config);
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), FerryError> {
    let config = load_config(&cli.config, cli.overrides)?;

    match cli.command {
        Command::Run { once } => {
            let poll = AppBuilder::new(config).build()?;
            if once {
                let report = poll.run_cycle().await?;
                info!(report = %serde_json::to_string(&report).unwrap_or_default(), "single cycle done");
                Ok(())
            } else {
                poll.run().await
            }
        }
        Command::Status => {
            let queue = JsonQueueStore::new(config.queue_file).load()?;
            let counts = serde_json::to_string_pretty(&queue.counts())
                .map_err(|e| FerryError::Config(format!("cannot render counts: {e}")))?;
            println!("{counts}");
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ferry stopped");
            ExitCode::FAILURE
        }
    }
}
