//! Logsage - watch log files and get AI-generated fix suggestions for new
//! errors.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logsage::ai::Summarizer;
use logsage::capture::{CaptureLayer, ErrorInterceptor};
use logsage::config::{Config, ConfigLoader};
use logsage::display;
use logsage::pipeline::{PipelineEvent, WatchMode, WatchPipeline};
use logsage::sink::ConsoleSink;

#[derive(Parser)]
#[command(
    name = "logsage",
    about = "Watch log files and get AI-generated fix suggestions for new errors",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (default: .logsage.toml, then
    /// ~/.config/logsage/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch an existing log file for newly appended errors.
    Watch {
        /// The log file to watch.
        file: PathBuf,
        /// Seconds between checks (overrides config).
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Capture this process's own error channels into a scratch file and
    /// watch that.
    Capture {
        /// Capture file path (default: a scratch file in the temp directory).
        #[arg(long)]
        file: Option<PathBuf>,
        /// Seconds between checks (overrides config).
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

fn init_tracing(verbosity: u8, capture: Option<CaptureLayer>) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(fmt::layer()).with(filter);
    match capture {
        Some(layer) => registry.with(layer).init(),
        None => registry.init(),
    }
}

fn default_capture_path() -> PathBuf {
    std::env::temp_dir().join("logsage-capture.log")
}

fn load_config(path: Option<PathBuf>) -> Config {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config);

    match cli.command {
        Commands::Watch { file, interval } => {
            init_tracing(cli.verbose, None);
            run(file, interval, &config, WatchMode::Watch, None).await;
        }
        Commands::Capture { file, interval } => {
            let path = file.unwrap_or_else(default_capture_path);
            let mut interceptor = ErrorInterceptor::new(path.clone());
            if let Err(e) = interceptor.install() {
                display::print_error(&format!("Cannot install error capture: {e}"));
                std::process::exit(1);
            }
            init_tracing(cli.verbose, Some(interceptor.layer()));
            run(path, interval, &config, WatchMode::Capture, Some(interceptor)).await;
        }
    }
}

async fn run(
    file: PathBuf,
    interval: Option<u64>,
    config: &Config,
    mode: WatchMode,
    interceptor: Option<ErrorInterceptor>,
) {
    let summarizer = match Summarizer::from_config(&config.ai, config.retry) {
        Ok(s) => s,
        Err(e) => {
            display::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let interval = Duration::from_secs(interval.unwrap_or(config.watch.interval_secs));
    tracing::info!(
        path = %file.display(),
        interval_secs = interval.as_secs(),
        mode = ?mode,
        "Starting logsage"
    );

    let pipeline = WatchPipeline::new(
        file,
        Box::new(summarizer),
        Box::new(ConsoleSink::new()),
        mode,
        interval,
        config.watch.file_wait(),
    );
    let (handle, mut events) = pipeline.spawn();

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
    });

    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::AwaitingFile(path) => display::print_awaiting(&path),
            PipelineEvent::NewContent {
                lines,
                range_start,
                range_end,
            } => display::print_new_content(lines, range_end - range_start),
            // The console sink already printed the summary itself.
            PipelineEvent::SummaryReady(_) => {}
            PipelineEvent::Rotated(path) => display::print_rotation(&path),
            PipelineEvent::CycleFailed(reason) => display::print_cycle_failed(&reason),
            PipelineEvent::Stopped => {
                display::print_stopped();
                break;
            }
        }
    }

    handle.stop().await;

    if let Some(mut interceptor) = interceptor {
        interceptor.uninstall();
    }
}
