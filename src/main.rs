//! Sensor Replay CLI
//!
//! Windowed classifier training and paced prediction replay.

use clap::{Parser, Subcommand};
use sensor_replay::{
    config::Config,
    data::{Dataset, Window},
    model::BackendKind,
    server::{run, ServerConfig},
    train::{train, TrainWindows},
    VERSION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sensor-replay")]
#[command(version = VERSION)]
#[command(about = "Windowed classifier training and paced prediction replay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Dataset CSV path (overrides config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Model artifact path (overrides config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Classifier backend (boosted-trees or tree-ensemble)
        #[arg(long)]
        backend: Option<BackendKind>,
    },

    /// Train a model over explicit time windows and print the report
    Train {
        /// Training window start, e.g. 2021-01-01T00:00:00
        #[arg(long)]
        train_start: String,

        /// Training window end
        #[arg(long)]
        train_end: String,

        /// Test window start
        #[arg(long)]
        test_start: String,

        /// Test window end
        #[arg(long)]
        test_end: String,

        /// Dataset CSV path (overrides config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Model artifact path (overrides config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Classifier backend (boosted-trees or tree-ensemble)
        #[arg(long)]
        backend: Option<BackendKind>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            dataset,
            model,
            backend,
        } => cmd_serve(port, dataset, model, backend).await,
        Commands::Train {
            train_start,
            train_end,
            test_start,
            test_end,
            dataset,
            model,
            backend,
        } => cmd_train(
            &train_start,
            &train_end,
            &test_start,
            &test_end,
            dataset,
            model,
            backend,
        ),
        Commands::Config => cmd_config(),
    }
}

/// Resolve the pipeline config, applying CLI overrides on top of the file.
fn resolve_config(
    dataset: Option<PathBuf>,
    model: Option<PathBuf>,
    backend: Option<BackendKind>,
) -> Config {
    let mut config = Config::load().unwrap_or_default();
    if let Some(path) = dataset {
        config.dataset_path = path;
    }
    if let Some(path) = model {
        config.model_path = path;
    }
    if let Some(kind) = backend {
        config.backend = kind;
    }
    config
}

async fn cmd_serve(
    port: u16,
    dataset: Option<PathBuf>,
    model: Option<PathBuf>,
    backend: Option<BackendKind>,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor_replay=info".into()),
        )
        .init();

    let pipeline = resolve_config(dataset, model, backend);
    if let Err(e) = pipeline.ensure_directories() {
        eprintln!("Error preparing data directories: {e}");
        std::process::exit(1);
    }

    let (addr, shutdown_tx) = match run(ServerConfig::new(port, pipeline)).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Sensor replay server listening on http://{addr}");
    println!("Press Ctrl+C to stop.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for shutdown signal: {e}");
    }
    let _ = shutdown_tx.send(());
}

fn cmd_train(
    train_start: &str,
    train_end: &str,
    test_start: &str,
    test_end: &str,
    dataset: Option<PathBuf>,
    model: Option<PathBuf>,
    backend: Option<BackendKind>,
) {
    let config = resolve_config(dataset, model, backend);

    let windows = match parse_windows(train_start, train_end, test_start, test_end) {
        Ok(windows) => windows,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let data = match Dataset::from_csv_path(&config.dataset_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match train(&data, &windows, config.backend, &config.model_path) {
        Ok(report) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_else(|_| "Error".to_string())
            );
        }
        Err(e) => {
            eprintln!("Training failed: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_windows(
    train_start: &str,
    train_end: &str,
    test_start: &str,
    test_end: &str,
) -> Result<TrainWindows, sensor_replay::PipelineError> {
    Ok(TrainWindows {
        train: Window::parse(train_start, train_end)?,
        test: Window::parse(test_start, test_end)?,
    })
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
