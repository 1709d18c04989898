//! Sensor Replay - windowed classifier training and paced prediction replay.
//!
//! This library trains a binary classifier on time-windowed slices of a
//! tabular sensor dataset and replays a held-out window as a live-looking
//! stream of per-row predictions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Sensor Replay                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Dataset   │──▶│  Timeline   │──▶│   Trainer   │       │
//! │  │    (CSV)    │   │ (windowing) │   │ (two kinds) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │   Replay    │◀────────────────────│    Model    │       │
//! │  │  (SSE feed) │                     │  Artifact   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trainer and the replay simulator never call each other; the persisted
//! model artifact is their only connection. A retrain overwrites the artifact
//! wholesale, while a replay already in flight keeps the model it loaded.
//!
//! # Example
//!
//! ```no_run
//! use sensor_replay::data::{Dataset, Window};
//! use sensor_replay::model::BackendKind;
//! use sensor_replay::train::{train, TrainWindows};
//!
//! let dataset = Dataset::from_csv_path(std::path::Path::new("dataset.csv"))?;
//! let windows = TrainWindows {
//!     train: Window::parse("2021-01-01T00:00:00", "2021-01-01T00:10:00")?,
//!     test: Window::parse("2021-01-01T00:10:01", "2021-01-01T00:20:00")?,
//! };
//! let report = train(
//!     &dataset,
//!     &windows,
//!     BackendKind::BoostedTrees,
//!     std::path::Path::new("model.json"),
//! )?;
//! println!("accuracy {}", report.accuracy);
//! # Ok::<(), sensor_replay::PipelineError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod replay;
pub mod server;
pub mod train;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use data::{ensure_timestamp, Dataset, TimedDataset, Value, Window};
pub use error::PipelineError;
pub use model::{BackendKind, Classifier, ModelArtifact, TrainedModel};
pub use replay::{PredictionEvent, Replay};
pub use train::{train, EvaluationReport, TrainWindows};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
