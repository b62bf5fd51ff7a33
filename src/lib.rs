//! sleepcalc - Deterministic sleep duration and sleep-stage chart computation
//!
//! sleepcalc turns a bed time and a wake time into the numbers a sleep tracker
//! shows: `HH:MM` parsing → duration calculation (with overnight wraparound)
//! → stage chart samples.
//!
//! ## Modules
//!
//! - **Core**: `duration` and `stages`, pure functions over clock times
//! - **Records**: `record` and `history`, submitted entries and the queries
//!   behind listings, charts and goal progress
//! - **Surfaces**: `pipeline` (JSON in/out), `ffi` (C ABI) and the `sleepcalc` CLI

pub mod duration;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod record;
pub mod stages;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use duration::{compute_duration, DurationCalculator};
pub use error::ComputeError;
pub use history::{DateRange, SleepLog, SleepSummary};
pub use pipeline::{sleep_report, sleep_report_json, SleepProcessor, SleepReport};
pub use record::{SleepEntry, SleepRecord};
pub use stages::{estimate_stages, StageConfig, StageEstimator, StageSamples};
pub use types::{SleepDuration, SleepInterval, SleepStage, StageSample, TimeOfDay};

/// Library version reported by the CLI and the C ABI
pub const SLEEPCALC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by diagnostics
pub const PRODUCER_NAME: &str = "sleepcalc";
