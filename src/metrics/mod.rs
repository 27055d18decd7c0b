//! Run directories and training loggers.
//!
//! - [`ConsoleLogger`]: column-aligned console output
//! - [`CsvLogger`]: CSV file for offline analysis
//! - [`MultiLogger`]: fan out to several backends
//! - [`create_run_dir`]: timestamped run directory with `params.json`

pub mod logger;
pub mod run_dir;

pub use logger::{ConsoleLogger, CsvLogger, MetricsLogger, MultiLogger, TrainingSnapshot};
pub use run_dir::{create_run_dir, write_params};
