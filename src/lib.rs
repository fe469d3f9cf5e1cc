pub mod clients;
pub mod collector;
pub mod config;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod executor;
pub mod index;
pub mod model;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod utils;

pub use config::AppConfig;
pub use engine::{ReconcileEngine, RunContext, RunSettings, RunSummary};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
