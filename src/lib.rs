pub mod config;
pub mod error;
pub mod data;
pub mod model;
pub mod eval;

pub use config::{Config, EvalConfig};
pub use error::{EvalError, Result};
pub use eval::{EvalResults, Evaluator, MetricSummary, OnlineReport, Protocol};
pub use model::Recommender;
