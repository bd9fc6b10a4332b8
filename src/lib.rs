pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{AdvisorArgs, CliConfig, ResolvedSettings};

pub use config::{cli::LocalStorage, toml_config::AdvisorConfig};
pub use core::{
    client::RecommendationClient,
    evaluation::{EvaluationEngine, EvaluationSummary},
    formatter::format_message,
};
pub use domain::model::{CourseEntry, Persona, Recommendation, RecommendationResult};
pub use utils::error::{AdvisorError, Result};
