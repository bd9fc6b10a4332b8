pub mod catalog;
pub mod client;
pub mod evaluation;
pub mod extract;
pub mod formatter;
pub mod prompt;

pub use crate::domain::model::{CourseEntry, Persona, Recommendation, RecommendationResult};
pub use crate::domain::ports::{ConfigProvider, Recommender, Storage};
pub use crate::utils::error::Result;
