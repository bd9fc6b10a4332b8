use crate::domain::model::CourseEntry;
use crate::utils::error::{AdvisorError, Result};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/course_catalog.json");

/// The eight MYCA courses shipped with the crate.
pub fn default_catalog() -> Result<Vec<CourseEntry>> {
    parse_catalog(BUILTIN_CATALOG)
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CourseEntry>> {
    let content = std::fs::read_to_string(&path)?;
    tracing::debug!("Loaded catalog file {}", path.as_ref().display());
    parse_catalog(&content)
}

pub fn parse_catalog(json: &str) -> Result<Vec<CourseEntry>> {
    let catalog: Vec<CourseEntry> = serde_json::from_str(json)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Ids must be present and unique; the catalog must not be empty.
pub fn validate_catalog(catalog: &[CourseEntry]) -> Result<()> {
    if catalog.is_empty() {
        return Err(AdvisorError::ConfigValidationError {
            field: "catalog".to_string(),
            message: "catalog contains no courses".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for course in catalog {
        if course.id.trim().is_empty() {
            return Err(AdvisorError::InvalidConfigValueError {
                field: "catalog.id".to_string(),
                value: course.title.clone(),
                reason: "course id cannot be empty".to_string(),
            });
        }
        if !seen.insert(course.id.as_str()) {
            return Err(AdvisorError::InvalidConfigValueError {
                field: "catalog.id".to_string(),
                value: course.id.clone(),
                reason: "duplicate course id".to_string(),
            });
        }
    }

    Ok(())
}
