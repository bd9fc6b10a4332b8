use crate::utils::error::{AdvisorError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AdvisorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Fails when a required column is missing from a CSV header row.
pub fn validate_columns(field_name: &str, headers: &[String], required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AdvisorError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("missing required column(s): {}", missing.join(", ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint.url", "https://example.com/v1/chat/completions").is_ok());
        assert!(validate_url("endpoint.url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("endpoint.url", "").is_err());
        assert!(validate_url("endpoint.url", "invalid-url").is_err());
        assert!(validate_url("endpoint.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("endpoint.timeout_seconds", 30u64, 1, 600).is_ok());
        assert!(validate_range("endpoint.timeout_seconds", 0u64, 1, 600).is_err());
        assert!(validate_range("endpoint.timeout_seconds", 601u64, 1, 600).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("concurrency", 4, 1).is_ok());
        assert!(validate_positive_number("concurrency", 0, 1).is_err());
    }

    #[test]
    fn test_validate_columns() {
        let headers = vec!["context".to_string(), "conversation".to_string()];
        assert!(validate_columns("input", &headers, &["context", "conversation"]).is_ok());

        let err = validate_columns("input", &headers[..1], &["context", "conversation"])
            .unwrap_err()
            .to_string();
        assert!(err.contains("conversation"));
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("endpoint.model", "Qwen/Qwen2.5-72B-Instruct").is_ok());
        assert!(validate_non_empty_string("endpoint.model", "   ").is_err());
    }
}
