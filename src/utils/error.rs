use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("API token is missing")]
    MissingCredentials,

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Endpoint rejected credentials (status {status})")]
    AuthFailure { status: u16 },

    #[error("Request failed: {message}")]
    RequestFailure { status: Option<u16>, message: String },

    #[error("Model reply is not a usable JSON object: {reason}")]
    MalformedReply { reason: String },

    #[error("Unexpected failure: {message}")]
    UnexpectedFailure { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Credentials,
    Network,
    Reply,
    Configuration,
    Data,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdvisorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdvisorError::MissingCredentials | AdvisorError::AuthFailure { .. } => {
                ErrorCategory::Credentials
            }
            AdvisorError::Timeout { .. } | AdvisorError::RequestFailure { .. } => {
                ErrorCategory::Network
            }
            AdvisorError::MalformedReply { .. } => ErrorCategory::Reply,
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AdvisorError::CsvError(_)
            | AdvisorError::IoError(_)
            | AdvisorError::SerializationError(_) => ErrorCategory::Data,
            AdvisorError::UnexpectedFailure { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdvisorError::MalformedReply { .. } => ErrorSeverity::Low,
            AdvisorError::Timeout { .. } | AdvisorError::RequestFailure { .. } => {
                ErrorSeverity::Medium
            }
            AdvisorError::MissingCredentials
            | AdvisorError::AuthFailure { .. }
            | AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::CsvError(_)
            | AdvisorError::SerializationError(_) => ErrorSeverity::High,
            AdvisorError::IoError(_) | AdvisorError::UnexpectedFailure { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Message safe to show an end user. Never carries status codes or raw
    /// response text.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AdvisorError::MissingCredentials => {
                "I can't reach the course advisor: the API token is missing.".to_string()
            }
            AdvisorError::Timeout { .. } => {
                "The course advisor timed out before answering. Please try again.".to_string()
            }
            AdvisorError::AuthFailure { .. } => {
                "The course advisor could not authenticate this request.".to_string()
            }
            AdvisorError::RequestFailure { .. } => {
                "The course advisor could not be reached right now. Please try again later."
                    .to_string()
            }
            AdvisorError::MalformedReply { .. } => {
                "The course advisor sent a reply I couldn't understand. Please try again."
                    .to_string()
            }
            AdvisorError::UnexpectedFailure { .. } => {
                "Something went wrong while generating recommendations.".to_string()
            }
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            AdvisorError::CsvError(_)
            | AdvisorError::IoError(_)
            | AdvisorError::SerializationError(_) => format!("Data problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Credentials => "Set HF_TOKEN (or pass --token) with a valid API token",
            ErrorCategory::Network => "Check network connectivity and the endpoint URL, then retry",
            ErrorCategory::Reply => "Retry the request; the model output varies between calls",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Data => "Check that the input files exist and are well-formed",
            ErrorCategory::Internal => "Re-run with --verbose and inspect the logs",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
