use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{operation} failed for {target}: {source}")]
    Transport {
        operation: String,
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed for {target}: HTTP {status}")]
    HttpStatus {
        operation: String,
        target: String,
        status: u16,
        body: String,
    },

    #[error("{operation} returned a malformed payload for {target}: {message}")]
    MalformedPayload {
        operation: String,
        target: String,
        message: String,
    },

    #[error("Invalid list URL '{url}': {reason}")]
    InvalidListUrl { url: String, reason: String },

    #[error("Library section '{name}' not found on the media server")]
    LibraryNotFound { name: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Collection '{collection}' failed: {source}")]
    CollectionFailed {
        collection: String,
        #[source]
        source: Box<SyncError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn transport(
        operation: impl Into<String>,
        target: impl Into<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            target: target.into(),
            source,
        }
    }

    pub fn malformed(
        operation: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPayload {
            operation: operation.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::MalformedPayload { .. } | Self::SerializationError(_) => ErrorCategory::Data,
            Self::InvalidListUrl { .. }
            | Self::LibraryNotFound { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
            Self::CollectionFailed { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport { .. } => ErrorSeverity::Medium,
            Self::HttpStatus { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            Self::HttpStatus { .. } | Self::MalformedPayload { .. } => ErrorSeverity::High,
            Self::SerializationError(_) => ErrorSeverity::High,
            Self::InvalidListUrl { .. }
            | Self::LibraryNotFound { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
            Self::CollectionFailed { source, .. } => source.severity(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::Transport { .. } => {
                "Check that the server is reachable and consider raising sync.retry_attempts"
                    .to_string()
            }
            Self::HttpStatus { status: 401, .. } | Self::HttpStatus { status: 403, .. } => {
                "Check the Plex token or Trakt API key in the configuration".to_string()
            }
            Self::HttpStatus { status: 404, .. } => {
                "Check that the list URL or item still exists".to_string()
            }
            Self::HttpStatus { .. } => {
                "The remote service reported an error, retry later".to_string()
            }
            Self::MalformedPayload { .. } | Self::SerializationError(_) => {
                "The remote service returned unexpected data, check the server version".to_string()
            }
            Self::InvalidListUrl { .. } => {
                "Use a list URL of the form https://trakt.tv/users/<user>/lists/<list>".to_string()
            }
            Self::LibraryNotFound { .. } => {
                "Check plex.library against the library names shown in Plex".to_string()
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::CollectionFailed { source, .. } => source.recovery_suggestion(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Transport { operation, target, .. } => {
                format!("Could not reach the server during {} ({})", operation, target)
            }
            Self::HttpStatus {
                operation,
                target,
                status,
                ..
            } => format!("{} was rejected with HTTP {} ({})", operation, status, target),
            Self::CollectionFailed { collection, source } => {
                format!("Collection '{}': {}", collection, source.user_friendly_message())
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
