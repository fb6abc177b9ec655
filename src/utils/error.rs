use thiserror::Error;

#[derive(Error, Debug)]
pub enum IsochroneError {
    #[error("Credential rejected by format check: {reason}")]
    CredentialInvalid { reason: String },

    #[error("Routing service unavailable: {message}")]
    RemoteUnavailable { message: String },

    #[error("Routing service rejected the request with status {status}")]
    RemoteRejected { status: u16 },

    #[error("Routing service returned an unusable payload: {message}")]
    RemoteMalformed { message: String },

    #[error("No isochrone ring for {minutes} minutes")]
    NoMatchingThreshold { minutes: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Credential,
    Remote,
    Lookup,
    Io,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IsochroneError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IsochroneError::CredentialInvalid { .. } => ErrorCategory::Credential,
            IsochroneError::RemoteUnavailable { .. }
            | IsochroneError::RemoteRejected { .. }
            | IsochroneError::RemoteMalformed { .. } => ErrorCategory::Remote,
            IsochroneError::NoMatchingThreshold { .. } => ErrorCategory::Lookup,
            IsochroneError::IoError(_) => ErrorCategory::Io,
            IsochroneError::SerializationError(_) | IsochroneError::CsvError(_) => {
                ErrorCategory::Data
            }
            IsochroneError::ConfigValidationError { .. }
            | IsochroneError::InvalidConfigValueError { .. }
            | IsochroneError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Remote and lookup failures are absorbed by the provider and filter,
    /// so they never rank above `Medium`.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup | ErrorCategory::Credential => ErrorSeverity::Low,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// Whether the remote source could plausibly succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            IsochroneError::RemoteUnavailable { .. } => true,
            IsochroneError::RemoteRejected { status } => *status == 429,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            IsochroneError::CredentialInvalid { .. } => {
                "Provide an OpenRouteService API key of at least 32 alphanumeric characters"
                    .to_string()
            }
            IsochroneError::RemoteUnavailable { .. } => {
                "Check network connectivity or raise routing.timeout_seconds".to_string()
            }
            IsochroneError::RemoteRejected { status: 429 } => {
                "Rate limit reached, wait before issuing more requests".to_string()
            }
            IsochroneError::RemoteRejected { .. } => {
                "Verify the API key and its remaining quota".to_string()
            }
            IsochroneError::RemoteMalformed { .. } => {
                "Verify the routing endpoint points at an isochrones API".to_string()
            }
            IsochroneError::NoMatchingThreshold { .. } => {
                "Select one of the requested time thresholds".to_string()
            }
            IsochroneError::IoError(_) => "Check that the file exists and is readable".to_string(),
            IsochroneError::SerializationError(_) | IsochroneError::CsvError(_) => {
                "Check the POI file format".to_string()
            }
            IsochroneError::ConfigValidationError { .. }
            | IsochroneError::InvalidConfigValueError { .. } => {
                "Review the configuration values".to_string()
            }
            IsochroneError::MissingConfigError { field } => {
                format!("Set the '{}' configuration value", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Credential => "The routing API key is not usable".to_string(),
            ErrorCategory::Remote => "The routing service could not be used".to_string(),
            ErrorCategory::Lookup => "No isochrone matches the selected time".to_string(),
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Data => format!("Input data could not be read: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, IsochroneError>;
