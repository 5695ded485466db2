use std::path::Path;

/// Coarse classification used by callers that map failures to process exit
/// codes and by tests asserting on failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A default pass-through operation reached a component with no input
    /// model and no implementation of its own. Programming-contract
    /// violation, fatal.
    MissingInput,
    /// Unknown model/modifier name or malformed/missing run options.
    Configuration,
    /// Missing variable, unreadable file, bad time axis, record shape
    /// mismatch.
    Dataset,
    /// A forcing value fell outside the variable's declared valid range.
    /// Never clamped.
    ValueRange,
    /// Host filesystem failure.
    IoSystem,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum IceflowError {
    #[error("no input model: '{operation}' reached a terminal component without an implementation")]
    MissingInput { operation: &'static str },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("dataset '{file}': {message}")]
    Dataset { file: String, message: String },

    #[error("'{variable}' value {value} is outside the valid range [{min}, {max}]")]
    ValueRange {
        variable: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("io error: {message}")]
    IoSystem { message: String },
}

impl IceflowError {
    pub fn missing_input(operation: &'static str) -> Self {
        Self::MissingInput { operation }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn dataset(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Dataset {
            file: file.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn value_range(variable: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::ValueRange {
            variable: variable.into(),
            value,
            min,
            max,
        }
    }

    pub fn io_system(message: impl Into<String>) -> Self {
        Self::IoSystem {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingInput { .. } => ErrorCategory::MissingInput,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Dataset { .. } => ErrorCategory::Dataset,
            Self::ValueRange { .. } => ErrorCategory::ValueRange,
            Self::IoSystem { .. } => ErrorCategory::IoSystem,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Dataset => 3,
            ErrorCategory::ValueRange => 4,
            ErrorCategory::MissingInput => 5,
            ErrorCategory::IoSystem => 6,
        }
    }
}

pub type CoreResult<T> = Result<T, IceflowError>;
