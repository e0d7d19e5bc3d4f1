use thiserror::Error;

/// Library-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur while
/// building schemas, mutating form values, or constructing wizard flows.
/// They provide context and can be chained with anyhow.

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Cannot descend into non-object value at {path}")]
    NotAnObject { path: String },

    #[error("Value at {path} is not an array")]
    NotAnArray { path: String },

    #[error("Index {index} out of bounds at {path} (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("No value at {path}")]
    MissingValue { path: String },

    #[error("Empty field path")]
    EmptyPath,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Schema field path cannot be empty")]
    EmptyPath,
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("A wizard flow requires at least one step")]
    NoSteps,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
