//! Error types for pxdgen

use thiserror::Error;

/// pxdgen error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A macro value parsed as an integer but fits no integer tier
    #[error("Cannot get data type for value {value} of macro {name}")]
    UnrepresentableValue { name: String, value: i128 },

    /// The structural translator could not translate a header
    #[error("Structural translation of {header} failed: {message}")]
    Structural { header: String, message: String },

    #[error("Failed to write output {target}: {source}")]
    Output {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pxdgen
pub type Result<T> = std::result::Result<T, Error>;
