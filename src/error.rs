//! Error types for policy compilation and evaluation

use std::time::Duration;
use thiserror::Error;

/// Policy engine errors
#[derive(Error, Debug)]
pub enum RubacError {
    /// No lexer rule matched the remaining input
    #[error("Unexpected character '{character}' at offset {offset}")]
    Lexical { character: char, offset: usize },

    /// Token sequence does not match the expression grammar
    #[error("{message} in expression \"{expression}\"")]
    Syntax { message: String, expression: String },

    /// Static validation of a policy document failed
    #[error("Compilation error: {0}")]
    Compilation(String),

    /// Evaluation failed at decision time
    #[error("Execution error: {0}")]
    Execution(String),

    /// Requested policy id is not registered
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two loaded documents declare the same policy id
    #[error("Duplicate policy id: {0}")]
    DuplicatePolicy(String),

    /// Policy document is structurally invalid
    #[error("Invalid policy document: {0}")]
    InvalidDocument(String),

    /// Failure attributed to a specific policy document
    #[error("Policy document {origin}: {source}")]
    Document {
        origin: String,
        #[source]
        source: Box<RubacError>,
    },

    /// Startup load did not finish in time
    #[error("Policy loading timed out after {0:?}")]
    LoadTimeout(Duration),

    /// Loader failed for a reason other than a document error
    #[error("Policy loading failed: {0}")]
    Load(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl RubacError {
    /// Attach the originating document to an error
    pub fn in_document(self, origin: impl Into<String>) -> Self {
        RubacError::Document {
            origin: origin.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping document context
    pub fn root(&self) -> &RubacError {
        match self {
            RubacError::Document { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, RubacError>;
