//! Error types for ontoembed

use thiserror::Error;

/// Result type alias using ontoembed's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Ontoembed error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Naming errors (E001-E099)
    #[error("Invalid ontology name '{0}'. Names must not be empty or contain '..', '/' or '\\'.")]
    InvalidNamespace(String),

    #[error("Invalid artifact name '{0}'. Names must not be empty or contain '..', '/' or '\\'.")]
    InvalidArtifactName(String),

    // Lookup errors (E100-E199)
    #[error("Input file not found: {artifact} (ontology '{namespace}')")]
    NotFound { namespace: String, artifact: String },

    // Persistence errors (E200-E299)
    #[error("Error {operation}: {source}")]
    Persistence {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    // Embedding errors (E300-E399)
    #[error("Unknown embedding algorithm '{0}'. Supported: owl2vec, rdf2vec, onto2vec, opa2vec.")]
    UnknownAlgorithm(String),

    #[error("Embedding with {algorithm} failed: {reason}")]
    EmbeddingFailed { algorithm: String, reason: String },

    #[error("Evaluating {algorithm} with {classifier} failed: {reason}")]
    EvaluationFailed {
        algorithm: String,
        classifier: String,
        reason: String,
    },

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Wrap an I/O failure with the name of the operation that hit it
    pub fn persistence(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Persistence {
            operation: operation.into(),
            source,
        }
    }

    /// Wrap this error with context naming a higher-level operation
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any `Context` layers
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the root cause is a missing input file
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidNamespace(_) => "E001",
            Self::InvalidArtifactName(_) => "E002",
            Self::NotFound { .. } => "E100",
            Self::Persistence { .. } => "E200",
            Self::Context { source, .. } => source.code(),
            Self::UnknownAlgorithm(_) => "E300",
            Self::EmbeddingFailed { .. } => "E301",
            Self::EvaluationFailed { .. } => "E302",
            Self::ConfigError(_) => "E600",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidNamespace(_) => Some("ontoembed list".to_string()),
            Self::NotFound { namespace, .. } => Some(format!("ontoembed show {}", namespace)),
            Self::Context { source, .. } => source.suggestion(),
            Self::UnknownAlgorithm(_) => Some("ontoembed embed <ontology> --algorithm owl2vec".to_string()),
            Self::ConfigError(_) => Some("ontoembed config list".to_string()),
            _ => None,
        }
    }
}
