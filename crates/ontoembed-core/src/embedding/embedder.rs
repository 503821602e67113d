use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::Algorithm;
use super::command::ExternalCommand;
use crate::error::{Error, Result};
use crate::storage::Namespace;

/// Everything an embedding engine needs to train one model
#[derive(Debug, Clone, Copy)]
pub struct EmbedRequest<'a> {
    pub ontology: &'a Namespace,
    pub algorithm: Algorithm,
    /// Namespace directory holding the extracted artifacts
    pub ontology_dir: &'a Path,
    /// Where the trained model is expected to end up
    pub model_path: &'a Path,
}

/// An embedding engine, opaque to the store
///
/// Implementations may perform arbitrary I/O and must leave a model at
/// `request.model_path` on success. The returned string is a human-readable
/// result message.
pub trait Embedder: Send + Sync {
    fn embed(&self, request: &EmbedRequest<'_>) -> Result<String>;
}

impl<F> Embedder for F
where
    F: Fn(&EmbedRequest<'_>) -> Result<String> + Send + Sync,
{
    fn embed(&self, request: &EmbedRequest<'_>) -> Result<String> {
        self(request)
    }
}

/// Closed set of embedding strategies, keyed by algorithm
#[derive(Clone, Default)]
pub struct EmbedderRegistry {
    embedders: HashMap<Algorithm, Arc<dyn Embedder>>,
}

impl EmbedderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every known algorithm to the same embedder
    pub fn with_all(embedder: Arc<dyn Embedder>) -> Self {
        let mut registry = Self::new();
        for algorithm in Algorithm::ALL {
            registry.register(algorithm, Arc::clone(&embedder));
        }
        registry
    }

    pub fn register(&mut self, algorithm: Algorithm, embedder: Arc<dyn Embedder>) -> &mut Self {
        self.embedders.insert(algorithm, embedder);
        self
    }

    pub fn get(&self, algorithm: Algorithm) -> Result<Arc<dyn Embedder>> {
        self.embedders
            .get(&algorithm)
            .cloned()
            .ok_or_else(|| Error::UnknownAlgorithm(algorithm.as_str().to_string()))
    }

    /// Parse an algorithm name and look up its embedder
    pub fn resolve(&self, name: &str) -> Result<(Algorithm, Arc<dyn Embedder>)> {
        let algorithm: Algorithm = name.parse()?;
        Ok((algorithm, self.get(algorithm)?))
    }

    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.embedders.contains_key(&algorithm)
    }

    /// Registered algorithms, sorted
    pub fn algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms: Vec<Algorithm> = self.embedders.keys().copied().collect();
        algorithms.sort();
        algorithms
    }
}

impl fmt::Debug for EmbedderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedderRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}

/// Runs an external training program
///
/// Invoked as `<program> <args...> <ontology-dir> <algorithm> <model-path>`.
/// The program owns the model location and must create any missing
/// directories itself. A non-zero exit is reported with its stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEmbedder {
    command: ExternalCommand,
}

impl CommandEmbedder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: ExternalCommand {
                program: program.into(),
                args,
            },
        }
    }

    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Result<Self> {
        Ok(Self {
            command: ExternalCommand::parse(command, "embedding.command")?,
        })
    }

    pub fn program(&self) -> &str {
        &self.command.program
    }
}

impl Embedder for CommandEmbedder {
    fn embed(&self, request: &EmbedRequest<'_>) -> Result<String> {
        debug!(ontology = %request.ontology, algorithm = %request.algorithm, "Running embedding command");
        let stdout = self
            .command
            .run([
                request.ontology_dir.as_os_str(),
                OsStr::new(request.algorithm.as_str()),
                request.model_path.as_os_str(),
            ])
            .map_err(|reason| Error::EmbeddingFailed {
                algorithm: request.algorithm.as_str().to_string(),
                reason,
            })?;

        info!(ontology = %request.ontology, algorithm = %request.algorithm, "Embedding command finished");
        if stdout.is_empty() {
            Ok(format!("Model trained with {}", request.algorithm.display_name()))
        } else {
            Ok(stdout)
        }
    }
}
