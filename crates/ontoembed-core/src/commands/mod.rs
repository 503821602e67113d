//! Commands module - all operations as library functions
//!
//! These commands back the CLI. A [`Workspace`] bundles the artifact store,
//! the model cache, the embedder registry and the evaluator built from
//! [`Config`].

pub mod embed;
pub mod evaluate;
pub mod ontology;

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{Algorithm, CommandEmbedder, EmbedderRegistry, ModelCache};
use crate::error::{Error, Result};
use crate::evaluation::{CommandEvaluator, Evaluator};
use crate::storage::ArtifactStore;

pub use embed::*;
pub use evaluate::*;
pub use ontology::*;

/// Everything the commands operate on
#[derive(Clone)]
pub struct Workspace {
    store: ArtifactStore,
    cache: ModelCache,
    registry: EmbedderRegistry,
    evaluator: Option<Arc<dyn Evaluator>>,
    default_algorithm: Algorithm,
}

impl Workspace {
    pub fn new(store: ArtifactStore, registry: EmbedderRegistry) -> Self {
        Self {
            cache: ModelCache::new(store.clone()),
            store,
            registry,
            evaluator: None,
            default_algorithm: Algorithm::Owl2Vec,
        }
    }

    /// Filesystem workspace described by the configuration
    ///
    /// Every algorithm is bound to `embedding.command` when it is set;
    /// otherwise the registry stays empty and only cache hits succeed.
    /// `evaluation.command`, when set, becomes the evaluator.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ArtifactStore::open(&config.storage.root);
        let registry = match config.embedding.command.as_deref() {
            Some(command) => EmbedderRegistry::with_all(Arc::new(CommandEmbedder::from_command_line(command)?)),
            None => EmbedderRegistry::new(),
        };

        let mut workspace = Self::new(store, registry).with_default_algorithm(config.embedding.default_algorithm);
        if let Some(command) = config.evaluation.command.as_deref() {
            workspace = workspace.with_evaluator(Arc::new(CommandEvaluator::from_command_line(command)?));
        }
        workspace.cache = workspace
            .cache
            .serialize_computations(config.cache.serialize_computations);
        Ok(workspace)
    }

    pub fn with_default_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn registry(&self) -> &EmbedderRegistry {
        &self.registry
    }

    pub fn evaluator(&self) -> Option<&Arc<dyn Evaluator>> {
        self.evaluator.as_ref()
    }

    pub fn default_algorithm(&self) -> Algorithm {
        self.default_algorithm
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("registry", &self.registry)
            .field("has_evaluator", &self.evaluator.is_some())
            .field("default_algorithm", &self.default_algorithm)
            .finish()
    }
}

/// Read a local input file handed to a command
pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::persistence(format!("reading {}", path.display()), e))
}
