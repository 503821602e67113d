//! Embedding command

use tracing::warn;

use super::Workspace;
use crate::embedding::{Algorithm, EmbedOutcome};
use crate::error::{Error, Result};

impl Workspace {
    /// Return the cached model for (ontology, algorithm) or train it
    ///
    /// Falls back to the configured default algorithm. Without a registered
    /// embedder only cache hits succeed.
    pub fn embed(&self, ontology: &str, algorithm: Option<Algorithm>) -> Result<EmbedOutcome> {
        let algorithm = algorithm.unwrap_or(self.default_algorithm());

        if self.registry().contains(algorithm) {
            return self.cache().get_or_compute_with(ontology, algorithm, self.registry());
        }

        self.cache().get_or_compute(ontology, algorithm, |request| {
            warn!(algorithm = %request.algorithm, "No embedder configured");
            Err(Error::ConfigError(format!(
                "no embedding command configured for {}",
                request.algorithm
            )))
        })
    }
}
