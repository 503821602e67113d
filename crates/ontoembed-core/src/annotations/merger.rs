use tracing::{debug, warn};

use super::LabelProjection;
use crate::error::Result;
use crate::storage::{ArtifactKind, ArtifactStore, Namespace};

/// Builds the combined label + annotation listing for an ontology
///
/// Both artifacts are written first and then read back, so the returned
/// lines are exactly what is on disk rather than the in-memory input.
#[derive(Debug, Clone)]
pub struct AnnotationMerger {
    store: ArtifactStore,
}

impl AnnotationMerger {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Persist `uri_labels.txt` and `annotations.txt`, then return the
    /// persisted label lines followed by the persisted annotation lines.
    ///
    /// Failures are [`Error::Persistence`](crate::error::Error::Persistence)
    /// naming the step that failed ("saving uri labels" or
    /// "saving annotations"). A failed write can leave that artifact
    /// truncated; the other artifact is untouched if it had not been reached
    /// yet.
    pub fn merge_and_save<T: AsRef<str>>(
        &self,
        namespace: &str,
        projection: &LabelProjection,
        annotations: Vec<Vec<T>>,
    ) -> Result<Vec<String>> {
        let namespace = Namespace::parse(namespace)?;
        let ns = namespace.as_str();

        let result = self.persist_labels(ns, projection).and_then(|mut lines| {
            lines.extend(self.persist_annotations(ns, annotations)?);
            Ok(lines)
        });

        match &result {
            Ok(lines) => debug!(namespace = ns, lines = lines.len(), "Merged annotations"),
            Err(e) => warn!(namespace = ns, error = %e, "Annotation merge failed"),
        }
        result
    }

    fn persist_labels(&self, namespace: &str, projection: &LabelProjection) -> Result<Vec<String>> {
        self.store.save_uri_labels(namespace, projection)?;
        self.store.read_raw_lines(namespace, ArtifactKind::UriLabels)
    }

    fn persist_annotations<T: AsRef<str>>(
        &self,
        namespace: &str,
        annotations: Vec<Vec<T>>,
    ) -> Result<Vec<String>> {
        self.store.save_annotations(namespace, annotations)?;
        self.store.read_raw_lines(namespace, ArtifactKind::Annotations)
    }
}

impl From<ArtifactStore> for AnnotationMerger {
    fn from(store: ArtifactStore) -> Self {
        Self::new(store)
    }
}
