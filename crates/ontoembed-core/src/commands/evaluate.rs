//! Evaluation command

use serde::Serialize;
use tracing::{info, warn};

use super::Workspace;
use crate::embedding::Algorithm;
use crate::error::{Error, Result};
use crate::evaluation::{EvalRequest, Performance};
use crate::storage::Namespace;

/// Result of evaluating one trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalOutcome {
    pub message: String,
    pub algorithm: Algorithm,
    pub classifier: String,
    /// `<ontology>/<algorithm>`
    pub model_id: String,
    pub onto_id: String,
    pub variant: u32,
    pub train_rows: usize,
    pub valid_rows: usize,
    pub test_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
}

impl Workspace {
    /// Score the trained model for (ontology, algorithm) with `classifier`
    ///
    /// The model must already exist; evaluation never trains. Splits for
    /// `variant` are loaded before the evaluator runs, so a missing split
    /// file fails without invoking it.
    pub fn evaluate(
        &self,
        ontology: &str,
        algorithm: Option<Algorithm>,
        classifier: &str,
        variant: u32,
    ) -> Result<EvalOutcome> {
        let algorithm = algorithm.unwrap_or(self.default_algorithm());
        let namespace = Namespace::parse(ontology)?;
        let resolver = self.store().resolver();
        let model_path = resolver.model_path(&namespace, algorithm);

        if !self.store().backend().exists(&model_path) {
            return Err(Error::NotFound {
                namespace: namespace.to_string(),
                artifact: format!("{}/model", algorithm),
            });
        }

        let splits = self.store().load_splits(namespace.as_str(), variant)?;
        let evaluator = self.evaluator().ok_or_else(|| {
            warn!(algorithm = %algorithm, "No evaluator configured");
            Error::ConfigError("no evaluation command configured".to_string())
        })?;

        let ontology_dir = resolver.namespace_dir(&namespace);
        let report = evaluator.evaluate(&EvalRequest {
            ontology: &namespace,
            algorithm,
            classifier,
            ontology_dir: &ontology_dir,
            model_path: &model_path,
            splits: &splits,
        })?;
        info!(ontology = %namespace, algorithm = %algorithm, classifier, "Model evaluated");

        Ok(EvalOutcome {
            message: report.message,
            algorithm,
            classifier: classifier.to_string(),
            model_id: format!("{}/{}", namespace, algorithm),
            onto_id: namespace.to_string(),
            variant,
            train_rows: splits.train.len(),
            valid_rows: splits.valid.len(),
            test_rows: splits.test.len(),
            performance: report.performance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbedderRegistry;
    use crate::evaluation::{EvalReport, Evaluator};
    use crate::storage::{ArtifactStore, MemoryBackend, PathResolver, Splits, StorageBackend};
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store(backend: &MemoryBackend) -> ArtifactStore {
        ArtifactStore::new(PathResolver::new("storage"), Arc::new(backend.clone()))
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    /// Records how often it ran and echoes the request back
    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
    }

    impl Evaluator for Recording {
        fn evaluate(&self, request: &EvalRequest<'_>) -> Result<EvalReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EvalReport {
                message: format!(
                    "{} {} {}",
                    request.classifier,
                    request.model_path.display(),
                    request.ontology_dir.display()
                ),
                performance: Some(Performance {
                    total: request.splits.test.len() as u64,
                    ..Performance::default()
                }),
            })
        }
    }

    fn workspace_with_model(algorithm: &str) -> (Workspace, Arc<Recording>) {
        let backend = MemoryBackend::new();
        backend
            .create_dir_all(&Path::new("storage/go").join(algorithm).join("model"))
            .unwrap();
        let evaluator = Arc::new(Recording::default());
        let workspace = Workspace::new(store(&backend), EmbedderRegistry::new()).with_evaluator(evaluator.clone());
        workspace
            .store()
            .save_splits(
                "go",
                0,
                Splits::new(vec![row(&["a", "b"]), row(&["c", "d"])], Vec::new(), vec![row(&["e", "f"])]),
            )
            .unwrap();
        (workspace, evaluator)
    }

    #[test]
    fn test_evaluate_hands_model_and_splits_to_evaluator() {
        let (workspace, evaluator) = workspace_with_model("rdf2vec");

        let outcome = workspace.evaluate("go", Some(Algorithm::Rdf2Vec), "rf", 0).unwrap();
        assert_eq!(outcome.message, "rf storage/go/rdf2vec/model storage/go");
        assert_eq!(outcome.model_id, "go/rdf2vec");
        assert_eq!(outcome.onto_id, "go");
        assert_eq!(outcome.classifier, "rf");
        assert_eq!((outcome.train_rows, outcome.valid_rows, outcome.test_rows), (2, 0, 1));
        assert_eq!(outcome.performance.map(|p| p.total), Some(1));
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_evaluate_falls_back_to_default_algorithm() {
        let (workspace, _evaluator) = workspace_with_model("opa2vec");
        let workspace = workspace.with_default_algorithm(Algorithm::Opa2Vec);

        let outcome = workspace.evaluate("go", None, "svm", 0).unwrap();
        assert_eq!(outcome.algorithm, Algorithm::Opa2Vec);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let (workspace, evaluator) = workspace_with_model("rdf2vec");

        let err = workspace.evaluate("go", Some(Algorithm::Owl2Vec), "rf", 0).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { ref namespace, ref artifact } if namespace == "go" && artifact == "owl2vec/model"
        ));
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_splits_fail_before_evaluating() {
        let (workspace, evaluator) = workspace_with_model("rdf2vec");

        let err = workspace.evaluate("go", Some(Algorithm::Rdf2Vec), "rf", 4).unwrap_err();
        assert!(matches!(
            err,
            Error::Persistence { ref operation, .. } if operation == "loading train/test/validation files"
        ));
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_evaluate_without_evaluator_is_config_error() {
        let backend = MemoryBackend::new();
        backend
            .create_dir_all(Path::new("storage/go/owl2vec/model"))
            .unwrap();
        let workspace = Workspace::new(store(&backend), EmbedderRegistry::new());
        workspace
            .store()
            .save_splits("go", 0, Splits::new(Vec::new(), Vec::new(), Vec::new()))
            .unwrap();

        let err = workspace.evaluate("go", None, "rf", 0).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg == "no evaluation command configured"));
        assert!(workspace.evaluator().is_none());
        assert!(format!("{:?}", workspace).contains("has_evaluator: false"));
    }

    #[test]
    fn test_evaluate_rejects_bad_ontology_name() {
        let (workspace, _evaluator) = workspace_with_model("rdf2vec");
        assert!(matches!(
            workspace.evaluate("../go", Some(Algorithm::Rdf2Vec), "rf", 0),
            Err(Error::InvalidNamespace(_))
        ));
    }
}
