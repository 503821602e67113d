//! Compute-if-absent cache for trained models
//!
//! A model for (ontology, algorithm) counts as cached once
//! `<root>/<ontology>/<algorithm>/model` exists, file or directory. The
//! cache never deletes or rewrites a model.
//!
//! The existence check and the computation are not atomic: two callers that
//! miss at the same time will both run the embedder and the last writer
//! wins. [`ModelCache::serialize_computations`] closes that window for
//! callers inside one process by holding a per-(ontology, algorithm) lock
//! across check and compute. A lock lives only while some caller holds or
//! waits on it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Algorithm, EmbedRequest, EmbedderRegistry};
use crate::error::Result;
use crate::storage::{ArtifactStore, Namespace};

/// Message returned when a model is already present
pub const CACHE_HIT_MESSAGE: &str = "Model already exists";

/// Result of a cache lookup, tagged with the requested algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedOutcome {
    pub message: String,
    pub algorithm: Algorithm,
    pub cache_hit: bool,
    /// `<ontology>/<algorithm>`
    pub model_id: String,
    pub onto_id: String,
    pub model_path: PathBuf,
}

type LockKey = (Namespace, Algorithm);

/// Model cache keyed by (ontology, algorithm)
#[derive(Debug, Clone)]
pub struct ModelCache {
    store: ArtifactStore,
    serialize: bool,
    locks: Arc<Mutex<HashMap<LockKey, Arc<Mutex<()>>>>>,
}

impl ModelCache {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            serialize: false,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Hold a per-key lock across check and compute (in-process only)
    pub fn serialize_computations(mut self, enabled: bool) -> Self {
        self.serialize = enabled;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn model_path(&self, ontology: &str, algorithm: Algorithm) -> Result<PathBuf> {
        let namespace = Namespace::parse(ontology)?;
        Ok(self.store.resolver().model_path(&namespace, algorithm))
    }

    pub fn model_exists(&self, ontology: &str, algorithm: Algorithm) -> Result<bool> {
        let path = self.model_path(ontology, algorithm)?;
        Ok(self.store.backend().exists(&path))
    }

    /// Return the cached model if present, otherwise run `compute` once
    ///
    /// `compute` is never invoked on a hit. Its message becomes the outcome
    /// message on a miss; its errors are returned unchanged.
    pub fn get_or_compute<F>(&self, ontology: &str, algorithm: Algorithm, compute: F) -> Result<EmbedOutcome>
    where
        F: FnOnce(&EmbedRequest<'_>) -> Result<String>,
    {
        let namespace = Namespace::parse(ontology)?;
        if !self.serialize {
            return self.check_and_compute(&namespace, algorithm, compute);
        }

        let key = (namespace, algorithm);
        let key_lock = self.acquire_key_lock(&key);
        let result = {
            let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.check_and_compute(&key.0, algorithm, compute)
        };
        self.release_key_lock(&key, key_lock);
        result
    }

    /// [`get_or_compute`](Self::get_or_compute) with the strategy taken from
    /// a registry. An unregistered algorithm fails before the cache check.
    pub fn get_or_compute_with(
        &self,
        ontology: &str,
        algorithm: Algorithm,
        registry: &EmbedderRegistry,
    ) -> Result<EmbedOutcome> {
        let embedder = registry.get(algorithm)?;
        self.get_or_compute(ontology, algorithm, |request| embedder.embed(request))
    }

    fn check_and_compute<F>(&self, namespace: &Namespace, algorithm: Algorithm, compute: F) -> Result<EmbedOutcome>
    where
        F: FnOnce(&EmbedRequest<'_>) -> Result<String>,
    {
        let resolver = self.store.resolver();
        let model_path = resolver.model_path(namespace, algorithm);
        let outcome = |message: String, cache_hit: bool| EmbedOutcome {
            message,
            algorithm,
            cache_hit,
            model_id: format!("{}/{}", namespace, algorithm),
            onto_id: namespace.to_string(),
            model_path: model_path.clone(),
        };

        if self.store.backend().exists(&model_path) {
            info!(ontology = %namespace, algorithm = %algorithm, "Model cache hit");
            return Ok(outcome(CACHE_HIT_MESSAGE.to_string(), true));
        }

        info!(ontology = %namespace, algorithm = %algorithm, "Model cache miss, computing");
        let ontology_dir = resolver.namespace_dir(namespace);
        let request = EmbedRequest {
            ontology: namespace,
            algorithm,
            ontology_dir: &ontology_dir,
            model_path: &model_path,
        };
        match compute(&request) {
            Ok(message) => Ok(outcome(message, false)),
            Err(e) => {
                warn!(ontology = %namespace, algorithm = %algorithm, error = %e, "Model computation failed");
                Err(e)
            }
        }
    }

    fn acquire_key_lock(&self, key: &LockKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))))
    }

    /// Drop the map entry once no other caller holds or waits on it.
    /// Clones are only handed out under the map lock, so the count is stable
    /// while it is held.
    fn release_key_lock(&self, key: &LockKey, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::{MemoryBackend, PathResolver, StorageBackend};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn cache() -> (ModelCache, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = ArtifactStore::new(PathResolver::new("storage"), Arc::new(backend.clone()));
        (ModelCache::new(store), backend)
    }

    #[test]
    fn test_hit_never_computes() {
        let (cache, backend) = cache();
        backend
            .create_dir_all(Path::new("storage/pizza/owl2vec/model"))
            .unwrap();

        let calls = AtomicUsize::new(0);
        let outcome = cache
            .get_or_compute("pizza", Algorithm::Owl2Vec, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("trained".to_string())
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(outcome.cache_hit);
        assert_eq!(outcome.algorithm, Algorithm::Owl2Vec);
        assert_eq!(outcome.message, CACHE_HIT_MESSAGE);
        assert_eq!(outcome.model_id, "pizza/owl2vec");
        assert_eq!(outcome.onto_id, "pizza");
    }

    #[test]
    fn test_miss_computes_exactly_once() {
        let (cache, _) = cache();
        let calls = AtomicUsize::new(0);

        let outcome = cache
            .get_or_compute("pizza", Algorithm::Rdf2Vec, |request| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(request.ontology.as_str(), "pizza");
                assert_eq!(request.algorithm, Algorithm::Rdf2Vec);
                assert_eq!(request.ontology_dir, Path::new("storage/pizza"));
                assert_eq!(request.model_path, Path::new("storage/pizza/rdf2vec/model"));
                Ok("Model trained".to_string())
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!outcome.cache_hit);
        assert_eq!(outcome.algorithm, Algorithm::Rdf2Vec);
        assert_eq!(outcome.message, "Model trained");
    }

    #[test]
    fn test_model_is_keyed_by_algorithm() {
        let (cache, backend) = cache();
        backend
            .create_dir_all(Path::new("storage/pizza/owl2vec/model"))
            .unwrap();

        assert!(cache.model_exists("pizza", Algorithm::Owl2Vec).unwrap());
        assert!(!cache.model_exists("pizza", Algorithm::Opa2Vec).unwrap());
        assert!(!cache.model_exists("wine", Algorithm::Owl2Vec).unwrap());
    }

    /// Stand-in embedder that just creates the model directory
    fn train(backend: &MemoryBackend) -> impl Fn(&EmbedRequest<'_>) -> Result<String> + '_ {
        move |request| {
            backend.create_dir_all(request.model_path).unwrap();
            Ok("trained".to_string())
        }
    }

    #[test]
    fn test_second_call_hits_after_compute_writes_model() {
        let (cache, backend) = cache();

        let first = cache
            .get_or_compute("pizza", Algorithm::Onto2Vec, train(&backend))
            .unwrap();
        let second = cache
            .get_or_compute("pizza", Algorithm::Onto2Vec, train(&backend))
            .unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.model_path, second.model_path);
    }

    #[test]
    fn test_compute_error_is_returned() {
        let (cache, _) = cache();
        let err = cache
            .get_or_compute("pizza", Algorithm::Owl2Vec, |_| {
                Err(Error::EmbeddingFailed {
                    algorithm: "owl2vec".to_string(),
                    reason: "out of memory".to_string(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingFailed { .. }));
    }

    #[test]
    fn test_invalid_ontology_rejected() {
        let (cache, _) = cache();
        let err = cache
            .get_or_compute("../pizza", Algorithm::Owl2Vec, |_| Ok(String::new()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNamespace(_)));
    }

    #[test]
    fn test_registry_dispatch() {
        let (cache, _) = cache();
        let mut registry = EmbedderRegistry::new();
        fn rdf(_: &EmbedRequest<'_>) -> Result<String> {
            Ok("rdf2vec done".to_string())
        }
        registry.register(Algorithm::Rdf2Vec, Arc::new(rdf));

        let outcome = cache
            .get_or_compute_with("pizza", Algorithm::Rdf2Vec, &registry)
            .unwrap();
        assert_eq!(outcome.message, "rdf2vec done");

        let err = cache
            .get_or_compute_with("pizza", Algorithm::Owl2Vec, &registry)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_serialized_computations_run_once() {
        let (cache, backend) = cache();
        let cache = cache.serialize_computations(true);
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let backend = backend.clone();
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_compute("pizza", Algorithm::Owl2Vec, |request| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(10));
                            backend.create_dir_all(request.model_path).unwrap();
                            Ok("trained".to_string())
                        })
                        .unwrap()
                })
            })
            .collect();

        let hits = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|outcome| outcome.cache_hit)
            .count();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hits, 7);
        assert!(cache.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_idle_key_locks_are_released() {
        let (cache, backend) = cache();
        let cache = cache.serialize_computations(true);

        for ontology in ["pizza", "wine", "go"] {
            for algorithm in Algorithm::ALL {
                cache
                    .get_or_compute(ontology, algorithm, train(&backend))
                    .unwrap();
            }
        }
        let hit = cache
            .get_or_compute("pizza", Algorithm::Owl2Vec, |_| unreachable!())
            .unwrap();
        assert!(hit.cache_hit);

        cache
            .get_or_compute("food", Algorithm::Rdf2Vec, |_| {
                Err(Error::EmbeddingFailed {
                    algorithm: "rdf2vec".to_string(),
                    reason: "boom".to_string(),
                })
            })
            .unwrap_err();

        assert!(cache.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_serializes_for_api_responses() {
        let (cache, _) = cache();
        let outcome = cache
            .get_or_compute("pizza", Algorithm::Opa2Vec, |_| Ok("done".to_string()))
            .unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["message"], "done");
        assert_eq!(json["algorithm"], "opa2vec");
        assert_eq!(json["model_id"], "pizza/opa2vec");
        assert_eq!(json["onto_id"], "pizza");
    }
}
