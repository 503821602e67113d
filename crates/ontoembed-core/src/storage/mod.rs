//! Storage layer - line-oriented artifact files per ontology
//!
//! # Architecture
//!
//! - `backend`: storage interface with filesystem and in-memory implementations
//! - `paths`: namespace validation and path resolution
//! - `artifacts`: save/load per artifact kind
//! - `splits`: train/valid/test CSV files
//!
//! # Usage
//!
//! ```ignore
//! use ontoembed_core::storage::ArtifactStore;
//!
//! let store = ArtifactStore::open("storage");
//! store.save_axioms("pizza", vec!["Margherita SubClassOf Pizza"])?;
//! let axioms = store.load_axioms("pizza")?;
//! ```

pub mod artifacts;
pub mod backend;
pub mod paths;
pub mod splits;

// Re-export commonly used types
pub use artifacts::{ArtifactKind, ArtifactStore, INPUT_FILE_EXTENSION};
pub use backend::{FsBackend, MemoryBackend, StorageBackend};
pub use paths::{DEFAULT_STORAGE_ROOT, MODEL_DIR_NAME, Namespace, PathResolver};
pub use splits::{Rows, Splits, TEST_FILE_NAME, VALID_FILE_NAME};
