//! Ontoembed Core Library
//!
//! This crate provides the core functionality for Ontoembed, including:
//! - Storage (per-ontology artifact files, train/valid/test splits)
//! - Annotation merging (preferred labels + raw annotations)
//! - Embedding (algorithm registry, compute-if-absent model cache)
//! - Evaluation of trained models by an external program
//! - Commands shared by the CLI
//! - Configuration

pub mod annotations;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::annotations::{AnnotationMerger, LabelProjection};
    pub use crate::config::Config;
    pub use crate::embedding::{Algorithm, EmbedOutcome, EmbedderRegistry, ModelCache};
    pub use crate::error::{Error, Result};
    pub use crate::evaluation::{EvalReport, Evaluator};
    pub use crate::storage::{ArtifactKind, ArtifactStore, Namespace};
}
