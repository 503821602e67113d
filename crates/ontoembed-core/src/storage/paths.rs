//! Namespace validation and path resolution
//!
//! Every artifact lives under `<root>/<ontology>/`. Names are checked before
//! they are joined onto the root, so a rejected name never reaches the
//! filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::embedding::Algorithm;
use crate::error::{Error, Result};

/// Default storage root, relative to the working directory
pub const DEFAULT_STORAGE_ROOT: &str = "storage";

/// File name of a computed model under `<ontology>/<algorithm>/`
pub const MODEL_DIR_NAME: &str = "model";

/// A validated ontology identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Validate an ontology name
    pub fn parse(name: &str) -> Result<Self> {
        if is_safe_segment(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(Error::InvalidNamespace(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check that an artifact file name is a single plain path segment
pub fn validate_artifact_name(name: &str) -> Result<()> {
    if is_safe_segment(name) {
        Ok(())
    } else {
        Err(Error::InvalidArtifactName(name.to_string()))
    }
}

fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// Maps (ontology, artifact) pairs to locations under a fixed root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the namespace directory, or a file inside it
    ///
    /// Does not create anything. Callers that write must create the
    /// namespace directory first.
    pub fn resolve(&self, namespace: &str, artifact: Option<&str>) -> Result<PathBuf> {
        let namespace = Namespace::parse(namespace)?;
        match artifact {
            Some(name) => self.artifact_path(&namespace, name),
            None => Ok(self.namespace_dir(&namespace)),
        }
    }

    pub fn namespace_dir(&self, namespace: &Namespace) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    pub fn artifact_path(&self, namespace: &Namespace, file_name: &str) -> Result<PathBuf> {
        validate_artifact_name(file_name)?;
        Ok(self.namespace_dir(namespace).join(file_name))
    }

    /// `<root>/<ontology>/<algorithm>/model`
    pub fn model_path(&self, namespace: &Namespace, algorithm: Algorithm) -> PathBuf {
        self.namespace_dir(namespace)
            .join(algorithm.as_str())
            .join(MODEL_DIR_NAME)
    }
}
