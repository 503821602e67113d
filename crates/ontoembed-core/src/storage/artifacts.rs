//! Line-oriented artifact files
//!
//! Each artifact kind has a fixed file name under the ontology's namespace
//! directory and a fixed encoding of one record per `\n`-terminated line.
//!
//! ```text
//! storage/<ontology>/
//! ├── axioms.txt
//! ├── classes.txt
//! ├── individuals.txt
//! ├── uri_labels.txt
//! ├── annotations.txt
//! ├── inferred_ancestors.txt
//! ├── <name>.txt
//! ├── train-infer-<variant>.csv, valid.csv, test.csv
//! └── <algorithm>/model
//! ```
//!
//! Saves always replace the whole file and keep input order. Loads of a
//! missing file report [`Error::NotFound`] so callers can tell "nothing to
//! load" apart from a broken file.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{FsBackend, StorageBackend};
use super::paths::{Namespace, PathResolver, validate_artifact_name};
use super::splits::{self, Splits};
use crate::annotations::LabelProjection;
use crate::error::{Error, Result};

/// Extension used by generic input files
pub const INPUT_FILE_EXTENSION: &str = "txt";

/// Artifact kinds with a fixed name and encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Axioms,
    Classes,
    Individuals,
    UriLabels,
    Annotations,
    InferredAncestors,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Axioms,
        ArtifactKind::Classes,
        ArtifactKind::Individuals,
        ArtifactKind::UriLabels,
        ArtifactKind::Annotations,
        ArtifactKind::InferredAncestors,
    ];

    /// File stem, also the name accepted by [`ArtifactStore::load_named`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Axioms => "axioms",
            Self::Classes => "classes",
            Self::Individuals => "individuals",
            Self::UriLabels => "uri_labels",
            Self::Annotations => "annotations",
            Self::InferredAncestors => "inferred_ancestors",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Axioms => "axioms.txt",
            Self::Classes => "classes.txt",
            Self::Individuals => "individuals.txt",
            Self::UriLabels => "uri_labels.txt",
            Self::Annotations => "annotations.txt",
            Self::InferredAncestors => "inferred_ancestors.txt",
        }
    }

    /// Human-readable name used in error messages
    fn describe(&self) -> &'static str {
        match self {
            Self::Axioms => "axioms",
            Self::Classes => "classes",
            Self::Individuals => "individuals",
            Self::UriLabels => "uri labels",
            Self::Annotations => "annotations",
            Self::InferredAncestors => "inferred ancestors",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.file_name() == s)
            .ok_or_else(|| Error::InvalidArtifactName(s.to_string()))
    }
}

/// File-backed store for ontology artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    resolver: PathResolver,
    backend: Arc<dyn StorageBackend>,
}

impl ArtifactStore {
    pub fn new(resolver: PathResolver, backend: Arc<dyn StorageBackend>) -> Self {
        Self { resolver, backend }
    }

    /// Store rooted at `root` on the local filesystem
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(PathResolver::new(root), Arc::new(FsBackend))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    // ========== Saves ==========

    pub fn save_axioms<T: AsRef<str>>(&self, namespace: &str, axioms: Vec<T>) -> Result<Vec<T>> {
        self.save_kind(namespace, ArtifactKind::Axioms, axioms)
    }

    pub fn save_classes<T: AsRef<str>>(&self, namespace: &str, classes: Vec<T>) -> Result<Vec<T>> {
        self.save_kind(namespace, ArtifactKind::Classes, classes)
    }

    pub fn save_individuals<T: AsRef<str>>(
        &self,
        namespace: &str,
        individuals: Vec<T>,
    ) -> Result<Vec<T>> {
        self.save_kind(namespace, ArtifactKind::Individuals, individuals)
    }

    pub fn save_inferred_ancestors<T: AsRef<str>>(
        &self,
        namespace: &str,
        inferred: Vec<T>,
    ) -> Result<Vec<T>> {
        self.save_kind(namespace, ArtifactKind::InferredAncestors, inferred)
    }

    /// Save a generic input file as `<name>.txt`
    pub fn save_named<T: AsRef<str>>(&self, namespace: &str, name: &str, items: Vec<T>) -> Result<Vec<T>> {
        let namespace = Namespace::parse(namespace)?;
        let file_name = input_file_name(name)?;
        let operation = format!("saving input file {}", name);
        self.write_lines(&namespace, &file_name, &operation, items.iter().map(|item| item.as_ref()))?;
        Ok(items)
    }

    /// Write one `entity label` line per (entity, label) pair
    ///
    /// Returns the pairs in the order they were written.
    pub fn save_uri_labels(&self, namespace: &str, projection: &LabelProjection) -> Result<Vec<(String, String)>> {
        let namespace = Namespace::parse(namespace)?;
        let pairs: Vec<(String, String)> = projection
            .pairs()
            .map(|(entity, label)| (entity.to_string(), label.to_string()))
            .collect();
        self.write_lines(
            &namespace,
            ArtifactKind::UriLabels.file_name(),
            "saving uri labels",
            pairs.iter().map(|(entity, label)| format!("{} {}", entity, label)),
        )?;
        Ok(pairs)
    }

    /// Write one line per annotation, tokens joined by a single space
    pub fn save_annotations<T: AsRef<str>>(
        &self,
        namespace: &str,
        annotations: Vec<Vec<T>>,
    ) -> Result<Vec<Vec<T>>> {
        let namespace = Namespace::parse(namespace)?;
        let lines = annotations.iter().map(|tokens| join_tokens(tokens, " "));
        self.write_lines(
            &namespace,
            ArtifactKind::Annotations.file_name(),
            "saving annotations",
            lines,
        )?;
        Ok(annotations)
    }

    /// Write the three split files for a training variant
    pub fn save_splits(&self, namespace: &str, variant: u32, set: Splits) -> Result<Splits> {
        let namespace = Namespace::parse(namespace)?;
        let operation = "saving train/test/validation files";
        let files = [
            (splits::train_file_name(variant), &set.train),
            (splits::VALID_FILE_NAME.to_string(), &set.valid),
            (splits::TEST_FILE_NAME.to_string(), &set.test),
        ];
        for (file_name, rows) in files {
            let lines = rows.iter().map(|row| join_tokens(row, ","));
            self.write_lines(&namespace, &file_name, operation, lines)?;
        }
        Ok(set)
    }

    // ========== Loads ==========

    pub fn load_axioms(&self, namespace: &str) -> Result<Vec<String>> {
        self.load_named(namespace, ArtifactKind::Axioms.as_str())
    }

    pub fn load_classes(&self, namespace: &str) -> Result<Vec<String>> {
        self.load_named(namespace, ArtifactKind::Classes.as_str())
    }

    pub fn load_individuals(&self, namespace: &str) -> Result<Vec<String>> {
        self.load_named(namespace, ArtifactKind::Individuals.as_str())
    }

    pub fn load_inferred_ancestors(&self, namespace: &str) -> Result<Vec<String>> {
        self.load_named(namespace, ArtifactKind::InferredAncestors.as_str())
    }

    /// Load `<name>.txt` as trimmed lines
    ///
    /// Existence is checked before reading, so a missing file is always
    /// [`Error::NotFound`] and never a wrapped I/O error.
    pub fn load_named(&self, namespace: &str, name: &str) -> Result<Vec<String>> {
        let namespace = Namespace::parse(namespace)?;
        let path = self.resolver.artifact_path(&namespace, &input_file_name(name)?)?;
        self.ensure_exists(&namespace, name, &path)?;

        let contents = self.read_file(&path, "loading input file")?;
        let lines: Vec<String> = contents.lines().map(|line| line.trim().to_string()).collect();
        debug!(namespace = %namespace, name, lines = lines.len(), "Loaded input file");
        Ok(lines)
    }

    /// Load several input files at once
    ///
    /// Either every file loads or the first failure is returned, wrapped
    /// with context. No partial map is ever returned.
    pub fn load_many_named<S: AsRef<str>>(
        &self,
        namespace: &str,
        names: &[S],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut loaded = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let lines = self
                .load_named(namespace, name)
                .map_err(|e| e.context("loading multiple input files"))?;
            loaded.insert(name.to_string(), lines);
        }
        Ok(loaded)
    }

    /// `(entity, label)` pairs from `uri_labels.txt`, split at the first space
    pub fn load_uri_labels(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .read_raw_lines(namespace, ArtifactKind::UriLabels)?
            .into_iter()
            .map(|line| match line.split_once(' ') {
                Some((entity, label)) => (entity.to_string(), label.to_string()),
                None => (line, String::new()),
            })
            .collect())
    }

    /// Token lists from `annotations.txt`
    pub fn load_annotations(&self, namespace: &str) -> Result<Vec<Vec<String>>> {
        Ok(self
            .read_raw_lines(namespace, ArtifactKind::Annotations)?
            .into_iter()
            .map(|line| {
                if line.is_empty() {
                    Vec::new()
                } else {
                    line.split(' ').map(String::from).collect()
                }
            })
            .collect())
    }

    /// Lines of an artifact exactly as persisted, minus line terminators
    pub fn read_raw_lines(&self, namespace: &str, kind: ArtifactKind) -> Result<Vec<String>> {
        let namespace = Namespace::parse(namespace)?;
        let path = self.resolver.artifact_path(&namespace, kind.file_name())?;
        self.ensure_exists(&namespace, kind.as_str(), &path)?;

        let operation = format!("loading {}", kind.describe());
        let contents = self.read_file(&path, &operation)?;
        Ok(contents.lines().map(String::from).collect())
    }

    /// Load the train/valid/test split for a training variant
    ///
    /// Unlike the other loads there is no existence pre-check: a missing file
    /// surfaces as [`Error::Persistence`] wrapping the I/O not-found cause.
    pub fn load_splits(&self, namespace: &str, variant: u32) -> Result<Splits> {
        let namespace = Namespace::parse(namespace)?;
        let operation = "loading train/test/validation files";
        let read = |file_name: &str| -> Result<Vec<Vec<String>>> {
            let path = self.resolver.artifact_path(&namespace, file_name)?;
            let contents = self.read_file(&path, operation)?;
            Ok(splits::parse_rows(&contents))
        };

        let loaded = Splits {
            train: read(&splits::train_file_name(variant))?,
            valid: read(splits::VALID_FILE_NAME)?,
            test: read(splits::TEST_FILE_NAME)?,
        };
        debug!(
            namespace = %namespace,
            variant,
            train = loaded.train.len(),
            valid = loaded.valid.len(),
            test = loaded.test.len(),
            "Loaded splits"
        );
        Ok(loaded)
    }

    // ========== Namespaces ==========

    /// Whether an artifact file of the given kind exists
    pub fn has_artifact(&self, namespace: &str, kind: ArtifactKind) -> Result<bool> {
        let path = self.resolver.resolve(namespace, Some(kind.file_name()))?;
        Ok(self.backend.exists(&path))
    }

    pub fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let path = self.resolver.resolve(namespace, None)?;
        Ok(self.backend.exists(&path))
    }

    /// Names of all ontology namespaces under the root, sorted
    pub fn list_namespaces(&self) -> Result<Vec<String>> {
        let root = self.resolver.root();
        if !self.backend.exists(root) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self
            .backend
            .list_dirs(root)
            .map_err(|e| Error::persistence("listing ontologies", e))?
            .into_iter()
            .filter(|name| Namespace::parse(name).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }

    // ========== Internals ==========

    fn save_kind<T: AsRef<str>>(&self, namespace: &str, kind: ArtifactKind, items: Vec<T>) -> Result<Vec<T>> {
        let namespace = Namespace::parse(namespace)?;
        let operation = format!("saving {}", kind.describe());
        self.write_lines(&namespace, kind.file_name(), &operation, items.iter().map(|item| item.as_ref()))?;
        Ok(items)
    }

    /// Create the namespace directory if needed and replace `file_name`
    /// with one line per item. Returns the number of lines written.
    pub(crate) fn write_lines<I, L>(
        &self,
        namespace: &Namespace,
        file_name: &str,
        operation: &str,
        lines: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = L>,
        L: fmt::Display,
    {
        let dir = self.resolver.namespace_dir(namespace);
        let path = self.resolver.artifact_path(namespace, file_name)?;
        let to_persistence = |e| Error::persistence(operation, e);

        self.backend.create_dir_all(&dir).map_err(to_persistence)?;
        let mut writer = self.backend.create(&path).map_err(to_persistence)?;
        let mut count = 0usize;
        for line in lines {
            writeln!(writer, "{}", line).map_err(to_persistence)?;
            count += 1;
        }
        writer.flush().map_err(to_persistence)?;

        debug!(namespace = %namespace, file = file_name, lines = count, "Saved artifact");
        Ok(count)
    }

    fn ensure_exists(&self, namespace: &Namespace, artifact: &str, path: &Path) -> Result<()> {
        if self.backend.exists(path) {
            Ok(())
        } else {
            Err(Error::NotFound {
                namespace: namespace.to_string(),
                artifact: artifact.to_string(),
            })
        }
    }

    fn read_file(&self, path: &Path, operation: &str) -> Result<String> {
        self.backend
            .read_to_string(path)
            .map_err(|e| Error::persistence(operation, e))
    }
}

fn input_file_name(name: &str) -> Result<String> {
    validate_artifact_name(name)?;
    Ok(format!("{}.{}", name, INPUT_FILE_EXTENSION))
}

fn join_tokens<T: AsRef<str>>(tokens: &[T], separator: &str) -> String {
    tokens
        .iter()
        .map(|token| token.as_ref())
        .collect::<Vec<&str>>()
        .join(separator)
}
