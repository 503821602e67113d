//! Ontology artifact commands
//!
//! Listing, inspection, import of pre-extracted files, loading, merging
//! annotations and reading splits.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::{Workspace, read_input};
use crate::annotations::{AnnotationMerger, LabelProjection};
use crate::embedding::Algorithm;
use crate::error::{Error, Result};
use crate::storage::{ArtifactKind, Splits};

/// Presence of each artifact and model for one ontology
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologySummary {
    pub name: String,
    pub exists: bool,
    pub artifacts: Vec<ArtifactStatus>,
    pub models: Vec<ModelStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub kind: ArtifactKind,
    pub file: &'static str,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub algorithm: Algorithm,
    pub present: bool,
}

/// What an import wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub ontology: String,
    /// Artifact kind, or the generic input name
    pub artifact: String,
    pub records: usize,
}

impl Workspace {
    /// Names of all stored ontologies, sorted
    pub fn list_ontologies(&self) -> Result<Vec<String>> {
        self.store().list_namespaces()
    }

    pub fn show(&self, ontology: &str) -> Result<OntologySummary> {
        let exists = self.store().namespace_exists(ontology)?;

        let artifacts = ArtifactKind::ALL
            .into_iter()
            .map(|kind| {
                Ok(ArtifactStatus {
                    kind,
                    file: kind.file_name(),
                    present: self.store().has_artifact(ontology, kind)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let models = Algorithm::ALL
            .into_iter()
            .map(|algorithm| {
                Ok(ModelStatus {
                    algorithm,
                    present: self.cache().model_exists(ontology, algorithm)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(OntologySummary {
            name: ontology.to_string(),
            exists,
            artifacts,
            models,
        })
    }

    /// Save the lines of a local file as an artifact
    ///
    /// `target` is an artifact kind (`axioms`, `uri_labels.txt`, ...) or
    /// any other valid name, which is stored as a generic `<name>.txt`
    /// input. URI label files hold `entity<space or tab>label` per line and
    /// annotation files whitespace-separated tokens per line.
    pub fn import(&self, ontology: &str, target: &str, path: &Path) -> Result<ImportReport> {
        let contents = read_input(path)?;
        let lines: Vec<&str> = contents.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
        let store = self.store();

        let (artifact, records) = match target.parse::<ArtifactKind>() {
            Ok(kind) => {
                let records = match kind {
                    ArtifactKind::Axioms => store.save_axioms(ontology, lines)?.len(),
                    ArtifactKind::Classes => store.save_classes(ontology, lines)?.len(),
                    ArtifactKind::Individuals => store.save_individuals(ontology, lines)?.len(),
                    ArtifactKind::InferredAncestors => store.save_inferred_ancestors(ontology, lines)?.len(),
                    ArtifactKind::UriLabels => {
                        let projection = parse_labels(&lines, path, |line| {
                            line.split_once('\t').or_else(|| line.split_once(' '))
                        })?;
                        store.save_uri_labels(ontology, &projection)?.len()
                    }
                    ArtifactKind::Annotations => store.save_annotations(ontology, tokenize(&lines))?.len(),
                };
                (kind.as_str().to_string(), records)
            }
            Err(_) => {
                let records = store.save_named(ontology, target, lines)?.len();
                (target.to_string(), records)
            }
        };

        info!(ontology, artifact = %artifact, records, "Imported artifact");
        Ok(ImportReport {
            ontology: ontology.to_string(),
            artifact,
            records,
        })
    }

    /// Load several generic inputs at once; fails as a whole
    pub fn load<S: AsRef<str>>(&self, ontology: &str, names: &[S]) -> Result<BTreeMap<String, Vec<String>>> {
        self.store().load_many_named(ontology, names)
    }

    /// Merge a tab-separated label file with an annotation file
    ///
    /// Returns the persisted label lines followed by the annotation lines.
    pub fn merge(&self, ontology: &str, labels: &Path, annotations: &Path) -> Result<Vec<String>> {
        let label_contents = read_input(labels)?;
        let label_lines: Vec<&str> = label_contents.lines().filter(|line| !line.trim().is_empty()).collect();
        let projection = parse_labels(&label_lines, labels, |line| line.split_once('\t'))?;

        let annotation_contents = read_input(annotations)?;
        let annotation_lines: Vec<&str> = annotation_contents.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

        AnnotationMerger::new(self.store().clone()).merge_and_save(ontology, &projection, tokenize(&annotation_lines))
    }

    pub fn splits(&self, ontology: &str, variant: u32) -> Result<Splits> {
        self.store().load_splits(ontology, variant)
    }
}

fn parse_labels<'a, F>(lines: &[&'a str], path: &Path, split: F) -> Result<LabelProjection>
where
    F: Fn(&'a str) -> Option<(&'a str, &'a str)>,
{
    let mut projection = LabelProjection::new();
    for (index, line) in lines.iter().copied().enumerate() {
        let (entity, label) = split(line).ok_or_else(|| {
            Error::persistence(
                format!("reading {}", path.display()),
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {} is not an entity/label pair: {}", index + 1, line),
                ),
            )
        })?;
        projection.insert(entity.trim(), label.trim());
    }
    Ok(projection)
}

fn tokenize<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    lines.iter().map(|line| line.split_whitespace().collect()).collect()
}
