//! Train/valid/test split files
//!
//! Splits are plain CSV without quoting: each line is trimmed and split on
//! `,`. The training file is per inference variant
//! (`train-infer-<variant>.csv`); validation and test files are shared.

use serde::{Deserialize, Serialize};

pub const VALID_FILE_NAME: &str = "valid.csv";
pub const TEST_FILE_NAME: &str = "test.csv";

/// Rows of comma-separated fields
pub type Rows = Vec<Vec<String>>;

/// The three sample sets used for evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Splits {
    pub train: Rows,
    pub valid: Rows,
    pub test: Rows,
}

impl Splits {
    pub fn new(train: Rows, valid: Rows, test: Rows) -> Self {
        Self { train, valid, test }
    }

    pub fn into_tuple(self) -> (Rows, Rows, Rows) {
        (self.train, self.valid, self.test)
    }
}

pub fn train_file_name(variant: u32) -> String {
    format!("train-infer-{}.csv", variant)
}

pub(crate) fn parse_rows(contents: &str) -> Rows {
    contents
        .lines()
        .map(|line| line.trim().split(',').map(String::from).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::{ArtifactStore, MemoryBackend, PathResolver, StorageBackend};
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn put(backend: &MemoryBackend, path: &str, contents: &str) {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            backend.create_dir_all(parent).unwrap();
        }
        let mut writer = backend.create(path).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_parse_rows() {
        assert_eq!(
            parse_rows("a,b\nc,d"),
            vec![row(&["a", "b"]), row(&["c", "d"])]
        );
        assert_eq!(parse_rows(" x , y \r\n"), vec![row(&["x ", " y"])]);
        assert!(parse_rows("").is_empty());
    }

    #[test]
    fn test_train_file_name() {
        assert_eq!(train_file_name(0), "train-infer-0.csv");
        assert_eq!(train_file_name(1), "train-infer-1.csv");
    }

    #[test]
    fn test_load_splits_from_existing_files() {
        let backend = MemoryBackend::new();
        put(&backend, "storage/pizza/train-infer-0.csv", "a,b\nc,d");
        put(&backend, "storage/pizza/valid.csv", "e,f");
        put(&backend, "storage/pizza/test.csv", "g,h");
        let store = ArtifactStore::new(PathResolver::new("storage"), Arc::new(backend));

        let (train, valid, test) = store.load_splits("pizza", 0).unwrap().into_tuple();
        assert_eq!(train, vec![row(&["a", "b"]), row(&["c", "d"])]);
        assert_eq!(valid, vec![row(&["e", "f"])]);
        assert_eq!(test, vec![row(&["g", "h"])]);
    }

    #[test]
    fn test_missing_split_is_persistence_not_not_found() {
        let backend = MemoryBackend::new();
        put(&backend, "storage/pizza/train-infer-1.csv", "a,b");
        put(&backend, "storage/pizza/valid.csv", "e,f");
        let store = ArtifactStore::new(PathResolver::new("storage"), Arc::new(backend));

        let err = store.load_splits("pizza", 1).unwrap_err();
        match err {
            Error::Persistence { operation, source } => {
                assert_eq!(operation, "loading train/test/validation files");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_then_load_splits() {
        let backend = MemoryBackend::new();
        let store = ArtifactStore::new(PathResolver::new("storage"), Arc::new(backend.clone()));
        let splits = Splits::new(
            vec![row(&["C1", "C2"]), row(&["C3", "C4"])],
            vec![row(&["C5", "C6"])],
            vec![row(&["C7", "C8"])],
        );

        let saved = store.save_splits("pizza", 1, splits.clone()).unwrap();
        assert_eq!(saved, splits);
        assert_eq!(
            backend.file_bytes(Path::new("storage/pizza/train-infer-1.csv")).unwrap(),
            b"C1,C2\nC3,C4\n"
        );
        assert_eq!(store.load_splits("pizza", 1).unwrap(), splits);
    }
}
