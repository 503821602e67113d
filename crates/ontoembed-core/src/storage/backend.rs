//! Storage backends
//!
//! The artifact store never touches `std::fs` directly. It goes through a
//! [`StorageBackend`], so production code binds it to the real filesystem
//! ([`FsBackend`]) and tests can substitute an in-memory map
//! ([`MemoryBackend`]).

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Minimal file operations needed by the artifact store
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Create `path` and all of its missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Open `path` for writing, truncating any previous contents
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Read the whole file at `path` as UTF-8
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Names of the directories directly under `path`, in any order
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Backend bound to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackend;

impl StorageBackend for FsBackend {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

/// In-memory backend for tests
///
/// Mirrors the filesystem rules the store relies on: writing into a
/// directory that was never created fails with `NotFound`, and reads of
/// non-UTF-8 bytes fail with `InvalidData`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a file, if present
    pub fn file_bytes(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Number of files currently held
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryBackend {
    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            ));
        }
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        state.files.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.lock().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        let state = self.lock();
        if !state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {} does not exist", path.display()),
            ));
        }
        Ok(state
            .dirs
            .iter()
            .filter(|dir| dir.parent() == Some(path))
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }
}

/// Appends straight into the shared map, so a writer dropped halfway leaves
/// a truncated file just like a real one would.
struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
