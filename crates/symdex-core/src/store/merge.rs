//! Merging records into an on-disk file index
//!
//! A file index always holds the sorted, deduplicated union of every line
//! ever merged into it, so merging is idempotent and order-independent.

use super::lock::FileLock;
use super::{StoreError, StoreResult};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sorted, deduplicated union of `existing` content and `incoming` lines
pub fn merge_lines<S: AsRef<str>>(existing: &str, incoming: &[S]) -> Vec<String> {
    let mut lines: Vec<String> = existing
        .lines()
        .chain(incoming.iter().map(AsRef::as_ref))
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    lines.sort();
    lines.dedup();
    lines
}

/// Line counts around one merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub before: usize,
    pub after: usize,
}

impl MergeOutcome {
    pub fn added(&self) -> usize {
        self.after.saturating_sub(self.before)
    }
}

/// Persisted records of one logical source file
#[derive(Debug, Clone)]
pub struct FileIndex {
    path: PathBuf,
}

impl FileIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lines, empty if the file does not exist yet
    pub fn read_lines(&self) -> StoreResult<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Merge `incoming` under an exclusive lock and atomically replace the file
    ///
    /// The new content is written to a sibling temporary file and renamed
    /// over the target only after it is fully written and synced, keeping the
    /// target's permissions. On any failure the previous content stays in
    /// place, and a file that was still empty is removed again.
    pub fn merge<S: AsRef<str>>(&self, incoming: &[S]) -> StoreResult<MergeOutcome> {
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.merge_via(incoming, dir)
    }

    /// `merge`, staging the replacement in `scratch`
    fn merge_via<S: AsRef<str>>(&self, incoming: &[S], scratch: &Path) -> StoreResult<MergeOutcome> {
        let lock = FileLock::acquire(&self.path).map_err(|source| self.io_error(source))?;
        let mut existing = String::new();
        let mut reader = lock.file();
        reader
            .read_to_string(&mut existing)
            .map_err(|source| self.io_error(source))?;
        let before = existing.lines().filter(|line| !line.is_empty()).count();

        let merged = merge_lines(&existing, incoming);
        let mut content = merged.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        if let Err(err) = self.replace(&lock, scratch, &content) {
            if existing.is_empty() {
                // Waiters holding this inode see it vanish and retry
                let _ = std::fs::remove_file(&self.path);
            }
            return Err(err);
        }

        drop(lock);
        Ok(MergeOutcome {
            before,
            after: merged.len(),
        })
    }

    /// Write `content` to a temporary file in `scratch` and rename it over the target
    fn replace(&self, lock: &FileLock, scratch: &Path, content: &str) -> StoreResult<()> {
        let permissions = lock
            .file()
            .metadata()
            .map_err(|source| self.io_error(source))?
            .permissions();
        let mut temp = NamedTempFile::new_in(scratch).map_err(|source| self.io_error(source))?;
        temp.write_all(content.as_bytes())
            .map_err(|source| self.io_error(source))?;
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|source| self.io_error(source))?;
        temp.as_file()
            .sync_all()
            .map_err(|source| self.io_error(source))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
