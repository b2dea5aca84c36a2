//! Per-file record buffers and the shared on-disk index
//!
//! Records are buffered per source file while a unit is walked and merged
//! into the output directory once the walk is done. Many runs may merge into
//! the same file concurrently.

pub mod files;
pub mod lock;
pub mod merge;

pub use files::{FileInfo, FileMap, GENERATED_PREFIX};
pub use merge::{merge_lines, FileIndex, MergeOutcome};

use crate::model::FileId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No logical path for {0}")]
    UnknownFile(FileId),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A file whose merge was skipped
#[derive(Debug, Clone)]
pub struct StoreFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of flushing one unit's buffers
#[derive(Debug, Clone, Default)]
pub struct StoreReport {
    pub files_merged: usize,
    /// Lines offered to the merge, duplicates included
    pub lines_written: usize,
    /// Lines that were not already on disk
    pub lines_added: usize,
    pub failures: Vec<StoreFailure>,
}

/// In-memory record lines, grouped by source file
#[derive(Debug, Default)]
pub struct IndexStore {
    buffers: BTreeMap<FileId, Vec<String>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: FileId, line: String) {
        self.buffers.entry(file).or_default().push(line);
    }

    pub fn lines(&self, file: FileId) -> &[String] {
        self.buffers.get(&file).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.buffers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(Vec::is_empty)
    }

    /// Merge every buffer into `out_dir/<logical path>` and clear the buffers
    ///
    /// A file that cannot be merged is logged and skipped; the others are
    /// still written.
    pub fn flush(&mut self, files: &FileMap<'_>, out_dir: &Path) -> StoreReport {
        let mut report = StoreReport::default();
        for (file, lines) in std::mem::take(&mut self.buffers) {
            if lines.is_empty() {
                continue;
            }
            match Self::flush_file(files, out_dir, file, &lines) {
                Ok((path, outcome)) => {
                    debug!(
                        "Merged {} lines into {} ({} new)",
                        lines.len(),
                        path.display(),
                        outcome.added()
                    );
                    report.files_merged += 1;
                    report.lines_written += lines.len();
                    report.lines_added += outcome.added();
                }
                Err(err) => {
                    warn!("Skipping index file: {}", err);
                    let path = match &err {
                        StoreError::Io { path, .. } => path.clone(),
                        StoreError::UnknownFile(_) => PathBuf::new(),
                    };
                    report.failures.push(StoreFailure {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }
        report
    }

    fn flush_file(
        files: &FileMap<'_>,
        out_dir: &Path,
        file: FileId,
        lines: &[String],
    ) -> StoreResult<(PathBuf, MergeOutcome)> {
        let logical = files
            .logical_path(file)
            .filter(|path| !path.is_empty())
            .ok_or(StoreError::UnknownFile(file))?;
        let path = out_dir.join(logical);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let outcome = FileIndex::new(&path).merge(lines)?;
        Ok((path, outcome))
    }
}
