//! File discovery
//!
//! Uses the `ignore` crate to walk directories in parallel. Batch runs use it
//! to find translation-unit dumps; the query commands use it to list the
//! files of an output directory.

use ignore::{WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use thiserror::Error;

/// Suffix of the dumps written by the front end
pub const UNIT_SUFFIX: &str = ".tu.json";

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Failed to walk directory: {0}")]
    WalkError(String),
    #[error("'{0}' does not exist")]
    MissingRoot(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the file crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Root directory to crawl
    pub root: PathBuf,
    /// Keep only files whose name ends with this (None = every file)
    pub suffix: Option<String>,
    /// Number of threads to use
    pub threads: usize,
    /// Respect .gitignore files
    pub git_ignore: bool,
    /// Additional directory names to skip
    pub ignore_patterns: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            suffix: None,
            threads: num_cpus::get(),
            git_ignore: false,
            ignore_patterns: vec![".git".to_string()],
        }
    }
}

/// Walks a directory tree and collects matching files
pub struct Crawler {
    config: CrawlerConfig,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    /// Every matching file under the root, sorted by path
    pub fn crawl(&self) -> Result<Vec<PathBuf>, CrawlerError> {
        if !self.config.root.exists() {
            return Err(CrawlerError::MissingRoot(self.config.root.clone()));
        }

        let mut builder = WalkBuilder::new(&self.config.root);
        builder
            .git_ignore(self.config.git_ignore)
            .git_global(self.config.git_ignore)
            .git_exclude(self.config.git_ignore)
            .hidden(true)
            .threads(self.config.threads);

        if !self.config.ignore_patterns.is_empty() {
            let mut overrides = ignore::overrides::OverrideBuilder::new(&self.config.root);
            for pattern in &self.config.ignore_patterns {
                overrides
                    .add(&format!("!**/{}", pattern))
                    .map_err(|e| CrawlerError::WalkError(e.to_string()))?;
            }
            let overrides = overrides
                .build()
                .map_err(|e| CrawlerError::WalkError(e.to_string()))?;
            builder.overrides(overrides);
        }

        let (tx, rx) = mpsc::channel();
        let suffix = self.config.suffix.clone();

        builder.build_parallel().run(|| {
            let tx = tx.clone();
            let suffix = suffix.clone();

            Box::new(move |result| {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(err) => {
                        let _ = tx.send(Err(err.to_string()));
                        return WalkState::Continue;
                    }
                };
                let path = entry.path();
                if !path.is_file() {
                    return WalkState::Continue;
                }
                let matches = match &suffix {
                    Some(suffix) => path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.ends_with(suffix.as_str())),
                    None => true,
                };
                if matches {
                    let _ = tx.send(Ok(path.to_path_buf()));
                }
                WalkState::Continue
            })
        });

        // Drop the original sender to close the channel
        drop(tx);

        let mut files = Vec::new();
        for result in rx {
            match result {
                Ok(path) => files.push(path),
                Err(message) => tracing::warn!("Skipping unreadable entry: {}", message),
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Convenience function to find the translation-unit dumps under a directory
pub fn find_units(root: impl AsRef<Path>, threads: usize) -> Result<Vec<PathBuf>, CrawlerError> {
    let config = CrawlerConfig {
        root: root.as_ref().to_path_buf(),
        suffix: Some(UNIT_SUFFIX.to_string()),
        threads,
        ..Default::default()
    };
    Crawler::new(config).crawl()
}
