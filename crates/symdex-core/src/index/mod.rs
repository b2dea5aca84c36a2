//! Indexing orchestration
//!
//! Walks translation units, emits their records, and merges them into the
//! output directory, one unit at a time or a whole batch in parallel.

pub mod batch;
pub mod unit;
pub mod walker;

pub use batch::BatchIndexer;
pub use unit::TranslationUnitIndexer;

use crate::store::StoreReport;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Model error: {0}")]
    Model(#[from] crate::model::ModelError),
    #[error("Naming error: {0}")]
    Naming(#[from] crate::naming::NamingError),
    #[error("Emit error: {0}")]
    Emit(#[from] crate::record::EmitError),
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Crawler error: {0}")]
    Crawler(#[from] crate::crawler::CrawlerError),
    #[error("Thread pool error: {0}")]
    Pool(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for indexing operations
pub type IndexResult<T> = Result<T, IndexError>;

/// An occurrence skipped because its entity could not be named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Logical path of the file holding the occurrence
    pub file: String,
    /// `line:col`
    pub loc: String,
    pub entity: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: skipped '{}': {}",
            self.file, self.loc, self.entity, self.message
        )
    }
}

/// Outcome of indexing one translation unit
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    pub main_file: Option<PathBuf>,
    /// Records buffered during the walk
    pub records_emitted: usize,
    /// Occurrences dropped for an invalid token spelling
    pub tokens_rejected: usize,
    pub store: StoreReport,
    pub diagnostics: Vec<Diagnostic>,
}

/// Statistics from a batch run
#[derive(Debug, Clone, Default)]
pub struct IndexingStats {
    /// Number of translation-unit dumps discovered
    pub units_discovered: usize,
    /// Number of units indexed
    pub units_indexed: usize,
    /// Number of units that failed to load or walk
    pub units_failed: usize,
    /// Records emitted across all units
    pub records_emitted: usize,
    pub tokens_rejected: usize,
    /// Index files merged (counted once per unit that touched them)
    pub files_merged: usize,
    /// Index files whose merge was skipped
    pub files_failed: usize,
    /// Occurrences skipped for entities that could not be named
    pub diagnostics: usize,
    /// Total duration
    pub duration: Duration,
}

impl IndexingStats {
    pub fn add_unit(&mut self, report: &UnitReport) {
        self.units_indexed += 1;
        self.records_emitted += report.records_emitted;
        self.tokens_rejected += report.tokens_rejected;
        self.files_merged += report.store.files_merged;
        self.files_failed += report.store.failures.len();
        self.diagnostics += report.diagnostics.len();
    }
}

impl std::fmt::Display for IndexingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Indexing Statistics:")?;
        writeln!(f, "  Units discovered: {}", self.units_discovered)?;
        writeln!(f, "  Units indexed:    {}", self.units_indexed)?;
        writeln!(f, "  Units failed:     {}", self.units_failed)?;
        writeln!(f, "  Records emitted:  {}", self.records_emitted)?;
        writeln!(f, "  Tokens rejected:  {}", self.tokens_rejected)?;
        writeln!(f, "  Files merged:     {}", self.files_merged)?;
        writeln!(f, "  Files failed:     {}", self.files_failed)?;
        writeln!(f, "  Diagnostics:      {}", self.diagnostics)?;
        writeln!(f, "  Duration:         {:.2?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate_unit_reports() {
        let mut stats = IndexingStats::default();
        let mut report = UnitReport {
            records_emitted: 12,
            tokens_rejected: 1,
            ..Default::default()
        };
        report.store.files_merged = 3;
        report.diagnostics.push(Diagnostic {
            file: "a.cpp".to_string(),
            loc: "4:2".to_string(),
            entity: "out".to_string(),
            message: "No naming rule for label 'out'".to_string(),
        });
        stats.add_unit(&report);
        stats.add_unit(&report);

        assert_eq!(stats.units_indexed, 2);
        assert_eq!(stats.records_emitted, 24);
        assert_eq!(stats.files_merged, 6);
        assert_eq!(stats.diagnostics, 2);
        let text = stats.to_string();
        assert!(text.contains("Records emitted:  24"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            file: "dom/Node.cpp".to_string(),
            loc: "10:3".to_string(),
            entity: "lambda".to_string(),
            message: "No naming rule".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "dom/Node.cpp:10:3: skipped 'lambda': No naming rule"
        );
    }
}
