//! Parallel indexing of many translation units
//!
//! Each unit is walked on its own worker; units that share a header merge
//! into the same index file under its lock.

use super::unit::TranslationUnitIndexer;
use super::{IndexError, IndexResult, IndexingStats, UnitReport};
use crate::config::IndexConfig;
use crate::crawler::find_units;
use crate::naming::{ItaniumMangler, Mangler};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{info, warn};

/// Indexes every unit dump found under a set of inputs
pub struct BatchIndexer<M: Mangler + Clone + 'static = ItaniumMangler> {
    indexer: Arc<TranslationUnitIndexer<M>>,
    threads: usize,
}

impl BatchIndexer<ItaniumMangler> {
    pub fn new(config: IndexConfig) -> Self {
        Self::with_indexer(TranslationUnitIndexer::new(config))
    }
}

impl<M: Mangler + Clone + 'static> BatchIndexer<M> {
    pub fn with_indexer(indexer: TranslationUnitIndexer<M>) -> Self {
        Self {
            indexer: Arc::new(indexer),
            threads: num_cpus::get(),
        }
    }

    /// Number of worker threads (0 = one per CPU)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = if threads == 0 { num_cpus::get() } else { threads };
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Unit dumps named by `inputs`: files as given, directories crawled
    pub fn discover(&self, inputs: &[PathBuf]) -> IndexResult<Vec<PathBuf>> {
        let mut units = Vec::new();
        for input in inputs {
            if input.is_dir() {
                units.extend(find_units(input, self.threads)?);
            } else {
                units.push(input.clone());
            }
        }
        units.sort();
        units.dedup();
        Ok(units)
    }

    /// Index every discovered unit
    ///
    /// A unit that fails to load or walk is logged and counted; the others
    /// still run.
    pub fn run(&self, inputs: &[PathBuf]) -> IndexResult<IndexingStats> {
        let start = Instant::now();
        let mut stats = IndexingStats::default();

        let units = self.discover(inputs)?;
        stats.units_discovered = units.len();
        info!("Found {} translation units", units.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| IndexError::Pool(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<UnitReport>();
        let failed_count = Arc::new(AtomicUsize::new(0));
        let failed_count_clone = Arc::clone(&failed_count);
        let indexer = Arc::clone(&self.indexer);

        pool.spawn(move || {
            units.par_iter().for_each_with(tx, |tx, path| {
                match indexer.index_file(path) {
                    Ok(report) => {
                        let _ = tx.send(report);
                    }
                    Err(e) => {
                        warn!("Failed to index {:?}: {}", path, e);
                        failed_count_clone.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        });

        // Ends once every worker has dropped its sender
        for report in rx {
            for failure in &report.store.failures {
                warn!("{}: {}", failure.path.display(), failure.message);
            }
            stats.add_unit(&report);
        }

        stats.units_failed = failed_count.load(Ordering::Relaxed);
        stats.duration = start.elapsed();
        info!(
            "Indexed {}/{} units in {:.2?}",
            stats.units_indexed, stats.units_discovered, stats.duration
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CxxType, TuBuilder};
    use tempfile::TempDir;

    fn write_unit(dir: &std::path::Path, name: &str, unit: &crate::TranslationUnit) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(unit).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_run_counts_successes_and_failures() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        let obj = dir.path().join("obj");
        for path in [&src, &out, &obj] {
            std::fs::create_dir_all(path).unwrap();
        }
        let config = IndexConfig::new(&src, &out).validate().unwrap();

        let mut b = TuBuilder::new();
        let file = b.file(config.src_root.join("a.cpp"));
        let f = b.function(None, "f", b.token(file, 1, 5, "f"), vec![CxxType::int()]);
        b.decl_node(f, vec![]);
        write_unit(&obj, "a.tu.json", &b.finish());
        std::fs::write(obj.join("bad.tu.json"), "[]").unwrap();

        let stats = BatchIndexer::new(config.clone())
            .with_threads(2)
            .run(&[obj.clone()])
            .unwrap();
        assert_eq!(stats.units_discovered, 2);
        assert_eq!(stats.units_indexed, 1);
        assert_eq!(stats.units_failed, 1);
        assert_eq!(stats.records_emitted, 2);
        assert!(config.out_dir.join("a.cpp").exists());
    }

    #[test]
    fn test_discover_mixes_files_and_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/x.tu.json"), "{}").unwrap();
        std::fs::write(dir.path().join("y.tu.json"), "{}").unwrap();

        let batch = BatchIndexer::new(IndexConfig::default()).with_threads(1);
        let units = batch
            .discover(&[dir.path().join("nested"), dir.path().join("y.tu.json"), dir.path().join("nested")])
            .unwrap();
        assert_eq!(
            units,
            vec![dir.path().join("nested/x.tu.json"), dir.path().join("y.tu.json")]
        );
    }
}
