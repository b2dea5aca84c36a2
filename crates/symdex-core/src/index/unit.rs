//! Indexing a single translation unit

use super::walker::Walker;
use super::{IndexResult, UnitReport};
use crate::config::IndexConfig;
use crate::model::TranslationUnit;
use crate::naming::{ItaniumMangler, Mangler, SymbolNamer};
use crate::store::FileMap;
use std::path::Path;
use tracing::{debug, info};

/// Walks one unit and merges its records into the output directory
#[derive(Debug, Clone)]
pub struct TranslationUnitIndexer<M: Mangler + Clone = ItaniumMangler> {
    config: IndexConfig,
    mangler: M,
}

impl TranslationUnitIndexer<ItaniumMangler> {
    /// `config` is expected to be validated already
    pub fn new(config: IndexConfig) -> Self {
        Self::with_mangler(config, ItaniumMangler)
    }
}

impl<M: Mangler + Clone> TranslationUnitIndexer<M> {
    pub fn with_mangler(config: IndexConfig, mangler: M) -> Self {
        Self { config, mangler }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Index an in-memory unit
    pub fn index(&self, unit: &TranslationUnit) -> IndexResult<UnitReport> {
        let files = FileMap::new(unit, &self.config);
        let namer = SymbolNamer::with_mangler(unit, &files, self.mangler.clone())
            .with_policy(self.config.override_policy);

        let mut walker = Walker::new(&namer);
        walker.walk()?;
        let mut output = walker.finish();
        debug!(
            "Walked {}: {} records in {} files",
            display_name(unit),
            output.records_emitted,
            output.store.files().count()
        );

        let store = output.store.flush(&files, &self.config.out_dir);
        info!(
            "Indexed {}: {} records, {} files merged, {} diagnostics",
            display_name(unit),
            output.records_emitted,
            store.files_merged,
            output.diagnostics.len()
        );
        Ok(UnitReport {
            main_file: unit.main_file.clone(),
            records_emitted: output.records_emitted,
            tokens_rejected: output.tokens_rejected,
            store,
            diagnostics: output.diagnostics,
        })
    }

    /// Load a unit dump from disk and index it
    pub fn index_file(&self, path: &Path) -> IndexResult<UnitReport> {
        let unit = TranslationUnit::load(path)?;
        let mut report = self.index(&unit)?;
        if report.main_file.is_none() {
            report.main_file = Some(path.to_path_buf());
        }
        Ok(report)
    }
}

fn display_name(unit: &TranslationUnit) -> String {
    unit.main_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unit>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CxxType, Node, TuBuilder};
    use tempfile::TempDir;

    fn setup() -> (TempDir, IndexConfig) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        let config = IndexConfig::new(dir.path().join("src"), dir.path().join("out"))
            .validate()
            .unwrap();
        (dir, config)
    }

    #[test]
    fn test_index_writes_per_file_records() {
        let (_dir, config) = setup();
        let mut b = TuBuilder::new();
        b.main_file(config.src_root.join("main.cpp"));
        let header = b.file(config.src_root.join("lib/util.h"));
        let main = b.file(config.src_root.join("main.cpp"));
        let helper = b.function(None, "helper", b.token(header, 1, 5, "helper"), vec![CxxType::int()]);
        let entry = b.function(None, "main", b.token(main, 2, 4, "main"), vec![]);
        b.decl_node(helper, vec![]);
        b.decl_node(entry, vec![Node::decl_ref(helper, b.token(main, 3, 2, "helper"))]);
        let unit = b.finish();

        let report = TranslationUnitIndexer::new(config.clone()).index(&unit).unwrap();
        assert_eq!(report.records_emitted, 6);
        assert_eq!(report.store.files_merged, 2);

        let header_index = std::fs::read_to_string(config.out_dir.join("lib/util.h")).unwrap();
        assert_eq!(header_index.lines().count(), 2);
        let main_index = std::fs::read_to_string(config.out_dir.join("main.cpp")).unwrap();
        assert!(main_index.contains(r#""sym":"_Z6helperi""#));
        assert!(main_index.contains(r#""context":"main","contextsym":"main""#));
    }

    #[test]
    fn test_reindexing_is_idempotent() {
        let (_dir, config) = setup();
        let mut b = TuBuilder::new();
        let file = b.file(config.src_root.join("a.cpp"));
        let f = b.function(None, "f", b.token(file, 1, 5, "f"), vec![]);
        b.decl_node(f, vec![]);
        let unit = b.finish();

        let indexer = TranslationUnitIndexer::new(config.clone());
        indexer.index(&unit).unwrap();
        let first = std::fs::read_to_string(config.out_dir.join("a.cpp")).unwrap();
        let report = indexer.index(&unit).unwrap();
        assert_eq!(report.store.lines_added, 0);
        assert_eq!(std::fs::read_to_string(config.out_dir.join("a.cpp")).unwrap(), first);
    }

    #[test]
    fn test_index_file_reports_decode_errors() {
        let (dir, config) = setup();
        let dump = dir.path().join("broken.tu.json");
        std::fs::write(&dump, "{ not json").unwrap();
        let err = TranslationUnitIndexer::new(config).index_file(&dump).unwrap_err();
        assert!(err.to_string().contains("broken.tu.json"));
    }
}
