//! Scratch source and output trees shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use symdex_core::record::{IndexRecord, SourceRecord, TargetRecord};
use symdex_core::{IndexConfig, RefKind, TranslationUnit, TranslationUnitIndexer};
use tempfile::TempDir;

pub struct Workspace {
    _dir: TempDir,
    pub config: IndexConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        let config = IndexConfig::new(dir.path().join("src"), dir.path().join("out"))
            .validate()
            .unwrap();
        Self { _dir: dir, config }
    }

    /// Absolute path of a file in the source tree
    pub fn source(&self, relative: &str) -> PathBuf {
        self.config.src_root.join(relative)
    }

    pub fn index(&self, unit: &TranslationUnit) {
        let report = TranslationUnitIndexer::new(self.config.clone())
            .index(unit)
            .unwrap();
        assert!(report.store.failures.is_empty());
    }

    /// Raw content of the index file for `relative`
    pub fn content(&self, relative: &str) -> String {
        std::fs::read_to_string(self.config.out_dir.join(relative)).unwrap_or_default()
    }

    pub fn records(&self, relative: &str) -> Vec<IndexRecord> {
        parse(&self.content(relative))
    }

    pub fn targets(&self, relative: &str) -> Vec<TargetRecord> {
        self.records(relative)
            .into_iter()
            .filter_map(|record| match record {
                IndexRecord::Target(target) => Some(target),
                IndexRecord::Source(_) => None,
            })
            .collect()
    }

    pub fn sources(&self, relative: &str) -> Vec<SourceRecord> {
        self.records(relative)
            .into_iter()
            .filter_map(|record| match record {
                IndexRecord::Source(source) => Some(source),
                IndexRecord::Target(_) => None,
            })
            .collect()
    }

    pub fn out_dir(&self) -> &Path {
        &self.config.out_dir
    }
}

pub fn parse(content: &str) -> Vec<IndexRecord> {
    content
        .lines()
        .map(|line| IndexRecord::parse(line).unwrap())
        .collect()
}

pub fn of_kind<'a>(
    targets: &'a [TargetRecord],
    kind: RefKind,
    sym: &'a str,
) -> impl Iterator<Item = &'a TargetRecord> + 'a {
    targets
        .iter()
        .filter(move |target| target.kind == kind && target.sym.as_str() == sym)
}
