//! Logical file paths and interestingness
//!
//! Each file of a unit is classified once, on first touch: under the object
//! root it gets a synthetic `__GENERATED__/` path, under the source root its
//! relative path, and anything else is skipped.

use crate::config::IndexConfig;
use crate::model::{FileId, SourceLoc, TranslationUnit};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

/// Prefix keeping generated headers apart from real sources of the same name
pub const GENERATED_PREFIX: &str = "__GENERATED__";

/// Where a file's records go, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Root-relative path (or the resolved path for uninteresting files)
    pub logical_path: String,
    pub interesting: bool,
}

/// Lazily classified files of one translation unit
#[derive(Debug)]
pub struct FileMap<'tu> {
    unit: &'tu TranslationUnit,
    src_root: PathBuf,
    obj_root: Option<PathBuf>,
    slots: Vec<OnceCell<FileInfo>>,
}

impl<'tu> FileMap<'tu> {
    pub fn new(unit: &'tu TranslationUnit, config: &IndexConfig) -> Self {
        Self {
            unit,
            src_root: config.src_root.clone(),
            obj_root: config.obj_root.clone(),
            slots: (0..unit.files.len()).map(|_| OnceCell::new()).collect(),
        }
    }

    /// Classification of `file`, computed on first request
    pub fn info(&self, file: FileId) -> Option<&FileInfo> {
        let slot = self.slots.get(file.0 as usize)?;
        Some(slot.get_or_init(|| self.classify(file)))
    }

    pub fn is_interesting(&self, loc: &SourceLoc) -> bool {
        self.info(loc.file).is_some_and(|info| info.interesting)
    }

    pub fn logical_path(&self, file: FileId) -> Option<&str> {
        self.info(file).map(|info| info.logical_path.as_str())
    }

    fn classify(&self, file: FileId) -> FileInfo {
        let Ok(source) = self.unit.file(file) else {
            return FileInfo {
                logical_path: String::new(),
                interesting: false,
            };
        };
        if source.is_synthetic() {
            return FileInfo {
                logical_path: source.path.to_string_lossy().into_owned(),
                interesting: false,
            };
        }

        let real = source
            .path
            .canonicalize()
            .unwrap_or_else(|_| source.path.clone());

        // Checked first: the object directory often lives inside the source tree.
        if let Some(obj_root) = &self.obj_root {
            if let Ok(relative) = real.strip_prefix(obj_root) {
                return FileInfo {
                    logical_path: format!("{}/{}", GENERATED_PREFIX, slash_path(relative)),
                    interesting: true,
                };
            }
        }

        match real.strip_prefix(&self.src_root) {
            Ok(relative) => FileInfo {
                logical_path: slash_path(relative),
                interesting: true,
            },
            Err(_) => FileInfo {
                logical_path: real.to_string_lossy().into_owned(),
                interesting: false,
            },
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TuBuilder;

    fn config() -> IndexConfig {
        IndexConfig::new("/work/src", "/work/index").with_obj_root("/work/src/obj-debug")
    }

    #[test]
    fn test_source_files_are_relative() {
        let mut builder = TuBuilder::new();
        let file = builder.file("/work/src/dom/base/Node.cpp");
        let unit = builder.finish();
        let files = FileMap::new(&unit, &config());
        let info = files.info(file).unwrap();
        assert!(info.interesting);
        assert_eq!(info.logical_path, "dom/base/Node.cpp");
    }

    #[test]
    fn test_generated_files_get_prefix() {
        let mut builder = TuBuilder::new();
        let file = builder.file("/work/src/obj-debug/dist/include/Node.h");
        let unit = builder.finish();
        let files = FileMap::new(&unit, &config());
        assert_eq!(
            files.logical_path(file),
            Some("__GENERATED__/dist/include/Node.h")
        );
    }

    #[test]
    fn test_system_and_builtin_files_are_skipped() {
        let mut builder = TuBuilder::new();
        let system = builder.file("/usr/include/stdio.h");
        let builtin = builder.file("<built-in>");
        let sibling = builder.file("/work/src-other/a.h");
        let unit = builder.finish();
        let files = FileMap::new(&unit, &config());
        assert!(!files.info(system).unwrap().interesting);
        assert!(!files.info(builtin).unwrap().interesting);
        assert!(!files.info(sibling).unwrap().interesting);
        assert!(files.info(FileId(99)).is_none());
    }
}
