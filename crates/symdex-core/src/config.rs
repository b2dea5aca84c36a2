//! Indexer configuration
//!
//! Roots are validated once, before any traversal begins. A missing or
//! unusable root is fatal for the run.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{option} '{path}' does not exist")]
    MissingRoot { option: &'static str, path: PathBuf },
    #[error("{option} '{path}' is not a directory")]
    NotADirectory { option: &'static str, path: PathBuf },
    #[error("{option} is not set")]
    Unset { option: &'static str },
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How far a method's identifier list follows the override relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Follow only the first overridden method at each level
    #[default]
    FirstBase,
    /// Follow every overridden method, collecting each distinct id once
    AllBases,
}

impl std::str::FromStr for OverridePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" | "first-base" => Ok(OverridePolicy::FirstBase),
            "all" | "all-bases" => Ok(OverridePolicy::AllBases),
            _ => Err(format!("Unknown override policy: {}", s)),
        }
    }
}

/// Configuration shared by every translation unit of a run
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Files under this root are indexed under their relative path
    pub src_root: PathBuf,
    /// Directory holding one index file per logical source file
    pub out_dir: PathBuf,
    /// Build output root; generated headers are indexed under a synthetic prefix
    pub obj_root: Option<PathBuf>,
    pub override_policy: OverridePolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            src_root: PathBuf::from("."),
            out_dir: PathBuf::from("index"),
            obj_root: None,
            override_policy: OverridePolicy::default(),
        }
    }
}

impl IndexConfig {
    pub fn new(src_root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_root: src_root.into(),
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_obj_root(mut self, obj_root: impl Into<PathBuf>) -> Self {
        self.obj_root = Some(obj_root.into());
        self
    }

    pub fn with_override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    /// Canonicalize every configured root, failing on the first bad one
    pub fn validate(self) -> ConfigResult<Self> {
        let src_root = canonical_dir("source root", &self.src_root)?;
        let out_dir = canonical_dir("output directory", &self.out_dir)?;
        let obj_root = match &self.obj_root {
            Some(path) => Some(canonical_dir("object directory", path)?),
            None => None,
        };
        Ok(Self {
            src_root,
            out_dir,
            obj_root,
            override_policy: self.override_policy,
        })
    }
}

fn canonical_dir(option: &'static str, path: &Path) -> ConfigResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Unset { option });
    }
    let canonical = path.canonicalize().map_err(|_| ConfigError::MissingRoot {
        option,
        path: path.to_path_buf(),
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::NotADirectory {
            option,
            path: path.to_path_buf(),
        });
    }
    Ok(canonical)
}
