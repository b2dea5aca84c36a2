//! Symdex Core Library
//!
//! Turns a resolved C++ translation unit into cross-reference records and
//! merges them into a per-file index shared by many independent runs.

pub mod config;
pub mod context;
pub mod crawler;
pub mod index;
pub mod model;
pub mod naming;
pub mod record;
pub mod store;
pub mod template;

pub use config::{IndexConfig, OverridePolicy};
pub use index::{BatchIndexer, TranslationUnitIndexer};
pub use model::{TranslationUnit, TuBuilder};
pub use naming::SymbolNamer;

use serde::{Deserialize, Serialize};

/// Whether an occurrence defines, declares, or uses an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Def,
    Decl,
    Use,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Def => "def",
            RefKind::Decl => "decl",
            RefKind::Use => "use",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RefKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "def" => Ok(RefKind::Def),
            "decl" => Ok(RefKind::Decl),
            "use" => Ok(RefKind::Use),
            _ => Err(format!("Unknown reference kind: {}", s)),
        }
    }
}

/// Syntactic classification of an occurrence, shown to users next to the name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Function,
    Type,
    Variable,
    Namespace,
    Field,
    EnumConstant,
    Enum,
    Constructor,
    Destructor,
    Macro,
}

impl SyntaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxKind::Function => "function",
            SyntaxKind::Type => "type",
            SyntaxKind::Variable => "variable",
            SyntaxKind::Namespace => "namespace",
            SyntaxKind::Field => "field",
            SyntaxKind::EnumConstant => "enum constant",
            SyntaxKind::Enum => "enum",
            SyntaxKind::Constructor => "constructor",
            SyntaxKind::Destructor => "destructor",
            SyntaxKind::Macro => "macro",
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable identifier naming one logical entity across translation units
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a list of identifiers the way source records carry them
    pub fn join(ids: &[SymbolId]) -> String {
        ids.iter()
            .map(SymbolId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SymbolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
