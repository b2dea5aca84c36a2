//! Resolved translation-unit model
//!
//! The compiler front end is external. It hands us a fully resolved tree:
//! declarations with their scopes, types and template relationships, a
//! traversal tree of declaration/expression occurrences, and the
//! preprocessor's macro callbacks. This module is that boundary.

pub mod builder;
pub mod decl;
pub mod node;
pub mod types;

pub use builder::TuBuilder;
pub use decl::{
    BindingAnnotation, Decl, DeclKind, FunctionInfo, FunctionKind, LinkageLang, TagKind,
    TemplateArg, TemplateInfo,
};
pub use node::{CallForm, Expr, ExprKind, MacroEvent, MacroEventKind, Node};
pub use types::{Builtin, CxxType};

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown declaration id {0}")]
    UnknownDecl(DeclId),
    #[error("Unknown file id {0}")]
    UnknownFile(FileId),
    #[error("Malformed translation unit: {0}")]
    Malformed(String),
    #[error("Failed to decode translation unit {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Index of a declaration within its translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a source file within its translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// A file the front end read while compiling the unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path as the front end saw it (resolved against the filesystem later)
    pub path: PathBuf,
}

impl SourceFile {
    /// The front end's pseudo-files carry no real location
    pub fn is_synthetic(&self) -> bool {
        let path = self.path.to_string_lossy();
        path.is_empty() || path.starts_with('<')
    }
}

/// Spelling location of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLoc {
    pub file: FileId,
    /// 1-based line
    pub line: u32,
    /// 0-based column (byte offset within the line)
    pub column: u32,
    /// Spelled inside a macro definition body that was expanded here
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub macro_body: bool,
}

impl SourceLoc {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self {
            file,
            line,
            column,
            macro_body: false,
        }
    }

    /// `line:col`, the form hashed into location-derived identifiers
    pub fn point(&self) -> String {
        format!("{}:{}", self.line, self.column)
    }
}

/// A token as spelled in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub loc: SourceLoc,
    pub text: String,
}

impl Token {
    pub fn new(loc: SourceLoc, text: impl Into<String>) -> Self {
        Self {
            loc,
            text: text.into(),
        }
    }

    /// `line:col-endcol` covering the token text
    pub fn range(&self) -> String {
        format!(
            "{}:{}-{}",
            self.loc.line,
            self.loc.column,
            self.loc.column as usize + self.text.len()
        )
    }
}

/// Everything the front end knows about one translation unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Main source file name, for diagnostics only
    #[serde(default)]
    pub main_file: Option<PathBuf>,
    pub files: Vec<SourceFile>,
    pub decls: Vec<Decl>,
    /// Top-level traversal tree
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub macros: Vec<MacroEvent>,
}

impl TranslationUnit {
    /// Load a JSON dump written by the front end
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let unit = Self::from_reader(std::io::BufReader::new(file), path)?;
        Ok(unit)
    }

    /// Decode a JSON dump and check its internal references
    pub fn from_reader(reader: impl Read, path: &Path) -> ModelResult<Self> {
        let unit: TranslationUnit =
            serde_json::from_reader(reader).map_err(|source| ModelError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        unit.validate()?;
        Ok(unit)
    }

    pub fn decl(&self, id: DeclId) -> ModelResult<&Decl> {
        self.decls
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownDecl(id))
    }

    pub fn file(&self, id: FileId) -> ModelResult<&SourceFile> {
        self.files
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownFile(id))
    }

    /// Parent declaration, `None` at translation-unit scope
    pub fn parent(&self, id: DeclId) -> ModelResult<Option<(DeclId, &Decl)>> {
        match self.decl(id)?.parent {
            Some(parent) => Ok(Some((parent, self.decl(parent)?))),
            None => Ok(None),
        }
    }

    /// Check every declaration, file and node reference resolves
    pub fn validate(&self) -> ModelResult<()> {
        for (index, decl) in self.decls.iter().enumerate() {
            self.check_loc(&decl.token.loc)?;
            for id in decl.references() {
                self.decl(id)?;
            }
            if decl.parent == Some(DeclId(index as u32)) {
                return Err(ModelError::Malformed(format!(
                    "declaration #{} is its own parent",
                    index
                )));
            }
        }
        self.check_scope_chains()?;
        for node in &self.nodes {
            self.check_node(node)?;
        }
        for event in &self.macros {
            self.check_loc(&event.token.loc)?;
            if let MacroEventKind::Used {
                definition: Some(loc),
            } = &event.kind
            {
                self.check_loc(loc)?;
            }
        }
        Ok(())
    }

    fn check_scope_chains(&self) -> ModelResult<()> {
        let limit = self.decls.len();
        for index in 0..limit {
            let mut current = Some(DeclId(index as u32));
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > limit {
                    return Err(ModelError::Malformed(format!(
                        "scope chain of declaration #{} is cyclic",
                        index
                    )));
                }
                current = self.decl(id)?.parent;
            }
        }
        Ok(())
    }

    fn check_loc(&self, loc: &SourceLoc) -> ModelResult<()> {
        self.file(loc.file).map(|_| ())
    }

    fn check_node(&self, node: &Node) -> ModelResult<()> {
        match node {
            Node::Decl { decl, children } => {
                self.decl(*decl)?;
                children.iter().try_for_each(|child| self.check_node(child))
            }
            Node::Template {
                pattern,
                instantiations,
            } => {
                self.check_node(pattern)?;
                instantiations
                    .iter()
                    .try_for_each(|child| self.check_node(child))
            }
            Node::Expr(expr) => {
                if let Some(token) = &expr.token {
                    self.check_loc(&token.loc)?;
                }
                for id in expr.kind.references() {
                    self.decl(id)?;
                }
                expr.children
                    .iter()
                    .try_for_each(|child| self.check_node(child))
            }
            Node::TypeRef { decl, token } | Node::MemberInit { field: decl, token } => {
                self.decl(*decl)?;
                self.check_loc(&token.loc)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_range() {
        let token = Token::new(SourceLoc::new(FileId(0), 12, 4), "foo");
        assert_eq!(token.range(), "12:4-7");
        assert_eq!(token.loc.point(), "12:4");
    }

    #[test]
    fn test_synthetic_files() {
        let builtin = SourceFile {
            path: PathBuf::from("<built-in>"),
        };
        let real = SourceFile {
            path: PathBuf::from("/src/a.cpp"),
        };
        assert!(builtin.is_synthetic());
        assert!(!real.is_synthetic());
    }

    #[test]
    fn test_validate_rejects_dangling_decl() {
        let mut builder = TuBuilder::new();
        let file = builder.file("/src/a.cpp");
        builder.namespace(None, "ns", builder.token(file, 1, 10, "ns"));
        let mut unit = builder.finish();
        unit.nodes.push(Node::Decl {
            decl: DeclId(42),
            children: Vec::new(),
        });
        assert!(matches!(unit.validate(), Err(ModelError::UnknownDecl(DeclId(42)))));
    }

    #[test]
    fn test_json_round_trip_keeps_structure() {
        let mut builder = TuBuilder::new();
        let file = builder.file("/src/a.cpp");
        let f = builder.function(None, "f", builder.token(file, 1, 5, "f"), vec![CxxType::int()]);
        builder.decl_node(f, Vec::new());
        let unit = builder.finish();

        let json = serde_json::to_string(&unit).unwrap();
        let decoded = TranslationUnit::from_reader(json.as_bytes(), Path::new("a.tu.json")).unwrap();
        assert_eq!(decoded.decls.len(), 1);
        assert_eq!(decoded.nodes.len(), 1);
        assert_eq!(decoded.decl(f).unwrap().name.as_deref(), Some("f"));
    }
}
