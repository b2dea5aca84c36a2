//! Stable symbol identifiers
//!
//! `SymbolNamer` maps a declaration to the string that joins its definition,
//! declarations and uses across independently indexed translation units.
//! Entities with linkage use their mangled name; everything else is named
//! from its scope chain or from a hash of its location.

pub mod compat;
pub mod hash;
pub mod mangle;
pub mod qualified;

pub use hash::hash;
pub use mangle::{ItaniumMangler, Mangler};
pub use qualified::{id_qualified_name, pretty_name};

use crate::config::OverridePolicy;
use crate::model::{DeclId, DeclKind, ModelError, SourceLoc, TranslationUnit};
use crate::store::files::FileMap;
use crate::SymbolId;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("No naming rule for {kind} '{name}'")]
    Unrepresentable { kind: &'static str, name: String },
    #[error("No naming rule for {kind} '{name}': enclosing {scope_kind} '{scope}' has none")]
    UnrepresentableScope {
        kind: &'static str,
        name: String,
        scope_kind: &'static str,
        scope: String,
    },
    #[error("Instantiation {0} has no usable pattern")]
    MissingPattern(DeclId),
    #[error("Field '{0}' is not inside a record")]
    FieldOutsideRecord(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for naming
pub type NamingResult<T> = Result<T, NamingError>;

/// Names declarations of one translation unit
pub struct SymbolNamer<'a, M: Mangler = ItaniumMangler> {
    unit: &'a TranslationUnit,
    files: &'a FileMap<'a>,
    mangler: M,
    policy: OverridePolicy,
}

impl<'a> SymbolNamer<'a, ItaniumMangler> {
    pub fn new(unit: &'a TranslationUnit, files: &'a FileMap<'a>) -> Self {
        Self::with_mangler(unit, files, ItaniumMangler)
    }
}

impl<'a, M: Mangler> SymbolNamer<'a, M> {
    pub fn with_mangler(unit: &'a TranslationUnit, files: &'a FileMap<'a>, mangler: M) -> Self {
        Self {
            unit,
            files,
            mangler,
            policy: OverridePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> OverridePolicy {
        self.policy
    }

    /// Map an instantiated function to the pattern it was instantiated from
    pub fn canonical(&self, id: DeclId) -> NamingResult<DeclId> {
        let mut current = id;
        let mut steps = 0;
        while let Some(pattern) = self.unit.decl(current)?.instantiated_from() {
            if !matches!(self.unit.decl(current)?.kind, DeclKind::Function(_)) {
                break;
            }
            steps += 1;
            if steps > self.unit.decls.len() {
                return Err(NamingError::MissingPattern(id));
            }
            current = pattern;
        }
        Ok(current)
    }

    pub fn unit(&self) -> &'a TranslationUnit {
        self.unit
    }

    pub fn files(&self) -> &'a FileMap<'a> {
        self.files
    }

    /// Display name of the canonical declaration
    pub fn pretty(&self, id: DeclId) -> NamingResult<String> {
        pretty_name(self.unit, self.canonical(id)?)
    }

    /// Hash of `<logical path>@<line>:<col>`
    pub fn location_hash(&self, loc: &SourceLoc) -> String {
        let path = self.files.logical_path(loc.file).unwrap_or_default();
        hash(&format!("{}@{}", path, loc.point()))
    }

    /// Identifier of the macro defined at `definition`
    pub fn macro_symbol(&self, definition: &SourceLoc) -> SymbolId {
        SymbolId::new(format!("M_{}", self.location_hash(definition)))
    }

    /// The identifier of one declaration, without override fan-out
    pub fn name(&self, id: DeclId) -> NamingResult<SymbolId> {
        let id = self.canonical(id)?;
        let decl = self.unit.decl(id)?;

        match &decl.kind {
            DeclKind::Function(_) | DeclKind::Variable { .. } => {
                if self.is_local(id)? {
                    let name = decl.name.as_deref().unwrap_or_default();
                    return Ok(SymbolId::new(format!(
                        "V_{}_{}",
                        self.location_hash(&decl.token.loc),
                        hash(name)
                    )));
                }
                let mangled = self.mangler.mangle(self.unit, id)?;
                Ok(SymbolId::new(compat::canonicalize_mangled(&mangled)))
            }
            DeclKind::Record { .. } | DeclKind::Enum { .. } | DeclKind::Typedef => {
                self.scoped_name("T_", id)
            }
            DeclKind::Namespace { .. } | DeclKind::NamespaceAlias => self.scoped_name("NS_", id),
            DeclKind::Field { index } => match self.unit.parent(id)? {
                Some((record, parent)) if matches!(parent.kind, DeclKind::Record { .. }) => {
                    Ok(SymbolId::new(format!("F_<{}>_{}", self.name(record)?, index)))
                }
                _ => Err(NamingError::FieldOutsideRecord(
                    decl.name_or_anonymous().to_string(),
                )),
            },
            DeclKind::EnumConstant => match decl.parent {
                Some(parent) => Ok(SymbolId::new(format!(
                    "E_<{}>_{}",
                    self.name(parent)?,
                    decl.name_or_anonymous()
                ))),
                None => Err(unrepresentable(decl.kind.describe(), decl.name_or_anonymous())),
            },
            other => Err(unrepresentable(other.describe(), decl.name_or_anonymous())),
        }
    }

    /// Every identifier an occurrence of `id` is reported under
    ///
    /// For an overriding method this is the method itself followed by the
    /// methods it overrides, as selected by the override policy.
    pub fn symbols_for(&self, id: DeclId) -> NamingResult<Vec<SymbolId>> {
        let start = self.canonical(id)?;
        let mut symbols: Vec<SymbolId> = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![start];

        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            let symbol = self.name(current)?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
            let overrides = self
                .unit
                .decl(current)?
                .function()
                .map(|info| info.overrides.as_slice())
                .unwrap_or_default();
            match self.policy {
                OverridePolicy::FirstBase => {
                    if let Some(base) = overrides.first() {
                        pending.push(self.canonical(*base)?);
                    }
                }
                OverridePolicy::AllBases => {
                    for base in overrides.iter().rev() {
                        pending.push(self.canonical(*base)?);
                    }
                }
            }
        }
        Ok(symbols)
    }

    /// Function or variable declared at function scope
    fn is_local(&self, id: DeclId) -> NamingResult<bool> {
        let decl = self.unit.decl(id)?;
        if let DeclKind::Variable { local: true, .. } = decl.kind {
            return Ok(true);
        }
        Ok(matches!(
            self.unit.parent(id)?,
            Some((_, parent)) if matches!(parent.kind, DeclKind::Function(_))
        ))
    }

    fn scoped_name(&self, prefix: &str, id: DeclId) -> NamingResult<SymbolId> {
        let decl = self.unit.decl(id)?;
        let body = match decl.name {
            Some(_) => id_qualified_name(self.unit, id)?.replace(' ', "_"),
            None => self.location_hash(&decl.token.loc),
        };
        Ok(SymbolId::new(format!("{}{}", prefix, body)))
    }
}

fn unrepresentable(kind: &'static str, name: &str) -> NamingError {
    NamingError::Unrepresentable {
        kind,
        name: name.to_string(),
    }
}
