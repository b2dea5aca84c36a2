//! Lexical context tracking
//!
//! The walker pushes a frame on entry to every function, record and enum
//! body and pops it on the way out. Records ask the tracker which
//! declaration encloses them.

use crate::model::{DeclId, SourceLoc};
use crate::naming::{Mangler, NamingResult, SymbolNamer};
use crate::SymbolId;

/// Enclosing declaration as embedded in a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    /// Display name of the enclosing declaration
    pub name: String,
    /// Every id the enclosing declaration is known by
    pub symbols: Vec<SymbolId>,
}

impl ContextSnapshot {
    pub fn of<M: Mangler>(namer: &SymbolNamer<'_, M>, decl: DeclId) -> NamingResult<Self> {
        Ok(Self {
            name: namer.pretty(decl)?,
            symbols: namer.symbols_for(decl)?,
        })
    }
}

/// Stack of open context-owning declarations, innermost last
#[derive(Debug, Default)]
pub struct ContextTracker {
    frames: Vec<DeclId>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: DeclId) {
        self.frames.push(decl);
    }

    pub fn pop(&mut self) -> Option<DeclId> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Option<DeclId> {
        self.frames.last().copied()
    }

    /// Declaration enclosing an occurrence at `loc`
    ///
    /// Nothing is reported for tokens spelled inside a macro definition body.
    pub fn enclosing_at(&self, loc: &SourceLoc) -> Option<DeclId> {
        if loc.macro_body {
            return None;
        }
        self.current()
    }

    /// Declaration enclosing `decl` itself, skipping a frame owned by `decl`
    pub fn enclosing_decl(&self, decl: DeclId, loc: &SourceLoc) -> Option<DeclId> {
        if loc.macro_body {
            return None;
        }
        self.frames.iter().rev().copied().find(|frame| *frame != decl)
    }
}
