//! Traversal tree and preprocessor events

use super::{DeclId, SourceLoc, Token};
use serde::{Deserialize, Serialize};

/// How a call expression names its callee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallForm {
    /// Callee is a plain reference; reported by the `DeclRef` child
    Direct,
    /// `obj.method()` / `ptr->method()`; token is the member name
    Member,
    /// Overloaded operator; token is the operator
    Operator,
    /// Any other callee expression spelled as a single token
    Other,
}

/// Expression shapes the indexer cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    /// Reference to a variable, function or enum constant
    DeclRef { decl: DeclId },
    /// Member access resolved to a declaration
    Member { decl: DeclId },
    Call { callee: DeclId, form: CallForm },
    Construct { ctor: DeclId },
    /// Member access whose meaning depends on template parameters
    DependentMember,
    Other,
}

impl ExprKind {
    pub fn references(&self) -> Vec<DeclId> {
        match self {
            ExprKind::DeclRef { decl } | ExprKind::Member { decl } => vec![*decl],
            ExprKind::Call { callee, .. } => vec![*callee],
            ExprKind::Construct { ctor } => vec![*ctor],
            ExprKind::DependentMember | ExprKind::Other => Vec::new(),
        }
    }
}

/// An expression occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    /// Token that names the referenced entity
    #[serde(default)]
    pub token: Option<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// One node of the traversal tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// A declaration occurrence and everything lexically inside it
    Decl {
        decl: DeclId,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node>,
    },
    /// A class or function template: its generic body and its instantiations
    Template {
        pattern: Box<Node>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        instantiations: Vec<Node>,
    },
    Expr(Expr),
    /// A written type naming a tag, typedef or template specialization
    TypeRef { decl: DeclId, token: Token },
    /// A written constructor member initializer
    MemberInit { field: DeclId, token: Token },
}

impl Node {
    pub fn expr(kind: ExprKind, token: Option<Token>, children: Vec<Node>) -> Self {
        Node::Expr(Expr {
            kind,
            token,
            children,
        })
    }
}

/// What the preprocessor reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MacroEventKind {
    Defined,
    /// Expansion, `#undef`, `defined()`, `#ifdef` or `#ifndef`
    Used {
        /// Location of the macro's definition, if the macro is defined
        #[serde(default)]
        definition: Option<SourceLoc>,
    },
}

/// A preprocessor callback for one macro name token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroEvent {
    pub token: Token,
    #[serde(flatten)]
    pub kind: MacroEventKind,
    #[serde(default)]
    pub builtin: bool,
}
