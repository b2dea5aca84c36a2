//! In-process construction of translation units
//!
//! Front-end adapters and tests build units through `TuBuilder` instead of
//! writing JSON dumps.

use super::{
    CallForm, CxxType, Decl, DeclId, DeclKind, ExprKind, FileId, FunctionInfo, FunctionKind,
    LinkageLang, MacroEvent, MacroEventKind, Node, SourceFile, SourceLoc, TagKind, Token,
    TranslationUnit,
};
use std::path::PathBuf;

/// Incrementally assembles a `TranslationUnit`
#[derive(Debug, Default)]
pub struct TuBuilder {
    unit: TranslationUnit,
}

impl TuBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.unit.main_file = Some(path.into());
        self
    }

    /// Register a source file and return its id
    pub fn file(&mut self, path: impl Into<PathBuf>) -> FileId {
        self.unit.files.push(SourceFile { path: path.into() });
        FileId(self.unit.files.len() as u32 - 1)
    }

    pub fn token(&self, file: FileId, line: u32, column: u32, text: &str) -> Token {
        Token::new(SourceLoc::new(file, line, column), text)
    }

    /// A token spelled inside an expanded macro body
    pub fn macro_body_token(&self, file: FileId, line: u32, column: u32, text: &str) -> Token {
        let mut loc = SourceLoc::new(file, line, column);
        loc.macro_body = true;
        Token::new(loc, text)
    }

    pub fn add_decl(&mut self, decl: Decl) -> DeclId {
        self.unit.decls.push(decl);
        DeclId(self.unit.decls.len() as u32 - 1)
    }

    /// Mutable access for the less common attributes (templates, bindings)
    ///
    /// # Panics
    /// Panics if `id` was not produced by this builder.
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.unit.decls[id.0 as usize]
    }

    fn named(&mut self, kind: DeclKind, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        let mut decl = Decl::new(kind, Some(name.to_string()), parent, token);
        decl.is_definition = true;
        self.add_decl(decl)
    }

    pub fn namespace(&mut self, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::Namespace { inline: false }, parent, name, token)
    }

    pub fn inline_namespace(&mut self, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::Namespace { inline: true }, parent, name, token)
    }

    pub fn anonymous_namespace(&mut self, parent: Option<DeclId>, token: Token) -> DeclId {
        let mut decl = Decl::new(DeclKind::Namespace { inline: false }, None, parent, token);
        decl.is_definition = true;
        self.add_decl(decl)
    }

    pub fn namespace_alias(&mut self, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::NamespaceAlias, parent, name, token)
    }

    pub fn linkage_spec(&mut self, parent: Option<DeclId>, lang: LinkageLang, token: Token) -> DeclId {
        self.add_decl(Decl::new(DeclKind::LinkageSpec { lang }, None, parent, token))
    }

    pub fn record(&mut self, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::Record { tag: TagKind::Class }, parent, name, token)
    }

    pub fn anonymous_record(&mut self, parent: Option<DeclId>, token: Token) -> DeclId {
        let mut decl = Decl::new(DeclKind::Record { tag: TagKind::Struct }, None, parent, token);
        decl.is_definition = true;
        self.add_decl(decl)
    }

    pub fn enumeration(
        &mut self,
        parent: Option<DeclId>,
        name: Option<&str>,
        scoped: bool,
        token: Token,
    ) -> DeclId {
        let mut decl = Decl::new(
            DeclKind::Enum { scoped },
            name.map(str::to_string),
            parent,
            token,
        );
        decl.is_definition = true;
        self.add_decl(decl)
    }

    pub fn enum_constant(&mut self, parent: DeclId, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::EnumConstant, Some(parent), name, token)
    }

    pub fn typedef(&mut self, parent: Option<DeclId>, name: &str, token: Token) -> DeclId {
        self.named(DeclKind::Typedef, parent, name, token)
    }

    /// A free function definition
    pub fn function(
        &mut self,
        parent: Option<DeclId>,
        name: &str,
        token: Token,
        params: Vec<CxxType>,
    ) -> DeclId {
        self.named(DeclKind::Function(FunctionInfo::free(params)), parent, name, token)
    }

    pub fn method(&mut self, record: DeclId, name: &str, token: Token, params: Vec<CxxType>) -> DeclId {
        self.named(
            DeclKind::Function(FunctionInfo::method(params)),
            Some(record),
            name,
            token,
        )
    }

    pub fn constructor(
        &mut self,
        record: DeclId,
        name: &str,
        token: Token,
        params: Vec<CxxType>,
    ) -> DeclId {
        let info = FunctionInfo {
            kind: FunctionKind::Constructor,
            ..FunctionInfo::free(params)
        };
        self.named(DeclKind::Function(info), Some(record), name, token)
    }

    /// `token` is the `~` sigil token, e.g. `~Foo` or `~ Foo`
    pub fn destructor(&mut self, record: DeclId, name: &str, token: Token) -> DeclId {
        let info = FunctionInfo {
            kind: FunctionKind::Destructor,
            ..FunctionInfo::free(Vec::new())
        };
        self.named(DeclKind::Function(info), Some(record), name, token)
    }

    /// Mark `method` as directly overriding `bases`, in declaration order
    pub fn overrides(&mut self, method: DeclId, bases: &[DeclId]) {
        if let DeclKind::Function(info) = &mut self.decl_mut(method).kind {
            info.overrides = bases.to_vec();
        }
    }

    /// A namespace- or record-scope variable definition
    pub fn variable(&mut self, parent: Option<DeclId>, name: &str, token: Token, ty: CxxType) -> DeclId {
        let kind = DeclKind::Variable {
            ty,
            local: false,
            param: false,
        };
        self.named(kind, parent, name, token)
    }

    /// A block-scope variable of `function`
    pub fn local(&mut self, function: DeclId, name: &str, token: Token, ty: CxxType) -> DeclId {
        let kind = DeclKind::Variable {
            ty,
            local: true,
            param: false,
        };
        self.named(kind, Some(function), name, token)
    }

    /// A parameter of `function`; `None` for an unnamed parameter
    pub fn param(&mut self, function: DeclId, name: Option<&str>, token: Token, ty: CxxType) -> DeclId {
        let kind = DeclKind::Variable {
            ty,
            local: true,
            param: true,
        };
        let mut decl = Decl::new(kind, name.map(str::to_string), Some(function), token);
        decl.is_definition = true;
        self.add_decl(decl)
    }

    /// A field of `record`; its ordinal is the number of fields declared before it
    pub fn field(&mut self, record: DeclId, name: &str, token: Token) -> DeclId {
        let index = self
            .unit
            .decls
            .iter()
            .filter(|decl| decl.parent == Some(record) && matches!(decl.kind, DeclKind::Field { .. }))
            .count() as u32;
        self.named(DeclKind::Field { index }, Some(record), name, token)
    }

    /// Type naming `decl`, spelled with its enclosing named scopes
    pub fn tag_type(&self, decl: DeclId) -> CxxType {
        let mut parts = Vec::new();
        let mut current = Some(decl);
        while let Some(id) = current {
            let Some(entry) = self.unit.decls.get(id.0 as usize) else {
                break;
            };
            if let Some(name) = &entry.name {
                parts.push(name.clone());
            }
            current = entry.parent;
        }
        parts.reverse();
        CxxType::tag(decl, parts.join("::"))
    }

    pub fn root(&mut self, node: Node) -> &mut Self {
        self.unit.nodes.push(node);
        self
    }

    /// Push a top-level occurrence of `decl`
    pub fn decl_node(&mut self, decl: DeclId, children: Vec<Node>) -> &mut Self {
        self.root(Node::Decl { decl, children })
    }

    pub fn macro_defined(&mut self, token: Token) -> &mut Self {
        self.unit.macros.push(MacroEvent {
            token,
            kind: MacroEventKind::Defined,
            builtin: false,
        });
        self
    }

    pub fn macro_used(&mut self, token: Token, definition: Option<SourceLoc>) -> &mut Self {
        self.unit.macros.push(MacroEvent {
            token,
            kind: MacroEventKind::Used { definition },
            builtin: false,
        });
        self
    }

    pub fn finish(self) -> TranslationUnit {
        self.unit
    }
}

/// Shorthand constructors for traversal nodes
impl Node {
    pub fn decl(decl: DeclId, children: Vec<Node>) -> Self {
        Node::Decl { decl, children }
    }

    pub fn template(pattern: Node, instantiations: Vec<Node>) -> Self {
        Node::Template {
            pattern: Box::new(pattern),
            instantiations,
        }
    }

    pub fn type_ref(decl: DeclId, token: Token) -> Self {
        Node::TypeRef { decl, token }
    }

    pub fn member_init(field: DeclId, token: Token) -> Self {
        Node::MemberInit { field, token }
    }

    pub fn decl_ref(decl: DeclId, token: Token) -> Self {
        Node::expr(ExprKind::DeclRef { decl }, Some(token), Vec::new())
    }

    pub fn member(decl: DeclId, token: Token, children: Vec<Node>) -> Self {
        Node::expr(ExprKind::Member { decl }, Some(token), children)
    }

    pub fn call(callee: DeclId, form: CallForm, token: Option<Token>, children: Vec<Node>) -> Self {
        Node::expr(ExprKind::Call { callee, form }, token, children)
    }

    pub fn construct(ctor: DeclId, token: Token, children: Vec<Node>) -> Self {
        Node::expr(ExprKind::Construct { ctor }, Some(token), children)
    }

    pub fn dependent_member(token: Token, children: Vec<Node>) -> Self {
        Node::expr(ExprKind::DependentMember, Some(token), children)
    }
}
