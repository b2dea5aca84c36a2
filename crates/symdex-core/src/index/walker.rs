//! Traversal of one translation unit
//!
//! `Walker` visits the traversal tree depth first, keeping the context stack
//! and the template passes in step with the tree, and turns every interesting
//! token into an occurrence for the record emitter.

use super::{Diagnostic, IndexResult};
use crate::context::{ContextSnapshot, ContextTracker};
use crate::model::{
    CallForm, Decl, DeclId, DeclKind, Expr, ExprKind, FunctionKind, MacroEvent, MacroEventKind,
    Node, SourceLoc, Token, TranslationUnit,
};
use crate::naming::{ItaniumMangler, Mangler, NamingError, SymbolNamer};
use crate::record::{BindingAttributes, Occurrence, RecordEmitter};
use crate::store::{FileMap, IndexStore};
use crate::template::TemplateResolver;
use crate::{RefKind, SyntaxKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// What a finished walk leaves behind
#[derive(Debug)]
pub struct WalkOutput {
    pub store: IndexStore,
    pub records_emitted: usize,
    pub tokens_rejected: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Depth-first visitor over one translation unit
pub struct Walker<'a, M: Mangler = ItaniumMangler> {
    unit: &'a TranslationUnit,
    files: &'a FileMap<'a>,
    namer: &'a SymbolNamer<'a, M>,
    context: ContextTracker,
    templates: TemplateResolver,
    emitter: RecordEmitter,
    store: IndexStore,
    /// Enclosing-declaration snapshots, computed once per declaration
    snapshots: HashMap<DeclId, Option<ContextSnapshot>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, M: Mangler> Walker<'a, M> {
    pub fn new(namer: &'a SymbolNamer<'a, M>) -> Self {
        Self {
            unit: namer.unit(),
            files: namer.files(),
            namer,
            context: ContextTracker::new(),
            templates: TemplateResolver::new(),
            emitter: RecordEmitter::new(),
            store: IndexStore::new(),
            snapshots: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Visit every top-level node, then the preprocessor events
    pub fn walk(&mut self) -> IndexResult<()> {
        let unit = self.unit;
        for node in &unit.nodes {
            self.walk_node(node)?;
        }
        for event in &unit.macros {
            self.visit_macro(event)?;
        }
        debug_assert_eq!(self.context.depth(), 0);
        debug_assert_eq!(self.templates.depth(), 0);
        Ok(())
    }

    pub fn finish(self) -> WalkOutput {
        WalkOutput {
            records_emitted: self.emitter.emitted(),
            tokens_rejected: self.emitter.rejected(),
            store: self.store,
            diagnostics: self.diagnostics,
        }
    }

    fn walk_node(&mut self, node: &'a Node) -> IndexResult<()> {
        match node {
            Node::Decl { decl, children } => self.walk_decl(*decl, children),
            Node::Template {
                pattern,
                instantiations,
            } => self.walk_template(pattern, instantiations),
            Node::Expr(expr) => self.walk_expr(expr),
            Node::TypeRef { decl, token } => self.visit_type_ref(*decl, token),
            Node::MemberInit { field, token } => self.visit_member_init(*field, token),
        }
    }

    fn walk_decl(&mut self, id: DeclId, children: &'a [Node]) -> IndexResult<()> {
        let decl = self.unit.decl(id)?;
        self.visit_decl(id, decl)?;

        let owns_context = decl.kind.owns_context();
        if owns_context {
            self.context.push(id);
        }
        let result = children.iter().try_for_each(|child| self.walk_node(child));
        if owns_context {
            self.context.pop();
        }
        result
    }

    /// Gather over the pattern, then re-walk in Analyze mode if any token
    /// was left dependent
    fn walk_template(&mut self, pattern: &'a Node, instantiations: &'a [Node]) -> IndexResult<()> {
        self.templates.open();
        let result = self.template_passes(pattern, instantiations);
        self.templates.close();
        result
    }

    fn template_passes(&mut self, pattern: &'a Node, instantiations: &'a [Node]) -> IndexResult<()> {
        self.template_body(pattern, instantiations)?;
        if !self.templates.needs_analysis() {
            return Ok(());
        }
        self.templates.switch_to_analyze();
        self.template_body(pattern, instantiations)
    }

    fn template_body(&mut self, pattern: &'a Node, instantiations: &'a [Node]) -> IndexResult<()> {
        self.walk_node(pattern)?;
        if self.templates.should_descend_into_instantiations() {
            for instantiation in instantiations {
                self.walk_node(instantiation)?;
            }
        }
        Ok(())
    }

    fn walk_expr(&mut self, expr: &'a Expr) -> IndexResult<()> {
        if let Some(token) = &expr.token {
            self.visit_expr(&expr.kind, token)?;
        }
        expr.children
            .iter()
            .try_for_each(|child| self.walk_node(child))
    }

    fn visit_decl(&mut self, id: DeclId, decl: &'a Decl) -> IndexResult<()> {
        let token = &decl.token;
        if !self.visible(&token.loc) {
            return Ok(());
        }
        let def_or_decl = if decl.is_definition {
            RefKind::Def
        } else {
            RefKind::Decl
        };
        let (kind, syntax, no_crossref) = match &decl.kind {
            DeclKind::Function(info) => match info.kind {
                FunctionKind::Destructor => (def_or_decl, SyntaxKind::Destructor, false),
                _ => (def_or_decl, SyntaxKind::Function, false),
            },
            DeclKind::Record { .. } | DeclKind::Enum { .. } => (def_or_decl, SyntaxKind::Type, false),
            DeclKind::Typedef => (RefKind::Def, SyntaxKind::Type, false),
            DeclKind::Variable { local, param, .. } => {
                if *param && decl.name.is_none() {
                    return Ok(());
                }
                (def_or_decl, SyntaxKind::Variable, *local)
            }
            DeclKind::Namespace { .. } | DeclKind::NamespaceAlias => {
                (RefKind::Def, SyntaxKind::Namespace, false)
            }
            DeclKind::Field { .. } => (RefKind::Def, SyntaxKind::Field, false),
            DeclKind::EnumConstant => (RefKind::Def, SyntaxKind::EnumConstant, false),
            DeclKind::LinkageSpec { .. }
            | DeclKind::TemplateParam
            | DeclKind::Label
            | DeclKind::Using => return Ok(()),
        };

        let Some((pretty, symbols)) = self.resolve(id, token) else {
            return Ok(());
        };
        let canonical = self.namer.canonical(id)?;
        let bindings = BindingAttributes::of(self.unit.decl(canonical)?);
        let context = self.context_of(self.context.enclosing_decl(id, &token.loc));

        let occurrence = Occurrence::new(kind, syntax, pretty, token)
            .with_symbols(symbols)
            .with_context(context)
            .with_no_crossref(no_crossref)
            .with_bindings(bindings);
        self.emitter.emit(&mut self.store, &occurrence)?;
        Ok(())
    }

    fn visit_expr(&mut self, kind: &ExprKind, token: &'a Token) -> IndexResult<()> {
        if let ExprKind::DependentMember = kind {
            if self.files.is_interesting(&token.loc) {
                self.templates.mark_dependent(token.loc);
            }
            return Ok(());
        }

        let (target, syntax, no_crossref) = match *kind {
            ExprKind::DeclRef { decl } => match &self.unit.decl(decl)?.kind {
                DeclKind::Variable { local, .. } => (decl, SyntaxKind::Variable, *local),
                DeclKind::Function(_) => (decl, SyntaxKind::Function, false),
                DeclKind::EnumConstant => (decl, SyntaxKind::Enum, false),
                _ => return Ok(()),
            },
            ExprKind::Member { decl } => match self.unit.decl(decl)?.kind {
                DeclKind::Field { .. } => (decl, SyntaxKind::Field, false),
                _ => return Ok(()),
            },
            ExprKind::Call { callee, form } => match form {
                // Reported by the reference that names the callee
                CallForm::Direct => return Ok(()),
                CallForm::Member | CallForm::Operator | CallForm::Other => {
                    (callee, SyntaxKind::Function, false)
                }
            },
            ExprKind::Construct { ctor } => (ctor, SyntaxKind::Constructor, false),
            ExprKind::DependentMember | ExprKind::Other => return Ok(()),
        };
        self.report_use(target, syntax, no_crossref, token)
    }

    fn visit_type_ref(&mut self, decl: DeclId, token: &'a Token) -> IndexResult<()> {
        let entry = self.unit.decl(decl)?;
        if !matches!(entry.kind, DeclKind::Record { .. } | DeclKind::Enum { .. } | DeclKind::Typedef) {
            return Ok(());
        }
        // A specialization type names the template it was instantiated from
        let target = entry.instantiated_from().unwrap_or(decl);
        self.report_use(target, SyntaxKind::Type, false, token)
    }

    fn visit_member_init(&mut self, field: DeclId, token: &'a Token) -> IndexResult<()> {
        if !matches!(self.unit.decl(field)?.kind, DeclKind::Field { .. }) {
            return Ok(());
        }
        self.report_use(field, SyntaxKind::Field, false, token)
    }

    fn report_use(
        &mut self,
        target: DeclId,
        syntax: SyntaxKind,
        no_crossref: bool,
        token: &'a Token,
    ) -> IndexResult<()> {
        if !self.visible(&token.loc) {
            return Ok(());
        }
        let Some((pretty, symbols)) = self.resolve(target, token) else {
            return Ok(());
        };
        let context = self.context_of(self.context.enclosing_at(&token.loc));
        let occurrence = Occurrence::new(RefKind::Use, syntax, pretty, token)
            .with_symbols(symbols)
            .with_context(context)
            .with_no_crossref(no_crossref);
        self.emitter.emit(&mut self.store, &occurrence)?;
        Ok(())
    }

    fn visit_macro(&mut self, event: &'a MacroEvent) -> IndexResult<()> {
        if event.builtin || !self.files.is_interesting(&event.token.loc) {
            return Ok(());
        }
        let (kind, symbol) = match &event.kind {
            MacroEventKind::Defined => (RefKind::Def, self.namer.macro_symbol(&event.token.loc)),
            MacroEventKind::Used {
                definition: Some(definition),
            } => (RefKind::Use, self.namer.macro_symbol(definition)),
            MacroEventKind::Used { definition: None } => return Ok(()),
        };
        let occurrence = Occurrence::new(kind, SyntaxKind::Macro, event.token.text.clone(), &event.token)
            .with_symbols(vec![symbol]);
        self.emitter.emit(&mut self.store, &occurrence)?;
        Ok(())
    }

    fn visible(&self, loc: &SourceLoc) -> bool {
        self.files.is_interesting(loc) && self.templates.should_emit(loc)
    }

    /// Display name and identifiers of `id`, or a diagnostic
    fn resolve(&mut self, id: DeclId, token: &Token) -> Option<(String, Vec<crate::SymbolId>)> {
        let resolved = self
            .namer
            .pretty(id)
            .and_then(|pretty| Ok((pretty, self.namer.symbols_for(id)?)));
        match resolved {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                self.diagnose(id, token, &err);
                None
            }
        }
    }

    fn context_of(&mut self, decl: Option<DeclId>) -> Option<ContextSnapshot> {
        let decl = decl?;
        if let Some(snapshot) = self.snapshots.get(&decl) {
            return snapshot.clone();
        }
        let snapshot = match ContextSnapshot::of(self.namer, decl) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                debug!("No context for {}: {}", decl, err);
                None
            }
        };
        self.snapshots.insert(decl, snapshot.clone());
        snapshot
    }

    fn diagnose(&mut self, id: DeclId, token: &Token, err: &NamingError) {
        let file = self
            .files
            .logical_path(token.loc.file)
            .unwrap_or_default()
            .to_string();
        let entity = self
            .unit
            .decl(id)
            .map(|decl| decl.name_or_anonymous().to_string())
            .unwrap_or_else(|_| id.to_string());
        warn!("{}:{}: cannot name '{}': {}", file, token.loc.point(), entity, err);
        self.diagnostics.push(Diagnostic {
            file,
            loc: token.loc.point(),
            entity,
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::model::{CxxType, TemplateInfo, TuBuilder};
    use crate::record::IndexRecord;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: IndexConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("src")).unwrap();
            std::fs::create_dir_all(dir.path().join("out")).unwrap();
            let config = IndexConfig::new(dir.path().join("src"), dir.path().join("out"))
                .validate()
                .unwrap();
            Self { _dir: dir, config }
        }

        fn source(&self, name: &str) -> std::path::PathBuf {
            self.config.src_root.join(name)
        }
    }

    fn walk(unit: &TranslationUnit, config: &IndexConfig) -> WalkOutput {
        let files = FileMap::new(unit, config);
        let namer = SymbolNamer::new(unit, &files);
        let mut walker = Walker::new(&namer);
        walker.walk().unwrap();
        walker.finish()
    }

    fn records(output: &WalkOutput) -> Vec<IndexRecord> {
        output
            .store
            .files()
            .flat_map(|file| output.store.lines(file).to_vec())
            .map(|line| IndexRecord::parse(&line).unwrap())
            .collect()
    }

    #[test]
    fn test_definition_and_local_use() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let func = b.function(None, "f", b.token(file, 1, 5, "f"), vec![]);
        let x = b.local(func, "x", b.token(file, 2, 6, "x"), CxxType::int());
        b.decl_node(
            func,
            vec![Node::decl(x, vec![]), Node::decl_ref(x, b.token(file, 3, 2, "x"))],
        );
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        let lines: Vec<String> = output.store.lines(file).to_vec();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(r#""kind":"def","pretty":"f","sym":"_Z1fv""#));
        assert!(lines[2].contains(r#""no_crossref":1"#));
        assert!(lines[3].contains(r#""loc":"3:2-3""#));
        assert!(lines[3].contains(r#""no_crossref":1"#));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_uses_carry_enclosing_function() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let g = b.function(None, "g", b.token(file, 1, 5, "g"), vec![]);
        let f = b.function(None, "f", b.token(file, 2, 5, "f"), vec![]);
        b.decl_node(g, vec![]);
        b.decl_node(
            f,
            vec![Node::call(
                g,
                CallForm::Direct,
                None,
                vec![Node::decl_ref(g, b.token(file, 3, 2, "g"))],
            )],
        );
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        let uses: Vec<_> = records(&output)
            .into_iter()
            .filter_map(|record| match record {
                IndexRecord::Target(target) if target.kind == RefKind::Use => Some(target),
                _ => None,
            })
            .collect();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].context.as_deref(), Some("f"));
        assert_eq!(uses[0].contextsym.as_deref(), Some("_Z1fv"));
    }

    #[test]
    fn test_macro_body_tokens_have_no_context() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let g = b.function(None, "g", b.token(file, 1, 5, "g"), vec![]);
        let f = b.function(None, "f", b.token(file, 2, 5, "f"), vec![]);
        b.decl_node(
            f,
            vec![Node::decl_ref(g, b.macro_body_token(file, 3, 2, "g"))],
        );
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        let target = records(&output)
            .into_iter()
            .find_map(|record| match record {
                IndexRecord::Target(target) if target.kind == RefKind::Use => Some(target),
                _ => None,
            })
            .unwrap();
        assert!(target.context.is_none());
        assert!(target.contextsym.is_none());
    }

    #[test]
    fn test_uninteresting_files_are_skipped() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let system = b.file("/usr/include/stdio.h");
        let local = b.file(fx.source("a.cpp"));
        let printf = b.function(None, "printf", b.token(system, 1, 4, "printf"), vec![]);
        let f = b.function(None, "f", b.token(local, 1, 5, "f"), vec![]);
        b.decl_node(printf, vec![]);
        b.decl_node(f, vec![Node::decl_ref(printf, b.token(local, 2, 2, "printf"))]);
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        assert!(output.store.lines(system).is_empty());
        assert_eq!(output.store.lines(local).len(), 4);
    }

    #[test]
    fn test_local_class_methods_are_named() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let g = b.function(None, "g", b.token(file, 1, 5, "g"), vec![]);
        let f = b.function(None, "f", b.token(file, 2, 5, "f"), vec![]);
        let local_class = b.record(Some(f), "Local", b.token(file, 3, 9, "Local"));
        let method = b.method(local_class, "run", b.token(file, 4, 9, "run"), vec![]);
        b.decl_node(
            f,
            vec![Node::decl(
                local_class,
                vec![Node::decl(
                    method,
                    vec![Node::decl_ref(g, b.token(file, 4, 17, "g"))],
                )],
            )],
        );
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        assert!(output.diagnostics.is_empty());
        let targets: Vec<_> = records(&output)
            .into_iter()
            .filter_map(|record| match record {
                IndexRecord::Target(target) => Some(target),
                _ => None,
            })
            .collect();
        let def = targets.iter().find(|target| target.loc == "4:9-12").unwrap();
        assert_eq!(def.sym.as_str(), "_ZZ1fvEN5Local3runEv");
        assert_eq!(def.pretty, "f::Local::run");
        let call = targets.iter().find(|target| target.loc == "4:17-18").unwrap();
        assert_eq!(call.context.as_deref(), Some("f::Local::run"));
        assert_eq!(call.contextsym.as_deref(), Some("_ZZ1fvEN5Local3runEv"));
    }

    #[test]
    fn test_unnameable_entity_becomes_diagnostic() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let f = b.function(None, "f", b.token(file, 1, 5, "f"), vec![]);
        b.decl_mut(f).name = None;
        let local_class = b.record(Some(f), "Local", b.token(file, 2, 9, "Local"));
        let method = b.method(local_class, "run", b.token(file, 3, 9, "run"), vec![]);
        b.decl_node(
            f,
            vec![Node::decl(local_class, vec![Node::decl(method, vec![])])],
        );
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        let diagnostic = output
            .diagnostics
            .iter()
            .find(|diagnostic| diagnostic.entity == "run")
            .unwrap();
        assert_eq!(diagnostic.loc, "3:9");
        assert!(diagnostic.message.starts_with("No naming rule for function 'run'"));
        // The local class itself is still reported
        assert!(records(&output)
            .iter()
            .any(|record| matches!(record, IndexRecord::Target(target) if target.loc == "2:9-14")));
    }

    #[test]
    fn test_unnamed_parameters_are_skipped() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let f = b.function(None, "f", b.token(file, 1, 5, "f"), vec![CxxType::int()]);
        let unnamed = b.param(f, None, b.token(file, 1, 10, ")"), CxxType::int());
        b.decl_node(f, vec![Node::decl(unnamed, vec![])]);
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        assert_eq!(output.records_emitted, 2);
    }

    #[test]
    fn test_dependent_member_resolved_per_instantiation() {
        let fx = Fixture::new();
        let mut b = TuBuilder::new();
        let file = b.file(fx.source("a.cpp"));
        let a = b.record(None, "A", b.token(file, 1, 7, "A"));
        let a_go = b.method(a, "go", b.token(file, 1, 16, "go"), vec![]);
        let c = b.record(None, "C", b.token(file, 2, 7, "C"));
        let c_go = b.method(c, "go", b.token(file, 2, 16, "go"), vec![]);

        let pattern = b.function(None, "call", b.token(file, 4, 5, "call"), vec![]);
        b.decl_mut(pattern).template = TemplateInfo::Pattern;
        let inst_a = b.function(None, "call", b.token(file, 4, 5, "call"), vec![]);
        b.decl_mut(inst_a).template = TemplateInfo::Instantiation {
            pattern,
            args: Vec::new(),
        };
        let inst_c = b.function(None, "call", b.token(file, 4, 5, "call"), vec![]);
        b.decl_mut(inst_c).template = TemplateInfo::Instantiation {
            pattern,
            args: Vec::new(),
        };

        let go = b.token(file, 5, 4, "go");
        let unit_pattern = Node::decl(pattern, vec![Node::dependent_member(go.clone(), vec![])]);
        let for_a = Node::decl(
            inst_a,
            vec![Node::call(a_go, CallForm::Member, Some(go.clone()), vec![])],
        );
        let for_c = Node::decl(
            inst_c,
            vec![Node::call(c_go, CallForm::Member, Some(go.clone()), vec![])],
        );
        b.root(Node::template(unit_pattern, vec![for_a, for_c]));
        let unit = b.finish();

        let output = walk(&unit, &fx.config);
        let at_go: Vec<String> = records(&output)
            .into_iter()
            .filter_map(|record| match record {
                IndexRecord::Target(target) if target.loc == "5:4-6" => {
                    Some(target.sym.to_string())
                }
                _ => None,
            })
            .collect();
        assert_eq!(at_go, vec!["_ZN1A2goEv", "_ZN1C2goEv"]);

        // The template's own name is reported once, from the gather pass
        let defs = records(&output)
            .into_iter()
            .filter(|record| matches!(record, IndexRecord::Source(source) if source.loc == "4:5-9"))
            .count();
        assert_eq!(defs, 1);
    }
}
