//! Qualified names
//!
//! Two renderings of the scope chain: the one baked into type and namespace
//! identifiers, and the display name used in labels and contexts.

use super::NamingResult;
use crate::model::decl::format_template_args;
use crate::model::{Decl, DeclId, DeclKind, TagKind, TemplateInfo, TranslationUnit};

/// Enclosing declarations of `id`, outermost first, linkage specs dropped
fn scope_chain(unit: &TranslationUnit, id: DeclId) -> NamingResult<Vec<&Decl>> {
    let mut chain = Vec::new();
    let mut current = unit.decl(id)?.parent;
    while let Some(parent) = current {
        let decl = unit.decl(parent)?;
        if !matches!(decl.kind, DeclKind::LinkageSpec { .. }) {
            chain.push(decl);
        }
        current = decl.parent;
    }
    chain.reverse();
    Ok(chain)
}

/// Qualified name used by `T_` and `NS_` identifiers
///
/// Anonymous and inline namespaces contribute nothing, unnamed unscoped
/// enums fold into their parent, and only explicit specializations render
/// their argument list. An enclosing function contributes its bare name.
pub fn id_qualified_name(unit: &TranslationUnit, id: DeclId) -> NamingResult<String> {
    let decl = unit.decl(id)?;
    let mut result = String::new();
    for scope in scope_chain(unit, id)? {
        match &scope.kind {
            DeclKind::Namespace { inline } => match &scope.name {
                Some(name) if !inline => result.push_str(name),
                _ => continue,
            },
            DeclKind::Record { .. } => {
                result.push_str(scope.name_or_anonymous());
                if let TemplateInfo::ExplicitSpecialization { args } = &scope.template {
                    result.push_str(&format_template_args(args));
                }
            }
            DeclKind::Enum { scoped } => {
                if *scoped || scope.name.is_some() {
                    result.push_str(scope.name_or_anonymous());
                } else {
                    continue;
                }
            }
            _ => result.push_str(scope.name_or_anonymous()),
        }
        result.push_str("::");
    }
    result.push_str(decl.name_or_anonymous());
    Ok(result)
}

/// Display name of a declaration, e.g. `mozilla::dom::Element::GetId`
pub fn pretty_name(unit: &TranslationUnit, id: DeclId) -> NamingResult<String> {
    let decl = unit.decl(id)?;
    let mut parts: Vec<String> = Vec::new();
    for scope in scope_chain(unit, id)? {
        match &scope.kind {
            DeclKind::Namespace { inline: true } => continue,
            DeclKind::Enum { scoped: false } => continue,
            DeclKind::Record { .. } => {
                let mut part = display_name(scope);
                let args = scope.template.args();
                if !args.is_empty() {
                    part.push_str(&format_template_args(args));
                }
                parts.push(part);
            }
            _ => parts.push(display_name(scope)),
        }
    }
    parts.push(display_name(decl));
    Ok(parts.join("::"))
}

fn display_name(decl: &Decl) -> String {
    if let Some(name) = &decl.name {
        return name.clone();
    }
    match &decl.kind {
        DeclKind::Namespace { .. } => "(anonymous namespace)".to_string(),
        DeclKind::Record { tag } => match tag {
            TagKind::Class => "(anonymous class)".to_string(),
            TagKind::Struct => "(anonymous struct)".to_string(),
            TagKind::Union => "(anonymous union)".to_string(),
        },
        _ => "(anonymous)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CxxType, TemplateArg, TuBuilder};

    #[test]
    fn test_anonymous_and_inline_namespaces_are_skipped_in_ids() {
        let mut b = TuBuilder::new();
        let f = b.file("/src/a.h");
        let outer = b.namespace(None, "mozilla", b.token(f, 1, 10, "mozilla"));
        let anon = b.anonymous_namespace(Some(outer), b.token(f, 2, 0, "namespace"));
        let inline = b.inline_namespace(Some(anon), "v1", b.token(f, 3, 17, "v1"));
        let record = b.record(Some(inline), "Widget", b.token(f, 4, 6, "Widget"));
        let unit = b.finish();

        assert_eq!(id_qualified_name(&unit, record).unwrap(), "mozilla::Widget");
        assert_eq!(
            pretty_name(&unit, record).unwrap(),
            "mozilla::(anonymous namespace)::Widget"
        );
    }

    #[test]
    fn test_unnamed_unscoped_enum_folds_into_parent() {
        let mut b = TuBuilder::new();
        let f = b.file("/src/a.h");
        let record = b.record(None, "Frame", b.token(f, 1, 6, "Frame"));
        let anon_enum = b.enumeration(Some(record), None, false, b.token(f, 2, 2, "enum"));
        let constant = b.enum_constant(anon_enum, "kMax", b.token(f, 2, 9, "kMax"));
        let scoped = b.enumeration(Some(record), Some("Kind"), true, b.token(f, 3, 13, "Kind"));
        let inner = b.enum_constant(scoped, "Block", b.token(f, 3, 20, "Block"));
        let unit = b.finish();

        assert_eq!(id_qualified_name(&unit, constant).unwrap(), "Frame::kMax");
        assert_eq!(id_qualified_name(&unit, inner).unwrap(), "Frame::Kind::Block");
        assert_eq!(pretty_name(&unit, constant).unwrap(), "Frame::kMax");
    }

    #[test]
    fn test_explicit_specialization_renders_args() {
        let mut b = TuBuilder::new();
        let f = b.file("/src/a.h");
        let spec = b.record(None, "Traits", b.token(f, 5, 7, "Traits"));
        b.decl_mut(spec).template = TemplateInfo::ExplicitSpecialization {
            args: vec![TemplateArg::Type { ty: CxxType::int() }],
        };
        let nested = b.typedef(Some(spec), "Value", b.token(f, 6, 16, "Value"));
        let unit = b.finish();

        assert_eq!(id_qualified_name(&unit, nested).unwrap(), "Traits<int>::Value");
    }

    #[test]
    fn test_local_types_are_scoped_by_function_name() {
        let mut b = TuBuilder::new();
        let f = b.file("/src/a.cpp");
        let func = b.function(None, "run", b.token(f, 1, 5, "run"), vec![]);
        let local = b.record(Some(func), "Helper", b.token(f, 2, 9, "Helper"));
        let anon = b.anonymous_namespace(None, b.token(f, 4, 0, "namespace"));
        let hidden = b.function(Some(anon), "run", b.token(f, 5, 5, "run"), vec![]);
        let nested = b.record(Some(hidden), "Helper", b.token(f, 6, 9, "Helper"));
        let unit = b.finish();

        assert_eq!(id_qualified_name(&unit, local).unwrap(), "run::Helper");
        assert_eq!(id_qualified_name(&unit, nested).unwrap(), "run::Helper");
        assert_eq!(
            pretty_name(&unit, nested).unwrap(),
            "(anonymous namespace)::run::Helper"
        );
    }
}
