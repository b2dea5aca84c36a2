//! Declarations as resolved by the front end

use super::types::CxxType;
use super::{DeclId, Token};
use serde::{Deserialize, Serialize};

/// Language of a linkage specification block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkageLang {
    C,
    Cxx,
}

/// class / struct / union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Class,
    Struct,
    Union,
}

/// Structural kind of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function_kind", rename_all = "snake_case")]
pub enum FunctionKind {
    Free,
    Method,
    Constructor,
    Destructor,
    Conversion { target: CxxType },
}

/// Signature and override information for a function or method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    #[serde(flatten)]
    pub kind: FunctionKind,
    #[serde(default)]
    pub params: Vec<CxxType>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Directly overridden base methods, in base-declaration order
    #[serde(default)]
    pub overrides: Vec<DeclId>,
}

impl FunctionInfo {
    pub fn free(params: Vec<CxxType>) -> Self {
        Self {
            kind: FunctionKind::Free,
            params,
            is_const: false,
            is_static: false,
            overrides: Vec::new(),
        }
    }

    pub fn method(params: Vec<CxxType>) -> Self {
        Self {
            kind: FunctionKind::Method,
            ..Self::free(params)
        }
    }

    pub fn is_method_like(&self) -> bool {
        !matches!(self.kind, FunctionKind::Free)
    }
}

/// A template argument as written in a specialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateArg {
    Type { ty: CxxType },
    Integral { ty: CxxType, value: i64 },
}

impl std::fmt::Display for TemplateArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateArg::Type { ty } => write!(f, "{}", ty),
            TemplateArg::Integral { value, .. } => write!(f, "{}", value),
        }
    }
}

/// Render `<A, B>` the way the compiler prints argument lists
pub fn format_template_args(args: &[TemplateArg]) -> String {
    let inner = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if inner.ends_with('>') {
        format!("<{} >", inner)
    } else {
        format!("<{}>", inner)
    }
}

/// How a declaration relates to templates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateInfo {
    #[default]
    None,
    /// The generic declaration owned by a class or function template
    Pattern,
    /// Implicitly instantiated from `pattern`
    Instantiation {
        pattern: DeclId,
        #[serde(default)]
        args: Vec<TemplateArg>,
    },
    /// Explicitly specialized by the user
    ExplicitSpecialization {
        #[serde(default)]
        args: Vec<TemplateArg>,
    },
}

impl TemplateInfo {
    pub fn args(&self) -> &[TemplateArg] {
        match self {
            TemplateInfo::Instantiation { args, .. }
            | TemplateInfo::ExplicitSpecialization { args } => args,
            TemplateInfo::None | TemplateInfo::Pattern => &[],
        }
    }
}

/// Raw `(lang, kind, symbol)` binding annotation carried by a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingAnnotation {
    pub lang: String,
    pub kind: String,
    pub symbol: String,
}

/// Kind-specific declaration data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    Namespace {
        #[serde(default)]
        inline: bool,
    },
    NamespaceAlias,
    LinkageSpec {
        lang: LinkageLang,
    },
    Record {
        tag: TagKind,
    },
    Enum {
        #[serde(default)]
        scoped: bool,
    },
    Typedef,
    Function(FunctionInfo),
    Variable {
        ty: CxxType,
        /// Local variable or parameter
        #[serde(default)]
        local: bool,
        #[serde(default)]
        param: bool,
    },
    Field {
        /// Position of the field within its record
        index: u32,
    },
    EnumConstant,
    TemplateParam,
    Label,
    Using,
}

impl DeclKind {
    /// Declarations whose bodies become the enclosing context of nested code
    pub fn owns_context(&self) -> bool {
        matches!(
            self,
            DeclKind::Function(_) | DeclKind::Record { .. } | DeclKind::Enum { .. }
        )
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, DeclKind::Record { .. } | DeclKind::Enum { .. })
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, DeclKind::Namespace { .. } | DeclKind::NamespaceAlias)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Namespace { .. } => "namespace",
            DeclKind::NamespaceAlias => "namespace alias",
            DeclKind::LinkageSpec { .. } => "linkage specification",
            DeclKind::Record { .. } => "record",
            DeclKind::Enum { .. } => "enum",
            DeclKind::Typedef => "typedef",
            DeclKind::Function(_) => "function",
            DeclKind::Variable { .. } => "variable",
            DeclKind::Field { .. } => "field",
            DeclKind::EnumConstant => "enum constant",
            DeclKind::TemplateParam => "template parameter",
            DeclKind::Label => "label",
            DeclKind::Using => "using declaration",
        }
    }
}

/// One declaration of the translation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    #[serde(flatten)]
    pub kind: DeclKind,
    /// `None` for anonymous declarations
    #[serde(default)]
    pub name: Option<String>,
    /// Semantic parent; `None` at translation-unit scope
    #[serde(default)]
    pub parent: Option<DeclId>,
    /// Token at the declaration's location
    pub token: Token,
    #[serde(default)]
    pub is_definition: bool,
    #[serde(default)]
    pub template: TemplateInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings_to: Vec<BindingAnnotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bound_as: Vec<BindingAnnotation>,
}

impl Decl {
    pub fn new(kind: DeclKind, name: Option<String>, parent: Option<DeclId>, token: Token) -> Self {
        Self {
            kind,
            name,
            parent,
            token,
            is_definition: false,
            template: TemplateInfo::None,
            bindings_to: Vec::new(),
            bound_as: Vec::new(),
        }
    }

    pub fn name_or_anonymous(&self) -> &str {
        self.name.as_deref().unwrap_or("(anonymous)")
    }

    pub fn function(&self) -> Option<&FunctionInfo> {
        match &self.kind {
            DeclKind::Function(info) => Some(info),
            _ => None,
        }
    }

    /// Pattern this declaration was instantiated from, if any
    pub fn instantiated_from(&self) -> Option<DeclId> {
        match self.template {
            TemplateInfo::Instantiation { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    /// Every declaration this one refers to
    pub fn references(&self) -> Vec<DeclId> {
        let mut ids: Vec<DeclId> = self.parent.into_iter().collect();
        if let TemplateInfo::Instantiation { pattern, args } = &self.template {
            ids.push(*pattern);
            collect_arg_refs(args, &mut ids);
        }
        if let TemplateInfo::ExplicitSpecialization { args } = &self.template {
            collect_arg_refs(args, &mut ids);
        }
        match &self.kind {
            DeclKind::Function(info) => {
                ids.extend(info.overrides.iter().copied());
                for param in &info.params {
                    param.collect_decls(&mut ids);
                }
                if let FunctionKind::Conversion { target } = &info.kind {
                    target.collect_decls(&mut ids);
                }
            }
            DeclKind::Variable { ty, .. } => ty.collect_decls(&mut ids),
            _ => {}
        }
        ids
    }
}

fn collect_arg_refs(args: &[TemplateArg], ids: &mut Vec<DeclId>) {
    for arg in args {
        match arg {
            TemplateArg::Type { ty } | TemplateArg::Integral { ty, .. } => ty.collect_decls(ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileId, SourceLoc};

    fn token() -> Token {
        Token::new(SourceLoc::new(FileId(0), 1, 0), "x")
    }

    #[test]
    fn test_context_owners() {
        assert!(DeclKind::Function(FunctionInfo::free(vec![])).owns_context());
        assert!(DeclKind::Record { tag: TagKind::Class }.owns_context());
        assert!(DeclKind::Enum { scoped: true }.owns_context());
        assert!(!DeclKind::Namespace { inline: false }.owns_context());
        assert!(!DeclKind::Field { index: 0 }.owns_context());
    }

    #[test]
    fn test_references_include_overrides_and_pattern() {
        let mut info = FunctionInfo::method(vec![]);
        info.overrides = vec![DeclId(3), DeclId(4)];
        let mut decl = Decl::new(DeclKind::Function(info), Some("f".into()), Some(DeclId(1)), token());
        decl.template = TemplateInfo::Instantiation {
            pattern: DeclId(7),
            args: Vec::new(),
        };
        let refs = decl.references();
        for id in [1, 3, 4, 7] {
            assert!(refs.contains(&DeclId(id)));
        }
    }

    #[test]
    fn test_template_args_formatting() {
        let args = vec![
            TemplateArg::Type { ty: CxxType::int() },
            TemplateArg::Integral {
                ty: CxxType::int(),
                value: 3,
            },
        ];
        assert_eq!(format_template_args(&args), "<int, 3>");
    }

    #[test]
    fn test_decl_json_shape() {
        let json = r#"{
            "kind": "variable",
            "ty": {"kind": "builtin", "name": "int"},
            "local": true,
            "name": "x",
            "parent": 2,
            "token": {"loc": {"file": 0, "line": 4, "column": 8}, "text": "x"},
            "is_definition": true
        }"#;
        let decl: Decl = serde_json::from_str(json).unwrap();
        assert_eq!(decl.parent, Some(DeclId(2)));
        assert!(matches!(decl.kind, DeclKind::Variable { local: true, .. }));
        assert_eq!(decl.template, TemplateInfo::None);
    }
}
