//! Canonical C++ types, as much of them as mangling needs

use super::DeclId;
use serde::{Deserialize, Serialize};

/// Fundamental types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    #[serde(rename = "wchar_t")]
    WChar,
    #[serde(rename = "char16_t")]
    Char16,
    #[serde(rename = "char32_t")]
    Char32,
    #[serde(rename = "nullptr_t")]
    NullPtr,
    Ellipsis,
}

impl Builtin {
    /// Itanium builtin-type code
    pub fn code(&self) -> &'static str {
        match self {
            Builtin::Void => "v",
            Builtin::Bool => "b",
            Builtin::Char => "c",
            Builtin::SignedChar => "a",
            Builtin::UnsignedChar => "h",
            Builtin::Short => "s",
            Builtin::UnsignedShort => "t",
            Builtin::Int => "i",
            Builtin::UnsignedInt => "j",
            Builtin::Long => "l",
            Builtin::UnsignedLong => "m",
            Builtin::LongLong => "x",
            Builtin::UnsignedLongLong => "y",
            Builtin::Float => "f",
            Builtin::Double => "d",
            Builtin::LongDouble => "e",
            Builtin::WChar => "w",
            Builtin::Char16 => "Ds",
            Builtin::Char32 => "Di",
            Builtin::NullPtr => "Dn",
            Builtin::Ellipsis => "z",
        }
    }

    pub fn spelling(&self) -> &'static str {
        match self {
            Builtin::Void => "void",
            Builtin::Bool => "bool",
            Builtin::Char => "char",
            Builtin::SignedChar => "signed char",
            Builtin::UnsignedChar => "unsigned char",
            Builtin::Short => "short",
            Builtin::UnsignedShort => "unsigned short",
            Builtin::Int => "int",
            Builtin::UnsignedInt => "unsigned int",
            Builtin::Long => "long",
            Builtin::UnsignedLong => "unsigned long",
            Builtin::LongLong => "long long",
            Builtin::UnsignedLongLong => "unsigned long long",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::LongDouble => "long double",
            Builtin::WChar => "wchar_t",
            Builtin::Char16 => "char16_t",
            Builtin::Char32 => "char32_t",
            Builtin::NullPtr => "std::nullptr_t",
            Builtin::Ellipsis => "...",
        }
    }
}

/// A canonical (typedef-free) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CxxType {
    Builtin {
        name: Builtin,
    },
    /// Class, struct, union or enum; specializations reference their own decl
    Tag {
        decl: DeclId,
        /// Printed name, used when rendering template argument lists
        spelling: String,
    },
    Pointer {
        pointee: Box<CxxType>,
    },
    #[serde(rename = "lvalue_ref")]
    LValueRef {
        referent: Box<CxxType>,
    },
    #[serde(rename = "rvalue_ref")]
    RValueRef {
        referent: Box<CxxType>,
    },
    Const {
        inner: Box<CxxType>,
    },
    Array {
        #[serde(default)]
        size: Option<u64>,
        element: Box<CxxType>,
    },
    Function {
        ret: Box<CxxType>,
        #[serde(default)]
        params: Vec<CxxType>,
    },
    TemplateParam {
        index: u32,
        name: String,
    },
}

impl CxxType {
    pub fn builtin(name: Builtin) -> Self {
        CxxType::Builtin { name }
    }

    pub fn int() -> Self {
        Self::builtin(Builtin::Int)
    }

    pub fn void() -> Self {
        Self::builtin(Builtin::Void)
    }

    pub fn tag(decl: DeclId, spelling: impl Into<String>) -> Self {
        CxxType::Tag {
            decl,
            spelling: spelling.into(),
        }
    }

    pub fn pointer(pointee: CxxType) -> Self {
        CxxType::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn lvalue_ref(referent: CxxType) -> Self {
        CxxType::LValueRef {
            referent: Box::new(referent),
        }
    }

    pub fn rvalue_ref(referent: CxxType) -> Self {
        CxxType::RValueRef {
            referent: Box::new(referent),
        }
    }

    pub fn konst(inner: CxxType) -> Self {
        CxxType::Const {
            inner: Box::new(inner),
        }
    }

    pub fn template_param(index: u32, name: impl Into<String>) -> Self {
        CxxType::TemplateParam {
            index,
            name: name.into(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, CxxType::Builtin { .. })
    }

    pub(crate) fn collect_decls(&self, out: &mut Vec<DeclId>) {
        match self {
            CxxType::Tag { decl, .. } => out.push(*decl),
            CxxType::Pointer { pointee: inner }
            | CxxType::LValueRef { referent: inner }
            | CxxType::RValueRef { referent: inner }
            | CxxType::Const { inner }
            | CxxType::Array { element: inner, .. } => inner.collect_decls(out),
            CxxType::Function { ret, params } => {
                ret.collect_decls(out);
                params.iter().for_each(|param| param.collect_decls(out));
            }
            CxxType::Builtin { .. } | CxxType::TemplateParam { .. } => {}
        }
    }
}

impl std::fmt::Display for CxxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CxxType::Builtin { name } => f.write_str(name.spelling()),
            CxxType::Tag { spelling, .. } => f.write_str(spelling),
            CxxType::Pointer { pointee } => write!(f, "{} *", pointee),
            CxxType::LValueRef { referent } => write!(f, "{} &", referent),
            CxxType::RValueRef { referent } => write!(f, "{} &&", referent),
            CxxType::Const { inner } => write!(f, "const {}", inner),
            CxxType::Array { size, element } => match size {
                Some(size) => write!(f, "{} [{}]", element, size),
                None => write!(f, "{} []", element),
            },
            CxxType::Function { ret, params } => {
                let params = params
                    .iter()
                    .map(|param| param.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{} ({})", ret, params)
            }
            CxxType::TemplateParam { name, .. } => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spelling() {
        let ty = CxxType::pointer(CxxType::konst(CxxType::builtin(Builtin::Char)));
        assert_eq!(ty.to_string(), "const char *");
        let arr = CxxType::Array {
            size: Some(4),
            element: Box::new(CxxType::int()),
        };
        assert_eq!(arr.to_string(), "int [4]");
    }

    #[test]
    fn test_builtin_json_names() {
        let ty: CxxType = serde_json::from_str(r#"{"kind":"builtin","name":"unsigned_long"}"#).unwrap();
        assert_eq!(ty, CxxType::builtin(Builtin::UnsignedLong));
        let ty: CxxType = serde_json::from_str(r#"{"kind":"builtin","name":"char16_t"}"#).unwrap();
        assert_eq!(ty, CxxType::builtin(Builtin::Char16));
    }
}
