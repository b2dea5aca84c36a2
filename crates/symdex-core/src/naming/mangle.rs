//! Itanium C++ ABI name mangling
//!
//! Covers the subset of the ABI that namespace- and record-scope functions
//! and variables need: nested names, constructors, destructors, operators,
//! conversion functions, template arguments and the substitution table.
//! Members of function-local classes use the `Z <function> E <entity>` local
//! name. Locals themselves never reach the mangler, they get location-based
//! ids.

use super::{NamingError, NamingResult};
use crate::model::{
    CxxType, DeclId, DeclKind, FunctionInfo, FunctionKind, LinkageLang, TemplateArg,
    TemplateInfo, TranslationUnit,
};

/// Produces linker names for declarations with linkage
pub trait Mangler: Send + Sync {
    fn mangle(&self, unit: &TranslationUnit, decl: DeclId) -> NamingResult<String>;
}

/// Mangler following the Itanium C++ ABI, as used by GCC and Clang
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumMangler;

impl Mangler for ItaniumMangler {
    fn mangle(&self, unit: &TranslationUnit, decl: DeclId) -> NamingResult<String> {
        let mut state = MangleState::new(unit, decl);
        state.encoding(decl)?;
        Ok(state.out)
    }
}

/// `(spelling, code)` pairs for operators taking a single operand
const UNARY_OPERATORS: &[(&str, &str)] = &[
    ("+", "ps"),
    ("-", "ng"),
    ("&", "ad"),
    ("*", "de"),
    ("~", "co"),
    ("!", "nt"),
    ("++", "pp"),
    ("--", "mm"),
];

const BINARY_OPERATORS: &[(&str, &str)] = &[
    ("new", "nw"),
    ("new[]", "na"),
    ("delete", "dl"),
    ("delete[]", "da"),
    ("+", "pl"),
    ("-", "mi"),
    ("*", "ml"),
    ("/", "dv"),
    ("%", "rm"),
    ("&", "an"),
    ("|", "or"),
    ("^", "eo"),
    ("=", "aS"),
    ("+=", "pL"),
    ("-=", "mI"),
    ("*=", "mL"),
    ("/=", "dV"),
    ("%=", "rM"),
    ("&=", "aN"),
    ("|=", "oR"),
    ("^=", "eO"),
    ("<<", "ls"),
    (">>", "rs"),
    ("<<=", "lS"),
    (">>=", "rS"),
    ("==", "eq"),
    ("!=", "ne"),
    ("<", "lt"),
    (">", "gt"),
    ("<=", "le"),
    (">=", "ge"),
    ("<=>", "ss"),
    ("&&", "aa"),
    ("||", "oo"),
    ("++", "pp"),
    ("--", "mm"),
    (",", "cm"),
    ("->*", "pm"),
    ("->", "pt"),
    ("()", "cl"),
    ("[]", "ix"),
];

struct MangleState<'a> {
    unit: &'a TranslationUnit,
    /// Declaration being mangled
    target: DeclId,
    out: String,
    /// Keys of substitution candidates, in the order they were emitted
    subs: Vec<String>,
    /// Function whose local name is being emitted; scope chains stop there
    local_root: Option<DeclId>,
}

impl<'a> MangleState<'a> {
    fn new(unit: &'a TranslationUnit, target: DeclId) -> Self {
        Self {
            unit,
            target,
            out: String::new(),
            subs: Vec::new(),
            local_root: None,
        }
    }

    fn encoding(&mut self, id: DeclId) -> NamingResult<()> {
        let decl = self.unit.decl(id)?;
        let name = decl
            .name
            .as_deref()
            .ok_or_else(|| self.unrepresentable(id))?;
        let at_file_scope = self.effective_parent(id)?.is_none();

        match &decl.kind {
            DeclKind::Function(info) => {
                if self.has_c_linkage(id)? || (name == "main" && at_file_scope) {
                    self.out.push_str(name);
                    return Ok(());
                }
                self.out.push_str("_Z");
                self.name(id, Some(info))?;
                self.bare_function_type(&info.params)
            }
            DeclKind::Variable { .. } => {
                if self.has_c_linkage(id)? || at_file_scope {
                    self.out.push_str(name);
                    return Ok(());
                }
                self.out.push_str("_Z");
                self.name(id, None)
            }
            _ => Err(self.unrepresentable(id)),
        }
    }

    /// `<encoding>` of a function as it appears inside a local name
    fn function_encoding(&mut self, id: DeclId) -> NamingResult<()> {
        let decl = self.unit.decl(id)?;
        let (DeclKind::Function(info), Some(name)) = (&decl.kind, decl.name.as_deref()) else {
            return Err(self.unrepresentable(id));
        };
        if self.has_c_linkage(id)? || (name == "main" && self.effective_parent(id)?.is_none()) {
            self.source_name(name);
            return Ok(());
        }
        self.name(id, Some(info))?;
        self.bare_function_type(&info.params)
    }

    /// `Z <function encoding> E`, then `entity` relative to the function body
    fn local_name(
        &mut self,
        function: DeclId,
        entity: impl FnOnce(&mut Self) -> NamingResult<()>,
    ) -> NamingResult<()> {
        self.out.push('Z');
        self.function_encoding(function)?;
        self.out.push('E');
        let outer = self.local_root.replace(function);
        let result = entity(self);
        self.local_root = outer;
        result
    }

    /// Innermost function enclosing `id`, below the current local root
    fn enclosing_function(&self, id: DeclId) -> NamingResult<Option<DeclId>> {
        let mut current = self.unit.decl(id)?.parent;
        while let Some(scope) = current {
            if Some(scope) == self.local_root {
                return Ok(None);
            }
            let decl = self.unit.decl(scope)?;
            if matches!(decl.kind, DeclKind::Function(_)) {
                return Ok(Some(scope));
            }
            current = decl.parent;
        }
        Ok(None)
    }

    /// Parent with linkage specification blocks skipped
    fn effective_parent(&self, id: DeclId) -> NamingResult<Option<DeclId>> {
        let mut current = self.unit.decl(id)?.parent;
        while let Some(parent) = current {
            if Some(parent) == self.local_root {
                return Ok(None);
            }
            let decl = self.unit.decl(parent)?;
            if !matches!(decl.kind, DeclKind::LinkageSpec { .. }) {
                return Ok(Some(parent));
            }
            current = decl.parent;
        }
        Ok(None)
    }

    /// Directly enclosed by an `extern "C"` block
    fn has_c_linkage(&self, id: DeclId) -> NamingResult<bool> {
        let mut current = self.unit.decl(id)?.parent;
        while let Some(parent) = current {
            let decl = self.unit.decl(parent)?;
            match decl.kind {
                DeclKind::LinkageSpec { lang } => {
                    if lang == LinkageLang::C {
                        return Ok(true);
                    }
                }
                _ => return Ok(false),
            }
            current = decl.parent;
        }
        Ok(false)
    }

    fn is_std(&self, id: DeclId) -> NamingResult<bool> {
        let decl = self.unit.decl(id)?;
        Ok(matches!(decl.kind, DeclKind::Namespace { inline: false })
            && decl.name.as_deref() == Some("std")
            && self.effective_parent(id)?.is_none())
    }

    fn name(&mut self, id: DeclId, function: Option<&FunctionInfo>) -> NamingResult<()> {
        match self.enclosing_function(id)? {
            Some(scope) => self.local_name(scope, |state| state.nested_name(id, function)),
            None => self.nested_name(id, function),
        }
    }

    fn nested_name(&mut self, id: DeclId, function: Option<&FunctionInfo>) -> NamingResult<()> {
        match self.effective_parent(id)? {
            None => self.unqualified_name(id),
            Some(parent) if self.is_std(parent)? => {
                self.out.push_str("St");
                self.unqualified_name(id)
            }
            Some(parent) => {
                self.out.push('N');
                if function.is_some_and(|info| info.is_const) {
                    self.out.push('K');
                }
                self.prefix(parent)?;
                self.unqualified_name(id)?;
                self.out.push('E');
                Ok(())
            }
        }
    }

    fn unqualified_name(&mut self, id: DeclId) -> NamingResult<()> {
        let decl = self.unit.decl(id)?;
        if let DeclKind::Function(info) = &decl.kind {
            match &info.kind {
                FunctionKind::Constructor => {
                    self.out.push_str("C1");
                    return Ok(());
                }
                FunctionKind::Destructor => {
                    self.out.push_str("D1");
                    return Ok(());
                }
                FunctionKind::Conversion { target } => {
                    self.out.push_str("cv");
                    return self.mangle_type(target);
                }
                FunctionKind::Free | FunctionKind::Method => {}
            }
            if let Some(name) = decl.name.as_deref() {
                if let Some(code) = operator_code(name, info) {
                    self.out.push_str(code);
                    return Ok(());
                }
            }
        }

        match (&decl.kind, decl.name.as_deref()) {
            (_, Some(name)) => self.source_name(name),
            (DeclKind::Namespace { .. }, None) => self.out.push_str("12_GLOBAL__N_1"),
            (DeclKind::Record { .. }, None) => self.out.push_str("Ut_"),
            (_, None) => return Err(self.unrepresentable(id)),
        }
        Ok(())
    }

    fn source_name(&mut self, name: &str) {
        self.out.push_str(&name.len().to_string());
        self.out.push_str(name);
    }

    /// Emit the nested-name prefix naming scope `id`, registering substitutions
    fn prefix(&mut self, id: DeclId) -> NamingResult<()> {
        if self.is_std(id)? {
            self.out.push_str("St");
            return Ok(());
        }
        if matches!(self.unit.decl(id)?.kind, DeclKind::Function(_)) {
            return Err(self.unrepresentable(id));
        }
        let key = self.entity_key(id, true)?;
        if self.try_substitute(&key) {
            return Ok(());
        }
        self.scoped_component(id)?;
        self.subs.push(key);
        Ok(())
    }

    /// Parent prefix plus the component for `id`, with template arguments
    ///
    /// The caller registers the full component as a substitution candidate.
    fn scoped_component(&mut self, id: DeclId) -> NamingResult<()> {
        let decl = self.unit.decl(id)?;
        let args = decl.template.args();
        if args.is_empty() {
            self.parent_prefix(id)?;
            return self.unqualified_name(id);
        }

        let template_key = self.template_key(id)?;
        if !self.try_substitute(&template_key) {
            self.parent_prefix(id)?;
            self.unqualified_name(id)?;
            self.subs.push(template_key);
        }
        self.template_args(args)
    }

    fn parent_prefix(&mut self, id: DeclId) -> NamingResult<()> {
        if let Some(parent) = self.effective_parent(id)? {
            self.prefix(parent)?;
        }
        Ok(())
    }

    fn template_args(&mut self, args: &[TemplateArg]) -> NamingResult<()> {
        self.out.push('I');
        for arg in args {
            match arg {
                TemplateArg::Type { ty } => self.mangle_type(ty)?,
                TemplateArg::Integral { ty, value } => {
                    self.out.push('L');
                    self.mangle_type(ty)?;
                    if *value < 0 {
                        self.out.push('n');
                    }
                    self.out.push_str(&value.unsigned_abs().to_string());
                    self.out.push('E');
                }
            }
        }
        self.out.push('E');
        Ok(())
    }

    fn bare_function_type(&mut self, params: &[CxxType]) -> NamingResult<()> {
        if params.is_empty() {
            self.out.push('v');
            return Ok(());
        }
        params.iter().try_for_each(|param| self.mangle_type(param))
    }

    fn mangle_type(&mut self, ty: &CxxType) -> NamingResult<()> {
        if let CxxType::Builtin { name } = ty {
            self.out.push_str(name.code());
            return Ok(());
        }
        let key = self.type_key(ty)?;
        if self.try_substitute(&key) {
            return Ok(());
        }

        match ty {
            CxxType::Builtin { .. } => {}
            CxxType::Tag { decl, .. } => self.class_type(*decl)?,
            CxxType::Pointer { pointee } => {
                self.out.push('P');
                self.mangle_type(pointee)?;
            }
            CxxType::LValueRef { referent } => {
                self.out.push('R');
                self.mangle_type(referent)?;
            }
            CxxType::RValueRef { referent } => {
                self.out.push('O');
                self.mangle_type(referent)?;
            }
            CxxType::Const { inner } => {
                self.out.push('K');
                self.mangle_type(inner)?;
            }
            CxxType::Array { size, element } => {
                self.out.push('A');
                if let Some(size) = size {
                    self.out.push_str(&size.to_string());
                }
                self.out.push('_');
                self.mangle_type(element)?;
            }
            CxxType::Function { ret, params } => {
                self.out.push('F');
                self.mangle_type(ret)?;
                self.bare_function_type(params)?;
                self.out.push('E');
            }
            CxxType::TemplateParam { index, .. } => match index {
                0 => self.out.push_str("T_"),
                n => self.out.push_str(&format!("T{}_", n - 1)),
            },
        }
        self.subs.push(key);
        Ok(())
    }

    fn class_type(&mut self, id: DeclId) -> NamingResult<()> {
        if let Some(scope) = self.enclosing_function(id)? {
            return self.local_name(scope, |state| state.class_type(id));
        }
        match self.effective_parent(id)? {
            None => self.scoped_component(id),
            Some(parent) if self.is_std(parent)? => {
                self.out.push_str("St");
                self.unqualified_name(id)?;
                let args = self.unit.decl(id)?.template.args();
                if !args.is_empty() {
                    self.template_args(args)?;
                }
                Ok(())
            }
            Some(_) => {
                self.out.push('N');
                self.scoped_component(id)?;
                self.out.push('E');
                Ok(())
            }
        }
    }

    /// Structural identity of an entity, stable across redeclarations
    fn entity_key(&self, id: DeclId, with_args: bool) -> NamingResult<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(scope) = current {
            let decl = self.unit.decl(scope)?;
            if !matches!(decl.kind, DeclKind::LinkageSpec { .. }) {
                let mut segment = decl.name_or_anonymous().to_string();
                if with_args || scope != id {
                    for arg in decl.template.args() {
                        segment.push('|');
                        segment.push_str(&self.arg_key(arg)?);
                    }
                }
                segments.push(segment);
            }
            current = decl.parent;
        }
        segments.reverse();
        Ok(format!("e:{}", segments.join("::")))
    }

    fn template_key(&self, id: DeclId) -> NamingResult<String> {
        let decl = self.unit.decl(id)?;
        let base = match decl.template {
            TemplateInfo::Instantiation { pattern, .. } => self.entity_key(pattern, false)?,
            _ => self.entity_key(id, false)?,
        };
        Ok(format!("t:{}", base))
    }

    fn arg_key(&self, arg: &TemplateArg) -> NamingResult<String> {
        match arg {
            TemplateArg::Type { ty } => self.type_key(ty),
            TemplateArg::Integral { ty, value } => Ok(format!("L{}{}", self.type_key(ty)?, value)),
        }
    }

    fn type_key(&self, ty: &CxxType) -> NamingResult<String> {
        Ok(match ty {
            CxxType::Builtin { name } => name.code().to_string(),
            CxxType::Tag { decl, .. } => self.entity_key(*decl, true)?,
            CxxType::Pointer { pointee } => format!("P{}", self.type_key(pointee)?),
            CxxType::LValueRef { referent } => format!("R{}", self.type_key(referent)?),
            CxxType::RValueRef { referent } => format!("O{}", self.type_key(referent)?),
            CxxType::Const { inner } => format!("K{}", self.type_key(inner)?),
            CxxType::Array { size, element } => {
                format!("A{}_{}", size.map(|s| s.to_string()).unwrap_or_default(), self.type_key(element)?)
            }
            CxxType::Function { ret, params } => {
                let mut key = format!("F{}", self.type_key(ret)?);
                for param in params {
                    key.push(',');
                    key.push_str(&self.type_key(param)?);
                }
                key
            }
            CxxType::TemplateParam { index, .. } => format!("T{}", index),
        })
    }

    /// Names the declaration being mangled, and `id` when a scope is what failed
    fn unrepresentable(&self, id: DeclId) -> NamingError {
        let describe = |id: DeclId| {
            self.unit
                .decl(id)
                .map(|decl| (decl.kind.describe(), decl.name_or_anonymous().to_string()))
        };
        let (kind, name) = match describe(self.target) {
            Ok(described) => described,
            Err(err) => return err.into(),
        };
        if id == self.target {
            return NamingError::Unrepresentable { kind, name };
        }
        match describe(id) {
            Ok((scope_kind, scope)) => NamingError::UnrepresentableScope {
                kind,
                name,
                scope_kind,
                scope,
            },
            Err(err) => err.into(),
        }
    }

    fn try_substitute(&mut self, key: &str) -> bool {
        match self.subs.iter().position(|candidate| candidate == key) {
            Some(position) => {
                self.out.push_str(&substitution(position));
                true
            }
            None => false,
        }
    }
}

/// `S_`, `S0_`, `S1_` ... `SZ_`, `S10_` ...
fn substitution(position: usize) -> String {
    if position == 0 {
        return "S_".to_string();
    }
    let mut n = position - 1;
    let mut digits = Vec::new();
    loop {
        let digit = (n % 36) as u8;
        digits.push(if digit < 10 { b'0' + digit } else { b'A' + digit - 10 });
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    format!("S{}_", String::from_utf8_lossy(&digits))
}

fn operator_code(name: &str, info: &FunctionInfo) -> Option<&'static str> {
    let spelled = name.strip_prefix("operator")?;
    // operatorFoo is an ordinary identifier
    if spelled.starts_with(|c: char| c.is_alphanumeric() || c == '_')
        && !spelled.starts_with("new")
        && !spelled.starts_with("delete")
    {
        return None;
    }
    let op: String = spelled.chars().filter(|c| !c.is_whitespace()).collect();
    let implicit_object = usize::from(info.is_method_like() && !info.is_static);
    let arity = info.params.len() + implicit_object;
    let table = if arity == 1 {
        UNARY_OPERATORS
    } else {
        BINARY_OPERATORS
    };
    table
        .iter()
        .chain(BINARY_OPERATORS)
        .find(|(spelling, _)| *spelling == op)
        .map(|(_, code)| *code)
}
