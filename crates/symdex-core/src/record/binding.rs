//! Cross-language binding annotations
//!
//! A declaration may declare that it implements a slot owned by another
//! language's runtime (`bindings_to`), or that other runtimes expose it
//! (`bound_as`). The foreign symbol is carried through uninterpreted.

use crate::model::{BindingAnnotation, Decl};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingLang {
    Cpp,
    Jvm,
}

impl BindingLang {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "cpp" => Some(BindingLang::Cpp),
            "jvm" => Some(BindingLang::Jvm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Class,
    Method,
    Getter,
    Setter,
    Const,
}

impl SlotKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(SlotKind::Class),
            "method" => Some(SlotKind::Method),
            "getter" => Some(SlotKind::Getter),
            "setter" => Some(SlotKind::Setter),
            "const" => Some(SlotKind::Const),
            _ => None,
        }
    }
}

/// One `slotOwner` / `bindingSlots` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAttribute {
    pub slot_kind: SlotKind,
    pub slot_lang: BindingLang,
    pub owner_lang: BindingLang,
    pub sym: String,
}

/// Binding attributes attached to a declaration's own target records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingAttributes {
    pub slot_owner: Option<SlotAttribute>,
    pub binding_slots: Vec<SlotAttribute>,
}

impl BindingAttributes {
    /// Read the annotations of `decl`, ignoring any with an unknown lang or kind
    pub fn of(decl: &Decl) -> Self {
        let slot_owner = decl.bindings_to.iter().find_map(|annotation| {
            let (lang, kind) = parse(annotation)?;
            Some(SlotAttribute {
                slot_kind: kind,
                slot_lang: BindingLang::Cpp,
                owner_lang: lang,
                sym: annotation.symbol.clone(),
            })
        });
        let binding_slots = decl
            .bound_as
            .iter()
            .filter_map(|annotation| {
                let (lang, kind) = parse(annotation)?;
                Some(SlotAttribute {
                    slot_kind: kind,
                    slot_lang: lang,
                    owner_lang: BindingLang::Cpp,
                    sym: annotation.symbol.clone(),
                })
            })
            .collect();
        Self {
            slot_owner,
            binding_slots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot_owner.is_none() && self.binding_slots.is_empty()
    }
}

fn parse(annotation: &BindingAnnotation) -> Option<(BindingLang, SlotKind)> {
    Some((
        BindingLang::parse(&annotation.lang)?,
        SlotKind::parse(&annotation.kind)?,
    ))
}
