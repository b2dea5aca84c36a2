//! Index records
//!
//! Each emitted fact is one compact JSON object on its own line. Target
//! records make an occurrence findable under a symbol; source records
//! describe the occurrence for the annotated source view.

pub mod binding;
pub mod emitter;

pub use binding::{BindingAttributes, BindingLang, SlotAttribute, SlotKind};
pub use emitter::{EmitError, EmitResult, Occurrence, RecordEmitter};

use crate::{RefKind, SymbolId};
use serde::{Deserialize, Serialize};

/// Occurrence of one symbol, keyed for cross-reference lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub loc: String,
    pub target: u8,
    pub kind: RefKind,
    pub pretty: String,
    pub sym: SymbolId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextsym: Option<String>,
    #[serde(
        rename = "slotOwner",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub slot_owner: Option<SlotAttribute>,
    #[serde(
        rename = "bindingSlots",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub binding_slots: Vec<SlotAttribute>,
}

/// The occurrence itself, as shown when browsing the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub loc: String,
    pub source: u8,
    /// `<kind>,<syntax kind>`, empty for no-crossref occurrences
    pub syntax: String,
    pub pretty: String,
    /// Comma-joined symbol list
    pub sym: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_crossref: Option<u8>,
}

impl SourceRecord {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.sym.split(',').filter(|sym| !sym.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexRecord {
    Target(TargetRecord),
    Source(SourceRecord),
}

impl IndexRecord {
    /// Serialized form, without the trailing newline
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Whether the record mentions `symbol`
    pub fn mentions(&self, symbol: &str) -> bool {
        match self {
            IndexRecord::Target(record) => record.sym.as_str() == symbol,
            IndexRecord::Source(record) => record.symbols().any(|sym| sym == symbol),
        }
    }

    pub fn loc(&self) -> &str {
        match self {
            IndexRecord::Target(record) => &record.loc,
            IndexRecord::Source(record) => &record.loc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_field_order() {
        let record = IndexRecord::Target(TargetRecord {
            loc: "3:5-6".to_string(),
            target: 1,
            kind: RefKind::Def,
            pretty: "f".to_string(),
            sym: SymbolId::new("_Z1fi"),
            context: Some("ns::Outer".to_string()),
            contextsym: Some("_ZN2ns5OuterEv".to_string()),
            slot_owner: None,
            binding_slots: Vec::new(),
        });
        assert_eq!(
            record.to_line().unwrap(),
            r#"{"loc":"3:5-6","target":1,"kind":"def","pretty":"f","sym":"_Z1fi","context":"ns::Outer","contextsym":"_ZN2ns5OuterEv"}"#
        );
    }

    #[test]
    fn test_source_no_crossref_and_parse_back() {
        let line = r#"{"loc":"4:8-13","source":1,"syntax":"","pretty":"variable count","sym":"V_a_b","no_crossref":1}"#;
        let record = IndexRecord::parse(line).unwrap();
        assert!(matches!(&record, IndexRecord::Source(source) if source.no_crossref == Some(1)));
        assert_eq!(record.to_line().unwrap(), line);
        assert!(record.mentions("V_a_b"));
        assert_eq!(record.loc(), "4:8-13");
    }

    #[test]
    fn test_source_symbols_split() {
        let record = SourceRecord {
            loc: "1:0-3".to_string(),
            source: 1,
            syntax: "use,function".to_string(),
            pretty: "function D::run".to_string(),
            sym: "_ZN1D3runEv,_ZN1B3runEv".to_string(),
            no_crossref: None,
        };
        assert_eq!(
            record.symbols().collect::<Vec<_>>(),
            vec!["_ZN1D3runEv", "_ZN1B3runEv"]
        );
        assert!(IndexRecord::Source(record).mentions("_ZN1B3runEv"));
    }
}
