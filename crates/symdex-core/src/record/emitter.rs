//! Turning occurrences into records

use super::{BindingAttributes, IndexRecord, SourceRecord, TargetRecord};
use crate::context::ContextSnapshot;
use crate::model::{FileId, SourceLoc, Token};
use crate::store::IndexStore;
use crate::{RefKind, SymbolId, SyntaxKind};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Invalid token '{text}' at {loc}")]
    InvalidToken { text: String, loc: String },
    #[error("Destructor token '{text}' at {loc} does not start with '~'")]
    NotADestructor { text: String, loc: String },
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for record emission
pub type EmitResult<T> = Result<T, EmitError>;

/// Everything known about one interesting token
#[derive(Debug, Clone)]
pub struct Occurrence<'t> {
    pub kind: RefKind,
    pub syntax: SyntaxKind,
    pub pretty: String,
    pub token: &'t Token,
    pub symbols: Vec<SymbolId>,
    pub context: Option<ContextSnapshot>,
    /// Local entity: source record only
    pub no_crossref: bool,
    pub bindings: BindingAttributes,
}

impl<'t> Occurrence<'t> {
    pub fn new(kind: RefKind, syntax: SyntaxKind, pretty: impl Into<String>, token: &'t Token) -> Self {
        Self {
            kind,
            syntax,
            pretty: pretty.into(),
            token,
            symbols: Vec::new(),
            context: None,
            no_crossref: false,
            bindings: BindingAttributes::default(),
        }
    }

    pub fn with_symbols(mut self, symbols: Vec<SymbolId>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_context(mut self, context: Option<ContextSnapshot>) -> Self {
        self.context = context;
        self
    }

    pub fn with_no_crossref(mut self, no_crossref: bool) -> Self {
        self.no_crossref = no_crossref;
        self
    }

    pub fn with_bindings(mut self, bindings: BindingAttributes) -> Self {
        self.bindings = bindings;
        self
    }
}

/// Formats occurrences and appends them to the per-file buffers
#[derive(Debug, Default)]
pub struct RecordEmitter {
    emitted: usize,
    rejected: usize,
}

impl RecordEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Occurrences dropped for an invalid token
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Format `occurrence` and buffer its records under the token's file
    ///
    /// An invalid token drops the occurrence without failing the unit.
    pub fn emit(&mut self, store: &mut IndexStore, occurrence: &Occurrence<'_>) -> EmitResult<usize> {
        let (file, records) = match Self::records(occurrence) {
            Ok(result) => result,
            Err(err @ (EmitError::InvalidToken { .. } | EmitError::NotADestructor { .. })) => {
                debug!("Dropping occurrence: {}", err);
                self.rejected += 1;
                return Ok(0);
            }
            Err(err) => return Err(err),
        };
        let count = records.len();
        for record in records {
            store.push(file, record.to_line()?);
        }
        self.emitted += count;
        Ok(count)
    }

    /// The target and source records for one occurrence
    pub fn records(occurrence: &Occurrence<'_>) -> EmitResult<(FileId, Vec<IndexRecord>)> {
        let token = match occurrence.syntax {
            SyntaxKind::Destructor => destructor_name(occurrence.token)?,
            _ => occurrence.token.clone(),
        };
        validate(&token)?;
        let loc = token.range();

        let (context, contextsym) = match &occurrence.context {
            Some(snapshot) => (
                Some(snapshot.name.clone()).filter(|name| !name.is_empty()),
                Some(SymbolId::join(&snapshot.symbols)).filter(|syms| !syms.is_empty()),
            ),
            None => (None, None),
        };

        let mut records = Vec::with_capacity(occurrence.symbols.len() + 1);
        if !occurrence.no_crossref {
            for symbol in &occurrence.symbols {
                records.push(IndexRecord::Target(TargetRecord {
                    loc: loc.clone(),
                    target: 1,
                    kind: occurrence.kind,
                    pretty: occurrence.pretty.clone(),
                    sym: symbol.clone(),
                    context: context.clone(),
                    contextsym: contextsym.clone(),
                    slot_owner: occurrence.bindings.slot_owner.clone(),
                    binding_slots: occurrence.bindings.binding_slots.clone(),
                }));
            }
        }

        let syntax = if occurrence.no_crossref {
            String::new()
        } else {
            format!("{},{}", occurrence.kind, occurrence.syntax)
        };
        records.push(IndexRecord::Source(SourceRecord {
            loc,
            source: 1,
            syntax,
            pretty: format!("{} {}", occurrence.syntax, occurrence.pretty),
            sym: SymbolId::join(&occurrence.symbols),
            no_crossref: occurrence.no_crossref.then_some(1),
        }));
        Ok((token.loc.file, records))
    }
}

/// Reject spellings that would corrupt a record line
fn validate(token: &Token) -> EmitResult<()> {
    let bad = token.text.is_empty()
        || token
            .text
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if bad {
        return Err(EmitError::InvalidToken {
            text: token.text.clone(),
            loc: token.loc.point(),
        });
    }
    Ok(())
}

/// Move a destructor token from its `~` to the class name that follows
fn destructor_name(token: &Token) -> EmitResult<Token> {
    let Some(rest) = token.text.strip_prefix('~') else {
        return Err(EmitError::NotADestructor {
            text: token.text.clone(),
            loc: token.loc.point(),
        });
    };
    let mut line = token.loc.line;
    let mut column = token.loc.column + 1;
    for c in rest.chars().take_while(|c| c.is_whitespace()) {
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += c.len_utf8() as u32;
        }
    }
    let loc = SourceLoc {
        line,
        column,
        ..token.loc
    };
    Ok(Token::new(loc, rest.trim_start()))
}
