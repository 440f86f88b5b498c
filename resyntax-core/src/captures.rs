//! Capture table and reference resolution
//!
//! The parser reserves a definition slot when it reaches a capture's `(` and
//! fills in the span once the matching `)` is known, so the recorded order is
//! the pre-order of opening parentheses. Numbers are assigned from that list
//! after parsing:
//!
//! - capture 0 is the whole pattern
//! - unnamed groups take 1, 2, ... in order
//! - explicitly numbered groups keep their number
//! - named groups take the lowest free numbers after the unnamed ones, and
//!   are entered under that number as well as under their name
//!
//! References (`\3`, `\k<name>`, `(?(2)...)`, the second half of a balancing
//! group) are queued and checked against the finished table, so a reference
//! may appear before the group it names.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Diagnostic, DiagnosticKind, Span};
use crate::lexer::{Lexer, Token, TokenValue};

/// Identifies a capture by number or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaptureId {
    Number(i32),
    Name(String),
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureId::Number(n) => write!(f, "{n}"),
            CaptureId::Name(name) => write!(f, "{name}"),
        }
    }
}

/// A capture in the finished table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEntry {
    /// Number the group captures into
    pub number: i32,
    /// From the group's `(` to its `)`
    pub span: Span,
    /// Pattern text covered by `span`
    pub text: String,
}

/// All captures defined by a pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTable {
    numbers: BTreeMap<i32, CaptureEntry>,
    names: BTreeMap<String, CaptureEntry>,
}

impl CaptureTable {
    /// A table with no captures at all, not even the implicit capture 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_number(&self, number: i32) -> bool {
        self.numbers.contains_key(&number)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn get_number(&self, number: i32) -> Option<&CaptureEntry> {
        self.numbers.get(&number)
    }

    pub fn get_name(&self, name: &str) -> Option<&CaptureEntry> {
        self.names.get(name)
    }

    /// Number assigned to a named capture
    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.names.get(name).map(|entry| entry.number)
    }

    pub fn contains(&self, id: &CaptureId) -> bool {
        match id {
            CaptureId::Number(n) => self.contains_number(*n),
            CaptureId::Name(name) => self.contains_name(name),
        }
    }

    /// Numbered entries in ascending order, then named entries by name
    pub fn entries(&self) -> Vec<(CaptureId, &CaptureEntry)> {
        let numbers = self
            .numbers
            .iter()
            .map(|(n, entry)| (CaptureId::Number(*n), entry));
        let names = self
            .names
            .iter()
            .map(|(name, entry)| (CaptureId::Name(name.clone()), entry));
        numbers.chain(names).collect()
    }

    /// Total number of entries, numbered and named
    pub fn len(&self) -> usize {
        self.numbers.len() + self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.names.is_empty()
    }
}

/// How a capture definition identifies itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Unnamed,
    Number(i32),
    Name(String),
}

#[derive(Debug, Clone)]
struct Definition {
    kind: DefinitionKind,
    span: Option<Span>,
}

/// What the reference appears in; decides the diagnostic for an unknown number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceKind {
    Backreference,
    Condition,
}

#[derive(Debug, Clone)]
pub(crate) struct Reference {
    target: CaptureId,
    kind: ReferenceKind,
    span: Span,
    text: String,
    /// The token already carries a diagnostic, so nothing more is reported
    already_diagnosed: bool,
}

/// Collects definitions and references while a pattern is parsed
#[derive(Debug, Clone, Default)]
pub(crate) struct CaptureRecorder {
    definitions: Vec<Definition>,
    references: Vec<Reference>,
}

impl CaptureRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for a definition whose span is not known yet
    pub(crate) fn reserve(&mut self, kind: DefinitionKind) -> usize {
        self.definitions.push(Definition { kind, span: None });
        self.definitions.len() - 1
    }

    pub(crate) fn complete(&mut self, slot: usize, span: Span) {
        if let Some(definition) = self.definitions.get_mut(slot) {
            definition.span = Some(span);
        }
    }

    /// Queue a number or name token for resolution
    pub(crate) fn reference(&mut self, token: &Token, kind: ReferenceKind) {
        let target = match &token.value {
            Some(TokenValue::Number(n)) => CaptureId::Number(*n),
            Some(TokenValue::Name(name)) => CaptureId::Name(name.clone()),
            None => return,
        };
        self.references.push(Reference {
            target,
            kind,
            span: token.span,
            text: token.text.clone(),
            already_diagnosed: token.diagnostic.is_some(),
        });
    }

    /// Assign numbers and build the finished table
    pub(crate) fn build_table(&self, lexer: &Lexer) -> CaptureTable {
        let mut table = CaptureTable::new();
        let whole = if lexer.is_empty() {
            Span::empty(lexer.base())
        } else {
            lexer.span(0, lexer.len())
        };
        insert_number(&mut table, 0, whole, lexer);

        let mut unnamed = 0i32;
        for definition in &self.definitions {
            let Some(span) = definition.span else {
                continue;
            };
            match &definition.kind {
                DefinitionKind::Unnamed => {
                    unnamed = unnamed.wrapping_add(1);
                    insert_number(&mut table, unnamed, span, lexer);
                }
                DefinitionKind::Number(n) => insert_number(&mut table, *n, span, lexer),
                DefinitionKind::Name(_) => {}
            }
        }

        let mut next = unnamed.wrapping_add(1);
        for definition in &self.definitions {
            let (DefinitionKind::Name(name), Some(span)) = (&definition.kind, definition.span)
            else {
                continue;
            };
            if table.names.contains_key(name) {
                continue;
            }
            while table.numbers.contains_key(&next) {
                next = next.wrapping_add(1);
            }
            insert_number(&mut table, next, span, lexer);
            table.names.insert(
                name.clone(),
                CaptureEntry {
                    number: next,
                    span,
                    text: lexer.text_of(span),
                },
            );
            next = next.wrapping_add(1);
        }

        table
    }

    /// Diagnostics for every queued reference the table does not define
    pub(crate) fn resolve(&self, table: &CaptureTable) -> Vec<Diagnostic> {
        self.references
            .iter()
            .filter(|r| !r.already_diagnosed && !table.contains(&r.target))
            .map(|r| {
                let kind = match (&r.target, r.kind) {
                    (CaptureId::Number(_), ReferenceKind::Condition) => {
                        DiagnosticKind::UndefinedGroup
                    }
                    (CaptureId::Number(n), ReferenceKind::Backreference) => {
                        DiagnosticKind::UndefinedGroupNumber(*n)
                    }
                    (CaptureId::Name(name), _) => DiagnosticKind::UndefinedGroupName(name.clone()),
                };
                Diagnostic::new(kind, r.span, r.text.clone())
            })
            .collect()
    }
}

fn insert_number(table: &mut CaptureTable, number: i32, span: Span, lexer: &Lexer) {
    table.numbers.entry(number).or_insert_with(|| CaptureEntry {
        number,
        span,
        text: lexer.text_of(span),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_token(lexer: &Lexer, start: usize, end: usize, value: i32) -> Token {
        let mut token = lexer.sub_token(crate::lexer::TokenKind::Number, start, end);
        token.value = Some(TokenValue::Number(value));
        token
    }

    #[test]
    fn test_whole_pattern_is_zero() {
        let lexer = Lexer::new("abc", 4);
        let table = CaptureRecorder::new().build_table(&lexer);
        let zero = table.get_number(0).unwrap();
        assert_eq!(zero.span, Span::new(4, 7));
        assert_eq!(zero.text, "abc");
        assert_eq!(table.len(), 1);

        let empty = CaptureRecorder::new().build_table(&Lexer::new("", 2));
        assert_eq!(empty.get_number(0).unwrap().span, Span::empty(2));
    }

    #[test]
    fn test_numbering_order() {
        // (?<x>a)(b)(?<5>c)(d)(?<y>e)
        let lexer = Lexer::new("0123456789012345678901234567", 0);
        let mut recorder = CaptureRecorder::new();
        let slots = [
            (DefinitionKind::Name("x".into()), Span::new(0, 7)),
            (DefinitionKind::Unnamed, Span::new(7, 10)),
            (DefinitionKind::Number(5), Span::new(10, 17)),
            (DefinitionKind::Unnamed, Span::new(17, 20)),
            (DefinitionKind::Name("y".into()), Span::new(20, 27)),
        ];
        for (kind, span) in slots {
            let slot = recorder.reserve(kind);
            recorder.complete(slot, span);
        }

        let table = recorder.build_table(&lexer);
        assert_eq!(table.get_number(1).unwrap().span, Span::new(7, 10));
        assert_eq!(table.get_number(2).unwrap().span, Span::new(17, 20));
        assert!(table.contains_number(5));
        assert_eq!(table.number_of("x"), Some(3));
        assert_eq!(table.number_of("y"), Some(4));
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_named_capture_has_number_entry() {
        let lexer = Lexer::new("(a)(?<n>b)", 0);
        let mut recorder = CaptureRecorder::new();
        let slot = recorder.reserve(DefinitionKind::Unnamed);
        recorder.complete(slot, Span::new(0, 3));
        let slot = recorder.reserve(DefinitionKind::Name("n".into()));
        recorder.complete(slot, Span::new(3, 10));

        let table = recorder.build_table(&lexer);
        let by_number = table.get_number(2).unwrap();
        let by_name = table.get_name("n").unwrap();
        assert_eq!(by_number, by_name);
        assert_eq!(by_number.text, "(?<n>b)");
        assert!(table.contains(&CaptureId::Number(2)));
    }

    #[test]
    fn test_names_skip_taken_numbers() {
        let lexer = Lexer::new("0123456789", 0);
        let mut recorder = CaptureRecorder::new();
        let slot = recorder.reserve(DefinitionKind::Number(1));
        recorder.complete(slot, Span::new(0, 2));
        let slot = recorder.reserve(DefinitionKind::Number(2));
        recorder.complete(slot, Span::new(2, 4));
        let slot = recorder.reserve(DefinitionKind::Name("n".into()));
        recorder.complete(slot, Span::new(4, 6));

        let table = recorder.build_table(&lexer);
        assert_eq!(table.number_of("n"), Some(3));
    }

    #[test]
    fn test_first_definition_wins() {
        let lexer = Lexer::new("0123456789", 0);
        let mut recorder = CaptureRecorder::new();
        for (kind, span) in [
            (DefinitionKind::Number(1), Span::new(0, 3)),
            (DefinitionKind::Unnamed, Span::new(3, 5)),
            (DefinitionKind::Name("a".into()), Span::new(5, 7)),
            (DefinitionKind::Name("a".into()), Span::new(7, 9)),
        ] {
            let slot = recorder.reserve(kind);
            recorder.complete(slot, span);
        }

        let table = recorder.build_table(&lexer);
        assert_eq!(table.get_number(1).unwrap().span, Span::new(0, 3));
        assert_eq!(table.get_name("a").unwrap().span, Span::new(5, 7));
        assert_eq!(table.number_of("a"), Some(2));
        assert_eq!(table.get_number(2).unwrap().span, Span::new(5, 7));
        assert!(!table.contains_number(3));
    }

    #[test]
    fn test_resolve_reports_unknown_targets() {
        let lexer = Lexer::new("\\1\\2(?(3))", 0);
        let mut recorder = CaptureRecorder::new();
        let slot = recorder.reserve(DefinitionKind::Unnamed);
        recorder.complete(slot, Span::new(0, 1));

        recorder.reference(&number_token(&lexer, 1, 2, 1), ReferenceKind::Backreference);
        recorder.reference(&number_token(&lexer, 3, 4, 2), ReferenceKind::Backreference);
        recorder.reference(&number_token(&lexer, 7, 8, 3), ReferenceKind::Condition);

        let table = recorder.build_table(&lexer);
        let diagnostics = recorder.resolve(&table);
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UndefinedGroupNumber(2),
                DiagnosticKind::UndefinedGroup,
            ]
        );
        assert_eq!(diagnostics[0].span, Span::new(3, 4));
    }

    #[test]
    fn test_resolve_skips_diagnosed_tokens() {
        let lexer = Lexer::new("99999999999", 0);
        let mut token = number_token(&lexer, 0, 11, 7);
        let overflow = lexer.diagnostic(DiagnosticKind::CaptureNumberOverflow, token.span);
        token.diagnostic = Some(overflow);
        let mut recorder = CaptureRecorder::new();
        recorder.reference(&token, ReferenceKind::Backreference);
        let table = recorder.build_table(&lexer);
        assert!(recorder.resolve(&table).is_empty());
    }
}
