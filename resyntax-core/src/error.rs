//! Diagnostics and error types for the pattern analyzer
//!
//! Malformed patterns never fail to parse. Every problem the lexer, parser or
//! capture resolver finds is recorded as a [`Diagnostic`] and the analysis
//! carries on. The only `Err` values this crate produces come from caller
//! configuration, see [`OptionsError`].

use std::collections::HashSet;

use thiserror::Error;

/// The closed set of problems that can be reported for a pattern.
///
/// `Display` yields the message text, worded the way the native engine words it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    #[error("Unterminated (?#...) comment")]
    UnterminatedComment,

    #[error("Unterminated [] set")]
    UnterminatedCharacterClass,

    #[error("Not enough )'s")]
    NotEnoughCloseParens,

    #[error("Too many )'s")]
    TooManyCloseParens,

    #[error("Quantifier {{x,y}} following nothing")]
    QuantifierFollowingNothing,

    /// A quantifier directly after another quantifier
    #[error("Nested quantifier {0}")]
    NestedQuantifier(char),

    #[error("Illegal \\ at end of pattern")]
    IllegalBackslashAtEnd,

    #[error("Unrecognized escape sequence \\{0}")]
    UnrecognizedEscape(char),

    #[error("Incomplete \\p{{X}} character escape")]
    IncompleteCategoryEscape,

    #[error("Malformed \\p{{X}} character escape")]
    MalformedCategoryEscape,

    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Missing control character")]
    MissingControlCharacter,

    #[error("Unrecognized control character")]
    UnrecognizedControlCharacter,

    #[error("Insufficient hexadecimal digits")]
    InsufficientHexDigits,

    #[error("[x-y] range in reverse order")]
    ReversedCharacterRange,

    /// A class shorthand such as `\d` used as the upper end of a range
    #[error("Cannot include class \\{0} in character range")]
    ClassInCharacterRange(char),

    #[error("A subtraction must be the last element in a character class")]
    SubtractionMustBeLast,

    #[error("Capture group numbers must be less than or equal to Int32.MaxValue")]
    CaptureNumberOverflow,

    #[error("Illegal {{x,y}} with x > y")]
    ReversedQuantifierBounds,

    #[error("Invalid group name: Group names must begin with a word character")]
    InvalidGroupName,

    #[error("Capture number cannot be zero")]
    CaptureNumberZero,

    #[error("Reference to undefined group number {0}")]
    UndefinedGroupNumber(i32),

    #[error("Reference to undefined group name {0}")]
    UndefinedGroupName(String),

    /// The capture test of a `(?(n)...)` conditional names no group
    #[error("Reference to undefined group")]
    UndefinedGroup,

    #[error("Malformed")]
    MalformedCondition,

    #[error("Malformed \\k<...> named back reference")]
    MalformedNamedBackreference,

    #[error("Unrecognized grouping construct")]
    UnrecognizedGroupingConstruct,

    #[error("Alternation conditions cannot be comments")]
    ConditionCannotBeComment,

    #[error("Alternation conditions do not capture and cannot be named")]
    ConditionCannotCapture,

    #[error("Too many | in (?()|)")]
    TooManyBars,

    #[error("Pattern nesting is too deep")]
    NestingTooDeep,
}

/// A span representing a location in the pattern, measured in characters
/// and shifted by the caller's base offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    /// Start position (inclusive)
    pub start: usize,
    /// End position (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span for a single character
    pub fn single(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Create a zero-width span at `pos`
    pub fn empty(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// A problem found in a pattern, with the fragment it applies to
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{kind} at {span}")]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Where it went wrong
    pub span: Span,
    /// The pattern text covered by `span`
    pub text: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(kind: DiagnosticKind, span: Span, text: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            span,
            text: text.into(),
        }
    }

    /// The message shown to users
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Ordered, append-only collection of diagnostics.
///
/// A diagnostic with the same kind and span as one already in the bag is
/// dropped, so `((` reports a single missing `)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<(DiagnosticKind, Span)>,
}

impl DiagnosticBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic unless an identical one is already present.
    /// Returns whether it was added.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        if !self
            .seen
            .insert((diagnostic.kind.clone(), diagnostic.span))
        {
            return false;
        }
        self.diagnostics.push(diagnostic);
        true
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True when nothing was reported
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterate in emission order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl<'a> IntoIterator for &'a DiagnosticBag {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Errors in caller-supplied configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    /// A letter that is not one of `i`, `m`, `n`, `s`, `x`
    #[error("unknown option '{0}', expected one of i, m, n, s, x")]
    UnknownOption(char),
}
