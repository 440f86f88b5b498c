//! Lexer for regex patterns
//!
//! The lexer hands out one token per character except for the few
//! multi-character tokens the parser asks for explicitly (numbers, capture
//! names, option letters, category names, hex and octal digit runs). Whether
//! whitespace and comments are folded into leading trivia is decided by the
//! parser on every call, since that depends on where in the pattern it is.

use std::cmp::Ordering;
use std::fmt;

use crate::categories::{CategoryLookup, is_category_char};
use crate::error::{Diagnostic, DiagnosticKind, Span};
use crate::options::{RegexOptions, is_option_char};

/// The kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EndOfFile,
    /// `|`
    Bar,
    /// `*`
    Asterisk,
    /// `+`
    Plus,
    /// `?`
    Question,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `\`
    Backslash,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `.`
    Dot,
    /// `^`
    Caret,
    /// `$`
    Dollar,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `!`
    Exclamation,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `-`
    Minus,
    /// `'`
    SingleQuote,
    /// Literal pattern text
    Text,
    /// Decimal digits with a numeric value
    Number,
    /// Word characters naming a capture
    CaptureName,
    /// The name inside `\p{...}`
    EscapeCategory,
    /// Inline option letters
    Options,
}

impl TokenKind {
    /// Kind of the token produced for a single character
    fn for_char(c: char) -> TokenKind {
        match c {
            '|' => TokenKind::Bar,
            '*' => TokenKind::Asterisk,
            '+' => TokenKind::Plus,
            '?' => TokenKind::Question,
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '\\' => TokenKind::Backslash,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '.' => TokenKind::Dot,
            '^' => TokenKind::Caret,
            '$' => TokenKind::Dollar,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            '!' => TokenKind::Exclamation,
            '<' => TokenKind::LessThan,
            '>' => TokenKind::GreaterThan,
            '-' => TokenKind::Minus,
            '\'' => TokenKind::SingleQuote,
            _ => TokenKind::Text,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value carried by number and capture-name tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenValue {
    /// Wrapped 32-bit value of a decimal literal
    Number(i32),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    Comment,
}

/// Text the grammar ignores, attached in front of a token
#[derive(Debug, Clone, PartialEq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
    pub diagnostic: Option<Diagnostic>,
}

/// A token in a regex pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Span of `text`, trivia excluded
    pub span: Span,
    pub leading_trivia: Vec<Trivia>,
    pub value: Option<TokenValue>,
    /// At most one problem is ever attached to a token
    pub diagnostic: Option<Diagnostic>,
    /// Synthesized during error recovery; has no text
    pub missing: bool,
}

impl Token {
    /// A zero-width token standing in for one that was expected at `pos`
    pub fn missing(kind: TokenKind, pos: usize) -> Token {
        Token {
            kind,
            text: String::new(),
            span: Span::empty(pos),
            leading_trivia: Vec::new(),
            value: None,
            diagnostic: None,
            missing: true,
        }
    }

    /// Span including leading trivia
    pub fn full_span(&self) -> Span {
        match self.leading_trivia.first() {
            Some(trivia) => Span::new(trivia.span.start, self.span.end),
            None => self.span,
        }
    }

    /// Same token reinterpreted as another kind
    pub fn with_kind(mut self, kind: TokenKind) -> Token {
        self.kind = kind;
        self
    }

    /// Attach `diagnostic` unless the token already carries one
    pub fn add_diagnostic_if_none(&mut self, diagnostic: Diagnostic) {
        if self.diagnostic.is_none() {
            self.diagnostic = Some(diagnostic);
        }
    }

    /// True if this is a one-character text token holding `c`
    pub fn is_text_char(&self, c: char) -> bool {
        self.kind == TokenKind::Text && self.text.chars().eq(std::iter::once(c))
    }

    pub fn first_char(&self) -> Option<char> {
        self.text.chars().next()
    }

    pub fn number(&self) -> Option<i32> {
        match self.value {
            Some(TokenValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// True if the token or any of its trivia carries a diagnostic
    pub fn has_problem(&self) -> bool {
        self.missing
            || self.diagnostic.is_some()
            || self.leading_trivia.iter().any(|t| t.diagnostic.is_some())
    }
}

/// Lexer over the characters of one pattern
#[derive(Debug, Clone)]
pub struct Lexer {
    text: Vec<char>,
    base: usize,
    position: usize,
}

impl Lexer {
    /// Create a lexer; every span it reports is shifted by `base`
    pub fn new(pattern: &str, base: usize) -> Self {
        Lexer {
            text: pattern.chars().collect(),
            base,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Offset added to every span
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Step back one character
    pub fn retreat(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.text.get(index).copied()
    }

    /// Characters left from the current position
    pub fn remaining(&self) -> usize {
        self.text.len().saturating_sub(self.position)
    }

    /// True if the text at the current position starts with `s`
    pub fn is_at(&self, s: &str) -> bool {
        let mut index = self.position;
        for c in s.chars() {
            if self.char_at(index) != Some(c) {
                return false;
            }
            index += 1;
        }
        true
    }

    /// Absolute span of the character range `start..end`
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base + start, self.base + end)
    }

    /// Zero-width span just past the last character
    pub fn end_span(&self) -> Span {
        Span::empty(self.base + self.text.len())
    }

    /// Pattern text covered by an absolute span
    pub fn text_of(&self, span: Span) -> String {
        let start = span.start.saturating_sub(self.base).min(self.text.len());
        let end = span.end.saturating_sub(self.base).min(self.text.len());
        self.text[start..end.max(start)].iter().collect()
    }

    pub fn diagnostic(&self, kind: DiagnosticKind, span: Span) -> Diagnostic {
        Diagnostic::new(kind, span, self.text_of(span))
    }

    /// Token covering `start..end` with no trivia
    pub fn sub_token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            text: self.text[start..end].iter().collect(),
            span: self.span(start, end),
            leading_trivia: Vec::new(),
            value: None,
            diagnostic: None,
            missing: false,
        }
    }

    /// Produce the next token, optionally absorbing leading trivia first
    pub fn scan_next_token(&mut self, allow_trivia: bool, options: RegexOptions) -> Token {
        let trivia = if allow_trivia {
            self.scan_leading_trivia(options)
        } else {
            Vec::new()
        };

        if self.at_end() {
            let mut token = Token::missing(TokenKind::EndOfFile, self.base + self.text.len());
            token.missing = false;
            token.leading_trivia = trivia;
            return token;
        }

        let c = self.text[self.position];
        self.position += 1;
        let mut token = self.sub_token(TokenKind::for_char(c), self.position - 1, self.position);
        token.leading_trivia = trivia;
        token
    }

    fn scan_leading_trivia(&mut self, options: RegexOptions) -> Vec<Trivia> {
        let mut result = Vec::new();
        while !self.at_end() {
            if let Some(comment) = self.scan_comment(options) {
                result.push(comment);
                continue;
            }
            if let Some(whitespace) = self.scan_whitespace(options) {
                result.push(whitespace);
                continue;
            }
            break;
        }
        result
    }

    /// Scan a `(?#...)` comment, or a `#` comment in free-spacing mode
    pub fn scan_comment(&mut self, options: RegexOptions) -> Option<Trivia> {
        if self.at_end() {
            return None;
        }

        if self.is_at("(?#") {
            let start = self.position;
            while !self.at_end() && self.text[self.position] != ')' {
                self.position += 1;
            }

            if self.at_end() {
                let span = self.span(start, self.position);
                let diagnostic = self.diagnostic(DiagnosticKind::UnterminatedComment, span);
                return Some(self.trivia(TriviaKind::Comment, start, Some(diagnostic)));
            }

            self.position += 1;
            return Some(self.trivia(TriviaKind::Comment, start, None));
        }

        if options.is_free_spacing() && self.text[self.position] == '#' {
            let start = self.position;
            // only \n ends a comment
            while !self.at_end() && self.text[self.position] != '\n' {
                self.position += 1;
            }
            return Some(self.trivia(TriviaKind::Comment, start, None));
        }

        None
    }

    fn scan_whitespace(&mut self, options: RegexOptions) -> Option<Trivia> {
        if !options.is_free_spacing() {
            return None;
        }

        let start = self.position;
        while !self.at_end() && is_blank(self.text[self.position]) {
            self.position += 1;
        }

        (self.position > start).then(|| self.trivia(TriviaKind::Whitespace, start, None))
    }

    fn trivia(&self, kind: TriviaKind, start: usize, diagnostic: Option<Diagnostic>) -> Trivia {
        Trivia {
            kind,
            text: self.text[start..self.position].iter().collect(),
            span: self.span(start, self.position),
            diagnostic,
        }
    }

    /// Scan a run of decimal digits.
    ///
    /// The value wraps like 32-bit signed arithmetic; a literal that does not
    /// fit is still produced but carries an overflow diagnostic.
    pub fn try_scan_number(&mut self) -> Option<Token> {
        let start = self.position;
        let mut value: i32 = 0;
        let mut overflowed = false;

        while let Some(digit) = self.char_at(self.position).and_then(|c| c.to_digit(10)) {
            self.position += 1;
            let digit = digit as i32;
            match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(next) => value = next,
                None => {
                    overflowed = true;
                    value = value.wrapping_mul(10).wrapping_add(digit);
                }
            }
        }

        if self.position == start {
            return None;
        }

        let mut token = self.sub_token(TokenKind::Number, start, self.position);
        token.value = Some(TokenValue::Number(value));
        if overflowed {
            let diagnostic = self.diagnostic(DiagnosticKind::CaptureNumberOverflow, token.span);
            token.add_diagnostic_if_none(diagnostic);
        }
        Some(token)
    }

    /// Scan a run of word characters
    pub fn try_scan_capture_name(&mut self) -> Option<Token> {
        let start = self.position;
        while self.char_at(self.position).is_some_and(is_word_char) {
            self.position += 1;
        }

        if self.position == start {
            return None;
        }

        let mut token = self.sub_token(TokenKind::CaptureName, start, self.position);
        token.value = Some(TokenValue::Name(token.text.clone()));
        Some(token)
    }

    /// A number if the next character is a digit, otherwise a capture name
    pub fn try_scan_number_or_capture_name(&mut self) -> Option<Token> {
        self.try_scan_number().or_else(|| self.try_scan_capture_name())
    }

    /// Scan the letters of an inline options construct such as `i-x`
    pub fn try_scan_options(&mut self) -> Option<Token> {
        let start = self.position;
        while self.char_at(self.position).is_some_and(is_option_char) {
            self.position += 1;
        }

        (self.position > start).then(|| self.sub_token(TokenKind::Options, start, self.position))
    }

    /// Scan the name inside `\p{...}`, flagging names the lookup rejects
    pub fn try_scan_escape_category(&mut self, categories: &dyn CategoryLookup) -> Option<Token> {
        let start = self.position;
        while self.char_at(self.position).is_some_and(is_category_char) {
            self.position += 1;
        }

        if self.position == start {
            return None;
        }

        let mut token = self.sub_token(TokenKind::EscapeCategory, start, self.position);
        if !categories.is_known(&token.text) {
            let diagnostic = self.diagnostic(
                DiagnosticKind::UnknownProperty(token.text.clone()),
                token.span,
            );
            token.add_diagnostic_if_none(diagnostic);
        }
        Some(token)
    }

    /// Scan up to `count` hex digits following `\x` or `\u`.
    ///
    /// The lexer must be positioned just past the escape letter. A short run is
    /// diagnosed over the whole escape.
    pub fn scan_hex_characters(&mut self, count: usize) -> Token {
        let start = self.position;
        let before_slash = start.saturating_sub(2);

        while self.position - start < count
            && self.char_at(self.position).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.position += 1;
        }

        let mut token = self.sub_token(TokenKind::Text, start, self.position);
        if self.position - start != count {
            let span = self.span(before_slash, self.position);
            let diagnostic = self.diagnostic(DiagnosticKind::InsufficientHexDigits, span);
            token.add_diagnostic_if_none(diagnostic);
        }
        token
    }

    /// Scan up to three octal digits.
    ///
    /// In ECMAScript mode scanning stops as soon as the value reaches `0o40`.
    pub fn scan_octal_characters(&mut self, options: RegexOptions) -> Token {
        let start = self.position;
        let mut value = 0u32;

        for _ in 0..3 {
            match self.char_at(self.position).and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.position += 1;
                    value = value * 8 + digit;
                    if options.is_ecma_script() && value >= 0o40 {
                        break;
                    }
                }
                None => break,
            }
        }

        self.sub_token(TokenKind::Text, start, self.position)
    }
}

/// Whitespace that free-spacing mode folds into trivia
pub fn is_blank(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

/// Characters allowed in capture names: the `\w` class of letters,
/// nonspacing marks, decimal digits and connector punctuation, plus the two
/// zero-width joiners
pub fn is_word_char(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '_';
    }
    if c == '\u{200C}' || c == '\u{200D}' {
        return true;
    }
    if in_ranges(c, CONNECTOR_PUNCTUATION) || in_ranges(c, NONSPACING_MARKS) {
        return true;
    }
    // `is_alphabetic` also covers letter numbers and `is_numeric` covers
    // every number category, but only decimal digits are word characters
    (c.is_alphabetic() || c.is_numeric()) && !in_ranges(c, NON_DECIMAL_NUMBERS)
}

fn in_ranges(c: char, ranges: &[(char, char)]) -> bool {
    ranges
        .binary_search_by(|&(low, high)| {
            if high < c {
                Ordering::Less
            } else if low > c {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

/// Pc outside ASCII
const CONNECTOR_PUNCTUATION: &[(char, char)] = &[
    ('\u{203F}', '\u{2040}'),
    ('\u{2054}', '\u{2054}'),
    ('\u{FE33}', '\u{FE34}'),
    ('\u{FE4D}', '\u{FE4F}'),
    ('\u{FF3F}', '\u{FF3F}'),
];

/// Combining marks that `is_alphabetic` does not already include
const NONSPACING_MARKS: &[(char, char)] = &[
    ('\u{0300}', '\u{036F}'),
    ('\u{0483}', '\u{0487}'),
    ('\u{0591}', '\u{05BD}'),
    ('\u{05BF}', '\u{05BF}'),
    ('\u{05C1}', '\u{05C2}'),
    ('\u{05C4}', '\u{05C5}'),
    ('\u{05C7}', '\u{05C7}'),
    ('\u{0610}', '\u{061A}'),
    ('\u{064B}', '\u{065F}'),
    ('\u{0670}', '\u{0670}'),
    ('\u{06D6}', '\u{06DC}'),
    ('\u{06DF}', '\u{06E4}'),
    ('\u{06E7}', '\u{06E8}'),
    ('\u{06EA}', '\u{06ED}'),
    ('\u{0711}', '\u{0711}'),
    ('\u{0730}', '\u{074A}'),
    ('\u{0900}', '\u{0902}'),
    ('\u{093C}', '\u{093C}'),
    ('\u{0941}', '\u{0948}'),
    ('\u{094D}', '\u{094D}'),
    ('\u{0E31}', '\u{0E31}'),
    ('\u{0E34}', '\u{0E3A}'),
    ('\u{0E47}', '\u{0E4E}'),
    ('\u{1AB0}', '\u{1ABD}'),
    ('\u{1DC0}', '\u{1DFF}'),
    ('\u{20D0}', '\u{20DC}'),
    ('\u{20E1}', '\u{20E1}'),
    ('\u{20E5}', '\u{20F0}'),
    ('\u{302A}', '\u{302D}'),
    ('\u{3099}', '\u{309A}'),
    ('\u{FE00}', '\u{FE0F}'),
    ('\u{FE20}', '\u{FE2F}'),
];

/// Nl and No: superscripts, fractions, roman numerals, circled numbers
const NON_DECIMAL_NUMBERS: &[(char, char)] = &[
    ('\u{00B2}', '\u{00B3}'),
    ('\u{00B9}', '\u{00B9}'),
    ('\u{00BC}', '\u{00BE}'),
    ('\u{09F4}', '\u{09F9}'),
    ('\u{0BF0}', '\u{0BF2}'),
    ('\u{0F2A}', '\u{0F33}'),
    ('\u{1369}', '\u{137C}'),
    ('\u{16EE}', '\u{16F0}'),
    ('\u{17F0}', '\u{17F9}'),
    ('\u{2070}', '\u{2070}'),
    ('\u{2074}', '\u{2079}'),
    ('\u{2080}', '\u{2089}'),
    ('\u{2150}', '\u{2182}'),
    ('\u{2185}', '\u{2189}'),
    ('\u{2460}', '\u{249B}'),
    ('\u{24EA}', '\u{24FF}'),
    ('\u{2776}', '\u{2793}'),
    ('\u{2CFD}', '\u{2CFD}'),
    ('\u{3007}', '\u{3007}'),
    ('\u{3021}', '\u{3029}'),
    ('\u{3038}', '\u{303A}'),
    ('\u{3192}', '\u{3195}'),
    ('\u{3220}', '\u{3229}'),
    ('\u{3248}', '\u{324F}'),
    ('\u{3251}', '\u{325F}'),
    ('\u{3280}', '\u{3289}'),
    ('\u{32B1}', '\u{32BF}'),
    ('\u{A6E6}', '\u{A6EF}'),
    ('\u{A830}', '\u{A835}'),
    ('\u{10107}', '\u{10133}'),
    ('\u{10140}', '\u{10178}'),
    ('\u{10341}', '\u{10341}'),
    ('\u{1034A}', '\u{1034A}'),
    ('\u{103D1}', '\u{103D5}'),
    ('\u{12400}', '\u{1246E}'),
    ('\u{1D360}', '\u{1D378}'),
    ('\u{1F100}', '\u{1F10C}'),
];
