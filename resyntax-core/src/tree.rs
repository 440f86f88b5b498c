//! Syntax tree for regex patterns
//!
//! The tree is lossless: walking it in order and printing every token's
//! leading trivia followed by its text reproduces the pattern exactly.
//! Nodes own their children; there is no sharing and no parent pointers.

use std::fmt::Write;

use crate::captures::CaptureTable;
use crate::error::{Diagnostic, DiagnosticBag, Span};
use crate::lexer::{Token, TokenKind, TokenValue, TriviaKind};
use crate::options::RegexOptions;

/// A node in the syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The whole pattern followed by the end-of-file token
    CompilationUnit {
        expression: Box<Node>,
        end_of_file: Token,
    },
    /// Concatenation of zero or more terms
    Sequence(Vec<Node>),
    /// `left|right`, left-associative
    Alternation {
        left: Box<Node>,
        bar: Token,
        right: Box<Node>,
    },
    /// Run of literal characters
    Text(Token),
    /// `.`
    Wildcard(Token),
    /// `^`
    StartAnchor(Token),
    /// `$`
    EndAnchor(Token),
    /// `[:name:]` inside a character class
    PosixProperty(Token),
    CharacterClass(Box<CharacterClass>),
    /// `lo-hi` inside a character class
    CharacterClassRange {
        left: Box<Node>,
        minus: Token,
        right: Box<Node>,
    },
    /// `-[...]` at the end of a character class
    CharacterClassSubtraction {
        minus: Token,
        class: Box<CharacterClass>,
    },
    Grouping(Box<Grouping>),
    Escape(Box<Escape>),
    Quantifier(Box<Quantifier>),
}

/// `[...]` or `[^...]`
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterClass {
    pub open_bracket: Token,
    pub caret: Option<Token>,
    /// Always a [`Node::Sequence`]
    pub components: Node,
    pub close_bracket: Token,
}

/// Parenthesized constructs
#[derive(Debug, Clone, PartialEq)]
pub enum Grouping {
    /// `(...)`
    Simple {
        open_paren: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?:...)`
    NonCapturing {
        open_paren: Token,
        question: Token,
        colon: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?=...)`
    PositiveLookahead {
        open_paren: Token,
        question: Token,
        equals: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?!...)`
    NegativeLookahead {
        open_paren: Token,
        question: Token,
        exclamation: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?<=...)`
    PositiveLookbehind {
        open_paren: Token,
        question: Token,
        less_than: Token,
        equals: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?<!...)`
    NegativeLookbehind {
        open_paren: Token,
        question: Token,
        less_than: Token,
        exclamation: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?>...)`
    Atomic {
        open_paren: Token,
        question: Token,
        greater_than: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?<name>...)`, `(?'name'...)`, `(?<3>...)`
    Capture {
        open_paren: Token,
        question: Token,
        open: Token,
        capture: Token,
        close: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?<new-old>...)` or `(?<-old>...)`; `first` is missing in the latter
    Balancing {
        open_paren: Token,
        question: Token,
        open: Token,
        first: Token,
        minus: Token,
        second: Token,
        close: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?imnsx-imnsx)`, applies to the rest of the enclosing group
    SimpleOptions {
        open_paren: Token,
        question: Token,
        options: Token,
        close_paren: Token,
    },
    /// `(?imnsx-imnsx:...)`
    NestedOptions {
        open_paren: Token,
        question: Token,
        options: Token,
        colon: Token,
        expression: Node,
        close_paren: Token,
    },
    /// `(?(condition)yes|no)` where the condition is itself a grouping
    ConditionalByExpression {
        open_paren: Token,
        question: Token,
        condition: Node,
        expression: Node,
        close_paren: Token,
    },
    /// `(?(3)yes|no)` or `(?(name)yes|no)`
    ConditionalByCapture {
        open_paren: Token,
        question: Token,
        inner_open_paren: Token,
        capture: Token,
        inner_close_paren: Token,
        expression: Node,
        close_paren: Token,
    },
}

/// Backslash escapes
#[derive(Debug, Clone, PartialEq)]
pub enum Escape {
    /// `\n`, `\.`, and unknown escapes
    Simple { backslash: Token, type_token: Token },
    /// `\w`, `\D`, ...
    CharacterClassShorthand { backslash: Token, type_token: Token },
    /// `\b`, `\A`, `\z`, ...
    Anchor { backslash: Token, type_token: Token },
    Octal { backslash: Token, digits: Token },
    Hex {
        backslash: Token,
        type_token: Token,
        digits: Token,
    },
    Unicode {
        backslash: Token,
        type_token: Token,
        digits: Token,
    },
    /// `\cX`
    Control {
        backslash: Token,
        type_token: Token,
        control: Token,
    },
    /// `\p{Lu}`, `\P{IsGreek}`
    Category {
        backslash: Token,
        type_token: Token,
        open_brace: Token,
        category: Token,
        close_brace: Token,
    },
    /// `\3`
    Backreference { backslash: Token, number: Token },
    /// `\<name>`, `\'3'`
    CaptureReference {
        backslash: Token,
        open: Token,
        capture: Token,
        close: Token,
    },
    /// `\k<name>`, `\k'name'`
    NamedBackreference {
        backslash: Token,
        type_token: Token,
        open: Token,
        capture: Token,
        close: Token,
    },
}

/// Repetition applied to the preceding term
#[derive(Debug, Clone, PartialEq)]
pub enum Quantifier {
    ZeroOrMore { expression: Node, asterisk: Token },
    OneOrMore { expression: Node, plus: Token },
    ZeroOrOne { expression: Node, question: Token },
    /// `{n}`
    ExactCount {
        expression: Node,
        open_brace: Token,
        first: Token,
        close_brace: Token,
    },
    /// `{n,}`
    OpenRangeCount {
        expression: Node,
        open_brace: Token,
        first: Token,
        comma: Token,
        close_brace: Token,
    },
    /// `{n,m}`
    ClosedRangeCount {
        expression: Node,
        open_brace: Token,
        first: Token,
        comma: Token,
        second: Token,
        close_brace: Token,
    },
    /// A quantifier followed by `?`
    Lazy { quantifier: Node, question: Token },
}

/// A direct child of a node, in source order
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Node(&'a Node),
    Token(&'a Token),
}

impl Node {
    /// Direct children in source order
    pub fn children(&self) -> Vec<Child<'_>> {
        use Child::Node as N;
        use Child::Token as T;

        match self {
            Node::CompilationUnit {
                expression,
                end_of_file,
            } => vec![N(expression), T(end_of_file)],
            Node::Sequence(nodes) => nodes.iter().map(N).collect(),
            Node::Alternation { left, bar, right } => vec![N(left), T(bar), N(right)],
            Node::Text(token)
            | Node::Wildcard(token)
            | Node::StartAnchor(token)
            | Node::EndAnchor(token)
            | Node::PosixProperty(token) => vec![T(token)],
            Node::CharacterClass(class) => class.children(),
            Node::CharacterClassRange { left, minus, right } => {
                vec![N(left), T(minus), N(right)]
            }
            Node::CharacterClassSubtraction { minus, class } => {
                let mut children = vec![T(minus)];
                children.extend(class.children());
                children
            }
            Node::Grouping(grouping) => grouping.children(),
            Node::Escape(escape) => escape.children(),
            Node::Quantifier(quantifier) => quantifier.children(),
        }
    }

    /// Name of the node kind, as used in tree dumps
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::CompilationUnit { .. } => "CompilationUnit",
            Node::Sequence(_) => "Sequence",
            Node::Alternation { .. } => "Alternation",
            Node::Text(_) => "Text",
            Node::Wildcard(_) => "Wildcard",
            Node::StartAnchor(_) => "StartAnchor",
            Node::EndAnchor(_) => "EndAnchor",
            Node::PosixProperty(_) => "PosixProperty",
            Node::CharacterClass(class) if class.caret.is_some() => "NegatedCharacterClass",
            Node::CharacterClass(_) => "CharacterClass",
            Node::CharacterClassRange { .. } => "CharacterClassRange",
            Node::CharacterClassSubtraction { .. } => "CharacterClassSubtraction",
            Node::Grouping(grouping) => grouping.kind_name(),
            Node::Escape(escape) => escape.kind_name(),
            Node::Quantifier(quantifier) => quantifier.kind_name(),
        }
    }

    /// Every token under this node, in source order
    pub fn tokens(&self) -> Vec<&Token> {
        let mut result = Vec::new();
        self.collect_tokens(&mut result);
        result
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        for child in self.children() {
            match child {
                Child::Node(node) => node.collect_tokens(out),
                Child::Token(token) => out.push(token),
            }
        }
    }

    /// Union of the full spans of this node's tokens; `None` for an empty sequence
    pub fn span(&self) -> Option<Span> {
        self.tokens()
            .into_iter()
            .map(Token::full_span)
            .reduce(|a, b| a.union(b))
    }

    /// True if any token below carries a diagnostic or was synthesized
    pub fn has_problem(&self) -> bool {
        self.tokens().into_iter().any(Token::has_problem)
    }

    pub fn is_simple_options(&self) -> bool {
        matches!(self, Node::Grouping(g) if matches!(**g, Grouping::SimpleOptions { .. }))
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(self, Node::Quantifier(_))
    }

    /// True for the `\-` escape
    pub fn is_escaped_minus(&self) -> bool {
        matches!(
            self,
            Node::Escape(e) if matches!(
                &**e,
                Escape::Simple { type_token, .. } if type_token.is_text_char('-')
            )
        )
    }
}

impl CharacterClass {
    fn children(&self) -> Vec<Child<'_>> {
        let mut children = vec![Child::Token(&self.open_bracket)];
        if let Some(caret) = &self.caret {
            children.push(Child::Token(caret));
        }
        children.push(Child::Node(&self.components));
        children.push(Child::Token(&self.close_bracket));
        children
    }
}

impl Grouping {
    fn children(&self) -> Vec<Child<'_>> {
        use Child::Node as N;
        use Child::Token as T;

        match self {
            Grouping::Simple {
                open_paren,
                expression,
                close_paren,
            } => vec![T(open_paren), N(expression), T(close_paren)],
            Grouping::NonCapturing {
                open_paren,
                question,
                colon: marker,
                expression,
                close_paren,
            }
            | Grouping::PositiveLookahead {
                open_paren,
                question,
                equals: marker,
                expression,
                close_paren,
            }
            | Grouping::NegativeLookahead {
                open_paren,
                question,
                exclamation: marker,
                expression,
                close_paren,
            }
            | Grouping::Atomic {
                open_paren,
                question,
                greater_than: marker,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(marker),
                N(expression),
                T(close_paren),
            ],
            Grouping::PositiveLookbehind {
                open_paren,
                question,
                less_than,
                equals: marker,
                expression,
                close_paren,
            }
            | Grouping::NegativeLookbehind {
                open_paren,
                question,
                less_than,
                exclamation: marker,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(less_than),
                T(marker),
                N(expression),
                T(close_paren),
            ],
            Grouping::Capture {
                open_paren,
                question,
                open,
                capture,
                close,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(open),
                T(capture),
                T(close),
                N(expression),
                T(close_paren),
            ],
            Grouping::Balancing {
                open_paren,
                question,
                open,
                first,
                minus,
                second,
                close,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(open),
                T(first),
                T(minus),
                T(second),
                T(close),
                N(expression),
                T(close_paren),
            ],
            Grouping::SimpleOptions {
                open_paren,
                question,
                options,
                close_paren,
            } => vec![T(open_paren), T(question), T(options), T(close_paren)],
            Grouping::NestedOptions {
                open_paren,
                question,
                options,
                colon,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(options),
                T(colon),
                N(expression),
                T(close_paren),
            ],
            Grouping::ConditionalByExpression {
                open_paren,
                question,
                condition,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                N(condition),
                N(expression),
                T(close_paren),
            ],
            Grouping::ConditionalByCapture {
                open_paren,
                question,
                inner_open_paren,
                capture,
                inner_close_paren,
                expression,
                close_paren,
            } => vec![
                T(open_paren),
                T(question),
                T(inner_open_paren),
                T(capture),
                T(inner_close_paren),
                N(expression),
                T(close_paren),
            ],
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Grouping::Simple { .. } => "SimpleGrouping",
            Grouping::NonCapturing { .. } => "NonCapturingGrouping",
            Grouping::PositiveLookahead { .. } => "PositiveLookaheadGrouping",
            Grouping::NegativeLookahead { .. } => "NegativeLookaheadGrouping",
            Grouping::PositiveLookbehind { .. } => "PositiveLookbehindGrouping",
            Grouping::NegativeLookbehind { .. } => "NegativeLookbehindGrouping",
            Grouping::Atomic { .. } => "AtomicGrouping",
            Grouping::Capture { .. } => "CaptureGrouping",
            Grouping::Balancing { .. } => "BalancingGrouping",
            Grouping::SimpleOptions { .. } => "SimpleOptionsGrouping",
            Grouping::NestedOptions { .. } => "NestedOptionsGrouping",
            Grouping::ConditionalByExpression { .. } => "ConditionalExpressionGrouping",
            Grouping::ConditionalByCapture { .. } => "ConditionalCaptureGrouping",
        }
    }

    /// The `(` that opens the group
    pub fn open_paren(&self) -> &Token {
        match self {
            Grouping::Simple { open_paren, .. }
            | Grouping::NonCapturing { open_paren, .. }
            | Grouping::PositiveLookahead { open_paren, .. }
            | Grouping::NegativeLookahead { open_paren, .. }
            | Grouping::PositiveLookbehind { open_paren, .. }
            | Grouping::NegativeLookbehind { open_paren, .. }
            | Grouping::Atomic { open_paren, .. }
            | Grouping::Capture { open_paren, .. }
            | Grouping::Balancing { open_paren, .. }
            | Grouping::SimpleOptions { open_paren, .. }
            | Grouping::NestedOptions { open_paren, .. }
            | Grouping::ConditionalByExpression { open_paren, .. }
            | Grouping::ConditionalByCapture { open_paren, .. } => open_paren,
        }
    }
}

impl Escape {
    fn children(&self) -> Vec<Child<'_>> {
        use Child::Token as T;

        match self {
            Escape::Simple {
                backslash,
                type_token,
            }
            | Escape::CharacterClassShorthand {
                backslash,
                type_token,
            }
            | Escape::Anchor {
                backslash,
                type_token,
            } => vec![T(backslash), T(type_token)],
            Escape::Octal { backslash, digits } => vec![T(backslash), T(digits)],
            Escape::Hex {
                backslash,
                type_token,
                digits,
            }
            | Escape::Unicode {
                backslash,
                type_token,
                digits,
            } => vec![T(backslash), T(type_token), T(digits)],
            Escape::Control {
                backslash,
                type_token,
                control,
            } => vec![T(backslash), T(type_token), T(control)],
            Escape::Category {
                backslash,
                type_token,
                open_brace,
                category,
                close_brace,
            } => vec![
                T(backslash),
                T(type_token),
                T(open_brace),
                T(category),
                T(close_brace),
            ],
            Escape::Backreference { backslash, number } => vec![T(backslash), T(number)],
            Escape::CaptureReference {
                backslash,
                open,
                capture,
                close,
            } => vec![T(backslash), T(open), T(capture), T(close)],
            Escape::NamedBackreference {
                backslash,
                type_token,
                open,
                capture,
                close,
            } => vec![T(backslash), T(type_token), T(open), T(capture), T(close)],
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Escape::Simple { .. } => "SimpleEscape",
            Escape::CharacterClassShorthand { .. } => "CharacterClassEscape",
            Escape::Anchor { .. } => "AnchorEscape",
            Escape::Octal { .. } => "OctalEscape",
            Escape::Hex { .. } => "HexEscape",
            Escape::Unicode { .. } => "UnicodeEscape",
            Escape::Control { .. } => "ControlEscape",
            Escape::Category { .. } => "CategoryEscape",
            Escape::Backreference { .. } => "BackreferenceEscape",
            Escape::CaptureReference { .. } => "CaptureEscape",
            Escape::NamedBackreference { .. } => "KCaptureEscape",
        }
    }
}

impl Quantifier {
    fn children(&self) -> Vec<Child<'_>> {
        use Child::Node as N;
        use Child::Token as T;

        match self {
            Quantifier::ZeroOrMore {
                expression,
                asterisk: token,
            }
            | Quantifier::OneOrMore {
                expression,
                plus: token,
            }
            | Quantifier::ZeroOrOne {
                expression,
                question: token,
            } => vec![N(expression), T(token)],
            Quantifier::ExactCount {
                expression,
                open_brace,
                first,
                close_brace,
            } => vec![N(expression), T(open_brace), T(first), T(close_brace)],
            Quantifier::OpenRangeCount {
                expression,
                open_brace,
                first,
                comma,
                close_brace,
            } => vec![
                N(expression),
                T(open_brace),
                T(first),
                T(comma),
                T(close_brace),
            ],
            Quantifier::ClosedRangeCount {
                expression,
                open_brace,
                first,
                comma,
                second,
                close_brace,
            } => vec![
                N(expression),
                T(open_brace),
                T(first),
                T(comma),
                T(second),
                T(close_brace),
            ],
            Quantifier::Lazy {
                quantifier,
                question,
            } => vec![N(quantifier), T(question)],
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Quantifier::ZeroOrMore { .. } => "ZeroOrMoreQuantifier",
            Quantifier::OneOrMore { .. } => "OneOrMoreQuantifier",
            Quantifier::ZeroOrOne { .. } => "ZeroOrOneQuantifier",
            Quantifier::ExactCount { .. } => "ExactNumericQuantifier",
            Quantifier::OpenRangeCount { .. } => "OpenRangeNumericQuantifier",
            Quantifier::ClosedRangeCount { .. } => "ClosedRangeNumericQuantifier",
            Quantifier::Lazy { .. } => "LazyQuantifier",
        }
    }
}

/// Result of analyzing one pattern
#[derive(Debug, Clone, PartialEq)]
pub struct RegexTree {
    /// The pattern as given
    pub text: String,
    /// Always a [`Node::CompilationUnit`]
    pub root: Node,
    pub diagnostics: DiagnosticBag,
    pub captures: CaptureTable,
    /// Options the pattern was parsed with
    pub options: RegexOptions,
}

impl RegexTree {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// Rebuild the pattern text from trivia and tokens
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in self.root.tokens() {
            for trivia in &token.leading_trivia {
                out.push_str(&trivia.text);
            }
            out.push_str(&token.text);
        }
        out
    }

    /// Stable indented text rendering of the tree, diagnostics and captures
    pub fn dump(&self) -> String {
        let mut out = String::new();
        dump_node(&self.root, 0, &mut out);

        if !self.diagnostics.is_empty() {
            out.push_str("Diagnostics\n");
            for d in &self.diagnostics {
                let _ = writeln!(out, "  {} {}", d.span, d.kind);
            }
        }

        out.push_str("Captures\n");
        for (id, entry) in self.captures.entries() {
            let _ = writeln!(out, "  {} {}", id, entry.span);
        }
        out
    }
}

fn dump_node(node: &Node, depth: usize, out: &mut String) {
    let _ = writeln!(out, "{:indent$}{}", "", node.kind_name(), indent = depth * 2);
    for child in node.children() {
        match child {
            Child::Node(child) => dump_node(child, depth + 1, out),
            Child::Token(token) => dump_token(token, depth + 1, out),
        }
    }
}

fn dump_token(token: &Token, depth: usize, out: &mut String) {
    let indent = depth * 2;
    for trivia in &token.leading_trivia {
        let kind = match trivia.kind {
            TriviaKind::Whitespace => "WhitespaceTrivia",
            TriviaKind::Comment => "CommentTrivia",
        };
        let _ = writeln!(out, "{:indent$}{} {:?}", "", kind, trivia.text, indent = indent);
    }

    let name = match token.kind {
        TokenKind::EndOfFile => "EndOfFile".to_string(),
        kind => format!("{kind}Token"),
    };
    let _ = write!(out, "{:indent$}{}", "", name, indent = indent);
    if token.missing {
        out.push_str(" <missing>");
    } else if token.kind != TokenKind::EndOfFile {
        let _ = write!(out, " {:?}", token.text);
    }
    match &token.value {
        Some(TokenValue::Number(n)) => {
            let _ = write!(out, " value={n}");
        }
        Some(TokenValue::Name(_)) | None => {}
    }
    out.push('\n');
}
