//! Parser for regex patterns
//!
//! A recursive descent parser that turns the lexer's tokens into a lossless
//! [`Node`] tree. It never fails: malformed input is recorded as diagnostics
//! on the offending tokens, missing tokens are synthesized, and parsing
//! carries on.
//!
//! Grammar (in order of precedence, lowest to highest):
//!   pattern     := alternation EOF
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := quantified*
//!   quantified  := primary ( quantifier '?'? )?
//!   quantifier  := '*' | '+' | '?' | '{' number ( ',' number? )? '}'
//!   primary     := text | '.' | '^' | '$' | escape | class | grouping
//!   class       := '[' '^'? component+ ']'
//!   component   := single ( '-' single )? | '-' class
//!   grouping    := '(' ( '?' construct )? alternation ')'
//!
//! Trivia is only allowed in a few places (after a complete sequence element,
//! after `|`, at the start of a group body), so every scan states whether the
//! next token may carry it.

use std::mem;

use crate::captures::{CaptureRecorder, CaptureTable, DefinitionKind, ReferenceKind};
use crate::categories::{CategoryLookup, StandardCategories};
use crate::error::{Diagnostic, DiagnosticBag, DiagnosticKind, Span};
use crate::lexer::{Lexer, Token, TokenKind, TokenValue, is_word_char};
use crate::options::RegexOptions;
use crate::tree::{CharacterClass, Escape, Grouping, Node, Quantifier, RegexTree};

/// Groups and classes nested deeper than this are not descended into
pub const MAX_DEPTH: usize = 64;

/// Parameters for one analysis
#[derive(Clone, Copy)]
pub struct ParseConfig<'a> {
    /// Added to every reported position
    pub base_offset: usize,
    pub options: RegexOptions,
    /// Decides which `\p{...}` names are valid
    pub categories: &'a dyn CategoryLookup,
}

impl Default for ParseConfig<'static> {
    fn default() -> Self {
        ParseConfig {
            base_offset: 0,
            options: RegexOptions::empty(),
            categories: &StandardCategories,
        }
    }
}

/// Parts of `{n}`, `{n,}` or `{n,m}` after the open brace
struct NumericParts {
    first: Token,
    comma: Option<Token>,
    second: Option<Token>,
    close_brace: Token,
}

/// Result of a single pass over the pattern
pub(crate) struct ParseOutput {
    text: String,
    lexer: Lexer,
    root: Node,
    captures: CaptureRecorder,
}

impl ParseOutput {
    /// Capture table built from the definitions this pass recorded
    pub(crate) fn capture_table(&self) -> CaptureTable {
        self.captures.build_table(&self.lexer)
    }

    /// Collect diagnostics in tree order, then resolve references
    pub(crate) fn into_tree(self, options: RegexOptions) -> RegexTree {
        let captures = self.capture_table();
        let mut diagnostics = DiagnosticBag::new();
        for token in self.root.tokens() {
            for trivia in &token.leading_trivia {
                if let Some(diagnostic) = &trivia.diagnostic {
                    diagnostics.push(diagnostic.clone());
                }
            }
            if let Some(diagnostic) = &token.diagnostic {
                diagnostics.push(diagnostic.clone());
            }
        }
        for diagnostic in self.captures.resolve(&captures) {
            diagnostics.push(diagnostic);
        }

        RegexTree {
            text: self.text,
            root: self.root,
            diagnostics,
            captures,
            options,
        }
    }
}

/// Parser for regex patterns
pub(crate) struct Parser<'a> {
    lexer: Lexer,
    text: String,
    options: RegexOptions,
    current: Token,
    categories: &'a dyn CategoryLookup,
    /// Captures found by the discovery pass
    known: &'a CaptureTable,
    captures: CaptureRecorder,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser; `known` is consulted wherever the parse shape depends
    /// on which captures exist
    pub(crate) fn new(pattern: &str, config: &ParseConfig<'a>, known: &'a CaptureTable) -> Self {
        let mut lexer = Lexer::new(pattern, config.base_offset);
        let current = lexer.scan_next_token(true, config.options);
        Parser {
            lexer,
            text: pattern.to_string(),
            options: config.options,
            current,
            categories: config.categories,
            known,
            captures: CaptureRecorder::new(),
            depth: 0,
        }
    }

    /// Parse the entire pattern
    pub(crate) fn parse(mut self) -> ParseOutput {
        // The top level also consumes stray close parens
        let expression = self.parse_alternating_sequences(true);
        let root = Node::CompilationUnit {
            expression: Box::new(expression),
            end_of_file: self.current.clone(),
        };

        ParseOutput {
            text: self.text,
            lexer: self.lexer,
            root,
            captures: self.captures,
        }
    }

    /// Return the current token and scan the next one
    fn consume(&mut self, allow_trivia: bool) -> Token {
        let next = self.lexer.scan_next_token(allow_trivia, self.options);
        mem::replace(&mut self.current, next)
    }

    fn reset_and_consume(&mut self, position: usize, allow_trivia: bool) {
        self.lexer.set_position(position);
        self.consume(allow_trivia);
    }

    /// Un-scan the current single-character token
    fn move_back_before_previous_scan(&mut self) {
        if self.current.kind != TokenKind::EndOfFile {
            self.lexer.retreat();
        }
    }

    /// Zero-width token standing in for one expected at the current token
    fn missing(&self, kind: TokenKind) -> Token {
        Token::missing(kind, self.current.span.start)
    }

    fn diagnostic(&self, kind: DiagnosticKind, span: Span) -> Diagnostic {
        self.lexer.diagnostic(kind, span)
    }

    fn token_span_including_eof(token: &Token) -> Span {
        if token.kind == TokenKind::EndOfFile {
            Span::empty(token.span.start)
        } else {
            token.span
        }
    }

    fn parse_alternating_sequences(&mut self, consume_close_paren: bool) -> Node {
        let mut current = self.parse_sequence(consume_close_paren);

        while self.current.kind == TokenKind::Bar {
            let bar = self.consume(true);
            let right = self.parse_sequence(consume_close_paren);
            current = Node::Alternation {
                left: Box::new(current),
                bar,
                right: Box::new(right),
            };
        }

        current
    }

    fn parse_sequence(&mut self, consume_close_paren: bool) -> Node {
        let mut nodes = Vec::new();
        while self.should_consume_sequence_element(consume_close_paren) {
            let node = self.parse_primary_expression_and_quantifiers(nodes.last());
            nodes.push(node);
        }
        Node::Sequence(merge_text_nodes(nodes))
    }

    fn should_consume_sequence_element(&self, consume_close_paren: bool) -> bool {
        match self.current.kind {
            TokenKind::EndOfFile | TokenKind::Bar => false,
            TokenKind::CloseParen => consume_close_paren,
            _ => true,
        }
    }

    fn parse_primary_expression_and_quantifiers(&mut self, last: Option<&Node>) -> Node {
        let current = self.parse_primary_expression(last);
        if current.is_simple_options() {
            // (?i) takes no quantifier
            return current;
        }

        let quantifier = match self.current.kind {
            TokenKind::Asterisk => Quantifier::ZeroOrMore {
                expression: current,
                asterisk: self.consume(true),
            },
            TokenKind::Plus => Quantifier::OneOrMore {
                expression: current,
                plus: self.consume(true),
            },
            TokenKind::Question => Quantifier::ZeroOrOne {
                expression: current,
                question: self.consume(true),
            },
            TokenKind::OpenBrace => return self.try_parse_numeric_quantifier(current),
            _ => return current,
        };
        self.try_parse_lazy_quantifier(Node::Quantifier(Box::new(quantifier)))
    }

    fn try_parse_lazy_quantifier(&mut self, quantifier: Node) -> Node {
        if self.current.kind != TokenKind::Question {
            return quantifier;
        }

        Node::Quantifier(Box::new(Quantifier::Lazy {
            quantifier,
            question: self.consume(true),
        }))
    }

    fn try_parse_numeric_quantifier(&mut self, expression: Node) -> Node {
        let open_brace = self.current.clone();
        let start = self.lexer.position();

        let Some(parts) = self.try_parse_numeric_quantifier_parts() else {
            self.current = open_brace;
            self.lexer.set_position(start);
            return expression;
        };

        let NumericParts {
            first,
            comma,
            second,
            close_brace,
        } = parts;
        let quantifier = match (comma, second) {
            (Some(comma), Some(second)) => Quantifier::ClosedRangeCount {
                expression,
                open_brace,
                first,
                comma,
                second,
                close_brace,
            },
            (Some(comma), None) => Quantifier::OpenRangeCount {
                expression,
                open_brace,
                first,
                comma,
                close_brace,
            },
            (None, _) => Quantifier::ExactCount {
                expression,
                open_brace,
                first,
                close_brace,
            },
        };
        self.try_parse_lazy_quantifier(Node::Quantifier(Box::new(quantifier)))
    }

    /// Nothing is allowed between the braces except the numbers and the comma
    fn try_parse_numeric_quantifier_parts(&mut self) -> Option<NumericParts> {
        let first = self.lexer.try_scan_number()?;
        self.consume(false);

        let mut comma = None;
        let mut second = None;
        if self.current.kind == TokenKind::Comma {
            comma = Some(self.current.clone());

            let start = self.lexer.position();
            match self.lexer.try_scan_number() {
                None => self.reset_and_consume(start, false),
                Some(mut number) => {
                    self.consume(false);
                    if let (Some(low), Some(high)) = (first.number(), number.number()) {
                        if high < low {
                            let diagnostic = self.diagnostic(
                                DiagnosticKind::ReversedQuantifierBounds,
                                number.span,
                            );
                            number.add_diagnostic_if_none(diagnostic);
                        }
                    }
                    second = Some(number);
                }
            }
        }

        if self.current.kind != TokenKind::CloseBrace {
            return None;
        }

        let close_brace = self.consume(true);
        Some(NumericParts {
            first,
            comma,
            second,
            close_brace,
        })
    }

    fn parse_primary_expression(&mut self, last: Option<&Node>) -> Node {
        match self.current.kind {
            TokenKind::Dot => Node::Wildcard(self.consume(true)),
            TokenKind::Caret => Node::StartAnchor(self.consume(true)),
            TokenKind::Dollar => Node::EndAnchor(self.consume(true)),
            TokenKind::Backslash => {
                let backslash = self.current.clone();
                self.parse_escape(backslash, true)
            }
            TokenKind::OpenBracket => self.parse_character_class(),
            TokenKind::OpenParen => self.parse_grouping(true),
            TokenKind::CloseParen => self.parse_unexpected_close_paren(),
            TokenKind::OpenBrace => self.parse_possible_unexpected_numeric_quantifier(last),
            TokenKind::Asterisk | TokenKind::Plus | TokenKind::Question => {
                self.parse_unexpected_quantifier(last)
            }
            _ => Node::Text(self.consume(true).with_kind(TokenKind::Text)),
        }
    }

    /// `{1}` with nothing to quantify is an error; `{x}` is plain text
    fn parse_possible_unexpected_numeric_quantifier(&mut self, last: Option<&Node>) -> Node {
        let mut open_brace = self.current.clone().with_kind(TokenKind::Text);
        let start = self.lexer.position();

        if self.try_parse_numeric_quantifier_parts().is_some() {
            self.check_quantifier_expression(last, &mut open_brace);
        }

        self.reset_and_consume(start, true);
        Node::Text(open_brace)
    }

    fn parse_unexpected_close_paren(&mut self) -> Node {
        let mut token = self.current.clone().with_kind(TokenKind::Text);
        let diagnostic = self.diagnostic(DiagnosticKind::TooManyCloseParens, token.span);
        token.add_diagnostic_if_none(diagnostic);
        self.consume(true);
        Node::Text(token)
    }

    fn parse_unexpected_quantifier(&mut self, last: Option<&Node>) -> Node {
        let mut token = self.consume(true);
        self.check_quantifier_expression(last, &mut token);
        Node::Text(token.with_kind(TokenKind::Text))
    }

    fn check_quantifier_expression(&self, last: Option<&Node>, token: &mut Token) {
        let kind = match last {
            None => DiagnosticKind::QuantifierFollowingNothing,
            Some(node) if node.is_simple_options() => DiagnosticKind::QuantifierFollowingNothing,
            Some(node) if node.is_quantifier() => {
                DiagnosticKind::NestedQuantifier(token.first_char().unwrap_or('{'))
            }
            Some(_) => return,
        };
        let diagnostic = self.diagnostic(kind, token.span);
        token.add_diagnostic_if_none(diagnostic);
    }

    // Groupings

    fn parse_grouping(&mut self, record: bool) -> Node {
        if self.depth >= MAX_DEPTH {
            let mut token = self.consume(true).with_kind(TokenKind::Text);
            let diagnostic = self.diagnostic(DiagnosticKind::NestingTooDeep, token.span);
            token.add_diagnostic_if_none(diagnostic);
            return Node::Text(token);
        }

        self.depth += 1;
        let grouping = self.parse_grouping_construct(record);
        self.depth -= 1;
        Node::Grouping(Box::new(grouping))
    }

    fn parse_grouping_construct(&mut self, record: bool) -> Grouping {
        let start = self.lexer.position();

        // (? is special, ( ? is not
        let open_paren = self.consume(false);
        if self.current.kind == TokenKind::Question {
            let question = self.current.clone();
            return self.parse_group_question(open_paren, question, record);
        }

        self.lexer.set_position(start);
        let capturing = record && !self.options.is_explicit_capture();
        self.parse_simple_group(open_paren, capturing)
    }

    fn parse_simple_group(&mut self, open_paren: Token, capturing: bool) -> Grouping {
        let slot = capturing.then(|| self.captures.reserve(DefinitionKind::Unnamed));
        let expression = self.parse_grouping_embedded_expression(self.options);
        let close_paren = self.parse_grouping_close_paren();
        self.complete_capture(slot, &open_paren, &close_paren);

        Grouping::Simple {
            open_paren,
            expression,
            close_paren,
        }
    }

    /// Parse a group body with `options` in effect, restoring the outer
    /// options before the `)` is scanned
    fn parse_grouping_embedded_expression(&mut self, options: RegexOptions) -> Node {
        let saved = self.options;
        self.options = options;

        // trivia is allowed before the first element of the body
        self.consume(true);
        let expression = self.parse_alternating_sequences(false);
        self.options = saved;
        expression
    }

    fn parse_grouping_close_paren(&mut self) -> Token {
        if self.current.kind == TokenKind::CloseParen {
            return self.consume(true);
        }

        let mut token = self.missing(TokenKind::CloseParen);
        let span = Span::empty(self.current.span.start);
        token.add_diagnostic_if_none(self.diagnostic(DiagnosticKind::NotEnoughCloseParens, span));
        token
    }

    fn complete_capture(&mut self, slot: Option<usize>, open_paren: &Token, close_paren: &Token) {
        if let Some(slot) = slot {
            self.captures
                .complete(slot, Span::new(open_paren.span.start, close_paren.span.end));
        }
    }

    /// The marker token, body and close paren of a `(?x...)` construct
    fn parse_marked_grouping(&mut self, options: RegexOptions) -> (Token, Node, Token) {
        let marker = self.current.clone();
        let expression = self.parse_grouping_embedded_expression(options);
        let close_paren = self.parse_grouping_close_paren();
        (marker, expression, close_paren)
    }

    fn parse_group_question(
        &mut self,
        mut open_paren: Token,
        question: Token,
        record: bool,
    ) -> Grouping {
        if let Some(options) = self.lexer.try_scan_options() {
            return self.parse_options_grouping(open_paren, question, options);
        }

        let after_question = self.lexer.position();
        self.consume(false);

        match self.current.kind {
            TokenKind::LessThan => {
                return self.parse_lookbehind_or_named_capture(open_paren, question, record);
            }
            TokenKind::SingleQuote => {
                let open = self.current.clone();
                return self.parse_named_capture_or_balancing(open_paren, question, open, record);
            }
            TokenKind::OpenParen => return self.parse_conditional_grouping(open_paren, question),
            TokenKind::Colon => {
                let (colon, expression, close_paren) = self.parse_marked_grouping(self.options);
                return Grouping::NonCapturing {
                    open_paren,
                    question,
                    colon,
                    expression,
                    close_paren,
                };
            }
            TokenKind::Equals => {
                let options = self.options - RegexOptions::RIGHT_TO_LEFT;
                let (equals, expression, close_paren) = self.parse_marked_grouping(options);
                return Grouping::PositiveLookahead {
                    open_paren,
                    question,
                    equals,
                    expression,
                    close_paren,
                };
            }
            TokenKind::Exclamation => {
                let options = self.options - RegexOptions::RIGHT_TO_LEFT;
                let (exclamation, expression, close_paren) = self.parse_marked_grouping(options);
                return Grouping::NegativeLookahead {
                    open_paren,
                    question,
                    exclamation,
                    expression,
                    close_paren,
                };
            }
            TokenKind::GreaterThan => {
                let (greater_than, expression, close_paren) =
                    self.parse_marked_grouping(self.options);
                return Grouping::Atomic {
                    open_paren,
                    question,
                    greater_than,
                    expression,
                    close_paren,
                };
            }
            // (?) is accepted as an empty group
            TokenKind::CloseParen => {}
            _ => {
                let diagnostic =
                    self.diagnostic(DiagnosticKind::UnrecognizedGroupingConstruct, open_paren.span);
                open_paren.add_diagnostic_if_none(diagnostic);
            }
        }

        // Parse as a plain group; the ? then reports as a quantifier following nothing
        self.lexer.set_position(after_question - 1);
        self.parse_simple_group(open_paren, false)
    }

    fn parse_options_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        options: Token,
    ) -> Grouping {
        self.consume(false);
        match self.current.kind {
            TokenKind::CloseParen => {
                self.options = self.options.apply_inline(&options.text);
                let close_paren = self.consume(true);
                Grouping::SimpleOptions {
                    open_paren,
                    question,
                    options,
                    close_paren,
                }
            }
            TokenKind::Colon => {
                let nested = self.options.apply_inline(&options.text);
                let (colon, expression, close_paren) = self.parse_marked_grouping(nested);
                Grouping::NestedOptions {
                    open_paren,
                    question,
                    options,
                    colon,
                    expression,
                    close_paren,
                }
            }
            _ => {
                let mut close_paren = self.missing(TokenKind::CloseParen);
                let diagnostic =
                    self.diagnostic(DiagnosticKind::UnrecognizedGroupingConstruct, open_paren.span);
                close_paren.add_diagnostic_if_none(diagnostic);
                Grouping::SimpleOptions {
                    open_paren,
                    question,
                    options,
                    close_paren,
                }
            }
        }
    }

    fn parse_lookbehind_or_named_capture(
        &mut self,
        open_paren: Token,
        question: Token,
        record: bool,
    ) -> Grouping {
        let start = self.lexer.position();
        let less_than = self.consume(false);
        let options = self.options | RegexOptions::RIGHT_TO_LEFT;

        match self.current.kind {
            TokenKind::Equals => {
                let (equals, expression, close_paren) = self.parse_marked_grouping(options);
                Grouping::PositiveLookbehind {
                    open_paren,
                    question,
                    less_than,
                    equals,
                    expression,
                    close_paren,
                }
            }
            TokenKind::Exclamation => {
                let (exclamation, expression, close_paren) = self.parse_marked_grouping(options);
                Grouping::NegativeLookbehind {
                    open_paren,
                    question,
                    less_than,
                    exclamation,
                    expression,
                    close_paren,
                }
            }
            _ => {
                self.lexer.set_position(start);
                self.parse_named_capture_or_balancing(open_paren, question, less_than, record)
            }
        }
    }

    fn parse_named_capture_or_balancing(
        &mut self,
        mut open_paren: Token,
        question: Token,
        open: Token,
        record: bool,
    ) -> Grouping {
        if self.lexer.at_end() {
            let span = Span::new(open_paren.span.start, open.span.end);
            let diagnostic = self.diagnostic(DiagnosticKind::UnrecognizedGroupingConstruct, span);
            open_paren.add_diagnostic_if_none(diagnostic);
        }

        let mut capture = match self.lexer.try_scan_number_or_capture_name() {
            Some(capture) => capture,
            None => {
                self.consume(false);
                let capture = self.missing(TokenKind::CaptureName);
                if self.current.kind == TokenKind::Minus {
                    return self.parse_balancing_grouping(
                        open_paren,
                        question,
                        open,
                        capture,
                        record,
                    );
                }

                let span = Self::token_span_including_eof(&self.current);
                let diagnostic = self.diagnostic(DiagnosticKind::InvalidGroupName, span);
                open_paren.add_diagnostic_if_none(diagnostic);
                self.move_back_before_previous_scan();
                capture
            }
        };

        if capture.number() == Some(0) {
            let diagnostic = self.diagnostic(DiagnosticKind::CaptureNumberZero, capture.span);
            capture.add_diagnostic_if_none(diagnostic);
        }

        self.consume(false);
        if self.current.kind == TokenKind::Minus {
            return self.parse_balancing_grouping(open_paren, question, open, capture, record);
        }

        let close = self.parse_capture_grouping_close_token(&mut open_paren, &open);
        let slot = self.reserve_named(&capture, record);
        let expression = self.parse_grouping_embedded_expression(self.options);
        let close_paren = self.parse_grouping_close_paren();
        self.complete_capture(slot, &open_paren, &close_paren);

        Grouping::Capture {
            open_paren,
            question,
            open,
            capture,
            close,
            expression,
            close_paren,
        }
    }

    /// Reserve a definition slot for a `(?<...>` capture token, if it defines one
    fn reserve_named(&mut self, capture: &Token, record: bool) -> Option<usize> {
        if !record || capture.missing {
            return None;
        }
        let kind = match &capture.value {
            Some(TokenValue::Number(0)) | None => return None,
            Some(TokenValue::Number(n)) => DefinitionKind::Number(*n),
            Some(TokenValue::Name(name)) => DefinitionKind::Name(name.clone()),
        };
        Some(self.captures.reserve(kind))
    }

    fn parse_capture_grouping_close_token(
        &mut self,
        open_paren: &mut Token,
        open: &Token,
    ) -> Token {
        let matched = matches!(
            (open.kind, self.current.kind),
            (TokenKind::LessThan, TokenKind::GreaterThan)
                | (TokenKind::SingleQuote, TokenKind::SingleQuote)
        );
        if matched {
            return self.current.clone();
        }

        if self.current.kind == TokenKind::EndOfFile {
            let span = Span::new(open_paren.span.start, open.span.end);
            let diagnostic = self.diagnostic(DiagnosticKind::UnrecognizedGroupingConstruct, span);
            open_paren.add_diagnostic_if_none(diagnostic);
        } else {
            let diagnostic = self.diagnostic(DiagnosticKind::InvalidGroupName, self.current.span);
            open_paren.add_diagnostic_if_none(diagnostic);
            // rewind to before the bogus character
            self.lexer.retreat();
        }

        let kind = if open.kind == TokenKind::LessThan {
            TokenKind::GreaterThan
        } else {
            TokenKind::SingleQuote
        };
        self.missing(kind)
    }

    fn parse_balancing_grouping(
        &mut self,
        mut open_paren: Token,
        question: Token,
        open: Token,
        first: Token,
        record: bool,
    ) -> Grouping {
        let minus = self.current.clone();
        let second = match self.lexer.try_scan_number_or_capture_name() {
            Some(second) => second,
            None => {
                self.consume(false);
                let span = Self::token_span_including_eof(&self.current);
                let diagnostic = self.diagnostic(DiagnosticKind::InvalidGroupName, span);
                open_paren.add_diagnostic_if_none(diagnostic);
                self.move_back_before_previous_scan();
                self.missing(TokenKind::CaptureName)
            }
        };
        if !second.missing {
            self.captures.reference(&second, ReferenceKind::Backreference);
        }

        self.consume(false);
        let close = self.parse_capture_grouping_close_token(&mut open_paren, &open);
        let slot = self.reserve_named(&first, record);
        let expression = self.parse_grouping_embedded_expression(self.options);
        let close_paren = self.parse_grouping_close_paren();
        self.complete_capture(slot, &open_paren, &close_paren);

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
        }
    }

    fn parse_conditional_grouping(&mut self, open_paren: Token, question: Token) -> Grouping {
        let inner_open_paren = self.current.clone();
        let after_inner_open_paren = self.lexer.position();

        let Some(mut capture) = self.lexer.try_scan_number_or_capture_name() else {
            return self.parse_conditional_expression_grouping(open_paren, question);
        };

        let inner_close_paren = if capture.kind == TokenKind::Number {
            // (?(4 ) is malformed, not an expression condition
            self.consume(false);
            if self.current.kind == TokenKind::CloseParen {
                self.captures.reference(&capture, ReferenceKind::Condition);
                self.current.clone()
            } else {
                let diagnostic = self.diagnostic(DiagnosticKind::MalformedCondition, capture.span);
                capture.add_diagnostic_if_none(diagnostic);
                self.move_back_before_previous_scan();
                self.missing(TokenKind::CloseParen)
            }
        } else {
            // An unknown name, or a known one not followed directly by ), is an expression
            let known = capture.name().is_some_and(|name| self.known.contains_name(name));
            if !known {
                self.lexer.set_position(after_inner_open_paren);
                return self.parse_conditional_expression_grouping(open_paren, question);
            }

            self.consume(false);
            if self.current.kind != TokenKind::CloseParen {
                self.lexer.set_position(after_inner_open_paren);
                return self.parse_conditional_expression_grouping(open_paren, question);
            }
            self.current.clone()
        };

        self.consume(true);
        let expression = self.parse_conditional_grouping_result();
        let close_paren = self.parse_grouping_close_paren();

        Grouping::ConditionalByCapture {
            open_paren,
            question,
            inner_open_paren,
            capture,
            inner_close_paren,
            expression,
            close_paren,
        }
    }

    fn parse_conditional_expression_grouping(
        &mut self,
        mut open_paren: Token,
        question: Token,
    ) -> Grouping {
        // back to the inner (
        self.lexer.retreat();

        let problem = if self.lexer.is_at("(?#") {
            let position = self.lexer.position();
            let comment = self.lexer.scan_comment(RegexOptions::empty());
            self.lexer.set_position(position);
            match comment.and_then(|trivia| trivia.diagnostic) {
                Some(diagnostic) => Some(diagnostic),
                None => Some(
                    self.diagnostic(DiagnosticKind::ConditionCannotBeComment, open_paren.span),
                ),
            }
        } else if self.lexer.is_at("(?'")
            || (self.lexer.is_at("(?<") && !self.lexer.is_at("(?<!") && !self.lexer.is_at("(?<="))
        {
            Some(self.diagnostic(DiagnosticKind::ConditionCannotCapture, open_paren.span))
        } else {
            None
        };
        if let Some(diagnostic) = problem {
            open_paren.add_diagnostic_if_none(diagnostic);
        }

        self.consume(false);
        let condition = self.parse_grouping(false);
        let expression = self.parse_conditional_grouping_result();
        let close_paren = self.parse_grouping_close_paren();

        Grouping::ConditionalByExpression {
            open_paren,
            question,
            condition,
            expression,
            close_paren,
        }
    }

    /// The yes|no branches; at most one `|` is allowed
    fn parse_conditional_grouping_result(&mut self) -> Node {
        let saved = self.options;
        let mut result = self.parse_alternating_sequences(false);
        self.options = saved;

        if let Node::Alternation { left, bar, .. } = &mut result {
            if matches!(**left, Node::Alternation { .. }) {
                let diagnostic = self.diagnostic(DiagnosticKind::TooManyBars, bar.span);
                bar.add_diagnostic_if_none(diagnostic);
            }
        }
        result
    }

    // Character classes

    fn parse_character_class(&mut self) -> Node {
        Node::CharacterClass(Box::new(self.parse_character_class_body()))
    }

    fn parse_character_class_body(&mut self) -> CharacterClass {
        self.depth += 1;

        // no trivia anywhere inside a class
        let open_bracket = self.consume(false);
        let caret = if self.current.kind == TokenKind::Caret {
            Some(self.consume(false))
        } else {
            None
        };

        let mut components = Vec::new();
        let mut close_bracket = None;
        while self.current.kind != TokenKind::EndOfFile {
            // a ] right after [ or [^ is literal
            if self.current.kind == TokenKind::CloseBracket && !components.is_empty() {
                close_bracket = Some(self.consume(true));
                break;
            }
            self.parse_character_class_components(&mut components);
        }

        let close_bracket = close_bracket.unwrap_or_else(|| {
            let mut token = self.missing(TokenKind::CloseBracket);
            let span = Span::empty(self.current.span.start);
            token.add_diagnostic_if_none(
                self.diagnostic(DiagnosticKind::UnterminatedCharacterClass, span),
            );
            token
        });

        self.depth -= 1;
        CharacterClass {
            open_bracket,
            caret,
            components: Node::Sequence(merge_text_nodes(components)),
            close_bracket,
        }
    }

    fn parse_character_class_components(&mut self, components: &mut Vec<Node>) {
        let left = self.parse_single_character_class_component(components.is_empty(), false);
        let starts_range = !left.is_escaped_minus()
            && !matches!(
                &left,
                Node::Escape(escape) if matches!(
                    **escape,
                    Escape::CharacterClassShorthand { .. } | Escape::Category { .. }
                )
            );
        if !starts_range || self.current.kind != TokenKind::Minus || self.lexer.is_at("]") {
            components.push(left);
            return;
        }

        let mut minus = self.consume(false);
        if self.current.kind == TokenKind::OpenBracket {
            components.push(left);
            let subtraction = self.parse_character_class_subtraction(minus);
            components.push(subtraction);
            return;
        }

        let right = self.parse_right_side_of_range();
        if let (Some(low), Some(high)) = (range_value(&left), range_value(&right)) {
            if low > high {
                let diagnostic =
                    self.diagnostic(DiagnosticKind::ReversedCharacterRange, minus.span);
                minus.add_diagnostic_if_none(diagnostic);
            }
        }

        components.push(Node::CharacterClassRange {
            left: Box::new(left),
            minus,
            right: Box::new(right),
        });
    }

    /// After `lo-`, any number of `\-` escapes are skipped over and the
    /// component after them is the real upper bound
    fn parse_right_side_of_range(&mut self) -> Node {
        let first = self.parse_single_character_class_component(false, true);
        if !first.is_escaped_minus() {
            return first;
        }

        let mut nodes = vec![first];
        while nodes.last().is_some_and(Node::is_escaped_minus)
            && self.current.kind != TokenKind::CloseBracket
        {
            let node = self.parse_single_character_class_component(false, true);
            nodes.push(node);
        }
        Node::Sequence(nodes)
    }

    fn parse_single_character_class_component(
        &mut self,
        is_first: bool,
        after_range_minus: bool,
    ) -> Node {
        if self.current.kind == TokenKind::Backslash && !self.lexer.at_end() {
            let mut backslash = self.current.clone();
            self.consume(false);

            let next = self.current.first_char().unwrap_or_default();
            match next {
                'D' | 'd' | 'S' | 's' | 'W' | 'w' | 'p' | 'P' => {
                    if after_range_minus {
                        let span = Span::new(backslash.span.start, self.current.span.end);
                        let diagnostic =
                            self.diagnostic(DiagnosticKind::ClassInCharacterRange(next), span);
                        backslash.add_diagnostic_if_none(diagnostic);
                    }
                    self.lexer.retreat();
                    return self.parse_escape(backslash, false);
                }
                '-' => {
                    let type_token = self.consume(false).with_kind(TokenKind::Text);
                    return escape(Escape::Simple {
                        backslash,
                        type_token,
                    });
                }
                _ => {
                    // \b is a backspace here, and \k is not a reference
                    self.lexer.retreat();
                    return self.parse_char_escape(backslash, false);
                }
            }
        }

        if !after_range_minus
            && !is_first
            && self.current.kind == TokenKind::Minus
            && self.lexer.is_at("[")
        {
            let minus = self.consume(false);
            return self.parse_character_class_subtraction(minus);
        }

        if !after_range_minus
            && self.current.kind == TokenKind::OpenBracket
            && self.lexer.is_at(":")
        {
            let before_bracket = self.lexer.position() - 1;
            self.consume(false);

            let name = self.lexer.try_scan_capture_name();
            if name.is_some() && self.lexer.is_at(":]") {
                self.lexer.set_position(self.lexer.position() + 2);
                let token = self
                    .lexer
                    .sub_token(TokenKind::Text, before_bracket, self.lexer.position());
                self.consume(false);
                return Node::PosixProperty(token);
            }

            self.reset_and_consume(before_bracket, false);
        }

        if self.current.kind == TokenKind::EndOfFile {
            return Node::Text(self.missing(TokenKind::Text));
        }
        Node::Text(self.consume(false).with_kind(TokenKind::Text))
    }

    fn parse_character_class_subtraction(&mut self, mut minus: Token) -> Node {
        if self.depth >= MAX_DEPTH {
            let diagnostic = self.diagnostic(DiagnosticKind::NestingTooDeep, minus.span);
            minus.add_diagnostic_if_none(diagnostic);
            return Node::Text(minus.with_kind(TokenKind::Text));
        }

        let class = self.parse_character_class_body();
        if !matches!(
            self.current.kind,
            TokenKind::CloseBracket | TokenKind::EndOfFile
        ) {
            let span = Span::empty(minus.span.start);
            let diagnostic = self.diagnostic(DiagnosticKind::SubtractionMustBeLast, span);
            minus.add_diagnostic_if_none(diagnostic);
        }

        Node::CharacterClassSubtraction {
            minus,
            class: Box::new(class),
        }
    }

    // Escapes

    /// Parse the escape starting at `backslash`; the lexer sits just past it
    fn parse_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume(false);
        if self.current.kind == TokenKind::EndOfFile {
            return self.illegal_backslash_at_end(backslash);
        }

        match self.current.first_char() {
            Some('b' | 'B' | 'A' | 'G' | 'Z' | 'z') => escape(Escape::Anchor {
                backslash,
                type_token: self.consume(allow_trivia_after_end),
            }),
            Some('w' | 'W' | 's' | 'S' | 'd' | 'D') => escape(Escape::CharacterClassShorthand {
                backslash,
                type_token: self.consume(allow_trivia_after_end),
            }),
            Some('p' | 'P') => self.parse_category_escape(backslash, allow_trivia_after_end),
            _ => {
                self.lexer.retreat();
                self.parse_basic_backslash(backslash, allow_trivia_after_end)
            }
        }
    }

    fn illegal_backslash_at_end(&mut self, mut backslash: Token) -> Node {
        let diagnostic = self.diagnostic(DiagnosticKind::IllegalBackslashAtEnd, backslash.span);
        backslash.add_diagnostic_if_none(diagnostic);
        escape(Escape::Simple {
            backslash,
            type_token: self.missing(TokenKind::Text),
        })
    }

    fn parse_basic_backslash(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume(false);
        if self.current.kind == TokenKind::EndOfFile {
            return self.illegal_backslash_at_end(backslash);
        }

        match self.current.first_char() {
            Some('k') => self.parse_possible_k_capture_escape(backslash, allow_trivia_after_end),
            Some('<' | '\'') => {
                self.lexer.retreat();
                self.parse_possible_capture_escape(backslash, allow_trivia_after_end)
            }
            Some('1'..='9') => {
                self.lexer.retreat();
                if self.options.is_ecma_script() {
                    self.parse_possible_ecma_backreference_escape(backslash, allow_trivia_after_end)
                } else {
                    self.parse_possible_backreference_escape(backslash, allow_trivia_after_end)
                }
            }
            _ => {
                self.lexer.retreat();
                self.parse_char_escape(backslash, allow_trivia_after_end)
            }
        }
    }

    /// `\12` is a backreference if group 12 exists or it is a single digit,
    /// otherwise it is re-read as an octal or character escape
    fn parse_possible_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let start = self.lexer.position();
        let Some(number) = self.lexer.try_scan_number() else {
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        };

        let value = number.number().unwrap_or_default();
        if self.known.contains_number(value) || value <= 9 {
            self.captures.reference(&number, ReferenceKind::Backreference);
            self.consume(allow_trivia_after_end);
            return escape(Escape::Backreference { backslash, number });
        }

        self.lexer.set_position(start);
        self.parse_char_escape(backslash, allow_trivia_after_end)
    }

    /// In ECMAScript mode the longest digit prefix naming a group opened
    /// before the backslash is the reference
    fn parse_possible_ecma_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let start = self.lexer.position();
        let mut position = start;
        let mut value: i32 = 0;
        let mut best = None;

        while let Some(digit) = self.lexer.char_at(position).and_then(|c| c.to_digit(10)) {
            value = value.wrapping_mul(10).wrapping_add(digit as i32);
            position += 1;
            let opened_before = self
                .known
                .get_number(value)
                .is_some_and(|entry| entry.span.start < backslash.span.start);
            if opened_before {
                best = Some((position, value));
            }
        }

        if let Some((end, value)) = best {
            let mut number = self.lexer.sub_token(TokenKind::Number, start, end);
            number.value = Some(TokenValue::Number(value));
            self.reset_and_consume(end, allow_trivia_after_end);
            return escape(Escape::Backreference { backslash, number });
        }

        self.lexer.set_position(start);
        self.parse_char_escape(backslash, allow_trivia_after_end)
    }

    fn parse_possible_capture_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let after_backslash = self.lexer.position();
        let (open, capture, close) = self.scan_capture_parts(allow_trivia_after_end);

        if open.missing || capture.missing || close.missing {
            self.lexer.set_position(after_backslash);
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        }

        escape(Escape::CaptureReference {
            backslash,
            open,
            capture,
            close,
        })
    }

    fn parse_possible_k_capture_escape(
        &mut self,
        mut backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let type_token = self.current.clone();
        let after_backslash = self.lexer.position() - 1;

        let (open, capture, close) = self.scan_capture_parts(allow_trivia_after_end);
        if open.missing {
            let span = Span::new(backslash.span.start, type_token.span.end);
            let diagnostic = self.diagnostic(DiagnosticKind::MalformedNamedBackreference, span);
            backslash.add_diagnostic_if_none(diagnostic);
            return escape(Escape::Simple {
                backslash,
                type_token: type_token.with_kind(TokenKind::Text),
            });
        }

        if capture.missing || close.missing {
            // falls back to \k as a plain escape
            self.lexer.set_position(after_backslash);
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        }

        escape(Escape::NamedBackreference {
            backslash,
            type_token,
            open,
            capture,
            close,
        })
    }

    /// Scan `<cap>` or `'cap'`; absent parts come back as missing tokens
    fn scan_capture_parts(&mut self, allow_trivia_after_end: bool) -> (Token, Token, Token) {
        self.consume(false);

        let has_open = matches!(
            self.current.kind,
            TokenKind::LessThan | TokenKind::SingleQuote
        );
        if self.lexer.at_end() || !has_open {
            return (
                self.missing(TokenKind::LessThan),
                self.missing(TokenKind::CaptureName),
                self.missing(TokenKind::GreaterThan),
            );
        }

        let open = self.current.clone();
        let scanned = self.lexer.try_scan_number_or_capture_name();
        self.consume(false);

        let Some(capture) = scanned else {
            return (
                open,
                self.missing(TokenKind::CaptureName),
                self.missing(TokenKind::GreaterThan),
            );
        };

        let matched = matches!(
            (open.kind, self.current.kind),
            (TokenKind::LessThan, TokenKind::GreaterThan)
                | (TokenKind::SingleQuote, TokenKind::SingleQuote)
        );
        if !matched {
            let close = self.missing(TokenKind::GreaterThan);
            return (open, capture, close);
        }

        self.captures.reference(&capture, ReferenceKind::Backreference);
        let close = self.consume(allow_trivia_after_end);
        (open, capture, close)
    }

    /// Escapes that stand for a single character
    fn parse_char_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume(false);
        let ch = match self.current.first_char() {
            Some(ch) if self.current.kind != TokenKind::EndOfFile => ch,
            _ => return self.illegal_backslash_at_end(backslash),
        };

        if ('0'..='7').contains(&ch) {
            self.lexer.retreat();
            let digits = self.lexer.scan_octal_characters(self.options);
            self.consume(allow_trivia_after_end);
            return escape(Escape::Octal { backslash, digits });
        }

        match ch {
            'a' | 'b' | 'e' | 'f' | 'n' | 'r' | 't' | 'v' => escape(Escape::Simple {
                backslash,
                type_token: self.consume(allow_trivia_after_end),
            }),
            'x' => {
                let (type_token, digits) = self.scan_hex_escape(2, allow_trivia_after_end);
                escape(Escape::Hex {
                    backslash,
                    type_token,
                    digits,
                })
            }
            'u' => {
                let (type_token, digits) = self.scan_hex_escape(4, allow_trivia_after_end);
                escape(Escape::Unicode {
                    backslash,
                    type_token,
                    digits,
                })
            }
            'c' => self.parse_control_escape(backslash, allow_trivia_after_end),
            _ => {
                let mut type_token = self
                    .consume(allow_trivia_after_end)
                    .with_kind(TokenKind::Text);
                if !self.options.is_ecma_script() && is_word_char(ch) {
                    let diagnostic =
                        self.diagnostic(DiagnosticKind::UnrecognizedEscape(ch), type_token.span);
                    type_token.add_diagnostic_if_none(diagnostic);
                }
                escape(Escape::Simple {
                    backslash,
                    type_token,
                })
            }
        }
    }

    fn scan_hex_escape(&mut self, count: usize, allow_trivia_after_end: bool) -> (Token, Token) {
        let type_token = self.current.clone();
        let digits = self.lexer.scan_hex_characters(count);
        self.consume(allow_trivia_after_end);
        (type_token, digits)
    }

    fn parse_control_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        let mut type_token = self.consume(false);

        if self.current.kind == TokenKind::EndOfFile {
            let diagnostic =
                self.diagnostic(DiagnosticKind::MissingControlCharacter, type_token.span);
            type_token.add_diagnostic_if_none(diagnostic);
            return escape(Escape::Control {
                backslash,
                type_token,
                control: self.missing(TokenKind::Text),
            });
        }

        // \ca is \cA
        let ch = self.current.first_char().unwrap_or_default().to_ascii_uppercase();
        if ('@'..='_').contains(&ch) {
            let control = self
                .consume(allow_trivia_after_end)
                .with_kind(TokenKind::Text);
            return escape(Escape::Control {
                backslash,
                type_token,
                control,
            });
        }

        // the bogus character is left for the enclosing sequence
        let diagnostic =
            self.diagnostic(DiagnosticKind::UnrecognizedControlCharacter, self.current.span);
        type_token.add_diagnostic_if_none(diagnostic);
        escape(Escape::Control {
            backslash,
            type_token,
            control: self.missing(TokenKind::Text),
        })
    }

    fn parse_category_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        let type_token = self.current.clone();
        let start = self.lexer.position();

        match self.try_get_category_escape_parts(allow_trivia_after_end) {
            Ok((open_brace, category, close_brace)) => escape(Escape::Category {
                backslash,
                type_token,
                open_brace,
                category,
                close_brace,
            }),
            Err(kind) => {
                self.reset_and_consume(start, allow_trivia_after_end);
                let mut type_token = type_token.with_kind(TokenKind::Text);
                let span = Span::new(backslash.span.start, type_token.span.end);
                type_token.add_diagnostic_if_none(self.diagnostic(kind, span));
                escape(Escape::Simple {
                    backslash,
                    type_token,
                })
            }
        }
    }

    fn try_get_category_escape_parts(
        &mut self,
        allow_trivia_after_end: bool,
    ) -> Result<(Token, Token, Token), DiagnosticKind> {
        if self.lexer.remaining() < "{x}".len() {
            return Err(DiagnosticKind::IncompleteCategoryEscape);
        }

        self.consume(false);
        if self.current.kind != TokenKind::OpenBrace {
            return Err(DiagnosticKind::MalformedCategoryEscape);
        }

        let open_brace = self.current.clone();
        let category = self.lexer.try_scan_escape_category(self.categories);

        self.consume(false);
        if self.current.kind != TokenKind::CloseBrace {
            return Err(DiagnosticKind::IncompleteCategoryEscape);
        }

        let category = category.ok_or(DiagnosticKind::UnknownProperty(String::new()))?;
        let close_brace = self.consume(allow_trivia_after_end);
        Ok((open_brace, category, close_brace))
    }
}

fn escape(escape: Escape) -> Node {
    Node::Escape(Box::new(escape))
}

/// Merge runs of plain adjacent text into a single token
fn merge_text_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut result: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(Node::Text(last)), Node::Text(next)) = (result.last_mut(), &node) {
            if can_merge(last, next) {
                last.text.push_str(&next.text);
                last.span.end = next.span.end;
                continue;
            }
        }
        result.push(node);
    }
    result
}

fn can_merge(last: &Token, next: &Token) -> bool {
    let plain = |t: &Token| !t.missing && t.diagnostic.is_none() && t.value.is_none();
    plain(last) && plain(next) && next.leading_trivia.is_empty() && last.span.end == next.span.start
}

/// Character value of a range endpoint, if it has one and is well formed
fn range_value(node: &Node) -> Option<u32> {
    if node.has_problem() {
        return None;
    }
    range_value_of(node)
}

fn range_value_of(node: &Node) -> Option<u32> {
    match node {
        Node::Text(token) => token.first_char().map(u32::from),
        // [:name:] counts as its opening [
        Node::PosixProperty(_) => Some(u32::from('[')),
        Node::Sequence(nodes) => nodes
            .last()
            .filter(|last| !last.is_escaped_minus())
            .and_then(range_value_of),
        Node::Escape(escape) => match &**escape {
            Escape::Simple { type_token, .. } => type_token.first_char().map(escape_char_value),
            Escape::Control { control, .. } => control
                .first_char()
                .map(|c| (u32::from(c.to_ascii_uppercase()) + 1).saturating_sub(u32::from('A'))),
            Escape::Octal { digits, .. } => u32::from_str_radix(&digits.text, 8).ok(),
            Escape::Hex { digits, .. } | Escape::Unicode { digits, .. } => {
                u32::from_str_radix(&digits.text, 16).ok()
            }
            _ => None,
        },
        _ => None,
    }
}

fn escape_char_value(c: char) -> u32 {
    match c {
        'a' => 0x07,
        'b' => 0x08,
        'e' => 0x1B,
        'f' => 0x0C,
        'n' => 0x0A,
        'r' => 0x0D,
        't' => 0x09,
        'v' => 0x0B,
        other => u32::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn kinds(pattern: &str) -> Vec<DiagnosticKind> {
        parse(pattern, 0, RegexOptions::empty())
            .diagnostics()
            .iter()
            .map(|d| d.kind.clone())
            .collect()
    }

    fn sequence(tree: &RegexTree) -> &[Node] {
        match &tree.root {
            Node::CompilationUnit { expression, .. } => match &**expression {
                Node::Sequence(nodes) => nodes,
                _ => &[],
            },
            _ => &[],
        }
    }

    #[test]
    fn test_text_merges() {
        let tree = parse("abc", 0, RegexOptions::empty());
        let nodes = sequence(&tree);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], Node::Text(t) if t.text == "abc"));
    }

    #[test]
    fn test_quantifier_binds_last_char() {
        let tree = parse("ab*", 0, RegexOptions::empty());
        let nodes = sequence(&tree);
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].is_quantifier());
    }

    #[test]
    fn test_brace_without_number_is_text() {
        let tree = parse("a{x}", 0, RegexOptions::empty());
        assert!(tree.diagnostics().is_empty());
        assert!(sequence(&tree).iter().all(|n| matches!(n, Node::Text(_))));
    }

    #[test]
    fn test_numeric_quantifier_following_nothing() {
        assert_eq!(kinds("{1}"), vec![DiagnosticKind::QuantifierFollowingNothing]);
        assert_eq!(kinds("a**"), vec![DiagnosticKind::NestedQuantifier('*')]);
        assert_eq!(kinds("a*??"), vec![DiagnosticKind::NestedQuantifier('?')]);
        assert_eq!(kinds("(?i)*"), vec![DiagnosticKind::QuantifierFollowingNothing]);
    }

    #[test]
    fn test_close_parens() {
        assert_eq!(kinds("a)"), vec![DiagnosticKind::TooManyCloseParens]);
        assert_eq!(kinds("(("), vec![DiagnosticKind::NotEnoughCloseParens]);
    }

    #[test]
    fn test_unrecognized_grouping() {
        assert_eq!(
            kinds("(?e)"),
            vec![
                DiagnosticKind::UnrecognizedGroupingConstruct,
                DiagnosticKind::QuantifierFollowingNothing,
            ]
        );
        assert_eq!(kinds("(?)"), vec![DiagnosticKind::QuantifierFollowingNothing]);
    }

    #[test]
    fn test_class_ranges() {
        assert!(kinds("[a-z]").is_empty());
        assert_eq!(kinds("[z-a]"), vec![DiagnosticKind::ReversedCharacterRange]);
        assert!(kinds("[a-\\-]").is_empty());
        assert_eq!(kinds("[b-\\-a]"), vec![DiagnosticKind::ReversedCharacterRange]);
        assert!(kinds("[\\x41-\\x5A]").is_empty());
        assert_eq!(kinds("[\\cZ-\\cA]"), vec![DiagnosticKind::ReversedCharacterRange]);
    }

    #[test]
    fn test_class_literal_close_bracket() {
        assert!(kinds("[]a]").is_empty());
        assert_eq!(kinds("[]"), vec![DiagnosticKind::UnterminatedCharacterClass]);
    }

    #[test]
    fn test_subtraction_must_be_last() {
        assert!(kinds("[a-z-[aeiou]]").is_empty());
        assert_eq!(
            kinds("[a-z-[aeiou]b]"),
            vec![DiagnosticKind::SubtractionMustBeLast]
        );
    }

    #[test]
    fn test_posix_property() {
        let tree = parse("[[:alpha:]]", 0, RegexOptions::empty());
        assert!(tree.diagnostics().is_empty());
        assert!(tree.dump().contains("PosixProperty"));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(kinds("\\"), vec![DiagnosticKind::IllegalBackslashAtEnd]);
        assert_eq!(kinds("\\q"), vec![DiagnosticKind::UnrecognizedEscape('q')]);
        assert_eq!(kinds("\\x4"), vec![DiagnosticKind::InsufficientHexDigits]);
        assert_eq!(kinds("\\c"), vec![DiagnosticKind::MissingControlCharacter]);
        assert_eq!(kinds("\\c!"), vec![DiagnosticKind::UnrecognizedControlCharacter]);
        assert_eq!(kinds("\\k"), vec![DiagnosticKind::MalformedNamedBackreference]);
        assert_eq!(kinds("\\p"), vec![DiagnosticKind::IncompleteCategoryEscape]);
        assert_eq!(kinds("\\pLux"), vec![DiagnosticKind::MalformedCategoryEscape]);
        assert!(kinds("\\p{Lu}\\t\\u0041\\101").is_empty());
    }

    #[test]
    fn test_ecma_script_accepts_unknown_escapes() {
        let tree = parse("\\q", 0, RegexOptions::ECMA_SCRIPT);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_conditional_too_many_bars() {
        assert!(kinds("(?(?=a)b|c)").is_empty());
        assert_eq!(kinds("(?(?=a)b|c|d)"), vec![DiagnosticKind::TooManyBars]);
    }

    #[test]
    fn test_conditional_conditions() {
        assert_eq!(kinds("(?(?#x)a)")[0], DiagnosticKind::ConditionCannotBeComment);
        assert_eq!(kinds("(?(?<n>x)a)"), vec![DiagnosticKind::ConditionCannotCapture]);
        assert_eq!(kinds("(?(1)a)"), vec![DiagnosticKind::UndefinedGroup]);
        assert_eq!(
            kinds("(?(1 )a)"),
            vec![DiagnosticKind::MalformedCondition, DiagnosticKind::TooManyCloseParens]
        );
        assert!(kinds("()(?(1)a)").is_empty());
    }

    #[test]
    fn test_named_capture_errors() {
        assert_eq!(kinds("(?<0>a)"), vec![DiagnosticKind::CaptureNumberZero]);
        assert_eq!(kinds("(?<>a)"), vec![DiagnosticKind::InvalidGroupName]);
        assert_eq!(
            kinds("(?<"),
            vec![
                DiagnosticKind::UnrecognizedGroupingConstruct,
                DiagnosticKind::NotEnoughCloseParens,
            ]
        );
    }

    #[test]
    fn test_nesting_guard() {
        let pattern = "(".repeat(MAX_DEPTH + 1);
        let tree = parse(&pattern, 0, RegexOptions::empty());
        assert!(tree.diagnostics().iter().any(|d| d.kind == DiagnosticKind::NestingTooDeep));
        assert_eq!(tree.reconstruct(), pattern);
    }

    #[test]
    fn test_range_values() {
        let lexer = Lexer::new("\\n", 0);
        let node = escape(Escape::Simple {
            backslash: lexer.sub_token(TokenKind::Backslash, 0, 1),
            type_token: lexer.sub_token(TokenKind::Text, 1, 2),
        });
        assert_eq!(range_value(&node), Some(0x0A));
        assert_eq!(escape_char_value('-'), u32::from('-'));
    }
}
