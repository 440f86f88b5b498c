//! Resyntax Core Library
//!
//! A lossless syntax analyzer for .NET-style regular expression patterns.
//! Every input, however malformed, produces a complete tree whose tokens
//! reproduce the pattern exactly, plus a list of diagnostics and a table of
//! the capture groups it defines.

pub mod captures;
pub mod categories;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod tree;

pub use captures::{CaptureEntry, CaptureId, CaptureTable};
pub use categories::{CategoryLookup, StandardCategories};
pub use error::{Diagnostic, DiagnosticBag, DiagnosticKind, OptionsError, Span};
pub use lexer::{Lexer, Token, TokenKind, TokenValue, Trivia, TriviaKind};
pub use options::RegexOptions;
pub use parser::{MAX_DEPTH, ParseConfig};
pub use tree::{CharacterClass, Child, Escape, Grouping, Node, Quantifier, RegexTree};

use parser::Parser;

/// Parse a pattern with the standard category names
///
/// `base_offset` is added to every span, so positions can point into a
/// larger document that contains the pattern.
pub fn parse(pattern: &str, base_offset: usize, options: RegexOptions) -> RegexTree {
    parse_with(
        pattern,
        &ParseConfig {
            base_offset,
            options,
            ..ParseConfig::default()
        },
    )
}

/// Parse a pattern with full control over the configuration
pub fn parse_with(pattern: &str, config: &ParseConfig<'_>) -> RegexTree {
    // Where a group is defined can change how earlier text parses
    // (`\10`, `(?(name)`), so captures are discovered first.
    let empty = CaptureTable::new();
    let known = Parser::new(pattern, config, &empty).parse().capture_table();
    Parser::new(pattern, config, &known)
        .parse()
        .into_tree(config.options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        let tree = parse("(?<year>\\d{4})-\\k<year>", 0, RegexOptions::empty());
        assert!(tree.diagnostics().is_empty());
        assert_eq!(tree.reconstruct(), "(?<year>\\d{4})-\\k<year>");
        assert_eq!(tree.captures.number_of("year"), Some(1));
    }

    #[test]
    fn test_forward_reference_resolves() {
        // \1 appears before the group that defines it
        let tree = parse("\\1(a)", 0, RegexOptions::empty());
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_forward_definition_changes_shape() {
        let groups = "()".repeat(10);
        let tree = parse(&format!("\\10{groups}"), 0, RegexOptions::empty());
        assert!(tree.dump().contains("Backreference"));

        let tree = parse("\\10", 0, RegexOptions::empty());
        assert!(tree.dump().contains("Octal"));
    }

    #[test]
    fn test_custom_categories() {
        struct OnlyGreek;
        impl CategoryLookup for OnlyGreek {
            fn is_known(&self, name: &str) -> bool {
                name == "IsGreek"
            }
        }

        let config = ParseConfig {
            categories: &OnlyGreek,
            ..ParseConfig::default()
        };
        assert!(parse_with("\\p{IsGreek}", &config).diagnostics().is_empty());
        assert_eq!(
            parse_with("\\p{Lu}", &config).diagnostics()[0].kind,
            DiagnosticKind::UnknownProperty("Lu".to_string())
        );
    }

    #[test]
    fn test_base_offset() {
        let tree = parse("a)", 10, RegexOptions::empty());
        assert_eq!(tree.diagnostics()[0].span, Span::new(11, 12));
    }
}
