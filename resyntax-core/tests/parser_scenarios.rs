//! Scenario test suite
//!
//! Parses representative patterns, well formed and broken, and compares the
//! tree dump or the reported diagnostics against the expected result.

use resyntax_core::{DiagnosticKind, RegexOptions, Span, parse};

fn dump(pattern: &str) -> String {
    parse(pattern, 0, RegexOptions::empty()).dump()
}

fn diagnostics(pattern: &str, options: RegexOptions) -> Vec<(Span, DiagnosticKind)> {
    parse(pattern, 0, options)
        .diagnostics()
        .iter()
        .map(|d| (d.span, d.kind.clone()))
        .collect()
}

mod basic_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_pattern() {
        let expected = r#"CompilationUnit
  Sequence
  EndOfFile
Captures
  0 [0..0)
"#;
        assert_eq!(dump(""), expected);
    }

    #[test]
    fn test_lazy_quantifier() {
        let expected = r#"CompilationUnit
  Sequence
    LazyQuantifier
      ZeroOrMoreQuantifier
        Text
          TextToken "a"
        AsteriskToken "*"
      QuestionToken "?"
  EndOfFile
Captures
  0 [0..3)
"#;
        assert_eq!(dump("a*?"), expected);
    }

    #[test]
    fn test_balancing_group() {
        let expected = r#"CompilationUnit
  Sequence
    CaptureGrouping
      OpenParenToken "("
      QuestionToken "?"
      LessThanToken "<"
      CaptureNameToken "a"
      GreaterThanToken ">"
      Sequence
      CloseParenToken ")"
    BalancingGrouping
      OpenParenToken "("
      QuestionToken "?"
      LessThanToken "<"
      CaptureNameToken <missing>
      MinusToken "-"
      CaptureNameToken "a"
      GreaterThanToken ">"
      Sequence
      CloseParenToken ")"
  EndOfFile
Captures
  0 [0..13)
  1 [0..6)
  a [0..6)
"#;
        assert_eq!(dump("(?<a>)(?<-a>)"), expected);
    }

    #[test]
    fn test_reversed_quantifier_bounds() {
        let expected = r#"CompilationUnit
  Sequence
    ClosedRangeNumericQuantifier
      Text
        TextToken "a"
      OpenBraceToken "{"
      NumberToken "1" value=1
      CommaToken ","
      NumberToken "0" value=0
      CloseBraceToken "}"
  EndOfFile
Diagnostics
  [4..5) Illegal {x,y} with x > y
Captures
  0 [0..6)
"#;
        assert_eq!(dump("a{1,0}"), expected);
    }

    #[test]
    fn test_class_escape_in_range() {
        let expected = r#"CompilationUnit
  Sequence
    CharacterClass
      OpenBracketToken "["
      Sequence
        CharacterClassRange
          Text
            TextToken "a"
          MinusToken "-"
          CharacterClassEscape
            BackslashToken "\\"
            TextToken "w"
      CloseBracketToken "]"
  EndOfFile
Diagnostics
  [3..5) Cannot include class \w in character range
Captures
  0 [0..6)
"#;
        assert_eq!(dump("[a-\\w]"), expected);
    }

    #[test]
    fn test_undefined_backreference() {
        let expected = r#"CompilationUnit
  Sequence
    SimpleGrouping
      OpenParenToken "("
      Sequence
      CloseParenToken ")"
    BackreferenceEscape
      BackslashToken "\\"
      NumberToken "2" value=2
  EndOfFile
Diagnostics
  [3..4) Reference to undefined group number 2
Captures
  0 [0..4)
  1 [0..2)
"#;
        assert_eq!(dump("()\\2"), expected);
    }
}

mod error_recovery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unterminated_class_range() {
        let expected = r#"CompilationUnit
  Sequence
    CharacterClass
      OpenBracketToken "["
      Sequence
        CharacterClassRange
          Text
            TextToken "a"
          MinusToken "-"
          Text
            TextToken <missing>
      CloseBracketToken <missing>
  EndOfFile
Diagnostics
  [3..3) Unterminated [] set
Captures
  0 [0..3)
"#;
        assert_eq!(dump("[a-"), expected);
    }

    #[test]
    fn test_unclosed_groups_report_once() {
        let tree = parse("((", 0, RegexOptions::empty());
        assert_eq!(
            diagnostics("((", RegexOptions::empty()),
            vec![(Span::empty(2), DiagnosticKind::NotEnoughCloseParens)]
        );
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(0, 2)));
        assert_eq!(tree.captures.get_number(2).map(|e| e.span), Some(Span::new(1, 2)));
    }

    #[test]
    fn test_capture_name_starting_with_digit() {
        let tree = parse("(?<1bar>)", 0, RegexOptions::empty());
        assert_eq!(
            diagnostics("(?<1bar>)", RegexOptions::empty()),
            vec![(Span::new(4, 5), DiagnosticKind::InvalidGroupName)]
        );
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(0, 9)));
        assert_eq!(tree.reconstruct(), "(?<1bar>)");
    }

    #[test]
    fn test_incomplete_category() {
        let tree = parse("\\P{cat", 0, RegexOptions::empty());
        assert_eq!(
            diagnostics("\\P{cat", RegexOptions::empty()),
            vec![(Span::new(0, 2), DiagnosticKind::IncompleteCategoryEscape)]
        );
        assert!(tree.dump().contains("TextToken \"{cat\""));
    }

    #[test]
    fn test_unknown_category() {
        assert_eq!(
            diagnostics("\\p{Nope}", RegexOptions::empty()),
            vec![(
                Span::new(3, 7),
                DiagnosticKind::UnknownProperty("Nope".to_string())
            )]
        );
    }

    #[test]
    fn test_number_overflow() {
        let tree = parse("a{2147483648}", 0, RegexOptions::empty());
        assert_eq!(
            diagnostics("a{2147483648}", RegexOptions::empty()),
            vec![(Span::new(2, 12), DiagnosticKind::CaptureNumberOverflow)]
        );
        assert!(tree.dump().contains("value=-2147483648"));
    }

    #[test]
    fn test_octal_fallback() {
        assert_eq!(
            diagnostics("\\89", RegexOptions::empty()),
            vec![(Span::new(1, 2), DiagnosticKind::UnrecognizedEscape('8'))]
        );
        assert!(dump("\\12").contains("OctalEscape"));
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            diagnostics("a(?#x", RegexOptions::empty()),
            vec![(Span::new(1, 5), DiagnosticKind::UnterminatedComment)]
        );
    }

    #[test]
    fn test_diagnostics_in_tree_order() {
        let kinds: Vec<_> = diagnostics("\\2)[z-a]", RegexOptions::empty())
            .into_iter()
            .map(|(_, kind)| kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::TooManyCloseParens,
                DiagnosticKind::ReversedCharacterRange,
                DiagnosticKind::UndefinedGroupNumber(2),
            ]
        );
    }
}

mod options {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_free_spacing_trivia() {
        let expected = r##"CompilationUnit
  Sequence
    Text
      TextToken "a"
    Text
      WhitespaceTrivia " "
      TextToken "b"
  WhitespaceTrivia " "
  CommentTrivia "# c"
  WhitespaceTrivia "\n"
  EndOfFile
Captures
  0 [0..8)
"##;
        let tree = parse("a b # c\n", 0, RegexOptions::FREE_SPACING);
        assert_eq!(tree.dump(), expected);
    }

    #[test]
    fn test_inline_free_spacing_is_scoped() {
        // the space inside the group is trivia, the one after it is text
        let tree = parse("((?x)a b) c", 0, RegexOptions::empty());
        assert!(tree.dump().contains("WhitespaceTrivia \" \""));
        assert!(tree.dump().contains("TextToken \" c\""));
    }

    #[test]
    fn test_explicit_capture() {
        let tree = parse("(a)(?<n>b)", 0, RegexOptions::EXPLICIT_CAPTURE);
        assert_eq!(tree.captures.len(), 3);
        assert_eq!(tree.captures.number_of("n"), Some(1));
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(3, 10)));

        let tree = parse("(a)(?n)(b)|(c)", 0, RegexOptions::empty());
        assert!(tree.captures.contains_number(1));
        assert!(!tree.captures.contains_number(2));
    }

    #[test]
    fn test_explicit_capture_turned_off_inline() {
        let tree = parse("(a)(?-n:(b))(c)", 0, RegexOptions::EXPLICIT_CAPTURE);
        assert!(tree.diagnostics().is_empty());
        assert_eq!(tree.captures.len(), 2);
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(8, 11)));
        assert!(!tree.captures.contains_number(2));
    }

    #[test]
    fn test_ecma_backreferences() {
        let ecma = RegexOptions::ECMA_SCRIPT;
        assert!(parse("(a)\\1", 0, ecma).dump().contains("BackreferenceEscape"));
        assert!(parse("\\1(a)", 0, ecma).dump().contains("OctalEscape"));

        let tree = parse("(a)\\11", 0, ecma);
        assert!(tree.diagnostics().is_empty());
        assert!(tree.dump().contains("NumberToken \"1\" value=1"));
        assert!(tree.dump().contains("TextToken \"1\""));
    }

    #[test]
    fn test_base_offset_shifts_everything() {
        let tree = parse("(a)\\2", 5, RegexOptions::empty());
        assert_eq!(tree.diagnostics()[0].span, Span::new(9, 10));
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(5, 8)));
        assert_eq!(tree.captures.get_number(0).map(|e| e.span), Some(Span::new(5, 10)));
    }
}

mod captures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbering() {
        let tree = parse("(?<x>a)(b)(?<5>c)(d)(?<y>e)", 0, RegexOptions::empty());
        let numbers: Vec<i32> = tree.captures.entries().iter().map(|(_, e)| e.number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3, 4, 5, 3, 4]);
        assert_eq!(tree.captures.number_of("x"), Some(3));
        assert_eq!(tree.captures.number_of("y"), Some(4));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let tree = parse("(?<a>x)(?<a>yy)", 0, RegexOptions::empty());
        assert_eq!(tree.captures.get_name("a").map(|e| e.span), Some(Span::new(0, 7)));
        assert_eq!(tree.captures.get_number(1).map(|e| e.span), Some(Span::new(0, 7)));
        assert_eq!(tree.captures.len(), 3);
    }

    #[test]
    fn test_named_group_shares_span_with_its_number() {
        let tree = parse("(a)(?<x>bc)(d)", 0, RegexOptions::empty());
        let by_name = tree.captures.get_name("x");
        assert_eq!(by_name.map(|e| e.span), Some(Span::new(3, 11)));
        assert_eq!(tree.captures.get_number(3), by_name);
    }

    #[test]
    fn test_numeric_reference_to_named_group() {
        assert!(diagnostics("(?<a>x)\\1", RegexOptions::empty()).is_empty());
        assert!(diagnostics("(?<a>x)(?(1)y)", RegexOptions::empty()).is_empty());
        assert!(diagnostics("(?<cat>a)(?<dog-1>b)", RegexOptions::empty()).is_empty());
        assert!(diagnostics("(?'n'x)\\k<1>", RegexOptions::empty()).is_empty());
        assert!(dump("(?<a>x)(?(1)y)").contains("ConditionalCaptureGrouping"));
    }

    #[test]
    fn test_ten_named_groups_make_two_digit_backreference() {
        let groups: String = (0..10).map(|i| format!("(?<g{i}>x)")).collect();
        let tree = parse(&format!("{groups}\\10"), 0, RegexOptions::empty());
        assert!(tree.diagnostics().is_empty());
        assert!(tree.dump().contains("BackreferenceEscape"));
        assert!(tree.dump().contains("NumberToken \"10\" value=10"));
    }

    #[test]
    fn test_named_references() {
        assert!(diagnostics("\\k<a>(?<a>x)", RegexOptions::empty()).is_empty());
        assert_eq!(
            diagnostics("\\k<a>", RegexOptions::empty()),
            vec![(Span::new(3, 4), DiagnosticKind::UndefinedGroupName("a".to_string()))]
        );
        assert_eq!(
            diagnostics("(?<a-b>x)", RegexOptions::empty()),
            vec![(Span::new(5, 6), DiagnosticKind::UndefinedGroupName("b".to_string()))]
        );
    }

    #[test]
    fn test_conditional_by_name() {
        assert!(dump("(?<n>a)(?(n)b|c)").contains("ConditionalCaptureGrouping"));
        assert!(dump("(?(n)b|c)(?<n>a)").contains("ConditionalCaptureGrouping"));

        // an unknown name is an expression; its group defines nothing
        let tree = parse("(?(n)b|c)", 0, RegexOptions::empty());
        assert!(tree.dump().contains("ConditionalExpressionGrouping"));
        assert_eq!(tree.captures.len(), 1);
    }

    #[test]
    fn test_capture_zero_is_not_defined() {
        let tree = parse("(?<0>a)", 0, RegexOptions::empty());
        assert_eq!(tree.captures.len(), 1);
        assert_eq!(tree.captures.get_number(0).map(|e| e.span), Some(Span::new(0, 7)));
    }
}
