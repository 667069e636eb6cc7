//! Unit tests for lexer and parser

use chumsky::Parser;
use daiquiri::lexer::{lexer, Token};
use daiquiri::{parse, Comparator, Definition, Expression, Operand, Operator, Predicate, Value};

fn tokens(input: &str) -> Vec<Token> {
    lexer()
        .parse(input)
        .unwrap()
        .into_iter()
        .map(|(t, _)| t)
        .collect()
}

fn ident(s: &str) -> Token {
    Token::Ident(s.to_string())
}

// ============================================================================
// Lexer tests
// ============================================================================

#[test]
fn test_lex_simple() {
    assert_eq!(
        tokens("{entity: Foo} | {set: bar}"),
        vec![
            Token::LBrace,
            ident("entity"),
            Token::Colon,
            ident("Foo"),
            Token::RBrace,
            Token::Or,
            Token::LBrace,
            ident("set"),
            Token::Colon,
            ident("bar"),
            Token::RBrace,
        ]
    );
}

#[test]
fn test_lex_comparators() {
    assert_eq!(
        tokens("= != < <= > >= &"),
        vec![
            Token::Eq,
            Token::Neq,
            Token::Lt,
            Token::Lte,
            Token::Gt,
            Token::Gte,
            Token::And,
        ]
    );
    // No whitespace needed between tokens
    assert_eq!(
        tokens("a<=1"),
        vec![ident("a"), Token::Lte, Token::Number("1".to_string())]
    );
}

#[test]
fn test_lex_numbers() {
    assert_eq!(
        tokens("0 -12 3.25 1e9 -2.5E-3"),
        vec![
            Token::Number("0".to_string()),
            Token::Number("-12".to_string()),
            Token::Number("3.25".to_string()),
            Token::Number("1e9".to_string()),
            Token::Number("-2.5E-3".to_string()),
        ]
    );
}

#[test]
fn test_lex_dotted_key() {
    assert_eq!(
        tokens("items.0.name"),
        vec![
            ident("items"),
            Token::Dot,
            Token::Number("0".to_string()),
            Token::Dot,
            ident("name"),
        ]
    );
}

#[test]
fn test_lex_digit_led_segments() {
    // Not JSON numbers, so they only lex as key segments
    assert_eq!(
        tokens("items.01.0abc"),
        vec![
            ident("items"),
            Token::Dot,
            Token::Segment("01".to_string()),
            Token::Dot,
            Token::Segment("0abc".to_string()),
        ]
    );
    assert_eq!(tokens("007"), vec![Token::Segment("007".to_string())]);
    assert!(lexer().parse("-007").is_err());
}

#[test]
fn test_lex_strings() {
    assert_eq!(
        tokens(r#""double" 'single' "it's" 'say "hi"'"#),
        vec![
            Token::Str("double".to_string()),
            Token::Str("single".to_string()),
            Token::Str("it's".to_string()),
            Token::Str("say \"hi\"".to_string()),
        ]
    );
}

#[test]
fn test_lex_string_escapes() {
    assert_eq!(
        tokens(r#""a\"b\\c\/d\n\t\r\b\f" 'x\'y'"#),
        vec![
            Token::Str("a\"b\\c/d\n\t\r\u{08}\u{0C}".to_string()),
            Token::Str("x'y".to_string()),
        ]
    );
}

#[test]
fn test_lex_unicode_escapes() {
    assert_eq!(tokens(r#""\u00e9""#), vec![Token::Str("é".to_string())]);
    // Surrogate pair combines into one scalar
    assert_eq!(tokens(r#""\ud83d\ude00""#), vec![Token::Str("😀".to_string())]);
    // Raw non-ASCII passes through
    assert_eq!(tokens("'日本'"), vec![Token::Str("日本".to_string())]);
}

#[test]
fn test_lex_errors() {
    assert!(lexer().parse("\"unterminated").is_err());
    assert!(lexer().parse(r#""\ud83d""#).is_err());
    assert!(lexer().parse(r#""\x41""#).is_err());
    assert!(lexer().parse("entity: Foo; ").is_err());
    assert!(lexer().parse("a ! b").is_err());
}

// ============================================================================
// Parser tests
// ============================================================================

#[test]
fn test_parse_braced_definition() {
    let expr = parse("{entity: Foo}").unwrap();
    assert_eq!(expr, Expression::from(Definition::entity("Foo")));
}

#[test]
fn test_parse_bare_keypairs() {
    let bare = parse("entity: Foo | component: Bar & set: baz").unwrap();
    let braced = parse("{entity: Foo} | {component: Bar} & {set: baz}").unwrap();
    assert_eq!(bare, braced);
    assert_eq!(
        bare,
        Expression::from(Definition::entity("Foo"))
            .then(Operator::Or, Definition::component("Bar"))
            .then(Operator::And, Definition::set("baz"))
    );
}

#[test]
fn test_parse_keeps_infix_order() {
    // Precedence is left to the compiler
    let expr = parse("{entity: A} & {entity: B} | {entity: C}").unwrap();
    assert_eq!(
        expr.rest.iter().map(|(op, _)| *op).collect::<Vec<_>>(),
        vec![Operator::And, Operator::Or]
    );
}

#[test]
fn test_parse_braced_list_is_a_conjunction() {
    let expr = parse("{entity: A, component: B}").unwrap();
    let expected_group = Expression::from(Definition::entity("A"))
        .then(Operator::And, Definition::component("B"));
    assert_eq!(expr, Expression::single(Operand::from(expected_group)));
}

#[test]
fn test_parse_parenthesized_groups() {
    let expr = parse("({entity: A} | {entity: B}) & {entity: C}").unwrap();
    match &expr.first {
        Operand::Group(inner) => {
            assert_eq!(inner.rest.len(), 1);
            assert_eq!(inner.rest[0].0, Operator::Or);
        }
        other => panic!("expected group, got {:?}", other),
    }
    assert_eq!(expr.rest.len(), 1);
    assert_eq!(expr.rest[0].0, Operator::And);
}

#[test]
fn test_parse_component_predicates() {
    let expr = parse("{component: C(a.b = \"c\", b.c = 'e', a.b = false)}").unwrap();
    assert_eq!(
        expr,
        Expression::from(Definition::component_with(
            "C",
            vec![
                Predicate::new("a.b", Comparator::Eq, "c"),
                Predicate::new("b.c", Comparator::Eq, "e"),
                Predicate::new("a.b", Comparator::Eq, false),
            ],
        ))
    );
}

#[test]
fn test_parse_all_comparators_and_literals() {
    let expr = parse(
        "component: C(a = null, b != true, c < -1, d <= 2.5, e > 1e3, f >= 'z', items.0.name = 0)",
    )
    .unwrap();
    let Operand::Definition(Definition::Component { name, predicates }) = &expr.first else {
        panic!("expected component, got {:?}", expr.first);
    };
    assert_eq!(name, "C");
    assert_eq!(
        predicates,
        &vec![
            Predicate::new("a", Comparator::Eq, Value::Null),
            Predicate::new("b", Comparator::Neq, true),
            Predicate::new("c", Comparator::Lt, -1),
            Predicate::new("d", Comparator::Lte, 2.5),
            Predicate::new("e", Comparator::Gt, 1000),
            Predicate::new("f", Comparator::Gte, "z"),
            Predicate::new("items.0.name", Comparator::Eq, 0),
        ]
    );
}

#[test]
fn test_parse_digit_led_key_segments() {
    let expr = parse("{component: C(items.01.0abc = 1, 2.x = 2)}").unwrap();
    assert_eq!(
        expr,
        Expression::from(Definition::component_with(
            "C",
            vec![
                Predicate::new("items.01.0abc", Comparator::Eq, 1),
                Predicate::new("2.x", Comparator::Eq, 2),
            ],
        ))
    );
}

#[test]
fn test_parse_keywords_as_names() {
    // Keywords are only special in keyword position
    let expr = parse("{entity: set} & {component: entity(component = 1)}").unwrap();
    assert_eq!(
        expr,
        Expression::from(Definition::entity("set")).then(
            Operator::And,
            Definition::component_with(
                "entity",
                vec![Predicate::new("component", Comparator::Eq, 1)],
            ),
        )
    );
}

#[test]
fn test_parse_whitespace_insensitive() {
    let spaced = parse("  { entity :Foo }\n|\t( component:Bar ( x=1 ) )  ").unwrap();
    let tight = parse("{entity:Foo}|(component:Bar(x=1))").unwrap();
    assert_eq!(spaced, tight);
}

#[test]
fn test_parse_set_references() {
    let expr = parse("{set: a} | ({entity: X} & {set: b})").unwrap();
    assert_eq!(expr.set_references(), vec!["a", "b"]);
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_parse_errors() {
    let bad = [
        "",
        "{entity: Foo",
        "{entity: Foo} |",
        "& {entity: Foo}",
        "{entity: Foo} {entity: Bar}",
        "{thing: Foo}",
        "{entity Foo}",
        "{}",
        "{component: C()}",
        "{component: C(x)}",
        "{component: C(x = )}",
        "{component: C(x = y)}",
        "{entity: Foo,}",
        "({entity: Foo}",
        "{entity: 1}",
        "{component: C(x = 007)}",
        "{component: C(x = -01)}",
        "{component: C(x = 1e)}",
        "{component: C(x = 12abc)}",
    ];
    for source in bad {
        assert!(parse(source).is_err(), "expected parse error for {:?}", source);
    }
}

#[test]
fn test_parse_error_reports_location() {
    let source = "{entity: Foo} & {thing: Bar}";
    let err = parse(source).unwrap_err();
    assert!(!err.issues.is_empty());
    let issue = &err.issues[0];
    // Points into the second operand, not at the start of the query
    assert!(issue.span.start >= source.find('&').unwrap(), "span: {:?}", issue.span);
    assert!(err.report().contains("Parse error"), "report: {}", err.report());
}

#[test]
fn test_parse_error_from_lexer() {
    let err = parse("{entity: Foo} # comment").unwrap_err();
    assert_eq!(err.issues[0].span.start, 14);
    assert!(err.report().contains("Lexical error"));
}
