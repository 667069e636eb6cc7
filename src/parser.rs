//! Parser for Daiquiri
//!
//! Parses token streams into an [`Expression`]. Every alternative starts
//! with a distinct token, so any input has at most one parse.

use chumsky::prelude::*;

use crate::ast::*;
use crate::lexer::Token;

/// Create a parser for a complete query
pub fn parser() -> impl Parser<Token, Expression, Error = Simple<Token>> + Clone {
    expression().then_ignore(end())
}

// ============================================================================
// Helpers
// ============================================================================

fn ident() -> impl Parser<Token, String, Error = Simple<Token>> + Clone {
    select! { Token::Ident(s) => s }
}

fn keyword(word: &str) -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    just(Token::Ident(word.to_string()))
}

/// A number token usable as key segments. The lexer reads `0.1` in
/// `items.0.1` and `1e5` in `items.1e5` as numbers; unsigned ones made of
/// alphanumerics and dots are still valid paths.
fn is_key_path(raw: &str) -> bool {
    raw.starts_with(|c: char| c.is_ascii_digit())
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Parse a dotted attribute path: `a`, `a.b.c`, `items.0.name`, `items.01.0abc`
fn key() -> impl Parser<Token, String, Error = Simple<Token>> + Clone {
    let segment = filter_map(|span, tok: Token| match tok {
        Token::Ident(s) => Ok(s),
        Token::Segment(s) => Ok(s),
        Token::Number(s) if is_key_path(&s) => Ok(s),
        other => Err(Simple::expected_input_found(span, Vec::new(), Some(other))),
    });

    segment
        .separated_by(just(Token::Dot))
        .at_least(1)
        .map(|segments: Vec<String>| segments.join("."))
        .labelled("attribute key")
}

// ============================================================================
// Values and predicates
// ============================================================================

fn comparator() -> impl Parser<Token, Comparator, Error = Simple<Token>> + Clone {
    choice((
        just(Token::Eq).to(Comparator::Eq),
        just(Token::Neq).to(Comparator::Neq),
        just(Token::Lt).to(Comparator::Lt),
        just(Token::Lte).to(Comparator::Lte),
        just(Token::Gt).to(Comparator::Gt),
        just(Token::Gte).to(Comparator::Gte),
    ))
}

fn value() -> impl Parser<Token, Value, Error = Simple<Token>> + Clone {
    let number = select! { Token::Number(raw) => raw }.try_map(|raw: String, span| {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Number(n)),
            _ => Err(Simple::custom(
                span,
                format!("number literal '{}' is out of range", raw),
            )),
        }
    });

    let string = select! { Token::Str(s) => Value::String(s) };

    choice((
        number,
        string,
        keyword("true").to(Value::Bool(true)),
        keyword("false").to(Value::Bool(false)),
        keyword("null").to(Value::Null),
    ))
    .labelled("value")
}

fn predicate() -> impl Parser<Token, Predicate, Error = Simple<Token>> + Clone {
    key()
        .then(comparator())
        .then(value())
        .map(|((key, op), value)| Predicate { key, op, value })
}

// ============================================================================
// Definitions
// ============================================================================

/// `entity: Name`, `set: Name`, `component: Name` or `component: Name(preds)`
fn keypair() -> impl Parser<Token, Definition, Error = Simple<Token>> + Clone {
    let entity = keyword("entity")
        .ignore_then(just(Token::Colon))
        .ignore_then(ident())
        .map(Definition::Entity);

    let set = keyword("set")
        .ignore_then(just(Token::Colon))
        .ignore_then(ident())
        .map(Definition::Set);

    let predicates = predicate()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let component = keyword("component")
        .ignore_then(just(Token::Colon))
        .ignore_then(ident())
        .then(predicates.or_not())
        .map(|(name, predicates)| Definition::Component {
            name,
            predicates: predicates.unwrap_or_default(),
        });

    choice((entity, component, set))
}

/// `{keypair, keypair, ...}` - the comma means `&`
fn braced_definition() -> impl Parser<Token, Operand, Error = Simple<Token>> + Clone {
    keypair()
        .then(just(Token::Comma).ignore_then(keypair()).repeated())
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .map(|(first, rest): (Definition, Vec<Definition>)| {
            let first = Operand::Definition(first);
            if rest.is_empty() {
                return first;
            }
            let rest = rest
                .into_iter()
                .map(|d| (Operator::And, Operand::Definition(d)))
                .collect();
            Operand::Group(Box::new(Expression { first, rest }))
        })
}

// ============================================================================
// Expressions
// ============================================================================

fn expression() -> impl Parser<Token, Expression, Error = Simple<Token>> + Clone {
    recursive(|expression| {
        let group = expression
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|inner: Expression| Operand::Group(Box::new(inner)));

        let operand = choice((
            group,
            braced_definition(),
            keypair().map(Operand::Definition),
        ));

        let operator = choice((
            just(Token::And).to(Operator::And),
            just(Token::Or).to(Operator::Or),
        ));

        operand
            .clone()
            .then(operator.then(operand).repeated())
            .map(|(first, rest)| Expression { first, rest })
    })
}

// Unit tests live in tests/unit_parsing.rs
