//! Lexer for Daiquiri
//!
//! Tokenizes query text into a stream for the parser. Whitespace is
//! insignificant and never produces tokens.

use chumsky::prelude::*;
use std::ops::Range;

/// Token types for Daiquiri
///
/// Keywords (`entity`, `component`, `set`, `true`, `false`, `null`) lex as
/// plain identifiers; the parser decides from position whether they act as
/// keywords.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// `[A-Za-z][A-Za-z0-9]*`
    Ident(String),
    /// Raw numeric literal text, e.g. `-1.5e3`
    Number(String),
    /// Digit-led alphanumeric run that is not a number, e.g. `007`;
    /// only meaningful as an attribute key segment
    Segment(String),
    /// Decoded string literal contents
    Str(String),

    // Punctuation
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }
    Colon,  // :
    Comma,  // ,
    Dot,    // .

    // Operators
    And, // &
    Or,  // |
    Eq,  // =
    Neq, // !=
    Lt,  // <
    Lte, // <=
    Gt,  // >
    Gte, // >=
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Number(s) | Token::Segment(s) => write!(f, "{}", s),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::And => write!(f, "&"),
            Token::Or => write!(f, "|"),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Lte => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Gte => write!(f, ">="),
        }
    }
}

/// Type alias for spans
pub type Span = Range<usize>;

/// Create a lexer for Daiquiri
pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let ident = filter(|c: &char| c.is_ascii_alphabetic())
        .chain::<char, Vec<char>, _>(filter(|c: &char| c.is_ascii_alphanumeric()).repeated())
        .collect::<String>()
        .map(Token::Ident);

    // JSON number: no leading zeros, and it must not run into a letter or digit
    let frac = just('.').chain(text::digits(10));
    let exp = just('e')
        .or(just('E'))
        .chain(just('+').or(just('-')).or_not())
        .chain::<char, _, _>(text::digits(10));
    let nonzero = filter(|c: &char| matches!(*c, '1'..='9'))
        .chain::<char, Vec<char>, _>(filter(|c: &char| c.is_ascii_digit()).repeated());
    let integer = just('0').map(|c| vec![c]).or(nonzero);
    let number = just('-')
        .or_not()
        .chain::<char, _, _>(integer)
        .chain::<char, _, _>(frac.or_not().flatten())
        .chain::<char, _, _>(exp.or_not().flatten())
        .then(filter(|c: &char| c.is_ascii_alphanumeric()).or_not().rewind())
        .try_map(|(chars, next): (Vec<char>, Option<char>), span| match next {
            Some(_) => Err(Simple::custom(span, "malformed number literal")),
            None => Ok(Token::Number(chars.into_iter().collect())),
        });

    // Anything else starting with a digit, e.g. the `01` and `0abc` in `items.01.0abc`
    let segment = filter(|c: &char| c.is_ascii_digit())
        .chain::<char, Vec<char>, _>(filter(|c: &char| c.is_ascii_alphanumeric()).repeated())
        .collect::<String>()
        .map(Token::Segment);

    let string = string_literal('"').or(string_literal('\'')).map(Token::Str);

    // Two-character operators must be tried before their one-character prefixes
    let punctuation = choice((
        just("!=").to(Token::Neq),
        just("<=").to(Token::Lte),
        just(">=").to(Token::Gte),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('=').to(Token::Eq),
        just('&').to(Token::And),
        just('|').to(Token::Or),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just(':').to(Token::Colon),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
    ));

    choice((ident, number, segment, string, punctuation))
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

/// A quoted string with JSON escapes, delimited by `quote`.
///
/// Content is accumulated as UTF-16 code units so that `\uXXXX` surrogate
/// pairs combine into one scalar; a lone surrogate is a lexical error.
fn string_literal(quote: char) -> impl Parser<char, String, Error = Simple<char>> {
    let hex_escape = just('u').ignore_then(
        filter(|c: &char| c.is_ascii_hexdigit())
            .repeated()
            .exactly(4)
            .collect::<String>()
            .try_map(|digits, span| {
                u16::from_str_radix(&digits, 16)
                    .map(|unit| vec![unit])
                    .map_err(|_| Simple::custom(span, "invalid unicode escape"))
            }),
    );

    let simple_escape = choice((
        just('"'),
        just('\''),
        just('\\'),
        just('/'),
        just('b').to('\u{08}'),
        just('f').to('\u{0C}'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
    ))
    .map(utf16_units);

    let escape = just('\\').ignore_then(hex_escape.or(simple_escape));

    let plain = filter(move |c: &char| *c != '\\' && *c != quote).map(utf16_units);

    plain
        .or(escape)
        .repeated()
        .flatten()
        .delimited_by(just(quote), just(quote))
        .try_map(|units, span| {
            String::from_utf16(&units)
                .map_err(|_| Simple::custom(span, "invalid surrogate pair in unicode escape"))
        })
}

fn utf16_units(c: char) -> Vec<u16> {
    let mut buf = [0u16; 2];
    c.encode_utf16(&mut buf).to_vec()
}

// Unit tests live in tests/unit_parsing.rs
