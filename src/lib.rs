//! Daiquiri: incrementally maintained entity/component queries
//!
//! A host registers named boolean queries over records carrying entity type
//! tags, components, and component attribute values:
//!
//! ```text
//! ({entity: Creature} | {set: pets}) & {component: Health(current > 0)}
//! ```
//!
//! Each query is compiled once into a shared graph of buckets. After that
//! the host reports record changes and asks "does record r match query Q?"
//! in O(1); each change costs only the fan-out of the buckets it touches.

pub mod ast;
pub mod bucket;
pub mod compile;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod store;
pub mod value;

pub use ast::*;
pub use bucket::{Bucket, BucketGraph, BucketId, BucketKind, Leaf};
pub use config::QueryConfig;
pub use error::{Error, ParseError, ParseIssue, Result};
pub use lexer::lexer;
pub use parser::parser;
pub use pretty::pretty_print;
pub use store::{DataFilter, DataStore};

/// Parse query text into an expression
pub fn parse(input: &str) -> std::result::Result<Expression, ParseError> {
    use chumsky::prelude::*;

    let tokens = lexer::lexer()
        .parse(input)
        .map_err(|errs| ParseError::from_lexer(input, errs))?;

    let len = input.chars().count();

    parser::parser()
        .parse(chumsky::Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errs| ParseError::from_parser(input, errs))
}
