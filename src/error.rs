//! Error types for Daiquiri
//!
//! Syntax errors are rendered with ariadne; everything else is a plain
//! typed variant.

use ariadne::{Config, Label, Report, ReportKind, Source};
use chumsky::error::SimpleReason;
use chumsky::prelude::Simple;
use std::ops::Range;
use thiserror::Error;

use crate::lexer::Token;

/// Errors raised while compiling a store or querying it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A named query's text could not be parsed
    #[error("syntax error in query '{name}'")]
    Syntax {
        name: String,
        #[source]
        source: ParseError,
    },

    /// `set: name` refers to a query absent from the configuration
    #[error("undefined set '{name}' referenced by query '{referenced_by}'")]
    UndefinedSetReference { name: String, referenced_by: String },

    /// Named sets reference each other transitively
    #[error("circular set reference in set: {0}")]
    CircularSetReference(String),

    /// A query call names a bucket that was never compiled
    #[error("undefined bucket: {0}")]
    UndefinedBucket(String),

    /// A group was constructed with no children
    #[error("a bucket group must have a nonzero number of sub-buckets")]
    EmptyGroup,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single lexer or parser complaint, located in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Character range in the source
    pub span: Range<usize>,
    pub message: String,
}

/// Unparseable query text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{report}")]
pub struct ParseError {
    pub issues: Vec<ParseIssue>,
    report: String,
}

impl ParseError {
    pub(crate) fn from_lexer(source: &str, errors: Vec<Simple<char>>) -> Self {
        let issues = errors
            .iter()
            .map(|error| ParseIssue {
                span: error.span(),
                message: format_lexer_error(error),
            })
            .collect();
        Self::with_report(source, "Lexical error", issues)
    }

    pub(crate) fn from_parser(source: &str, errors: Vec<Simple<Token>>) -> Self {
        let issues = errors
            .iter()
            .map(|error| ParseIssue {
                span: error.span(),
                message: format_parser_error(error),
            })
            .collect();
        Self::with_report(source, "Parse error", issues)
    }

    /// The rendered, human-readable report
    pub fn report(&self) -> &str {
        &self.report
    }

    fn with_report(source: &str, title: &str, issues: Vec<ParseIssue>) -> Self {
        let report = render_report(source, title, &issues);
        Self { issues, report }
    }
}

fn render_report(source: &str, title: &str, issues: &[ParseIssue]) -> String {
    let mut output = Vec::new();

    for issue in issues {
        let written = Report::build(ReportKind::Error, (), issue.span.start)
            .with_config(Config::default().with_color(false))
            .with_message(title)
            .with_label(Label::new(issue.span.clone()).with_message(&issue.message))
            .finish()
            .write(Source::from(source), &mut output);

        if written.is_err() {
            output.extend_from_slice(format!("{}: {}\n", title, issue.message).as_bytes());
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

/// Format a single lexer error into a readable message
fn format_lexer_error(error: &Simple<char>) -> String {
    if let SimpleReason::Custom(msg) = error.reason() {
        return msg.clone();
    }

    let found = error
        .found()
        .map(|c| format!("'{}'", c))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<String> = error
        .expected()
        .filter_map(|opt| opt.as_ref())
        .map(|c| format!("'{}'", c))
        .collect();

    if expected.is_empty() {
        format!("Unexpected character {}", found)
    } else {
        format!("Unexpected {}, expected {}", found, expected.join(" or "))
    }
}

/// Format a single parser error into a readable message
fn format_parser_error(error: &Simple<Token>) -> String {
    if let SimpleReason::Custom(msg) = error.reason() {
        return msg.clone();
    }

    let found = error
        .found()
        .map(|t| format!("'{}'", t))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<String> = error
        .expected()
        .filter_map(|opt| opt.as_ref())
        .map(|t| format!("'{}'", t))
        .collect();

    if let SimpleReason::Unclosed { delimiter, .. } = error.reason() {
        return format!("Unclosed delimiter '{}', found {}", delimiter, found);
    }

    if !expected.is_empty() {
        format!(
            "Unexpected {}, expected one of: {}",
            found,
            expected.join(", ")
        )
    } else if let Some(label) = error.label() {
        format!("Unexpected {}, expected {}", found, label)
    } else {
        format!("Unexpected token {}", found)
    }
}
