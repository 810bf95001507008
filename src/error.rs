//! # Error and Result for this crate
//!
//! This crate defines a common [Error] structure that every stage of the analysis reports with.
//!
//! Errors fall into two channels. Fatal errors ([`ErrorType::Syntax`], [`ErrorType::Structural`],
//! [`ErrorType::Reference`] and [`ErrorType::Assertion`]) abort a run as soon as they occur.
//! Recoverable findings ([`ErrorType::AliasConflict`] and [`ErrorType::Policy`]) are collected
//! across all documents and surface together as a single [`ErrorType::Validation`] error, whose
//! individual findings are available via [`Error::errors`].

use logos::Span;
use std::{error, fmt, result};

/// This crate's result type using the [Error] structure.
pub type Result<T> = result::Result<T, Error>;

/// This crate's error structure which internal errors are converted into.
///
/// The error is split into a general message and a context string. For parsing, for instance, the
/// context string is populated with a snippet of the source text, while for validation the context
/// is populated with a list of errors.
#[derive(PartialEq, Eq, Clone)]
pub struct Error {
    pub(crate) message: String,
    pub(crate) location: Option<Location>,
    pub(crate) context: Option<String>,
    pub(crate) error_type: ErrorType,
    pub(crate) errors: Vec<Error>,
}

/// The kind of an [Error], which also decides whether it aborts a run or is collected.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorType {
    /// Source text could not be parsed.
    Syntax,
    /// A document or schema is unusable for the analysis, e.g. a mutation's root field uses an
    /// identity key as its response key, or a root type is missing.
    Structural,
    /// A fragment spread names a fragment that does not exist.
    Reference,
    /// A field is aliased to an identity key.
    AliasConflict,
    /// A list directive is misused: duplicate or missing connection names, element types
    /// without identity fields, or a missing parentID.
    Policy,
    /// An internal invariant was violated by an earlier stage.
    Assertion,
    /// A batch of collected [`ErrorType::AliasConflict`] and [`ErrorType::Policy`] errors.
    Validation,
}

impl ErrorType {
    /// Returns whether errors of this type are collected rather than aborting a run.
    #[inline]
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorType::AliasConflict | ErrorType::Policy)
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorType::Syntax => "Syntax Error",
            ErrorType::Structural => "Structural Error",
            ErrorType::Reference => "Reference Error",
            ErrorType::AliasConflict => "Alias Conflict Error",
            ErrorType::Policy => "Policy Error",
            ErrorType::Assertion => "Assertion Error",
            ErrorType::Validation => "Validation Error",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a new Error with only a main message from an input string.
    pub fn new<S: Into<String>>(message: S, error_type: ErrorType) -> Self {
        Self {
            message: message.into(),
            location: None,
            context: None,
            error_type,
            errors: Vec::new(),
        }
    }

    /// Create a new Error with a main message and a context string from two input strings.
    pub fn new_with_context<S: Into<String>>(
        message: S,
        location: Option<Location>,
        context: S,
        error_type: ErrorType,
    ) -> Self {
        Self {
            message: message.into(),
            location,
            context: Some(context.into()),
            error_type,
            errors: Vec::new(),
        }
    }

    /// Combine collected errors into a single [`ErrorType::Validation`] error.
    ///
    /// The context lists every collected message, one per line, in the order they were found.
    pub fn batch(errors: Vec<Error>) -> Self {
        let mut context = String::new();
        for (index, error) in errors.iter().enumerate() {
            if index > 0 {
                context.push('\n');
            }
            context.push_str("- ");
            context.push_str(&error.print(false));
        }
        let message = match errors.len() {
            1 => String::from("1 error found during validation"),
            count => format!("{count} errors found during validation"),
        };
        Self {
            message,
            location: None,
            context: Some(context),
            error_type: ErrorType::Validation,
            errors,
        }
    }

    /// Returns the message of the current error. The context is discarded.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Returns the location of the current error.
    pub fn location(&self) -> &Option<Location> {
        &self.location
    }

    /// Returns the kind of the current error.
    #[inline]
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns the individual errors of a [`ErrorType::Validation`] batch.
    ///
    /// Any other error returns an empty slice.
    #[inline]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Formats this error, with the option to include the context information as well,
    /// which will cause the string to be multi-line.
    pub fn print(&self, include_ctx: bool) -> String {
        let formatted = format!("{}: {}", self.error_type, self.message);
        match self.context {
            Some(ref context) if include_ctx => format!("{}\n{}", formatted, context),
            _ => formatted,
        }
    }
}

pub(crate) fn print_span(source: &str, span: Span) -> String {
    let mut out = String::new();
    // Show the line of the span and the one preceding it
    let span_line = source[..span.start].matches('\n').count();
    let first_line = span_line.saturating_sub(1);

    let start = source[..span.start]
        .rfind('\n')
        .and_then(|start| source[..start].rfind('\n'))
        .map_or(0, |idx| idx + 1);

    let end = source[span.end..]
        .find('\n')
        .map_or(source.len(), |idx| idx + span.end);

    let snippet = &source[start..end];
    let line_num_pad = (first_line + snippet.lines().count()).to_string().len();
    for (index, line) in snippet.lines().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let line_num = (first_line + index + 1).to_string();
        out.push_str(&" ".repeat(line_num_pad - line_num.len() + 1));
        out.push_str(&line_num);
        out.push_str(" | ");
        out.push_str(line);
    }
    if !source[span.start..span.end].contains('\n') {
        let line_start = source[..span.start].rfind('\n').map_or(0, |idx| idx + 1);
        out.push('\n');
        out.push_str(&" ".repeat(line_num_pad + 1));
        out.push_str(" | ");
        out.push_str(&" ".repeat(span.start - line_start));
        out.push_str(&"^".repeat((span.end - span.start).max(1)));
    };

    out
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

pub(crate) fn get_location(source: &str, span: Span) -> Location {
    let before = &source[..span.start];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(span.start, |idx| span.start - idx - 1);
    Location { line, column }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.print(true))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}\n", self)
    }
}

impl error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_lists_every_error() {
        let error = Error::batch(vec![
            Error::new("first", ErrorType::Policy),
            Error::new("second", ErrorType::AliasConflict),
        ]);
        assert_eq!(error.error_type(), ErrorType::Validation);
        assert_eq!(error.message(), "2 errors found during validation");
        assert_eq!(error.errors().len(), 2);
        assert_eq!(
            error.print(true),
            "Validation Error: 2 errors found during validation\n- Policy Error: first\n- Alias Conflict Error: second"
        );
    }

    #[test]
    fn recoverable_types() {
        assert!(ErrorType::Policy.is_recoverable());
        assert!(ErrorType::AliasConflict.is_recoverable());
        assert!(!ErrorType::Structural.is_recoverable());
        assert!(!ErrorType::Assertion.is_recoverable());
    }

    #[test]
    fn locations() {
        let source = "query {\n  user {\n    $\n  }\n}";
        let start = source.find('$').unwrap();
        let location = get_location(source, start..start + 1);
        assert_eq!(location, Location { line: 3, column: 4 });
    }
}
