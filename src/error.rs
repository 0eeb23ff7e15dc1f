//! Parse-time and render-time error types.

use std::io;
use thiserror::Error;

/// Failure cause produced by a collaborator (lambda or partial resolver).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors detected while parsing a template into tokens.
///
/// Parsing never partially succeeds: the first error aborts the parse.
/// Offsets are byte offsets into the template source.
#[derive(Debug, Error)]
pub enum ParseError {
    /// An open delimiter with no matching close before end of input.
    #[error("unterminated tag at byte {offset}")]
    UnterminatedTag { offset: usize },

    /// A section close tag whose name differs from the open tag on top of
    /// the section stack.
    #[error("section close '{found}' at byte {offset} does not match open section '{expected}'")]
    MismatchedSection {
        expected: String,
        found: String,
        offset: usize,
    },

    /// A section close tag with no section open.
    #[error("unexpected section close '{name}' at byte {offset}")]
    UnexpectedClose { name: String, offset: usize },

    /// End of input reached with a section still open.
    #[error("unclosed section '{name}'")]
    UnclosedSection { name: String },

    /// A `=open close=` delimiter directive that does not contain exactly
    /// two non-empty, whitespace-separated parts.
    #[error("malformed delimiter directive at byte {offset}")]
    BadDelimiters { offset: usize },

    /// A tag whose body is empty or reduces to a bare sigil.
    #[error("empty tag at byte {offset}")]
    EmptyTag { offset: usize },
}

/// Errors detected while rendering tokens against a view.
///
/// A plain "name not found" for a variable or section is *not* an error;
/// missing data degrades to empty output or a skipped section.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Partial inclusion recursed past the depth limit, which in practice
    /// means a partial transitively includes itself.
    #[error("partial '{name}' exceeded the inclusion depth limit (cycle?)")]
    PartialCycle { name: String },

    /// A partial name resolved neither as a variable nor via the resolver.
    #[error("partial '{0}' not found")]
    PartialNotFound(String),

    /// The source text of a rendered partial failed to parse.
    #[error("partial '{name}' failed to parse")]
    PartialParse {
        name: String,
        #[source]
        source: ParseError,
    },

    /// The partial resolver itself failed (I/O and the like).
    #[error("partial '{name}' could not be resolved")]
    PartialResolve {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A lambda bound to `name` returned an error when invoked.
    #[error("lambda '{name}' failed")]
    Lambda {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The output sink refused a write.
    #[error("write to output sink failed")]
    Io(#[from] io::Error),
}

/// Union error for the parse-and-render convenience entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
