//! Tree builder: scanned pieces in, token tree out.
//!
//! Section nesting is tracked with an explicit stack of open-section
//! builders local to one call, so independent templates parse
//! concurrently without shared state.

use super::scanner::{Piece, Scanner};
use super::tag::{NameRef, SectionKind, TagBody, classify};
use crate::error::ParseError;

/// One node of the parsed template.
#[derive(Clone, Debug)]
pub(crate) enum Token {
    Text(String),
    Variable {
        name: NameRef,
        escape: bool,
        outermost: bool,
    },
    Section {
        name: NameRef,
        kind: SectionKind,
        body: Vec<Token>,
        /// Verbatim source text of the body, handed to `#`-lambdas.
        raw: String,
    },
    Partial {
        name: String,
        keyword: bool,
        rendered: bool,
    },
}

/// A section whose close tag has not been seen yet.
struct OpenSection {
    name: NameRef,
    kind: SectionKind,
    body: Vec<Token>,
    /// Byte offset just past the open tag; start of the raw body text.
    body_start: usize,
}

/// Parse `src` into a token tree using the given starting delimiters.
pub(crate) fn build(src: &str, open: &str, close: &str) -> Result<Vec<Token>, ParseError> {
    let mut scanner = Scanner::new(src, open, close);
    let mut top: Vec<Token> = Vec::new();
    let mut stack: Vec<OpenSection> = Vec::new();

    while let Some(piece) = scanner.next_piece()? {
        match piece {
            Piece::Text(text) => push_text(target(&mut stack, &mut top), text),

            Piece::Tag { content, triple, start, end } => {
                match classify(content, triple, start)? {
                    TagBody::Comment => {}

                    TagBody::Delimiters { open, close } => {
                        scanner.set_delimiters(open, close);
                    }

                    TagBody::Variable { name, escape, outermost } => {
                        target(&mut stack, &mut top).push(Token::Variable {
                            name,
                            escape,
                            outermost,
                        });
                    }

                    TagBody::Partial { name, keyword, rendered } => {
                        target(&mut stack, &mut top).push(Token::Partial {
                            name,
                            keyword,
                            rendered,
                        });
                    }

                    TagBody::SectionOpen { name, kind } => {
                        stack.push(OpenSection {
                            name,
                            kind,
                            body: Vec::new(),
                            body_start: end,
                        });
                    }

                    TagBody::SectionClose { name } => {
                        let Some(section) = stack.pop() else {
                            return Err(ParseError::UnexpectedClose {
                                name: name.to_string(),
                                offset: start,
                            });
                        };
                        if section.name != name {
                            return Err(ParseError::MismatchedSection {
                                expected: section.name.to_string(),
                                found: name.to_string(),
                                offset: start,
                            });
                        }
                        let token = Token::Section {
                            name: section.name,
                            kind: section.kind,
                            body: section.body,
                            raw: src[section.body_start..start].to_owned(),
                        };
                        target(&mut stack, &mut top).push(token);
                    }
                }
            }
        }
    }

    if let Some(section) = stack.pop() {
        return Err(ParseError::UnclosedSection {
            name: section.name.to_string(),
        });
    }
    Ok(top)
}

/// The token list currently being filled: the innermost open section's
/// body, or the top level.
fn target<'t>(stack: &'t mut Vec<OpenSection>, top: &'t mut Vec<Token>) -> &'t mut Vec<Token> {
    match stack.last_mut() {
        Some(section) => &mut section.body,
        None => top,
    }
}

/// Append text, merging into a preceding text token.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    match tokens.last_mut() {
        Some(Token::Text(prev)) => prev.push_str(text),
        _ => tokens.push(Token::Text(text.to_owned())),
    }
}
