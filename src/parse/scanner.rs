//! Delimiter-aware tag scanner.
//!
//! Splits template source into text runs and raw tag spans covering the
//! whole input with no gaps. Delimiter matching is literal leftmost-first
//! substring search; the active pair can be swapped between pieces (the
//! tree builder does so on a delimiter directive).

use crate::error::ParseError;

/// A scanned piece of the source.
#[derive(Debug, PartialEq)]
pub(crate) enum Piece<'a> {
    /// Literal text between tags.
    Text(&'a str),
    /// Raw inter-delimiter content with its source span.
    Tag {
        content: &'a str,
        /// Interior-brace form (`{{{name}}}`): always an unescaped variable.
        triple: bool,
        /// Byte offset of the open delimiter.
        start: usize,
        /// Byte offset just past the close delimiter.
        end: usize,
    },
}

pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    open: String,
    close: String,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(src: &'a str, open: &str, close: &str) -> Self {
        Self {
            src,
            pos: 0,
            open: open.to_owned(),
            close: close.to_owned(),
        }
    }

    /// Swap the active delimiter pair; affects all subsequent pieces.
    pub(crate) fn set_delimiters(&mut self, open: String, close: String) {
        self.open = open;
        self.close = close;
    }

    /// Produce the next piece, or `None` at end of input.
    pub(crate) fn next_piece(&mut self) -> Result<Option<Piece<'a>>, ParseError> {
        if self.pos >= self.src.len() {
            return Ok(None);
        }
        let rest = &self.src[self.pos..];

        match rest.find(&self.open) {
            None => {
                self.pos = self.src.len();
                Ok(Some(Piece::Text(rest)))
            }
            Some(0) => self.scan_tag().map(Some),
            Some(k) => {
                let text = &rest[..k];
                self.pos += k;
                Ok(Some(Piece::Text(text)))
            }
        }
    }

    /// Scan one tag starting exactly at `self.pos`.
    fn scan_tag(&mut self) -> Result<Piece<'a>, ParseError> {
        let start = self.pos;
        let body_at = start + self.open.len();
        let after_open = &self.src[body_at..];

        // Triple form: open delimiter immediately followed by `{`, with a
        // matching `}` immediately before the close delimiter.
        if after_open.starts_with('{') {
            let closer = format!("}}{}", self.close);
            let Some(k) = after_open.find(&closer) else {
                return Err(ParseError::UnterminatedTag { offset: start });
            };
            let end = body_at + k + closer.len();
            self.pos = end;
            return Ok(Piece::Tag {
                content: &after_open[1..k],
                triple: true,
                start,
                end,
            });
        }

        let Some(k) = after_open.find(&self.close) else {
            return Err(ParseError::UnterminatedTag { offset: start });
        };
        let end = body_at + k + self.close.len();
        self.pos = end;
        Ok(Piece::Tag {
            content: &after_open[..k],
            triple: false,
            start,
            end,
        })
    }
}
