//! The renderer: depth-first walk of the token tree against a context
//! stack, dispatching per token kind and per section value class.

use super::context::{Mode, Stack};
use crate::error::RenderError;
use crate::parse;
use crate::parse::tag::{IndexRef, NameRef, SectionKind};
use crate::parse::tree::Token;
use crate::partial::PartialResolver;
use crate::value::{Class, Lambda, Value};
use std::borrow::Cow;
use std::io::{self, Write};

/// Partial inclusion deeper than this is treated as a cycle.
const MAX_PARTIAL_DEPTH: usize = 64;

pub(crate) struct Renderer<'r> {
    partials: &'r dyn PartialResolver,
    depth: usize,
}

impl<'r> Renderer<'r> {
    pub(crate) fn new(partials: &'r dyn PartialResolver) -> Self {
        Self { partials, depth: 0 }
    }

    /// Render `tokens` in order, writing to `out` as they produce output.
    pub(crate) fn render<'v>(
        &mut self,
        tokens: &[Token],
        stack: &mut Stack<'v>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        for token in tokens {
            match token {
                Token::Text(text) => out.write_all(text.as_bytes())?,

                Token::Variable { name, escape, outermost } => {
                    self.variable(name, *escape, *outermost, stack, out)?;
                }

                Token::Section { name, kind, body, raw } => {
                    self.section(name, *kind, body, raw, stack, out)?;
                }

                Token::Partial { name, keyword, rendered } => {
                    self.partial(name, *keyword, *rendered, stack, out)?;
                }
            }
        }
        Ok(())
    }

    fn render_to_string<'v>(
        &mut self,
        tokens: &[Token],
        stack: &mut Stack<'v>,
    ) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.render(tokens, stack, &mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| RenderError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Resolve a field or `.` reference; `.[n]` forms are conditions, not
    /// values, and resolve to nothing here.
    fn resolve<'v>(&self, name: &NameRef, mode: Mode, stack: &Stack<'v>) -> Option<&'v Value> {
        match name {
            NameRef::This => Some(stack.top()),
            NameRef::Index(_) => None,
            NameRef::Field { name, keyword } => stack.lookup(name, *keyword, mode),
        }
    }

    fn variable<'v>(
        &mut self,
        name: &NameRef,
        escape: bool,
        outermost: bool,
        stack: &mut Stack<'v>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let mode = if outermost { Mode::Outermost } else { Mode::Nearest };
        let Some(value) = self.resolve(name, mode, stack) else {
            // Missing data degrades to empty output, never an error.
            return Ok(());
        };

        let text = match value {
            // A no-argument callable is invoked on lookup; its result is
            // the looked-up value. Other arities only make sense for
            // sections and render as empty here.
            Value::Lambda(Lambda::Arity0(f)) => f()
                .map_err(|source| RenderError::Lambda { name: name.to_string(), source })?
                .to_text(),
            Value::Lambda(_) => return Ok(()),
            v => v.to_text(),
        };

        if escape {
            write_escaped(&text, out)?;
        } else {
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn section<'v>(
        &mut self,
        name: &NameRef,
        kind: SectionKind,
        body: &[Token],
        raw: &str,
        stack: &mut Stack<'v>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        // Positional index conditions: a boolean against the nearest
        // iteration position. They never push and never iterate.
        if let NameRef::Index(index) = name {
            let hit = match stack.iter_position() {
                Some((i, len)) => match index {
                    IndexRef::Nth(n) => i + 1 == *n,
                    IndexRef::Last => i + 1 == len,
                },
                None => false,
            };
            let wanted = kind != SectionKind::Inverted;
            if hit == wanted {
                return self.render(body, stack, out);
            }
            return Ok(());
        }

        let class = match self.resolve(name, Mode::Nearest, stack) {
            Some(value) => value.classify(),
            None => Class::Falsy,
        };

        match kind {
            SectionKind::Normal | SectionKind::Eager => match class {
                Class::Falsy => Ok(()),

                Class::Truthy(value) => {
                    stack.push(value);
                    let result = self.render(body, stack, out);
                    stack.pop();
                    result
                }

                Class::Iterable(items) => {
                    let len = items.len();
                    for (i, item) in items.iter().enumerate() {
                        stack.push_element(item, i, len);
                        let result = self.render(body, stack, out);
                        stack.pop();
                        result?;
                    }
                    Ok(())
                }

                Class::Callable(lambda) => {
                    // `#` hands the lambda the raw body source; `|`
                    // renders the body against the current stack first.
                    let input: Cow<'_, str> = if kind == SectionKind::Eager {
                        Cow::Owned(self.render_to_string(body, stack)?)
                    } else {
                        Cow::Borrowed(raw)
                    };
                    let text = self.invoke(name, lambda, &input, stack)?;
                    out.write_all(text.as_bytes())?;
                    Ok(())
                }
            },

            SectionKind::Inverted => match class {
                Class::Falsy => self.render(body, stack, out),
                Class::Iterable(items) if items.is_empty() => self.render(body, stack, out),
                _ => Ok(()),
            },

            // Existence check: render once, no push, no iteration.
            SectionKind::Check => match class {
                Class::Truthy(_) | Class::Iterable(_) => self.render(body, stack, out),
                Class::Falsy | Class::Callable(_) => Ok(()),
            },
        }
    }

    fn invoke<'v>(
        &mut self,
        name: &NameRef,
        lambda: &Lambda,
        text: &str,
        stack: &mut Stack<'v>,
    ) -> Result<String, RenderError> {
        match lambda {
            Lambda::Arity0(f) => Ok(f()
                .map_err(|source| RenderError::Lambda { name: name.to_string(), source })?
                .to_text()),

            Lambda::Arity1(f) => {
                f(text).map_err(|source| RenderError::Lambda { name: name.to_string(), source })
            }

            Lambda::Arity2(f) => {
                let label = name.to_string();
                // Explicit context passing: the callback closes over the
                // live stack, so the lambda renders against the scope it
                // was invoked in.
                let mut render_fn = |src: &str| -> Result<String, RenderError> {
                    let tpl = parse::parse(src).map_err(|e| RenderError::Lambda {
                        name: label.clone(),
                        source: Box::new(e),
                    })?;
                    self.render_to_string(&tpl.tokens, stack)
                };
                f(text, &mut render_fn)
                    .map_err(|source| RenderError::Lambda { name: name.to_string(), source })
            }
        }
    }

    fn partial<'v>(
        &mut self,
        name: &str,
        keyword: bool,
        rendered: bool,
        stack: &mut Stack<'v>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        // A partial name is a variable first; only unresolved names go to
        // the external resolver.
        let source: Cow<'_, str> = match stack.lookup(name, keyword, Mode::Nearest) {
            Some(Value::Str(s)) => Cow::Borrowed(s.as_str()),
            Some(value) => Cow::Owned(value.to_text()),
            None => match self.partials.resolve(name) {
                Ok(Some(text)) => Cow::Owned(text),
                Ok(None) => return Err(RenderError::PartialNotFound(name.to_owned())),
                Err(source) => {
                    return Err(RenderError::PartialResolve {
                        name: name.to_owned(),
                        source,
                    });
                }
            },
        };

        if !rendered {
            // Raw include: spliced verbatim, never parsed.
            out.write_all(source.as_bytes())?;
            return Ok(());
        }

        if self.depth >= MAX_PARTIAL_DEPTH {
            return Err(RenderError::PartialCycle {
                name: name.to_owned(),
            });
        }

        // Fresh parse with default delimiters; rendered against the
        // current stack unmodified, so the partial inherits caller scope.
        let tpl = parse::parse(&source).map_err(|source| RenderError::PartialParse {
            name: name.to_owned(),
            source,
        })?;
        self.depth += 1;
        let result = self.render(&tpl.tokens, stack, out);
        self.depth -= 1;
        result
    }
}

/// HTML-escape `& < > ' " /` into entities, streaming clean runs whole.
fn write_escaped(text: &str, out: &mut dyn Write) -> io::Result<()> {
    let mut clean_from = 0;
    for (i, c) in text.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '\'' => "&#39;",
            '"' => "&quot;",
            '/' => "&#x2F;",
            _ => continue,
        };
        out.write_all(text[clean_from..i].as_bytes())?;
        out.write_all(entity.as_bytes())?;
        clean_from = i + 1;
    }
    out.write_all(text[clean_from..].as_bytes())
}
