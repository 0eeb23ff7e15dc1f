//! Tag-body classification: sigils, names, and directives.

use crate::error::ParseError;
use std::fmt;

/// How a section treats the value its name resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SectionKind {
    /// `#` — conditional / iterating / lambda-applying.
    Normal,
    /// `^` — rendered only for falsy or empty values.
    Inverted,
    /// `|` — like `#`, but a lambda receives the body pre-rendered.
    Eager,
    /// `@` — existence check; never pushes, never iterates.
    Check,
}

/// A positional reference inside scalar iteration: `.[n]` or `.[end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IndexRef {
    /// 1-based element index.
    Nth(usize),
    /// The last element.
    Last,
}

/// What a tag names: a field, the current element, or an iteration index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NameRef {
    Field { name: String, keyword: bool },
    /// `.` — the value on top of the context stack.
    This,
    /// `.[n]` / `.[end]` — conditional use only.
    Index(IndexRef),
}

impl fmt::Display for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRef::Field { name, keyword: true } => write!(f, ":{name}"),
            NameRef::Field { name, keyword: false } => f.write_str(name),
            NameRef::This => f.write_str("."),
            NameRef::Index(IndexRef::Nth(n)) => write!(f, ".[{n}]"),
            NameRef::Index(IndexRef::Last) => f.write_str(".[end]"),
        }
    }
}

impl NameRef {
    fn parse(text: &str) -> NameRef {
        if text == "." {
            return NameRef::This;
        }
        if let Some(inner) = text.strip_prefix(".[").and_then(|t| t.strip_suffix(']')) {
            if inner == "end" {
                return NameRef::Index(IndexRef::Last);
            }
            if let Ok(n) = inner.parse::<usize>() {
                if n >= 1 {
                    return NameRef::Index(IndexRef::Nth(n));
                }
            }
        }
        match text.strip_prefix(':') {
            Some(rest) => NameRef::Field {
                name: rest.to_owned(),
                keyword: true,
            },
            None => NameRef::Field {
                name: text.to_owned(),
                keyword: false,
            },
        }
    }
}

/// A classified tag body, ready for the tree builder.
#[derive(Debug, PartialEq)]
pub(crate) enum TagBody {
    Comment,
    /// `=open close=` — swap the scanner's delimiters; emits no token.
    Delimiters { open: String, close: String },
    Variable {
        name: NameRef,
        escape: bool,
        outermost: bool,
    },
    SectionOpen {
        name: NameRef,
        kind: SectionKind,
    },
    SectionClose { name: NameRef },
    Partial {
        name: String,
        keyword: bool,
        rendered: bool,
    },
}

/// Classify the raw inter-delimiter content of a tag.
///
/// `triple` marks the interior-brace form (`{{{name}}}`), which is always
/// an unescaped variable and admits no other sigil.
pub(crate) fn classify(content: &str, triple: bool, offset: usize) -> Result<TagBody, ParseError> {
    let body = content.trim();
    if body.is_empty() {
        return Err(ParseError::EmptyTag { offset });
    }

    if triple {
        return Ok(TagBody::Variable {
            name: NameRef::parse(body),
            escape: false,
            outermost: false,
        });
    }

    if body.starts_with('!') {
        return Ok(TagBody::Comment);
    }

    if body.starts_with('=') {
        return parse_delimiters(body, offset);
    }

    let (sigil, rest) = match body.chars().next() {
        Some(c @ ('#' | '^' | '|' | '@' | '/' | '>' | '<' | '&' | '~')) => {
            (Some(c), body[1..].trim())
        }
        _ => (None, body),
    };
    if rest.is_empty() {
        return Err(ParseError::EmptyTag { offset });
    }
    let name = NameRef::parse(rest);

    Ok(match sigil {
        Some('#') => TagBody::SectionOpen { name, kind: SectionKind::Normal },
        Some('^') => TagBody::SectionOpen { name, kind: SectionKind::Inverted },
        Some('|') => TagBody::SectionOpen { name, kind: SectionKind::Eager },
        Some('@') => TagBody::SectionOpen { name, kind: SectionKind::Check },
        Some('/') => TagBody::SectionClose { name },
        Some(s @ ('>' | '<')) => {
            let (partial, keyword) = match rest.strip_prefix(':') {
                Some(r) => (r.to_owned(), true),
                None => (rest.to_owned(), false),
            };
            TagBody::Partial {
                name: partial,
                keyword,
                rendered: s == '>',
            }
        }
        Some('&') => TagBody::Variable { name, escape: false, outermost: false },
        Some('~') => TagBody::Variable { name, escape: true, outermost: true },
        _ => TagBody::Variable { name, escape: true, outermost: false },
    })
}

/// Parse `=open close=` into a new delimiter pair.
fn parse_delimiters(body: &str, offset: usize) -> Result<TagBody, ParseError> {
    let inner = body
        .strip_prefix('=')
        .and_then(|b| b.strip_suffix('='))
        .ok_or(ParseError::BadDelimiters { offset })?;

    let mut parts = inner.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(open), Some(close), None) if !open.is_empty() && !close.is_empty() => {
            Ok(TagBody::Delimiters {
                open: open.to_owned(),
                close: close.to_owned(),
            })
        }
        _ => Err(ParseError::BadDelimiters { offset }),
    }
}
