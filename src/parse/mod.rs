//! Template parsing: scanner, tag classification, tree builder.

pub(crate) mod scanner;
pub(crate) mod tag;
pub(crate) mod tree;

use crate::error::ParseError;
use tree::Token;

/// Default tag delimiters.
pub const DEFAULT_TAGS: (&str, &str) = ("{{", "}}");

/// A compiled template: an immutable token tree.
///
/// Parse once, render many times; rendering never mutates the tree, so a
/// `Template` can be shared across threads and rendered concurrently.
#[derive(Clone, Debug)]
pub struct Template {
    pub(crate) tokens: Vec<Token>,
}

/// Parse a template with the default `{{`/`}}` delimiters.
pub fn parse(template: &str) -> Result<Template, ParseError> {
    parse_with(template, DEFAULT_TAGS)
}

/// Parse a template with a caller-chosen starting delimiter pair.
///
/// A `{{=<% %>=}}`-style directive inside the template still switches
/// delimiters for everything after it.
pub fn parse_with(template: &str, tags: (&str, &str)) -> Result<Template, ParseError> {
    let (open, close) = tags;
    if open.is_empty() || close.is_empty() {
        return Err(ParseError::BadDelimiters { offset: 0 });
    }
    Ok(Template {
        tokens: tree::build(template, open, close)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_custom_tags() {
        let tpl = parse_with("Hello <<name>>!", ("<<", ">>")).unwrap();
        assert_eq!(tpl.tokens.len(), 3);
    }

    #[test]
    fn empty_delimiters_rejected() {
        assert!(matches!(
            parse_with("x", ("", "}}")),
            Err(ParseError::BadDelimiters { .. })
        ));
    }

    #[test]
    fn template_is_cloneable_and_sendable() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let tpl = parse("{{#s}}{{x}}{{/s}}").unwrap();
        assert_send_sync(&tpl);
        let _copy = tpl.clone();
    }
}
