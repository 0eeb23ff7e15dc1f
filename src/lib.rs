//! `stache` — a Mustache-style template engine.
//!
//! Templates compile once into an immutable token tree ([`Template`]) and
//! render any number of times against a view ([`Value`]), to a returned
//! `String` or incrementally to an `io::Write` sink.
//!
//! ```
//! use stache::{parse, Value};
//!
//! let tpl = parse("Hello {{name}}!{{#in_ca}} You won {{taxed}}.{{/in_ca}}")?;
//! let view = Value::map([
//!     ("name", Value::from("Chris")),
//!     ("in_ca", Value::from(true)),
//!     ("taxed", Value::from(6000.0)),
//! ]);
//! assert_eq!(tpl.render(&view)?, "Hello Chris! You won 6000.0.");
//! # Ok::<(), stache::Error>(())
//! ```
//!
//! Tag syntax: `{{name}}` (escaped variable), `{{{name}}}` / `{{&name}}`
//! (unescaped), `{{~name}}` (outermost-scope lookup), `{{#s}}…{{/s}}`
//! (section: conditional, iterating, or lambda-applying), `{{^s}}`
//! (inverted), `{{|s}}` (render body before calling a lambda), `{{@s}}`
//! (existence check), `{{>p}}` / `{{<p}}` (rendered / raw partial),
//! `{{! comment}}`, and `{{=<% %>=}}` to change delimiters. Names may be
//! keyword-style (`{{:name}}`), `.` for the current iteration element, or
//! `.[n]` / `.[end]` positional conditions inside iteration.

mod error;
mod library;
mod parse;
mod partial;
mod render;
mod value;

pub use error::{BoxError, Error, ParseError, RenderError};
pub use library::Library;
pub use parse::{DEFAULT_TAGS, Template, parse, parse_with};
pub use partial::{FileResolver, NoPartials, PartialResolver};
pub use value::{Lambda, Map, RenderFn, Value};

use std::io::Write;

/// Parse and render in one step.
pub fn render(template: &str, view: &Value) -> Result<String, Error> {
    Ok(parse(template)?.render(view)?)
}

/// Parse and render in one step, resolving partials through `partials`.
pub fn render_with_partials(
    template: &str,
    view: &Value,
    partials: &dyn PartialResolver,
) -> Result<String, Error> {
    Ok(parse(template)?.render_with_partials(view, partials)?)
}

/// Parse and render in one step, writing incrementally to `sink`.
pub fn render_to(template: &str, sink: &mut impl Write, view: &Value) -> Result<(), Error> {
    parse(template)?.render_to(sink, view)?;
    Ok(())
}
