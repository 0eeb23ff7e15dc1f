//! A directory-loaded template registry.
//!
//! The engine's `parse`/`render` stay stateless and cache-agnostic; this
//! is the explicit cache that sits outside them. Sources are loaded once,
//! invalidation is the caller's (`insert`/`remove`), and the registry
//! doubles as a [`PartialResolver`].

use crate::error::{BoxError, ParseError};
use crate::parse::{Template, parse};
use crate::partial::PartialResolver;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Named template sources, keyed by `/`-separated relative path with the
/// load extension stripped (`partials/box.tpl` loads as `partials/box`).
#[derive(Debug, Default)]
pub struct Library {
    sources: HashMap<String, String>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.{extension}` file under `dir`.
    ///
    /// Unreadable directory entries are skipped; unreadable files fail the
    /// whole load.
    pub fn from_dir(dir: &Path, extension: &str) -> io::Result<Self> {
        let mut sources = HashMap::new();

        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|x| x.to_str()) != Some(extension)
            {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(dir)
                .map_err(io::Error::other)?
                .with_extension("");
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            sources.insert(name, fs::read_to_string(entry.path())?);
        }

        Ok(Self { sources })
    }

    /// Register or replace a template source.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    /// Drop a template; returns its source if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.sources.remove(name)
    }

    /// Raw source text of a named template.
    pub fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Parse a named template with the default delimiters.
    pub fn compile(&self, name: &str) -> Option<Result<Template, ParseError>> {
        self.sources.get(name).map(|src| parse(src))
    }

    /// Registered template names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl PartialResolver for Library {
    fn resolve(&self, name: &str) -> Result<Option<String>, BoxError> {
        Ok(self.sources.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::fs;

    #[test]
    fn loads_templates_from_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("page.tpl"), "<{{>partials/box}}>").unwrap();
        fs::write(dir.path().join("partials/box.tpl"), "[{{x}}]").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();

        let lib = Library::from_dir(dir.path(), "tpl").unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.source("page"), Some("<{{>partials/box}}>"));
        assert_eq!(lib.source("notes"), None);

        let view = Value::map([("x", "!")]);
        let out = lib
            .compile("page")
            .unwrap()
            .unwrap()
            .render_with_partials(&view, &lib)
            .unwrap();
        assert_eq!(out, "<[!]>");
    }

    #[test]
    fn caller_controls_invalidation() {
        let mut lib = Library::new();
        assert!(lib.is_empty());

        lib.insert("greet", "Hello {{name}}");
        assert_eq!(lib.source("greet"), Some("Hello {{name}}"));

        lib.insert("greet", "Hi {{name}}");
        assert_eq!(lib.source("greet"), Some("Hi {{name}}"));

        assert_eq!(lib.remove("greet").as_deref(), Some("Hi {{name}}"));
        assert_eq!(lib.source("greet"), None);
    }

    #[test]
    fn compile_reports_parse_errors() {
        let mut lib = Library::new();
        lib.insert("bad", "{{#open}}never closed");
        assert!(lib.compile("bad").unwrap().is_err());
        assert!(lib.compile("missing").is_none());
    }
}
