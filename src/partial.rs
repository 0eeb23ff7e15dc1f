//! Partial resolution collaborators.
//!
//! The renderer only needs "text or not found" for a partial name; where
//! the text comes from (registry, file, anything else) is the caller's
//! choice.

use crate::error::BoxError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Supplies template source text for partial names the view itself does
/// not bind.
pub trait PartialResolver {
    /// `Ok(None)` means "not found"; errors are resolver failures (I/O
    /// and the like) and abort the render.
    fn resolve(&self, name: &str) -> Result<Option<String>, BoxError>;
}

/// Resolver that knows no partials; unresolved names become
/// `RenderError::PartialNotFound`.
pub struct NoPartials;

impl PartialResolver for NoPartials {
    fn resolve(&self, _name: &str) -> Result<Option<String>, BoxError> {
        Ok(None)
    }
}

/// An in-memory registry of named partials.
impl PartialResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Result<Option<String>, BoxError> {
        Ok(self.get(name).cloned())
    }
}

/// Resolves partial names as files under a root directory.
///
/// A name is tried verbatim first, then with the configured default
/// extension appended, so both `{{> box.tpl }}` and `{{> box }}` work.
pub struct FileResolver {
    root: PathBuf,
    extension: Option<String>,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
        }
    }

    /// Set the extension (without the dot) appended to bare names.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }
}

impl PartialResolver for FileResolver {
    fn resolve(&self, name: &str) -> Result<Option<String>, BoxError> {
        let mut candidates = vec![self.root.join(name)];
        if let Some(ext) = &self.extension {
            candidates.push(self.root.join(format!("{name}.{ext}")));
        }

        for path in candidates {
            match fs::read_to_string(&path) {
                Ok(text) => return Ok(Some(text)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Box::new(e)),
            }
        }
        Ok(None)
    }
}
