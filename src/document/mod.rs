//! SVG template documents and placeholder substitution.

use std::borrow::Cow;
use std::path::Path;

use crate::foundation::error::{IoContext as _, ThumbError, ThumbResult};

/// Replace every literal occurrence of `placeholder` in `document` with `replacement`.
///
/// No pattern syntax and no escaping. The document is returned borrowed when the placeholder
/// does not occur; an empty placeholder never matches.
pub fn substitute<'a>(document: &'a str, placeholder: &str, replacement: &str) -> Cow<'a, str> {
    if placeholder.is_empty() || !document.contains(placeholder) {
        return Cow::Borrowed(document);
    }
    Cow::Owned(document.replace(placeholder, replacement))
}

/// An SVG template and the token that marks where the date goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDocument {
    source: String,
    placeholder: String,
    name: Option<String>,
}

impl TemplateDocument {
    /// Wrap in-memory SVG source.
    pub fn new(source: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            placeholder: placeholder.into(),
            name: None,
        }
    }

    /// Read an SVG template from disk.
    pub fn load(path: &Path, placeholder: impl Into<String>) -> ThumbResult<Self> {
        let source = std::fs::read_to_string(path)
            .io_context(|| format!("read template '{}'", path.display()))?;
        Ok(Self {
            source,
            placeholder: placeholder.into(),
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        })
    }

    /// Raw SVG source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder token.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// File name the template was loaded from, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of placeholder occurrences in the source.
    pub fn placeholder_count(&self) -> usize {
        if self.placeholder.is_empty() {
            return 0;
        }
        self.source.matches(self.placeholder.as_str()).count()
    }

    /// Source with the placeholder replaced by `text`.
    pub fn render_for(&self, text: &str) -> Cow<'_, str> {
        substitute(&self.source, &self.placeholder, text)
    }

    /// Reject documents that cannot produce a thumbnail at all.
    pub fn validate(&self) -> ThumbResult<()> {
        if self.source.trim().is_empty() {
            return Err(ThumbError::validation("template document is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/document.rs"]
mod tests;
