//! Form parsing and validation.
//!
//! Forms arrive as raw strings, are validated here, and only validated input
//! is ever sent to the API. Validation failures are reported per field and
//! never reach the network.

mod login;
mod product;

use std::collections::BTreeMap;
use std::fmt;

pub use login::{LoginForm, LoginInput};
pub use product::{FormMode, PayloadPart, ProductForm, ProductKind, ProductPayload};

/// Field-level validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// A file received from the browser.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wrap an upload; empty file inputs yield `None`.
    #[must_use]
    pub fn new(file_name: Option<&str>, content_type: Option<&str>, bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        Some(Self {
            file_name: file_name
                .filter(|name| !name.is_empty())
                .unwrap_or("upload")
                .to_string(),
            content_type: content_type
                .unwrap_or("application/octet-stream")
                .to_string(),
            bytes,
        })
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = FormErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Invalid email address");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = FormErrors::new();
        errors.add("price", "Price is required");
        errors.add("title", "Product name is required");
        assert_eq!(
            errors.to_string(),
            "price: Price is required; title: Product name is required"
        );
    }

    #[test]
    fn test_empty_upload_is_dropped() {
        assert!(UploadedFile::new(Some(""), Some("application/octet-stream"), Vec::new()).is_none());

        let file = UploadedFile::new(None, None, vec![1, 2, 3]);
        let file = file.as_ref().map(|f| (f.file_name.as_str(), f.content_type.as_str()));
        assert_eq!(file, Some(("upload", "application/octet-stream")));
    }
}
