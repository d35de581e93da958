//! Reader options.

use crate::charset::{DEFAULT_ENCODING, TextEncoding};

/// Options for reading DBF tables.
#[derive(Debug, Clone, Copy)]
pub struct DbfReaderOptions {
    /// Encoding applied to every record, ignoring the header's code page.
    pub override_encoding: Option<TextEncoding>,
    /// Encoding used when the header's code page does not resolve (default: UTF-8).
    pub default_encoding: TextEncoding,
}

impl Default for DbfReaderOptions {
    fn default() -> Self {
        Self {
            override_encoding: None,
            default_encoding: DEFAULT_ENCODING,
        }
    }
}

impl DbfReaderOptions {
    /// Create reader options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every character field with `encoding`.
    #[must_use]
    pub fn with_override_encoding(mut self, encoding: impl Into<TextEncoding>) -> Self {
        self.override_encoding = Some(encoding.into());
        self
    }

    /// Fall back to `encoding` when the code page is unknown or unsupported.
    #[must_use]
    pub fn with_default_encoding(mut self, encoding: impl Into<TextEncoding>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    /// Look up an encoding by label; see [`TextEncoding::for_label`].
    #[must_use]
    pub fn encoding_for_label(label: &str) -> Option<TextEncoding> {
        TextEncoding::for_label(label)
    }
}
