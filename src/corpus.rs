//! Document inputs to the indexing pipeline.

use crate::index::metadata_file::FieldValue;

/// One document to be indexed: its text, an optional class label, and any
/// user-supplied metadata fields.
///
/// Metadata fields must be identical in name, order, and type across every
/// document in a corpus; the builder derives the on-disk schema from the
/// first document and rejects mismatches.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Raw text handed to the analyzer.
    pub content: String,
    /// Class label, interned to a dense id when present.
    pub label: Option<String>,
    /// User metadata in schema order: `(field_name, value)`.
    pub metadata: Vec<(String, FieldValue)>,
}

impl Document {
    /// Creates a document holding only content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            label: None,
            metadata: Vec::new(),
        }
    }

    /// Sets the class label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends a user metadata field.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.metadata.push((name.into(), value));
        self
    }
}
