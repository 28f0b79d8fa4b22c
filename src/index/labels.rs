//! Class-label storage.
//!
//! Labels are interned to dense `label_id`s in first-seen order. Index 0 is
//! reserved for the empty string, which stands in for "no label"; real
//! labels may not be blank. On disk the per-document assignments are a
//! fixed-width `u32` vector (`docs.labels`) and the id → string mapping is
//! a sequence of packed strings in id order (`docs.labels.mapping`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::ids::LabelId;
use crate::io::disk_vector::{DiskVector, write_disk_vector};
use crate::io::packed;

use super::index_files::IndexFile;

/// Interns label strings to dense ids during index construction.
pub struct LabelInterner {
    labels: IndexSet<String>,
}

impl LabelInterner {
    /// Creates an interner with the empty "no label" entry at id 0.
    pub fn new() -> Self {
        let mut labels = IndexSet::new();
        labels.insert(String::new());
        Self { labels }
    }

    /// Interns `label`, returning its dense id.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] for a blank label; id 0 is reserved.
    pub fn intern(&mut self, label: &str) -> Result<LabelId> {
        if label.is_empty() {
            return Err(Error::BadArgument(
                "class labels may not be blank".to_string(),
            ));
        }
        let (idx, _) = self.labels.insert_full(label.to_string());
        Ok(LabelId::new(idx as u32))
    }

    /// The id used for documents without a label.
    pub fn unlabeled() -> LabelId {
        LabelId::new(0)
    }

    /// Writes the label files for the per-document `assignments`.
    pub fn write(&self, index_dir: &Path, assignments: &[LabelId]) -> Result<()> {
        write_disk_vector(&IndexFile::DocLabels.path_in(index_dir), assignments)?;

        let mapping_path = IndexFile::DocLabelsMapping.path_in(index_dir);
        let mut out = BufWriter::new(File::create(mapping_path)?);
        for label in &self.labels {
            packed::write(&mut out, label)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Default for LabelInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// The loaded label store of an open index.
pub struct LabelStore {
    assignments: DiskVector<LabelId>,
    names: Vec<String>,
}

impl LabelStore {
    /// Opens the label files in `index_dir`.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let assignments = DiskVector::<LabelId>::open(&IndexFile::DocLabels.path_in(index_dir))?;

        let bytes = std::fs::read(IndexFile::DocLabelsMapping.path_in(index_dir))?;
        let mut cursor = bytes.as_slice();
        let mut names = Vec::new();
        while !cursor.is_empty() {
            names.push(packed::read::<String, _>(&mut cursor)?);
        }

        if names.is_empty() {
            return Err(Error::Corrupt(
                "label mapping is missing the reserved unlabeled entry".to_string(),
            ));
        }

        Ok(Self { assignments, names })
    }

    /// The number of distinct labels, excluding the reserved empty entry.
    pub fn num_labels(&self) -> usize {
        self.names.len() - 1
    }

    /// The label id assigned to document `doc`, if the document exists.
    pub fn label_id(&self, doc: usize) -> Option<LabelId> {
        self.assignments.get(doc)
    }

    /// The label string for document `doc`; `None` for unlabeled documents
    /// or out-of-range ids.
    pub fn label(&self, doc: usize) -> Option<&str> {
        let id = self.assignments.get(doc)?;
        let name = self.names.get(id.get() as usize)?;
        if name.is_empty() { None } else { Some(name) }
    }

    /// The string for a label id, if in range and not the reserved entry.
    pub fn class_label(&self, id: LabelId) -> Option<&str> {
        let name = self.names.get(id.get() as usize)?;
        if name.is_empty() { None } else { Some(name) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut interner = LabelInterner::new();

        let spam = interner.intern("spam").unwrap();
        let ham = interner.intern("ham").unwrap();
        assert_eq!(interner.intern("spam").unwrap(), spam);
        assert_ne!(spam, ham);

        let assignments = vec![ham, LabelInterner::unlabeled(), spam, spam];
        interner.write(dir.path(), &assignments).unwrap();

        let store = LabelStore::open(dir.path()).unwrap();
        assert_eq!(store.num_labels(), 2);
        assert_eq!(store.label(0), Some("ham"));
        assert_eq!(store.label(1), None);
        assert_eq!(store.label(2), Some("spam"));
        assert_eq!(store.label_id(3), Some(spam));
        assert_eq!(store.label(9), None);
        assert_eq!(store.class_label(spam), Some("spam"));
        assert_eq!(store.class_label(LabelInterner::unlabeled()), None);
    }

    #[test]
    fn blank_labels_are_rejected() {
        let mut interner = LabelInterner::new();
        assert!(matches!(
            interner.intern(""),
            Err(Error::BadArgument(_))
        ));
    }
}
