//! The term dictionary.
//!
//! `termids.mapping` stores one packed record per vocabulary term (the
//! term string followed by its dense id), sorted lexicographically by term.
//! `termids.mapping.inverse` is a fixed-width vector mapping each `term_id`
//! to the byte offset of its record, so id → text lookups are a single seek
//! into the mapped file.
//!
//! Term ids are assigned in first-seen order during indexing, so they are
//! dense but not alphabetical; the sorted mapping plus the inverse vector
//! covers both lookup directions.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::hashing::robinhood::RobinHoodMap;
use crate::ids::TermId;
use crate::io::disk_vector::{DiskVector, write_disk_vector};
use crate::io::packed;

use super::index_files::IndexFile;

/// Writes the vocabulary files for `terms` (term string, dense id) into
/// `index_dir`.
pub fn write_vocabulary(index_dir: &Path, mut terms: Vec<(String, TermId)>) -> Result<()> {
    terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mapping_path = IndexFile::TermMapping.path_in(index_dir);
    let mut out = BufWriter::new(File::create(mapping_path)?);

    let mut offsets = vec![0u64; terms.len()];
    let mut offset = 0u64;
    for (term, id) in &terms {
        offsets[id.get() as usize] = offset;
        offset += packed::write(&mut out, term)?;
        offset += packed::write(&mut out, id)?;
    }
    out.flush()?;

    write_disk_vector(&IndexFile::TermMappingInverse.path_in(index_dir), &offsets)
}

/// The loaded term dictionary of an open index.
pub struct Vocabulary {
    mapping: Option<Mmap>,
    inverse: DiskVector<u64>,
    /// term string → id, rebuilt from the mapping file at open.
    lookup: RobinHoodMap<String, TermId>,
}

impl Vocabulary {
    /// Opens the vocabulary files in `index_dir` and rebuilds the term →
    /// id lookup.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let inverse = DiskVector::<u64>::open(&IndexFile::TermMappingInverse.path_in(index_dir))?;

        let file = File::open(IndexFile::TermMapping.path_in(index_dir))?;
        let mapping = if file.metadata()?.len() == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        let mut lookup = RobinHoodMap::with_capacity(inverse.len());
        if let Some(map) = &mapping {
            let mut cursor: &[u8] = map;
            while !cursor.is_empty() {
                let term: String = packed::read(&mut cursor)?;
                let id: TermId = packed::read(&mut cursor)?;
                if id.get() as usize >= inverse.len() {
                    return Err(Error::Corrupt(format!(
                        "vocabulary record for \"{term}\" has id {id} outside the inverse mapping"
                    )));
                }
                lookup.insert(term, id);
            }
        }

        if lookup.len() != inverse.len() {
            return Err(Error::Corrupt(format!(
                "vocabulary holds {} terms but the inverse mapping has {}",
                lookup.len(),
                inverse.len()
            )));
        }

        Ok(Self {
            mapping,
            inverse,
            lookup,
        })
    }

    /// The number of terms in the vocabulary.
    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    /// Looks up the id assigned to `term`, if the term was ever indexed.
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.lookup.get(term).copied()
    }

    /// Reads back the text of `term_id` from the mapping file.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] if the id is out of range or its record cannot be
    /// decoded.
    pub fn term_text(&self, term_id: TermId) -> Result<String> {
        let offset = self
            .inverse
            .get(term_id.get() as usize)
            .ok_or_else(|| Error::Corrupt(format!("term id {term_id} out of range")))?;

        let map = self
            .mapping
            .as_ref()
            .ok_or_else(|| Error::Corrupt("vocabulary mapping file is empty".to_string()))?;

        if offset as usize >= map.len() {
            return Err(Error::Corrupt(format!(
                "vocabulary offset {offset} for term id {term_id} is outside the mapping file"
            )));
        }

        let mut cursor = &map[offset as usize..];
        packed::read::<String, _>(&mut cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        // First-seen id assignment: not alphabetical.
        let terms = vec![
            ("quick".to_string(), TermId::new(0)),
            ("brown".to_string(), TermId::new(1)),
            ("aardvark".to_string(), TermId::new(2)),
        ];
        write_vocabulary(dir.path(), terms).unwrap();

        let vocab = Vocabulary::open(dir.path()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.term_id("quick"), Some(TermId::new(0)));
        assert_eq!(vocab.term_id("brown"), Some(TermId::new(1)));
        assert_eq!(vocab.term_id("aardvark"), Some(TermId::new(2)));
        assert_eq!(vocab.term_id("missing"), None);

        assert_eq!(vocab.term_text(TermId::new(0)).unwrap(), "quick");
        assert_eq!(vocab.term_text(TermId::new(2)).unwrap(), "aardvark");
        assert!(vocab.term_text(TermId::new(9)).is_err());
    }

    #[test]
    fn empty_vocabulary_opens() {
        let dir = tempfile::tempdir().unwrap();
        write_vocabulary(dir.path(), Vec::new()).unwrap();

        let vocab = Vocabulary::open(dir.path()).unwrap();
        assert!(vocab.is_empty());
        assert_eq!(vocab.term_id("anything"), None);
    }
}
