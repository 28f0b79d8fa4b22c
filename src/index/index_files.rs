//! Names of the files that make up a built index.
//!
//! Every index lives in a single directory:
//! ```text
//! index-dir/
//! ├── termids.mapping          # sorted vocabulary, packed-string records
//! ├── termids.mapping.inverse  # term_id -> record byte offset (u64 vector)
//! ├── postings.index           # term_id -> postings.db byte offset (u64 vector)
//! ├── postings.db              # packed inverted postings records
//! ├── forward.index            # doc_id -> forward.db byte offset (u64 vector)
//! ├── forward.db               # packed forward postings records
//! ├── docs.labels              # doc_id -> label_id (u32 vector)
//! ├── docs.labels.mapping      # label_id -> label string, packed strings
//! ├── metadata.index           # doc_id -> metadata.db byte offset (u64 vector)
//! └── metadata.db              # schema header + per-document packed fields
//! ```
//!
//! All `.index`, `.labels`, and `.inverse` files are little-endian
//! fixed-width vectors and memory-mappable.

use std::path::{Path, PathBuf};

/// The file types of an index directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFile {
    /// Sorted vocabulary records (`termids.mapping`).
    TermMapping,
    /// Dense `term_id` → vocabulary-record offset (`termids.mapping.inverse`).
    TermMappingInverse,
    /// Lexicon: `term_id` → postings byte offset (`postings.index`).
    PostingsIndex,
    /// Packed inverted postings records (`postings.db`).
    PostingsDb,
    /// `doc_id` → forward postings byte offset (`forward.index`).
    ForwardIndex,
    /// Packed forward postings records (`forward.db`).
    ForwardDb,
    /// `doc_id` → `label_id` assignments (`docs.labels`).
    DocLabels,
    /// `label_id` → label string records (`docs.labels.mapping`).
    DocLabelsMapping,
    /// `doc_id` → metadata byte offset (`metadata.index`).
    MetadataIndex,
    /// Metadata schema header and records (`metadata.db`).
    MetadataDb,
}

impl IndexFile {
    /// The filename for this file type.
    pub fn base_name(self) -> &'static str {
        match self {
            IndexFile::TermMapping => "termids.mapping",
            IndexFile::TermMappingInverse => "termids.mapping.inverse",
            IndexFile::PostingsIndex => "postings.index",
            IndexFile::PostingsDb => "postings.db",
            IndexFile::ForwardIndex => "forward.index",
            IndexFile::ForwardDb => "forward.db",
            IndexFile::DocLabels => "docs.labels",
            IndexFile::DocLabelsMapping => "docs.labels.mapping",
            IndexFile::MetadataIndex => "metadata.index",
            IndexFile::MetadataDb => "metadata.db",
        }
    }

    /// The full path of this file inside `index_dir`.
    pub fn path_in(self, index_dir: &Path) -> PathBuf {
        index_dir.join(self.base_name())
    }
}

/// Name of the `n`th intermediate inverted chunk file written during
/// indexing. Chunk files are deleted as the merge consumes them.
pub(crate) fn chunk_file_name(index_dir: &Path, chunk: usize) -> PathBuf {
    index_dir.join(format!("chunk-{chunk}.bin"))
}

/// Name of the `n`th intermediate forward chunk file.
pub(crate) fn forward_chunk_file_name(index_dir: &Path, chunk: usize) -> PathBuf {
    index_dir.join(format!("fwd-chunk-{chunk}.bin"))
}

/// Whether `name` is an intermediate chunk file, used to sweep leftovers
/// after a failed build.
pub(crate) fn is_chunk_file(name: &str) -> bool {
    (name.starts_with("chunk-") || name.starts_with("fwd-chunk-")) && name.ends_with(".bin")
}
