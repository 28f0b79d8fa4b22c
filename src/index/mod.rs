//! Disk-resident indexes and the pipeline that builds them.

pub mod builder;
pub mod chunk_reader;
pub mod forward_index;
pub mod index_files;
pub mod inverted_index;
pub mod labels;
pub mod metadata_file;
pub mod postings_data;
pub mod postings_stream;
pub mod vocabulary;

pub use builder::{BuildStats, IndexBuilder};
pub use forward_index::ForwardIndex;
pub use inverted_index::InvertedIndex;
