// Test module organization for the feedback operators.
// Compiled only under cfg(test) via the declaration in feedback/mod.rs.

use super::*;
use crate::analyzers::WhitespaceAnalyzer;
use crate::corpus::Document;
use crate::ids::DocId;
use crate::index::{ForwardIndex, IndexBuilder, InvertedIndex};


/// Builds a tiny two-document corpus and returns its open indexes:
/// `d0 = "t1 t1 t2 t2 t2"` and `d1 = "t2 t3 t3 t3 t3"`.
fn two_doc_corpus(dir: &std::path::Path) -> (InvertedIndex, ForwardIndex) {
    let docs = vec![
        Document::new("t1 t1 t2 t2 t2"),
        Document::new("t2 t3 t3 t3 t3"),
    ];
    IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(docs, dir)
        .unwrap();

    (
        InvertedIndex::open(dir).unwrap(),
        ForwardIndex::open(dir).unwrap(),
    )
}
