// End-to-end tests across the build / open / rank / feedback pipeline.
// This module is only compiled during testing via #[cfg(test)] in lib.rs.

use std::path::Path;

use crate::analyzers::WhitespaceAnalyzer;
use crate::corpus::Document;
use crate::index::{ForwardIndex, IndexBuilder, InvertedIndex};

mod integration_tests;
mod ranking_tests;

/// The three-line corpus used across the ranking tests:
/// `d0 = "the quick brown fox"`, `d1 = "the lazy dog"`,
/// `d2 = "quick brown dog"`.
fn tiny_corpus(dir: &Path) -> InvertedIndex {
    let docs = vec![
        Document::new("the quick brown fox"),
        Document::new("the lazy dog"),
        Document::new("quick brown dog"),
    ];
    IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(docs, dir)
        .unwrap();
    InvertedIndex::open(dir).unwrap()
}

fn tiny_corpus_with_forward(dir: &Path) -> (InvertedIndex, ForwardIndex) {
    let inv = tiny_corpus(dir);
    let fwd = ForwardIndex::open(dir).unwrap();
    (inv, fwd)
}
