use super::*;
use crate::analyzers::Analyzer;
use crate::config::IndexerConfig;
use crate::ids::{DocId, TermId};
use crate::index::metadata_file::FieldValue;
use crate::ranking::{Bm25, DirichletPrior, Ranker};

#[test]
fn build_and_query_with_bm25() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    let quick = index.term_id("quick").unwrap();
    let dog = index.term_id("dog").unwrap();
    let query = vec![(quick, 1.0f32), (dog, 1.0f32)];

    let results = Bm25::default().score(&index, &query, 3).unwrap();
    assert_eq!(results.len(), 3);

    // d2 matches both query terms and wins outright.
    assert_eq!(results[0].doc_id, DocId::new(2));
    for window in results.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
    for result in &results {
        assert!(result.score.is_finite());
        assert!(result.score > 0.0);
    }
    // The single-term matches are separated by length normalization: the
    // shorter d1 edges out d0.
    assert_eq!(results[1].doc_id, DocId::new(1));
    assert_eq!(results[2].doc_id, DocId::new(0));
}

#[test]
fn unknown_term_query_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    // "cat" never made it into the vocabulary, so tokenization drops it
    // and ranking sees an empty query.
    assert_eq!(index.term_id("cat"), None);
    let results = crate::search(
        &index,
        &WhitespaceAnalyzer::new(),
        &DirichletPrior::default(),
        "cat",
        3,
    )
    .unwrap();
    assert!(results.is_empty());
}

#[test]
fn num_results_bounds_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    let quick = index.term_id("quick").unwrap();
    let query = vec![(quick, 1.0f32)];

    assert!(Bm25::default().score(&index, &query, 0).unwrap().is_empty());
    assert_eq!(Bm25::default().score(&index, &query, 1).unwrap().len(), 1);
    // Only two documents contain "quick".
    assert_eq!(Bm25::default().score(&index, &query, 10).unwrap().len(), 2);
}

#[test]
fn document_filter_is_applied_in_stream() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    let quick = index.term_id("quick").unwrap();
    let query = vec![(quick, 1.0f32)];

    let skip_d0 = |doc: DocId| doc != DocId::new(0);
    let filter: crate::ranking::DocFilter<'_> = &skip_d0;
    let results =
        crate::ranking::rank(&Bm25::default(), &index, &query, 10, Some(filter)).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, DocId::new(2));
}

#[test]
fn index_statistics_match_the_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    assert_eq!(index.num_docs(), 3);
    // the, quick, brown, fox, lazy, dog
    assert_eq!(index.unique_terms(), 6);
    assert_eq!(index.total_corpus_terms().unwrap(), 10);
    assert!((index.avg_doc_length().unwrap() - 10.0 / 3.0).abs() < 1e-12);

    assert_eq!(index.doc_size(DocId::new(0)).unwrap(), 4);
    assert_eq!(index.doc_size(DocId::new(1)).unwrap(), 3);
    assert_eq!(index.doc_unique_terms(DocId::new(2)).unwrap(), 3);

    let quick = index.term_id("quick").unwrap();
    let the = index.term_id("the").unwrap();
    assert_eq!(index.doc_freq(quick).unwrap(), 2);
    assert_eq!(index.doc_freq(the).unwrap(), 2);
    assert_eq!(index.total_num_occurrences(quick).unwrap(), 2);
    assert_eq!(index.term_freq(quick, DocId::new(0)).unwrap(), 1);
    assert_eq!(index.term_freq(quick, DocId::new(1)).unwrap(), 0);

    assert_eq!(index.term_text(quick).unwrap(), "quick");
}

#[test]
fn postings_streams_are_strictly_increasing() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    for raw in 0..index.unique_terms() {
        let stream = index.stream_for(TermId::new(raw)).unwrap().unwrap();
        let docs: Vec<DocId> = stream.iter().map(|(doc, _)| doc).collect();
        assert!(
            docs.windows(2).all(|w| w[0] < w[1]),
            "postings for term {raw} are not strictly increasing: {docs:?}"
        );
        assert_eq!(docs.len() as u64, stream.size());
    }
}

#[test]
fn forward_index_is_the_transpose() {
    let dir = tempfile::tempdir().unwrap();
    let (inv, fwd) = tiny_corpus_with_forward(dir.path());

    assert_eq!(fwd.num_docs(), 3);
    for doc in fwd.docs() {
        let record = fwd.search_primary(doc).unwrap();
        assert_eq!(record.total_counts(), inv.doc_size(doc).unwrap());
        for &(term, count) in record.counts() {
            assert_eq!(
                inv.term_freq(term, doc).unwrap(),
                count,
                "mismatch for term {term} in doc {doc}"
            );
        }
    }
}

#[test]
fn labels_and_metadata_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let docs = vec![
        Document::new("alpha beta")
            .with_label("spam")
            .with_field("source", FieldValue::Str("feed-a".to_string()))
            .with_field("weight", FieldValue::F64(0.5)),
        Document::new("beta gamma")
            .with_field("source", FieldValue::Str("feed-b".to_string()))
            .with_field("weight", FieldValue::F64(1.5)),
        Document::new("gamma delta")
            .with_label("ham")
            .with_field("source", FieldValue::Str("feed-a".to_string()))
            .with_field("weight", FieldValue::F64(2.5)),
    ];
    IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(docs, dir.path())
        .unwrap();

    let index = InvertedIndex::open(dir.path()).unwrap();
    assert_eq!(index.labels().label(0), Some("spam"));
    assert_eq!(index.labels().label(1), None);
    assert_eq!(index.labels().label(2), Some("ham"));
    assert_eq!(index.labels().num_labels(), 2);

    let record = index.metadata(DocId::new(1)).unwrap();
    assert_eq!(
        record.get("source").unwrap(),
        Some(FieldValue::Str("feed-b".to_string()))
    );
    assert_eq!(record.get("weight").unwrap(), Some(FieldValue::F64(1.5)));
    assert_eq!(record.length().unwrap(), 2);
}

#[test]
fn multi_chunk_build_matches_brute_force_statistics() {
    let dir = tempfile::tempdir().unwrap();

    // A corpus large enough to force several accumulator flushes under a
    // deliberately tiny RAM budget.
    let vocabulary = [
        "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    ];
    let mut docs = Vec::new();
    for i in 0..2_000usize {
        let mut content = String::new();
        for j in 0..10 {
            content.push_str(vocabulary[(i * 7 + j * 3) % vocabulary.len()]);
            content.push(' ');
        }
        docs.push(Document::new(content));
    }
    let expected_docs = docs.clone();

    let config = IndexerConfig {
        ram_budget_bytes: 1,
        num_threads: 4,
    };
    let stats = IndexBuilder::with_config(WhitespaceAnalyzer::new(), config)
        .build(docs, dir.path())
        .unwrap();

    assert_eq!(stats.num_docs, 2_000);
    assert_eq!(stats.unique_terms, vocabulary.len() as u64);
    assert!(stats.inverted_chunks > 1, "budget did not force a flush");

    let index = InvertedIndex::open(dir.path()).unwrap();
    assert_eq!(index.num_docs(), 2_000);
    assert_eq!(index.total_corpus_terms().unwrap(), 20_000);

    // Brute-force document frequencies from the corpus itself.
    let analyzer = WhitespaceAnalyzer::new();
    for word in vocabulary {
        let term = index.term_id(word).unwrap();
        let expected_df = expected_docs
            .iter()
            .filter(|d| analyzer.analyze(&d.content).contains_key(word))
            .count() as u64;
        let expected_total: u64 = expected_docs
            .iter()
            .filter_map(|d| analyzer.analyze(&d.content).get(word).copied())
            .sum();
        assert_eq!(index.doc_freq(term).unwrap(), expected_df, "df for {word}");
        assert_eq!(
            index.total_num_occurrences(term).unwrap(),
            expected_total,
            "ctf for {word}"
        );
    }

    // No chunk files may survive a successful merge.
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name();
        let name = name.to_string_lossy();
        assert!(
            !name.starts_with("chunk-") && !name.starts_with("fwd-chunk-"),
            "leftover chunk file {name}"
        );
    }
}

#[test]
fn empty_corpus_builds_and_opens() {
    let dir = tempfile::tempdir().unwrap();
    let stats = IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(Vec::new(), dir.path())
        .unwrap();
    assert_eq!(stats.num_docs, 0);
    assert_eq!(stats.unique_terms, 0);

    let index = InvertedIndex::open(dir.path()).unwrap();
    assert_eq!(index.num_docs(), 0);
    assert_eq!(index.term_id("anything"), None);

    let results = crate::search(
        &index,
        &WhitespaceAnalyzer::new(),
        &Bm25::default(),
        "anything at all",
        10,
    )
    .unwrap();
    assert!(results.is_empty());
}

#[test]
fn feedback_rewrite_recalls_related_documents() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());
    let fwd = ForwardIndex::open(dir.path()).unwrap();

    let fox = index.term_id("fox").unwrap();
    let query = vec![(fox, 1.0f32)];

    // Only d0 contains "fox".
    let ranker = Bm25::default();
    let first_pass = ranker.score(&index, &query, 3).unwrap();
    assert_eq!(first_pass.len(), 1);
    assert_eq!(first_pass[0].doc_id, DocId::new(0));

    // Rocchio pulls in d0's other terms; the rerun now reaches d2 through
    // "quick" and "brown".
    let q0: crate::feedback::QueryVector = query.iter().copied().collect();
    let rewritten = crate::apply_feedback(
        &crate::feedback::Rocchio::default(),
        &q0,
        &first_pass,
        &fwd,
    )
    .unwrap();

    let second_pass = ranker.score(&index, &rewritten.to_query(), 3).unwrap();
    assert!(second_pass.len() > 1);
    assert!(
        second_pass
            .iter()
            .any(|result| result.doc_id == DocId::new(2))
    );
}
