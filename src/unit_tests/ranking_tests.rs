use super::*;
use crate::ids::DocId;
use crate::ranking::dirichlet_opt::{DirichletOptimizer, optimize_mu};
use crate::ranking::{AbsoluteDiscount, Bm25, DirichletPrior, JelinekMercer, Ranker};

#[test]
fn equal_scores_break_ties_by_ascending_doc_id() {
    let dir = tempfile::tempdir().unwrap();
    // Identical documents score identically.
    let docs = vec![
        Document::new("same words here"),
        Document::new("same words here"),
        Document::new("same words here"),
    ];
    IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(docs, dir.path())
        .unwrap();
    let index = InvertedIndex::open(dir.path()).unwrap();

    let words = index.term_id("words").unwrap();
    let results = Bm25::default()
        .score(&index, &[(words, 1.0)], 3)
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].score, results[1].score);
    assert_eq!(results[1].score, results[2].score);
    let ids: Vec<DocId> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids, vec![DocId::new(0), DocId::new(1), DocId::new(2)]);
}

#[test]
fn tie_break_holds_when_the_heap_overflows() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<Document> = (0..20).map(|_| Document::new("tied term")).collect();
    IndexBuilder::new(WhitespaceAnalyzer::new())
        .build(docs, dir.path())
        .unwrap();
    let index = InvertedIndex::open(dir.path()).unwrap();

    let term = index.term_id("tied").unwrap();
    let results = Bm25::default().score(&index, &[(term, 1.0)], 5).unwrap();

    // With all scores equal, the five lowest doc ids survive the bounded
    // heap, in ascending order.
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id.get()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[test]
fn language_model_rankers_agree_on_the_best_document() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    let quick = index.term_id("quick").unwrap();
    let dog = index.term_id("dog").unwrap();
    let query = vec![(quick, 1.0f32), (dog, 1.0f32)];

    for ranker in [
        Box::new(DirichletPrior::default()) as Box<dyn Ranker>,
        Box::new(JelinekMercer::default()),
        Box::new(AbsoluteDiscount::default()),
    ] {
        let results = crate::ranking::rank(ranker.as_ref(), &index, &query, 3, None).unwrap();
        assert!(!results.is_empty());
        assert_eq!(
            results[0].doc_id,
            DocId::new(2),
            "d2 matches both terms and must rank first"
        );
        for result in &results {
            assert!(result.score.is_finite());
        }
        for window in results.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }
}

#[test]
fn optimized_mu_is_positive_and_usable() {
    let dir = tempfile::tempdir().unwrap();
    let (inv, fwd) = tiny_corpus_with_forward(dir.path());

    for optimizer in [
        DirichletOptimizer::DigammaRecurrence,
        DirichletOptimizer::LogApproximation,
    ] {
        let fit = optimize_mu(&fwd, optimizer, 1e-6, 100).unwrap();
        assert!(fit.mu > 0.0, "{optimizer:?} produced mu {}", fit.mu);
        assert!(fit.mu.is_finite());
        assert_eq!(fit.alpha.len(), inv.unique_terms() as usize);
        assert!(fit.iterations <= 100);

        let ranker = DirichletPrior::with_optimized_mu(&fwd, optimizer, 1e-6, 100).unwrap();
        let quick = inv.term_id("quick").unwrap();
        let results = ranker.score(&inv, &[(quick, 1.0)], 3).unwrap();
        assert!(!results.is_empty());
    }
}

#[test]
fn mackay_peto_placeholder_keeps_the_default_mass() {
    let dir = tempfile::tempdir().unwrap();
    let (_, fwd) = tiny_corpus_with_forward(dir.path());

    let fit = optimize_mu(&fwd, DirichletOptimizer::MackayPeto, 1e-6, 100).unwrap();
    assert!(fit.converged);
    assert_eq!(fit.iterations, 0);
    // The initial concentrations sum to the default mu.
    assert!((fit.mu - f64::from(DirichletPrior::DEFAULT_MU)).abs() < 1e-6);
}

#[test]
fn repeated_queries_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let index = tiny_corpus(dir.path());

    let quick = index.term_id("quick").unwrap();
    let dog = index.term_id("dog").unwrap();
    let query = vec![(quick, 1.0f32), (dog, 1.0f32)];

    let ranker = Bm25::default();
    let first = ranker.score(&index, &query, 3).unwrap();
    for _ in 0..10 {
        assert_eq!(ranker.score(&index, &query, 3).unwrap(), first);
    }
}
