//! Ranked-retrieval evaluation from result lists and relevance judgments.

use hashbrown::{HashMap, HashSet};

use crate::ids::DocId;
use crate::ranking::SearchResult;

/// Holds relevance judgments and scores ranked lists against them.
///
/// Judgments are graded (`doc -> relevance`), with zero meaning not
/// relevant; binary metrics treat any positive grade as relevant.
#[derive(Debug, Clone, Default)]
pub struct IrEval {
    judgments: HashMap<DocId, f64>,
}

impl IrEval {
    /// Creates an evaluator with no judgments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the relevance grade of `doc`.
    pub fn add_judgment(&mut self, doc: DocId, relevance: f64) {
        self.judgments.insert(doc, relevance);
    }

    /// The number of documents judged relevant (positive grade).
    pub fn num_relevant(&self) -> usize {
        self.judgments.values().filter(|&&r| r > 0.0).count()
    }

    /// Average precision of one ranked list.
    ///
    /// The mean over relevant ranks of `precision@rank`, divided by the
    /// total number of relevant documents; 0 when nothing is relevant.
    pub fn average_precision(&self, results: &[SearchResult]) -> f64 {
        let relevant: HashSet<DocId> = self
            .judgments
            .iter()
            .filter(|&(_, &r)| r > 0.0)
            .map(|(&doc, _)| doc)
            .collect();
        if relevant.is_empty() {
            return 0.0;
        }

        let mut hits = 0usize;
        let mut precision_sum = 0.0;
        for (rank, result) in results.iter().enumerate() {
            if relevant.contains(&result.doc_id) {
                hits += 1;
                precision_sum += hits as f64 / (rank + 1) as f64;
            }
        }
        precision_sum / relevant.len() as f64
    }

    /// Normalized discounted cumulative gain at cutoff `k`.
    ///
    /// `DCG = sum_i (2^rel_i - 1) / log2(i + 1)` over the first `k`
    /// results, normalized by the ideal ordering's DCG; 0 when no judged
    /// document has a positive grade.
    pub fn ndcg(&self, results: &[SearchResult], k: usize) -> f64 {
        let dcg: f64 = results
            .iter()
            .take(k)
            .enumerate()
            .map(|(rank, result)| {
                let rel = self.judgments.get(&result.doc_id).copied().unwrap_or(0.0);
                (2f64.powf(rel) - 1.0) / ((rank + 2) as f64).log2()
            })
            .sum();

        let mut ideal: Vec<f64> = self.judgments.values().copied().filter(|&r| r > 0.0).collect();
        ideal.sort_unstable_by(|a, b| b.total_cmp(a));
        let idcg: f64 = ideal
            .iter()
            .take(k)
            .enumerate()
            .map(|(rank, rel)| (2f64.powf(*rel) - 1.0) / ((rank + 2) as f64).log2())
            .sum();

        if idcg == 0.0 { 0.0 } else { dcg / idcg }
    }
}

/// Mean average precision over a set of per-query evaluations.
pub fn mean_average_precision(per_query: &[f64]) -> f64 {
    if per_query.is_empty() {
        return 0.0;
    }
    per_query.iter().sum::<f64>() / per_query.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(docs: &[u64]) -> Vec<SearchResult> {
        docs.iter()
            .enumerate()
            .map(|(rank, &doc)| SearchResult {
                doc_id: DocId::new(doc),
                score: 100.0 - rank as f32,
            })
            .collect()
    }

    #[test]
    fn perfect_ranking_has_unit_scores() {
        let mut eval = IrEval::new();
        eval.add_judgment(DocId::new(0), 1.0);
        eval.add_judgment(DocId::new(1), 1.0);

        let results = ranked(&[0, 1, 2]);
        assert!((eval.average_precision(&results) - 1.0).abs() < 1e-12);
        assert!((eval.ndcg(&results, 3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn average_precision_penalizes_late_hits() {
        let mut eval = IrEval::new();
        eval.add_judgment(DocId::new(5), 1.0);

        // Relevant document at rank 3: AP = 1/3.
        let ap = eval.average_precision(&ranked(&[1, 2, 5]));
        assert!((ap - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn ndcg_prefers_higher_grades_first() {
        let mut eval = IrEval::new();
        eval.add_judgment(DocId::new(0), 3.0);
        eval.add_judgment(DocId::new(1), 1.0);

        let good = eval.ndcg(&ranked(&[0, 1]), 2);
        let bad = eval.ndcg(&ranked(&[1, 0]), 2);
        assert!(good > bad);
        assert!((good - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_relevant_documents_scores_zero() {
        let eval = IrEval::new();
        assert_eq!(eval.average_precision(&ranked(&[1, 2])), 0.0);
        assert_eq!(eval.ndcg(&ranked(&[1, 2]), 2), 0.0);
    }

    #[test]
    fn map_averages_per_query_scores() {
        assert_eq!(mean_average_precision(&[]), 0.0);
        assert!((mean_average_precision(&[1.0, 0.5]) - 0.75).abs() < 1e-12);
    }
}
