//! Okapi BM25.

use crate::error::{Error, Result};

use super::{Ranker, ScoreData};

/// Okapi BM25 with term-frequency saturation (`k1`), length normalization
/// (`b`), and query-term-frequency saturation (`k3`).
///
/// Score of one matched term:
///
/// ```text
/// IDF(t) * ((k1 + 1) * tf) / (k1 * ((1 - b) + b * dl / avgdl) + tf)
///        * ((k3 + 1) * qtf) / (k3 + qtf)
/// ```
///
/// with `IDF(t) = ln(1 + (N - df + 0.5) / (df + 0.5))`. The 1 inside the
/// logarithm keeps the factor positive even for terms occurring in more
/// than half the corpus.
#[derive(Debug, Clone, Copy)]
pub struct Bm25 {
    k1: f32,
    b: f32,
    k3: f32,
}

impl Bm25 {
    pub const DEFAULT_K1: f32 = 1.2;
    pub const DEFAULT_B: f32 = 0.75;
    pub const DEFAULT_K3: f32 = 500.0;

    /// Creates a BM25 ranker.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] if `k1` or `k3` is negative, or `b` is
    /// outside `[0, 1]`.
    pub fn new(k1: f32, b: f32, k3: f32) -> Result<Self> {
        if k1 < 0.0 {
            return Err(Error::BadArgument(format!(
                "bm25 k1 must be nonnegative, got {k1}"
            )));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(Error::BadArgument(format!(
                "bm25 b must be within [0, 1], got {b}"
            )));
        }
        if k3 < 0.0 {
            return Err(Error::BadArgument(format!(
                "bm25 k3 must be nonnegative, got {k3}"
            )));
        }
        Ok(Self { k1, b, k3 })
    }

    /// The `k1` parameter.
    pub fn k1(&self) -> f32 {
        self.k1
    }

    /// The `b` parameter.
    pub fn b(&self) -> f32 {
        self.b
    }

    /// The `k3` parameter.
    pub fn k3(&self) -> f32 {
        self.k3
    }
}

impl Default for Bm25 {
    fn default() -> Self {
        Self {
            k1: Self::DEFAULT_K1,
            b: Self::DEFAULT_B,
            k3: Self::DEFAULT_K3,
        }
    }
}

impl Ranker for Bm25 {
    fn score_one(&self, sd: &ScoreData) -> f32 {
        let num_docs = sd.num_docs as f64;
        let doc_count = sd.doc_count as f64;
        let idf = (1.0 + (num_docs - doc_count + 0.5) / (doc_count + 0.5)).ln();

        let tf = sd.term_freq_in_doc as f64;
        let length_norm = (1.0 - self.b as f64)
            + self.b as f64 * sd.doc_length as f64 / sd.avg_doc_length;
        let tf_ratio = ((self.k1 as f64 + 1.0) * tf) / (self.k1 as f64 * length_norm + tf);

        let qtf = sd.query_term_weight as f64;
        let qtf_ratio = ((self.k3 as f64 + 1.0) * qtf) / (self.k3 as f64 + qtf);

        (idf * tf_ratio * qtf_ratio) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DocId;

    fn score_data() -> ScoreData {
        ScoreData {
            doc_id: DocId::new(0),
            query_term_weight: 1.0,
            doc_count: 2,
            corpus_term_count: 2,
            term_freq_in_doc: 1,
            doc_length: 3,
            doc_unique_terms: 3,
            avg_doc_length: 3.5,
            num_docs: 3,
            total_corpus_terms: 11,
            query_length: 2.0,
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Bm25::new(-0.1, 0.75, 500.0).is_err());
        assert!(Bm25::new(1.2, 1.5, 500.0).is_err());
        assert!(Bm25::new(1.2, 0.75, -1.0).is_err());
        assert!(Bm25::new(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn matches_hand_computed_score() {
        let ranker = Bm25::default();
        let sd = score_data();

        let idf = (1.0 + (3.0f64 - 2.0 + 0.5) / (2.0 + 0.5)).ln();
        let norm = 0.25 + 0.75 * 3.0 / 3.5;
        let tf_ratio = (2.2 * 1.0) / (1.2 * norm + 1.0);
        let qtf_ratio = 501.0 / 501.0;
        let expected = (idf * tf_ratio * qtf_ratio) as f32;

        assert!((ranker.score_one(&sd) - expected).abs() < 1e-6);
    }

    #[test]
    fn rarer_terms_score_higher() {
        let ranker = Bm25::default();
        let mut common = score_data();
        common.num_docs = 1_000;
        common.doc_count = 500;

        let mut rare = common;
        rare.doc_count = 5;

        assert!(ranker.score_one(&rare) > ranker.score_one(&common));
    }
}
