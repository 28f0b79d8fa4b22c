//! Unigram language-model rankers with smoothing.
//!
//! Every smoother here scores by query likelihood: the contribution of a
//! matched term is
//!
//! ```text
//! qtf * ln( p_s(t|d) / (alpha_d * p(t|C)) )
//! ```
//!
//! and the document-dependent constant is `|q| * ln(alpha_d)`, where
//! `p_s(t|d)` is the smoothed document probability, `p(t|C) = ctf / |C|`
//! the collection probability, and `alpha_d` the smoother's document
//! constant. Implementing [`LanguageModel`] supplies those two pieces; the
//! [`Ranker`] plumbing is shared.

use crate::error::{Error, Result};

use super::{Ranker, ScoreData};

/// A query-likelihood smoother; see the module docs.
pub trait LanguageModel: Send + Sync {
    /// The smoothed probability of the matched term in the document.
    fn smoothed_prob(&self, sd: &ScoreData) -> f64;

    /// The document-dependent smoothing constant `alpha_d`.
    fn doc_constant(&self, sd: &ScoreData) -> f64;
}

impl<T: LanguageModel> Ranker for T {
    fn score_one(&self, sd: &ScoreData) -> f32 {
        let collection_prob = sd.corpus_term_count as f64 / sd.total_corpus_terms as f64;
        let ratio = self.smoothed_prob(sd) / (self.doc_constant(sd) * collection_prob);
        (sd.query_term_weight as f64 * ratio.ln()) as f32
    }

    fn initial_score(&self, sd: &ScoreData) -> f32 {
        (sd.query_length as f64 * self.doc_constant(sd).ln()) as f32
    }
}

/// Bayesian smoothing with a Dirichlet prior of concentration `mu`.
///
/// `p_s(t|d) = (tf + mu * p(t|C)) / (dl + mu)` and
/// `alpha_d = mu / (dl + mu)`.
#[derive(Debug, Clone, Copy)]
pub struct DirichletPrior {
    mu: f32,
}

impl DirichletPrior {
    pub const DEFAULT_MU: f32 = 2000.0;

    /// Creates a Dirichlet-prior ranker.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] for a negative `mu`.
    pub fn new(mu: f32) -> Result<Self> {
        if mu < 0.0 {
            return Err(Error::BadArgument(format!(
                "dirichlet mu must be nonnegative, got {mu}"
            )));
        }
        Ok(Self { mu })
    }

    /// The concentration parameter.
    pub fn mu(&self) -> f32 {
        self.mu
    }
}

impl Default for DirichletPrior {
    fn default() -> Self {
        Self {
            mu: Self::DEFAULT_MU,
        }
    }
}

impl LanguageModel for DirichletPrior {
    fn smoothed_prob(&self, sd: &ScoreData) -> f64 {
        let collection_prob = sd.corpus_term_count as f64 / sd.total_corpus_terms as f64;
        (sd.term_freq_in_doc as f64 + self.mu as f64 * collection_prob)
            / (sd.doc_length as f64 + self.mu as f64)
    }

    fn doc_constant(&self, sd: &ScoreData) -> f64 {
        self.mu as f64 / (sd.doc_length as f64 + self.mu as f64)
    }
}

/// Jelinek-Mercer linear interpolation with weight `lambda` on the
/// collection model.
#[derive(Debug, Clone, Copy)]
pub struct JelinekMercer {
    lambda: f32,
}

impl JelinekMercer {
    pub const DEFAULT_LAMBDA: f32 = 0.7;

    /// Creates a Jelinek-Mercer ranker.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] unless `lambda` is within `[0, 1]`.
    pub fn new(lambda: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&lambda) {
            return Err(Error::BadArgument(format!(
                "jelinek-mercer lambda must be within [0, 1], got {lambda}"
            )));
        }
        Ok(Self { lambda })
    }

    /// The interpolation weight.
    pub fn lambda(&self) -> f32 {
        self.lambda
    }
}

impl Default for JelinekMercer {
    fn default() -> Self {
        Self {
            lambda: Self::DEFAULT_LAMBDA,
        }
    }
}

impl LanguageModel for JelinekMercer {
    fn smoothed_prob(&self, sd: &ScoreData) -> f64 {
        let collection_prob = sd.corpus_term_count as f64 / sd.total_corpus_terms as f64;
        let max_likelihood = sd.term_freq_in_doc as f64 / sd.doc_length as f64;
        (1.0 - self.lambda as f64) * max_likelihood + self.lambda as f64 * collection_prob
    }

    fn doc_constant(&self, _sd: &ScoreData) -> f64 {
        self.lambda as f64
    }
}

/// Absolute discounting: subtracts `delta` from every observed term count
/// and redistributes the mass to the collection model.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteDiscount {
    delta: f32,
}

impl AbsoluteDiscount {
    pub const DEFAULT_DELTA: f32 = 0.7;

    /// Creates an absolute-discounting ranker.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] for a negative `delta`.
    pub fn new(delta: f32) -> Result<Self> {
        if delta < 0.0 {
            return Err(Error::BadArgument(format!(
                "absolute-discount delta must be nonnegative, got {delta}"
            )));
        }
        Ok(Self { delta })
    }

    /// The discount.
    pub fn delta(&self) -> f32 {
        self.delta
    }
}

impl Default for AbsoluteDiscount {
    fn default() -> Self {
        Self {
            delta: Self::DEFAULT_DELTA,
        }
    }
}

impl LanguageModel for AbsoluteDiscount {
    fn smoothed_prob(&self, sd: &ScoreData) -> f64 {
        let collection_prob = sd.corpus_term_count as f64 / sd.total_corpus_terms as f64;
        let discounted =
            (sd.term_freq_in_doc as f64 - self.delta as f64).max(0.0) / sd.doc_length as f64;
        discounted + self.doc_constant(sd) * collection_prob
    }

    fn doc_constant(&self, sd: &ScoreData) -> f64 {
        self.delta as f64 * sd.doc_unique_terms as f64 / sd.doc_length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DocId;

    fn score_data() -> ScoreData {
        ScoreData {
            doc_id: DocId::new(1),
            query_term_weight: 1.0,
            doc_count: 2,
            corpus_term_count: 3,
            term_freq_in_doc: 2,
            doc_length: 4,
            doc_unique_terms: 3,
            avg_doc_length: 4.0,
            num_docs: 10,
            total_corpus_terms: 40,
            query_length: 1.0,
        }
    }

    #[test]
    fn dirichlet_matches_hand_computation() {
        let ranker = DirichletPrior::new(2000.0).unwrap();
        let sd = score_data();

        let pc = 3.0 / 40.0;
        let ps = (2.0 + 2000.0 * pc) / (4.0 + 2000.0);
        let alpha: f64 = 2000.0 / (4.0 + 2000.0);
        let expected = (ps / (alpha * pc)).ln() as f32;

        assert!((ranker.score_one(&sd) - expected).abs() < 1e-6);
        assert!((ranker.initial_score(&sd) - alpha.ln() as f32).abs() < 1e-6);
    }

    #[test]
    fn matched_terms_contribute_positively() {
        // A term that occurs in the document more often than chance must
        // raise the score above the smoothing baseline.
        let sd = score_data();
        for ranker in [
            Box::new(DirichletPrior::default()) as Box<dyn Ranker>,
            Box::new(JelinekMercer::default()),
            Box::new(AbsoluteDiscount::default()),
        ] {
            assert!(ranker.score_one(&sd) > 0.0);
        }
    }

    #[test]
    fn parameters_are_validated() {
        assert!(DirichletPrior::new(-1.0).is_err());
        assert!(JelinekMercer::new(1.1).is_err());
        assert!(AbsoluteDiscount::new(-0.5).is_err());
        assert!(DirichletPrior::new(0.0).is_ok());
    }
}
