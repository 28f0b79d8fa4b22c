//! Ide dec-hi query rewriting.

use crate::error::Result;
use crate::hashing::inline_set::InlineKeySet;
use crate::index::ForwardIndex;
use crate::ranking::SearchResult;

use super::{Feedback, QueryVector, check_parameters};

/// The Ide dec-hi rewrite: unnormalized sums like Ide, but only the single
/// highest-ranked non-relevant document (the one with the largest dot
/// product against `q0`) is subtracted.
#[derive(Debug, Clone, Copy)]
pub struct IdeDecHi {
    a: f32,
    b: f32,
    c: f32,
}

impl IdeDecHi {
    pub const DEFAULT_A: f32 = 1.0;
    pub const DEFAULT_B: f32 = 0.8;
    pub const DEFAULT_C: f32 = 0.0;

    /// Creates an Ide dec-hi operator.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] if any parameter is negative.
    ///
    /// [`Error::BadArgument`]: crate::error::Error::BadArgument
    pub fn new(a: f32, b: f32, c: f32) -> Result<Self> {
        check_parameters("ide-dec-hi", a, b, c)?;
        Ok(Self { a, b, c })
    }
}

impl Default for IdeDecHi {
    fn default() -> Self {
        Self {
            a: Self::DEFAULT_A,
            b: Self::DEFAULT_B,
            c: Self::DEFAULT_C,
        }
    }
}

impl Feedback for IdeDecHi {
    fn rewrite(
        &self,
        q0: &QueryVector,
        results: &[SearchResult],
        fwd: &ForwardIndex,
    ) -> Result<QueryVector> {
        let mut qm = QueryVector::new();

        if self.a > 0.0 {
            for (term, weight) in q0.iter() {
                qm.add_weight(term, weight * self.a);
            }
        }

        let mut relevant = InlineKeySet::new();
        for result in results {
            relevant.insert(result.doc_id);
        }

        if self.b > 0.0 {
            for result in results {
                let record = fwd.search_primary(result.doc_id)?;
                for &(term, count) in record.counts() {
                    qm.add_weight(term, count as f32 * self.b);
                }
            }
        }

        if self.c > 0.0 {
            // Find the non-relevant document most similar to the original
            // query and subtract only it.
            let mut best: Option<(f64, crate::ids::DocId)> = None;
            for doc in fwd.docs() {
                if relevant.contains(&doc) {
                    continue;
                }
                let record = fwd.search_primary(doc)?;
                let similarity = q0.dot(record.counts());
                if similarity > best.map_or(0.0, |(sim, _)| sim) {
                    best = Some((similarity, doc));
                }
            }

            if let Some((_, doc)) = best {
                let record = fwd.search_primary(doc)?;
                for &(term, count) in record.counts() {
                    qm.add_weight(term, -(count as f32) * self.c);
                }
            }
        }

        Ok(qm)
    }
}
