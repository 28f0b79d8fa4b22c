//! Ide query rewriting.

use crate::error::Result;
use crate::hashing::inline_set::InlineKeySet;
use crate::index::ForwardIndex;
use crate::ranking::SearchResult;

use super::{Feedback, QueryVector, check_parameters};

/// The Ide rewrite: like Rocchio but with unnormalized sums,
///
/// ```text
/// qm = a * q0 + b * sum_{d in R} d - c * sum_{d in N} d
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ide {
    a: f32,
    b: f32,
    c: f32,
}

impl Ide {
    pub const DEFAULT_A: f32 = 1.0;
    pub const DEFAULT_B: f32 = 0.8;
    pub const DEFAULT_C: f32 = 0.0;

    /// Creates an Ide operator.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] if any parameter is negative.
    ///
    /// [`Error::BadArgument`]: crate::error::Error::BadArgument
    pub fn new(a: f32, b: f32, c: f32) -> Result<Self> {
        check_parameters("ide", a, b, c)?;
        Ok(Self { a, b, c })
    }
}

impl Default for Ide {
    fn default() -> Self {
        Self {
            a: Self::DEFAULT_A,
            b: Self::DEFAULT_B,
            c: Self::DEFAULT_C,
        }
    }
}

impl Feedback for Ide {
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
            for doc in fwd.docs() {
                if relevant.contains(&doc) {
                    continue;
                }
                let record = fwd.search_primary(doc)?;
                for &(term, count) in record.counts() {
                    qm.add_weight(term, -(count as f32) * self.c);
                }
            }
        }

        Ok(qm)
    }
}
