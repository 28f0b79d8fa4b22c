//! Corpus-driven optimization of the Dirichlet concentration `mu`.
//!
//! Instead of a hand-set `mu`, the smoothing mass can be fit from corpus
//! statistics: each term `k` gets a concentration `alpha_k` estimated by a
//! fixed-point iteration over the count histograms
//!
//! - `C.(n)`: the number of documents of length `n`, and
//! - `C_k(n)`: the number of documents in which term `k` occurs exactly
//!   `n` times,
//!
//! and `mu` is the sum of the fitted `alpha_k`. Two estimators of the
//! digamma-difference term are provided, plus a reserved placeholder.
//!
//! Non-convergence within the iteration budget is a warning, not an error:
//! the last iterate is used.

use log::warn;
use rayon::prelude::*;

use crate::error::Result;
use crate::hashing::probe_map::ProbeMap;
use crate::hashing::robinhood::RobinHoodMap;
use crate::ids::TermId;
use crate::index::ForwardIndex;

use super::lm::DirichletPrior;

/// The fixed-point update used for `alpha_k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirichletOptimizer {
    /// Digamma-difference recurrence: `D(n) = sum_{m<=n} 1/(m - 1 + alpha)`
    /// accumulated over the histograms.
    DigammaRecurrence,
    /// Logarithmic approximation of the digamma difference:
    /// `1/alpha + ln(n + alpha - 0.5) - ln(alpha + 0.5)`; zero histogram
    /// entries are skipped.
    LogApproximation,
    /// Reserved placeholder: keeps the initial concentrations unchanged,
    /// so `mu` stays at the Dirichlet default.
    MackayPeto,
}

/// The result of a `mu` fit.
#[derive(Debug)]
pub struct OptimizedMu {
    /// The fitted concentration sum.
    pub mu: f64,
    /// Per-term concentrations after the final iteration.
    pub alpha: Vec<(TermId, f64)>,
    /// Whether every `alpha_k` moved less than `eps` in the last
    /// iteration.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
}

/// Count histograms gathered from one corpus scan.
struct CorpusStats {
    /// Total corpus size in tokens.
    ref_size: u64,
    /// `C.(n)`: document-length histogram.
    docs_counts: ProbeMap<u64, u64>,
    /// Per-term total occurrences and `C_k(n)` histograms.
    terms: RobinHoodMap<TermId, TermStats>,
}

struct TermStats {
    total: u64,
    doc_counts: ProbeMap<u64, u64>,
}

impl CorpusStats {
    fn new() -> Self {
        Self {
            ref_size: 0,
            docs_counts: ProbeMap::new(),
            terms: RobinHoodMap::new(),
        }
    }

    fn add_doc(&mut self, length: u64, counts: &[(TermId, u64)]) {
        self.ref_size += length;
        *self.docs_counts.get_or_insert_with(length, || 0) += 1;
        for &(term, count) in counts {
            let stats = self.terms.get_or_insert_with(term, || TermStats {
                total: 0,
                doc_counts: ProbeMap::new(),
            });
            stats.total += count;
            *stats.doc_counts.get_or_insert_with(count, || 0) += 1;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.ref_size += other.ref_size;
        for (&length, &count) in other.docs_counts.iter() {
            *self.docs_counts.get_or_insert_with(length, || 0) += count;
        }
        for (&term, stats) in other.terms.iter() {
            let mine = self.terms.get_or_insert_with(term, || TermStats {
                total: 0,
                doc_counts: ProbeMap::new(),
            });
            mine.total += stats.total;
            for (&n, &c) in stats.doc_counts.iter() {
                *mine.doc_counts.get_or_insert_with(n, || 0) += c;
            }
        }
        self
    }

    fn collect(fwd: &ForwardIndex) -> Result<Self> {
        let num_docs = fwd.num_docs();
        let partials: Result<Vec<CorpusStats>> = (0..num_docs)
            .into_par_iter()
            .fold(
                || Ok(CorpusStats::new()),
                |acc: Result<CorpusStats>, doc| {
                    let mut stats = acc?;
                    let record = fwd.search_primary(crate::ids::DocId::new(doc))?;
                    stats.add_doc(record.total_counts(), record.counts());
                    Ok(stats)
                },
            )
            .collect();

        Ok(partials?
            .into_iter()
            .reduce(CorpusStats::merge)
            .unwrap_or_else(CorpusStats::new))
    }
}

/// Fits `mu` over the corpus behind `fwd`.
///
/// Iteration stops when every `alpha_k` moves by at most `eps` or after
/// `max_iter` rounds; non-convergence logs a warning and keeps the last
/// iterate.
pub fn optimize_mu(
    fwd: &ForwardIndex,
    optimizer: DirichletOptimizer,
    eps: f64,
    max_iter: usize,
) -> Result<OptimizedMu> {
    let stats = CorpusStats::collect(fwd)?;

    // Start every term at its collection share of the default mass.
    let mut alpha_m: Vec<(TermId, f64)> = stats
        .terms
        .iter()
        .map(|(&term, term_stats)| {
            let alpha = term_stats.total as f64 * DirichletPrior::DEFAULT_MU as f64
                / stats.ref_size.max(1) as f64;
            (term, alpha)
        })
        .collect();
    alpha_m.sort_unstable_by_key(|&(term, _)| term);

    if matches!(optimizer, DirichletOptimizer::MackayPeto) || alpha_m.is_empty() {
        let mu = alpha_m.iter().map(|&(_, a)| a).sum();
        return Ok(OptimizedMu {
            mu,
            alpha: alpha_m,
            converged: true,
            iterations: 0,
        });
    }

    let n_max = stats
        .docs_counts
        .iter()
        .map(|(&n, _)| n)
        .max()
        .unwrap_or(0);

    let mut converged = false;
    let mut iterations = 0;
    while !converged && iterations < max_iter {
        converged = true;
        let alpha: f64 = alpha_m.iter().map(|&(_, a)| a).sum();

        // S over the document-length histogram.
        let s = match optimizer {
            DirichletOptimizer::DigammaRecurrence => {
                let mut d = 0.0;
                let mut s = 0.0;
                for n in 1..=n_max {
                    let c_d = stats.docs_counts.get(&n).copied().unwrap_or(0);
                    d += 1.0 / (n as f64 - 1.0 + alpha);
                    s += c_d as f64 * d;
                }
                s
            }
            DirichletOptimizer::LogApproximation => {
                let mut s = 0.0;
                for (&n, &c_d) in stats.docs_counts.iter() {
                    if c_d != 0 {
                        s += c_d as f64
                            * (1.0 / alpha + (n as f64 + alpha - 0.5).ln() - (alpha + 0.5).ln());
                    }
                }
                s
            }
            DirichletOptimizer::MackayPeto => unreachable!("handled above"),
        };

        for (term, alpha_k) in alpha_m.iter_mut() {
            let term_stats = stats.terms.get(term).expect("alpha built from terms");

            let s_k = match optimizer {
                DirichletOptimizer::DigammaRecurrence => {
                    let n_k_max = term_stats
                        .doc_counts
                        .iter()
                        .map(|(&n, _)| n)
                        .max()
                        .unwrap_or(0);
                    let mut d = 0.0;
                    let mut s_k = 0.0;
                    for n in 1..=n_k_max {
                        let c_k_n = term_stats.doc_counts.get(&n).copied().unwrap_or(0);
                        d += 1.0 / (n as f64 - 1.0 + *alpha_k);
                        s_k += c_k_n as f64 * d;
                    }
                    s_k
                }
                DirichletOptimizer::LogApproximation => {
                    let mut s_k = 0.0;
                    for (&n, &c_k_n) in term_stats.doc_counts.iter() {
                        if c_k_n != 0 {
                            s_k += c_k_n as f64
                                * (1.0 / *alpha_k + (n as f64 + *alpha_k - 0.5).ln()
                                    - (*alpha_k + 0.5).ln());
                        }
                    }
                    s_k
                }
                DirichletOptimizer::MackayPeto => unreachable!("handled above"),
            };

            let next = *alpha_k * s_k / s;
            if (next - *alpha_k).abs() > eps {
                converged = false;
            }
            *alpha_k = next;
        }

        iterations += 1;
    }

    if !converged {
        warn!("dirichlet mu optimization did not converge within {max_iter} iterations");
    }

    let mu = alpha_m.iter().map(|&(_, a)| a).sum();
    Ok(OptimizedMu {
        mu,
        alpha: alpha_m,
        converged,
        iterations,
    })
}

impl DirichletPrior {
    /// Creates a Dirichlet-prior ranker whose `mu` is fit from the corpus
    /// behind `fwd` with the given estimator.
    pub fn with_optimized_mu(
        fwd: &ForwardIndex,
        optimizer: DirichletOptimizer,
        eps: f64,
        max_iter: usize,
    ) -> Result<Self> {
        let fit = optimize_mu(fwd, optimizer, eps, max_iter)?;
        Self::new(fit.mu as f32)
    }
}
