//! Typed configuration for rankers, feedback, indexing, and runtime
//! tuning.
//!
//! Parsing configuration *files* is the caller's concern; this module only
//! defines the option surface: method enums with string forms, parameter
//! structs carrying the documented defaults, and constructors that validate
//! and build the corresponding components. Unknown method strings and
//! out-of-range tuning values are rejected with
//! [`Error::BadArgument`](crate::error::Error::BadArgument).

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::feedback::{Feedback, Ide, IdeDecHi, Rocchio};
use crate::hashing::{check_load_factor, check_resize_ratio};
use crate::index::ForwardIndex;
use crate::ranking::dirichlet_opt::DirichletOptimizer;
use crate::ranking::{AbsoluteDiscount, Bm25, DirichletPrior, JelinekMercer, Ranker};

/// The available ranking methods (`ranker.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankerMethod {
    Bm25,
    DirichletPrior,
    DirichletDigammaRec,
    DirichletLogApprox,
    DirichletMackayPeto,
    JelinekMercer,
    AbsoluteDiscount,
}

impl FromStr for RankerMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bm25" => Ok(Self::Bm25),
            "dirichlet-prior" => Ok(Self::DirichletPrior),
            "dirichlet-digamma-rec" => Ok(Self::DirichletDigammaRec),
            "dirichlet-log-approx" => Ok(Self::DirichletLogApprox),
            "dirichlet-mackay-peto" => Ok(Self::DirichletMackayPeto),
            "jelinek-mercer" => Ok(Self::JelinekMercer),
            "absolute-discount" => Ok(Self::AbsoluteDiscount),
            other => Err(Error::BadArgument(format!(
                "unknown ranker method \"{other}\""
            ))),
        }
    }
}

/// Ranker selection and parameters.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub method: RankerMethod,
    /// BM25 `k1` (term-frequency saturation).
    pub k1: f32,
    /// BM25 `b` (length normalization).
    pub b: f32,
    /// BM25 `k3` (query-term-frequency saturation).
    pub k3: f32,
    /// Dirichlet concentration.
    pub mu: f32,
    /// Jelinek-Mercer interpolation weight.
    pub lambda: f32,
    /// Absolute-discounting discount.
    pub delta: f32,
    /// Convergence threshold for the `mu` optimizers.
    pub opt_eps: f64,
    /// Iteration cap for the `mu` optimizers.
    pub opt_max_iter: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            method: RankerMethod::Bm25,
            k1: Bm25::DEFAULT_K1,
            b: Bm25::DEFAULT_B,
            k3: Bm25::DEFAULT_K3,
            mu: DirichletPrior::DEFAULT_MU,
            lambda: JelinekMercer::DEFAULT_LAMBDA,
            delta: AbsoluteDiscount::DEFAULT_DELTA,
            opt_eps: 1e-6,
            opt_max_iter: 10_000,
        }
    }
}

impl RankerConfig {
    /// Builds the configured ranker.
    ///
    /// The `dirichlet-*` optimizer methods fit `mu` from corpus statistics
    /// and therefore need the forward index; passing `None` for them is a
    /// [`Error::BadArgument`](crate::error::Error::BadArgument).
    pub fn build(&self, fwd: Option<&ForwardIndex>) -> Result<Box<dyn Ranker>> {
        let optimizer = match self.method {
            RankerMethod::Bm25 => return Ok(Box::new(Bm25::new(self.k1, self.b, self.k3)?)),
            RankerMethod::DirichletPrior => return Ok(Box::new(DirichletPrior::new(self.mu)?)),
            RankerMethod::JelinekMercer => {
                return Ok(Box::new(JelinekMercer::new(self.lambda)?));
            }
            RankerMethod::AbsoluteDiscount => {
                return Ok(Box::new(AbsoluteDiscount::new(self.delta)?));
            }
            RankerMethod::DirichletDigammaRec => DirichletOptimizer::DigammaRecurrence,
            RankerMethod::DirichletLogApprox => DirichletOptimizer::LogApproximation,
            RankerMethod::DirichletMackayPeto => DirichletOptimizer::MackayPeto,
        };

        let fwd = fwd.ok_or_else(|| {
            Error::BadArgument(
                "dirichlet mu optimization needs the forward index".to_string(),
            )
        })?;
        Ok(Box::new(DirichletPrior::with_optimized_mu(
            fwd,
            optimizer,
            self.opt_eps,
            self.opt_max_iter,
        )?))
    }
}

/// The available feedback methods (`feedback.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackMethod {
    Rocchio,
    Ide,
    IdeDecHi,
}

impl FromStr for FeedbackMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rocchio" => Ok(Self::Rocchio),
            "ide" => Ok(Self::Ide),
            "ide-dec-hi" => Ok(Self::IdeDecHi),
            other => Err(Error::BadArgument(format!(
                "unknown feedback method \"{other}\""
            ))),
        }
    }
}

/// Feedback selection and parameters (all nonnegative).
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub method: FeedbackMethod,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            method: FeedbackMethod::Rocchio,
            a: Rocchio::DEFAULT_A,
            b: Rocchio::DEFAULT_B,
            c: Rocchio::DEFAULT_C,
        }
    }
}

impl FeedbackConfig {
    /// Builds the configured feedback operator.
    pub fn build(&self) -> Result<Box<dyn Feedback>> {
        match self.method {
            FeedbackMethod::Rocchio => Ok(Box::new(Rocchio::new(self.a, self.b, self.c)?)),
            FeedbackMethod::Ide => Ok(Box::new(Ide::new(self.a, self.b, self.c)?)),
            FeedbackMethod::IdeDecHi => Ok(Box::new(IdeDecHi::new(self.a, self.b, self.c)?)),
        }
    }
}

/// Index-construction tuning (`indexer.*`).
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Accumulator flush threshold in bytes, shared across the worker
    /// pool.
    pub ram_budget_bytes: usize,
    /// Tokenizer worker threads.
    pub num_threads: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            ram_budget_bytes: 1 << 30,
            num_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Runtime cache sizing (`cache.*`).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries per shard before the double-LRU barrels shift.
    pub max_size: u64,
    /// Number of independently synchronized shards.
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 8192,
            shards: 8,
        }
    }
}

/// Hash-table tuning (`hashtable.*`).
#[derive(Debug, Clone)]
pub struct HashTableConfig {
    /// Load-factor cap, in `(0, 1)`.
    pub max_load_factor: f64,
    /// Capacity growth multiplier, greater than 1.
    pub resize_ratio: f64,
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            max_load_factor: crate::hashing::DEFAULT_MAX_LOAD_FACTOR,
            resize_ratio: crate::hashing::DEFAULT_RESIZE_RATIO,
        }
    }
}

impl HashTableConfig {
    /// Validates both knobs.
    pub fn validate(&self) -> Result<()> {
        check_load_factor(self.max_load_factor)?;
        check_resize_ratio(self.resize_ratio)?;
        Ok(())
    }
}
