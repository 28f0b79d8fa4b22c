use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the index, codec, and ranking layers.
///
/// The codec and I/O layers return these to the caller without logging.
/// A missing postings stream for a query term is *not* an error; the term
/// is silently dropped during ranking.
#[derive(Debug, Error)]
pub enum Error {
    /// On-disk data failed to decode: truncated packed value, lexicon
    /// offset out of range, schema mismatch, or an invalid chunk record.
    #[error("corrupt index data: {0}")]
    Corrupt(String),

    /// Underlying file or memory-map failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An accumulator flush could not complete within the configured
    /// disk/RAM budget.
    #[error("out of budget: {0}")]
    OutOfBudget(String),

    /// An internal invariant was violated (e.g. a probe sequence that
    /// cannot terminate because the load-factor cap was breached).
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// A caller-supplied parameter was rejected: negative weight, unknown
    /// configuration value, or an out-of-range tuning knob.
    #[error("bad argument: {0}")]
    BadArgument(String),
}
