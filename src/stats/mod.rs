//! Evaluation statistics: regression metrics, online moments, and ranked
//! retrieval measures.

pub mod ir_eval;
pub mod metrics;
pub mod running_stats;

pub use ir_eval::IrEval;
pub use metrics::{Metrics, MetricsAccumulator};
pub use running_stats::RunningStats;
