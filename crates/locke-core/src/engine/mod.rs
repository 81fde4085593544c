//! ============================================================================
//! Engine Module - Gate rule evaluation
//! ============================================================================
//! Pure functions of (rules, context). Nothing here touches the network,
//! the cache or any shared state, so evaluating the same rule against the
//! same context always yields the same `GateEvaluation`.
//!
//! ## Usage
//! ```rust,ignore
//! use locke_core::{evaluate_rules, GateOperator};
//!
//! let verdict = evaluate_rules(&post.gate_rules, &context, GateOperator::And);
//! if !verdict.granted {
//!     render_locked(&verdict.reason, &verdict.missing_requirements);
//! }
//! ```
//! ============================================================================

mod compose;
mod rule;

pub use compose::{compose, evaluate_rules};
pub use rule::evaluate_rule;
