//! AND/OR composition of rule evaluations.

use crate::types::{GateEvaluation, GateOperator, GateRule, HoldingsContext};

use super::rule::evaluate_rule;

/// Evaluate every rule against the context and combine the results
pub fn evaluate_rules(
    rules: &[GateRule],
    context: &HoldingsContext,
    operator: GateOperator,
) -> GateEvaluation {
    let evaluations: Vec<GateEvaluation> = rules
        .iter()
        .map(|rule| evaluate_rule(rule, context))
        .collect();

    compose(&evaluations, operator)
}

/// Combine per-rule evaluations, given in rule order.
///
/// AND concatenates the missing requirements of every failing rule in
/// input order (no dedup). OR reports a generic reason when nothing passed.
pub fn compose(evaluations: &[GateEvaluation], operator: GateOperator) -> GateEvaluation {
    if evaluations.is_empty() {
        return GateEvaluation::granted("No requirements configured");
    }

    match operator {
        GateOperator::And => {
            if evaluations.iter().all(|e| e.granted) {
                return GateEvaluation::granted("All requirements met");
            }

            let missing = evaluations
                .iter()
                .filter(|e| !e.granted)
                .flat_map(|e| e.missing_requirements.iter().cloned())
                .collect();

            GateEvaluation::denied("Missing requirements", missing)
        }
        GateOperator::Or => {
            if evaluations.iter().any(|e| e.granted) {
                GateEvaluation::granted("At least one requirement met")
            } else {
                GateEvaluation::denied("No requirements met", Vec::new())
            }
        }
    }
}
