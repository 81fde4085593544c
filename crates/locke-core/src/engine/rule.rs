//! Single-rule evaluation, one handler per rule variant.

use tracing::debug;

use crate::types::{
    Chain, GateEvaluation, GateRule, HolderTier, HoldingsContext, RuleKind,
};

/// Evaluate one gate rule against a holdings snapshot
pub fn evaluate_rule(rule: &GateRule, context: &HoldingsContext) -> GateEvaluation {
    let evaluation = match &rule.kind {
        RuleKind::TokenOwnership {
            token_address,
            chain,
        } => evaluate_token_ownership(token_address.as_deref(), *chain, context),

        RuleKind::MinimumBalance {
            token_address,
            chain,
            minimum_balance,
        } => evaluate_minimum_balance(token_address.as_deref(), *chain, *minimum_balance, context),

        RuleKind::HolderTier {
            token_address,
            chain,
            required_tier,
        } => evaluate_holder_tier(token_address.as_deref(), *chain, *required_tier, context),

        RuleKind::Combined { custom_logic } => evaluate_combined(custom_logic.as_ref()),

        RuleKind::Unknown => GateEvaluation::misconfigured("Unknown rule type"),
    };

    debug!(
        "Rule {} for {}: {:?} ({})",
        rule.id, context.wallet_address, evaluation.outcome, evaluation.reason
    );

    evaluation
}

fn holding_balance(
    context: &HoldingsContext,
    token_address: &str,
    chain: Chain,
) -> Option<(f64, HolderTier)> {
    context
        .find_holding(token_address, chain)
        .map(|h| (h.balance, h.tier.unwrap_or_default()))
}

fn evaluate_token_ownership(
    token_address: Option<&str>,
    chain: Option<Chain>,
    context: &HoldingsContext,
) -> GateEvaluation {
    let Some(token) = token_address else {
        return GateEvaluation::misconfigured("No token address specified");
    };
    let Some(chain) = chain else {
        return GateEvaluation::misconfigured("No chain specified");
    };

    match holding_balance(context, token, chain) {
        Some((balance, _)) if balance > 0.0 => {
            GateEvaluation::granted("Token ownership verified").with_user_balance(balance)
        }
        _ => GateEvaluation::denied(
            format!("You need to hold {}", token),
            vec![format!("Hold any amount of token {}", token)],
        ),
    }
}

fn evaluate_minimum_balance(
    token_address: Option<&str>,
    chain: Option<Chain>,
    minimum_balance: Option<f64>,
    context: &HoldingsContext,
) -> GateEvaluation {
    let (Some(token), Some(chain), Some(minimum)) = (token_address, chain, minimum_balance) else {
        return GateEvaluation::misconfigured("Invalid rule configuration");
    };

    let user_balance = holding_balance(context, token, chain)
        .map(|(balance, _)| balance)
        .unwrap_or(0.0);

    let evaluation = if user_balance < minimum {
        GateEvaluation::denied(
            "Insufficient balance",
            vec![format!(
                "Hold at least {} tokens (you have {})",
                minimum, user_balance
            )],
        )
    } else {
        GateEvaluation::granted("Minimum balance met")
    };

    evaluation
        .with_user_balance(user_balance)
        .with_required_balance(minimum)
}

fn evaluate_holder_tier(
    token_address: Option<&str>,
    chain: Option<Chain>,
    required_tier: Option<HolderTier>,
    context: &HoldingsContext,
) -> GateEvaluation {
    let (Some(token), Some(chain), Some(required)) = (token_address, chain, required_tier) else {
        return GateEvaluation::misconfigured("Invalid tier rule");
    };

    let Some((_, held)) = holding_balance(context, token, chain) else {
        return GateEvaluation::denied("Token not held", vec![format!("Hold {}", token)]);
    };

    if held < required {
        return GateEvaluation::denied(
            format!("Requires {} tier", required),
            vec![format!("Achieve {} tier (you are {})", required, held)],
        );
    }

    GateEvaluation::granted(format!("{} tier verified", held))
}

/// Custom boolean expressions have no defined grammar; any expression is
/// reported as unsupported rather than guessed at.
fn evaluate_combined(custom_logic: Option<&serde_json::Value>) -> GateEvaluation {
    match custom_logic {
        None | Some(serde_json::Value::Null) => {
            GateEvaluation::misconfigured("No custom logic defined")
        }
        Some(_) => GateEvaluation::unsupported("Custom rule evaluation not yet implemented"),
    }
}
