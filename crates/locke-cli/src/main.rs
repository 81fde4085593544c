// ============================================================================
// locke — CLI for the Locke token-gating engine
// ============================================================================
// Usage:
//   locke tier 250000 [--rank 42] [--required whale]  Classify a balance
//   locke holdings --wallet W [--chain solana]        Fetch a holdings context
//   locke evaluate --rules rules.json --wallet W      Evaluate a rule file
//   locke evaluate --rules rules.json --context ctx.json --operator or
//   locke metrics --token T [--chain solana]          Show token metrics
//
// Reads BAGS_API_URL / BAGS_API_KEY / LOCKE_* from the environment or .env
// ============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use locke_core::{
    BagsClient, BalanceProvider, Chain, ContextRefresher, GateOperator, GateRule, GateSession,
    HolderTier, HoldingsContext, LockeConfig, TierProgress,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Locke token-gating inspection tool
#[derive(Parser)]
#[command(name = "locke", version, about = "Evaluate token-gated access rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a balance (and optional holder rank) into a holder tier
    Tier {
        balance: f64,

        /// Holder rank reported by the indexer (1 = largest holder)
        #[arg(long)]
        rank: Option<u32>,

        /// Check the result against a required tier: holder, whale, elite
        #[arg(long)]
        required: Option<String>,
    },

    /// Fetch and classify a wallet's holdings
    Holdings {
        #[arg(long)]
        wallet: String,

        /// solana or polkadot
        #[arg(long, default_value = "solana")]
        chain: String,
    },

    /// Evaluate a JSON rule file against a wallet or a saved context
    Evaluate {
        /// JSON array of gate rules
        #[arg(long)]
        rules: PathBuf,

        /// Wallet to fetch holdings for
        #[arg(long, conflicts_with = "context", required_unless_present = "context")]
        wallet: Option<String>,

        /// Saved holdings context (as printed by `locke holdings`)
        #[arg(long)]
        context: Option<PathBuf>,

        #[arg(long, default_value = "solana")]
        chain: String,

        /// How rules combine: and, or
        #[arg(long, default_value = "and")]
        operator: String,
    },

    /// Show market metrics for a token
    Metrics {
        #[arg(long)]
        token: String,

        #[arg(long, default_value = "solana")]
        chain: String,
    },
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("locke=info,locke_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_chain(s: &str) -> Result<Chain> {
    Ok(s.parse::<Chain>()?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} file {}", what, path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal
        if !e.not_found() {
            eprintln!("Warning: Could not load .env file: {}", e);
        }
    }
    init_logging();

    let cli = Cli::parse();
    let config = LockeConfig::from_env()?;

    match cli.command {
        Commands::Tier {
            balance,
            rank,
            required,
        } => {
            let required = required.as_deref().map(str::parse::<HolderTier>).transpose()?;
            cmd_tier(&config, balance, rank, required)
        }
        Commands::Holdings { wallet, chain } => {
            cmd_holdings(&config, &wallet, parse_chain(&chain)?).await
        }
        Commands::Evaluate {
            rules,
            wallet,
            context,
            chain,
            operator,
        } => {
            let operator: GateOperator = operator.parse()?;
            cmd_evaluate(&config, &rules, wallet, context, parse_chain(&chain)?, operator).await
        }
        Commands::Metrics { token, chain } => {
            cmd_metrics(&config, &token, parse_chain(&chain)?).await
        }
    }
}

fn cmd_tier(
    config: &LockeConfig,
    balance: f64,
    rank: Option<u32>,
    required: Option<HolderTier>,
) -> Result<()> {
    if balance < 0.0 || !balance.is_finite() {
        anyhow::bail!("Balance must be a non-negative number, got {}", balance);
    }

    let tier = config.tier_policy.classify(balance, rank);
    let progress = TierProgress::new(balance, &config.tier_policy);

    println!("Balance:  {}", progress.balance_formatted);
    if let Some(rank) = rank {
        println!("Rank:     #{}", rank);
    }
    println!("Tier:     {}", tier);
    match (progress.next_tier, progress.tokens_to_next_tier) {
        (Some(next), Some(needed)) if next > tier => {
            println!("Next:     {} (needs more than {:.2} additional tokens)", next, needed);
        }
        _ => println!("Next:     -"),
    }
    if let Some(required) = required {
        let verdict = if tier >= required { "meets" } else { "below" };
        println!("Required: {} ({})", required, verdict);
    }

    Ok(())
}

fn refresher_for(config: &LockeConfig) -> Result<ContextRefresher> {
    let client = BagsClient::from_config(config)?;
    Ok(ContextRefresher::with_config(Arc::new(client), config))
}

async fn cmd_holdings(config: &LockeConfig, wallet: &str, chain: Chain) -> Result<()> {
    chain.validate_address(wallet)?;

    let report = refresher_for(config)?.refresh(wallet, chain).await;
    if report.is_degraded() {
        warn!("Provider unavailable - holdings are empty: {:?}", report.status);
    }

    println!("{}", serde_json::to_string_pretty(&report.context)?);
    Ok(())
}

async fn cmd_evaluate(
    config: &LockeConfig,
    rules_path: &Path,
    wallet: Option<String>,
    context_path: Option<PathBuf>,
    chain: Chain,
    operator: GateOperator,
) -> Result<()> {
    let rules: Vec<GateRule> = read_json(rules_path, "rules")?;
    info!("Loaded {} rules from {}", rules.len(), rules_path.display());

    let session = GateSession::new(refresher_for(config)?);

    match (wallet, context_path) {
        (_, Some(path)) => {
            let context: HoldingsContext = read_json(&path, "context")?;
            session.set_context(context).await;
        }
        (Some(wallet), None) => {
            chain.validate_address(&wallet)?;
            let report = session.refresh(&wallet, chain).await;
            if report.is_degraded() {
                warn!("Provider unavailable - evaluating against empty holdings");
            }
        }
        (None, None) => anyhow::bail!("Either --wallet or --context is required"),
    }

    let evaluation = session.evaluate(&rules, operator).await;
    println!("{}", serde_json::to_string_pretty(&evaluation)?);

    Ok(())
}

async fn cmd_metrics(config: &LockeConfig, token: &str, chain: Chain) -> Result<()> {
    let client = BagsClient::from_config(config)?;

    match client.get_token_metrics(token, chain).await {
        Some(metrics) => println!("{}", serde_json::to_string_pretty(&metrics)?),
        None => println!("No metrics available for {} on {}", token, chain),
    }

    Ok(())
}
