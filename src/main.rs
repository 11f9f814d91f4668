//! deployer-trust command line entry point.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deployer_trust::trust::rpc::is_valid_address;
use deployer_trust::trust::{RecentCheck, RecentChecks};
use deployer_trust::{ResultRecord, TokenCheckRequest, TrustCheckBuilder, TrustConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Look up who really deployed a Solana token and how far to trust them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Token mint address to check
    #[arg(value_name = "MINT")]
    mint: String,

    /// Developer Twitter handle, with or without the leading @
    #[arg(long)]
    dev: Option<String>,

    /// RPC endpoint, repeat for fallbacks (overrides SOLANA_RPC_URLS)
    #[arg(long)]
    rpc: Vec<String>,

    /// Enriched indexer API key (overrides HELIUS_API_KEY)
    #[arg(long)]
    indexer_key: Option<String>,

    /// Recent-checks feed file to update
    #[arg(long, value_name = "PATH")]
    feed: Option<PathBuf>,

    /// Print the full result record as JSON
    #[arg(long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    let mint = args.mint.trim().to_string();
    if !is_valid_address(&mint) {
        bail!("Invalid token mint address: {}", mint);
    }

    let mut request = TokenCheckRequest::new(mint);
    if let Some(handle) = args.dev.as_deref() {
        if !is_valid_handle(handle) {
            bail!("Invalid developer handle: {}", handle);
        }
        request = request.with_dev_handle(handle);
    }

    let config = TrustCheckBuilder::from_config(TrustConfig::from_env()?)
        .with_rpc_endpoints(args.rpc.clone())
        .with_indexer_api_key(args.indexer_key.clone())
        .build_config();
    let feed_capacity = config.recent_checks_capacity;

    info!("Checking token {}", request.mint);
    let aggregator = TrustCheckBuilder::from_config(config).build()?;
    let record = aggregator.check(&request).await?;

    if let Some(path) = args.feed.as_deref() {
        let mut feed = RecentChecks::load_or_new(path, feed_capacity)?;
        feed.insert(RecentCheck::from(&record));
        feed.save(path)?;
        info!("Recent-checks feed now holds {} entries", feed.len());
    }

    if args.json {
        let raw = serde_json::to_string_pretty(&record).context("Failed to encode result")?;
        println!("{}", raw);
    } else {
        print_summary(&record, args.verbose);
    }

    Ok(())
}

/// `^@?[A-Za-z0-9_]{1,15}$`
/// `--verbose` wins over `RUST_LOG`; without either, log at info.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("deployer_trust=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deployer_trust=info"))
    }
}

fn is_valid_handle(handle: &str) -> bool {
    let handle = handle.strip_prefix('@').unwrap_or(handle);
    (1..=15).contains(&handle.len())
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn print_summary(record: &ResultRecord, verbose: bool) {
    let name = record.token_name.as_deref().unwrap_or("unknown");
    let symbol = record.token_symbol.as_deref().unwrap_or("?");

    println!("\nToken:     {} ({})", name, symbol);
    println!("Mint:      {}", record.mint);
    if let Some(handle) = &record.dev_handle {
        println!("Dev:       @{}", handle);
    }

    println!(
        "\nDeployer:  {} [{}]",
        if record.deployer.address.is_empty() { "unknown" } else { record.deployer.address.as_str() },
        record.deployer.source.as_str()
    );
    if record.reported_creator != record.deployer.address && !record.reported_creator.is_empty() {
        println!("Reported:  {}", record.reported_creator);
    }

    let provenance = &record.provenance;
    match provenance.age_in_days {
        Some(days) => println!("Age:       {} days", days),
        None => println!("Age:       unknown"),
    }
    match &provenance.funded_by {
        Some(funder) => println!("Funded by: {}", funder),
        None => println!("Funded by: unknown"),
    }
    if verbose {
        if let Some(tx) = &provenance.funding_tx {
            println!("Funding tx: {}", tx);
        }
    }

    println!("\nOther tokens launched: {}", record.other_tokens.len());
    let shown = if verbose { record.other_tokens.len() } else { 5 };
    for token in record.other_tokens.iter().take(shown) {
        match token.market_cap {
            Some(cap) => println!("   • {} (mcap ${:.0})", token.mint, cap),
            None => println!("   • {}", token.mint),
        }
    }

    if let Some(holders) = record.total_holders {
        println!("\nHolders:   {}", holders);
    }
    if let Some(pct) = record.top_holder_pct {
        println!("Top holder: {:.2}%", pct);
    }
    if record.rugged {
        println!("\n🔴 Flagged as RUGGED by the report provider");
    }
    if !record.risks.is_empty() {
        println!("\nRisks:");
        for risk in &record.risks {
            println!("   • {} [{}]", risk.name, risk.level.as_deref().unwrap_or("-"));
        }
    }

    match record.score {
        Some(score) => println!("\nTrust score: {}/1000 ({})", score.value, score.tier),
        None => println!("\nTrust score: unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_rust_log() {
        assert_eq!(log_filter(true).to_string(), "deployer_trust=debug");
    }

    #[test]
    fn test_handle_validation() {
        assert!(is_valid_handle("@dev_123"));
        assert!(is_valid_handle("a"));
        assert!(is_valid_handle("abcdefghijklmno"));
        assert!(!is_valid_handle("abcdefghijklmnop"));
        assert!(!is_valid_handle("@"));
        assert!(!is_valid_handle("has space"));
        assert!(!is_valid_handle("@@double"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "deployer-trust",
            "So11111111111111111111111111111111111111112",
            "--dev",
            "@dev",
            "--rpc",
            "https://a.example",
            "--rpc",
            "https://b.example",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.rpc.len(), 2);
        assert_eq!(args.dev.as_deref(), Some("@dev"));
        assert!(args.json);
        assert!(args.feed.is_none());
    }
}
