//! Tests for wallet provenance analysis

mod common;

use common::*;
use deployer_trust::trust::provenance::{age_in_days, SECONDS_PER_DAY};
use deployer_trust::trust::{ProvenanceAnalyzer, TrustConfig};
use std::sync::Arc;

const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const FUNDER: &str = "Funder111XyZ9kQ2mN7pR4sT6vW8yB3cD5eF7gH9jK2";
const OTHER: &str = "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH";

const NOW: i64 = 1_750_000_000;
const ONE_SOL: u64 = 1_000_000_000;

fn analyzer(gateway: Arc<StubGateway>) -> ProvenanceAnalyzer {
    ProvenanceAnalyzer::new(gateway, &TrustConfig::default())
}

#[tokio::test]
async fn test_wallet_funded_100_days_ago_via_rpc() {
    let funded_at = NOW - 100 * SECONDS_PER_DAY;
    let funding_tx = raw_transaction(
        "fundsig",
        funded_at,
        &[(FUNDER, true), (WALLET, false), (SYSTEM_PROGRAM, false)],
        vec![system_transfer(FUNDER, WALLET, 5 * ONE_SOL)],
        vec![],
        &[],
    );
    let gateway = Arc::new(
        StubGateway::new()
            .with_signatures(WALLET, vec![signature("fundsig", funded_at)])
            .with_transaction(funding_tx),
    );

    let record = analyzer(gateway).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.wallet_address, WALLET);
    assert_eq!(record.age_in_days, Some(100));
    assert_eq!(record.funded_by.as_deref(), Some(FUNDER));
    assert_eq!(record.funding_tx.as_deref(), Some("fundsig"));
}

#[tokio::test]
async fn test_wallet_funded_100_days_ago_via_indexer() {
    let funded_at = NOW - 100 * SECONDS_PER_DAY;
    let mut funding = indexed("fundsig", funded_at, FUNDER);
    funding.native_transfers = vec![native_transfer(FUNDER, WALLET, 5 * ONE_SOL)];
    let mut spend = indexed("spend", NOW - 3 * SECONDS_PER_DAY, WALLET);
    spend.native_transfers = vec![native_transfer(WALLET, OTHER, ONE_SOL)];

    let gateway = Arc::new(StubGateway::new().with_indexed(WALLET, vec![spend, funding]));

    let record = analyzer(gateway.clone()).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.age_in_days, Some(100));
    assert_eq!(record.funded_by.as_deref(), Some(FUNDER));
    assert_eq!(record.funding_tx.as_deref(), Some("fundsig"));
    assert_eq!(gateway.signature_calls(), 0);
}

#[tokio::test]
async fn test_indexer_skips_dust_transfers() {
    let mut dust = indexed("dust", NOW - 50 * SECONDS_PER_DAY, OTHER);
    dust.native_transfers = vec![native_transfer(OTHER, WALLET, 1_000)];
    let mut funding = indexed("fundsig", NOW - 40 * SECONDS_PER_DAY, FUNDER);
    funding.native_transfers = vec![native_transfer(FUNDER, WALLET, 2 * ONE_SOL)];

    let gateway = Arc::new(StubGateway::new().with_indexed(WALLET, vec![funding, dust]));

    let record = analyzer(gateway).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.age_in_days, Some(50));
    assert_eq!(record.funded_by.as_deref(), Some(FUNDER));
    assert_eq!(record.funding_tx.as_deref(), Some("fundsig"));
}

#[tokio::test]
async fn test_empty_indexer_history_falls_back_to_rpc() {
    let funded_at = NOW - 7 * SECONDS_PER_DAY;
    let funding_tx = raw_transaction(
        "fundsig",
        funded_at,
        &[(FUNDER, true), (WALLET, false)],
        vec![],
        vec![system_transfer(FUNDER, WALLET, ONE_SOL)],
        &[],
    );
    let gateway = Arc::new(
        StubGateway::new()
            .with_indexer()
            .with_signatures(WALLET, vec![signature("fundsig", funded_at)])
            .with_transaction(funding_tx),
    );

    let record = analyzer(gateway.clone()).get_provenance_at(WALLET, NOW).await;

    assert_eq!(gateway.indexer_calls(), 1);
    assert!(gateway.signature_calls() > 0);
    assert_eq!(record.age_in_days, Some(7));
    assert_eq!(record.funded_by.as_deref(), Some(FUNDER));
}

#[tokio::test]
async fn test_unbounded_history_stops_at_batch_cap() {
    let gateway = Arc::new(StubGateway::new().endless());
    let config = TrustConfig::default();

    let record = ProvenanceAnalyzer::new(gateway.clone(), &config)
        .get_provenance_at(WALLET, NOW)
        .await;

    assert_eq!(gateway.signature_calls(), config.max_signature_batches);
    assert!(record.age_in_days.is_some());
    assert!(record.funded_by.is_none());
    assert!(record.funding_tx.is_none());
}

#[tokio::test]
async fn test_no_history_and_unreachable_backends() {
    let empty = analyzer(Arc::new(StubGateway::new())).get_provenance_at(WALLET, NOW).await;
    assert_eq!(empty.wallet_address, WALLET);
    assert!(empty.age_in_days.is_none());
    assert!(empty.funded_by.is_none());

    let failing = analyzer(Arc::new(StubGateway::new().with_indexer().failing()))
        .get_provenance_at(WALLET, NOW)
        .await;
    assert!(failing.age_in_days.is_none());
    assert!(failing.funded_by.is_none());

    let blank = analyzer(Arc::new(StubGateway::new())).get_provenance_at("", NOW).await;
    assert!(blank.funded_by.is_none());
}

/// Documented approximation: when two accounts lose roughly what the wallet
/// gained, the first one in account-key order is reported.
#[tokio::test]
async fn test_balance_delta_takes_first_match_in_key_order() {
    let funded_at = NOW - 10 * SECONDS_PER_DAY;
    let mut tx = raw_transaction(
        "swap",
        funded_at,
        &[(OTHER, true), (FUNDER, false), (WALLET, false)],
        vec![],
        vec![],
        &[],
    );
    if let Some(meta) = tx.meta.as_mut() {
        meta.pre_balances = vec![10 * ONE_SOL, 10 * ONE_SOL, 0];
        meta.post_balances = vec![8 * ONE_SOL - 5_000, 8 * ONE_SOL, 2 * ONE_SOL];
    }
    let gateway = Arc::new(
        StubGateway::new()
            .with_signatures(WALLET, vec![signature("swap", funded_at)])
            .with_transaction(tx),
    );

    let record = analyzer(gateway).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.funded_by.as_deref(), Some(OTHER));
    assert_eq!(record.funding_tx.as_deref(), Some("swap"));
}

#[tokio::test]
async fn test_fee_payer_is_last_resort_funder() {
    let created_at = NOW - 2 * SECONDS_PER_DAY;
    let tx = raw_transaction("init", created_at, &[(OTHER, true), (WALLET, false)], vec![], vec![], &[]);
    let gateway = Arc::new(
        StubGateway::new()
            .with_signatures(WALLET, vec![signature("init", created_at)])
            .with_transaction(tx),
    );

    let record = analyzer(gateway).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.age_in_days, Some(2));
    assert_eq!(record.funded_by.as_deref(), Some(OTHER));
}

#[tokio::test]
async fn test_age_is_monotonic_in_now() {
    let oldest = NOW - 30 * SECONDS_PER_DAY - 1234;
    let gateway = Arc::new(StubGateway::new().with_signatures(WALLET, vec![signature("first", oldest)]));
    let analyzer = analyzer(gateway);

    let checkpoints = [NOW, NOW + 1, NOW + SECONDS_PER_DAY - 1, NOW + 3 * SECONDS_PER_DAY, NOW + 400 * SECONDS_PER_DAY];
    let mut previous: Option<i64> = None;
    for now in checkpoints {
        let age = analyzer.get_provenance_at(WALLET, now).await.age_in_days.unwrap();
        assert_eq!(age, age_in_days(oldest, now));
        if let Some(previous) = previous {
            assert!(age >= previous);
        }
        previous = Some(age);
    }

    for (t1, t2) in [(NOW, NOW + 10 * SECONDS_PER_DAY), (NOW - 5, NOW + 2 * SECONDS_PER_DAY - 5)] {
        let diff = age_in_days(oldest, t2) - age_in_days(oldest, t1);
        assert_eq!(diff, (t2 - t1) / SECONDS_PER_DAY);
    }
}

#[tokio::test]
async fn test_untimestamped_indexer_entry_does_not_hide_age() {
    let mut funding = indexed("fundsig", NOW - 12 * SECONDS_PER_DAY, FUNDER);
    funding.native_transfers = vec![native_transfer(FUNDER, WALLET, ONE_SOL)];
    let undated = indexed("undated", 0, OTHER);

    let gateway = Arc::new(StubGateway::new().with_indexed(WALLET, vec![undated, funding]));

    let record = analyzer(gateway).get_provenance_at(WALLET, NOW).await;

    assert_eq!(record.age_in_days, Some(12));
    assert_eq!(record.funded_by.as_deref(), Some(FUNDER));
    assert_eq!(record.funding_tx.as_deref(), Some("fundsig"));
}
