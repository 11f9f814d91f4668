//! Signal aggregation for one trust check.
//!
//! The token report and the base score are fetched concurrently, then the
//! deployer is resolved. Provenance and the deployer's other tokens follow
//! concurrently and everything is merged into a [`ResultRecord`]. When the
//! deployer could only be resolved to a platform or program address, wallet
//! lookups are skipped.

use crate::trust::classifier::AddressClassifier;
use crate::trust::gateway::ChainGateway;
use crate::trust::history::{tokens_from_report, DeployerTokenHistory};
use crate::trust::provenance::ProvenanceAnalyzer;
use crate::trust::report::{ScoreSource, TokenReportSource};
use crate::trust::resolver::DeployerResolver;
use crate::trust::scoring::TrustScore;
use crate::trust::types::{
    CreatedToken, DeployerSource, ProvenanceRecord, ResolvedDeployer, ResultRecord, TokenReport,
    TrustConfig,
};
use crate::types::TokenCheckRequest;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub struct SignalAggregator {
    classifier: Arc<AddressClassifier>,
    resolver: DeployerResolver,
    provenance: ProvenanceAnalyzer,
    history: DeployerTokenHistory,
    reports: Arc<dyn TokenReportSource>,
    scores: Arc<dyn ScoreSource>,
}

impl SignalAggregator {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        reports: Arc<dyn TokenReportSource>,
        scores: Arc<dyn ScoreSource>,
        config: &TrustConfig,
    ) -> Self {
        let classifier = Arc::new(AddressClassifier::new(&config.denylist));

        Self {
            resolver: DeployerResolver::new(gateway.clone(), classifier.clone(), config),
            classifier,
            provenance: ProvenanceAnalyzer::new(gateway.clone(), config),
            history: DeployerTokenHistory::new(gateway, config),
            reports,
            scores,
        }
    }

    pub fn resolver(&self) -> &DeployerResolver {
        &self.resolver
    }

    pub fn provenance(&self) -> &ProvenanceAnalyzer {
        &self.provenance
    }

    pub fn history(&self) -> &DeployerTokenHistory {
        &self.history
    }

    /// Run one check end to end.
    #[instrument(skip(self, request), fields(mint = %request.mint))]
    pub async fn check(&self, request: &TokenCheckRequest) -> Result<ResultRecord> {
        let started = Instant::now();
        let mint = request.mint.trim();

        let (report, score) = tokio::join!(self.reports.token_report(mint), self.scores.base_score(mint));
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Token report unavailable, continuing without it");
                TokenReport::default()
            }
        };
        let score = match score {
            Ok(base) => Some(TrustScore::from_base(base)),
            Err(e) => {
                warn!(error = %e, "Base score unavailable");
                None
            }
        };
        let reported_creator = report.creator.clone().unwrap_or_default();

        let deployer = self.resolver.resolve_deployer(mint, &reported_creator).await;

        let (provenance, other_tokens) = if self.classifier.is_known_non_user(&deployer.address) {
            debug!(deployer = %deployer.address, "Deployer is not a user wallet, skipping wallet lookups");
            (ProvenanceRecord::empty(deployer.address.as_str()), Vec::new())
        } else {
            let other_tokens = async {
                match report.creator_tokens.as_deref() {
                    Some(reported) if !reported.is_empty() && deployer.source == DeployerSource::DirectReport => {
                        tokens_from_report(reported, mint)
                    }
                    _ => self.history.list_other_tokens(&deployer.address, mint).await,
                }
            };
            tokio::join!(self.provenance.get_provenance(&deployer.address), other_tokens)
        };

        let record = assemble(request, mint, reported_creator, report, deployer, provenance, other_tokens, score);

        info!(
            deployer = %record.deployer.address,
            source = record.deployer.source.as_str(),
            other_tokens = record.other_tokens.len(),
            score = ?record.score.map(|s| s.value),
            "Check completed in {:?}",
            started.elapsed()
        );
        Ok(record)
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    request: &TokenCheckRequest,
    mint: &str,
    reported_creator: String,
    report: TokenReport,
    deployer: ResolvedDeployer,
    provenance: ProvenanceRecord,
    other_tokens: Vec<CreatedToken>,
    score: Option<TrustScore>,
) -> ResultRecord {
    let top_holder_pct = report
        .top_holders
        .as_ref()
        .and_then(|holders| holders.iter().filter_map(|h| h.pct).reduce(f64::max));
    let (token_name, token_symbol) = report
        .token_meta
        .map(|meta| (meta.name, meta.symbol))
        .unwrap_or_default();

    ResultRecord {
        mint: mint.to_string(),
        token_name,
        token_symbol,
        dev_handle: request.dev_handle.clone(),
        reported_creator,
        deployer,
        provenance,
        other_tokens,
        risks: report.risks.unwrap_or_default(),
        rugged: report.rugged.unwrap_or(false),
        total_holders: report.total_holders,
        top_holder_pct,
        price: report.price,
        score,
        checked_at: Utc::now().timestamp(),
    }
}
