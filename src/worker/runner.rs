//! Exchange worker: Request → Offer → Await → Deliver → Report.
//!
//! One request is carried from offer to report before the next is looked at.
//! Nothing here runs concurrently, and every wait is a `tokio::time::sleep`.

use super::outcome::RequestOutcome;
use super::policy::WorkerSettings;
use crate::card::AgentProfile;
use crate::config::AgentConfig;
use crate::error::{ApiError, TransportError};
use crate::exchange::{
    extract_payload, ExchangeClient, ExchangeRequest, ExchangeTransport, HttpExchangeTransport,
    OfferState, OfferStatus, ReportOutcome,
};
use crate::handler::{Handler, HandlerContext, HandlerEnv, HandlerRegistry};
use crate::memory::MemoryStore;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

pub struct ExchangeWorker {
    client: ExchangeClient,
    profile: AgentProfile,
    domains: Vec<String>,
    handler: Arc<dyn Handler>,
    memory: MemoryStore,
    env: HandlerEnv,
    settings: WorkerSettings,
    /// Requests this process has bid on that were still open at the last
    /// poll. Ids the exchange stops listing are dropped, so the set stays
    /// bounded by the size of one poll.
    offered: HashSet<String>,
}

impl ExchangeWorker {
    pub fn new(
        transport: Arc<dyn ExchangeTransport>,
        profile: AgentProfile,
        handler: Arc<dyn Handler>,
        memory: MemoryStore,
        env: HandlerEnv,
        settings: WorkerSettings,
    ) -> Self {
        let client = ExchangeClient::new(transport, profile.handle.clone());
        let domains = profile.polling_domains();
        Self {
            client,
            profile,
            domains,
            handler,
            memory,
            env,
            settings,
            offered: HashSet::new(),
        }
    }

    /// Assemble a worker from configuration: load the card, resolve the
    /// handler by name, open the memory store and build the HTTP transport.
    pub fn from_config(config: &AgentConfig, registry: &HandlerRegistry) -> Result<Self, ApiError> {
        config.exchange.require_api_key()?;
        let profile = AgentProfile::load(&config.worker.card_path)?;
        if profile.polling_domains().is_empty() {
            warn!(handle = %profile.handle, "Agent card declares no service domains");
            return Err(ApiError::Validation(format!(
                "Agent card {} declares no service domains; refusing to bid on every open request",
                config.worker.card_path.display()
            )));
        }
        let handler = registry.get_or_error(&config.worker.handler)?;
        let memory = MemoryStore::open(&config.worker.memory_path)?;
        let transport = HttpExchangeTransport::from_config(&config.exchange)?;

        info!(
            handle = %profile.handle,
            handler = %config.worker.handler,
            domains = ?profile.polling_domains(),
            "Exchange worker configured"
        );
        Ok(Self::new(
            Arc::new(transport),
            profile,
            handler,
            memory,
            HandlerEnv::new(config.worker.env.clone()),
            WorkerSettings::from(&config.worker),
        ))
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Number of open requests this worker has already bid on.
    pub fn offered_count(&self) -> usize {
        self.offered.len()
    }

    /// Open requests in the agent's domains.
    pub async fn poll(&self) -> Result<Vec<ExchangeRequest>, TransportError> {
        self.client.poll_requests(&self.domains).await
    }

    /// One poll, then each request not yet offered on, in order, up to `limit`.
    pub async fn run_cycle(
        &mut self,
        limit: Option<usize>,
    ) -> Result<Vec<RequestOutcome>, TransportError> {
        let requests = self.poll().await?;
        debug!(count = requests.len(), "Polled exchange requests");

        let open: HashSet<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        self.offered.retain(|id| open.contains(id.as_str()));

        let mut outcomes = Vec::new();
        for request in requests {
            if limit.map_or(false, |max| outcomes.len() >= max) {
                break;
            }
            if !self.offered.insert(request.id.clone()) {
                debug!(request_id = %request.id, "Already offered on request, skipping");
                continue;
            }
            outcomes.push(self.process(&request).await);
        }
        Ok(outcomes)
    }

    /// Drive the poll loop. Returns only in run-once mode.
    ///
    /// In continuous mode poll failures are logged and retried after a
    /// pause; in run-once mode they are returned.
    pub async fn run(&mut self) -> Result<Vec<RequestOutcome>, TransportError> {
        info!(
            handle = %self.profile.handle,
            run_once = self.settings.run_once,
            "Exchange worker starting"
        );
        loop {
            let limit = self.settings.run_once.then_some(1);
            match self.run_cycle(limit).await {
                Ok(outcomes) if self.settings.run_once => return Ok(outcomes),
                Ok(outcomes) if outcomes.is_empty() => sleep(self.settings.poll_interval).await,
                Ok(_) => {}
                Err(e) if self.settings.run_once => return Err(e),
                Err(e) => {
                    let backoff = self.settings.error_backoff();
                    warn!(error = %e, backoff_ms = backoff.as_millis() as u64, "Poll failed, retrying");
                    sleep(backoff).await;
                }
            }
        }
    }

    /// Carry one request from offer to report. Never fails; every exit is an
    /// outcome.
    pub async fn process(&self, request: &ExchangeRequest) -> RequestOutcome {
        let started = Instant::now();
        let request_id = request.id.clone();
        info!(request_id = %request_id, "Submitting offer");

        let receipt = match self
            .client
            .submit_offer(&request_id, &self.settings.pricing)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Offer submission failed");
                return RequestOutcome::OfferFailed {
                    request_id,
                    error: e.to_string(),
                };
            }
        };

        let status = match (&receipt.tx_id, &receipt.offer_id) {
            (Some(tx_id), _) => {
                debug!(request_id = %request_id, tx_id = %tx_id, "Offer accepted immediately");
                OfferStatus {
                    state: OfferState::Accepted,
                    tx_id: Some(tx_id.clone()),
                }
            }
            (None, Some(offer_id)) => self.wait_for_acceptance(offer_id).await,
            (None, None) => {
                warn!(request_id = %request_id, "Offer response carried no offer id");
                return RequestOutcome::OfferFailed {
                    request_id,
                    error: "offer response carried no offer id".to_string(),
                };
            }
        };

        if !status.is_accepted() {
            info!(request_id = %request_id, state = %status.state, "Offer not accepted");
            return RequestOutcome::NotAccepted {
                request_id,
                state: status.state,
            };
        }

        let tx_id = match status.tx_id.or_else(|| receipt.tx_id.clone()) {
            Some(tx_id) => tx_id,
            None => {
                warn!(request_id = %request_id, "Offer accepted without a transaction id, skipping delivery");
                return RequestOutcome::MissingTransaction { request_id };
            }
        };

        let ctx = HandlerContext {
            request: request.clone(),
            tx_id: tx_id.clone(),
            memory: self.memory.clone(),
            env: self.env.clone(),
        };
        let payload = extract_payload(&request.raw);
        let offer_id = receipt.offer_id.as_deref();

        info!(request_id = %request_id, tx_id = %tx_id, "Executing handler");
        let result = match self.handler.execute(payload, &ctx).await {
            Ok(result) => result,
            Err(e) => {
                let error = format!("{:#}", e);
                error!(request_id = %request_id, tx_id = %tx_id, error = %error, "Handler failed");
                let reason = format!("handler failed: {}", error);
                self.report(&tx_id, ReportOutcome::Failure { reason }, &request_id, offer_id, started)
                    .await;
                return RequestOutcome::HandlerFailed {
                    request_id,
                    tx_id,
                    error,
                };
            }
        };

        if let Err(e) = self.client.deliver(&tx_id, &result).await {
            error!(request_id = %request_id, tx_id = %tx_id, error = %e, "Delivery failed");
            let reason = format!("delivery failed: {}", e);
            self.report(&tx_id, ReportOutcome::Failure { reason }, &request_id, offer_id, started)
                .await;
            return RequestOutcome::DeliveryFailed {
                request_id,
                tx_id,
                error: e.to_string(),
            };
        }

        let outcome = ReportOutcome::Success {
            rating: self.settings.rating,
        };
        self.report(&tx_id, outcome, &request_id, offer_id, started)
            .await;
        info!(request_id = %request_id, tx_id = %tx_id, "Request completed");
        RequestOutcome::Completed { request_id, tx_id }
    }

    /// Poll the offer until it reaches a terminal state or the policy runs
    /// out. On exhaustion the last status seen is returned, which is never
    /// accepted.
    pub async fn wait_for_acceptance(&self, offer_id: &str) -> OfferStatus {
        let policy = self.settings.acceptance;
        let mut last = OfferStatus::pending();

        for attempt in 1..=policy.max_attempts {
            sleep(policy.interval).await;
            match self.client.offer_status(offer_id).await {
                Ok(status) => {
                    debug!(offer_id, attempt, state = %status.state, "Offer status");
                    last = status;
                    if last.state.is_terminal() {
                        return last;
                    }
                }
                Err(e) => {
                    warn!(offer_id, attempt, error = %e, "Offer status check failed");
                }
            }
        }

        info!(
            offer_id,
            attempts = policy.max_attempts,
            state = %last.state,
            "Gave up waiting for acceptance"
        );
        last
    }

    /// Best effort: a failed report is logged and otherwise ignored.
    async fn report(
        &self,
        tx_id: &str,
        outcome: ReportOutcome,
        request_id: &str,
        offer_id: Option<&str>,
        started: Instant,
    ) {
        let meta = report_meta(request_id, offer_id, started);
        if let Err(e) = self.client.report(tx_id, &outcome, meta).await {
            warn!(tx_id, outcome = outcome.as_str(), error = %e, "Failed to report outcome");
        }
    }
}

fn report_meta(request_id: &str, offer_id: Option<&str>, started: Instant) -> Value {
    json!({
        "request_id": request_id,
        "offer_id": offer_id,
        "duration_ms": started.elapsed().as_millis() as u64,
        "completed_at": Utc::now().to_rfc3339(),
    })
}
