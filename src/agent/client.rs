// src/agent/client.rs
use crate::agent::check::{parse_listing, AgentReply, Check};
use crate::config::Config;
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

pub const AGENT_UNAVAILABLE: &str = "Consul Agent unavailable";
pub const AGENT_PARSE_FAILURE: &str = "Failed to parse the response from the Consul Agent";
pub const AGENT_ERROR_STATUS: &str = "Consul Agent returned an error";

/// Anything that can hand over the current check listing.
#[async_trait]
pub trait CheckSource: Send + Sync {
    async fn fetch_checks(&self) -> AgentReply;

    fn name(&self) -> &str;
}

/// Reads `/v1/agent/checks` from the local Consul agent.
pub struct AgentClient {
    checks_url: Url,
    client: Client,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AgentClient {
    pub fn new(config: &Config, metrics: Option<Arc<MetricsCollector>>) -> Result<Self> {
        let checks_url = config.agent_checks_url()?;
        let client = Client::builder()
            .timeout(config.agent_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            checks_url,
            client,
            metrics,
        })
    }

    pub fn checks_url(&self) -> &Url {
        &self.checks_url
    }

    async fn query_agent(&self) -> AgentReply {
        let response = match self.client.get(self.checks_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(agent = %self.checks_url, error = %e, "Consul agent unreachable");
                self.record_failure("unavailable");
                return AgentReply::Failure(Check::critical(e.to_string(), AGENT_UNAVAILABLE));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(agent = %self.checks_url, error = %e, "Failed to read agent response");
                self.record_failure("read");
                return AgentReply::Failure(Check::critical(e.to_string(), AGENT_PARSE_FAILURE));
            }
        };

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            warn!(agent = %self.checks_url, %status, "Consul agent answered with an error");
            self.record_failure("status");
            return AgentReply::Failure(Check::critical(
                format!("HTTP {}: {}", status, text.trim()),
                AGENT_ERROR_STATUS,
            ));
        }

        match parse_listing(&body) {
            Ok(checks) => {
                debug!(count = checks.len(), "Fetched checks from agent");
                AgentReply::Checks(checks)
            }
            Err(e) => {
                warn!(agent = %self.checks_url, error = %e, "Agent response is not JSON");
                self.record_failure("parse");
                AgentReply::Failure(Check::critical(e.to_string(), AGENT_PARSE_FAILURE))
            }
        }
    }

    fn record_failure(&self, kind: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_agent_failure(kind);
        }
    }
}

#[async_trait]
impl CheckSource for AgentClient {
    async fn fetch_checks(&self) -> AgentReply {
        let start = Instant::now();
        let reply = self.query_agent().await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_agent_request(start.elapsed());
        }
        reply
    }

    fn name(&self) -> &str {
        self.checks_url.as_str()
    }
}
