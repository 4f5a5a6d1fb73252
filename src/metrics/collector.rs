// src/metrics/collector.rs
use crate::health::HealthStatus;
use anyhow::Result;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, StatusCode};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }

    /// Answer a scrape: the text exposition on `path`, 404 anywhere else.
    pub fn respond(&self, req: &Request<Body>, path: &str) -> Response<Body> {
        if req.uri().path() != path {
            let mut response = Response::new(Body::from("Not Found"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            return response;
        }

        match self.gather() {
            Ok(metrics) => {
                let mut response = Response::new(Body::from(metrics));
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

pub struct MetricsCollector {
    pub requests_total: IntCounterVec,
    pub checks_evaluated: Histogram,
    pub agent_request_duration_seconds: Histogram,
    pub agent_failures_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("siok_requests_total", "Health queries answered"),
            &["status", "code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let checks_evaluated = Histogram::with_opts(
            HistogramOpts::new(
                "siok_checks_evaluated",
                "Checks retained per health query",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )?;
        registry.register(Box::new(checks_evaluated.clone()))?;

        let agent_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "siok_agent_request_duration_seconds",
            "Time spent querying the Consul agent",
        ))?;
        registry.register(Box::new(agent_request_duration_seconds.clone()))?;

        let agent_failures_total = IntCounterVec::new(
            Opts::new("siok_agent_failures_total", "Failed Consul agent queries"),
            &["kind"],
        )?;
        registry.register(Box::new(agent_failures_total.clone()))?;

        Ok(Self {
            requests_total,
            checks_evaluated,
            agent_request_duration_seconds,
            agent_failures_total,
        })
    }

    pub fn record_request(&self, status: HealthStatus, code: StatusCode, checks: usize) {
        self.requests_total
            .with_label_values(&[status.as_str(), code.as_str()])
            .inc();
        self.checks_evaluated.observe(checks as f64);
    }

    pub fn observe_agent_request(&self, elapsed: Duration) {
        self.agent_request_duration_seconds
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_agent_failure(&self, kind: &str) {
        self.agent_failures_total.with_label_values(&[kind]).inc();
    }
}
