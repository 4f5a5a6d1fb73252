// ────────────────────────────────
// src/proxy/proxy.rs
// Answers health queries by asking the agent and aggregating its checks
// ────────────────────────────────

use crate::agent::CheckSource;
use crate::health::{HealthReport, HealthStatus, ReportError, ServiceQuery};
use crate::metrics::MetricsCollector;
use hyper::header::{HeaderValue, ALLOW};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{info, warn};

pub const HEALTH_PATH: &str = "/health";

pub struct HealthProxy {
    source: Arc<dyn CheckSource>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl HealthProxy {
    pub fn new(source: Arc<dyn CheckSource>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { source, metrics }
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        if req.uri().path() != HEALTH_PATH {
            return Ok(plain(StatusCode::NOT_FOUND, "Not Found"));
        }
        if req.method() != Method::GET {
            let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            return Ok(response);
        }

        let query = ServiceQuery::from_query_string(req.uri().query());
        let report = self.check_service(&query).await;
        Ok(report.into_response()?)
    }

    /// Fetch the current checks and reduce them for `query`.
    pub async fn check_service(&self, query: &ServiceQuery) -> HealthReport {
        let reply = self.source.fetch_checks().await;
        let report = HealthReport::evaluate(reply, query);
        let code = report.status_code();

        match report.status {
            HealthStatus::Passing => info!(
                service = %query.service_id,
                checks = report.checks.len(),
                "service is passing"
            ),
            status => warn!(
                service = %query.service_id,
                %status,
                code = code.as_u16(),
                checks = report.checks.len(),
                "service is not passing"
            ),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_request(report.status, code, report.checks.len());
        }
        report
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

// Custom error type for proxy operations
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to render health report: {0}")]
    Report(#[from] ReportError),
}

// Convert ProxyError to Hyper Response for error handling
impl From<ProxyError> for Response<Body> {
    fn from(err: ProxyError) -> Self {
        let (status, message) = match err {
            ProxyError::Report(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        plain(status, message)
    }
}
