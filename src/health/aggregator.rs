// src/health/aggregator.rs
use crate::agent::{AgentReply, Check, STATUS_CRITICAL};
use crate::health::{HealthStatus, ServiceQuery};
use hyper::header::{CONTENT_TYPE, WARNING};
use hyper::{Body, Response, StatusCode};

pub const NO_SUCH_SERVICE: &str = "No such service or no check associated with it";
pub const SOFT_WARNING: &str = "Some Consul checks failed, please investigate";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to encode checks: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build response: {0}")]
    Response(#[from] hyper::http::Error),
}

/// Outcome of one health query: the aggregate status and the checks behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<Check>,
    pub warn_enabled: bool,
}

/// Keep the checks that belong to `service_id` plus every node-level check.
/// When the service has no check of its own, a critical placeholder is added.
pub fn filter_checks(checks: Vec<Check>, service_id: &str) -> Vec<Check> {
    let service_known = checks.iter().any(|check| check.service_id == service_id);

    let mut relevant: Vec<Check> = checks
        .into_iter()
        .filter(|check| check.service_id == service_id || check.is_node_level())
        .collect();

    if !service_known {
        relevant.push(Check {
            service_id: service_id.to_string(),
            output: NO_SUCH_SERVICE.to_string(),
            status: STATUS_CRITICAL.to_string(),
            ..Check::default()
        });
    }
    relevant
}

/// Worst status among `checks`; an empty slice is passing.
pub fn aggregate_status(checks: &[Check]) -> HealthStatus {
    checks
        .iter()
        .map(|check| HealthStatus::from_check_status(&check.status))
        .max()
        .unwrap_or(HealthStatus::Passing)
}

impl HealthReport {
    pub fn evaluate(reply: AgentReply, query: &ServiceQuery) -> Self {
        let checks = match reply {
            AgentReply::Checks(checks) => filter_checks(checks, &query.service_id),
            AgentReply::Failure(check) => vec![check],
        };

        Self {
            status: aggregate_status(&checks),
            checks,
            warn_enabled: query.warn_enabled,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Passing => StatusCode::OK,
            HealthStatus::Warning if self.warn_enabled => StatusCode::OK,
            HealthStatus::Warning | HealthStatus::Critical => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// True when a warning is let through because the caller asked for it.
    pub fn is_soft_warning(&self) -> bool {
        self.status == HealthStatus::Warning && self.warn_enabled
    }

    pub fn into_response(self) -> Result<Response<Body>, ReportError> {
        let body = serde_json::to_vec(&self.checks)?;

        let mut builder = Response::builder()
            .status(self.status_code())
            .header(CONTENT_TYPE, "application/json; charset=utf-8");
        if self.is_soft_warning() {
            builder = builder.header(WARNING, SOFT_WARNING);
        }

        Ok(builder.body(Body::from(body))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn check(service_id: &str, status: &str) -> Check {
        Check {
            check_id: format!("{service_id}-{status}"),
            service_id: service_id.to_string(),
            status: status.to_string(),
            ..Check::default()
        }
    }

    fn report(checks: Vec<Check>, service: &str, warn: bool) -> HealthReport {
        HealthReport::evaluate(AgentReply::Checks(checks), &ServiceQuery::new(service, warn))
    }

    #[test]
    fn filter_keeps_service_and_node_checks_only() {
        let filtered = filter_checks(
            vec![
                check("web", "passing"),
                check("db", "critical"),
                check("", "passing"),
                check("web", "warning"),
            ],
            "web",
        );

        assert_eq!(
            filtered,
            vec![check("web", "passing"), check("", "passing"), check("web", "warning")]
        );
    }

    #[test]
    fn unknown_service_gets_one_placeholder_after_node_checks() {
        let filtered = filter_checks(vec![check("other", "passing"), check("", "passing")], "web");

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0], check("", "passing"));
        assert_eq!(filtered[1].service_id, "web");
        assert_eq!(filtered[1].status, "critical");
        assert_eq!(filtered[1].output, NO_SUCH_SERVICE);
    }

    #[test]
    fn empty_service_matches_node_checks() {
        let filtered = filter_checks(vec![check("", "passing"), check("web", "critical")], "");
        assert_eq!(filtered, vec![check("", "passing")]);

        let filtered = filter_checks(vec![check("web", "passing")], "");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].output, NO_SUCH_SERVICE);
        assert_eq!(filtered[0].service_id, "");
    }

    #[test]
    fn critical_wins_over_everything() {
        let checks = vec![check("web", "passing"), check("web", "critical"), check("", "warning")];
        assert_eq!(aggregate_status(&checks), HealthStatus::Critical);
    }

    #[test]
    fn warning_wins_over_passing() {
        let checks = vec![check("web", "passing"), check("", "warning"), check("web", "bogus")];
        assert_eq!(aggregate_status(&checks), HealthStatus::Warning);
    }

    #[test]
    fn passing_and_unknown_statuses_are_passing() {
        let checks = vec![check("web", "passing"), check("web", "maintenance"), check("", "")];
        assert_eq!(aggregate_status(&checks), HealthStatus::Passing);
        assert_eq!(aggregate_status(&[]), HealthStatus::Passing);
    }

    #[test]
    fn passing_service_is_ok() {
        let report = report(vec![check("web", "passing")], "web", false);

        assert_eq!(report.status, HealthStatus::Passing);
        assert_eq!(report.status_code(), StatusCode::OK);
        assert!(!report.is_soft_warning());
    }

    #[test]
    fn critical_service_is_unavailable_even_with_warn() {
        let report = report(vec![check("web", "critical"), check("", "passing")], "web", true);

        assert_eq!(report.status, HealthStatus::Critical);
        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.checks.len(), 2);
    }

    #[test]
    fn warning_depends_on_warn_flag() {
        let lenient = report(vec![check("web", "warning")], "web", true);
        assert_eq!(lenient.status_code(), StatusCode::OK);
        assert!(lenient.is_soft_warning());

        let strict = report(vec![check("web", "warning")], "web", false);
        assert_eq!(strict.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!strict.is_soft_warning());
    }

    #[test]
    fn agent_failure_is_reported_alone() {
        let failure = Check::critical("connection refused", "Consul Agent unavailable");
        let report = HealthReport::evaluate(
            AgentReply::Failure(failure.clone()),
            &ServiceQuery::new("web", true),
        );

        assert_eq!(report.checks, vec![failure]);
        assert_eq!(report.status, HealthStatus::Critical);
        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn response_carries_checks_and_warning_header() {
        let response = report(vec![check("web", "warning")], "web", true)
            .into_response()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[WARNING], SOFT_WARNING);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let checks: Vec<Check> = serde_json::from_slice(&body).unwrap();
        assert_eq!(checks, vec![check("web", "warning")]);
    }

    #[tokio::test]
    async fn strict_warning_response_has_no_header() {
        let response = report(vec![check("web", "warning")], "web", false)
            .into_response()
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(WARNING).is_none());
    }

    fn service_id() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("web".to_string()),
            Just("db".to_string()),
            "[a-z]{1,6}",
        ]
    }

    fn check_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("passing".to_string()),
            Just("warning".to_string()),
            Just("critical".to_string()),
            "[a-zA-Z]{0,8}",
        ]
    }

    fn any_check() -> impl Strategy<Value = Check> {
        (service_id(), check_status(), "[a-z0-9:]{0,8}").prop_map(
            |(service_id, status, check_id)| Check {
                check_id,
                service_id,
                status,
                ..Check::default()
            },
        )
    }

    proptest! {
        #[test]
        fn filter_is_service_checks_plus_node_checks(
            checks in prop::collection::vec(any_check(), 0..12),
            service in service_id(),
        ) {
            let expected: Vec<Check> = checks
                .iter()
                .filter(|c| c.service_id == service || c.service_id.is_empty())
                .cloned()
                .collect();
            let known = checks.iter().any(|c| c.service_id == service);

            let filtered = filter_checks(checks, &service);

            prop_assert_eq!(&filtered[..expected.len()], &expected[..]);
            let placeholders = filtered.iter().filter(|c| c.output == NO_SUCH_SERVICE).count();
            if known {
                prop_assert_eq!(filtered.len(), expected.len());
                prop_assert_eq!(placeholders, 0);
            } else {
                prop_assert_eq!(filtered.len(), expected.len() + 1);
                prop_assert_eq!(placeholders, 1);
                let last = filtered.last().unwrap();
                prop_assert_eq!(&last.service_id, &service);
                prop_assert_eq!(last.status.as_str(), STATUS_CRITICAL);
                prop_assert_eq!(aggregate_status(&filtered), HealthStatus::Critical);
            }
        }

        #[test]
        fn aggregate_is_the_worst_known_status(
            checks in prop::collection::vec(any_check(), 0..12),
        ) {
            let expected = if checks.iter().any(|c| c.status == "critical") {
                HealthStatus::Critical
            } else if checks.iter().any(|c| c.status == "warning") {
                HealthStatus::Warning
            } else {
                HealthStatus::Passing
            };

            prop_assert_eq!(aggregate_status(&checks), expected);
        }

        #[test]
        fn status_code_follows_severity_and_warn_mode(
            checks in prop::collection::vec(any_check(), 0..12),
            service in service_id(),
            warn in any::<bool>(),
        ) {
            let report = HealthReport::evaluate(
                AgentReply::Checks(checks),
                &ServiceQuery::new(service, warn),
            );

            let healthy = match report.status {
                HealthStatus::Passing => true,
                HealthStatus::Warning => warn,
                HealthStatus::Critical => false,
            };
            let expected = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
            prop_assert_eq!(report.status_code(), expected);
            let soft = warn && report.status == HealthStatus::Warning;
            prop_assert_eq!(report.is_soft_warning(), soft);
        }
    }
}
