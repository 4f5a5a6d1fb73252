// src/health/mod.rs
mod aggregator;
mod query;
mod status;

pub use aggregator::{
    aggregate_status, filter_checks, HealthReport, ReportError, NO_SUCH_SERVICE, SOFT_WARNING,
};
pub use query::ServiceQuery;
pub use status::HealthStatus;
