// src/health/status.rs
use crate::agent::{STATUS_CRITICAL, STATUS_PASSING, STATUS_WARNING};
use std::fmt;

/// Aggregate severity, ordered so that the worst status compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    Passing,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Map an agent status string. Anything unrecognized counts as passing.
    pub fn from_check_status(status: &str) -> Self {
        match status {
            STATUS_CRITICAL => HealthStatus::Critical,
            STATUS_WARNING => HealthStatus::Warning,
            _ => HealthStatus::Passing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Passing => STATUS_PASSING,
            HealthStatus::Warning => STATUS_WARNING,
            HealthStatus::Critical => STATUS_CRITICAL,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
