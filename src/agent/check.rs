// src/agent/check.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_PASSING: &str = "passing";
pub const STATUS_WARNING: &str = "warning";
pub const STATUS_CRITICAL: &str = "critical";

/// One check result as reported by the agent, and as republished by siok.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
    #[serde(rename = "Output", default)]
    pub output: String,
    /// Empty for node-level checks.
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// What a single query of the agent produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    /// The check listing, in the order the agent returned it.
    Checks(Vec<Check>),
    /// The agent could not be queried or its answer could not be used.
    /// Carries the critical check that stands in for the whole listing.
    Failure(Check),
}

impl Check {
    /// A critical check that describes a failure rather than a real probe.
    pub fn critical(output: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            notes: notes.into(),
            status: STATUS_CRITICAL.to_string(),
            ..Self::default()
        }
    }

    pub fn is_node_level(&self) -> bool {
        self.service_id.is_empty()
    }

    /// Pull the known fields out of one element of the agent listing.
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |key: &str| object.get(key).map(loose_string).unwrap_or_default();

        Some(Self {
            check_id: field("CheckID"),
            name: field("Name"),
            notes: field("Notes"),
            output: field("Output"),
            service_id: field("ServiceID"),
            status: field("Status"),
        })
    }
}

fn loose_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an agent listing without insisting on a schema.
///
/// The agent answers with an object keyed by check ID; a plain array of
/// checks is accepted as well. Any other top-level value yields no checks.
pub fn parse_listing(body: &[u8]) -> Result<Vec<Check>, serde_json::Error> {
    let root: Value = serde_json::from_slice(body)?;

    let checks = match &root {
        Value::Array(items) => items.iter().filter_map(Check::from_json).collect(),
        Value::Object(entries) => entries.values().filter_map(Check::from_json).collect(),
        _ => Vec::new(),
    };
    Ok(checks)
}
