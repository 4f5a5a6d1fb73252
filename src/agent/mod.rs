//
// src/agent/mod.rs
//
mod check;
mod client;

pub use check::{
    parse_listing, AgentReply, Check, STATUS_CRITICAL, STATUS_PASSING, STATUS_WARNING,
};
pub use client::{
    AgentClient, CheckSource, AGENT_ERROR_STATUS, AGENT_PARSE_FAILURE, AGENT_UNAVAILABLE,
};
