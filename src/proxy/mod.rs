//
// src/proxy/mod.rs
//
mod proxy;

pub use proxy::{HealthProxy, ProxyError, HEALTH_PATH};
