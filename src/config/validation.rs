//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work (unbindable addresses, zero limits, inverted timeouts). All problems
//! are returned together, not just the first.

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, returning every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if !is_bind_address(&config.listener.bind_address) {
        fail(
            "listener.bind_address",
            format!("'{}' is not a host:port address", config.listener.bind_address),
        );
    }
    if config.listener.max_connections == 0 {
        fail("listener.max_connections", "must be greater than 0".to_string());
    }

    if config.upstream.max_json_body_bytes == 0 {
        fail("upstream.max_json_body_bytes", "must be greater than 0".to_string());
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.inbound_secs", timeouts.inbound_secs),
    ] {
        if value == 0 {
            fail(field, "must be greater than 0".to_string());
        }
    }
    if timeouts.upstream_secs > timeouts.inbound_secs {
        fail(
            "timeouts.upstream_secs",
            format!(
                "{}s exceeds timeouts.inbound_secs ({}s)",
                timeouts.upstream_secs, timeouts.inbound_secs
            ),
        );
    }

    if config.security.max_body_size == 0 {
        fail("security.max_body_size", "must be greater than 0".to_string());
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        fail(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ip:port`, `[v6]:port` or `hostname:port`. Host names are resolved at
/// bind time, not here.
fn is_bind_address(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(|c: char| c == ':' || c == '[' || c.is_whitespace())
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}
