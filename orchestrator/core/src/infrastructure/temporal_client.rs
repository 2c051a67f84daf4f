// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Temporal Endpoint Probe
//!
//! Reachability check run before the engine starts in distributed mode.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Fail fast when the configured Temporal frontend is down
//! - **Integration:** Engine start → Temporal frontend (`host:port`)
//!
//! The probe opens and immediately drops a TCP connection; it does not speak
//! the Temporal gRPC protocol.
//!
//! # Configuration
//!
//! - **Address**: Temporal frontend endpoint (e.g., `localhost:7233`)
//! - **Connect timeout**: `temporal.connect_timeout`

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TemporalProbe {
    address: String,
    connect_timeout: Duration,
}

impl TemporalProbe {
    pub fn new(address: &str, connect_timeout: Duration) -> Self {
        // Strip any scheme, the probe needs host:port only
        let address = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(address)
            .trim_end_matches('/')
            .to_string();
        Self {
            address,
            connect_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn check(&self) -> Result<()> {
        if self.address.is_empty() {
            anyhow::bail!("temporal address is empty");
        }
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .with_context(|| {
                format!(
                    "Timed out after {:?} connecting to Temporal at {}",
                    self.connect_timeout, self.address
                )
            })?
            .with_context(|| format!("Failed to connect to Temporal at {}", self.address))?;
        drop(stream);
        debug!(address = %self.address, "Temporal endpoint reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_stripped() {
        let probe = TemporalProbe::new("http://temporal:7233/", Duration::from_secs(1));
        assert_eq!(probe.address(), "temporal:7233");
        let probe = TemporalProbe::new("localhost:7233", Duration::from_secs(1));
        assert_eq!(probe.address(), "localhost:7233");
    }

    #[tokio::test]
    async fn test_probe_reaches_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TemporalProbe::new(&addr.to_string(), Duration::from_secs(1));
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_fails_on_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let probe = TemporalProbe::new(&addr.to_string(), Duration::from_secs(1));
        assert!(probe.check().await.is_err());
    }
}
