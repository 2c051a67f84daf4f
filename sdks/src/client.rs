// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client bound to a running engine's listener.
#[derive(Debug, Clone)]
pub struct EngineClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl EngineClient {
    /// Create a client for `base_url` (`http://host:port`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Client for a listener bound to `host:port`. Unspecified bind addresses
    /// (`""`, `0.0.0.0`, `::`) are replaced with `localhost`.
    pub fn for_listener(host: &str, port: u16) -> Self {
        Self::new(base_url(host, port))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /healthz`.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_status("/healthz").await
    }

    /// `GET /readyz`.
    pub async fn ready(&self) -> Result<HealthStatus> {
        self.get_status("/readyz").await
    }

    async fn get_status(&self, path: &str) -> Result<HealthStatus> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach engine at {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("{} returned {}", url, response.status());
        }
        let status = response
            .json()
            .await
            .with_context(|| format!("Invalid response from {}", url))?;
        Ok(status)
    }
}

/// Host clients should dial for a listener bound to `host`.
pub fn client_host(host: &str) -> &str {
    match host.trim() {
        "" | "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    }
}

pub fn base_url(host: &str, port: u16) -> String {
    let host = client_host(host);
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspecified_hosts_map_to_localhost() {
        assert_eq!(base_url("", 8080), "http://localhost:8080");
        assert_eq!(base_url("0.0.0.0", 8080), "http://localhost:8080");
        assert_eq!(base_url("::", 8080), "http://localhost:8080");
        assert_eq!(base_url("127.0.0.1", 9), "http://127.0.0.1:9");
        assert_eq!(base_url("::1", 9), "http://[::1]:9");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = EngineClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
    }

    #[tokio::test]
    async fn test_health_fails_when_nothing_listens() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(EngineClient::for_listener("127.0.0.1", port).health().await.is_err());
    }
}
