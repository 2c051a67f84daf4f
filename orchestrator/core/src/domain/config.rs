// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Process Configuration
//
// Settings consumed by the engine at start:
// - Deployment mode (standalone / distributed)
// - HTTP listener address and timeouts
// - Temporal and Redis endpoints, with optional embedded variants
// - Working directory and runtime entrypoint for inline tools

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Deployment mode of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single process, in-memory store unless embedded services are enabled.
    #[default]
    Standalone,
    /// External Temporal and Redis.
    Distributed,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standalone => "standalone",
            Mode::Distributed => "distributed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(Mode::Standalone),
            "distributed" => Ok(Mode::Distributed),
            other => Err(format!("unknown mode '{}': expected standalone or distributed", other)),
        }
    }
}

/// Top-level process configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub temporal: TemporalConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub cli: CliConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener port; 0 requests an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u32,

    #[serde(default)]
    pub timeouts: ServerTimeouts,
}

/// HTTP timeouts. Unset values leave the behaviour to the server defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerTimeouts {
    /// Upper bound for graceful shutdown on stop.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub server_shutdown: Option<Duration>,

    /// Bound on receiving a request body.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub http_read: Option<Duration>,

    /// Bound on producing a response.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub http_write: Option<Duration>,

    /// A connection with no traffic for this long is closed.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub http_idle: Option<Duration>,

    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub http_read_header: Option<Duration>,
}

// Zero is treated as unset.
impl ServerTimeouts {
    pub fn read(&self) -> Option<Duration> {
        non_zero(self.http_read)
    }

    pub fn write(&self) -> Option<Duration> {
        non_zero(self.http_write)
    }

    pub fn idle(&self) -> Option<Duration> {
        non_zero(self.http_idle)
    }

    pub fn read_header(&self) -> Option<Duration> {
        non_zero(self.http_read_header)
    }
}

fn non_zero(value: Option<Duration>) -> Option<Duration> {
    value.filter(|d| !d.is_zero())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalConfig {
    #[serde(default)]
    pub host_port: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_task_queue")]
    pub task_queue: String,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Embed a Temporal dev server in standalone mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<TemporalStandaloneConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalStandaloneConfig {
    #[serde(default)]
    pub frontend_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_port: Option<u16>,

    /// SQLite file for the dev server; in-memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub db: u32,

    /// Embed a Redis-compatible server in standalone mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<RedisStandaloneConfig>,
}

impl RedisConfig {
    /// URL or host/port is set.
    pub fn has_connection(&self) -> bool {
        !self.url.trim().is_empty() || (!self.host.trim().is_empty() && self.port != 0)
    }

    /// Connection URL, built from host/port when no URL is configured.
    pub fn connection_url(&self) -> Option<String> {
        if !self.url.trim().is_empty() {
            return Some(self.url.trim().to_string());
        }
        if self.host.trim().is_empty() || self.port == 0 {
            return None;
        }
        let auth = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!(":{}@", p))
            .unwrap_or_default();
        Some(format!("redis://{}{}:{}/{}", auth, self.host.trim(), self.port, self.db))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedisStandaloneConfig {
    #[serde(default)]
    pub port: u16,

    /// Snapshot directory; memory-only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Project root; the process cwd when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// User tool entrypoint re-exported by the generated inline entrypoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint_path: Option<PathBuf>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u32 {
    5001
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_task_queue() -> String {
    "agentflow".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeouts: ServerTimeouts::default(),
        }
    }
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            host_port: String::new(),
            namespace: default_namespace(),
            task_queue: default_task_queue(),
            connect_timeout: default_connect_timeout(),
            standalone: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. AGENTFLOW_CONFIG_PATH environment variable
    /// 2. ./agentflow.yaml (working directory)
    /// 3. ~/.agentflow/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AGENTFLOW_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./agentflow.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agentflow").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::debug!(
                    "No configuration file found in standard locations, using defaults"
                );
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGENTFLOW_MODE") {
            match val.parse::<Mode>() {
                Ok(mode) => {
                    tracing::info!("Environment override: AGENTFLOW_MODE={}", mode);
                    self.mode = mode;
                }
                Err(e) => tracing::warn!("Ignoring AGENTFLOW_MODE: {}", e),
            }
        }

        if let Ok(val) = std::env::var("AGENTFLOW_SERVER_HOST") {
            tracing::info!("Environment override: AGENTFLOW_SERVER_HOST={}", val);
            self.server.host = val;
        }

        if let Ok(val) = std::env::var("AGENTFLOW_SERVER_PORT") {
            match val.parse::<u32>() {
                Ok(port) => {
                    tracing::info!("Environment override: AGENTFLOW_SERVER_PORT={}", port);
                    self.server.port = port;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for AGENTFLOW_SERVER_PORT: '{}'. Expected a number. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(val) = std::env::var("AGENTFLOW_TEMPORAL_HOST_PORT") {
            tracing::info!("Environment override: AGENTFLOW_TEMPORAL_HOST_PORT={}", val);
            self.temporal.host_port = val;
        }

        if let Ok(val) = std::env::var("AGENTFLOW_REDIS_URL") {
            tracing::info!("Environment override: AGENTFLOW_REDIS_URL set");
            self.redis.url = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port > u16::MAX as u32 {
            anyhow::bail!("server.port {} is out of range (0-65535)", self.server.port);
        }

        if self.mode == Mode::Distributed {
            if self.temporal.host_port.trim().is_empty() {
                anyhow::bail!("temporal.host_port is required in distributed mode");
            }
            if !self.redis.has_connection() {
                anyhow::bail!("redis.url or redis.host/port is required in distributed mode");
            }
        }

        if self.temporal.connect_timeout.is_zero() {
            anyhow::bail!("temporal.connect_timeout must be greater than zero");
        }

        Ok(())
    }
}
