//! Configuration for Dripmail

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Credential vault configuration
    #[serde(default)]
    pub vault: VaultConfig,

    /// Worker configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname used in generated Message-IDs
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Bind address for the HTTP API
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            bind_address: default_bind_address(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (PostgreSQL)
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// Credential vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Process-wide secret the account-password key is derived from.
    ///
    /// The default exists for development only; production deployments must
    /// override it (the server logs a warning when the default is in use).
    #[serde(default = "default_vault_secret")]
    pub secret: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            secret: default_vault_secret(),
        }
    }
}

fn default_vault_secret() -> String {
    "default_secret_key_must_be_32_bytes_long!!".to_string()
}

impl VaultConfig {
    /// Whether the development fallback secret is still in place
    pub fn is_default_secret(&self) -> bool {
        self.secret == default_vault_secret()
    }
}

/// Worker configuration shared by both schedulers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum due items pulled per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Maximum concurrent SMTP dispatches in the scheduled-email tick
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// SMTP transport timeout in seconds
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,

    /// How long a claimed campaign lead stays deferred before it becomes
    /// eligible again (bounds the retry delay after a mid-step failure)
    #[serde(default = "default_claim_secs")]
    pub claim_secs: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            dispatch_timeout_secs: default_dispatch_timeout(),
            claim_secs: default_claim_secs(),
        }
    }
}

fn default_batch_size() -> i64 {
    50
}

fn default_concurrency() -> usize {
    10
}

fn default_dispatch_timeout() -> u64 {
    30
}

fn default_claim_secs() -> i64 {
    120
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Shared secret required by the worker tick endpoints
    #[serde(default = "default_worker_token")]
    pub worker_token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            worker_token: default_worker_token(),
        }
    }
}

fn default_worker_token() -> String {
    "dripmail_worker_secret".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (tracing EnvFilter syntax)
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/dripmail/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.batch_size, 50);
        assert_eq!(worker.dispatch_timeout_secs, 30);

        let server = ServerConfig::default();
        assert_eq!(server.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
hostname = "crm.example.com"
bind_address = "127.0.0.1:9000"

[database]
url = "postgres://localhost/dripmail"

[worker]
batch_size = 25

[api]
worker_token = "supersecret"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.hostname, "crm.example.com");
        assert_eq!(config.worker.batch_size, 25);
        assert_eq!(config.worker.concurrency, 10);
        assert_eq!(config.api.worker_token, "supersecret");
        assert!(config.vault.is_default_secret());
    }
}
