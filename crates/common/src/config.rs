//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token issuing configuration.
    pub auth: AuthConfig,
    /// Bootstrap administrator, created at startup when missing.
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    /// Category to department routing.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

/// Bootstrap administrator credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A single routing rule: reports in `categories` go to `department`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RoutingRule {
    pub department: String,
    pub categories: Vec<String>,
}

/// Category to department routing table.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_rules")]
    pub rules: Vec<RoutingRule>,
    /// Department used for categories with no rule.
    #[serde(default = "default_fallback_department")]
    pub fallback_department: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            rules: default_routing_rules(),
            fallback_department: default_fallback_department(),
        }
    }
}

impl RoutingConfig {
    /// Department responsible for a report category.
    #[must_use]
    pub fn department_for(&self, category: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| {
                rule.categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(category))
            })
            .map_or(self.fallback_department.as_str(), |rule| {
                rule.department.as_str()
            })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_token_ttl() -> i64 {
    30
}

fn default_fallback_department() -> String {
    "Police".to_string()
}

fn default_routing_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            department: "Cyber Cell".to_string(),
            categories: vec!["Fraud".to_string()],
        },
        RoutingRule {
            department: "Women's Cell".to_string(),
            categories: vec!["Domestic Violence".to_string(), "Harassment".to_string()],
        },
        RoutingRule {
            department: "Traffic Police".to_string(),
            categories: vec!["Traffic Violation".to_string()],
        },
    ]
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CRIMEWATCH_ENV`)
    /// 3. Environment variables with `CRIMEWATCH__` prefix
    ///
    /// A `.env` file in the working directory is read first, if present.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("CRIMEWATCH_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CRIMEWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CRIMEWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_department_for_known_category() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.department_for("Fraud"), "Cyber Cell");
        assert_eq!(routing.department_for("harassment"), "Women's Cell");
        assert_eq!(routing.department_for("Traffic Violation"), "Traffic Police");
    }

    #[test]
    fn test_department_for_unrouted_category_falls_back() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.department_for("Theft"), "Police");
        assert_eq!(routing.department_for("Other"), "Police");
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let raw = r#"
            [server]
            [database]
            url = "postgres://localhost/crimewatch"
            [auth]
            jwt_secret = "secret"
        "#;
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert!(config.admin.is_none());
        assert_eq!(config.routing.fallback_department, "Police");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
