//! Application configuration loaded from environment variables.

use std::str::FromStr;

use provisioning::{AccountConfig, ArtifactConfig, BatchConfig, SmtpConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory stores when unset
/// - `PUBLIC_BASE_URL`: base of the URLs encoded in product codes
///   (default: `"http://localhost:3000"`)
/// - `ARTIFACT_FOLDER`: storage folder for code images (default: `"products"`)
/// - `MAX_BATCH_SIZE`: largest accepted batch (default: `100`)
/// - `LOGIN_URL`: link sent with new credentials
///   (default: `"http://localhost:3000/login"`)
/// - `CREDENTIAL_HASH_COST`: bcrypt cost (default: bcrypt's default)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`:
///   mail relay; when `SMTP_HOST` or `SMTP_FROM` is unset nothing is
///   delivered and account creation fails
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub public_base_url: String,
    pub artifact_folder: String,
    pub max_batch_size: u32,
    pub login_url: String,
    pub credential_hash_cost: u32,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Loads configuration through a variable lookup, falling back to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let smtp = match (var("SMTP_HOST"), var("SMTP_FROM")) {
            (Some(host), Some(from)) => Some(SmtpConfig {
                host,
                port: parse_var(&var, "SMTP_PORT").unwrap_or(587),
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from,
            }),
            _ => None,
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "PORT").unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: var("DATABASE_URL").filter(|url| !url.is_empty()),
            public_base_url: var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            artifact_folder: var("ARTIFACT_FOLDER").unwrap_or(defaults.artifact_folder),
            max_batch_size: parse_var(&var, "MAX_BATCH_SIZE").unwrap_or(defaults.max_batch_size),
            login_url: var("LOGIN_URL").unwrap_or(defaults.login_url),
            credential_hash_cost: parse_var(&var, "CREDENTIAL_HASH_COST")
                .unwrap_or(defaults.credential_hash_cost),
            smtp,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifact_config(&self) -> ArtifactConfig {
        ArtifactConfig {
            target_base_url: self.public_base_url.clone(),
            folder: self.artifact_folder.clone(),
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_batch_size: self.max_batch_size,
        }
    }

    pub fn account_config(&self) -> AccountConfig {
        AccountConfig {
            login_url: self.login_url.clone(),
            hash_cost: self.credential_hash_cost,
            ..AccountConfig::default()
        }
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let account = AccountConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            public_base_url: "http://localhost:3000".to_string(),
            artifact_folder: "products".to_string(),
            max_batch_size: BatchConfig::default().max_batch_size,
            login_url: account.login_url,
            credential_hash_cost: account.hash_cost,
            smtp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.artifact_folder, "products");
        assert!(config.database_url.is_none());
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = from_map(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.login_url, "http://localhost:3000/login");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = from_map(&[
            ("PORT", "not-a-port"),
            ("MAX_BATCH_SIZE", "25"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("PUBLIC_BASE_URL", "https://shop.test"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.batch_config().max_batch_size, 25);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert_eq!(config.artifact_config().target_base_url, "https://shop.test");
    }

    #[test]
    fn test_smtp_requires_host_and_from() {
        assert!(from_map(&[("SMTP_HOST", "smtp.shop.test")]).smtp.is_none());

        let config = from_map(&[
            ("SMTP_HOST", "smtp.shop.test"),
            ("SMTP_FROM", "Shop <noreply@shop.test>"),
            ("SMTP_USERNAME", "mailer"),
        ]);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn test_account_config_keeps_credential_length() {
        let config = from_map(&[("CREDENTIAL_HASH_COST", "6")]);
        let account = config.account_config();
        assert_eq!(account.hash_cost, 6);
        assert_eq!(account.credential_length, 12);
    }
}
