//! Configuration management
//!
//! Layered configuration in the order: built-in defaults, optional config
//! files, then `SCHOOL_SMS_*` environment variables. The loaded configuration
//! is validated before use and passed down explicitly; nothing reads ambient
//! globals after startup.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// SMS gateway settings
    pub sms: SmsSettings,
    /// Notification content settings
    pub notification: NotificationConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub url: String,
}

/// Logging output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log file path; console-only when absent
    pub file_path: Option<String>,
    /// Output format: "text" or "json"
    pub format: String,
}

/// SMS gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsSettings {
    /// Fallback gateway endpoint when the sms_config row has none
    pub default_api_url: String,
    /// Per-request timeout for gateway calls
    pub request_timeout_secs: u64,
}

/// Notification content settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Absence message template; `{teacher}` and `{date}` are substituted
    pub absence_template: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "data/school.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            sms: SmsSettings {
                default_api_url: "https://sms.iprogtech.com/api/v1/sms_messages".to_string(),
                request_timeout_secs: 30,
            },
            notification: NotificationConfig {
                absence_template: "Dear parent, please be advised that {teacher} is absent today ({date}). Classes handled by {teacher} are suspended or covered by a substitute."
                    .to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        // Start with default values
        for (key, value) in AppConfig::default() {
            builder = builder
                .set_default(key.as_str(), value)
                .map_err(|e| anyhow::anyhow!("Failed to set config default: {}", e))?;
        }

        let config = builder
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("SCHOOL_SMS").separator("_"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(anyhow::anyhow!("database.url must not be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        if self.sms.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }

        if !self.sms.default_api_url.starts_with("http") {
            return Err(anyhow::anyhow!(
                "default_api_url must be an http(s) URL, got: {}",
                self.sms.default_api_url
            ));
        }

        if !self.notification.absence_template.contains("{teacher}") {
            return Err(anyhow::anyhow!(
                "absence_template must contain a {{teacher}} placeholder"
            ));
        }

        Ok(())
    }

    /// Get database path from environment or config
    #[must_use]
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert("database.url".to_string(), config::Value::from(self.database.url));

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert("logging.format".to_string(), config::Value::from(self.logging.format));

        map.insert(
            "sms.default_api_url".to_string(),
            config::Value::from(self.sms.default_api_url),
        );
        map.insert(
            "sms.request_timeout_secs".to_string(),
            config::Value::from(self.sms.request_timeout_secs),
        );

        map.insert(
            "notification.absence_template".to_string(),
            config::Value::from(self.notification.absence_template),
        );

        map.into_iter()
    }
}
