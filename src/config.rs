/// Configuration management for Scouter Share
use crate::error::{ShareError, ShareResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default base for every deep link handed out by the app
pub const DEFAULT_APP_LINK_BASE: &str = "https://supercilex.github.io/Robot-Scouter/data/";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub functions: FunctionsConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL that team and template links are built under
    pub app_link_base: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub document_db: PathBuf,
}

/// Trusted remote functions configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Base URL callable functions are posted to (`<base_url>/<name>`)
    pub base_url: String,
    /// Bearer token forwarded with each call
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ShareResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("SCOUTER_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("SCOUTER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ShareError::Validation("Invalid port number".to_string()))?;
        let app_link_base = env::var("SCOUTER_APP_LINK_BASE")
            .unwrap_or_else(|_| DEFAULT_APP_LINK_BASE.to_string());

        let data_directory: PathBuf = env::var("SCOUTER_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let document_db = env::var("SCOUTER_DOCUMENT_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("documents.sqlite"));

        let functions_url = env::var("SCOUTER_FUNCTIONS_URL")
            .map_err(|_| ShareError::Validation("Functions URL required".to_string()))?;
        let functions_token = env::var("SCOUTER_FUNCTIONS_TOKEN").ok();
        let functions_timeout = env::var("SCOUTER_FUNCTIONS_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let jwt_secret = env::var("SCOUTER_JWT_SECRET")
            .map_err(|_| ShareError::Validation("JWT secret required".to_string()))?;

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                app_link_base,
            },
            storage: StorageConfig {
                data_directory,
                document_db,
            },
            functions: FunctionsConfig {
                base_url: functions_url,
                auth_token: functions_token,
                timeout_secs: functions_timeout,
            },
            authentication: AuthConfig { jwt_secret },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ShareResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ShareError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ShareError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if !is_http_url(&self.service.app_link_base) {
            return Err(ShareError::Validation(format!(
                "App link base must be an http(s) URL: {}",
                self.service.app_link_base
            )));
        }

        if !is_http_url(&self.functions.base_url) {
            return Err(ShareError::Validation(format!(
                "Functions URL must be an http(s) URL: {}",
                self.functions.base_url
            )));
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
