//! Configuration management

use itemport_common::env::{list_or, var_opt, var_or};
use itemport_ingest::{ConflictPolicy, ImportConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/itemport";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin (the bundled front-end dev server).
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:8081";

/// Default media type an upload must declare.
pub const DEFAULT_EXPECTED_MEDIA_TYPE: &str = "text/csv";

/// Default cell delimiter for uploads.
pub const DEFAULT_IMPORT_DELIMITER: char = ',';

/// Default upload size limit in bytes (10 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Which store backs the item endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store '{}' (expected postgres or memory)", other)),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub import: ImportSettings,
    pub upload: UploadConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// CSV import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    pub expected_media_type: String,
    pub delimiter: char,
    pub batch_size: Option<usize>,
    pub sink_timeout_secs: Option<u64>,
    pub conflict_policy: ConflictPolicy,
}

impl ImportSettings {
    pub fn pipeline_config(&self) -> ImportConfig {
        let mut config = ImportConfig::default();
        if let Some(size) = self.batch_size {
            config = config.with_batch_size(size);
        }
        if let Some(secs) = self.sink_timeout_secs {
            config = config.with_sink_timeout(Duration::from_secs(secs));
        }
        config
    }

    /// Delimiter as a byte; only meaningful after [`Config::validate`]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: var_or("ITEMPORT_HOST", DEFAULT_SERVER_HOST.to_string())?,
                port: var_or("ITEMPORT_PORT", DEFAULT_SERVER_PORT)?,
                shutdown_timeout_secs: var_or(
                    "ITEMPORT_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
            },
            store: var_or("ITEMPORT_STORE", StoreBackend::default())?,
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL.to_string())?,
                max_connections: var_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
                min_connections: var_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                )?,
                connect_timeout_secs: var_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
                idle_timeout_secs: var_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: list_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN),
                allow_credentials: var_or("CORS_ALLOW_CREDENTIALS", true)?,
            },
            import: ImportSettings {
                expected_media_type: var_or(
                    "IMPORT_EXPECTED_MEDIA_TYPE",
                    DEFAULT_EXPECTED_MEDIA_TYPE.to_string(),
                )?,
                delimiter: var_or("IMPORT_DELIMITER", DEFAULT_IMPORT_DELIMITER)?,
                batch_size: var_opt("IMPORT_BATCH_SIZE")?,
                sink_timeout_secs: var_opt("IMPORT_SINK_TIMEOUT_SECS")?,
                conflict_policy: var_or("IMPORT_CONFLICT_POLICY", ConflictPolicy::default())?,
            },
            upload: UploadConfig {
                max_bytes: var_or("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.store == StoreBackend::Postgres {
            if self.database.url.is_empty() {
                anyhow::bail!("Database URL cannot be empty");
            }

            if self.database.max_connections == 0 {
                anyhow::bail!("Database max_connections must be greater than 0");
            }

            if self.database.min_connections > self.database.max_connections {
                anyhow::bail!(
                    "Database min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.min_connections,
                    self.database.max_connections
                );
            }
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        if self.import.expected_media_type.trim().is_empty() {
            anyhow::bail!("Expected upload media type cannot be empty");
        }

        let delimiter = self.import.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            anyhow::bail!("Import delimiter {:?} must be a single ASCII character other than a quote or line break", delimiter);
        }

        if self.import.batch_size == Some(0) {
            anyhow::bail!("Import batch size must be greater than 0 when set");
        }

        if self.import.sink_timeout_secs == Some(0) {
            anyhow::bail!("Import sink timeout must be greater than 0 when set");
        }

        if self.upload.max_bytes == 0 {
            anyhow::bail!("Upload size limit must be greater than 0");
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            store: StoreBackend::default(),
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            import: ImportSettings {
                expected_media_type: DEFAULT_EXPECTED_MEDIA_TYPE.to_string(),
                delimiter: DEFAULT_IMPORT_DELIMITER,
                batch_size: None,
                sink_timeout_secs: None,
                conflict_policy: ConflictPolicy::default(),
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            },
        }
    }
}
