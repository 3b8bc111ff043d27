use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub files: FileConfig,
    /// Public base URL of the back office, quoted in outgoing mail.
    pub app_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::MongoDb),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Directory where uploads and generated reports live while in use.
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ReconcileConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StorageBackend = get_env("STORAGE_BACKEND", Some("mongodb"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The in-memory backend never touches MongoDB, so the URI is optional there.
        let mongo_uri = match backend {
            StorageBackend::MongoDb => get_env("MONGODB_URI", None, is_prod)?,
            StorageBackend::Memory => env::var("MONGODB_URI").unwrap_or_default(),
        };

        let default_staging = env::current_dir()
            .map(|dir| dir.join("public"))
            .unwrap_or_else(|_| PathBuf::from("public"));

        Ok(ReconcileConfig {
            common,
            storage: StorageConfig { backend },
            mongodb: MongoConfig {
                uri: mongo_uri,
                database: get_env("MONGODB_DATABASE", Some("reconcile_db"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_port("SMTP_PORT", &get_env("SMTP_PORT", Some("587"), is_prod)?)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: Secret::new(get_env("SMTP_PASSWORD", Some(""), is_prod)?),
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Reconcile Pro"), is_prod)?,
                enabled: env::var("SMTP_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            files: FileConfig {
                staging_dir: env::var("STAGING_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(default_staging),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            app_url: get_env("APP_URL", Some("http://localhost:8080"), is_prod)?,
        })
    }

    /// Settings for running against the in-memory store with mail disabled.
    pub fn for_memory(staging_dir: PathBuf) -> Self {
        Self {
            common: core_config::Config::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            mongodb: MongoConfig {
                uri: String::new(),
                database: "reconcile_db".to_string(),
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: String::new(),
                password: Secret::new(String::new()),
                from_email: "noreply@example.com".to_string(),
                from_name: "Reconcile Pro".to_string(),
                enabled: false,
            },
            files: FileConfig {
                staging_dir,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            app_url: "http://localhost:8080".to_string(),
        }
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, AppError> {
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} must be a port number, got {:?}: {}", key, raw, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
