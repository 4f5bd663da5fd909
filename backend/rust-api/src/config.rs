use std::env;
use std::str::FromStr;

const DEFAULT_METRICS_AUTH: &str = "admin:changeme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "Unknown storage backend '{}', expected 'mongo' or 'memory'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    /// Basic auth credentials for /metrics, "username:password"
    pub metrics_auth: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let storage_backend = settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
            .unwrap_or_else(|_| "mongo".to_string())
            .parse::<StorageBackend>()
            .map_err(config::ConfigError::Message)?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "surveys".to_string());

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| DEFAULT_METRICS_AUTH.to_string());

        if env == "prod" && metrics_auth == DEFAULT_METRICS_AUTH {
            tracing::warn!("Using default metrics credentials in production");
        }

        Ok(Config {
            bind_addr,
            storage_backend,
            mongo_uri,
            mongo_database,
            metrics_auth,
        })
    }

    /// Configuration backed by the in-memory store, no environment involved.
    pub fn in_memory() -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Memory,
            mongo_uri: String::new(),
            mongo_database: String::new(),
            metrics_auth: DEFAULT_METRICS_AUTH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_SERVER__BIND_ADDR",
        "APP_STORAGE__BACKEND",
        "APP_DATABASE__MONGO_DATABASE",
        "BIND_ADDR",
        "STORAGE_BACKEND",
        "MONGO_URI",
        "MONGO_DATABASE",
        "METRICS_AUTH",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::set_var("SKIP_ROOT_ENV", "1");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::load().unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.storage_backend, StorageBackend::Mongo);
        assert_eq!(config.mongo_database, "surveys");
        assert_eq!(config.metrics_auth, "admin:changeme");
    }

    #[test]
    #[serial]
    fn test_prefixed_env_overrides_legacy_vars() {
        clear_env();
        env::set_var("APP_STORAGE__BACKEND", "memory");
        env::set_var("STORAGE_BACKEND", "mongo");
        env::set_var("APP_DATABASE__MONGO_DATABASE", "surveys_test");
        env::set_var("BIND_ADDR", "127.0.0.1:9000");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.mongo_database, "surveys_test");
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_rejected() {
        clear_env();
        env::set_var("STORAGE_BACKEND", "postgres");

        let result = Config::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Mongo".parse::<StorageBackend>(), Ok(StorageBackend::Mongo));
        assert_eq!("mongodb".parse::<StorageBackend>(), Ok(StorageBackend::Mongo));
        assert_eq!(" memory ".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
