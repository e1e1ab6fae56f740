use crate::service::{ServiceConfig, Topics};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
    ArangoDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "arangodb" | "arango" => Ok(StorageBackend::ArangoDb),
            other => bail!("unknown storage backend {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArangoConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub collection: String,
    pub request_timeout_ms: u64,
}

/// Subjects used on the message bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// `None` disables the bus entirely.
    pub nats_url: Option<String>,
    pub user_exists_subject: String,
    pub topics: Topics,
}

// Content service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub api_base_url: String,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub arangodb: Option<ArangoConfig>,
    pub bus: BusConfig,
    pub user_lookup_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ContentConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    api_base_url: Option<String>,
    storage: Option<String>,
    postgres_url: Option<String>,
    arangodb_url: Option<String>,
    arangodb_database: Option<String>,
    collection: Option<String>,
    nats_url: Option<String>,
    user_lookup_timeout_ms: Option<u64>,
    shutdown_grace_ms: Option<u64>,
    topics: Option<TopicsOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct TopicsOverride {
    user_exists: Option<String>,
    create: Option<String>,
    update: Option<String>,
    delete: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

impl ContentConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr: SocketAddr = env_or("CONTENT_BIND", "0.0.0.0:9560")
            .parse()
            .with_context(|| "parse CONTENT_BIND")?;
        let metrics_bind = env_or("CONTENT_METRICS_BIND", "0.0.0.0:9561")
            .parse()
            .with_context(|| "parse CONTENT_METRICS_BIND")?;
        let api_base_url = std::env::var("CONTENT_API_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", bind_addr.port()));
        let storage = env_or("CONTENT_STORAGE_BACKEND", "memory")
            .parse()
            .with_context(|| "parse CONTENT_STORAGE_BACKEND")?;

        let postgres = match std::env::var("CONTENT_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("CONTENT_POSTGRES_MAX_CONNECTIONS", 10)?,
                acquire_timeout_ms: env_parse("CONTENT_POSTGRES_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        let arangodb = if storage == StorageBackend::ArangoDb
            || std::env::var("ARANGODB_URL").is_ok()
        {
            Some(ArangoConfig {
                url: env_or("ARANGODB_URL", "http://localhost:8529"),
                username: env_or("ARANGODB_USER", "root"),
                password: env_or("ARANGODB_PASS", ""),
                database: env_or("ARANGODB_DATABASE", "content"),
                collection: env_or("CONTENT_COLLECTION", "contents"),
                request_timeout_ms: 10_000,
            })
        } else {
            None
        };

        let defaults = Topics::default();
        let bus = BusConfig {
            nats_url: std::env::var("NATS_URL").ok().filter(|url| !url.is_empty()),
            user_exists_subject: env_or("CONTENT_TOPIC_USER_EXISTS", "UserService.Exist"),
            topics: Topics {
                create: env_or("CONTENT_TOPIC_CREATE", &defaults.create),
                update: env_or("CONTENT_TOPIC_UPDATE", &defaults.update),
                delete: env_or("CONTENT_TOPIC_DELETE", &defaults.delete),
            },
        };

        Ok(Self {
            bind_addr,
            metrics_bind,
            api_base_url,
            storage,
            postgres,
            arangodb,
            bus,
            user_lookup_timeout_ms: env_parse("CONTENT_USER_LOOKUP_TIMEOUT_MS", 10_000)?,
            shutdown_grace_ms: env_parse("CONTENT_SHUTDOWN_GRACE_MS", 10_000)?,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("CONTENT_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read CONTENT_CONFIG: {path}"))?;
            let override_cfg: ContentConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse content config yaml")?;
            config.apply(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, override_cfg: ContentConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.api_base_url {
            self.api_base_url = value;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(url) = override_cfg.postgres_url {
            match self.postgres.as_mut() {
                Some(pg) => pg.url = url,
                None => {
                    self.postgres = Some(PostgresConfig {
                        url,
                        max_connections: 10,
                        acquire_timeout_ms: 5_000,
                    })
                }
            }
        }
        if self.storage == StorageBackend::ArangoDb && self.arangodb.is_none() {
            self.arangodb = Some(ArangoConfig {
                url: "http://localhost:8529".to_string(),
                username: "root".to_string(),
                password: String::new(),
                database: "content".to_string(),
                collection: "contents".to_string(),
                request_timeout_ms: 10_000,
            });
        }
        if let Some(arango) = self.arangodb.as_mut() {
            if let Some(value) = override_cfg.arangodb_url {
                arango.url = value;
            }
            if let Some(value) = override_cfg.arangodb_database {
                arango.database = value;
            }
            if let Some(value) = override_cfg.collection {
                arango.collection = value;
            }
        }
        if let Some(value) = override_cfg.nats_url {
            self.bus.nats_url = Some(value).filter(|url| !url.is_empty());
        }
        if let Some(value) = override_cfg.user_lookup_timeout_ms {
            self.user_lookup_timeout_ms = value;
        }
        if let Some(value) = override_cfg.shutdown_grace_ms {
            self.shutdown_grace_ms = value;
        }
        if let Some(topics) = override_cfg.topics {
            if let Some(value) = topics.user_exists {
                self.bus.user_exists_subject = value;
            }
            if let Some(value) = topics.create {
                self.bus.topics.create = value;
            }
            if let Some(value) = topics.update {
                self.bus.topics.update = value;
            }
            if let Some(value) = topics.delete {
                self.bus.topics.delete = value;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage == StorageBackend::Postgres && self.postgres.is_none() {
            bail!("CONTENT_POSTGRES_URL is required for the postgres backend");
        }
        if self.user_lookup_timeout_ms == 0 {
            bail!("CONTENT_USER_LOOKUP_TIMEOUT_MS must be positive");
        }
        if self.bus.user_exists_subject.trim().is_empty() {
            bail!("user exists subject must not be empty");
        }
        self.service_config()
            .validate()
            .with_context(|| "invalid service settings")?;
        Ok(())
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            resource: "contents".to_string(),
            base_url: self.api_base_url.clone(),
            topics: self.bus.topics.clone(),
            user_lookup_timeout: Duration::from_millis(self.user_lookup_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "CONTENT_BIND",
        "CONTENT_METRICS_BIND",
        "CONTENT_API_BASE_URL",
        "CONTENT_STORAGE_BACKEND",
        "CONTENT_POSTGRES_URL",
        "ARANGODB_URL",
        "NATS_URL",
        "CONTENT_USER_LOOKUP_TIMEOUT_MS",
        "CONTENT_SHUTDOWN_GRACE_MS",
        "CONTENT_TOPIC_CREATE",
        "CONTENT_CONFIG",
    ];

    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let saved = KEYS
                .iter()
                .map(|key| (*key, std::env::var(key).ok()))
                .collect();
            for key in KEYS {
                unsafe {
                    std::env::remove_var(key);
                }
            }
            Self { saved }
        }

        fn set(&self, key: &str, value: &str) {
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(value) => unsafe {
                        std::env::set_var(key, value);
                    },
                    None => unsafe {
                        std::env::remove_var(key);
                    },
                }
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_use_memory_backend_without_bus() {
        let _env = EnvGuard::clean();
        let config = ContentConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, "0.0.0.0:9560".parse().expect("addr"));
        assert_eq!(config.api_base_url, "http://localhost:9560");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.bus.nats_url.is_none());
        assert_eq!(config.bus.user_exists_subject, "UserService.Exist");
        assert_eq!(config.user_lookup_timeout_ms, 10_000);
        assert_eq!(config.shutdown_grace_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn env_selects_backend_and_topics() {
        let env = EnvGuard::clean();
        env.set("CONTENT_STORAGE_BACKEND", "arangodb");
        env.set("CONTENT_TOPIC_CREATE", "Custom.Create");
        env.set("NATS_URL", "nats://bus:4222");
        let config = ContentConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::ArangoDb);
        let arango = config.arangodb.expect("arango config");
        assert_eq!(arango.database, "content");
        assert_eq!(arango.collection, "contents");
        assert_eq!(config.bus.topics.create, "Custom.Create");
        assert_eq!(config.bus.nats_url.as_deref(), Some("nats://bus:4222"));
    }

    #[test]
    #[serial]
    fn postgres_backend_requires_url() {
        let env = EnvGuard::clean();
        env.set("CONTENT_STORAGE_BACKEND", "postgres");
        let config = ContentConfig::from_env().expect("config");
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn malformed_values_are_reported() {
        let env = EnvGuard::clean();
        env.set("CONTENT_USER_LOOKUP_TIMEOUT_MS", "soon");
        let err = ContentConfig::from_env().expect_err("bad timeout");
        assert!(err.to_string().contains("CONTENT_USER_LOOKUP_TIMEOUT_MS"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let env = EnvGuard::clean();
        let path = std::env::temp_dir().join(format!(
            "content-config-{}.yaml",
            std::process::id()
        ));
        fs::write(
            &path,
            "api_base_url: https://api.example.org\nstorage: postgres\npostgres_url: postgres://db/content\nshutdown_grace_ms: 2500\ntopics:\n  delete: Custom.Delete\n",
        )
        .expect("write yaml");
        env.set("CONTENT_CONFIG", path.to_str().expect("utf8 path"));
        let config = ContentConfig::from_env_or_yaml().expect("config");
        let _ = fs::remove_file(&path);
        assert_eq!(config.api_base_url, "https://api.example.org");
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(
            config.postgres.as_ref().map(|pg| pg.url.as_str()),
            Some("postgres://db/content")
        );
        assert_eq!(config.shutdown_grace_ms, 2_500);
        assert_eq!(config.bus.topics.delete, "Custom.Delete");
        assert_eq!(config.service_config().topics.delete, "Custom.Delete");
    }
}
