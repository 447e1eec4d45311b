use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: usize = 16;
const DEFAULT_INDEX_CACHE_TTL_SECS: u64 = 20;
pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{}', expected postgres or memory", other),
        }
    }
}

/// Settings every request handler may need. Cloned into `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub jwt_secret: String,
    pub login_url: String,
    pub media_root: PathBuf,
    /// Zero disables the index page cache.
    pub index_cache_ttl: Duration,
    pub allowed_origins: Vec<String>,
    /// JSON list of groups created at startup when missing.
    pub groups_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(p) => p.parse().with_context(|| format!("PORT is not a port number: {}", p))?,
            Err(_) => DEFAULT_PORT,
        };

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .parse()?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let index_cache_ttl = match env::var("INDEX_CACHE_TTL_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("INDEX_CACHE_TTL_SECS is not a number: {}", v))?,
            Err(_) => DEFAULT_INDEX_CACHE_TTL_SECS,
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

        Ok(Self {
            port,
            store_backend,
            jwt_secret,
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.into()),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            index_cache_ttl: Duration::from_secs(index_cache_ttl),
            allowed_origins: split_origins(&allowed_origins),
            groups_file: env::var("GROUPS_FILE").ok().map(PathBuf::from),
        })
    }

    /// Config for tests and local runs: in-memory store, cache off.
    pub fn for_memory(jwt_secret: impl Into<String>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            store_backend: StoreBackend::Memory,
            jwt_secret: jwt_secret.into(),
            login_url: DEFAULT_LOGIN_URL.into(),
            media_root: media_root.into(),
            index_cache_ttl: Duration::ZERO,
            allowed_origins: Vec::new(),
            groups_file: None,
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn get_pg_pool() -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(env::var("PG_HOST").context("PG_HOST not set")?);
    cfg.user = Some(env::var("PG_USER").context("PG_USER not set")?);
    cfg.password = env::var("PG_PASS").ok();
    cfg.dbname = Some(env::var("PG_DB").context("PG_DB not set")?);
    if let Ok(port) = env::var("PG_PORT") {
        cfg.port = Some(port.parse().with_context(|| format!("PG_PORT is not a port number: {}", port))?);
    }

    let max_size = match env::var("PG_POOL_SIZE") {
        Ok(v) => v
            .parse()
            .with_context(|| format!("PG_POOL_SIZE is not a number: {}", v))?,
        Err(_) => DEFAULT_POOL_SIZE,
    };
    let mut pool_cfg = cfg.pool.unwrap_or_else(PoolConfig::default);
    pool_cfg.max_size = max_size;
    cfg.pool = Some(pool_cfg);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("failed to create postgres pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn splits_origins_and_drops_blanks() {
        assert_eq!(
            split_origins("http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn memory_config_disables_cache() {
        let cfg = AppConfig::for_memory("secret", "/tmp/media");
        assert_eq!(cfg.index_cache_ttl, Duration::ZERO);
        assert_eq!(cfg.login_url, DEFAULT_LOGIN_URL);
    }
}
