//! Store configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (`RTTP_CACHE_*`)
//! 2. TOML config file (if `RTTP_CACHE_CONFIG_FILE` is set)
//! 3. Built-in defaults
//!
//! Configuration is consumed once, by [`StoreConfig::build`]; the store never
//! re-reads it.

use std::sync::Arc;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheBackend, CacheStore, LockStrategy, MemoryBackend, StoreOptions};

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
const ENV_PREFIX: &str = "RTTP_CACHE_";

/// Environment variable naming an optional TOML file.
const CONFIG_FILE_ENV: &str = "RTTP_CACHE_CONFIG_FILE";

/// Which key-value backend the store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process [`MemoryBackend`].
    #[default]
    Memory,
}

/// Cache store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    ///
    /// Set via RTTP_CACHE_BACKEND.
    #[serde(default)]
    pub backend: BackendKind,

    /// Lifetime the backend applies to writes that carry no TTL (metadata
    /// rewritten by invalidate, responses without freshness information).
    /// `None` keeps such values until deleted.
    ///
    /// Set via RTTP_CACHE_DEFAULT_TTL_SECS.
    #[serde(default)]
    pub default_ttl_secs: Option<u64>,

    /// Response headers stripped before persistence.
    ///
    /// Set via RTTP_CACHE_PRIVATE_HEADERS, e.g. `[Set-Cookie, X-Session]`.
    #[serde(default = "default_private_headers")]
    pub private_headers: Vec<String>,

    /// Emit hit / miss / write log events.
    ///
    /// Set via RTTP_CACHE_LOG_EVENTS.
    #[serde(default = "default_true")]
    pub log_events: bool,

    /// Lifetime of a single-flight lock. `None` disables locking.
    ///
    /// Set via RTTP_CACHE_LOCK_TTL_SECS.
    #[serde(default)]
    pub lock_ttl_secs: Option<u64>,

    /// Drop metadata entries whose body has disappeared when a lookup hits them.
    ///
    /// Set via RTTP_CACHE_PURGE_ORPHANED_METADATA.
    #[serde(default)]
    pub purge_orphaned_metadata: bool,
}

fn default_private_headers() -> Vec<String> {
    vec!["Set-Cookie".into()]
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            default_ttl_secs: None,
            private_headers: default_private_headers(),
            log_events: true,
            lock_ttl_secs: None,
            purge_orphaned_metadata: false,
        }
    }
}

impl StoreConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            private_headers: self.private_headers.clone(),
            lock: self
                .lock_ttl_secs
                .map_or(LockStrategy::Disabled, |secs| LockStrategy::Backend {
                    ttl: Duration::from_secs(secs),
                }),
            purge_orphaned_metadata: self.purge_orphaned_metadata,
            log_events: self.log_events,
        }
    }

    /// Instantiates the selected backend.
    pub fn backend(&self) -> Arc<dyn CacheBackend> {
        match self.backend {
            BackendKind::Memory => Arc::new(match self.default_ttl_secs {
                Some(secs) => MemoryBackend::with_default_ttl(Duration::from_secs(secs)),
                None => MemoryBackend::new(),
            }),
        }
    }

    /// Builds a cache store over the selected backend.
    pub fn build(&self) -> CacheStore {
        tracing::debug!(
            backend = ?self.backend,
            private_headers = ?self.private_headers,
            locking = self.lock_ttl_secs.is_some(),
            "building http cache store"
        );
        CacheStore::with_options(self.backend(), self.store_options())
    }
}
