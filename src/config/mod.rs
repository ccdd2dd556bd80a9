// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

pub const ENV_BACKEND_URL: &str = "ROLE_BACKEND_URL";
pub const ENV_BACKEND_ANON_KEY: &str = "ROLE_BACKEND_ANON_KEY";
pub const ENV_BACKEND_SERVICE_KEY: &str = "ROLE_BACKEND_SERVICE_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Role {
    #[serde(rename = "role")]
    pub role: RoleBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub runtime: Option<Runtime>,
    pub api: Option<Api>,
    pub backend: Backend,
    pub cache: Option<Cache>,
    pub forms: Option<Forms>,
    pub push: Option<Push>,
    pub storage: Option<Storage>,
    pub compression: Option<Compression>,
    pub k8s: Option<K8S>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Runtime {
    pub num_cpus: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub port: Option<String>,
    #[serde(rename = "allowed_origins")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hosted backend over its REST surface.
    Rest,
    /// In-process tables, for local development and tests.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Backend {
    pub mode: BackendMode,
    pub url: Option<String>,
    #[serde(rename = "anon_key", skip_serializing)]
    pub anon_key: Option<String>,
    #[serde(rename = "service_key", skip_serializing)]
    pub service_key: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Cache {
    pub enabled: bool,
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    pub capacity: Option<usize>,
    #[serde(rename = "sweep_interval", default, with = "humantime_serde")]
    pub sweep_interval: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimit {
    pub requests: u32,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Forms {
    pub newsletter: Option<RateLimit>,
    #[serde(rename = "job_application")]
    pub job_application: Option<RateLimit>,
    #[serde(rename = "cleanup_interval", default, with = "humantime_serde")]
    pub cleanup_interval: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Push {
    pub enabled: bool,
    #[serde(rename = "relay_url")]
    pub relay_url: Option<String>,
    #[serde(rename = "relay_token", skip_serializing)]
    pub relay_token: Option<String>,
    pub concurrency: Option<usize>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// How long the push service should keep an undelivered message.
    #[serde(rename = "message_ttl", default, with = "humantime_serde")]
    pub message_ttl: Option<Duration>,
}

/// A table column holding references to stored objects.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageReference {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bucket {
    pub name: String,
    pub references: Vec<StorageReference>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Storage {
    pub buckets: Vec<Bucket>,
    #[serde(rename = "min_age", default, with = "humantime_serde")]
    pub min_age: Option<Duration>,
    #[serde(rename = "batch_size")]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Compression {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Probe {
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct K8S {
    pub probe: Probe,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn runtime(&self) -> &Runtime;
    fn api(&self) -> Option<&Api>;
    fn backend(&self) -> &Backend;
    fn cache(&self) -> Option<&Cache>;
    fn forms(&self) -> Option<&Forms>;
    fn push(&self) -> Option<&Push>;
    fn storage(&self) -> Option<&Storage>;
    fn compression(&self) -> Option<&Compression>;
    fn k8s(&self) -> Option<&K8S>;
}

// Config type alias for convenience
pub type Config = Role;

static NO_RUNTIME: Runtime = Runtime { num_cpus: 0 };

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.role.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.role.env == PROD
    }

    fn is_test(&self) -> bool {
        self.role.env == TEST
    }

    fn runtime(&self) -> &Runtime {
        self.role.runtime.as_ref().unwrap_or(&NO_RUNTIME)
    }

    fn api(&self) -> Option<&Api> {
        self.role.api.as_ref()
    }

    fn backend(&self) -> &Backend {
        &self.role.backend
    }

    fn cache(&self) -> Option<&Cache> {
        self.role.cache.as_ref()
    }

    fn forms(&self) -> Option<&Forms> {
        self.role.forms.as_ref()
    }

    fn push(&self) -> Option<&Push> {
        self.role.push.as_ref()
    }

    fn storage(&self) -> Option<&Storage> {
        self.role.storage.as_ref()
    }

    fn compression(&self) -> Option<&Compression> {
        self.role.compression.as_ref()
    }

    fn k8s(&self) -> Option<&K8S> {
        self.role.k8s.as_ref()
    }
}

impl Config {
    /// Loads configuration from a YAML file, then applies env overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let mut cfg = Self::from_yaml(&data)
            .with_context(|| format!("unmarshal yaml from {:?}", abs_path))?;

        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Role = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    /// Overrides backend secrets with values from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = &mut self.role.backend;
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            backend.url = Some(url);
        }
        if let Some(key) = lookup(ENV_BACKEND_ANON_KEY) {
            backend.anon_key = Some(key);
        }
        if let Some(key) = lookup(ENV_BACKEND_SERVICE_KEY) {
            backend.service_key = Some(key);
        }
    }

    /// Checks cross-field requirements serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let backend = self.backend();
        if backend.mode == BackendMode::Rest {
            let url = backend
                .url
                .as_deref()
                .context("backend.url is required in rest mode")?;
            url::Url::parse(url).with_context(|| format!("invalid backend.url {:?}", url))?;
            if backend.service_key.is_none() {
                anyhow::bail!("backend.service_key is required in rest mode");
            }
        }

        // tokio intervals panic on a zero period.
        if let Some(cache) = self.cache() {
            if cache.sweep_interval.is_some_and(|d| d.is_zero()) {
                anyhow::bail!("cache.sweep_interval must be greater than zero");
            }
        }
        if let Some(forms) = self.forms() {
            if forms.cleanup_interval.is_some_and(|d| d.is_zero()) {
                anyhow::bail!("forms.cleanup_interval must be greater than zero");
            }
            let limits = [
                ("newsletter", &forms.newsletter),
                ("job_application", &forms.job_application),
            ];
            for (name, limit) in limits {
                if let Some(limit) = limit {
                    if limit.requests == 0 || limit.window.is_zero() {
                        anyhow::bail!("forms.{} needs non-zero requests and window", name);
                    }
                }
            }
        }

        if let Some(push) = self.push() {
            if push.enabled && push.relay_url.is_none() {
                anyhow::bail!("push.relay_url is required when push is enabled");
            }
        }

        if let Some(storage) = self.storage() {
            for bucket in &storage.buckets {
                if bucket.references.is_empty() {
                    anyhow::bail!(
                        "storage bucket {:?} has no references; every object would be an orphan",
                        bucket.name
                    );
                }
            }
        }

        Ok(())
    }

    /// Cache TTL, defaulting to five minutes.
    pub fn cache_ttl(&self) -> Duration {
        self.cache()
            .and_then(|c| c.ttl)
            .unwrap_or(Duration::from_secs(5 * 60))
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache().and_then(|c| c.capacity).unwrap_or(1024)
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache().map(|c| c.enabled).unwrap_or(false)
    }

    pub fn newsletter_limit(&self) -> RateLimit {
        self.forms()
            .and_then(|f| f.newsletter.clone())
            .unwrap_or(RateLimit {
                requests: 5,
                window: Duration::from_secs(10 * 60),
            })
    }

    pub fn job_application_limit(&self) -> RateLimit {
        self.forms()
            .and_then(|f| f.job_application.clone())
            .unwrap_or(RateLimit {
                requests: 3,
                window: Duration::from_secs(60 * 60),
            })
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
