use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_FETCH_CONCURRENCY;
use crate::catalog::CatalogHttpClient;
use crate::error::DexError;

pub const CONFIG_FILE_NAME: &str = "pokedex.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub catalog: Option<CatalogSection>,
    #[serde(default)]
    pub classifier: Option<ClassifierSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CatalogSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub fetch_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClassifierSection {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
}

impl ClassifierSettings {
    pub fn require_api_key(&self) -> Result<String, DexError> {
        self.api_key
            .clone()
            .ok_or_else(|| DexError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub source: Option<PathBuf>,
    pub catalog: CatalogSettings,
    pub classifier: ClassifierSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` when given. Otherwise tries `./pokedex.json`, then the
    /// user config directory, then falls back to built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DexError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            return Self::resolve_config(Config::default(), None, |name| {
                std::env::var(name).ok()
            });
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config, Some(config_path), |name| std::env::var(name).ok())
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("pokedex-finder").join("config.json"))
            .filter(|path| path.exists())
    }

    pub fn resolve_config<F>(
        config: Config,
        source: Option<PathBuf>,
        env: F,
    ) -> Result<ResolvedConfig, DexError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let schema_version = config.schema_version.unwrap_or(1);
        let catalog = config.catalog.unwrap_or_default();
        let classifier = config.classifier.unwrap_or_default();

        let fetch_concurrency = catalog
            .fetch_concurrency
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY);
        if fetch_concurrency == 0 {
            return Err(DexError::ConfigParse(
                "catalog.fetch_concurrency must be at least 1".to_string(),
            ));
        }

        let api_key_env = classifier
            .api_key_env
            .unwrap_or_else(|| default_api_key_env().to_string());
        let api_key = env(&api_key_env).filter(|key| !key.trim().is_empty());

        Ok(ResolvedConfig {
            schema_version,
            source,
            catalog: CatalogSettings {
                base_url: catalog
                    .base_url
                    .unwrap_or_else(|| CatalogHttpClient::DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(catalog.timeout_secs.unwrap_or(30)),
                fetch_concurrency,
            },
            classifier: ClassifierSettings {
                endpoint: classifier.endpoint.unwrap_or_else(|| {
                    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
                }),
                model: classifier
                    .model
                    .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
                api_key_env,
                api_key,
            },
        })
    }
}

pub fn default_api_key_env() -> &'static str {
    "GEMINI_API_KEY"
}
