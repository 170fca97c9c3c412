use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "INSPECTOR";
const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8000/predict";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_PATH: &str = "data/posts.sqlite";

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSettings {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub classifier: ClassifierSettings,
    pub db_path: String,
}

impl Settings {
    /// Defaults overlaid with `INSPECTOR_*` environment variables, e.g.
    /// `INSPECTOR_CLASSIFIER__URL`, `INSPECTOR_CLASSIFIER__TIMEOUT_SECS`,
    /// `INSPECTOR_DB_PATH`.
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("classifier.url", DEFAULT_CLASSIFIER_URL)?
            .set_default("classifier.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("db_path", DEFAULT_DB_PATH)?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}
