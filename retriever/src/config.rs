use anyhow::Result;
use serde::Deserialize;

use crate::retriever::RetrieverConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub weaviate_url: String,
    pub weaviate_api_key: Option<String>,
    pub embedding_service_url: String,
    pub index_name: String,
    pub text_key: String,
    pub alpha: f32,
    pub k: usize,
    pub log_level: String,
}

impl Settings {
    /// Loads settings from defaults overlaid with environment variables
    /// (`PORT`, `WEAVIATE_URL`, `ALPHA`, ...). A `.env` file is honored.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load(config::Environment::default())
    }

    fn load(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("port", 8004)?
            .set_default("weaviate_url", "http://localhost:8080")?
            .set_default("embedding_service_url", "http://localhost:8002")?
            .set_default("index_name", "Passage")?
            .set_default("text_key", "text")?
            .set_default("alpha", RetrieverConfig::DEFAULT_ALPHA as f64)?
            .set_default("k", RetrieverConfig::DEFAULT_K as i64)?
            .set_default("log_level", "info")?
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig::new(&self.index_name, &self.text_key)
            .with_alpha(self.alpha)
            .with_k(self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = Settings::load(env(&[])).unwrap();
        assert_eq!(settings.port, 8004);
        assert_eq!(settings.index_name, "Passage");
        assert_eq!(settings.text_key, "text");
        assert_eq!(settings.alpha, 0.5);
        assert_eq!(settings.k, 4);
        assert!(settings.weaviate_api_key.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load(env(&[
            ("PORT", "9000"),
            ("INDEX_NAME", "Article"),
            ("ALPHA", "0.25"),
            ("K", "10"),
            ("WEAVIATE_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.weaviate_api_key.as_deref(), Some("secret"));

        let config = settings.retriever_config();
        assert_eq!(config.index_name, "Article");
        assert_eq!(config.alpha, 0.25);
        assert_eq!(config.k, 10);
    }
}
