use url::Url;

use cvp_core::{Error, Result};
use cvp_inference::{DEFAULT_API_URL, DEFAULT_MODEL_NAME};

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const EMBEDDING_MODEL_NAME: &str = "EMBEDDING_MODEL_NAME";
pub const EMBEDDING_API_URL: &str = "EMBEDDING_API_URL";
pub const EMBEDDING_API_KEY: &str = "EMBEDDING_API_KEY";

/// Runtime settings needed to store results. Only loaded for `--upsert`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub supabase_url: Url,
    pub supabase_service_role_key: String,
    pub embedding_model_name: String,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
}

impl Settings {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = [SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY]
            .into_iter()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let raw_url = get(SUPABASE_URL).unwrap_or_default();
        let supabase_url = Url::parse(&raw_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| Error::Config(format!("{} is not an http(s) URL: {}", SUPABASE_URL, raw_url)))?;

        Ok(Self {
            supabase_url,
            supabase_service_role_key: get(SUPABASE_SERVICE_ROLE_KEY).unwrap_or_default(),
            embedding_model_name: get(EMBEDDING_MODEL_NAME).unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            embedding_api_url: get(EMBEDDING_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            embedding_api_key: get(EMBEDDING_API_KEY),
        })
    }

    pub fn inference_config(&self) -> cvp_inference::Config {
        cvp_inference::Config {
            api_key: self.embedding_api_key.clone(),
            model_name: self.embedding_model_name.clone(),
            api_url: self.embedding_api_url.clone(),
        }
    }

    pub fn backend_config(&self) -> cvp_storage::BackendConfig {
        cvp_storage::BackendConfig::new(self.supabase_url.as_str(), self.supabase_service_role_key.clone())
    }
}
