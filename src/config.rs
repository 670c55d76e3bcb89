use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Hosted store (PostgREST-style REST API)
    pub store_url: String,
    pub store_api_key: String,

    // Hosted auth (session gate); defaults to the store's host
    pub auth_url: String,

    // Optional service key accepted as an admin bearer token without
    // going through the auth backend (compared in constant time)
    pub admin_api_key: Option<String>,

    // Server
    pub port: u16,

    // Site
    pub default_language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_url = std::env::var("STORE_URL").context("STORE_URL not set")?;

        Ok(Self {
            store_api_key: std::env::var("STORE_API_KEY").context("STORE_API_KEY not set")?,

            auth_url: std::env::var("AUTH_URL").unwrap_or_else(|_| store_url.clone()),

            admin_api_key: std::env::var("ADMIN_API_KEY").ok().filter(|k| !k.is_empty()),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "tr".to_string()),

            store_url,
        })
    }
}
