use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub platform_url: String,
    pub platform_anon_key: String,
    pub platform_service_key: String,
    pub allowed_origins: Vec<String>,
    pub production: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let anon_key = get_env("PLATFORM_ANON_KEY")?;
        // Admin operations fall back to the anon key when no service key is set.
        let service_key = env::var("PLATFORM_SERVICE_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| anon_key.clone());

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            platform_url: get_env("PLATFORM_URL")?.trim_end_matches('/').to_string(),
            platform_anon_key: anon_key,
            platform_service_key: service_key,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
