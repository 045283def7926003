// Application settings, loaded with the 'config' crate and '.env' support.
// Precedence: defaults < config.toml < APP_* environment variables.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_address: String,
    // Base URL of the prediction backend (VIN lookup, predict, results)
    pub api_base_url: String,
    // Optional outbound proxy for backend requests
    pub proxy_url: Option<String>,
    // Mark the session cookie Secure (set when served over HTTPS)
    pub secure_cookies: bool,
    pub static_dir: String,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Self::defaults()?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_API_BASE_URL)
            .add_source(Environment::with_prefix("APP").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("api_base_url", "http://localhost:5000")?
            .set_default("secure_cookies", false)?
            .set_default("static_dir", "static")?)
    }
}
