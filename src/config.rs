use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;
use url::Url;

const DEFAULT_PUBLIC_RPS: u32 = 50;
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub app_url: String,
    pub backend_url: String,
    pub stripe_secret_key: String,
    pub stripe_price_id: String,
    pub stripe_api_base: String,
    pub stripe_webhook_secret: Option<String>,
    pub clerk_signing_secret: Option<String>,
    pub session_jwt_secret: String,
    pub public_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);
        Ok(Self {
            server_address: vars.required("SERVER_ADDRESS")?,
            database_url: vars.required("DATABASE_URL")?,
            app_url: http_url("APP_URL", vars.required("APP_URL")?)?,
            backend_url: http_url("BACKEND_URL", vars.required("BACKEND_URL")?)?,
            stripe_secret_key: vars.required("STRIPE_SECRET_KEY")?,
            stripe_price_id: vars.required("STRIPE_PRICE_ID")?,
            stripe_api_base: http_url(
                "STRIPE_API_BASE",
                vars.optional("STRIPE_API_BASE")
                    .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            )?,
            stripe_webhook_secret: vars.optional("STRIPE_WEBHOOK_SECRET"),
            clerk_signing_secret: vars.optional("CLERK_SIGNING_SECRET"),
            session_jwt_secret: vars.required("SESSION_JWT_SECRET")?,
            public_rps: vars.parsed_or("PUBLIC_RPS", DEFAULT_PUBLIC_RPS)?,
        })
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<'a, F: Fn(&str) -> Option<String>> Vars<'a, F> {
    fn required(&self, name: &str) -> Result<String> {
        self.optional(name)
            .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
    }

    /// Blank values count as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn parsed_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
            None => Ok(default),
        }
    }
}

/// Absolute http(s) URL, returned without a trailing slash.
fn http_url(name: &str, value: String) -> Result<String> {
    let parsed = Url::parse(&value)
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{} must be an http(s) URL", name)));
    }
    Ok(value.trim_end_matches('/').to_string())
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
