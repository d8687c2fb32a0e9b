//! Builds an `AppConfig` from layered config files and the environment.
//!
//! Layers, last one wins:
//! - `config/base.toml`
//! - `config/{local|production}.toml` picked by `APP_ENVIRONMENT` (defaults to `local`)
//! - `APP_` prefixed environment variables, `__` separates nested keys
//!   (e.g. `APP_NET_CONFIG__APP_PORT=9000`)
//! - `MAILCHIMP_API_KEY`, `MAILCHIMP_SERVER_PREFIX`, `MAILCHIMP_AUDIENCE_ID` and
//!   `MAILCHIMP_API_BASE_URL` for the newsletter provider
//!
//! The configuration is loaded once in `main` and handed to `App::build_from_config`.

mod data;
mod error;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use data::{AppConfig, Environment, NetConfig, ProviderConfig, ProviderCredentials};
pub use error::{ConfigError, ConfigResult};

pub const API_KEY_VAR: &str = "MAILCHIMP_API_KEY";
pub const SERVER_PREFIX_VAR: &str = "MAILCHIMP_SERVER_PREFIX";
pub const AUDIENCE_ID_VAR: &str = "MAILCHIMP_AUDIENCE_ID";
pub const API_BASE_URL_VAR: &str = "MAILCHIMP_API_BASE_URL";

impl AppConfig {
    /// Loads the configuration for the environment named in `APP_ENVIRONMENT`
    /// from the `config` directory under the current working directory.
    pub fn load() -> ConfigResult<Self> {
        info!("{:<12} - Initializing the configuration", "load_config");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;
        let config_dir = std::env::current_dir()?.join("config");

        let config = Self::load_from(&config_dir, &environment)?
            .with_provider_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Reads the config files for `environment` from `config_dir` and applies
    /// the `APP_` environment overrides. Provider credentials are not touched.
    pub fn load_from(config_dir: &Path, environment: &Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let config = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        Ok(config)
    }
}
