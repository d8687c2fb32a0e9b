//! The configuration structs used to build the AppConfig, and their impls.
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{
    ConfigError, ConfigResult, API_BASE_URL_VAR, API_KEY_VAR, AUDIENCE_ID_VAR, SERVER_PREFIX_VAR,
};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub provider_config: ProviderConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Everything needed to talk to the mailing-list provider.
/// The credentials are optional here, a missing one only surfaces when
/// `credentials()` is called.
#[derive(Deserialize, Clone, Debug)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub server_prefix: Option<String>,
    #[serde(default)]
    pub audience_id: Option<String>,
    /// Overrides the `https://{server_prefix}.api.mailchimp.com/3.0/` base.
    #[serde(default)]
    pub api_base_url: Option<String>,
    pub timeout_millis: u64,
}

/// A complete set of provider credentials.
#[derive(Clone, Debug)]
pub struct ProviderCredentials {
    pub api_key: SecretString,
    pub server_prefix: String,
    pub audience_id: String,
    pub api_base_url: Option<String>,
}

// ###################################
// ->   IMPLs
// ###################################
impl ProviderConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }

    /// Returns the credentials if all three of them are present and non-empty.
    pub fn credentials(&self) -> ConfigResult<ProviderCredentials> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;
        let server_prefix = non_empty(&self.server_prefix)
            .ok_or(ConfigError::MissingCredential(SERVER_PREFIX_VAR))?;
        let audience_id = non_empty(&self.audience_id)
            .ok_or(ConfigError::MissingCredential(AUDIENCE_ID_VAR))?;

        Ok(ProviderCredentials {
            api_key: api_key.clone(),
            server_prefix: server_prefix.to_string(),
            audience_id: audience_id.to_string(),
            api_base_url: non_empty(&self.api_base_url).map(str::to_string),
        })
    }
}

impl ProviderCredentials {
    /// The API root every provider path is joined onto. Always ends with a '/'.
    pub fn base_url(&self) -> String {
        let mut base_url = self
            .api_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.api.mailchimp.com/3.0/", self.server_prefix));
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        base_url
    }
}

impl AppConfig {
    /// Fills the provider config from the `MAILCHIMP_*` variables returned by `lookup`.
    /// Variables that are unset leave the current value alone.
    pub fn with_provider_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = &mut self.provider_config;
        if let Some(api_key) = lookup(API_KEY_VAR) {
            provider.api_key = Some(SecretString::from(api_key));
        }
        if let Some(server_prefix) = lookup(SERVER_PREFIX_VAR) {
            provider.server_prefix = Some(server_prefix);
        }
        if let Some(audience_id) = lookup(AUDIENCE_ID_VAR) {
            provider.audience_id = Some(audience_id);
        }
        if let Some(api_base_url) = lookup(API_BASE_URL_VAR) {
            provider.api_base_url = Some(api_base_url);
        }

        self
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}
