use reqwest::Client;
use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::klaviyo_client::KlaviyoClient;
use crate::turnstile_client::TurnstileClient;
use crate::zerobounce_client::ZeroBounceClient;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub turnstile: TurnstileSettings,
    pub zerobounce: ZeroBounceSettings,
    pub klaviyo: KlaviyoSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct TurnstileSettings {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub secret_key: Option<SecretString>,
}

impl TurnstileSettings {
    /// `None` when the challenge stage is switched off.
    pub fn client(self, http_client: Client) -> Result<Option<TurnstileClient>, anyhow::Error> {
        if !self.enabled {
            return Ok(None);
        }
        TurnstileClient::new(http_client, &self.base_url, self.secret_key).map(Some)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ZeroBounceSettings {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

impl ZeroBounceSettings {
    pub fn client(self, http_client: Client) -> Result<ZeroBounceClient, anyhow::Error> {
        ZeroBounceClient::new(http_client, &self.base_url, self.api_key)
    }
}

fn default_revision() -> String {
    "2025-01-15".into()
}

fn default_custom_source() -> String {
    "Coming Soon".into()
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct KlaviyoSettings {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub company_id: Option<SecretString>,
    pub list_id: Option<String>,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default = "default_custom_source")]
    pub custom_source: String,
}

impl KlaviyoSettings {
    /// `None` when the subscription stage is switched off.
    pub fn client(self, http_client: Client) -> Result<Option<KlaviyoClient>, anyhow::Error> {
        if !self.enabled {
            return Ok(None);
        }
        KlaviyoClient::new(
            http_client,
            &self.base_url,
            self.company_id,
            self.list_id,
            self.revision,
            self.custom_source,
        )
        .map(Some)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not supported environment. Try to use `local` or `production`",
            )),
        }
    }
}

// Variable names used by the hosted function deployment. They win over the
// `APP_` prefixed ones so existing environments keep working.
const LEGACY_ENV_KEYS: [(&str, &str); 4] = [
    ("turnstile.secret_key", "CF_TURNSTILE_SECRET_KEY"),
    ("zerobounce.api_key", "ZEROBOUNCE_API_KEY"),
    ("klaviyo.company_id", "KLAVIYO_PUBLIC_API_KEY"),
    ("klaviyo.list_id", "KLAVIYO_LIST_ID"),
];

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine current directory: {e}"))
    })?;
    let conf_dir = base_path.join("configuration");
    let env: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let mut builder = config::Config::builder()
        .add_source(config::File::from(conf_dir.join("base")).required(true))
        .add_source(config::File::from(conf_dir.join(env.as_str())).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .prefix_separator("_"),
        );

    for (key, variable) in LEGACY_ENV_KEYS {
        let value = std::env::var(variable).ok().filter(|v| !v.is_empty());
        builder = builder.set_override_option(key, value)?;
    }

    builder.build()?.try_deserialize::<Settings>()
}
