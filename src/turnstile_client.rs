use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct TurnstileClient {
    http_client: Client,
    siteverify_url: Url,
    secret_key: Option<SecretString>,
}

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct SiteverifyResponse {
    // A reply without `success` counts as a failed challenge.
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "error-codes")]
    pub error_codes: Option<Vec<String>>,
}

#[derive(thiserror::Error, Debug)]
pub enum TurnstileError {
    #[error("Turnstile secret key is not configured.")]
    MissingSecret,
    #[error("Failed to verify the Turnstile token.")]
    Request(#[from] reqwest::Error),
}

impl TurnstileClient {
    pub fn new(
        http_client: Client,
        base_url: &str,
        secret_key: Option<SecretString>,
    ) -> Result<Self, anyhow::Error> {
        let siteverify_url = Url::parse(base_url)?.join("turnstile/v0/siteverify")?;
        Ok(Self {
            http_client,
            siteverify_url,
            secret_key,
        })
    }

    #[tracing::instrument(name = "Verifying Turnstile token", skip_all)]
    pub async fn verify(&self, token: &str) -> Result<SiteverifyResponse, TurnstileError> {
        let secret_key = self
            .secret_key
            .as_ref()
            .ok_or(TurnstileError::MissingSecret)?;

        let body = SiteverifyRequest {
            secret: secret_key.expose_secret(),
            response: token,
        };

        let outcome = self
            .http_client
            .post(self.siteverify_url.clone())
            .json(&body)
            .send()
            .await?
            .json::<SiteverifyResponse>()
            .await?;

        Ok(outcome)
    }
}
