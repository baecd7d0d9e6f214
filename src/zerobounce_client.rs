use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::domain::CandidateEmail;

/// Deliverability scoring. The provider's JSON object is passed through as is.
#[derive(Clone)]
pub struct ZeroBounceClient {
    http_client: Client,
    validate_url: Url,
    api_key: Option<SecretString>,
}

impl ZeroBounceClient {
    pub fn new(
        http_client: Client,
        base_url: &str,
        api_key: Option<SecretString>,
    ) -> Result<Self, anyhow::Error> {
        let validate_url = Url::parse(base_url)?.join("v2/validate")?;
        Ok(Self {
            http_client,
            validate_url,
            api_key,
        })
    }

    #[tracing::instrument(
        name = "Scoring email deliverability",
        skip(self, email),
        fields(email = %email.as_ref())
    )]
    pub async fn validate(
        &self,
        email: &CandidateEmail,
    ) -> Result<Map<String, Value>, anyhow::Error> {
        let api_key = self
            .api_key
            .as_ref()
            .context("ZeroBounce API key not configured")?;

        let response = self
            .http_client
            .get(self.validate_url.clone())
            .query(&[("api_key", api_key.expose_secret()), ("email", email.as_ref())])
            .send()
            .await
            .context("Failed to reach the ZeroBounce API.")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("ZeroBounce API error: {}", status.as_u16());
        }

        response
            .json::<Map<String, Value>>()
            .await
            .context("Failed to parse the ZeroBounce response.")
    }
}
