use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::domain::CandidateEmail;

const JSON_API: &str = "application/vnd.api+json";

#[derive(Clone)]
pub struct KlaviyoClient {
    http_client: Client,
    subscriptions_url: Url,
    company_id: Option<SecretString>,
    list_id: Option<String>,
    revision: String,
    custom_source: String,
}

#[derive(thiserror::Error, Debug)]
pub enum KlaviyoError {
    #[error("Klaviyo {0} is not configured.")]
    MissingSetting(&'static str),
    #[error("Klaviyo rejected the subscription with status {status}.")]
    Rejected { status: u16, detail: Value },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct Typed<'a, T> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<T>,
}

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct SubscriptionAttributes<'a> {
    profile: Envelope<Typed<'a, ProfileAttributes<'a>>>,
    custom_source: &'a str,
}

#[derive(Serialize)]
struct ProfileAttributes<'a> {
    email: &'a str,
    subscriptions: ProfileSubscriptions,
}

#[derive(Serialize)]
struct ProfileSubscriptions {
    email: EmailChannel,
}

#[derive(Serialize)]
struct EmailChannel {
    marketing: MarketingConsent,
}

#[derive(Serialize)]
struct MarketingConsent {
    consent: &'static str,
    consented_at: String,
}

#[derive(Serialize)]
struct SubscriptionRelationships<'a> {
    list: Envelope<Typed<'a, ()>>,
}

#[derive(Serialize)]
struct SubscriptionData<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    attributes: SubscriptionAttributes<'a>,
    relationships: SubscriptionRelationships<'a>,
}

fn subscription_request<'a>(
    email: &'a str,
    list_id: &'a str,
    custom_source: &'a str,
) -> Envelope<SubscriptionData<'a>> {
    let consent = MarketingConsent {
        consent: "SUBSCRIBED",
        consented_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let profile = Typed {
        kind: "profile",
        id: None,
        attributes: Some(ProfileAttributes {
            email,
            subscriptions: ProfileSubscriptions {
                email: EmailChannel { marketing: consent },
            },
        }),
    };
    let list = Typed {
        kind: "list",
        id: Some(list_id),
        attributes: None,
    };

    Envelope {
        data: SubscriptionData {
            kind: "subscription",
            attributes: SubscriptionAttributes {
                profile: Envelope { data: profile },
                custom_source,
            },
            relationships: SubscriptionRelationships {
                list: Envelope { data: list },
            },
        },
    }
}

/// Klaviyo does not always answer with JSON, so unparseable bodies are
/// wrapped as `{"message": <text>}`.
fn parse_lenient(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text }))
}

impl KlaviyoClient {
    pub fn new(
        http_client: Client,
        base_url: &str,
        company_id: Option<SecretString>,
        list_id: Option<String>,
        revision: String,
        custom_source: String,
    ) -> Result<Self, anyhow::Error> {
        let subscriptions_url = Url::parse(base_url)?.join("client/subscriptions")?;
        Ok(Self {
            http_client,
            subscriptions_url,
            company_id,
            list_id,
            revision,
            custom_source,
        })
    }

    #[tracing::instrument(
        name = "Subscribing email to Klaviyo list",
        skip(self, email),
        fields(email = %email.as_ref(), list_id = tracing::field::Empty)
    )]
    pub async fn subscribe(&self, email: &CandidateEmail) -> Result<Value, KlaviyoError> {
        let company_id = self
            .company_id
            .as_ref()
            .ok_or(KlaviyoError::MissingSetting("public API key"))?;
        let list_id = self
            .list_id
            .as_deref()
            .ok_or(KlaviyoError::MissingSetting("list id"))?;
        tracing::Span::current().record("list_id", tracing::field::display(list_id));

        let body = subscription_request(email.as_ref(), list_id, &self.custom_source);

        let response = self
            .http_client
            .post(self.subscriptions_url.clone())
            .query(&[("company_id", company_id.expose_secret())])
            .header("accept", JSON_API)
            .header("content-type", JSON_API)
            .header("revision", &self.revision)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let detail = parse_lenient(response.text().await?);

        if !status.is_success() {
            return Err(KlaviyoError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(detail)
    }
}
