use serde_json::{Map, Value};

use super::errors::ValidateEmailError;
use crate::{
    domain::{CandidateEmail, ValidationRequest},
    klaviyo_client::{KlaviyoClient, KlaviyoError},
    turnstile_client::{TurnstileClient, TurnstileError},
    zerobounce_client::ZeroBounceClient,
};

/// Challenge, deliverability and subscription stages, run one after another.
///
/// The challenge and subscription stages are optional; a `None` client skips
/// the stage. `klaviyo` only appears in the success body when its stage ran.
pub struct ValidationPipeline {
    turnstile: Option<TurnstileClient>,
    zerobounce: ZeroBounceClient,
    klaviyo: Option<KlaviyoClient>,
}

impl ValidationPipeline {
    pub fn new(
        turnstile: Option<TurnstileClient>,
        zerobounce: ZeroBounceClient,
        klaviyo: Option<KlaviyoClient>,
    ) -> Self {
        Self {
            turnstile,
            zerobounce,
            klaviyo,
        }
    }

    #[tracing::instrument(
        name = "Running the email validation pipeline",
        skip(self, request),
        fields(email = %request.email)
    )]
    pub async fn run(
        &self,
        request: ValidationRequest,
    ) -> Result<Map<String, Value>, ValidateEmailError> {
        let email = CandidateEmail::parse(request.email.clone())
            .map_err(ValidateEmailError::InvalidEmail)?;

        if let Some(turnstile) = &self.turnstile {
            verify_challenge(turnstile, request.turnstile_token()).await?;
        }

        let mut outcome = self.zerobounce.validate(&email).await?;
        outcome.insert("turnstileSuccess".into(), Value::Bool(true));

        if let Some(klaviyo) = &self.klaviyo {
            let subscription = klaviyo.subscribe(&email).await.map_err(|e| match e {
                KlaviyoError::Rejected { status, detail } => {
                    ValidateEmailError::SubscriptionRejected { status, detail }
                }
                KlaviyoError::Request(e) => ValidateEmailError::SubscriptionFailed(e),
                e @ KlaviyoError::MissingSetting(_) => ValidateEmailError::UnexpectedError(e.into()),
            })?;
            outcome.insert("klaviyo".into(), subscription);
        }

        Ok(outcome)
    }
}

async fn verify_challenge(
    turnstile: &TurnstileClient,
    token: Option<&str>,
) -> Result<(), ValidateEmailError> {
    let token = token.ok_or(ValidateEmailError::MissingTurnstileToken)?;

    let outcome = match turnstile.verify(token).await {
        Ok(outcome) => outcome,
        Err(TurnstileError::MissingSecret) => {
            tracing::error!("Turnstile secret key is not configured");
            return Err(ValidateEmailError::TurnstileNotConfigured);
        }
        Err(e @ TurnstileError::Request(_)) => {
            return Err(anyhow::Error::new(e)
                .context("Turnstile verification request failed.")
                .into());
        }
    };

    if !outcome.success {
        tracing::warn!(error_codes = ?outcome.error_codes, "Turnstile verification failed");
        return Err(ValidateEmailError::ChallengeFailed(outcome.error_codes));
    }

    tracing::info!("Turnstile verification passed");
    Ok(())
}
