use actix_web::{HttpResponse, web};
use anyhow::Context;
use serde_json::{Map, Value};

use super::{errors::ValidateEmailError, pipeline::ValidationPipeline};
use crate::domain::ValidationRequest;

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(serde_json::json!({ "error": "Method Not Allowed" }))
}

#[tracing::instrument(name = "Validating a submitted email", skip(body, pipeline))]
pub async fn validate_email(
    body: Result<web::Bytes, actix_web::Error>,
    pipeline: web::Data<ValidationPipeline>,
) -> Result<HttpResponse, ValidateEmailError> {
    let outcome = match body {
        Ok(body) => parse_and_run(&body, &pipeline).await,
        // Oversized or interrupted payloads take the generic 500 path.
        Err(e) => Err(anyhow::anyhow!("Failed to read the request body: {e}").into()),
    };

    if let Err(
        e @ (ValidateEmailError::UnexpectedError(_) | ValidateEmailError::SubscriptionFailed(_)),
    ) = &outcome
    {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Email validation failed"
        );
    }

    outcome.map(|merged| HttpResponse::Ok().json(merged))
}

// A body that is not JSON or lacks `email` is an unexpected error (500), not
// a client error.
async fn parse_and_run(
    body: &[u8],
    pipeline: &ValidationPipeline,
) -> Result<Map<String, Value>, ValidateEmailError> {
    let request: ValidationRequest =
        serde_json::from_slice(body).context("Failed to parse the validation request body.")?;

    pipeline.run(request).await
}
