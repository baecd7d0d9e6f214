use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::super::helpers::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ValidateEmailError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Turnstile token is required")]
    MissingTurnstileToken,
    #[error("Turnstile verification not configured")]
    TurnstileNotConfigured,
    #[error("Verification challenge failed")]
    ChallengeFailed(Option<Vec<String>>),
    #[error("Klaviyo API error")]
    SubscriptionRejected { status: u16, detail: Value },
    #[error("Failed to subscribe to Klaviyo")]
    SubscriptionFailed(#[source] reqwest::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ValidateEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TurnstileErrorBody<'a> {
    turnstile_error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    turnstile_detail: Option<&'a [String]>,
}

impl ValidateEmailError {
    fn turnstile_body(&self) -> TurnstileErrorBody<'_> {
        let turnstile_detail = match self {
            ValidateEmailError::ChallengeFailed(codes) => codes.as_deref(),
            _ => None,
        };
        TurnstileErrorBody {
            turnstile_error: match self {
                ValidateEmailError::MissingTurnstileToken => "Turnstile token is required",
                ValidateEmailError::TurnstileNotConfigured => {
                    "Turnstile verification not configured"
                }
                _ => "Verification challenge failed",
            },
            turnstile_detail,
        }
    }
}

impl ResponseError for ValidateEmailError {
    fn status_code(&self) -> StatusCode {
        match self {
            ValidateEmailError::InvalidEmail(_)
            | ValidateEmailError::MissingTurnstileToken
            | ValidateEmailError::ChallengeFailed(_) => StatusCode::BAD_REQUEST,
            ValidateEmailError::SubscriptionRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ValidateEmailError::TurnstileNotConfigured
            | ValidateEmailError::SubscriptionFailed(_)
            | ValidateEmailError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            ValidateEmailError::MissingTurnstileToken
            | ValidateEmailError::TurnstileNotConfigured
            | ValidateEmailError::ChallengeFailed(_) => response.json(self.turnstile_body()),
            ValidateEmailError::InvalidEmail(_) => response.json(ErrorBody {
                error: "Invalid email format",
                detail: None,
            }),
            ValidateEmailError::SubscriptionRejected { detail, .. } => response.json(ErrorBody {
                error: "Klaviyo API error",
                detail: Some(detail.clone()),
            }),
            ValidateEmailError::SubscriptionFailed(e) => response.json(ErrorBody {
                error: "Failed to subscribe to Klaviyo",
                detail: Some(Value::String(e.to_string())),
            }),
            ValidateEmailError::UnexpectedError(_) => response.json(ErrorBody {
                error: "Failed to validate email",
                detail: None,
            }),
        }
    }
}
