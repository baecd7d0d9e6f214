use serde::Deserialize;

/// JSON body of a validation submission.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub email: String,
    #[serde(default)]
    pub turnstile_token: Option<String>,
}

impl ValidationRequest {
    /// The challenge token, with an empty string treated as missing.
    pub fn turnstile_token(&self) -> Option<&str> {
        self.turnstile_token.as_deref().filter(|t| !t.is_empty())
    }
}
