use once_cell::sync::Lazy;
use regex_lite::Regex;

// Local part is restricted to alphanumerics and dots. Addresses with `+`,
// `_` or `-` before the `@` are rejected on purpose.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Failed to compile the email pattern")
});

/// An email address that passed the submission format check.
#[derive(Debug, Clone)]
pub struct CandidateEmail(String);

impl CandidateEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        if !EMAIL_PATTERN.is_match(&s) {
            return Err(format!("{} is not a valid candidate email.", s));
        };
        Ok(Self(s))
    }
}

impl AsRef<str> for CandidateEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CandidateEmail {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        CandidateEmail::parse(value)
    }
}
