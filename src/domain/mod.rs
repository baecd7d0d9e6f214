mod candidate_email;
mod validation_request;

pub use candidate_email::CandidateEmail;
pub use validation_request::ValidationRequest;
