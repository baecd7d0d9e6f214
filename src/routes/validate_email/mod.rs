mod errors;
mod handler;
mod pipeline;

pub use errors::ValidateEmailError;
pub use handler::{method_not_allowed, preflight, validate_email};
pub use pipeline::ValidationPipeline;
