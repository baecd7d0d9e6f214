mod health_check;
mod helpers;
mod validate_email;

pub use health_check::*;
pub use helpers::*;
pub use validate_email::*;
