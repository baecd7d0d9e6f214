pub mod configuration;
pub mod domain;
pub mod klaviyo_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod turnstile_client;
pub mod zerobounce_client;
