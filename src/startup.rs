use crate::configuration::Settings;
use crate::routes::{
    ValidationPipeline, health_check, method_not_allowed, preflight, validate_email,
};
use actix_web::dev::Server;
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, Resource, web};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub const VALIDATE_EMAIL_PATH: &str = "/validate-email";
pub const LEGACY_VALIDATE_EMAIL_PATH: &str = "/.netlify/functions/validate-email";

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::new();
        let pipeline = ValidationPipeline::new(
            config.turnstile.client(http_client.clone())?,
            config.zerobounce.client(http_client.clone())?,
            config.klaviyo.client(http_client)?,
        );

        let address = format!("{}:{}", config.app.host, config.app.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, pipeline)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
}

fn validate_email_resource(path: &str) -> Resource {
    web::resource(path)
        .route(web::method(Method::OPTIONS).to(preflight))
        .route(web::post().to(validate_email))
        .default_service(web::to(method_not_allowed))
}

pub fn run(listener: TcpListener, pipeline: ValidationPipeline) -> Result<Server, anyhow::Error> {
    let pipeline = web::Data::new(pipeline);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(validate_email_resource(VALIDATE_EMAIL_PATH))
            .service(validate_email_resource(LEGACY_VALIDATE_EMAIL_PATH))
            .app_data(pipeline.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
