use mailgate::{
    configuration::{Settings, get_configuration},
    startup::{Application, VALIDATE_EMAIL_PATH},
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::Value;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{any, method, path},
};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const VALID_EMAIL: &str = "ursula.le.guin@earthsea.com";

pub struct TestApp {
    pub address: String,
    pub turnstile_server: MockServer,
    pub zerobounce_server: MockServer,
    pub klaviyo_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_validation(&self, body: &Value) -> reqwest::Response {
        self.send(Method::POST, VALIDATE_EMAIL_PATH, body.to_string())
            .await
    }

    pub async fn send(&self, method: Method, route: &str, body: String) -> reqwest::Response {
        self.api_client
            .request(method, format!("{}{}", &self.address, route))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn mount_turnstile(&self, outcome: Value) {
        Mock::given(path("/turnstile/v0/siteverify"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(outcome))
            .expect(1)
            .mount(&self.turnstile_server)
            .await;
    }

    pub async fn mount_turnstile_success(&self) {
        self.mount_turnstile(serde_json::json!({ "success": true, "error-codes": [] }))
            .await;
    }

    pub async fn mount_zerobounce(&self, template: ResponseTemplate) {
        Mock::given(path("/v2/validate"))
            .and(method("GET"))
            .respond_with(template)
            .expect(1)
            .mount(&self.zerobounce_server)
            .await;
    }

    pub async fn mount_zerobounce_valid(&self) {
        self.mount_zerobounce(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "valid" })),
        )
        .await;
    }

    pub async fn mount_klaviyo(&self, template: ResponseTemplate) {
        Mock::given(path("/client/subscriptions"))
            .and(method("POST"))
            .respond_with(template)
            .expect(1)
            .mount(&self.klaviyo_server)
            .await;
    }

    /// Fails the test on drop if any provider receives a request.
    pub async fn expect_no_provider_calls(&self) {
        for server in [
            &self.turnstile_server,
            &self.zerobounce_server,
            &self.klaviyo_server,
        ] {
            Mock::given(any())
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(server)
                .await;
        }
    }
}

pub fn submission(email: &str) -> Value {
    serde_json::json!({ "email": email, "turnstileToken": "token-from-widget" })
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let turnstile_server = MockServer::start().await;
    let zerobounce_server = MockServer::start().await;
    let klaviyo_server = MockServer::start().await;

    let config = {
        let mut c = get_configuration().expect("Failed to read configuration");
        c.app.port = 0;
        c.turnstile.enabled = true;
        c.turnstile.base_url = turnstile_server.uri();
        c.turnstile.secret_key = Some(SecretString::from("turnstile-secret"));
        c.zerobounce.base_url = zerobounce_server.uri();
        c.zerobounce.api_key = Some(SecretString::from("zerobounce-key"));
        c.klaviyo.enabled = true;
        c.klaviyo.base_url = klaviyo_server.uri();
        c.klaviyo.company_id = Some(SecretString::from("PUBKEY"));
        c.klaviyo.list_id = Some("LIST123".into());
        customize(&mut c);
        c
    };

    let application = Application::build(config)
        .await
        .expect("Failed to build application.");
    let port = application.get_port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        turnstile_server,
        zerobounce_server,
        klaviyo_server,
        api_client: reqwest::Client::new(),
    }
}
