use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use formbridge::config::{CapiConfig, Config, MailBridgeConfig, SmtpConfig};

pub const TEST_PIXEL_ID: &str = "1029384756";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";
pub const TEST_BRIDGE_TOKEN: &str = "test-bridge-token";

/// A running test server with the events API replaced by a wiremock server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub capi: MockServer,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit data to a hook (JSON), return (body, status).
    pub async fn submit_json(&self, slug: &str, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/hooks/{slug}")))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data to a hook, return (body, status).
    pub async fn submit_form(&self, slug: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/hooks/{slug}")))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit a hand-built multipart body to a hook, return (body, status).
    pub async fn submit_multipart(
        &self,
        slug: &str,
        parts: &[(&str, &str)],
    ) -> (Value, StatusCode) {
        let boundary = "------------------------d74496d66958873e";
        let mut body = String::new();
        for (name, value) in parts {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        let resp = self
            .client
            .post(self.url(&format!("/hooks/{slug}")))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .expect("submit multipart failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Post to the relay endpoint with a bridge token, return (body, status).
    pub async fn relay(&self, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let url = match token {
            Some(t) => self.url(&format!("/relay/send?token={t}")),
            None => self.url("/relay/send"),
        };
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .expect("relay request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// The single event received by the mock events endpoint.
    pub async fn received_event(&self) -> Value {
        let requests = self
            .capi
            .received_requests()
            .await
            .expect("request recording disabled");
        assert_eq!(requests.len(), 1, "expected exactly one events API call");
        let body: Value =
            serde_json::from_slice(&requests[0].body).expect("events body not JSON");
        let data = body["data"].as_array().expect("missing data batch");
        assert_eq!(data.len(), 1, "expected a single-entry batch");
        data[0].clone()
    }

    /// Number of calls the mock events endpoint has seen.
    pub async fn events_call_count(&self) -> usize {
        self.capi.received_requests().await.unwrap_or_default().len()
    }
}

/// Mount a 200 response on the mock events endpoint, also asserting the
/// access token travels as a query parameter.
pub async fn mount_events_ok(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path(format!("/{TEST_PIXEL_ID}/events")))
        .and(query_param("access_token", TEST_ACCESS_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events_received": 1 })))
        .mount(&app.capi)
        .await;
}

/// Mount a rejection on the mock events endpoint.
pub async fn mount_events_error(app: &TestApp, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/{TEST_PIXEL_ID}/events")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&app.capi)
        .await;
}

/// Spawn a test app with events API credentials pointed at a mock server
/// and a mail bridge whose SMTP host is never contacted by these tests.
pub async fn spawn_app() -> TestApp {
    spawn_with(|capi_uri| Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        source_url: None,
        capi: Some(CapiConfig {
            pixel_id: TEST_PIXEL_ID.to_string(),
            access_token: TEST_ACCESS_TOKEN.to_string(),
            test_event_code: None,
            base_url: capi_uri,
        }),
        mail: Some(MailBridgeConfig {
            token: TEST_BRIDGE_TOKEN.to_string(),
            smtp: SmtpConfig {
                host: "127.0.0.1".to_string(),
                port: 2525,
                user: "bridge".to_string(),
                pass: "bridge-pass".to_string(),
            },
        }),
    })
    .await
}

/// Spawn a test app with neither events API credentials nor a mail bridge.
pub async fn spawn_app_unconfigured() -> TestApp {
    spawn_with(|_| Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        source_url: None,
        capi: None,
        mail: None,
    })
    .await
}

async fn spawn_with(make_config: impl FnOnce(String) -> Config) -> TestApp {
    let capi = MockServer::start().await;
    let config = make_config(capi.uri());

    let app = formbridge::build_app(config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { addr, client, capi }
}

/// Plain SHA-256 hex of the input as given. Tests pass the already
/// trimmed/lowercased form so the pipeline's normalization is what is
/// being checked.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
