#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use formdesk::config::{CompanyInfo, Config, Limits, Recipients};
use formdesk::email::{MailError, Mailer, OutgoingMail};
use formdesk::state::SharedState;

pub const CONTACT_TO: &str = "contacto@test.com";
pub const QUOTE_TO: &str = "presupuestos@test.com";
pub const SUPPORT_TO: &str = "soporte@test.com";

/// Mailer that keeps every delivered message and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::from("relay refused connection"));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// A running test server instance with a recording mailer.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST form-urlencoded fields, optionally with a session cookie.
    /// Returns (body, status, session cookie set by the server).
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> (Value, StatusCode, Option<String>) {
        let mut req = self.client.post(self.url(path)).form(fields);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        let resp = req.send().await.expect("form post failed");
        let status = resp.status();
        let cookie = session_cookie(&resp);
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status, cookie)
    }

    pub async fn post_json(&self, path: &str, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(data)
            .send()
            .await
            .expect("json post failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("formdesk_session="))
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        static_dir: "tests/no-such-site".to_string(),
        max_body_size: 65_536,
        trusted_proxies: vec![],
        cors_origins: vec![],
        log_level: "warn".to_string(),
        session_timeout_secs: 1800,
        secure_cookies: false,
        utc_offset: chrono::FixedOffset::west_opt(3 * 3600).unwrap(),
        recipients: Recipients {
            contact: CONTACT_TO.to_string(),
            quote: QUOTE_TO.to_string(),
            support: SUPPORT_TO.to_string(),
        },
        limits: Limits::default(),
        company: CompanyInfo::default(),
        smtp: None,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let (app, state) = formdesk::build_app(config, mailer.clone());

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

    TestApp {
        addr,
        client: Client::new(),
        mailer,
        state,
    }
}

/// A localhost address with nothing listening on it.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
