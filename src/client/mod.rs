pub mod form;
pub mod notify;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::submission::envelope::Envelope;

use form::{CharCounter, Form};
use notify::{Alert, LogAlert, NoticeKind, Notifier};

pub const DEFAULT_RELAY_BASE: &str = "https://formspree.io/f/";

pub const REQUIRED_FIELDS_MISSING: &str = "Por favor completa todos los campos requeridos";
pub const FORM_SENT: &str = "Formulario enviado correctamente";
pub const SEND_FAILED: &str = "Error al enviar el formulario";
pub const ENDPOINT_NOT_FOUND: &str = "No se encontró el endpoint en el servidor (404). Verificá que el hosting ejecute el servicio de formularios o configurá un endpoint alternativo.";

const NOT_FOUND_NOTICE: Duration = Duration::from_secs(6);

pub type SentHook = Arc<dyn Fn(&Form) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&Form, &SubmitError) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The endpoint answered 404, usually a host that cannot run the form service.
    EndpointNotFound,
    /// Any other non-2xx answer.
    Status { code: u16, detail: String },
    /// 2xx, but the service reported the submission as not accepted.
    Rejected { message: String, details: Vec<String> },
    /// The request never got an answer.
    Transport(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::EndpointNotFound => write!(f, "{ENDPOINT_NOT_FOUND}"),
            SubmitError::Status { code, .. } => write!(f, "{SEND_FAILED} ({code})"),
            SubmitError::Rejected { message, details } if details.is_empty() => {
                write!(f, "{message}")
            }
            SubmitError::Rejected { message, details } => {
                write!(f, "{message}: {}", details.join("; "))
            }
            SubmitError::Transport(_) => write!(f, "{SEND_FAILED}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Required fields were blank; nothing was sent.
    Blocked { missing: Vec<String> },
    /// A submission for this form is already in flight.
    Busy,
    /// Accepted. Carries the response body when it was JSON.
    Sent(Option<Value>),
    Failed(SubmitError),
}

/// A form bound to the controller: resolved endpoint plus its character counter.
pub struct AttachedForm {
    form: Form,
    endpoint: String,
    counter: Option<CharCounter>,
}

impl AttachedForm {
    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn counter_text(&self) -> Option<&str> {
        self.counter.as_ref().map(|c| c.text())
    }

    /// Type into a field, keeping the counter in step.
    pub fn input(&mut self, name: &str, value: &str) -> bool {
        if !self.form.set(name, value) {
            return false;
        }
        if let Some(counter) = self.counter.as_mut().filter(|c| c.field() == name) {
            counter.refresh(value);
        }
        true
    }

    fn refresh_counter(&mut self) {
        if let Some(counter) = self.counter.as_mut() {
            let value = self.form.value(counter.field()).unwrap_or_default();
            counter.refresh(value);
        }
    }
}

pub struct FormControllerBuilder {
    base_url: String,
    relay_base: String,
    notifier: Option<Arc<dyn Notifier>>,
    alert: Arc<dyn Alert>,
    on_sent: Option<SentHook>,
    on_error: Option<ErrorHook>,
}

impl FormControllerBuilder {
    pub fn relay_base(mut self, relay_base: &str) -> Self {
        self.relay_base = relay_base.to_string();
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn alert(mut self, alert: Arc<dyn Alert>) -> Self {
        self.alert = alert;
        self
    }

    pub fn on_sent(mut self, hook: SentHook) -> Self {
        self.on_sent = Some(hook);
        self
    }

    pub fn on_error(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn build(self) -> Result<FormController, String> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base URL '{}': {e}", self.base_url))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(FormController {
            client,
            base_url,
            relay_base: self.relay_base,
            notifier: self.notifier,
            alert: self.alert,
            on_sent: self.on_sent,
            on_error: self.on_error,
        })
    }
}

/// Validates, submits and reports on forms without reloading the page.
pub struct FormController {
    client: reqwest::Client,
    base_url: Url,
    relay_base: String,
    notifier: Option<Arc<dyn Notifier>>,
    alert: Arc<dyn Alert>,
    on_sent: Option<SentHook>,
    on_error: Option<ErrorHook>,
}

impl FormController {
    /// `base_url` is the page the forms live on; relative endpoints resolve against it.
    pub fn builder(base_url: &str) -> FormControllerBuilder {
        FormControllerBuilder {
            base_url: base_url.to_string(),
            relay_base: DEFAULT_RELAY_BASE.to_string(),
            notifier: None,
            alert: Arc::new(LogAlert),
            on_sent: None,
            on_error: None,
        }
    }

    /// Bind a form. A relay marker on the form wins over `default_endpoint`.
    pub fn attach(&self, form: Form, default_endpoint: &str) -> AttachedForm {
        let endpoint = match form.relay_id() {
            Some(relay_id) => format!("{}{relay_id}", self.relay_base),
            None => default_endpoint.to_string(),
        };

        let counter = form
            .counter_field()
            .and_then(|f| f.max_length.map(|max| CharCounter::new(&f.name, max)));

        let mut attached = AttachedForm {
            form,
            endpoint,
            counter,
        };
        attached.refresh_counter();
        attached
    }

    pub async fn submit(&self, attached: &mut AttachedForm) -> SubmitOutcome {
        let endpoint = attached.endpoint.clone();
        let outcome = self.submit_to(&mut attached.form, &endpoint).await;
        attached.refresh_counter();
        outcome
    }

    pub async fn submit_to(&self, form: &mut Form, endpoint: &str) -> SubmitOutcome {
        if form.submit_control().is_disabled() {
            return SubmitOutcome::Busy;
        }

        let missing = form.check_required();
        if !missing.is_empty() {
            self.alert.alert(REQUIRED_FIELDS_MISSING);
            return SubmitOutcome::Blocked { missing };
        }

        let Some(_busy) = form.submit_control().hold() else {
            return SubmitOutcome::Busy;
        };

        let url = match self.base_url.join(endpoint) {
            Ok(url) => url,
            Err(e) => {
                return self.fail(form, SubmitError::Transport(format!("Invalid endpoint '{endpoint}': {e}")));
            }
        };

        tracing::debug!(form = form.id(), %url, "Submitting form");

        let response = match self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&form.payload())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(form = form.id(), "Form submission failed: {e}");
                return self.fail(form, SubmitError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        tracing::debug!(form = form.id(), status = status.as_u16(), "Form submission answered");

        if status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let envelope = body
                .as_ref()
                .and_then(|b| serde_json::from_value::<Envelope>(b.clone()).ok());

            if let Some(envelope) = &envelope {
                if !envelope.exito {
                    return self.fail(form, SubmitError::Rejected {
                        message: envelope.mensaje.clone(),
                        details: string_list(envelope.datos.as_ref()),
                    });
                }
            }

            let message = envelope
                .map(|e| e.mensaje)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FORM_SENT.to_string());
            self.notify(&message, NoticeKind::Success, None);

            form.reset();
            if let Some(hook) = &self.on_sent {
                hook(&*form);
            }
            SubmitOutcome::Sent(body)
        } else if status == StatusCode::NOT_FOUND {
            self.fail(form, SubmitError::EndpointNotFound)
        } else {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!(form = form.id(), "Error response body: {detail}");
            self.fail(form, SubmitError::Status {
                code: status.as_u16(),
                detail,
            })
        }
    }

    fn fail(&self, form: &Form, error: SubmitError) -> SubmitOutcome {
        let duration = matches!(error, SubmitError::EndpointNotFound).then_some(NOT_FOUND_NOTICE);
        self.notify(&error.to_string(), NoticeKind::Error, duration);

        if let Some(hook) = &self.on_error {
            hook(form, &error);
        }
        SubmitOutcome::Failed(error)
    }

    fn notify(&self, message: &str, kind: NoticeKind, duration: Option<Duration>) {
        match &self.notifier {
            Some(notifier) => notifier.notify(message, kind, duration),
            None => self.alert.alert(message),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}
