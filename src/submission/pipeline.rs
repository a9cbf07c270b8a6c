use std::sync::Arc;

use axum::http::Method;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::config::CompanyInfo;
use crate::email::templates::Notification;
use crate::email::{ExtraHeader, Mailer, OutgoingMail, MAILER_ID};
use crate::rate_limit::SubmissionThrottle;
use crate::session::SessionContext;

use super::envelope::Envelope;
use super::fields::{self, Fields};
use super::forms::FormSpec;
use super::metadata::RequestMeta;
use super::parser::RawFields;
use super::sanitize::header_safe;
use super::ticket;

pub const VALIDATION_FAILED: &str = "Errores de validación";
pub const METHOD_NOT_ALLOWED: &str = "Método no permitido";

/// One submission as seen by the pipeline.
pub struct IntakeRequest<'a> {
    pub method: Method,
    pub fields: &'a RawFields,
    pub meta: &'a RequestMeta,
    pub session: &'a dyn SessionContext,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sent { ticket: Option<String> },
    MethodNotAllowed,
    Invalid(Vec<String>),
    Throttled { retry_after: u64 },
    MailFailed,
}

/// Sanitize, validate, throttle, format and dispatch one kind of form.
pub struct FormPipeline {
    spec: FormSpec,
    throttle: SubmissionThrottle,
    mailer: Arc<dyn Mailer>,
    company: CompanyInfo,
    utc_offset: FixedOffset,
}

impl FormPipeline {
    pub fn new(
        spec: FormSpec,
        mailer: Arc<dyn Mailer>,
        company: CompanyInfo,
        utc_offset: FixedOffset,
    ) -> Self {
        let throttle = SubmissionThrottle::new(spec.kind.as_str(), spec.limits.min_interval_secs);
        Self {
            spec,
            throttle,
            mailer,
            company,
            utc_offset,
        }
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub async fn handle(&self, req: IntakeRequest<'_>) -> Outcome {
        let kind = self.spec.kind;

        if req.method != Method::POST {
            tracing::debug!(form = %kind, method = %req.method, "Rejected non-POST request");
            return Outcome::MethodNotAllowed;
        }

        let submission_id = Uuid::now_v7();
        let fields = Fields::extract(self.spec.fields, req.fields);

        let errors = fields::validate(&fields, &self.spec.rules);
        if !errors.is_empty() {
            tracing::info!(form = %kind, %submission_id, ip = %req.meta.ip, errors = ?errors, "Submission failed validation");
            return Outcome::Invalid(errors);
        }

        if let Err(retry_after) = self.throttle.admit(req.session, req.now) {
            tracing::info!(form = %kind, %submission_id, ip = %req.meta.ip, retry_after, "Submission throttled");
            return Outcome::Throttled { retry_after };
        }

        let local_now = req.now.with_timezone(&self.utc_offset);
        let ticket = self.spec.issues_ticket.then(|| ticket::generate(&local_now));
        let mail = self.compose(&fields, req.meta, ticket.as_deref(), &local_now);

        match self.mailer.send(&mail).await {
            Ok(()) => {
                tracing::info!(form = %kind, %submission_id, ticket = ?ticket, to = %mail.to, "Submission delivered");
                Outcome::Sent { ticket }
            }
            Err(e) => {
                tracing::error!(form = %kind, %submission_id, ticket = ?ticket, "Notification dispatch failed: {e}");
                Outcome::MailFailed
            }
        }
    }

    /// Build the notification for an accepted submission.
    pub fn compose(
        &self,
        fields: &Fields,
        meta: &RequestMeta,
        ticket: Option<&str>,
        now: &DateTime<FixedOffset>,
    ) -> OutgoingMail {
        let received_at = now.format("%d/%m/%Y %H:%M:%S").to_string();

        let body = (self.spec.render)(&Notification {
            fields,
            meta,
            received_at: &received_at,
            ticket,
            response_time: &self.company.response_time,
        });

        let subject = header_safe(&format!(
            "{} - {}",
            self.spec.subject_base,
            (self.spec.subject_tag)(fields, ticket)
        ));

        let mut headers = vec![
            (ExtraHeader::Mailer, MAILER_ID.to_string()),
            (
                ExtraHeader::Generated,
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        ];
        if let Some((header, value)) = (self.spec.tag_header)(fields, ticket) {
            headers.push((header, header_safe(&value)));
        }

        OutgoingMail {
            to: self.spec.recipient.clone(),
            from: self.spec.recipient.clone(),
            reply_to: fields.get("email").to_string(),
            subject,
            body,
            headers,
        }
    }

    /// Map an outcome to the response body the client sees.
    pub fn envelope(&self, outcome: &Outcome) -> Envelope {
        let messages = &self.spec.messages;

        match outcome {
            Outcome::Sent { ticket: None } => Envelope::success(messages.success, None),
            Outcome::Sent {
                ticket: Some(ticket),
            } => Envelope::success(
                messages.success,
                Some(json!({
                    "ticket": ticket,
                    "mensaje": format!(
                        "{}. Número de ticket: {ticket}. Nos pondremos en contacto contigo pronto.",
                        messages.success
                    ),
                    "tiempo_estimado": self.company.response_time,
                })),
            ),
            Outcome::MethodNotAllowed => Envelope::failure(METHOD_NOT_ALLOWED, None),
            Outcome::Invalid(errors) => Envelope::failure(VALIDATION_FAILED, Some(json!(errors))),
            Outcome::Throttled { .. } => Envelope::failure(messages.throttled, None),
            Outcome::MailFailed => Envelope::failure(
                format!("{} al {}.", messages.failure, self.company.phone),
                None,
            ),
        }
    }
}
