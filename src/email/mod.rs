pub mod templates;

use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

pub const MAILER_ID: &str = concat!("Formdesk/", env!("CARGO_PKG_VERSION"));

/// Headers added on top of From / Reply-To / Content-Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraHeader {
    Mailer,
    Generated,
    ContactType,
    Ticket,
}

/// A fully formatted plain-text notification, ready for a transport.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
    pub headers: Vec<(ExtraHeader, String)>,
}

impl OutgoingMail {
    pub fn header(&self, header: ExtraHeader) -> Option<&str> {
        self.headers
            .iter()
            .find(|(h, _)| *h == header)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct MailError {
    pub message: String,
}

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for MailError {
    fn from(s: String) -> Self {
        MailError { message: s }
    }
}

impl From<&str> for MailError {
    fn from(s: &str) -> Self {
        MailError {
            message: s.to_string(),
        }
    }
}

/// The outbound mail capability. One call is one delivery attempt.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = match config.tls_mode.as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| format!("SMTP relay error: {e}"))?
                .port(config.port)
                .credentials(creds)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .credentials(creds)
                .build(),
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| format!("SMTP starttls error: {e}"))?
                .port(config.port)
                .credentials(creds)
                .build(),
        };

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::from(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Used when no SMTP relay is configured: every attempt fails softly.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::warn!(to = %mail.to, subject = %mail.subject, "No SMTP relay configured, dropping notification");
        Err(MailError::from("SMTP not configured"))
    }
}

pub fn build_message(mail: &OutgoingMail) -> Result<Message, MailError> {
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|e| MailError::from(format!("Invalid from address: {e}")))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|e| MailError::from(format!("Invalid to address: {e}")))?;
    let reply_to: Mailbox = mail
        .reply_to
        .parse()
        .map_err(|e| MailError::from(format!("Invalid reply-to address: {e}")))?;

    let mut builder = Message::builder()
        .from(from)
        .reply_to(reply_to)
        .to(to)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    for (header, value) in &mail.headers {
        let value = value.clone();
        builder = match header {
            ExtraHeader::Mailer => builder.header(XMailer(value)),
            ExtraHeader::Generated => builder.header(XGenerated(value)),
            ExtraHeader::ContactType => builder.header(XContactType(value)),
            ExtraHeader::Ticket => builder.header(XTicket(value)),
        };
    }

    builder
        .body(mail.body.clone())
        .map_err(|e| MailError::from(format!("Failed to build email: {e}")))
}

macro_rules! text_header {
    ($ty:ident, $name:literal) => {
        #[derive(Debug, Clone)]
        struct $ty(String);

        impl Header for $ty {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($name)
            }

            fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Self(s.to_string()))
            }

            fn display(&self) -> HeaderValue {
                HeaderValue::new(Self::name(), self.0.clone())
            }
        }
    };
}

text_header!(XMailer, "X-Mailer");
text_header!(XGenerated, "X-Generated");
text_header!(XContactType, "X-Contact-Type");
text_header!(XTicket, "X-Ticket");
