use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::email::Mailer;
use crate::session::SessionStore;
use crate::submission::forms::{FormKind, FormSpec};
use crate::submission::pipeline::FormPipeline;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub contact: FormPipeline,
    pub quote: FormPipeline,
    pub support: FormPipeline,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let company = &config.company;
        let pipeline = |spec: FormSpec| {
            FormPipeline::new(spec, mailer.clone(), company.clone(), config.utc_offset)
        };

        let contact = pipeline(FormSpec::contact(
            &config.recipients.contact,
            &company.name,
            config.limits.contact,
        ));
        let quote = pipeline(FormSpec::quote(
            &config.recipients.quote,
            &company.name,
            config.limits.quote,
        ));
        let support = pipeline(FormSpec::support(
            &config.recipients.support,
            &company.name,
            config.limits.support,
        ));

        let sessions = SessionStore::new(Duration::from_secs(config.session_timeout_secs));

        Self {
            config,
            contact,
            quote,
            support,
            sessions,
        }
    }

    pub fn pipeline(&self, kind: FormKind) -> &FormPipeline {
        match kind {
            FormKind::Contact => &self.contact,
            FormKind::Quote => &self.quote,
            FormKind::Support => &self.support,
        }
    }
}
