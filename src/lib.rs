pub mod config;
pub mod error;
pub mod state;
pub mod session;
pub mod rate_limit;
pub mod email;
pub mod submission;
pub mod routes;
pub mod sweeper;
pub mod client;

use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, SmtpConfig};
use crate::email::{Mailer, SmtpMailer, UnconfiguredMailer};
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config, mailer: Arc<dyn Mailer>) -> (Router, SharedState) {
    let static_dir = config.static_dir.clone();
    let max_body_size = config.max_body_size;
    let cors_origins = config.cors_origins.clone();

    let state: SharedState = Arc::new(AppState::new(config, mailer));

    let site = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(routes::forms::not_found.into_service());

    let router = Router::new()
        .merge(routes::form_routes())
        .route("/health", axum::routing::get(health))
        .fallback_service(site)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let router = match cors_layer(&cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    (router.with_state(state.clone()), state)
}

/// Pick the mail transport: SMTP when configured and reachable, otherwise a
/// mailer that fails every attempt so submissions report a soft failure.
pub fn build_mailer(smtp: Option<&SmtpConfig>) -> Arc<dyn Mailer> {
    match smtp.map(SmtpMailer::new) {
        Some(Ok(mailer)) => {
            tracing::info!("SMTP relay configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::warn!("SMTP relay not available: {e}");
            Arc::new(UnconfiguredMailer)
        }
        None => {
            tracing::warn!("No SMTP relay configured, form notifications will not be delivered");
            Arc::new(UnconfiguredMailer)
        }
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
    )
}

async fn health() -> &'static str {
    "ok"
}
