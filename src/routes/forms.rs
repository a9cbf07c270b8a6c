use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::error::AppError;
use crate::session::{SessionContext, SESSION_COOKIE};
use crate::state::SharedState;
use crate::submission::forms::FormKind;
use crate::submission::parser::{self, RawFields};
use crate::submission::pipeline::{IntakeRequest, Outcome};
use crate::submission::metadata;

pub async fn contact(
    state: State<SharedState>,
    addr: ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    intake(FormKind::Contact, state, addr, method, headers, jar, body).await
}

pub async fn quote(
    state: State<SharedState>,
    addr: ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    intake(FormKind::Quote, state, addr, method, headers, jar, body).await
}

pub async fn support(
    state: State<SharedState>,
    addr: ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    intake(FormKind::Support, state, addr, method, headers, jar, body).await
}

async fn intake(
    kind: FormKind,
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        tracing::debug!(form = %kind, %method, "Rejected non-POST request");
        return AppError::MethodNotAllowed.into_response();
    }

    let raw = parser::parse(&headers, body).await.unwrap_or_else(|e| {
        tracing::warn!(form = %kind, "Unreadable submission body, treating as empty: {e}");
        RawFields::new()
    });

    let meta = metadata::extract(&headers, Some(addr.ip()), &state.config.trusted_proxies);
    let session = state
        .sessions
        .resume(jar.get(SESSION_COOKIE).map(|c| c.value()));

    let pipeline = state.pipeline(kind);
    let outcome = pipeline
        .handle(IntakeRequest {
            method,
            fields: &raw,
            meta: &meta,
            session: &session as &dyn SessionContext,
            now: Utc::now(),
        })
        .await;

    if outcome == Outcome::MethodNotAllowed {
        return AppError::MethodNotAllowed.into_response();
    }

    let jar = if session.needs_cookie() {
        jar.add(session_cookie(session.id(), state.config.secure_cookies))
    } else {
        jar
    };

    (StatusCode::OK, jar, Json(pipeline.envelope(&outcome))).into_response()
}

fn session_cookie(id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn not_found() -> AppError {
    AppError::NotFound("No se encontró el recurso solicitado".to_string())
}
