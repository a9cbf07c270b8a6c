use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::submission::envelope::Envelope;
use crate::submission::pipeline::METHOD_NOT_ALLOWED;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    MethodNotAllowed,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::MethodNotAllowed => write!(f, "Method Not Allowed"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                METHOD_NOT_ALLOWED.to_string(),
            ),
        };

        let body = Json(Envelope::failure(message, None));
        match self {
            AppError::MethodNotAllowed => (status, [(header::ALLOW, "POST")], body).into_response(),
            AppError::NotFound(_) => (status, body).into_response(),
        }
    }
}
