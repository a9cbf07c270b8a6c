use std::collections::HashMap;

use axum::http::HeaderMap;
use serde_json::Value;

pub type RawFields = HashMap<String, String>;

/// Parse a submission body based on its Content-Type header.
pub async fn parse(headers: &HeaderMap, body: bytes::Bytes) -> Result<RawFields, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    if body.is_empty() {
        return Ok(RawFields::new());
    }

    match content_type {
        Some(ct) if ct.contains("multipart/form-data") => parse_multipart(ct, body).await,
        Some(ct) if ct.contains("application/json") => parse_json(&body),
        Some(ct) if ct.contains("application/x-www-form-urlencoded") => {
            parse_form_urlencoded(&body)
        }
        // Try JSON first, then form-urlencoded
        _ => parse_json(&body)
            .or_else(|_| parse_form_urlencoded(&body))
            .map_err(|e| format!("Unable to parse body: {e}")),
    }
}

fn parse_json(body: &[u8]) -> Result<RawFields, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Value::Object(obj) = value else {
        return Err("JSON body must be an object".to_string());
    };

    Ok(obj
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Null => None,
            other => Some((k, other.to_string())),
        })
        .collect())
}

fn parse_form_urlencoded(body: &[u8]) -> Result<RawFields, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Parse multipart form data using multer. File parts are read as text.
async fn parse_multipart(content_type: &str, body: bytes::Bytes) -> Result<RawFields, String> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = RawFields::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        fields.insert(name, value);
    }

    Ok(fields)
}
