use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform response body of every form endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub exito: bool,
    pub mensaje: String,
    #[serde(default)]
    pub datos: Option<Value>,
    #[serde(default)]
    pub timestamp: String,
}

impl Envelope {
    pub fn new(exito: bool, mensaje: impl Into<String>, datos: Option<Value>) -> Self {
        Self {
            exito,
            mensaje: mensaje.into(),
            datos,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn success(mensaje: impl Into<String>, datos: Option<Value>) -> Self {
        Self::new(true, mensaje, datos)
    }

    pub fn failure(mensaje: impl Into<String>, datos: Option<Value>) -> Self {
        Self::new(false, mensaje, datos)
    }
}
