use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::sanitize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9 ()+-]+$").unwrap());

/// An expected form field. `default` fills in when the value is absent or blank.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

impl FieldDef {
    pub const fn new(name: &'static str) -> Self {
        Self { name, default: None }
    }

    pub const fn with_default(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }
}

/// Sanitized values for every expected field, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    values: Vec<(&'static str, String)>,
}

impl Fields {
    /// Pull every expected field out of the raw request and sanitize it.
    /// Unexpected keys are ignored.
    pub fn extract(defs: &[FieldDef], raw: &HashMap<String, String>) -> Self {
        let values = defs
            .iter()
            .map(|def| {
                let value = sanitize(raw.get(def.name).map(String::as_str).unwrap_or(""));
                let value = match def.default {
                    Some(default) if value.is_empty() => default.to_string(),
                    _ => value,
                };
                (def.name, value)
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, name: &str) -> &str {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(n, v)| (*n, v.as_str()))
    }
}

/// A single business rule. Rules are evaluated in order and never short-circuit.
#[derive(Debug, Clone)]
pub enum Rule {
    Required {
        field: &'static str,
        message: &'static str,
    },
    Email {
        field: &'static str,
        message: &'static str,
    },
    Phone {
        field: &'static str,
        message: &'static str,
    },
    MaxLen {
        field: &'static str,
        max: usize,
        message: &'static str,
    },
}

/// Collect every failing rule's message. Empty means valid.
pub fn validate(fields: &Fields, rules: &[Rule]) -> Vec<String> {
    let mut errors = Vec::new();

    for rule in rules {
        match rule {
            Rule::Required { field, message } => {
                if fields.get(field).is_empty() {
                    errors.push(message.to_string());
                }
            }
            Rule::Email { field, message } => {
                let value = fields.get(field);
                if value.is_empty() || !is_valid_email(value) {
                    errors.push(message.to_string());
                }
            }
            Rule::Phone { field, message } => {
                let value = fields.get(field);
                if value.is_empty() || !is_valid_phone(value) {
                    errors.push(message.to_string());
                }
            }
            Rule::MaxLen {
                field,
                max,
                message,
            } => {
                if fields.get(field).chars().count() > *max {
                    errors.push(format!("{message} (máximo {max} caracteres)"));
                }
            }
        }
    }

    errors
}

pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return false;
    }

    let Some((local, _)) = email.rsplit_once('@') else {
        return false;
    };

    local.len() <= 64 && !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
