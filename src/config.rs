use std::net::IpAddr;

use chrono::FixedOffset;
use ipnet::IpNet;

use crate::submission::fields;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: String,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub session_timeout_secs: u64,
    pub secure_cookies: bool,
    pub utc_offset: FixedOffset,
    pub recipients: Recipients,
    pub limits: Limits,
    pub company: CompanyInfo,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct Recipients {
    pub contact: String,
    pub quote: String,
    pub support: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub min_interval_secs: u64,
    pub max_description_len: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub contact: FormLimits,
    pub quote: FormLimits,
    pub support: FormLimits,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            contact: FormLimits {
                min_interval_secs: 120,
                max_description_len: 3000,
            },
            quote: FormLimits {
                min_interval_secs: 300,
                max_description_len: 2000,
            },
            support: FormLimits {
                min_interval_secs: 180,
                max_description_len: 3000,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: String,
    pub phone: String,
    pub response_time: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "ACE Ingeniería & Conectividad".to_string(),
            phone: "+54 11 1234-5678".to_string(),
            response_time: "24 horas".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub tls_mode: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FORMS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMS_HOST: {e}"))?;

        let port: u16 = env_or("FORMS_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMS_PORT: {e}"))?;

        let static_dir = env_or("FORMS_STATIC_DIR", "public");

        let max_body_size: usize = env_or("FORMS_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMS_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("FORMS_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMS_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origins: Vec<String> = env_or("FORMS_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_level = env_or("FORMS_LOG_LEVEL", "info");

        let session_timeout_secs: u64 = env_or("FORMS_SESSION_TIMEOUT_SECS", "1800")
            .parse()
            .map_err(|e| format!("Invalid FORMS_SESSION_TIMEOUT_SECS: {e}"))?;

        let secure_cookies = env_or("FORMS_SECURE_COOKIES", "false") == "true";

        let offset_hours: i32 = env_or("FORMS_UTC_OFFSET_HOURS", "-3")
            .parse()
            .map_err(|e| format!("Invalid FORMS_UTC_OFFSET_HOURS: {e}"))?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| format!("Invalid FORMS_UTC_OFFSET_HOURS: {offset_hours} out of range"))?;

        let recipients = Recipients {
            contact: env_or("FORMS_CONTACT_TO", "contacto@aceingenieria.com"),
            quote: env_or("FORMS_QUOTE_TO", "presupuestos@aceingenieria.com"),
            support: env_or("FORMS_SUPPORT_TO", "soporte@aceingenieria.com"),
        };

        let defaults = Limits::default();
        let limits = Limits {
            contact: form_limits("CONTACT", defaults.contact)?,
            quote: form_limits("QUOTE", defaults.quote)?,
            support: form_limits("SUPPORT", defaults.support)?,
        };

        let company_defaults = CompanyInfo::default();
        let company = CompanyInfo {
            name: env_or("FORMS_COMPANY_NAME", &company_defaults.name),
            phone: env_or("FORMS_COMPANY_PHONE", &company_defaults.phone),
            response_time: env_or("FORMS_RESPONSE_TIME", &company_defaults.response_time),
        };

        let smtp = match (
            std::env::var("FORMS_SMTP_HOST").ok(),
            std::env::var("FORMS_SMTP_PORT").ok(),
            std::env::var("FORMS_SMTP_USER").ok(),
            std::env::var("FORMS_SMTP_PASS").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid FORMS_SMTP_PORT: {e}"))?,
                user,
                pass,
                tls_mode: env_or("FORMS_SMTP_TLS", "starttls"),
            }),
            _ => None,
        };

        Ok(Config {
            host,
            port,
            static_dir,
            max_body_size,
            trusted_proxies,
            cors_origins,
            log_level,
            session_timeout_secs,
            secure_cookies,
            utc_offset,
            recipients,
            limits,
            company,
            smtp,
        })
    }

    /// Sanity checks run once at startup. Returns every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (kind, address) in [
            ("contact", &self.recipients.contact),
            ("quote", &self.recipients.quote),
            ("support", &self.recipients.support),
        ] {
            if !fields::is_valid_email(address) {
                errors.push(format!("Invalid recipient for {kind}: {address}"));
            }
        }

        for (kind, limits) in [
            ("contact", self.limits.contact),
            ("quote", self.limits.quote),
            ("support", self.limits.support),
        ] {
            if limits.min_interval_secs == 0 {
                errors.push(format!("Invalid interval for {kind}: must be greater than zero"));
            }
            if limits.max_description_len == 0 {
                errors.push(format!("Invalid max length for {kind}: must be greater than zero"));
            }
        }

        if self.session_timeout_secs == 0 {
            errors.push("Invalid session timeout: must be greater than zero".to_string());
        }

        errors
    }
}

fn form_limits(prefix: &str, defaults: FormLimits) -> Result<FormLimits, String> {
    let interval_key = format!("FORMS_{prefix}_INTERVAL_SECS");
    let max_len_key = format!("FORMS_{prefix}_MAX_LEN");

    let min_interval_secs = match std::env::var(&interval_key) {
        Ok(v) => v.parse().map_err(|e| format!("Invalid {interval_key}: {e}"))?,
        Err(_) => defaults.min_interval_secs,
    };
    let max_description_len = match std::env::var(&max_len_key) {
        Ok(v) => v.parse().map_err(|e| format!("Invalid {max_len_key}: {e}"))?,
        Err(_) => defaults.max_description_len,
    };

    Ok(FormLimits {
        min_interval_secs,
        max_description_len,
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
