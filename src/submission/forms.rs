use crate::config::FormLimits;
use crate::email::templates::{self, Notification};
use crate::email::ExtraHeader;

use super::fields::{FieldDef, Fields, Rule};
use super::sanitize::capitalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Contact,
    Quote,
    Support,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Quote => "quote",
            FormKind::Support => "support",
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing texts for each outcome.
#[derive(Debug, Clone)]
pub struct Messages {
    pub success: &'static str,
    pub failure: &'static str,
    pub throttled: &'static str,
}

/// Everything that distinguishes one submission type from another.
pub struct FormSpec {
    pub kind: FormKind,
    pub recipient: String,
    pub subject_base: String,
    pub limits: FormLimits,
    pub fields: &'static [FieldDef],
    pub rules: Vec<Rule>,
    pub issues_ticket: bool,
    /// Text after the dash in the subject line.
    pub subject_tag: fn(&Fields, Option<&str>) -> String,
    /// Type-specific extra mail header.
    pub tag_header: fn(&Fields, Option<&str>) -> Option<(ExtraHeader, String)>,
    pub render: fn(&Notification<'_>) -> String,
    pub messages: Messages,
}

const CONTACT_FIELDS: &[FieldDef] = &[
    FieldDef::new("nombre"),
    FieldDef::new("email"),
    FieldDef::new("mensaje"),
    FieldDef::with_default("asunto", "Consulta General"),
];

const QUOTE_FIELDS: &[FieldDef] = &[
    FieldDef::new("nombre"),
    FieldDef::new("email"),
    FieldDef::new("telefono"),
    FieldDef::new("empresa"),
    FieldDef::new("servicio"),
    FieldDef::new("descripcion"),
    FieldDef::with_default("urgencia", "normal"),
    FieldDef::new("presupuesto_estimado"),
];

const SUPPORT_FIELDS: &[FieldDef] = &[
    FieldDef::new("nombre"),
    FieldDef::new("email"),
    FieldDef::new("telefono"),
    FieldDef::new("empresa"),
    FieldDef::new("tipo_problema"),
    FieldDef::with_default("prioridad", "media"),
    FieldDef::new("equipo_afectado"),
    FieldDef::new("descripcion"),
    FieldDef::new("horario_contacto"),
];

const NAME_RULE: Rule = Rule::Required {
    field: "nombre",
    message: "El nombre es obligatorio",
};

const EMAIL_RULE: Rule = Rule::Email {
    field: "email",
    message: "El email es obligatorio y debe ser válido",
};

const PHONE_RULE: Rule = Rule::Phone {
    field: "telefono",
    message: "El teléfono es obligatorio y debe ser válido",
};

impl FormSpec {
    pub fn contact(recipient: &str, company: &str, limits: FormLimits) -> Self {
        Self {
            kind: FormKind::Contact,
            recipient: recipient.to_string(),
            subject_base: format!("Nuevo Mensaje de Contacto - {company}"),
            limits,
            fields: CONTACT_FIELDS,
            rules: vec![
                NAME_RULE,
                EMAIL_RULE,
                Rule::Required {
                    field: "mensaje",
                    message: "El mensaje es obligatorio",
                },
                Rule::MaxLen {
                    field: "mensaje",
                    max: limits.max_description_len,
                    message: "El mensaje es demasiado largo",
                },
            ],
            issues_ticket: false,
            subject_tag: |fields, _| fields.get("asunto").to_string(),
            tag_header: |fields, _| {
                Some((ExtraHeader::ContactType, fields.get("asunto").to_string()))
            },
            render: templates::render_contact,
            messages: Messages {
                success: "Mensaje enviado correctamente. Nos pondremos en contacto contigo pronto.",
                failure: "Error al enviar el mensaje. Por favor, intenta nuevamente o contacta directamente por teléfono",
                throttled: "Por favor, espera unos minutos antes de enviar otro mensaje",
            },
        }
    }

    pub fn quote(recipient: &str, company: &str, limits: FormLimits) -> Self {
        Self {
            kind: FormKind::Quote,
            recipient: recipient.to_string(),
            subject_base: format!("Nueva Solicitud de Presupuesto - {company}"),
            limits,
            fields: QUOTE_FIELDS,
            rules: vec![
                NAME_RULE,
                EMAIL_RULE,
                PHONE_RULE,
                Rule::Required {
                    field: "servicio",
                    message: "Debe seleccionar un servicio",
                },
                Rule::Required {
                    field: "descripcion",
                    message: "La descripción del proyecto es obligatoria",
                },
                Rule::MaxLen {
                    field: "descripcion",
                    max: limits.max_description_len,
                    message: "La descripción es demasiado larga",
                },
            ],
            issues_ticket: false,
            subject_tag: |fields, _| capitalize(fields.get("servicio")),
            tag_header: |_, _| None,
            render: templates::render_quote,
            messages: Messages {
                success: "Solicitud de presupuesto enviada correctamente. Nos pondremos en contacto contigo pronto.",
                failure: "Error al enviar la solicitud. Por favor, intenta nuevamente o contacta directamente por teléfono",
                throttled: "Por favor, espera unos minutos antes de enviar otra solicitud",
            },
        }
    }

    pub fn support(recipient: &str, company: &str, limits: FormLimits) -> Self {
        Self {
            kind: FormKind::Support,
            recipient: recipient.to_string(),
            subject_base: format!("Nuevo Ticket de Soporte - {company}"),
            limits,
            fields: SUPPORT_FIELDS,
            rules: vec![
                NAME_RULE,
                EMAIL_RULE,
                PHONE_RULE,
                Rule::Required {
                    field: "tipo_problema",
                    message: "Debe seleccionar el tipo de problema",
                },
                Rule::Required {
                    field: "descripcion",
                    message: "La descripción del problema es obligatoria",
                },
                Rule::MaxLen {
                    field: "descripcion",
                    max: limits.max_description_len,
                    message: "La descripción es demasiado larga",
                },
            ],
            issues_ticket: true,
            subject_tag: |_, ticket| ticket.unwrap_or_default().to_string(),
            tag_header: |_, ticket| ticket.map(|t| (ExtraHeader::Ticket, t.to_string())),
            render: templates::render_support,
            messages: Messages {
                success: "Ticket de soporte creado correctamente",
                failure: "Error al crear el ticket. Por favor, intenta nuevamente o contacta directamente por teléfono",
                throttled: "Por favor, espera unos minutos antes de enviar otro ticket de soporte",
            },
        }
    }
}
