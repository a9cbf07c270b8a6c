use std::fmt::Write;

use crate::submission::fields::Fields;
use crate::submission::metadata::RequestMeta;
use crate::submission::sanitize::capitalize;

/// Everything a notification body is built from. Field values are already sanitized.
pub struct Notification<'a> {
    pub fields: &'a Fields,
    pub meta: &'a RequestMeta,
    pub received_at: &'a str,
    pub ticket: Option<&'a str>,
    pub response_time: &'a str,
}

pub fn render_contact(n: &Notification<'_>) -> String {
    let f = n.fields;
    let mut out = heading("NUEVO MENSAJE DE CONTACTO");

    out.push_str("DATOS DEL CLIENTE:\n");
    line(&mut out, "Nombre", f.get("nombre"));
    line(&mut out, "Email", f.get("email"));
    line(&mut out, "Asunto", f.get("asunto"));
    out.push('\n');

    out.push_str("MENSAJE:\n");
    out.push_str(f.get("mensaje"));
    out.push_str("\n\n");

    technical_footer(&mut out, n);
    out.push('\n');

    out.push_str("INSTRUCCIONES:\n");
    let _ = writeln!(out, "1. Responder al cliente en las próximas {}", n.response_time);
    out.push_str("2. Agregar a la base de datos de contactos\n");
    out.push_str("3. Seguimiento según el tipo de consulta\n");

    out
}

pub fn render_quote(n: &Notification<'_>) -> String {
    let f = n.fields;
    let mut out = heading("NUEVA SOLICITUD DE PRESUPUESTO");

    client_data(&mut out, f);

    out.push_str("DETALLES DEL SERVICIO:\n");
    line(&mut out, "Servicio solicitado", f.get("servicio"));
    line(&mut out, "Nivel de urgencia", &capitalize(f.get("urgencia")));
    line(
        &mut out,
        "Presupuesto estimado",
        or_unspecified(f.get("presupuesto_estimado"), "No especificado"),
    );
    out.push('\n');

    out.push_str("DESCRIPCIÓN DEL PROYECTO:\n");
    out.push_str(f.get("descripcion"));
    out.push_str("\n\n");

    technical_footer(&mut out, n);

    out
}

pub fn render_support(n: &Notification<'_>) -> String {
    let f = n.fields;
    let mut out = heading("NUEVO TICKET DE SOPORTE TÉCNICO");

    if let Some(ticket) = n.ticket {
        line(&mut out, "NÚMERO DE TICKET", ticket);
        line(&mut out, "FECHA", n.received_at);
        out.push('\n');
    }

    client_data(&mut out, f);

    out.push_str("DETALLES DEL PROBLEMA:\n");
    line(&mut out, "Tipo de problema", f.get("tipo_problema"));
    line(&mut out, "Prioridad", &capitalize(f.get("prioridad")));
    line(
        &mut out,
        "Equipo afectado",
        or_unspecified(f.get("equipo_afectado"), "No especificado"),
    );
    line(
        &mut out,
        "Horario preferido de contacto",
        or_unspecified(f.get("horario_contacto"), "No especificado"),
    );
    out.push('\n');

    out.push_str("DESCRIPCIÓN DEL PROBLEMA:\n");
    out.push_str(f.get("descripcion"));
    out.push_str("\n\n");

    technical_footer(&mut out, n);

    out
}

fn heading(title: &str) -> String {
    format!("{title}\n{}\n\n", "=".repeat(title.chars().count()))
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{label}: {value}");
}

fn client_data(out: &mut String, f: &Fields) {
    out.push_str("DATOS DEL CLIENTE:\n");
    line(out, "Nombre", f.get("nombre"));
    line(out, "Email", f.get("email"));
    line(out, "Teléfono", f.get("telefono"));
    line(out, "Empresa", or_unspecified(f.get("empresa"), "No especificada"));
    out.push('\n');
}

fn technical_footer(out: &mut String, n: &Notification<'_>) {
    out.push_str("INFORMACIÓN TÉCNICA:\n");
    line(out, "Fecha y hora", n.received_at);
    line(out, "IP", &n.meta.ip);
    line(out, "User-Agent", &n.meta.user_agent);
}

fn or_unspecified<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
