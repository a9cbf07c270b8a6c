mod common;

use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use serde_json::json;

use formdesk::config::FormLimits;
use formdesk::email::ExtraHeader;

const VALIDATION_FAILED: &str = "Errores de validación";
const BAD_EMAIL: &str = "El email es obligatorio y debe ser válido";

fn contact_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nombre", "Ana Pérez"),
        ("email", "ana@example.com"),
        ("asunto", "Redes"),
        ("mensaje", "Necesito cablear una oficina."),
    ]
}

fn quote_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nombre", "Bruno"),
        ("email", "bruno@example.com"),
        ("telefono", "+54 11 5555-0000"),
        ("servicio", "redes"),
        ("descripcion", "Cableado estructurado para 20 puestos."),
    ]
}

fn support_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nombre", "Carla"),
        ("email", "carla@example.com"),
        ("telefono", "(011) 4444-1234"),
        ("tipo_problema", "conectividad"),
        ("prioridad", "alta"),
        ("descripcion", "El router no levanta después del corte."),
    ]
}

// ── Health & plumbing ───────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn unknown_path_returns_not_found_envelope() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/no-such-page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["exito"], false);
    assert!(body["mensaje"].is_string());

    let (body, status, _) = app.post_form("/no-such-endpoint", &contact_fields(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["exito"], false);
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = common::test_config();
    config.max_body_size = 256;
    let app = common::spawn_app_with(config).await;

    let long = "x".repeat(1024);
    let fields = [
        ("nombre", "Ana"),
        ("email", "ana@example.com"),
        ("mensaje", long.as_str()),
    ];

    let (_, status, _) = app.post_form("/contact", &fields, None).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.mailer.attempts(), 0);
}

// ── Method handling ─────────────────────────────────────────────

#[tokio::test]
async fn non_post_requests_are_rejected_everywhere() {
    let app = common::spawn_app().await;

    for path in [
        "/contact",
        "/quote",
        "/support",
        "/php/enviar.php",
        "/php/presupuesto.php",
        "/php/soporte.php",
    ] {
        let (body, status) = app.get(path).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "GET {path}");
        assert_eq!(body["exito"], false);
        assert_eq!(body["mensaje"], "Método no permitido");

        let resp = app.client.put(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "PUT {path}");
        assert_eq!(resp.headers().get("allow").unwrap(), "POST");
    }

    assert_eq!(app.mailer.attempts(), 0);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn wrong_method_is_rejected_before_reading_body() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/support"))
        .header("content-type", "multipart/form-data; boundary=missing")
        .body("--not-the-boundary\r\ngarbage")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("allow").unwrap(), "POST");

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["exito"], false);
    assert_eq!(body["mensaje"], "Método no permitido");

    assert_eq!(app.mailer.attempts(), 0);
    assert!(app.state.sessions.is_empty());
}

// ── Contact ─────────────────────────────────────────────────────

#[tokio::test]
async fn contact_submission_sends_one_mail() {
    let app = common::spawn_app().await;

    let (body, status, cookie) = app.post_form("/contact", &contact_fields(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], true);
    assert_eq!(
        body["mensaje"],
        "Mensaje enviado correctamente. Nos pondremos en contacto contigo pronto."
    );
    assert!(!body["timestamp"].as_str().unwrap().is_empty());
    assert!(cookie.is_some());

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to, common::CONTACT_TO);
    assert_eq!(mail.reply_to, "ana@example.com");
    assert_eq!(
        mail.subject,
        "Nuevo Mensaje de Contacto - ACE Ingeniería & Conectividad - Redes"
    );
    assert_eq!(mail.header(ExtraHeader::ContactType), Some("Redes"));
    assert!(mail.header(ExtraHeader::Mailer).unwrap().starts_with("Formdesk/"));
    assert!(mail.body.contains("Nombre: Ana Pérez"));
    assert!(mail.body.contains("Necesito cablear una oficina."));
    assert!(mail.body.contains("INSTRUCCIONES:"));
    assert!(mail.body.contains("IP: 127.0.0.1"));
}

#[tokio::test]
async fn contact_defaults_subject() {
    let app = common::spawn_app().await;

    let fields = [
        ("nombre", "Ana"),
        ("email", "ana@example.com"),
        ("asunto", "   "),
        ("mensaje", "Hola"),
    ];
    let (body, _, _) = app.post_form("/contact", &fields, None).await;
    assert_eq!(body["exito"], true);

    let mail = &app.mailer.sent()[0];
    assert!(mail.subject.ends_with("- Consulta General"));
    assert!(mail.body.contains("Asunto: Consulta General"));
    assert_eq!(mail.header(ExtraHeader::ContactType), Some("Consulta General"));
}

#[tokio::test]
async fn markup_is_escaped_exactly_once() {
    let app = common::spawn_app().await;

    let fields = [
        ("nombre", "<b>Ana</b>"),
        ("email", "ana@example.com"),
        ("mensaje", r#"<script>alert("x")</script> & 'y'"#),
    ];
    let (body, _, _) = app.post_form("/contact", &fields, None).await;
    assert_eq!(body["exito"], true);

    let mail = &app.mailer.sent()[0];
    assert!(mail.body.contains("Nombre: &lt;b&gt;Ana&lt;/b&gt;"));
    assert!(mail.body.contains(
        "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#039;y&#039;"
    ));
    assert!(!mail.body.contains("<script>"));
    assert!(!mail.body.contains("&amp;lt;"));
}

#[tokio::test]
async fn invalid_email_is_rejected_for_every_form() {
    let app = common::spawn_app().await;

    for bad in ["usuario.ejemplo.com", "usuario@ejemplo"] {
        for (path, base) in [
            ("/contact", contact_fields()),
            ("/quote", quote_fields()),
            ("/support", support_fields()),
        ] {
            let fields: Vec<(&str, &str)> = base
                .into_iter()
                .map(|(k, v)| if k == "email" { (k, bad) } else { (k, v) })
                .collect();

            let (body, status, cookie) = app.post_form(path, &fields, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["exito"], false, "{path} accepted {bad}");
            assert_eq!(body["mensaje"], VALIDATION_FAILED);
            assert_eq!(body["datos"], json!([BAD_EMAIL]));
            assert!(cookie.is_none());
        }
    }

    assert_eq!(app.mailer.attempts(), 0);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let app = common::spawn_app().await;

    let long = "a".repeat(3001);
    let fields = [
        ("nombre", "Ana"),
        ("email", "ana@example.com"),
        ("mensaje", long.as_str()),
    ];
    let (body, _, _) = app.post_form("/contact", &fields, None).await;
    assert_eq!(body["exito"], false);
    assert_eq!(
        body["datos"],
        json!(["El mensaje es demasiado largo (máximo 3000 caracteres)"])
    );
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn mail_failure_is_soft() {
    let app = common::spawn_app().await;
    app.mailer.set_failing(true);

    let (body, status, _) = app.post_form("/contact", &contact_fields(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], false);
    assert_eq!(
        body["mensaje"],
        "Error al enviar el mensaje. Por favor, intenta nuevamente o contacta directamente por teléfono al +54 11 1234-5678."
    );
    assert_eq!(app.mailer.attempts(), 1);
    assert!(app.mailer.sent().is_empty());
}

// ── Quote ───────────────────────────────────────────────────────

#[tokio::test]
async fn quote_missing_phone_is_rejected() {
    let app = common::spawn_app().await;

    let fields: Vec<_> = quote_fields()
        .into_iter()
        .filter(|(k, _)| *k != "telefono")
        .collect();
    let (body, status, _) = app.post_form("/quote", &fields, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], false);
    assert_eq!(body["mensaje"], VALIDATION_FAILED);
    assert_eq!(
        body["datos"],
        json!(["El teléfono es obligatorio y debe ser válido"])
    );
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn quote_fills_in_defaults() {
    let app = common::spawn_app().await;

    let (body, _, _) = app.post_form("/quote", &quote_fields(), None).await;
    assert_eq!(body["exito"], true);
    assert_eq!(
        body["mensaje"],
        "Solicitud de presupuesto enviada correctamente. Nos pondremos en contacto contigo pronto."
    );

    let mail = &app.mailer.sent()[0];
    assert_eq!(mail.to, common::QUOTE_TO);
    assert_eq!(
        mail.subject,
        "Nueva Solicitud de Presupuesto - ACE Ingeniería & Conectividad - Redes"
    );
    assert!(mail.body.contains("Empresa: No especificada"));
    assert!(mail.body.contains("Nivel de urgencia: Normal"));
    assert!(mail.body.contains("Presupuesto estimado: No especificado"));
    assert!(!mail.body.contains("INSTRUCCIONES:"));
}

#[tokio::test]
async fn quote_accepts_json_body() {
    let app = common::spawn_app().await;

    let data = json!({
        "nombre": "Bruno",
        "email": "bruno@example.com",
        "telefono": "1155550000",
        "servicio": "cctv",
        "descripcion": "Cuatro cámaras",
        "presupuesto_estimado": 5000,
    });
    let (body, status) = app.post_json("/quote", &data).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], true);

    let mail = &app.mailer.sent()[0];
    assert!(mail.body.contains("Presupuesto estimado: 5000"));
    assert!(mail.subject.ends_with("- Cctv"));
}

#[tokio::test]
async fn quote_accepts_multipart_body() {
    let app = common::spawn_app().await;

    let boundary = "formdesk-boundary";
    let body: String = quote_fields()
        .iter()
        .map(|(k, v)| {
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{k}\"\r\n\r\n{v}\r\n")
        })
        .chain(std::iter::once(format!("--{boundary}--\r\n")))
        .collect();

    let resp = app
        .client
        .post(app.url("/quote"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["exito"], true);
    assert_eq!(app.mailer.sent().len(), 1);
}

// ── Support ─────────────────────────────────────────────────────

#[tokio::test]
async fn support_issues_ticket_then_throttles() {
    let app = common::spawn_app().await;
    let ticket_re = Regex::new(r"^TKT-\d{8}-[A-Z0-9]{6}$").unwrap();

    let (body, status, cookie) = app.post_form("/support", &support_fields(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], true);
    assert_eq!(body["mensaje"], "Ticket de soporte creado correctamente");
    assert_eq!(body["datos"]["tiempo_estimado"], "24 horas");

    let ticket = body["datos"]["ticket"].as_str().unwrap().to_string();
    assert!(ticket_re.is_match(&ticket), "bad ticket {ticket}");
    assert!(body["datos"]["mensaje"].as_str().unwrap().contains(&ticket));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, common::SUPPORT_TO);
    assert!(sent[0].subject.ends_with(&ticket));
    assert_eq!(sent[0].header(ExtraHeader::Ticket), Some(ticket.as_str()));
    assert!(sent[0].body.contains(&format!("NÚMERO DE TICKET: {ticket}")));
    assert!(sent[0].body.contains("Prioridad: Alta"));
    assert!(sent[0].body.contains("Equipo afectado: No especificado"));

    let cookie = cookie.expect("first accepted submission sets a session cookie");
    let (body, status, again) = app
        .post_form("/support", &support_fields(), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exito"], false);
    assert_eq!(
        body["mensaje"],
        "Por favor, espera unos minutos antes de enviar otro ticket de soporte"
    );
    assert!(again.is_none());
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn support_reports_every_missing_field_in_order() {
    let app = common::spawn_app().await;

    let (body, _, _) = app.post_form("/support", &[], None).await;
    assert_eq!(body["exito"], false);
    assert_eq!(
        body["datos"],
        json!([
            "El nombre es obligatorio",
            BAD_EMAIL,
            "El teléfono es obligatorio y debe ser válido",
            "Debe seleccionar el tipo de problema",
            "La descripción del problema es obligatoria",
        ])
    );
}

// ── Throttling & sessions ───────────────────────────────────────

#[tokio::test]
async fn throttle_expires_after_interval() {
    let mut config = common::test_config();
    config.limits.contact = FormLimits {
        min_interval_secs: 1,
        max_description_len: 3000,
    };
    let app = common::spawn_app_with(config).await;

    let (body, _, cookie) = app.post_form("/contact", &contact_fields(), None).await;
    assert_eq!(body["exito"], true);
    let cookie = cookie.unwrap();

    let (body, _, _) = app
        .post_form("/contact", &contact_fields(), Some(&cookie))
        .await;
    assert_eq!(body["exito"], false);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (body, _, _) = app
        .post_form("/contact", &contact_fields(), Some(&cookie))
        .await;
    assert_eq!(body["exito"], true);
    assert_eq!(app.mailer.sent().len(), 2);
}

#[tokio::test]
async fn form_types_are_throttled_independently() {
    let app = common::spawn_app().await;

    let (body, _, cookie) = app.post_form("/contact", &contact_fields(), None).await;
    assert_eq!(body["exito"], true);
    let cookie = cookie.unwrap();

    let (body, _, _) = app.post_form("/quote", &quote_fields(), Some(&cookie)).await;
    assert_eq!(body["exito"], true);

    let (body, _, _) = app
        .post_form("/support", &support_fields(), Some(&cookie))
        .await;
    assert_eq!(body["exito"], true);

    let (body, _, _) = app
        .post_form("/contact", &contact_fields(), Some(&cookie))
        .await;
    assert_eq!(body["exito"], false);

    assert_eq!(app.mailer.sent().len(), 3);
    assert_eq!(app.state.sessions.len(), 1);
}

#[tokio::test]
async fn request_without_cookie_starts_a_new_session() {
    let app = common::spawn_app().await;

    let (first, _, first_cookie) = app.post_form("/contact", &contact_fields(), None).await;
    let (second, _, second_cookie) = app.post_form("/contact", &contact_fields(), None).await;

    assert_eq!(first["exito"], true);
    assert_eq!(second["exito"], true);
    assert_ne!(first_cookie.unwrap(), second_cookie.unwrap());
    assert_eq!(app.state.sessions.len(), 2);
}

#[tokio::test]
async fn unknown_cookie_gets_a_fresh_session() {
    let app = common::spawn_app().await;

    let (body, _, cookie) = app
        .post_form("/contact", &contact_fields(), Some("formdesk_session=forged"))
        .await;
    assert_eq!(body["exito"], true);
    let cookie = cookie.unwrap();
    assert_ne!(cookie, "formdesk_session=forged");
}

// ── Legacy paths & request metadata ─────────────────────────────

#[tokio::test]
async fn legacy_paths_map_to_the_same_forms() {
    let app = common::spawn_app().await;

    let (body, _, _) = app.post_form("/php/enviar.php", &contact_fields(), None).await;
    assert_eq!(body["exito"], true);
    let (body, _, _) = app.post_form("/php/presupuesto.php", &quote_fields(), None).await;
    assert_eq!(body["exito"], true);
    let (body, _, _) = app.post_form("/php/soporte.php", &support_fields(), None).await;
    assert_eq!(body["exito"], true);
    assert!(body["datos"]["ticket"].is_string());

    let recipients: Vec<String> = app.mailer.sent().into_iter().map(|m| m.to).collect();
    assert_eq!(
        recipients,
        vec![common::CONTACT_TO, common::QUOTE_TO, common::SUPPORT_TO]
    );
}

#[tokio::test]
async fn forwarded_for_is_ignored_from_untrusted_peer() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .header("x-forwarded-for", "203.0.113.7")
        .header("user-agent", "formdesk-tests/1.0")
        .form(&contact_fields())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mail = &app.mailer.sent()[0];
    assert!(mail.body.contains("IP: 127.0.0.1"));
    assert!(mail.body.contains("User-Agent: formdesk-tests/1.0"));
}

#[tokio::test]
async fn forwarded_for_is_used_behind_trusted_proxy() {
    let mut config = common::test_config();
    config.trusted_proxies = vec!["127.0.0.1/32".parse().unwrap()];
    let app = common::spawn_app_with(config).await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .header("x-forwarded-for", "203.0.113.7, 127.0.0.1")
        .form(&contact_fields())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mail = &app.mailer.sent()[0];
    assert!(mail.body.contains("IP: 203.0.113.7"));
}
