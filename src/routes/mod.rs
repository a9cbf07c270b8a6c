pub mod forms;

use axum::routing::any;
use axum::Router;

use crate::state::SharedState;

pub fn form_routes() -> Router<SharedState> {
    Router::new()
        .route("/contact", any(forms::contact))
        .route("/quote", any(forms::quote))
        .route("/support", any(forms::support))
        // Legacy paths the older site pages still post to
        .route("/php/enviar.php", any(forms::contact))
        .route("/php/presupuesto.php", any(forms::quote))
        .route("/php/soporte.php", any(forms::support))
}
