use actix_web::{web, HttpResponse, Responder};
use log::warn;

use crate::models::CurrentView;
use crate::state::AppState;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess session client: connect a renderer to /ws")
}

/// The render view the session would push right now
pub async fn view(app_state: web::Data<AppState>) -> HttpResponse {
    match app_state.session.send(CurrentView).await {
        Ok(message) => HttpResponse::Ok().json(message),
        Err(e) => {
            warn!("Session actor unavailable: {}", e);
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/view").route(web::get().to(view)))
        .service(web::resource("/").route(web::get().to(index)));
}
