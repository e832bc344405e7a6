//! HTTP surface of the form backend: template management and form sessions.
//!
//! A session owns one [`Form`] bound to the active specification. It lives in
//! the session cache until it is submitted, deleted, or left idle.

pub mod handlers;
pub mod models;
pub mod templates;

use actix_web::{web, HttpResponse};

use crate::client::TransportError;
use crate::form::{Direction, Form, RenderContext};
use crate::store::StoreError;
use crate::submission::SubmissionBridge;
use crate::ErrorResponse;
use models::SessionView;
use uuid::Uuid;

pub struct FormSession {
    pub template_id: String,
    pub version: i64,
    pub locale: String,
    pub form: Form,
    pub bridge: SubmissionBridge,
}

impl FormSession {
    pub fn view(&self, id: Uuid, locale: Option<&str>) -> SessionView {
        let locale = locale.unwrap_or(&self.locale);
        let ctx = RenderContext::new(locale);
        SessionView {
            session_id: id,
            template_id: self.template_id.clone(),
            version: self.version,
            locale: locale.to_string(),
            direction: Direction::for_locale(locale),
            controls: self.form.render(&ctx),
            errors: self.form.errors().clone(),
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // Literal template paths before `{id}` so they are not captured by it.
    cfg.service(web::resource("/templates").route(web::get().to(templates::list_templates)))
        .service(
            web::resource("/templates/inspect").route(web::post().to(templates::inspect_template)),
        )
        .service(
            web::resource("/templates/active").route(web::get().to(templates::get_active_template)),
        )
        .service(
            web::resource("/templates/{id}/select")
                .route(web::post().to(templates::select_template)),
        )
        .service(
            web::resource("/templates/{id}").route(web::delete().to(templates::delete_template)),
        )
        .service(web::resource("/sessions").route(web::post().to(handlers::create_session)))
        .service(
            web::resource("/sessions/{id}")
                .route(web::get().to(handlers::get_session))
                .route(web::delete().to(handlers::delete_session)),
        )
        .service(web::resource("/sessions/{id}/values").route(web::put().to(handlers::set_value)))
        .service(
            web::resource("/sessions/{id}/items")
                .route(web::post().to(handlers::append_item))
                .route(web::delete().to(handlers::remove_item)),
        )
        .service(web::resource("/sessions/{id}/submit").route(web::post().to(handlers::submit)));
}

pub(crate) fn transport_failure(err: &TransportError) -> HttpResponse {
    log::error!("Template service call failed: {}", err);
    HttpResponse::BadGateway().json(ErrorResponse::new("TransportFailure", &err.to_string()))
}

pub(crate) fn store_failure(err: &StoreError) -> HttpResponse {
    log::error!("Specification store failed: {}", err);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&err.to_string()))
}

pub(crate) fn session_not_found(id: &Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
        "Form session {} not found",
        id
    )))
}
