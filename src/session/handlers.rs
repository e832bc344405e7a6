use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use super::models::{
    AppendItemRequest, CreateSessionRequest, ItemAdded, LocaleQuery, RemoveItemRequest,
    SessionView, SetValueRequest,
};
use super::{session_not_found, store_failure, transport_failure, FormSession};
use crate::form::{Form, FormError};
use crate::state::{AppState, SessionHandle};
use crate::submission::{SubmissionBridge, SubmitError};
use crate::{ErrorResponse, ValidationErrorResponse};

pub const DOCUMENT_FILE_NAME: &str = "rendered-document.docx";

async fn find_session(data: &AppState, id: &Uuid) -> Option<SessionHandle> {
    data.sessions.get(id).await
}

fn form_error(err: FormError) -> HttpResponse {
    debug!("Rejected form edit: {}", err);
    HttpResponse::BadRequest().json(ErrorResponse::new("FormError", &err.to_string()))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Form bound to the active template", body = SessionView),
        (status = 404, description = "No active template", body = ErrorResponse),
        (status = 422, description = "Specification cannot be compiled", body = ErrorResponse)
    )
)]
pub async fn create_session(
    data: web::Data<AppState>,
    body: Option<web::Json<CreateSessionRequest>>,
) -> impl Responder {
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    let spec = match data.active_spec.get().await {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(
                "No template selected. Upload a template first.",
            ))
        }
        Err(e) => return store_failure(&e),
    };

    let form = match Form::bind(spec.fields, request.defaults.as_ref()) {
        Ok(form) => form,
        Err(e) => {
            warn!("Template {} has an invalid specification: {}", spec.template_id, e);
            return HttpResponse::UnprocessableEntity()
                .json(ErrorResponse::new("InvalidSpecification", &e.to_string()));
        }
    };

    let id = Uuid::new_v4();
    let session = FormSession {
        template_id: spec.template_id,
        version: spec.version,
        locale: request
            .locale
            .unwrap_or_else(|| data.config.default_locale.clone()),
        form,
        bridge: SubmissionBridge::new(data.templates.clone()),
    };
    let view = session.view(id, None);
    data.sessions.insert(id, Arc::new(Mutex::new(session))).await;
    info!("Form session {} opened for template {}", id, view.template_id);

    HttpResponse::Created().json(view)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    get,
    path = "/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        LocaleQuery
    ),
    responses(
        (status = 200, description = "Current control tree", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_session(
    path: web::Path<Uuid>,
    query: web::Query<LocaleQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let id = path.into_inner();
    match find_session(&data, &id).await {
        Some(session) => {
            let view = session.lock().view(id, query.locale.as_deref());
            HttpResponse::Ok().json(view)
        }
        None => session_not_found(&id),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    put,
    path = "/sessions/{id}/values",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SetValueRequest,
    responses(
        (status = 200, description = "Value stored; the field's own error is refreshed", body = SessionView),
        (status = 400, description = "Unknown path or unsuitable value", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn set_value(
    path: web::Path<Uuid>,
    body: web::Json<SetValueRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(session) = find_session(&data, &id).await else {
        return session_not_found(&id);
    };
    let SetValueRequest { path: field, value } = body.into_inner();

    let mut session = session.lock();
    if let Err(e) = session.form.set_value(&field, value) {
        return form_error(e);
    }
    HttpResponse::Ok().json(session.view(id, None))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    post,
    path = "/sessions/{id}/items",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = AppendItemRequest,
    responses(
        (status = 201, description = "Entry appended to the list", body = ItemAdded),
        (status = 400, description = "Path is not a list field", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn append_item(
    path: web::Path<Uuid>,
    body: web::Json<AppendItemRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(session) = find_session(&data, &id).await else {
        return session_not_found(&id);
    };

    let mut session = session.lock();
    let item_id = match session.form.append_item(&body.path) {
        Ok(item_id) => item_id,
        Err(e) => return form_error(e),
    };
    let position = session
        .form
        .state()
        .group_at(&body.path)
        .and_then(|group| group.position_of(item_id))
        .unwrap_or_default();

    HttpResponse::Created().json(ItemAdded {
        item_id,
        position,
        form: session.view(id, None),
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    delete,
    path = "/sessions/{id}/items",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = RemoveItemRequest,
    responses(
        (status = 200, description = "Entry removed; later entries keep their identity", body = SessionView),
        (status = 400, description = "Path is not a list field or position out of range", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn remove_item(
    path: web::Path<Uuid>,
    body: web::Json<RemoveItemRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(session) = find_session(&data, &id).await else {
        return session_not_found(&id);
    };

    let mut session = session.lock();
    if let Err(e) = session.form.remove_item(&body.path, body.position) {
        return form_error(e);
    }
    HttpResponse::Ok().json(session.view(id, None))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    post,
    path = "/sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Rendered document", content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "A submission is already in progress", body = ErrorResponse),
        (status = 422, description = "Field validation failed", body = ValidationErrorResponse),
        (status = 502, description = "Template service failure; the form is kept", body = ErrorResponse)
    )
)]
pub async fn submit(path: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    let id = path.into_inner();
    let Some(handle) = find_session(&data, &id).await else {
        return session_not_found(&id);
    };

    // Validation runs under the lock against the state as it is right now.
    let pending = {
        let mut session = handle.lock();
        let template_id = session.template_id.clone();
        let bridge = session.bridge.clone();
        bridge.prepare(&mut session.form, &template_id)
    };

    let pending = match pending {
        Ok(pending) => pending,
        Err(SubmitError::Validation(errors)) => {
            info!("Form session {} failed validation with {} error(s)", id, errors.len());
            return HttpResponse::UnprocessableEntity().json(ValidationErrorResponse::new(&errors));
        }
        Err(SubmitError::InFlight) => {
            return HttpResponse::Conflict().json(ErrorResponse::new(
                "SubmissionInProgress",
                "A submission for this form is already in progress",
            ))
        }
        Err(SubmitError::Transport(e)) => return transport_failure(&e),
    };

    let document = match pending.send().await {
        Ok(document) => document,
        Err(SubmitError::Transport(e)) => return transport_failure(&e),
        Err(e) => {
            return HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    };

    // Discard the session, unless it was abandoned or replaced meanwhile.
    match data.sessions.get(&id).await {
        Some(current) if Arc::ptr_eq(&current, &handle) => {
            data.sessions.invalidate(&id).await;
            info!("Form session {} submitted and closed", id);
        }
        _ => debug!("Form session {} was abandoned during rendering", id),
    }

    let docx = mime_guess::from_ext("docx").first_or_octet_stream();
    HttpResponse::Ok()
        .content_type(docx.essence_str())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(DOCUMENT_FILE_NAME.to_string())],
        })
        .body(document)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Form Sessions",
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session abandoned"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn delete_session(path: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    let id = path.into_inner();
    match data.sessions.remove(&id).await {
        Some(_) => {
            info!("Form session {} abandoned", id);
            HttpResponse::NoContent().finish()
        }
        None => session_not_found(&id),
    }
}
