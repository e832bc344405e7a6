use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use log::{debug, info};
use sanitize_filename::sanitize;
use utoipa::ToSchema;

use super::models::VersionQuery;
use super::{store_failure, transport_failure};
use crate::spec::{TemplateSpec, TemplateSummary};
use crate::state::AppState;
use crate::ErrorResponse;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct InspectTemplateRequest {
    /// The `.docx` template document.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Reads the `file` part of the upload: sanitized name and content.
async fn read_upload(mut payload: Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(mut field) = payload.try_next().await.map_err(|e| e.to_string())? {
        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        if content_disposition.get_name() != Some("file") {
            continue;
        }
        let file_name = content_disposition
            .get_filename()
            .map(sanitize)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "template.docx".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(format!(
                    "Template exceeds the {} MB upload limit",
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err("Uploaded file is empty".to_string());
        }
        return Ok((file_name, bytes));
    }
    Err("Missing 'file' field in upload".to_string())
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    post,
    path = "/templates/inspect",
    request_body(content = inline(InspectTemplateRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Template inspected and set as active", body = TemplateSpec),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 502, description = "Template service failure", body = ErrorResponse)
    )
)]
pub async fn inspect_template(payload: Multipart, data: web::Data<AppState>) -> impl Responder {
    let (file_name, content) = match read_upload(payload).await {
        Ok(upload) => upload,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e)),
    };
    debug!("Inspecting template {} ({} bytes)", file_name, content.len());

    let spec = match data.templates.inspect(&file_name, content).await {
        Ok(spec) => spec,
        Err(e) => return transport_failure(&e),
    };
    info!(
        "Template {} v{} inspected: {} fields",
        spec.template_id,
        spec.version,
        spec.fields.len()
    );

    match data.active_spec.set(spec.clone()).await {
        Ok(()) => HttpResponse::Ok().json(spec),
        Err(e) => store_failure(&e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Templates known to the template service", body = Vec<TemplateSummary>),
        (status = 502, description = "Template service failure", body = ErrorResponse)
    )
)]
pub async fn list_templates(data: web::Data<AppState>) -> impl Responder {
    match data.templates.list_templates().await {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => transport_failure(&e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    post,
    path = "/templates/{id}/select",
    params(
        ("id" = String, Path, description = "Template ID"),
        VersionQuery
    ),
    responses(
        (status = 200, description = "Template specification set as active", body = TemplateSpec),
        (status = 502, description = "Template service failure", body = ErrorResponse)
    )
)]
pub async fn select_template(
    path: web::Path<String>,
    query: web::Query<VersionQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let template_id = path.into_inner();
    let spec = match data.templates.get_spec(&template_id, query.version).await {
        Ok(spec) => spec,
        Err(e) => return transport_failure(&e),
    };

    match data.active_spec.set(spec.clone()).await {
        Ok(()) => HttpResponse::Ok().json(spec),
        Err(e) => store_failure(&e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    delete,
    path = "/templates/{id}",
    params(
        ("id" = String, Path, description = "Template ID"),
        VersionQuery
    ),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 502, description = "Template service failure", body = ErrorResponse)
    )
)]
pub async fn delete_template(
    path: web::Path<String>,
    query: web::Query<VersionQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let template_id = path.into_inner();
    if let Err(e) = data.templates.delete_template(&template_id, query.version).await {
        return transport_failure(&e);
    }
    info!("Template {} deleted", template_id);

    match data.active_spec.clear_if(&template_id).await {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(e) => store_failure(&e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    get,
    path = "/templates/active",
    responses(
        (status = 200, description = "Active template specification", body = TemplateSpec),
        (status = 404, description = "No template selected yet", body = ErrorResponse)
    )
)]
pub async fn get_active_template(data: web::Data<AppState>) -> impl Responder {
    match data.active_spec.get().await {
        Ok(Some(spec)) => HttpResponse::Ok().json(spec),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found(
            "No template selected. Upload a template first.",
        )),
        Err(e) => store_failure(&e),
    }
}
