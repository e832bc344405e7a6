use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod client;
pub mod config;
pub mod form;
pub mod path;
pub mod schema;
pub mod session;
pub mod spec;
pub mod state;
pub mod store;
pub mod submission;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

use crate::schema::ValidationErrors;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Failed submission: one entry per invalid field, keyed by field path.
#[derive(Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub fields: ValidationErrors,
    pub timestamp: String,
}

impl ValidationErrorResponse {
    pub fn new(errors: &ValidationErrors) -> Self {
        Self {
            error: "ValidationFailed".to_string(),
            message: errors.to_message(),
            fields: errors.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::session::templates::inspect_template,
        crate::session::templates::list_templates,
        crate::session::templates::select_template,
        crate::session::templates::delete_template,
        crate::session::templates::get_active_template,
        crate::session::handlers::create_session,
        crate::session::handlers::get_session,
        crate::session::handlers::set_value,
        crate::session::handlers::append_item,
        crate::session::handlers::remove_item,
        crate::session::handlers::submit,
        crate::session::handlers::delete_session
    ),
    components(
        schemas(
            spec::FieldSpec,
            spec::FieldFormat,
            spec::ImageConstraints,
            spec::TemplateSpec,
            spec::TemplateSummary,
            form::Direction,
            client::RenderRequest,
            session::models::CreateSessionRequest,
            session::models::SetValueRequest,
            session::models::AppendItemRequest,
            session::models::RemoveItemRequest,
            session::models::SessionView,
            session::models::ItemAdded,
            session::templates::InspectTemplateRequest,
            ErrorResponse,
            ValidationErrorResponse,
        )
    ),
    tags(
        (name = "Templates", description = "Template inspection and selection."),
        (name = "Form Sessions", description = "Form filling, validation and rendering.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let bind_address = config.bind_address.clone();
    log::info!("Template service at {}", config.template_api_url);

    let app_state = match AppState::new(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("docform")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log::info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .service(web::scope("/api").configure(session::config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await
}
