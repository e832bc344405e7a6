//! Inspection/rendering service collaborator.
//!
//! [`TemplateService`] is the seam the rest of the crate talks through; the
//! reqwest-backed [`TemplateServiceClient`] is the production implementation.

mod http;
mod wire;

pub use http::TemplateServiceClient;
pub use wire::RenderRequest;

use async_trait::async_trait;
use thiserror::Error;

use crate::spec::{TemplateSpec, TemplateSummary};

/// Collaborator unreachable, or it answered with something other than success.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("template service unreachable: {0}")]
    Unreachable(String),
    /// Non-success status; `message` is the service's own error text.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from template service: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
pub trait TemplateService: Send + Sync {
    /// Uploads a template document and returns the specification derived from it.
    async fn inspect(&self, file_name: &str, content: Vec<u8>) -> Result<TemplateSpec, TransportError>;

    async fn get_spec(&self, template_id: &str, version: Option<i64>) -> Result<TemplateSpec, TransportError>;

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, TransportError>;

    async fn delete_template(&self, template_id: &str, version: Option<i64>) -> Result<(), TransportError>;

    /// Renders the filled template; the result is the document bytes.
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, TransportError>;
}
