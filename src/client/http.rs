use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use url::Url;

use super::wire::{error_message, unwrap_envelope};
use super::{RenderRequest, TemplateService, TransportError};
use crate::spec::{TemplateSpec, TemplateSummary};

/// reqwest client for the template service REST API.
#[derive(Debug, Clone)]
pub struct TemplateServiceClient {
    base_url: Url,
    client: Client,
}

impl TemplateServiceClient {
    pub fn new(base_url: Url, client: Client) -> Self {
        Self { base_url, client }
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Turns every non-success status into a [`TransportError::Status`].
    async fn check(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body, status.canonical_reason());
        log::error!("Template service responded {}: {}", status, message);
        Err(TransportError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_spec(response: Response) -> Result<TemplateSpec, TransportError> {
        let body = Self::check(response).await?.json().await?;
        unwrap_envelope(body, &["data"])
    }
}

#[async_trait]
impl TemplateService for TemplateServiceClient {
    async fn inspect(&self, file_name: &str, content: Vec<u8>) -> Result<TemplateSpec, TransportError> {
        let url = self.endpoint(&["templates", "inspect"]);
        log::debug!("POST {} ({} bytes)", url, content.len());

        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_spec(response).await
    }

    async fn get_spec(&self, template_id: &str, version: Option<i64>) -> Result<TemplateSpec, TransportError> {
        let url = self.endpoint(&["templates", template_id, "spec"]);
        log::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        Self::read_spec(request.send().await?).await
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, TransportError> {
        let url = self.endpoint(&["templates"]);
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let body = Self::check(response).await?.json().await?;
        unwrap_envelope(body, &["data", "templates"])
    }

    async fn delete_template(&self, template_id: &str, version: Option<i64>) -> Result<(), TransportError> {
        let url = self.endpoint(&["templates", template_id]);
        log::debug!("DELETE {}", url);

        let mut request = self.client.delete(url);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, TransportError> {
        let url = self.endpoint(&["templates", "render", "docx"]);
        log::debug!("POST {} for template {}", url, request.template_id);

        let response = self.client.post(url).json(request).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
