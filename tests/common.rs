use async_trait::async_trait;
use docform::client::{RenderRequest, TemplateService, TransportError};
use docform::spec::{TemplateSpec, TemplateSummary};
use docform::store::FileSpecStore;
use docform::{AppConfig, AppState};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory template service that records every call.
pub struct MockTemplateService {
    pub specs: Mutex<Vec<TemplateSpec>>,
    pub renders: Mutex<Vec<RenderRequest>>,
    pub deleted: Mutex<Vec<(String, Option<i64>)>>,
    pub render_failure: Mutex<Option<TransportError>>,
    /// Delay before a render answers, to hold a submission in flight.
    pub render_delay: Mutex<Option<std::time::Duration>>,
}

impl MockTemplateService {
    pub fn new(specs: Vec<TemplateSpec>) -> Self {
        Self {
            specs: Mutex::new(specs),
            renders: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            render_failure: Mutex::new(None),
            render_delay: Mutex::new(None),
        }
    }

    async fn find(&self, template_id: &str) -> Result<TemplateSpec, TransportError> {
        self.specs
            .lock()
            .await
            .iter()
            .find(|spec| spec.template_id == template_id)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                message: "Template not found".to_string(),
            })
    }
}

#[async_trait]
impl TemplateService for MockTemplateService {
    async fn inspect(&self, file_name: &str, _content: Vec<u8>) -> Result<TemplateSpec, TransportError> {
        if !file_name.ends_with(".docx") {
            return Err(TransportError::Status {
                status: 400,
                message: "Only .docx files are supported".to_string(),
            });
        }
        let specs = self.specs.lock().await;
        specs.first().cloned().ok_or_else(|| TransportError::Status {
            status: 500,
            message: "no template configured".to_string(),
        })
    }

    async fn get_spec(&self, template_id: &str, _version: Option<i64>) -> Result<TemplateSpec, TransportError> {
        self.find(template_id).await
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, TransportError> {
        let specs = self.specs.lock().await;
        Ok(specs
            .iter()
            .map(|spec| TemplateSummary {
                template_id: spec.template_id.clone(),
                name: format!("{}.docx", spec.template_id),
                version: spec.version,
                created_at: "2024-05-01T10:00:00Z".to_string(),
                fields: spec.fields.clone(),
            })
            .collect())
    }

    async fn delete_template(&self, template_id: &str, version: Option<i64>) -> Result<(), TransportError> {
        self.find(template_id).await?;
        self.deleted
            .lock()
            .await
            .push((template_id.to_string(), version));
        Ok(())
    }

    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, TransportError> {
        let delay = *self.render_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.renders.lock().await.push(request.clone());
        match self.render_failure.lock().await.clone() {
            Some(err) => Err(err),
            None => Ok(b"PK-rendered".to_vec()),
        }
    }
}

pub fn people_spec() -> TemplateSpec {
    serde_json::from_value(json!({
        "templateId": "tpl_people",
        "version": 1,
        "fields": [
            { "key": "name", "type": "text", "required": true, "label": { "en": "Name", "ar": "الاسم" } },
            { "key": "age", "type": "number", "min": 0, "max": 120 },
            { "key": "dependents", "type": "array", "itemShape": {
                "name": { "type": "text", "required": true },
                "relation": { "type": "select", "options": ["Spouse", "Child", "Other"] }
            }}
        ]
    }))
    .unwrap()
}

pub fn broken_spec() -> TemplateSpec {
    serde_json::from_value(json!({
        "templateId": "tpl_broken",
        "version": 1,
        "fields": [
            { "key": "name", "type": "text" },
            { "key": "name", "type": "number" }
        ]
    }))
    .unwrap()
}

pub fn test_state(dir: &Path, service: Arc<MockTemplateService>) -> AppState {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    AppState::with_parts(config, service, Arc::new(FileSpecStore::new(dir)))
}
