use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::TransportError;
use crate::schema::StructuredValue;

/// Body of `POST /templates/render/docx`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[schema(value_type = Object)]
    pub data: StructuredValue,
}

impl RenderRequest {
    pub fn new(template_id: impl Into<String>, data: StructuredValue) -> Self {
        Self {
            template_id: template_id.into(),
            file_hash: None,
            data,
        }
    }
}

/// Unwraps `{ success, data }`-style envelopes. The first of `keys` present in
/// the body wins; a body without any of them is taken as the payload itself.
pub(super) fn unwrap_envelope<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<T, TransportError> {
    let payload = match body {
        Value::Object(mut map) => match keys.iter().find_map(|key| map.remove(*key)) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Error text of a failed call: the body's `error`, else `message`, else the
/// raw body, else the status reason.
pub(super) fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(Value::String(text)) = map.get(key) {
                if !text.is_empty() {
                    return text.clone();
                }
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() && body.len() <= 200 {
        return body.to_string();
    }
    reason.unwrap_or("request failed").to_string()
}
