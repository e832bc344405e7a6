use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::form::{Control, Direction, ItemId};
use crate::path::FieldPath;
use crate::schema::ValidationErrors;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Initial values keyed by field; arrays as lists of item objects.
    #[schema(value_type = Option<Object>)]
    pub defaults: Option<Map<String, Value>>,
    #[schema(example = "en")]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetValueRequest {
    #[schema(value_type = String, example = "dependents.0.name")]
    pub path: FieldPath,
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendItemRequest {
    #[schema(value_type = String, example = "dependents")]
    pub path: FieldPath,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemRequest {
    #[schema(value_type = String, example = "dependents")]
    pub path: FieldPath,
    pub position: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocaleQuery {
    /// Overrides the session locale for this render only.
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VersionQuery {
    pub version: Option<i64>,
}

/// Rendered form: the control tree with current values and errors.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub template_id: String,
    pub version: i64,
    pub locale: String,
    pub direction: Direction,
    #[schema(value_type = Vec<Object>)]
    pub controls: Vec<Control>,
    #[schema(value_type = Object)]
    pub errors: ValidationErrors,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdded {
    #[schema(value_type = u64)]
    pub item_id: ItemId,
    pub position: usize,
    pub form: SessionView,
}
