//! Field renderer: walks the specification and produces the control tree the
//! UI shell draws, one control per field, recursing into array item shapes.
//!
//! Locale and direction come in through [`RenderContext`]; nothing here reads
//! ambient UI state.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::state::{FormState, ItemId};
use crate::path::FieldPath;
use crate::schema::{ErrorKind, ValidationError, ValidationErrors};
use crate::spec::{FieldFormat, FieldKind, FieldSpec, ImageConstraints};

const IMAGE_PLACEHOLDER: &str = "https://example.com/image.png";
const RTL_LOCALES: [&str; 4] = ["ar", "he", "fa", "ur"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split(|c| c == '-' || c == '_').next().unwrap_or(locale);
        if RTL_LOCALES.contains(&language) {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

/// Read-only presentation context supplied by the shell.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub locale: &'a str,
    pub direction: Direction,
}

impl<'a> RenderContext<'a> {
    pub fn new(locale: &'a str) -> Self {
        Self {
            locale,
            direction: Direction::for_locale(locale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&ValidationError> for ControlError {
    fn from(error: &ValidationError) -> Self {
        Self {
            kind: error.kind,
            message: error.message.clone(),
            suggestion: error.suggestion.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "lowercase")]
pub enum Control {
    Input(InputControl),
    Group(GroupControl),
}

impl Control {
    pub fn path(&self) -> &str {
        match self {
            Control::Input(input) => &input.path,
            Control::Group(group) => &group.path,
        }
    }

    pub fn error(&self) -> Option<&ControlError> {
        match self {
            Control::Input(input) => input.error.as_ref(),
            Control::Group(group) => group.error.as_ref(),
        }
    }
}

/// Single-value control (text, number, date, select, image).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputControl {
    pub path: String,
    pub key: String,
    pub label: String,
    pub input_type: &'static str,
    pub required: bool,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ImageConstraints>,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ControlError>,
}

/// Repeatable group; items are keyed by their stable id, listed by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupControl {
    pub path: String,
    pub key: String,
    pub label: String,
    pub required: bool,
    pub items: Vec<GroupItem>,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ControlError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    pub id: ItemId,
    pub position: usize,
    pub path: String,
    pub controls: Vec<Control>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ControlError>,
}

pub fn render(
    fields: &[FieldSpec],
    state: &FormState,
    errors: &ValidationErrors,
    ctx: &RenderContext<'_>,
) -> Vec<Control> {
    render_fields(fields, state, errors, ctx, &FieldPath::root())
}

fn render_fields(
    fields: &[FieldSpec],
    state: &FormState,
    errors: &ValidationErrors,
    ctx: &RenderContext<'_>,
    path: &FieldPath,
) -> Vec<Control> {
    fields
        .iter()
        .filter_map(|field| render_field(field, state, errors, ctx, &path.key(&field.key)))
        .collect()
}

fn render_field(
    field: &FieldSpec,
    state: &FormState,
    errors: &ValidationErrors,
    ctx: &RenderContext<'_>,
    path: &FieldPath,
) -> Option<Control> {
    let input_type = match field.kind {
        FieldKind::Text if field.format == Some(FieldFormat::Email) => "email",
        FieldKind::Text => "text",
        FieldKind::Number => "number",
        FieldKind::Date => "date",
        FieldKind::Select => "select",
        FieldKind::Image => "url",
        FieldKind::Array => return Some(Control::Group(render_group(field, state, errors, ctx, path))),
        // Unrecognised kinds render nothing.
        FieldKind::Unknown => return None,
    };

    let label = field.display_label(ctx.locale).to_string();
    let placeholder = match field.kind {
        FieldKind::Text | FieldKind::Number => Some(label.clone()),
        FieldKind::Image => Some(IMAGE_PLACEHOLDER.to_string()),
        _ => None,
    };

    Some(Control::Input(InputControl {
        path: path.to_string(),
        key: field.key.clone(),
        label,
        input_type,
        required: field.required,
        value: state.value(&field.key).cloned().unwrap_or(Value::Null),
        placeholder,
        max_length: field.max_length.filter(|_| field.kind == FieldKind::Text),
        min: field.min.filter(|_| field.kind == FieldKind::Number),
        max: field.max.filter(|_| field.kind == FieldKind::Number),
        step: field.step.filter(|_| field.kind == FieldKind::Number),
        options: field
            .options
            .clone()
            .filter(|_| field.kind == FieldKind::Select),
        constraints: field.constraints.filter(|_| field.kind == FieldKind::Image),
        direction: ctx.direction,
        error: errors.get(path).map(ControlError::from),
    }))
}

fn render_group(
    field: &FieldSpec,
    state: &FormState,
    errors: &ValidationErrors,
    ctx: &RenderContext<'_>,
    path: &FieldPath,
) -> GroupControl {
    let items = state
        .group(&field.key)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .map(|(position, (id, item))| {
                    let item_path = path.index(position);
                    GroupItem {
                        id,
                        position,
                        path: item_path.to_string(),
                        controls: render_fields(field.item_fields(), item, errors, ctx, &item_path),
                        error: errors.get(&item_path).map(ControlError::from),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    GroupControl {
        path: path.to_string(),
        key: field.key.clone(),
        label: field.display_label(ctx.locale).to_string(),
        required: field.required,
        items,
        direction: ctx.direction,
        error: errors.get(path).map(ControlError::from),
    }
}
