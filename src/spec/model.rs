use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Field type tag. Unrecognised tags deserialize to `Unknown` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select,
    Image,
    Array,
    #[serde(other)]
    Unknown,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Select => "select",
            FieldKind::Image => "image",
            FieldKind::Array => "array",
            FieldKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display strings keyed by locale code (`en`, `ar`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub BTreeMap<String, String>);

impl Label {
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }
}

/// Pre-filled value of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Number(f64),
    Text(String),
}

impl DefaultValue {
    pub fn to_json(&self) -> Value {
        match self {
            DefaultValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DefaultValue::Text(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImageConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Shape of one element of an array field, in document order.
///
/// On the wire this is an object from child key to child specification; the
/// map key always wins over any `key` written inside the child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemShape(pub Vec<FieldSpec>);

impl ItemShape {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.0
    }
}

impl Serialize for ItemShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in &self.0 {
            map.serialize_entry(&field.key, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ItemShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShapeVisitor;

        impl<'de> Visitor<'de> for ShapeVisitor {
            type Value = ItemShape;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from child key to field specification")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ItemShape, A::Error> {
                let mut fields = Vec::new();
                while let Some((key, mut field)) = access.next_entry::<String, FieldSpec>()? {
                    field.key = key;
                    fields.push(field);
                }
                Ok(ItemShape(fields))
            }
        }

        deserializer.deserialize_map(ShapeVisitor)
    }
}

/// One form field descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(default)]
    #[schema(example = "full_name")]
    pub key: String,
    #[serde(rename = "type", alias = "kind")]
    #[schema(value_type = String, example = "text")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub label: Option<Label>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ImageConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub item_shape: Option<ItemShape>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            label: None,
            required: false,
            max_length: None,
            min: None,
            max: None,
            step: None,
            options: None,
            default: None,
            format: None,
            constraints: None,
            item_shape: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, locale: &str, text: &str) -> Self {
        self.label
            .get_or_insert_with(Label::default)
            .0
            .insert(locale.to_string(), text.to_string());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_item_shape(mut self, fields: Vec<FieldSpec>) -> Self {
        self.item_shape = Some(ItemShape(fields));
        self
    }

    /// Label for the active locale; falls back to the key when the locale has no
    /// (or an empty) entry.
    pub fn display_label(&self, locale: &str) -> &str {
        self.label
            .as_ref()
            .and_then(|label| label.get(locale))
            .filter(|text| !text.is_empty())
            .unwrap_or(&self.key)
    }

    /// Non-empty option list, if the field constrains its values to one.
    pub fn choices(&self) -> Option<&[String]> {
        self.options
            .as_deref()
            .filter(|options| !options.is_empty())
    }

    /// Child fields of one array instance. Empty for a non-array field or for an
    /// array without an `itemShape`.
    pub fn item_fields(&self) -> &[FieldSpec] {
        self.item_shape
            .as_ref()
            .map(ItemShape::fields)
            .unwrap_or(&[])
    }
}

/// Specification of one inspected template, as stored for the render screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[schema(example = "tpl_8f2c")]
    pub template_id: String,
    #[schema(example = 1)]
    pub version: i64,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Entry of the template listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    pub version: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}
