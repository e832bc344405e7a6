//! Specification → validation schema compiler.
//!
//! `compile` is a pure function of the field list. The resulting schema mirrors
//! the specification tree: one rule per leaf field, one nested schema per array
//! item shape. Validation walks both trees with an explicit path so errors at any
//! depth are reported as `outer.<position>.inner`.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use url::Url;

use super::validation::{ValidationError, ValidationErrors};
use super::value::StructuredValue;
use super::SchemaError;
use crate::path::FieldPath;
use crate::spec::{FieldKind, FieldSpec};

lazy_static! {
    // Pattern only; `2024-13-40` passes.
    static ref DATE_PATTERN: Regex =
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles");
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Text { max_length: Option<usize> },
    Number { min: Option<f64>, max: Option<f64> },
    Date,
    /// Empty `options` means free text.
    Select { options: Vec<String> },
    Url,
    /// `item` is `None` when the array has no item shape: only empty lists pass.
    Array { item: Option<ValidationSchema> },
    /// Unrecognised field kind.
    Unconstrained,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub key: String,
    pub required: bool,
    pub rule: Rule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSchema {
    fields: Vec<FieldRule>,
}

/// Compiles a field list into its validation schema.
///
/// Fails only when the specification is structurally broken: a missing or
/// duplicated key among siblings, or an `itemShape` on a non-array field.
pub fn compile(fields: &[FieldSpec]) -> Result<ValidationSchema, SchemaError> {
    compile_at(fields, &FieldPath::root())
}

fn compile_at(fields: &[FieldSpec], path: &FieldPath) -> Result<ValidationSchema, SchemaError> {
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(fields.len());

    for field in fields {
        if field.key.is_empty() {
            return Err(SchemaError::invalid(path, "field without a key"));
        }
        let field_path = path.key(&field.key);
        if !seen.insert(field.key.as_str()) {
            return Err(SchemaError::invalid(&field_path, "duplicate field key"));
        }
        if field.kind != FieldKind::Array && field.item_shape.is_some() {
            return Err(SchemaError::invalid(
                &field_path,
                format!("itemShape given for a '{}' field", field.kind),
            ));
        }

        let rule = match field.kind {
            FieldKind::Text => Rule::Text {
                max_length: field.max_length,
            },
            FieldKind::Number => Rule::Number {
                min: field.min,
                max: field.max,
            },
            FieldKind::Date => Rule::Date,
            FieldKind::Select => Rule::Select {
                options: field.choices().map(<[String]>::to_vec).unwrap_or_default(),
            },
            FieldKind::Image => Rule::Url,
            FieldKind::Array => match &field.item_shape {
                Some(shape) => Rule::Array {
                    item: Some(compile_at(shape.fields(), &field_path)?),
                },
                None => {
                    log::warn!(
                        "Array field '{}' has no itemShape; only an empty list will validate",
                        field_path
                    );
                    Rule::Array { item: None }
                }
            },
            FieldKind::Unknown => {
                log::warn!(
                    "Field '{}' has an unrecognised type; accepting any text",
                    field_path
                );
                Rule::Unconstrained
            }
        };

        rules.push(FieldRule {
            key: field.key.clone(),
            required: field.required,
            rule,
        });
    }

    Ok(ValidationSchema { fields: rules })
}

impl ValidationSchema {
    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Validates a complete value map in one pass, collecting every field error.
    pub fn validate(&self, values: &Map<String, Value>) -> Result<StructuredValue, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let value = self.validate_at(values, &FieldPath::root(), &mut errors);
        errors.into_result().map(|_| value)
    }

    /// Validates a single field at `path`, for immediate feedback while editing.
    pub fn validate_field(
        &self,
        values: &Map<String, Value>,
        path: &FieldPath,
    ) -> Option<ValidationError> {
        let mut errors = ValidationErrors::new();
        self.validate_at(values, &FieldPath::root(), &mut errors);
        errors.get(path).cloned()
    }

    fn validate_at(
        &self,
        values: &Map<String, Value>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) -> StructuredValue {
        let mut record = BTreeMap::new();
        for field in &self.fields {
            let field_path = path.key(&field.key);
            let raw = values.get(&field.key).filter(|value| !value.is_null());
            let value = field.check(raw, &field_path, errors);
            record.insert(field.key.clone(), value);
        }
        StructuredValue::Record(record)
    }
}

impl FieldRule {
    /// Numbers read trimmed text, so whitespace alone counts as no number.
    fn is_blank(&self, raw: Option<&Value>) -> bool {
        match raw {
            None => true,
            Some(Value::String(text)) if matches!(self.rule, Rule::Number { .. }) => {
                text.trim().is_empty()
            }
            Some(Value::String(text)) => text.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    fn empty_value(&self) -> StructuredValue {
        match self.rule {
            Rule::Number { .. } => StructuredValue::Null,
            Rule::Array { .. } => StructuredValue::List(Vec::new()),
            _ => StructuredValue::Text(String::new()),
        }
    }

    fn check(
        &self,
        raw: Option<&Value>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) -> StructuredValue {
        if self.is_blank(raw) && !self.required {
            return self.empty_value();
        }
        let Some(raw) = raw else {
            errors.add(ValidationError::required(path.clone()));
            return StructuredValue::Null;
        };

        if let Rule::Array { item } = &self.rule {
            return check_items(item.as_ref(), raw, path, errors);
        }

        match self.check_scalar(raw, path) {
            Ok(value) => value,
            Err(error) => {
                errors.add(error);
                StructuredValue::Null
            }
        }
    }

    fn check_scalar(&self, raw: &Value, path: &FieldPath) -> Result<StructuredValue, ValidationError> {
        match &self.rule {
            Rule::Text { max_length } => {
                let text = expect_text(raw, path)?;
                if text.is_empty() {
                    return Err(ValidationError::required(path.clone()));
                }
                if let Some(max_length) = *max_length {
                    // Length in UTF-16 code units, as browsers count `maxlength`.
                    if text.encode_utf16().count() > max_length {
                        return Err(ValidationError::too_long(path.clone(), max_length));
                    }
                }
                Ok(StructuredValue::Text(text.to_string()))
            }
            Rule::Number { min, max } => {
                let number = match raw {
                    Value::Number(number) => number.as_f64(),
                    Value::String(text) if text.trim().is_empty() => {
                        return Err(ValidationError::required(path.clone()));
                    }
                    Value::String(text) => text.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|number| number.is_finite())
                .ok_or_else(|| ValidationError::type_mismatch(path.clone(), "a number"))?;

                if let Some(min) = *min {
                    if number < min {
                        return Err(ValidationError::below_minimum(path.clone(), min));
                    }
                }
                if let Some(max) = *max {
                    if number > max {
                        return Err(ValidationError::above_maximum(path.clone(), max));
                    }
                }
                Ok(StructuredValue::number(number))
            }
            Rule::Date => {
                let text = expect_text(raw, path)?;
                if !DATE_PATTERN.is_match(text) {
                    return Err(ValidationError::invalid_date(path.clone()));
                }
                Ok(StructuredValue::Text(text.to_string()))
            }
            Rule::Select { options } => {
                let text = expect_text(raw, path)?;
                if !options.is_empty() && !options.iter().any(|option| option == text) {
                    return Err(ValidationError::invalid_option(path.clone(), options));
                }
                Ok(StructuredValue::Text(text.to_string()))
            }
            Rule::Url => {
                let text = expect_text(raw, path)?;
                if Url::parse(text).is_err() {
                    return Err(ValidationError::invalid_url(path.clone()));
                }
                Ok(StructuredValue::Text(text.to_string()))
            }
            Rule::Unconstrained => match raw {
                Value::String(text) => Ok(StructuredValue::Text(text.clone())),
                Value::Number(number) => Ok(StructuredValue::Number(number.clone())),
                _ => Err(ValidationError::type_mismatch(path.clone(), "text")),
            },
            Rule::Array { .. } => Err(ValidationError::type_mismatch(path.clone(), "a list")),
        }
    }
}

fn expect_text<'a>(raw: &'a Value, path: &FieldPath) -> Result<&'a str, ValidationError> {
    raw.as_str()
        .ok_or_else(|| ValidationError::type_mismatch(path.clone(), "text"))
}

fn check_items(
    item: Option<&ValidationSchema>,
    raw: &Value,
    path: &FieldPath,
    errors: &mut ValidationErrors,
) -> StructuredValue {
    let Value::Array(entries) = raw else {
        errors.add(ValidationError::type_mismatch(path.clone(), "a list"));
        return StructuredValue::Null;
    };
    // Only a required array reaches here empty.
    if entries.is_empty() {
        errors.add(ValidationError::required(path.clone()));
        return StructuredValue::Null;
    }

    let mut items = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let item_path = path.index(position);
        match (item, entry) {
            (None, _) => errors.add(ValidationError::unexpected_item(item_path)),
            (Some(schema), Value::Object(values)) => {
                items.push(schema.validate_at(values, &item_path, errors));
            }
            (Some(_), _) => errors.add(ValidationError::type_mismatch(item_path, "an entry")),
        }
    }
    StructuredValue::List(items)
}
