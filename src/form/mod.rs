//! Form binding: a specification, its compiled schema and the live state, plus
//! the field errors of the last validation pass.

pub mod render;
pub mod state;

#[cfg(test)]
mod tests;

pub use render::{Control, ControlError, Direction, GroupControl, GroupItem, InputControl, RenderContext};
pub use state::{ArrayGroup, FormError, FormState, ItemId};

use serde_json::{Map, Value};

use crate::path::FieldPath;
use crate::schema::{compile, SchemaError, StructuredValue, ValidationError, ValidationErrors, ValidationSchema};
use crate::spec::FieldSpec;

#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<FieldSpec>,
    schema: ValidationSchema,
    state: FormState,
    errors: ValidationErrors,
}

impl Form {
    /// Compiles the specification and binds a fresh state to it. A broken
    /// specification yields no form at all.
    pub fn bind(fields: Vec<FieldSpec>, defaults: Option<&Map<String, Value>>) -> Result<Self, SchemaError> {
        let schema = compile(&fields)?;
        let state = match defaults {
            Some(defaults) => FormState::with_defaults(&fields, defaults),
            None => FormState::new(&fields),
        };
        Ok(Self {
            fields,
            schema,
            state,
            errors: ValidationErrors::new(),
        })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, path: &FieldPath) -> Option<&ValidationError> {
        self.errors.get(path)
    }

    pub fn values(&self) -> Map<String, Value> {
        self.state.snapshot()
    }

    /// Edits one field and refreshes that field's error only.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<Option<&ValidationError>, FormError> {
        self.state.set(&self.fields, path, value)?;
        self.errors.remove(path);
        if let Some(error) = self.schema.validate_field(&self.state.snapshot(), path) {
            self.errors.add(error);
        }
        Ok(self.errors.get(path))
    }

    pub fn append_item(&mut self, path: &FieldPath) -> Result<ItemId, FormError> {
        let id = self.state.append_item(&self.fields, path)?;
        // Positional error paths under the group are stale now.
        self.errors.remove_under(path);
        Ok(id)
    }

    pub fn remove_item(&mut self, path: &FieldPath, position: usize) -> Result<ItemId, FormError> {
        let id = self.state.remove_item(&self.fields, path, position)?;
        self.errors.remove_under(path);
        Ok(id)
    }

    /// Full validation pass over the current state; the outcome replaces the
    /// stored field errors.
    pub fn validate(&mut self) -> Result<StructuredValue, ValidationErrors> {
        match self.schema.validate(&self.state.snapshot()) {
            Ok(value) => {
                self.errors = ValidationErrors::new();
                Ok(value)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Vec<Control> {
        render::render(&self.fields, &self.state, &self.errors, ctx)
    }
}
