//! Field specification - the data contract describing the form of a template.
//!
//! A specification arrives from the inspection service as a list of typed field
//! descriptors. Array fields carry an `itemShape`, the (ordered) shape of one
//! repeated element, which may itself contain array fields.

pub mod model;

pub use model::{
    DefaultValue, FieldFormat, FieldKind, FieldSpec, ImageConstraints, ItemShape, Label,
    TemplateSpec, TemplateSummary,
};
