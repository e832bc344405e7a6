use serde_json::{json, Map, Value};

use super::*;
use crate::spec::{FieldKind, FieldSpec};

fn values(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn single(field: FieldSpec) -> ValidationSchema {
    compile(&[field]).expect("specification compiles")
}

fn accepts(schema: &ValidationSchema, input: Value) -> bool {
    schema.validate(&values(input)).is_ok()
}

fn kind_of(schema: &ValidationSchema, input: Value, path: &str) -> Option<ErrorKind> {
    schema
        .validate(&values(input))
        .err()
        .and_then(|errors| errors.kind_at(path))
}

fn dependents_field() -> FieldSpec {
    FieldSpec::new("dependents", FieldKind::Array).with_item_shape(vec![
        FieldSpec::new("name", FieldKind::Text).required(),
        FieldSpec::new("relation", FieldKind::Select).with_options(["Spouse", "Child", "Other"]),
    ])
}

#[test]
fn test_compile_is_deterministic() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text).required().with_max_length(10),
        FieldSpec::new("age", FieldKind::Number).with_range(Some(0.0), Some(120.0)),
        dependents_field(),
    ];

    let first = compile(&fields).unwrap();
    let second = compile(&fields).unwrap();
    assert_eq!(first, second);

    let samples = [
        json!({ "name": "Ann", "age": 30 }),
        json!({ "name": "", "age": 200 }),
        json!({ "name": "Ann", "dependents": [{ "name": "", "relation": "Spouse" }] }),
    ];
    for sample in samples {
        assert_eq!(
            first.validate(&values(sample.clone())),
            second.validate(&values(sample))
        );
    }
}

#[test]
fn test_required_text_with_max_length() {
    let schema = single(FieldSpec::new("code", FieldKind::Text).required().with_max_length(5));

    assert_eq!(
        kind_of(&schema, json!({ "code": "" }), "code"),
        Some(ErrorKind::RequiredField)
    );
    assert_eq!(
        kind_of(&schema, json!({}), "code"),
        Some(ErrorKind::RequiredField)
    );
    assert!(accepts(&schema, json!({ "code": "a" })));
    assert!(accepts(&schema, json!({ "code": "abcde" })));
    assert_eq!(
        kind_of(&schema, json!({ "code": "abcdef" }), "code"),
        Some(ErrorKind::TooLong)
    );
}

#[test]
fn test_number_bounds_are_inclusive() {
    let schema = single(FieldSpec::new("score", FieldKind::Number).with_range(Some(0.0), Some(100.0)));

    assert!(accepts(&schema, json!({ "score": 0 })));
    assert!(accepts(&schema, json!({ "score": 100 })));
    assert_eq!(
        kind_of(&schema, json!({ "score": -1 }), "score"),
        Some(ErrorKind::BelowMinimum)
    );
    assert_eq!(
        kind_of(&schema, json!({ "score": 101 }), "score"),
        Some(ErrorKind::AboveMaximum)
    );
}

#[test]
fn test_number_accepts_numeric_text_and_rejects_words() {
    let schema = single(FieldSpec::new("score", FieldKind::Number).required());

    let value = schema.validate(&values(json!({ "score": " 42 " }))).unwrap();
    assert_eq!(value.get("score").and_then(StructuredValue::as_f64), Some(42.0));
    assert_eq!(
        kind_of(&schema, json!({ "score": "forty" }), "score"),
        Some(ErrorKind::TypeMismatch)
    );
    assert_eq!(
        kind_of(&schema, json!({ "score": "" }), "score"),
        Some(ErrorKind::RequiredField)
    );
}

#[test]
fn test_whitespace_number_counts_as_empty() {
    let optional = single(FieldSpec::new("qty", FieldKind::Number));
    let value = optional.validate(&values(json!({ "qty": "  " }))).unwrap();
    assert_eq!(value.to_json(), json!({ "qty": null }));

    let required = single(FieldSpec::new("qty", FieldKind::Number).required());
    assert_eq!(
        kind_of(&required, json!({ "qty": " " }), "qty"),
        Some(ErrorKind::RequiredField)
    );
}

#[test]
fn test_max_length_counts_utf16_units() {
    let schema = single(FieldSpec::new("mark", FieldKind::Text).with_max_length(2));

    assert!(accepts(&schema, json!({ "mark": "é€" })));
    assert!(accepts(&schema, json!({ "mark": "😀" })));
    assert_eq!(
        kind_of(&schema, json!({ "mark": "😀a" }), "mark"),
        Some(ErrorKind::TooLong)
    );
}

#[test]
fn test_date_pattern() {
    let schema = single(FieldSpec::new("born", FieldKind::Date).required());

    assert!(accepts(&schema, json!({ "born": "2024-03-05" })));
    assert_eq!(
        kind_of(&schema, json!({ "born": "03-05-2024" }), "born"),
        Some(ErrorKind::InvalidDate)
    );
    assert_eq!(
        kind_of(&schema, json!({ "born": "2024/03/05" }), "born"),
        Some(ErrorKind::InvalidDate)
    );
    // Pattern only, no calendar check.
    assert!(accepts(&schema, json!({ "born": "2024-13-40" })));
}

#[test]
fn test_select_with_options() {
    let schema = single(
        FieldSpec::new("gender", FieldKind::Select).with_options(["Male", "Female", "Other"]),
    );

    assert!(accepts(&schema, json!({ "gender": "Other" })));
    assert_eq!(
        kind_of(&schema, json!({ "gender": "Unknown" }), "gender"),
        Some(ErrorKind::InvalidOption)
    );
}

#[test]
fn test_select_without_options_is_free_text() {
    let schema = single(FieldSpec::new("city", FieldKind::Select).required());
    assert!(accepts(&schema, json!({ "city": "Anywhere" })));
}

#[test]
fn test_image_requires_absolute_url() {
    let schema = single(FieldSpec::new("logo", FieldKind::Image).required());

    assert!(accepts(&schema, json!({ "logo": "https://example.com/logo.png" })));
    assert_eq!(
        kind_of(&schema, json!({ "logo": "/logo.png" }), "logo"),
        Some(ErrorKind::InvalidUrl)
    );
    assert_eq!(
        kind_of(&schema, json!({ "logo": "not a url" }), "logo"),
        Some(ErrorKind::InvalidUrl)
    );
}

#[test]
fn test_optional_fields_skip_checks_when_empty() {
    let fields = vec![
        FieldSpec::new("note", FieldKind::Text).with_max_length(3),
        FieldSpec::new("born", FieldKind::Date),
        FieldSpec::new("logo", FieldKind::Image),
        FieldSpec::new("qty", FieldKind::Number).with_range(Some(1.0), None),
        FieldSpec::new("gender", FieldKind::Select).with_options(["Male", "Female"]),
        dependents_field(),
    ];
    let schema = compile(&fields).unwrap();

    let value = schema
        .validate(&values(json!({ "note": "", "born": "", "logo": null })))
        .unwrap();
    assert_eq!(value.get("note"), Some(&StructuredValue::Text(String::new())));
    assert_eq!(value.get("qty"), Some(&StructuredValue::Null));
    assert_eq!(value.get("dependents"), Some(&StructuredValue::List(Vec::new())));

    // A present value is still checked.
    assert_eq!(
        kind_of(&schema, json!({ "born": "tomorrow" }), "born"),
        Some(ErrorKind::InvalidDate)
    );
}

#[test]
fn test_array_item_errors_are_scoped_to_the_item_field() {
    let schema = single(dependents_field());

    let errors = schema
        .validate(&values(json!({
            "dependents": [{ "name": "", "relation": "Spouse" }]
        })))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.kind_at("dependents.0.name"), Some(ErrorKind::RequiredField));
    assert_eq!(errors.kind_at("dependents.0.relation"), None);
}

#[test]
fn test_item_required_flags_are_independent_of_the_array() {
    // Optional array, required child: an empty list passes, a blank child fails.
    let schema = single(dependents_field());
    assert!(accepts(&schema, json!({ "dependents": [] })));

    // Required array, optional children: one blank entry passes.
    let schema = single(
        FieldSpec::new("rows", FieldKind::Array)
            .required()
            .with_item_shape(vec![FieldSpec::new("note", FieldKind::Text)]),
    );
    assert_eq!(
        kind_of(&schema, json!({ "rows": [] }), "rows"),
        Some(ErrorKind::RequiredField)
    );
    assert!(accepts(&schema, json!({ "rows": [{ "note": "" }] })));
}

#[test]
fn test_nested_arrays_compile_to_matching_depth() {
    let schema = single(
        FieldSpec::new("households", FieldKind::Array).with_item_shape(vec![
            FieldSpec::new("address", FieldKind::Text).required(),
            FieldSpec::new("members", FieldKind::Array)
                .required()
                .with_item_shape(vec![
                    FieldSpec::new("age", FieldKind::Number).with_range(Some(0.0), Some(120.0)),
                ]),
        ]),
    );

    let errors = schema
        .validate(&values(json!({
            "households": [
                { "address": "Main St", "members": [{ "age": 30 }, { "age": 130 }] },
                { "address": "", "members": [] }
            ]
        })))
        .unwrap_err();

    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors.kind_at("households.0.members.1.age"),
        Some(ErrorKind::AboveMaximum)
    );
    assert_eq!(errors.kind_at("households.1.address"), Some(ErrorKind::RequiredField));
    assert_eq!(errors.kind_at("households.1.members"), Some(ErrorKind::RequiredField));
}

#[test]
fn test_array_without_item_shape_accepts_only_empty_lists() {
    let schema = single(FieldSpec::new("rows", FieldKind::Array));
    assert!(accepts(&schema, json!({ "rows": [] })));
    assert!(accepts(&schema, json!({})));
    assert_eq!(
        kind_of(&schema, json!({ "rows": [{}] }), "rows.0"),
        Some(ErrorKind::UnexpectedItem)
    );

    let schema = single(FieldSpec::new("rows", FieldKind::Array).required());
    assert!(!accepts(&schema, json!({ "rows": [] })));
    assert!(!accepts(&schema, json!({ "rows": [{}] })));
}

#[test]
fn test_item_shape_on_scalar_is_invalid_specification() {
    let mut field = FieldSpec::new("name", FieldKind::Text);
    field.item_shape = dependents_field().item_shape;

    let err = compile(&[field]).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSpecification { ref path, .. } if path == "name"));
}

#[test]
fn test_duplicate_keys_are_invalid_specification() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Number),
    ];
    assert!(compile(&fields).is_err());

    let nested = FieldSpec::new("rows", FieldKind::Array).with_item_shape(vec![
        FieldSpec::new("x", FieldKind::Text),
        FieldSpec::new("x", FieldKind::Text),
    ]);
    let err = compile(&[nested]).unwrap_err();
    assert_eq!(err.to_string(), "invalid specification at 'rows.x': duplicate field key");
}

#[test]
fn test_unknown_kind_is_unconstrained() {
    let field: FieldSpec = serde_json::from_value(json!({ "key": "sig", "type": "signature" })).unwrap();
    let schema = single(field);

    assert!(accepts(&schema, json!({ "sig": "anything" })));
    assert!(accepts(&schema, json!({})));
}

#[test]
fn test_all_errors_reported_in_one_pass() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text).required(),
        FieldSpec::new("age", FieldKind::Number).with_range(Some(0.0), Some(120.0)),
    ];
    let schema = compile(&fields).unwrap();

    let errors = schema
        .validate(&values(json!({ "name": "", "age": 200 })))
        .unwrap_err();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.kind_at("name"), Some(ErrorKind::RequiredField));
    assert_eq!(errors.kind_at("age"), Some(ErrorKind::AboveMaximum));

    let value = schema
        .validate(&values(json!({ "name": "Ann", "age": 30 })))
        .unwrap();
    assert_eq!(value.to_json(), json!({ "name": "Ann", "age": 30 }));
}

#[test]
fn test_structured_value_has_exactly_the_specified_keys() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("age", FieldKind::Number),
        dependents_field(),
    ];
    let schema = compile(&fields).unwrap();

    let value = schema
        .validate(&values(json!({
            "name": "Ann",
            "extra": "dropped",
            "dependents": [{ "name": "Bo", "relation": "Child", "junk": 1 }]
        })))
        .unwrap();

    assert_eq!(value.keys(), vec!["age", "dependents", "name"]);
    let items = value.get("dependents").and_then(StructuredValue::as_list).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].keys(), vec!["name", "relation"]);
}
