use serde_json::{json, Map, Value};

use super::*;
use crate::schema::ErrorKind;
use crate::spec::{DefaultValue, FieldKind, FieldSpec};

fn path(raw: &str) -> FieldPath {
    raw.parse().unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn dependents_form() -> Form {
    let fields = vec![
        FieldSpec::new("applicant", FieldKind::Text)
            .required()
            .with_label("en", "Applicant")
            .with_label("ar", "مقدم الطلب"),
        FieldSpec::new("dependents", FieldKind::Array)
            .with_label("en", "Dependents")
            .with_item_shape(vec![
                FieldSpec::new("name", FieldKind::Text).required(),
                FieldSpec::new("relation", FieldKind::Select)
                    .with_options(["Spouse", "Child", "Other"]),
            ]),
    ];
    Form::bind(fields, None).unwrap()
}

#[test]
fn test_new_state_is_blank() {
    let form = dependents_form();
    assert_eq!(
        Value::Object(form.values()),
        json!({ "applicant": "", "dependents": [] })
    );
}

#[test]
fn test_defaults_seed_state_and_ignore_unknown_keys() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("age", FieldKind::Number),
        FieldSpec::new("gender", FieldKind::Select)
            .with_options(["Male", "Female"])
            .with_default(DefaultValue::Text("Female".to_string())),
        FieldSpec::new("rows", FieldKind::Array)
            .with_item_shape(vec![FieldSpec::new("qty", FieldKind::Number)]),
    ];
    let defaults = object(json!({
        "name": "Ann",
        "age": 30,
        "unknown": "x",
        "rows": [{ "qty": 2 }, { "qty": 5 }]
    }));

    let form = Form::bind(fields, Some(&defaults)).unwrap();
    assert_eq!(
        Value::Object(form.values()),
        json!({
            "name": "Ann",
            "age": 30,
            "gender": "Female",
            "rows": [{ "qty": 2 }, { "qty": 5 }]
        })
    );
}

#[test]
fn test_append_initialises_children_blank() {
    let mut form = dependents_form();
    let id = form.append_item(&path("dependents")).unwrap();

    let group = form.state().group("dependents").unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(group.id_at(0), Some(id));
    assert_eq!(form.state().get(&path("dependents.0.name")), Some(&json!("")));
    assert_eq!(form.state().get(&path("dependents.0.relation")), Some(&json!("")));
}

#[test]
fn test_remove_keeps_identity_of_survivors() {
    let mut form = dependents_form();
    form.set_value(&path("applicant"), json!("Ann")).unwrap();

    let first = form.append_item(&path("dependents")).unwrap();
    form.set_value(&path("dependents.0.name"), json!("")).unwrap();
    form.set_value(&path("dependents.0.relation"), json!("Spouse")).unwrap();

    let errors = form.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.kind_at("dependents.0.name"), Some(ErrorKind::RequiredField));

    let second = form.append_item(&path("dependents")).unwrap();
    assert_ne!(first, second);
    form.set_value(&path("dependents.1.name"), json!("Bo")).unwrap();
    form.set_value(&path("dependents.1.relation"), json!("Child")).unwrap();

    let removed = form.remove_item(&path("dependents"), 0).unwrap();
    assert_eq!(removed, first);

    let group = form.state().group("dependents").unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(group.id_at(0), Some(second));
    assert_eq!(group.position_of(second), Some(0));
    assert!(group.get(first).is_none());
    assert_eq!(form.state().get(&path("dependents.0.name")), Some(&json!("Bo")));

    let value = form.validate().unwrap();
    let items = value.get("dependents").and_then(|v| v.as_list()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("name").and_then(|v| v.as_text()), Some("Bo"));
    assert_eq!(items[0].get("relation").and_then(|v| v.as_text()), Some("Child"));
}

#[test]
fn test_ids_are_never_reused() {
    let mut form = dependents_form();
    let a = form.append_item(&path("dependents")).unwrap();
    form.remove_item(&path("dependents"), 0).unwrap();
    let b = form.append_item(&path("dependents")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_mutation_errors() {
    let mut form = dependents_form();

    assert!(matches!(
        form.set_value(&path("missing"), json!("x")),
        Err(FormError::UnknownField(_))
    ));
    assert!(matches!(
        form.set_value(&path("dependents"), json!("x")),
        Err(FormError::NotAValue(_))
    ));
    assert!(matches!(
        form.append_item(&path("applicant")),
        Err(FormError::NotAGroup(_))
    ));
    assert_eq!(
        form.remove_item(&path("dependents"), 3),
        Err(FormError::ItemOutOfRange {
            path: "dependents".to_string(),
            position: 3
        })
    );
    assert!(matches!(
        form.set_value(&path("dependents.0.name"), json!("x")),
        Err(FormError::ItemOutOfRange { .. })
    ));
    assert!(matches!(
        form.set_value(&path("applicant"), json!(["a"])),
        Err(FormError::InvalidValue(_))
    ));
}

#[test]
fn test_set_value_gives_immediate_feedback_for_that_field_only() {
    let fields = vec![
        FieldSpec::new("name", FieldKind::Text).required(),
        FieldSpec::new("age", FieldKind::Number).with_range(Some(0.0), Some(120.0)),
    ];
    let mut form = Form::bind(fields, None).unwrap();

    let error = form.set_value(&path("age"), json!(200)).unwrap().cloned();
    assert_eq!(error.map(|e| e.kind), Some(ErrorKind::AboveMaximum));
    // The untouched required field is not flagged yet.
    assert!(form.error(&path("name")).is_none());

    assert!(form.set_value(&path("age"), json!(42)).unwrap().is_none());
    assert!(form.errors().is_empty());
}

#[test]
fn test_render_one_control_per_field() {
    let mut form = dependents_form();
    form.append_item(&path("dependents")).unwrap();

    let controls = form.render(&RenderContext::new("en"));
    assert_eq!(controls.len(), 2);

    let Control::Input(applicant) = &controls[0] else {
        panic!("expected an input control");
    };
    assert_eq!(applicant.label, "Applicant");
    assert_eq!(applicant.input_type, "text");
    assert!(applicant.required);
    assert_eq!(applicant.direction, Direction::Ltr);

    let Control::Group(group) = &controls[1] else {
        panic!("expected a group control");
    };
    assert_eq!(group.items.len(), 1);
    let item = &group.items[0];
    assert_eq!(item.path, "dependents.0");
    assert_eq!(item.controls.len(), 2);
    assert_eq!(item.controls[0].path(), "dependents.0.name");
    // No label for this locale: the key is shown.
    let Control::Input(relation) = &item.controls[1] else {
        panic!("expected an input control");
    };
    assert_eq!(relation.label, "relation");
    assert_eq!(relation.input_type, "select");
    assert_eq!(relation.options.as_ref().map(Vec::len), Some(3));
}

#[test]
fn test_render_uses_locale_and_direction() {
    let form = dependents_form();
    let controls = form.render(&RenderContext::new("ar"));

    let Control::Input(applicant) = &controls[0] else {
        panic!("expected an input control");
    };
    assert_eq!(applicant.label, "مقدم الطلب");
    assert_eq!(applicant.direction, Direction::Rtl);
    assert_eq!(Direction::for_locale("ar-EG"), Direction::Rtl);
    assert_eq!(Direction::for_locale("en_US"), Direction::Ltr);
}

#[test]
fn test_render_errors_do_not_leak_between_fields() {
    let fields = vec![
        FieldSpec::new("title", FieldKind::Text),
        FieldSpec::new("count", FieldKind::Number).with_range(Some(1.0), None),
    ];
    let mut form = Form::bind(fields, None).unwrap();
    form.set_value(&path("count"), json!(0)).unwrap();
    assert!(form.validate().is_err());

    let controls = form.render(&RenderContext::new("en"));
    assert!(controls[0].error().is_none());
    assert_eq!(controls[1].error().map(|e| e.kind), Some(ErrorKind::BelowMinimum));
}

#[test]
fn test_render_nested_groups_and_item_errors() {
    let fields = vec![FieldSpec::new("households", FieldKind::Array).with_item_shape(vec![
        FieldSpec::new("members", FieldKind::Array)
            .with_item_shape(vec![FieldSpec::new("name", FieldKind::Text).required()]),
    ])];
    let mut form = Form::bind(fields, None).unwrap();
    form.append_item(&path("households")).unwrap();
    form.append_item(&path("households.0.members")).unwrap();
    form.append_item(&path("households.0.members")).unwrap();
    form.set_value(&path("households.0.members.0.name"), json!("Ann")).unwrap();

    let errors = form.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.kind_at("households.0.members.1.name"),
        Some(ErrorKind::RequiredField)
    );

    let controls = form.render(&RenderContext::new("en"));
    let Control::Group(households) = &controls[0] else {
        panic!("expected a group control");
    };
    let Control::Group(members) = &households.items[0].controls[0] else {
        panic!("expected a nested group control");
    };
    assert_eq!(members.path, "households.0.members");
    assert_eq!(members.items.len(), 2);
    assert!(members.items[0].controls[0].error().is_none());
    assert_eq!(
        members.items[1].controls[0].error().map(|e| e.kind),
        Some(ErrorKind::RequiredField)
    );
}

#[test]
fn test_unknown_kind_renders_nothing() {
    let fields: Vec<FieldSpec> = serde_json::from_value(json!([
        { "key": "name", "type": "text" },
        { "key": "signature", "type": "signature" }
    ]))
    .unwrap();
    let form = Form::bind(fields, None).unwrap();

    let controls = form.render(&RenderContext::new("en"));
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].path(), "name");
}

#[test]
fn test_image_and_email_hints() {
    let fields: Vec<FieldSpec> = serde_json::from_value(json!([
        { "key": "contact", "type": "text", "format": "email" },
        { "key": "photo", "type": "image", "constraints": { "width": 200, "height": 300 } }
    ]))
    .unwrap();
    let form = Form::bind(fields, None).unwrap();
    let controls = form.render(&RenderContext::new("en"));

    let Control::Input(contact) = &controls[0] else {
        panic!("expected an input control");
    };
    assert_eq!(contact.input_type, "email");

    let Control::Input(photo) = &controls[1] else {
        panic!("expected an input control");
    };
    assert_eq!(photo.input_type, "url");
    assert_eq!(photo.placeholder.as_deref(), Some("https://example.com/image.png"));
    assert_eq!(photo.constraints.and_then(|c| c.width), Some(200));
}

#[test]
fn test_control_tree_serialization() {
    let mut form = dependents_form();
    form.append_item(&path("dependents")).unwrap();

    let json = serde_json::to_value(form.render(&RenderContext::new("en"))).unwrap();
    assert_eq!(json[0]["control"], "input");
    assert_eq!(json[0]["inputType"], "text");
    assert_eq!(json[1]["control"], "group");
    assert_eq!(json[1]["items"][0]["id"], 0);
    assert_eq!(json[1]["items"][0]["controls"][0]["path"], "dependents.0.name");
}

#[test]
fn test_dotted_and_numeric_keys_are_addressable_by_rendered_path() {
    let fields = vec![
        FieldSpec::new("user.name", FieldKind::Text).required(),
        FieldSpec::new("2", FieldKind::Text).required(),
    ];
    let mut form = Form::bind(fields, None).unwrap();

    let errors = form.validate().unwrap_err();
    assert_eq!(errors.kind_at(r"user\.name"), Some(ErrorKind::RequiredField));
    assert_eq!(errors.kind_at(r"\2"), Some(ErrorKind::RequiredField));

    let controls = form.render(&RenderContext::new("en"));
    let paths: Vec<String> = controls.iter().map(|c| c.path().to_string()).collect();
    assert_eq!(paths, vec![r"user\.name", r"\2"]);

    for raw in &paths {
        form.set_value(&path(raw), json!("Ann")).unwrap();
    }
    let value = form.validate().unwrap();
    assert_eq!(value.to_json(), json!({ "user.name": "Ann", "2": "Ann" }));
}
