use datasample::options::{Condition, Options, OrderItem, SelectItem};
use datasample::schema::Schema;
use datasample::{check_options, Error};
use serde_json::json;

fn etalon_schema() -> Schema {
    Schema::assemble(&json!({
        "tables": {
            "main": "select document_id, note, amount_total from datamart_allocation where year = :YEAR",
        },
        "fields": {
            "document_id": {
                "mandatory": true,
                "ctype": "Integer",
                "key": true,
                "filtered": ["=", "in"],
                "ordered": true,
                "alias": "document",
            },
            "amount": {
                "ctype": "Decimal",
                "calc": ["sum", "min", "max"],
                "filtered": ["=", "!=", "<", "<=", ">", ">=", "between"],
                "ordered": true,
                "having": ["=", "!=", "<", "<=", ">", ">="],
                "expression": "amount_total",
            },
            "note": {"hidden": true, "filtered": ["like"]},
        },
        "params": {
            "YEAR": {"ctype": "Integer"},
        },
    }))
    .unwrap()
}

fn etalon_options() -> Options {
    serde_json::from_value(json!({
        "fields": [["document_id", null], ["amount", "sum"]],
        "filters": [["amount", ">", [100]]],
        "group": ["document_id"],
        "having": [["amount", ">=", [1000]]],
        "order": [["amount", "desc"]],
    }))
    .unwrap()
}

fn bag_of(result: Result<(), Error>) -> datasample::ErrorBag {
    result.unwrap_err().errors().clone()
}

#[test]
fn test_full_request_is_accepted() {
    assert!(check_options(&etalon_options(), &etalon_schema()).is_ok());
}

#[test]
fn test_select_item_shapes_deserialize() {
    let options: Options = serde_json::from_value(json!({
        "fields": ["document_id", ["amount", "sum"], ["amount", null]],
    }))
    .unwrap();

    assert_eq!(options.fields[0], SelectItem::Name("document_id".into()));
    assert_eq!(options.fields[0].aggregate(), None);
    assert_eq!(options.fields[1].name(), "amount");
    assert!(options.fields[1].aggregate().is_some());
    assert_eq!(options.fields[2].aggregate(), None);
}

#[test]
fn test_missing_fields_key_is_an_options_error() {
    let error = Options::from_value(&json!({"group": ["document_id"]})).unwrap_err();
    assert_eq!(
        error.errors().messages("options"),
        Some(&["'fields' is not defined in options".to_string()][..])
    );
}

#[test]
fn test_unknown_and_hidden_fields_are_rejected() {
    let mut options = etalon_options();
    options.fields.push(SelectItem::Name("ghost".into()));
    options.fields.push(SelectItem::Name("note".into())); // hidden

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[fields]"),
        Some(
            &[
                "unknown field: ghost".to_string(),
                "unknown field: note".to_string(),
            ][..]
        )
    );
}

#[test]
fn test_absent_mandatory_field_is_listed() {
    let options: Options = serde_json::from_value(json!({
        "fields": [["amount", "sum"]],
    }))
    .unwrap();

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[fields]"),
        Some(&["mandatory field is absent: document_id".to_string()][..])
    );
}

#[test]
fn test_disallowed_filter_operator() {
    let mut options = etalon_options();
    options
        .filters
        .get_or_insert_with(Vec::new)
        .push(Condition("document_id".into(), "<".into(), vec![json!(5)]));

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[filters][document_id]"),
        Some(&["operator not allowed: '<'".to_string()][..])
    );
}

#[test]
fn test_empty_filtered_list_leaves_operators_unrestricted() {
    let schema = Schema::assemble(&json!({
        "tables": {"main": "select * from t"},
        "fields": {
            "document_id": {"ctype": "Integer", "key": true},
            "title": {"ctype": "String", "filtered": []},
        },
        "params": {"YEAR": {"ctype": "Integer"}},
    }))
    .unwrap();

    let options: Options = serde_json::from_value(json!({
        "fields": ["title"],
        "filters": [["title", "=", ["x"]]],
    }))
    .unwrap();
    assert!(check_options(&options, &schema).is_ok());
}

#[test]
fn test_empty_select_list_is_rejected() {
    let options: Options = serde_json::from_value(json!({"fields": []})).unwrap();

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert!(errors
        .messages("options[fields]")
        .unwrap()
        .contains(&"select list is empty".to_string()));
}

#[test]
fn test_collection_operator_requires_a_non_empty_collection() {
    let mut options = etalon_options();
    options.filters = Some(vec![Condition("document_id".into(), "in".into(), vec![])]);

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[filters][document_id]"),
        Some(
            &["operator 'in' takes a non-empty collection of scalar operands".to_string()][..]
        )
    );
}

#[test]
fn test_unknown_filter_field() {
    let mut options = etalon_options();
    options
        .filters
        .get_or_insert_with(Vec::new)
        .push(Condition("ghost".into(), "=".into(), vec![json!(1)]));

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[filters]"),
        Some(&["unknown field in filter: ghost".to_string()][..])
    );
}

#[test]
fn test_operand_arity_mismatches() {
    let schema = etalon_schema();
    let arity_case = |op: &str, args: Vec<serde_json::Value>| {
        let mut options = etalon_options();
        options.filters = Some(vec![Condition("amount".into(), op.into(), args)]);
        bag_of(check_options(&options, &schema))
    };

    // between wants exactly two scalars
    let errors = arity_case("between", vec![json!(1)]);
    assert_eq!(
        errors.messages("options[filters][amount]"),
        Some(&["operator 'between' takes exactly two scalar operands".to_string()][..])
    );

    // = wants exactly one scalar
    let errors = arity_case("=", vec![json!(1), json!(2)]);
    assert!(errors.contains("options[filters][amount]"));

    let errors = arity_case("=", vec![json!([1, 2])]);
    assert!(errors.contains("options[filters][amount]"));
}

#[test]
fn test_nullary_operator_takes_no_operands() {
    let schema = Schema::assemble(&json!({
        "tables": {"main": "select * from t"},
        "fields": {"flag": {"ctype": "Boolean", "filtered": ["is null", "is not null"]}},
        "params": {"YEAR": {"ctype": "Integer"}},
    }))
    .unwrap();

    let mut options: Options = serde_json::from_value(json!({
        "fields": ["flag"],
        "filters": [["flag", "is null", []]],
    }))
    .unwrap();
    assert!(check_options(&options, &schema).is_ok());

    options.filters = Some(vec![Condition(
        "flag".into(),
        "is null".into(),
        vec![json!(true)],
    )]);
    let errors = bag_of(check_options(&options, &schema));
    assert_eq!(
        errors.messages("options[filters][flag]"),
        Some(&["operator 'is null' takes no operands".to_string()][..])
    );
}

#[test]
fn test_group_requires_key_fields() {
    let mut options = etalon_options();
    options.group = Some(vec!["amount".into()]);

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[group]"),
        Some(&["field is unknown or not a group key: amount".to_string()][..])
    );
}

#[test]
fn test_having_requires_eligible_field_and_operator() {
    let mut options = etalon_options();
    options.having = Some(vec![
        Condition("document_id".into(), "=".into(), vec![json!(1)]),
        Condition("amount".into(), "in".into(), vec![json!(1)]),
    ]);

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert_eq!(
        errors.messages("options[having]"),
        Some(&["field is unknown or not eligible for having: document_id".to_string()][..])
    );
    assert_eq!(
        errors.messages("options[having][amount]"),
        Some(&["operator not allowed: 'in'".to_string()][..])
    );
}

#[test]
fn test_order_requires_ordered_field_and_direction() {
    let mut options = etalon_options();
    options.order = Some(vec![
        OrderItem("note".into(), "asc".into()),
        OrderItem("amount".into(), "upward".into()),
    ]);

    let errors = bag_of(check_options(&options, &etalon_schema()));
    let messages = errors.messages("options[order]").unwrap();
    assert!(messages.contains(&"field is unknown or not sortable: note".to_string()));
    assert!(messages.contains(&"unknown sort direction 'upward' for field amount".to_string()));
}

#[test]
fn test_violations_are_aggregated_not_short_circuited() {
    let options: Options = serde_json::from_value(json!({
        "fields": [["ghost", null]],
        "filters": [["amount", "between", [100]]],
        "group": ["amount"],
        "order": [["amount", "sideways"]],
    }))
    .unwrap();

    let errors = bag_of(check_options(&options, &etalon_schema()));
    assert!(errors.contains("options[fields]"));
    assert!(errors.contains("options[filters][amount]"));
    assert!(errors.contains("options[group]"));
    assert!(errors.contains("options[order]"));
    // absent mandatory field reported alongside the unknown one
    assert!(errors
        .messages("options[fields]")
        .unwrap()
        .contains(&"mandatory field is absent: document_id".to_string()));
}
