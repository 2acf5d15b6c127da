use datasample::schema::Schema;
use datasample::{check_params, Error};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

fn etalon_schema() -> Schema {
    Schema::assemble(&json!({
        "tables": {
            "main": "select document_id, amount_total from datamart_allocation where year = :YEAR",
        },
        "fields": {
            "document_id": {"ctype": "Integer", "key": true},
        },
        "params": {
            "YEAR": {"ctype": "Integer", "label": "Reporting year"},
            "ONDATE": {"ctype": "String", "label": "As of date"},
            "HIERARCHY": {"ctype": "Boolean", "label": "With hierarchy"},
            "MIN_AMOUNT": {"ctype": "Decimal", "label": "Minimal total amount"},
        },
    }))
    .unwrap()
}

fn values(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("fixture must be an object")
}

#[test]
fn test_all_positive() {
    let schema = etalon_schema();
    let supplied = values(json!({
        "YEAR": 2018,
        "ONDATE": "20200101",
        "HIERARCHY": true,
        "MIN_AMOUNT": 100.50,
    }));
    assert!(check_params(&supplied, &schema).is_ok());
}

#[test]
fn test_every_mismatch_is_named_in_one_error() {
    let schema = etalon_schema();
    let supplied = values(json!({
        "YEAR": "2018",
        "ONDATE": 20200101,
        "HIERARCHY": "True",
        "MIN_AMOUNT": "100.50",
    }));

    let error = check_params(&supplied, &schema).unwrap_err();
    assert!(matches!(error, Error::Params(_)));

    let keys: HashSet<&str> = error.errors().keys().collect();
    let expected: HashSet<&str> = [
        "params[YEAR]",
        "params[ONDATE]",
        "params[HIERARCHY]",
        "params[MIN_AMOUNT]",
    ]
    .into_iter()
    .collect();
    assert_eq!(keys, expected);

    // Exactly one entry per mismatched parameter.
    for (_, messages) in error.errors().iter() {
        assert_eq!(messages.len(), 1);
    }
}

#[test]
fn test_missing_parameter_is_distinct_from_mismatch() {
    let schema = etalon_schema();
    let supplied = values(json!({
        "YEAR": "2018",
        "ONDATE": "20200101",
        "HIERARCHY": true,
    }));

    let error = check_params(&supplied, &schema).unwrap_err();
    assert_eq!(
        error.errors().messages("params[MIN_AMOUNT]"),
        Some(&["parameter 'MIN_AMOUNT' is not supplied".to_string()][..])
    );
    assert_eq!(
        error.errors().messages("params[YEAR]"),
        Some(&["incorrect type: expected a whole number for ctype Integer".to_string()][..])
    );
}

#[test]
fn test_extra_keys_are_ignored() {
    let schema = etalon_schema();
    let supplied = values(json!({
        "YEAR": 2018,
        "ONDATE": "20200101",
        "HIERARCHY": true,
        "MIN_AMOUNT": 100.50,
        "UNDECLARED": "whatever",
    }));
    assert!(check_params(&supplied, &schema).is_ok());
}

#[test]
fn test_integer_rejects_float_and_bool() {
    let schema = etalon_schema();

    let mut supplied = values(json!({
        "YEAR": 2018.5,
        "ONDATE": "20200101",
        "HIERARCHY": true,
        "MIN_AMOUNT": 100.50,
    }));
    assert!(check_params(&supplied, &schema).is_err());

    supplied.insert("YEAR".into(), json!(true));
    assert!(check_params(&supplied, &schema).is_err());
}

#[test]
fn test_decimal_accepts_whole_numbers() {
    let schema = etalon_schema();
    let supplied = values(json!({
        "YEAR": 2018,
        "ONDATE": "20200101",
        "HIERARCHY": true,
        "MIN_AMOUNT": 100,
    }));
    assert!(check_params(&supplied, &schema).is_ok());
}
