//! Field descriptors: one selectable/filterable/orderable/aggregatable
//! column-like quantity of a schema.

use crate::catalog::{Aggregate, CType, Operator};
use crate::element::{
    build_state, state_ctype, valid_ctype, valid_identifier, valid_operations, AttrDefault,
    AttrKind, AttrSpec, AttrState, AttrValue, MSG_HAVING_CALC, MSG_HIDDEN_MANDATORY,
    MSG_KEY_CALC, MSG_MANDATORY_HIDDEN, MSG_NOT_AGGREGATE, MSG_NOT_CTYPE, MSG_NOT_IDENTIFIER,
    MSG_NOT_OPERATION,
};
use crate::error::ErrorBag;
use serde_json::{Map, Value};

fn valid_mandatory(value: &AttrValue, state: &AttrState) -> bool {
    !(value.as_bool() && state.get("hidden").as_bool())
}

fn valid_hidden(value: &AttrValue, state: &AttrState) -> bool {
    !(value.as_bool() && state.get("mandatory").as_bool())
}

// key=true requires calc unset; the conflict is reported on 'key'.
fn valid_key(value: &AttrValue, state: &AttrState) -> bool {
    !value.as_bool() || state.get("calc").is_unset()
}

fn valid_aggregates(value: &AttrValue, _state: &AttrState) -> bool {
    match value {
        AttrValue::Unset => true,
        AttrValue::List(names) => names.iter().all(|name| Aggregate::parse(name).is_some()),
        _ => false,
    }
}

fn valid_having(value: &AttrValue, state: &AttrState) -> bool {
    match value {
        AttrValue::Unset => true,
        AttrValue::List(_) => {
            !state.get("calc").is_unset() && valid_operations(value, state)
        }
        _ => false,
    }
}

/// Attribute template of a field, in declaration order.
const FIELD_TEMPLATE: &[AttrSpec] = &[
    AttrSpec {
        name: "mandatory",
        kind: AttrKind::Bool,
        default: AttrDefault::Bool(false),
        validator: Some(valid_mandatory),
        message: MSG_MANDATORY_HIDDEN,
    },
    AttrSpec {
        name: "ctype",
        kind: AttrKind::Str,
        default: AttrDefault::Str("String"),
        validator: Some(valid_ctype),
        message: MSG_NOT_CTYPE,
    },
    AttrSpec {
        name: "label",
        kind: AttrKind::Str,
        default: AttrDefault::Name,
        validator: None,
        message: "",
    },
    AttrSpec {
        name: "key",
        kind: AttrKind::Bool,
        default: AttrDefault::Bool(false),
        validator: Some(valid_key),
        message: MSG_KEY_CALC,
    },
    AttrSpec {
        name: "calc",
        kind: AttrKind::StrList,
        default: AttrDefault::Unset,
        validator: Some(valid_aggregates),
        message: MSG_NOT_AGGREGATE,
    },
    AttrSpec {
        name: "filtered",
        kind: AttrKind::StrList,
        default: AttrDefault::Unset,
        validator: Some(valid_operations),
        message: MSG_NOT_OPERATION,
    },
    AttrSpec {
        name: "ordered",
        kind: AttrKind::Bool,
        default: AttrDefault::Bool(false),
        validator: None,
        message: "",
    },
    AttrSpec {
        name: "having",
        kind: AttrKind::StrList,
        default: AttrDefault::Unset,
        validator: Some(valid_having),
        message: MSG_HAVING_CALC,
    },
    AttrSpec {
        name: "hidden",
        kind: AttrKind::Bool,
        default: AttrDefault::Bool(false),
        validator: Some(valid_hidden),
        message: MSG_HIDDEN_MANDATORY,
    },
    AttrSpec {
        name: "table",
        kind: AttrKind::Str,
        default: AttrDefault::Str("main"),
        validator: Some(valid_identifier),
        message: MSG_NOT_IDENTIFIER,
    },
    AttrSpec {
        name: "expression",
        kind: AttrKind::Str,
        default: AttrDefault::Name,
        validator: Some(valid_identifier),
        message: MSG_NOT_IDENTIFIER,
    },
    AttrSpec {
        name: "alias",
        kind: AttrKind::Str,
        default: AttrDefault::Name,
        validator: Some(valid_identifier),
        message: MSG_NOT_IDENTIFIER,
    },
];

/// A validated field descriptor. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Must appear in every request's select list.
    pub mandatory: bool,
    pub ctype: CType,
    /// Label for forms and report headers.
    pub label: String,
    /// Eligible as a GROUP BY key. Mutually exclusive with `calc`.
    pub key: bool,
    /// Aggregates this field may be folded with.
    pub calc: Option<Vec<Aggregate>>,
    /// Operators allowed in WHERE; unset or empty means unrestricted.
    pub filtered: Option<Vec<Operator>>,
    /// Eligible for ORDER BY.
    pub ordered: bool,
    /// Operators allowed in HAVING; only meaningful on calc fields.
    pub having: Option<Vec<Operator>>,
    /// Not selectable; exists for filters, sorts and the like.
    pub hidden: bool,
    /// Alias of the owning table in the schema.
    pub table: String,
    /// SQL expression or column name.
    pub expression: String,
    /// SQL output alias.
    pub alias: String,
}

impl Field {
    /// Build and validate a field from its raw attribute dictionary.
    ///
    /// Errors are keyed by attribute name, one entry per failing attribute.
    pub fn new(name: &str, raw: Option<&Map<String, Value>>) -> Result<Field, ErrorBag> {
        let state = build_state(name, raw, FIELD_TEMPLATE)?;
        Ok(Field::from_state(name, &state))
    }

    // Conversions below can not fail: template validators already enforced
    // catalog membership, so parse failures read as defaults.
    fn from_state(name: &str, state: &AttrState) -> Field {
        Field {
            name: name.to_owned(),
            mandatory: state.get("mandatory").as_bool(),
            ctype: state_ctype(state),
            label: state.get("label").as_str().to_owned(),
            key: state.get("key").as_bool(),
            calc: parse_list(state.get("calc"), Aggregate::parse),
            filtered: parse_list(state.get("filtered"), Operator::parse),
            ordered: state.get("ordered").as_bool(),
            having: parse_list(state.get("having"), Operator::parse),
            hidden: state.get("hidden").as_bool(),
            table: state.get("table").as_str().to_owned(),
            expression: state.get("expression").as_str().to_owned(),
            alias: state.get("alias").as_str().to_owned(),
        }
    }

    /// Serialize back to the raw attribute shape, in template order.
    pub fn to_state(&self) -> Value {
        let mut state = Map::new();
        state.insert("mandatory".into(), Value::Bool(self.mandatory));
        state.insert("ctype".into(), Value::String(self.ctype.name().into()));
        state.insert("label".into(), Value::String(self.label.clone()));
        state.insert("key".into(), Value::Bool(self.key));
        state.insert("calc".into(), list_state(self.calc.as_deref(), Aggregate::sql));
        state.insert(
            "filtered".into(),
            list_state(self.filtered.as_deref(), Operator::sql),
        );
        state.insert("ordered".into(), Value::Bool(self.ordered));
        state.insert(
            "having".into(),
            list_state(self.having.as_deref(), Operator::sql),
        );
        state.insert("hidden".into(), Value::Bool(self.hidden));
        state.insert("table".into(), Value::String(self.table.clone()));
        state.insert("expression".into(), Value::String(self.expression.clone()));
        state.insert("alias".into(), Value::String(self.alias.clone()));
        Value::Object(state)
    }

    /// Fully qualified identifier for SQL text.
    pub fn sql_identifier(&self) -> String {
        format!("\"{}\".\"{}\"", self.table, self.expression)
    }

    /// Quoted output alias for SQL text.
    pub fn sql_alias(&self) -> String {
        format!("\"{}\"", self.alias)
    }

    /// Select-list rendering: qualified identifier with output alias.
    pub fn sql_column(&self) -> String {
        format!("{} AS {}", self.sql_identifier(), self.sql_alias())
    }
}

fn parse_list<T>(value: &AttrValue, parse: fn(&str) -> Option<T>) -> Option<Vec<T>> {
    value
        .as_list()
        .map(|names| names.iter().filter_map(|name| parse(name)).collect())
}

fn list_state<T: Copy>(items: Option<&[T]>, sql: fn(T) -> &'static str) -> Value {
    match items {
        Some(items) => Value::Array(
            items
                .iter()
                .map(|item| Value::String(sql(*item).into()))
                .collect(),
        ),
        None => Value::Null,
    }
}
