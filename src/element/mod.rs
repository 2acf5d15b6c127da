//! Descriptor elements: named, typed, defaulted, cross-validated.
//!
//! Every schema element (field, parameter) is declared through an ordered
//! attribute template: one [`AttrSpec`] row per attribute carrying its
//! declared kind, its default, and an optional cross-field validator. The
//! generic [`build_state`] routine merges a raw JSON object over the
//! template defaults and then runs every validator against the *completed*
//! state, so validators can express rules that span attributes
//! (`mandatory` vs `hidden`, `key` vs `calc`, operators vs `ctype`).
//!
//! Merge policy is deliberately permissive: unknown keys are ignored and
//! type-mismatched values fall back to the default. Validation is
//! all-or-nothing: every failing attribute is reported together and no
//! descriptor is produced when any of them is invalid.

pub mod field;
pub mod param;

pub use field::Field;
pub use param::Param;

use crate::catalog::{is_identifier, CType, Operator};
use crate::error::ErrorBag;
use serde_json::{Map, Value};

pub(crate) const MSG_NOT_IDENTIFIER: &str = "value must be a SQL identifier";
pub(crate) const MSG_NOT_CTYPE: &str =
    "'ctype' must be one of Boolean, String, Integer, Decimal, Date";
pub(crate) const MSG_NOT_OPERATION: &str =
    "all values must be legal operators for the declared 'ctype'";
pub(crate) const MSG_NOT_AGGREGATE: &str = "all values must be one of sum, avg, min, max";
pub(crate) const MSG_KEY_CALC: &str = "only one of 'key' and 'calc' may be set";
pub(crate) const MSG_MANDATORY_HIDDEN: &str = "a mandatory field can not be hidden";
pub(crate) const MSG_HIDDEN_MANDATORY: &str = "a hidden field can not be mandatory";
pub(crate) const MSG_HAVING_CALC: &str = "'having' may be set only on a calc field";

/// Declared kind of one descriptor attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Bool,
    Str,
    /// An ordered list of names (operators or aggregates).
    StrList,
}

/// Default value of an attribute when the raw dictionary omits it.
///
/// `Name` is the one place a default may reference the element's own name.
#[derive(Debug, Clone, Copy)]
pub enum AttrDefault {
    Bool(bool),
    Str(&'static str),
    Name,
    Unset,
}

/// Runtime value of one attribute after the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
    Unset,
}

impl AttrValue {
    pub fn as_bool(&self) -> bool {
        matches!(self, AttrValue::Bool(true))
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttrValue::Str(value) => value,
            _ => "",
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, AttrValue::Unset)
    }
}

/// Cross-field validator: sees the attribute value and the whole merged
/// state. Returns `false` to flag the attribute.
pub type Validator = fn(&AttrValue, &AttrState) -> bool;

/// One row of an element's attribute template.
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub default: AttrDefault,
    pub validator: Option<Validator>,
    pub message: &'static str,
}

/// Fully merged attribute state, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrState {
    entries: Vec<(&'static str, AttrValue)>,
}

const UNSET: &AttrValue = &AttrValue::Unset;

impl AttrState {
    /// Look up an attribute; unknown names read as unset.
    pub fn get(&self, name: &str) -> &AttrValue {
        self.entries
            .iter()
            .find(|(attr, _)| *attr == name)
            .map_or(UNSET, |(_, value)| value)
    }

    fn insert(&mut self, name: &'static str, value: AttrValue) {
        self.entries.push((name, value));
    }
}

/// Merge `raw` over the template defaults, then validate the completed
/// state. All failing attributes are reported together, keyed by attribute
/// name; no state escapes when any attribute is invalid.
pub fn build_state(
    name: &str,
    raw: Option<&Map<String, Value>>,
    template: &[AttrSpec],
) -> Result<AttrState, ErrorBag> {
    let mut bag = ErrorBag::new();
    if !is_identifier(name) {
        bag.push("name", MSG_NOT_IDENTIFIER);
    }

    let mut state = AttrState::default();
    for spec in template {
        let value = raw
            .and_then(|attrs| attrs.get(spec.name))
            .and_then(|value| coerce(value, spec.kind))
            .unwrap_or_else(|| resolve_default(spec.default, name));
        state.insert(spec.name, value);
    }

    for spec in template {
        if let Some(validator) = spec.validator {
            if !validator(state.get(spec.name), &state) {
                bag.push(spec.name, spec.message);
            }
        }
    }

    if bag.is_empty() {
        Ok(state)
    } else {
        Err(bag)
    }
}

/// Accept a raw JSON value into the declared kind, or reject it so the
/// default applies. This is a filter, not a coercion: "true" never becomes
/// a bool and a number never becomes a string.
fn coerce(value: &Value, kind: AttrKind) -> Option<AttrValue> {
    match (kind, value) {
        (AttrKind::Bool, Value::Bool(flag)) => Some(AttrValue::Bool(*flag)),
        (AttrKind::Str, Value::String(text)) => Some(AttrValue::Str(text.clone())),
        (AttrKind::StrList, Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .map(AttrValue::List),
        _ => None,
    }
}

fn resolve_default(default: AttrDefault, name: &str) -> AttrValue {
    match default {
        AttrDefault::Bool(flag) => AttrValue::Bool(flag),
        AttrDefault::Str(text) => AttrValue::Str(text.to_owned()),
        AttrDefault::Name => AttrValue::Str(name.to_owned()),
        AttrDefault::Unset => AttrValue::Unset,
    }
}

// =============================================================================
// Shared validators
// =============================================================================

pub(crate) fn valid_ctype(value: &AttrValue, _state: &AttrState) -> bool {
    CType::parse(value.as_str()).is_some()
}

pub(crate) fn valid_identifier(value: &AttrValue, _state: &AttrState) -> bool {
    value.is_unset() || is_identifier(value.as_str())
}

/// The ctype recorded in a merged state. An invalid name reads as the
/// default; the `ctype` validator reports it separately.
pub(crate) fn state_ctype(state: &AttrState) -> CType {
    CType::parse(state.get("ctype").as_str()).unwrap_or_default()
}

/// Every name in `value` is a legal operator for the state's ctype.
pub(crate) fn valid_operations(value: &AttrValue, state: &AttrState) -> bool {
    match value {
        AttrValue::Unset => true,
        AttrValue::List(names) => {
            let legal = state_ctype(state).operators();
            names
                .iter()
                .all(|name| Operator::parse(name).is_some_and(|op| legal.contains(&op)))
        }
        _ => false,
    }
}
