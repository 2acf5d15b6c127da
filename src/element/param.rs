//! Param descriptors: typed runtime inputs substituted into table SQL
//! fragments as `:name` bind variables.

use crate::catalog::CType;
use crate::element::{
    build_state, state_ctype, valid_ctype, AttrDefault, AttrKind, AttrSpec, AttrState,
    MSG_NOT_CTYPE,
};
use crate::error::ErrorBag;
use serde_json::{Map, Value};

const PARAM_TEMPLATE: &[AttrSpec] = &[
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
];

/// A validated parameter descriptor. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ctype: CType,
    /// Label for input forms.
    pub label: String,
}

impl Param {
    /// Build and validate a parameter from its raw attribute dictionary.
    pub fn new(name: &str, raw: Option<&Map<String, Value>>) -> Result<Param, ErrorBag> {
        let state = build_state(name, raw, PARAM_TEMPLATE)?;
        Ok(Param::from_state(name, &state))
    }

    fn from_state(name: &str, state: &AttrState) -> Param {
        Param {
            name: name.to_owned(),
            ctype: state_ctype(state),
            label: state.get("label").as_str().to_owned(),
        }
    }

    /// Serialize back to the raw attribute shape, in template order.
    pub fn to_state(&self) -> Value {
        let mut state = Map::new();
        state.insert("ctype".into(), Value::String(self.ctype.name().into()));
        state.insert("label".into(), Value::String(self.label.clone()));
        Value::Object(state)
    }
}
