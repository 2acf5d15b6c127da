//! Parameter value validation against declared parameter types.

use crate::error::{Error, ErrorBag};
use crate::schema::Schema;
use serde_json::{Map, Value};

/// Check supplied parameter values against the schema's declarations.
///
/// Every declared parameter must be present and carry the runtime
/// representation of its declared ctype; a missing value and a mismatched
/// value are distinct violations. Extra keys not declared in the schema
/// are ignored. All violations aggregate into one error.
pub fn check_params(values: &Map<String, Value>, schema: &Schema) -> Result<(), Error> {
    let mut bag = ErrorBag::new();

    for param in schema.params() {
        let key = format!("params[{}]", param.name);
        match values.get(&param.name) {
            None => {
                bag.push(key, format!("parameter '{}' is not supplied", param.name));
            }
            Some(value) if !param.ctype.accepts(value) => {
                bag.push(
                    key,
                    format!(
                        "incorrect type: expected {} for ctype {}",
                        param.ctype.expected(),
                        param.ctype
                    ),
                );
            }
            Some(_) => {}
        }
    }

    if bag.is_empty() {
        Ok(())
    } else {
        Err(Error::Params(bag))
    }
}
