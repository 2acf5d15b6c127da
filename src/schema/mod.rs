//! Schema assembly: a raw schema dictionary becomes a validated,
//! immutable [`Schema`] in one atomic step, or fails with every violation
//! found.
//!
//! A schema owns three sections:
//!
//! - `tables`: alias -> SQL source fragment (a SELECT statement or table
//!   name; fragments may reference declared params as `:name` binds),
//! - `fields`: name -> field descriptor,
//! - `params`: name -> parameter descriptor.
//!
//! Assembly never touches a database; it only populates the schema state.
//! An assembled schema is read-only and safe to share across threads.

use crate::catalog::is_identifier;
use crate::element::{Field, Param};
use crate::error::{Error, ErrorBag};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One declared table: alias plus the SQL fragment it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub alias: String,
    pub sql: String,
}

/// An assembled, validated data-access schema.
///
/// Sections keep their declaration order; the FROM clause follows table
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: Vec<TableDef>,
    fields: Vec<Field>,
    params: Vec<Param>,
}

impl Schema {
    /// Assemble a schema from its raw dictionary.
    ///
    /// All violations across all three sections are aggregated before
    /// failing, keyed `"sample"`, `"tables[alias]"`, `"fields[name]"` or
    /// `"params[name]"`. Either a fully valid schema is produced or none.
    pub fn assemble(raw: &Value) -> Result<Schema, Error> {
        let mut bag = ErrorBag::new();

        let root = match raw.as_object() {
            Some(root) => root,
            None => {
                bag.push("sample", "schema must be a mapping");
                return Err(Error::Schema(bag));
            }
        };

        let tables = assemble_tables(root, &mut bag);
        // Referential checks run against every declared alias, valid or
        // not, so one bad alias does not cascade into field errors.
        let aliases: HashSet<&str> = tables.iter().map(|t| t.alias.as_str()).collect();
        let fields = assemble_fields(root, &aliases, &mut bag);
        let params = assemble_params(root, &mut bag);

        if bag.is_empty() {
            Ok(Schema {
                tables,
                fields,
                params,
            })
        } else {
            Err(Error::Schema(bag))
        }
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Serialize back to the raw dictionary shape. Re-assembling the
    /// result yields an equal schema.
    pub fn to_state(&self) -> Value {
        let mut tables = Map::new();
        for table in &self.tables {
            tables.insert(table.alias.clone(), Value::String(table.sql.clone()));
        }
        let mut fields = Map::new();
        for field in &self.fields {
            fields.insert(field.name.clone(), field.to_state());
        }
        let mut params = Map::new();
        for param in &self.params {
            params.insert(param.name.clone(), param.to_state());
        }

        let mut state = Map::new();
        state.insert("tables".into(), Value::Object(tables));
        state.insert("fields".into(), Value::Object(fields));
        state.insert("params".into(), Value::Object(params));
        Value::Object(state)
    }

    /// FROM-clause rendering for the tables reached by `used` field names:
    /// `(<fragment>) AS "<alias>"`, comma-joined, in declaration order.
    pub fn sql_tables(&self, used: &HashSet<&str>) -> String {
        let using_tables: HashSet<&str> = self
            .fields
            .iter()
            .filter(|field| used.contains(field.name.as_str()))
            .map(|field| field.table.as_str())
            .collect();
        self.tables
            .iter()
            .filter(|table| using_tables.contains(table.alias.as_str()))
            .map(|table| format!("({}) AS \"{}\"", table.sql, table.alias))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn assemble_tables(root: &Map<String, Value>, bag: &mut ErrorBag) -> Vec<TableDef> {
    let entries = match section(root, "tables", bag) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut tables = Vec::new();
    for (alias, fragment) in entries {
        let key = format!("tables[{alias}]");
        if !is_identifier(alias) {
            bag.push(key.as_str(), "alias must be a SQL identifier");
        }
        let sql = fragment.as_str().unwrap_or_default();
        if sql.trim().is_empty() {
            bag.push(key.as_str(), "SQL statement is empty");
        }
        tables.push(TableDef {
            alias: alias.clone(),
            sql: sql.to_owned(),
        });
    }
    tables
}

fn assemble_fields(
    root: &Map<String, Value>,
    aliases: &HashSet<&str>,
    bag: &mut ErrorBag,
) -> Vec<Field> {
    let entries = match section(root, "fields", bag) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut fields = Vec::new();
    for (name, attrs) in entries {
        let key = format!("fields[{name}]");
        let attrs = match element_attrs(attrs) {
            Ok(attrs) => attrs,
            Err(message) => {
                bag.push(key.as_str(), message);
                continue;
            }
        };
        // One invalid field never stops the rest from being checked.
        match Field::new(name, attrs) {
            Ok(field) => {
                if aliases.contains(field.table.as_str()) {
                    fields.push(field);
                } else {
                    let mut declared: Vec<&str> = aliases.iter().copied().collect();
                    declared.sort_unstable();
                    bag.push(
                        key.as_str(),
                        format!(
                            "table alias '{}' is not declared in 'tables' ({})",
                            field.table,
                            declared.join(", ")
                        ),
                    );
                }
            }
            Err(errors) => {
                for (attr, messages) in errors.iter() {
                    for message in messages {
                        bag.push(key.as_str(), format!("'{attr}': {message}"));
                    }
                }
            }
        }
    }
    fields
}

fn assemble_params(root: &Map<String, Value>, bag: &mut ErrorBag) -> Vec<Param> {
    let entries = match section(root, "params", bag) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut params = Vec::new();
    for (name, attrs) in entries {
        let key = format!("params[{name}]");
        let attrs = match element_attrs(attrs) {
            Ok(attrs) => attrs,
            Err(message) => {
                bag.push(key.as_str(), message);
                continue;
            }
        };
        match Param::new(name, attrs) {
            Ok(param) => params.push(param),
            Err(errors) => {
                for (attr, messages) in errors.iter() {
                    for message in messages {
                        bag.push(key.as_str(), format!("'{attr}': {message}"));
                    }
                }
            }
        }
    }
    params
}

/// Fetch a required, non-empty section mapping. Absence, a wrong shape and
/// emptiness each report under the `"sample"` key.
fn section<'a>(
    root: &'a Map<String, Value>,
    name: &str,
    bag: &mut ErrorBag,
) -> Option<&'a Map<String, Value>> {
    match root.get(name) {
        None => {
            bag.push("sample", format!("'{name}' is not defined in schema"));
            None
        }
        Some(value) => match value.as_object() {
            None => {
                bag.push("sample", format!("'{name}' must be a mapping"));
                None
            }
            Some(entries) if entries.is_empty() => {
                bag.push("sample", format!("'{name}' is empty"));
                None
            }
            Some(entries) => Some(entries),
        },
    }
}

fn element_attrs(attrs: &Value) -> Result<Option<&Map<String, Value>>, &'static str> {
    match attrs {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        _ => Err("attributes must be a mapping"),
    }
}
