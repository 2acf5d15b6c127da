//! Runtime request types and their validation against an assembled schema.
//!
//! A request names the fields to select (optionally aggregated), plus
//! optional filters, grouping, having conditions and ordering. Validation
//! is purely structural and referential; no SQL is generated here. All
//! violations are aggregated under `options[...]` keys before failing.

use crate::catalog::{Aggregate, Arity, Operator};
use crate::error::{Error, ErrorBag};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One select-list entry: a bare field name, or a `(name, aggregate)` pair
/// where the aggregate may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectItem {
    Name(String),
    Aggregated(String, Option<Aggregate>),
}

impl SelectItem {
    pub fn name(&self) -> &str {
        match self {
            SelectItem::Name(name) | SelectItem::Aggregated(name, _) => name,
        }
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        match self {
            SelectItem::Name(_) => None,
            SelectItem::Aggregated(_, aggregate) => *aggregate,
        }
    }
}

/// A filter or having condition: `(field, operator, operands)`.
///
/// Operands are literal values, not bind variables; they are validated
/// here and inlined by the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition(pub String, pub String, pub Vec<Value>);

impl Condition {
    pub fn field(&self) -> &str {
        &self.0
    }

    pub fn operator(&self) -> &str {
        &self.1
    }

    pub fn operands(&self) -> &[Value] {
        &self.2
    }
}

/// One ordering entry: `(field, "asc" | "desc")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem(pub String, pub String);

impl OrderItem {
    pub fn field(&self) -> &str {
        &self.0
    }

    pub fn direction(&self) -> &str {
        &self.1
    }
}

/// A runtime request checked against a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Fields to select, in output order. Required.
    pub fields: Vec<SelectItem>,
    /// WHERE conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Condition>>,
    /// GROUP BY field names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<String>>,
    /// HAVING conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Vec<Condition>>,
    /// ORDER BY entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<OrderItem>>,
}

impl Options {
    /// Parse a raw options dictionary.
    ///
    /// A missing `fields` key or a malformed entry shape reports under the
    /// `"options"` key rather than as a bare deserialization error.
    pub fn from_value(raw: &Value) -> Result<Options, Error> {
        let mut bag = ErrorBag::new();
        if raw.get("fields").is_none() {
            bag.push("options", "'fields' is not defined in options");
            return Err(Error::Options(bag));
        }
        serde_json::from_value(raw.clone()).map_err(|err| {
            bag.push("options", err.to_string());
            Error::Options(bag)
        })
    }
}

/// Check a request against an assembled schema.
///
/// All violations are aggregated; this and [`crate::compose`] never
/// disagree on acceptance.
pub fn check_options(options: &Options, schema: &Schema) -> Result<(), Error> {
    let mut bag = ErrorBag::new();

    check_fields(options, schema, &mut bag);
    if let Some(filters) = &options.filters {
        check_filters(filters, schema, &mut bag);
    }
    if let Some(group) = &options.group {
        check_group(group, schema, &mut bag);
    }
    if let Some(having) = &options.having {
        check_having(having, schema, &mut bag);
    }
    if let Some(order) = &options.order {
        check_order(order, schema, &mut bag);
    }

    if bag.is_empty() {
        Ok(())
    } else {
        Err(Error::Options(bag))
    }
}

fn check_fields(options: &Options, schema: &Schema, bag: &mut ErrorBag) {
    if options.fields.is_empty() {
        bag.push("options[fields]", "select list is empty");
    }

    let requested: HashSet<&str> = options.fields.iter().map(SelectItem::name).collect();

    // Report unknown names in request order, once each.
    let mut reported: HashSet<&str> = HashSet::new();
    for item in &options.fields {
        let name = item.name();
        let selectable = schema.field(name).is_some_and(|field| !field.hidden);
        if !selectable && reported.insert(name) {
            bag.push("options[fields]", format!("unknown field: {name}"));
        }
    }

    for field in schema.fields() {
        if field.mandatory && !requested.contains(field.name.as_str()) {
            bag.push(
                "options[fields]",
                format!("mandatory field is absent: {}", field.name),
            );
        }
    }
}

fn check_filters(filters: &[Condition], schema: &Schema, bag: &mut ErrorBag) {
    for condition in filters {
        let field = match schema.field(condition.field()) {
            Some(field) => field,
            None => {
                bag.push(
                    "options[filters]",
                    format!("unknown field in filter: {}", condition.field()),
                );
                continue;
            }
        };
        // A declared non-empty `filtered` list restricts operators; an
        // unset or empty list leaves any operator legal for the field's
        // type.
        let member = match field.filtered.as_deref().filter(|ops| !ops.is_empty()) {
            Some(allowed) => Operator::parse(condition.operator())
                .is_some_and(|op| allowed.contains(&op)),
            None => true,
        };
        let key = format!("options[filters][{}]", condition.field());
        if !member {
            bag.push(key, format!("operator not allowed: '{}'", condition.operator()));
        } else if let Err(message) = check_operands(condition) {
            bag.push(key, message);
        }
    }
}

fn check_group(group: &[String], schema: &Schema, bag: &mut ErrorBag) {
    for name in group {
        if !schema.field(name).is_some_and(|field| field.key) {
            bag.push(
                "options[group]",
                format!("field is unknown or not a group key: {name}"),
            );
        }
    }
}

fn check_having(having: &[Condition], schema: &Schema, bag: &mut ErrorBag) {
    for condition in having {
        let allowed = schema
            .field(condition.field())
            .and_then(|field| field.having.as_deref())
            .filter(|operators| !operators.is_empty());
        let operators = match allowed {
            Some(operators) => operators,
            None => {
                bag.push(
                    "options[having]",
                    format!(
                        "field is unknown or not eligible for having: {}",
                        condition.field()
                    ),
                );
                continue;
            }
        };
        let key = format!("options[having][{}]", condition.field());
        let member = Operator::parse(condition.operator())
            .is_some_and(|op| operators.contains(&op));
        if !member {
            bag.push(key, format!("operator not allowed: '{}'", condition.operator()));
        } else if let Err(message) = check_operands(condition) {
            bag.push(key, message);
        }
    }
}

fn check_order(order: &[OrderItem], schema: &Schema, bag: &mut ErrorBag) {
    for item in order {
        if !schema.field(item.field()).is_some_and(|field| field.ordered) {
            bag.push(
                "options[order]",
                format!("field is unknown or not sortable: {}", item.field()),
            );
        }
        if item.direction() != "asc" && item.direction() != "desc" {
            bag.push(
                "options[order]",
                format!(
                    "unknown sort direction '{}' for field {}",
                    item.direction(),
                    item.field()
                ),
            );
        }
    }
}

/// Check a condition's operand shape against its operator's arity.
fn check_operands(condition: &Condition) -> Result<(), String> {
    let operator = Operator::parse(condition.operator())
        .ok_or_else(|| format!("unknown operator: '{}'", condition.operator()))?;
    let operands = condition.operands();
    let scalar = |value: &Value| !value.is_array() && !value.is_object();

    match operator.arity() {
        Arity::Nullary if !operands.is_empty() => {
            Err(format!("operator '{operator}' takes no operands"))
        }
        Arity::UnaryScalar if operands.len() != 1 || !operands.iter().all(scalar) => Err(
            format!("operator '{operator}' takes exactly one scalar operand"),
        ),
        Arity::UnaryCollection if operands.is_empty() || !operands.iter().all(scalar) => {
            Err(format!(
                "operator '{operator}' takes a non-empty collection of scalar operands"
            ))
        }
        Arity::Binary if operands.len() != 2 || !operands.iter().all(scalar) => Err(
            format!("operator '{operator}' takes exactly two scalar operands"),
        ),
        _ => Ok(()),
    }
}
