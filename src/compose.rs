//! SQL composition: a validated schema, parameter values and a validated
//! request become SQL text plus a bind-value map.
//!
//! Two kinds of values reach the statement by design:
//!
//! - declared parameters stay `:name` bind variables referenced inside
//!   table SQL fragments and travel in the bind map unchanged,
//! - filter/having operands are validated and then inlined as SQL
//!   literals.
//!
//! Composition stops entirely on any assembly or validation failure; no
//! partial SQL text is ever produced.

use crate::catalog::{Aggregate, Arity, Operator};
use crate::element::Field;
use crate::error::{Error, ErrorBag};
use crate::options::{check_options, Condition, Options, SelectItem};
use crate::params::check_params;
use crate::schema::Schema;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// A composed statement: SQL text with `:name` binds plus the bind map.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Map<String, Value>,
}

/// Assemble `raw_schema`, validate `params` and `options` against it, and
/// compose the statement. The single entry point for callers holding raw
/// dictionaries.
pub fn compose(
    raw_schema: &Value,
    params: &Map<String, Value>,
    options: &Options,
) -> Result<Statement, Error> {
    let schema = Schema::assemble(raw_schema)?;
    compose_prepared(&schema, params, options)
}

/// Compose against an already assembled schema. Validation still runs;
/// acceptance here always matches `check_params` + `check_options`.
pub fn compose_prepared(
    schema: &Schema,
    params: &Map<String, Value>,
    options: &Options,
) -> Result<Statement, Error> {
    check_params(params, schema)?;
    check_options(options, schema)?;

    let group = options.group.as_deref().unwrap_or_default();
    let having = options.having.as_deref().unwrap_or_default();
    let order = options.order.as_deref().unwrap_or_default();

    // Fields actually referenced: select ∪ group ∪ having ∪ order. Filters
    // do not contribute tables to FROM.
    let mut used: HashSet<&str> = options.fields.iter().map(SelectItem::name).collect();
    used.extend(group.iter().map(String::as_str));
    used.extend(having.iter().map(Condition::field));
    used.extend(order.iter().map(|item| item.field()));

    // SELECT
    let mut columns = Vec::new();
    for item in &options.fields {
        let field = field_of(schema, item.name())?;
        columns.push(match item.aggregate() {
            Some(aggregate) => format!(
                "{}({}) AS {}",
                aggregate.sql(),
                field.sql_identifier(),
                field.sql_alias()
            ),
            None => field.sql_column(),
        });
    }
    let mut sql = format!(
        "SELECT {}\nFROM {}",
        columns.join(", "),
        schema.sql_tables(&used)
    );

    // WHERE
    if let Some(filters) = &options.filters {
        let mut clauses = Vec::new();
        for condition in filters {
            let field = field_of(schema, condition.field())?;
            clauses.push(render_condition(&field.sql_identifier(), condition)?);
        }
        sql.push_str("\nWHERE ");
        sql.push_str(&clauses.join("\n  AND "));
    }

    // GROUP BY
    if !group.is_empty() {
        let keys: Vec<String> = group
            .iter()
            .map(|name| field_of(schema, name).map(Field::sql_identifier))
            .collect::<Result<_, _>>()?;
        sql.push_str("\nGROUP BY ");
        sql.push_str(&keys.join(", "));
    }

    // HAVING: the left-hand side uses the aggregate applied to the
    // constrained field in the SELECT list, if any.
    if !having.is_empty() {
        let aggregated: HashMap<&str, Aggregate> = options
            .fields
            .iter()
            .filter_map(|item| item.aggregate().map(|agg| (item.name(), agg)))
            .collect();
        let mut clauses = Vec::new();
        for condition in having {
            let field = field_of(schema, condition.field())?;
            let left = match aggregated.get(condition.field()) {
                Some(aggregate) => {
                    format!("{}({})", aggregate.sql(), field.sql_identifier())
                }
                None => field.sql_identifier(),
            };
            clauses.push(render_condition(&left, condition)?);
        }
        sql.push_str("\nHAVING ");
        sql.push_str(&clauses.join("\n  AND "));
    }

    // ORDER BY
    if !order.is_empty() {
        let keys: Vec<String> = order
            .iter()
            .map(|item| {
                field_of(schema, item.field())
                    .map(|field| format!("{} {}", field.sql_alias(), item.direction()))
            })
            .collect::<Result<_, _>>()?;
        sql.push_str("\nORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    Ok(Statement {
        sql,
        binds: params.clone(),
    })
}

// Option validation already guarantees resolution; the error path exists
// so composition degrades into a reported violation instead of a panic.
fn field_of<'a>(schema: &'a Schema, name: &str) -> Result<&'a Field, Error> {
    schema.field(name).ok_or_else(|| {
        let mut bag = ErrorBag::new();
        bag.push("options", format!("unknown field: {name}"));
        Error::Options(bag)
    })
}

fn operator_of(condition: &Condition) -> Result<Operator, Error> {
    Operator::parse(condition.operator()).ok_or_else(|| {
        let mut bag = ErrorBag::new();
        bag.push(
            "options",
            format!("unknown operator: '{}'", condition.operator()),
        );
        Error::Options(bag)
    })
}

/// Render `<left> <operator> <operands>` with operands inlined as literals
/// according to the operator's arity.
fn render_condition(left: &str, condition: &Condition) -> Result<String, Error> {
    let operator = operator_of(condition)?;
    let operands = condition.operands();

    Ok(match operator.arity() {
        Arity::Nullary => format!("{left} {}", operator.sql()),
        Arity::UnaryScalar => format!(
            "{left} {} {}",
            operator.sql(),
            literal(operands.first().unwrap_or(&Value::Null))
        ),
        Arity::UnaryCollection => {
            let items: Vec<String> = operands.iter().map(literal).collect();
            format!("{left} {} ({})", operator.sql(), items.join(", "))
        }
        Arity::Binary => format!(
            "{left} {} {} and {}",
            operator.sql(),
            literal(operands.first().unwrap_or(&Value::Null)),
            literal(operands.get(1).unwrap_or(&Value::Null))
        ),
    })
}

/// Inline one operand as a SQL literal. Strings are quoted with doubled
/// single quotes; numbers and booleans render bare.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(true) => "true".to_owned(),
        Value::Bool(false) => "false".to_owned(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", text.replace('\'', "''")),
        // Arity checks reject nested structures; a raw call still gets a
        // quoted JSON string.
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
