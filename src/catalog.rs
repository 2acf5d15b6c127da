//! Process-wide catalogs: declared types, comparison operators, aggregates.
//!
//! These tables are immutable and shared by every other module: the map
//! from a declared type to its acceptable runtime value representations,
//! the legal comparison operators per type, and the operand arity of each
//! operator. Adding a variant forces exhaustive matching everywhere it
//! must be handled.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Check that `value` can serve as a SQL identifier (table alias, column
/// name, output alias).
pub fn is_identifier(value: &str) -> bool {
    IDENTIFIER.is_match(value)
}

// =============================================================================
// Declared types
// =============================================================================

/// Declared logical type of a field or parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CType {
    Boolean,
    #[default]
    String,
    Integer,
    Decimal,
    Date,
}

impl CType {
    pub const ALL: [CType; 5] = [
        CType::Boolean,
        CType::String,
        CType::Integer,
        CType::Decimal,
        CType::Date,
    ];

    pub fn parse(name: &str) -> Option<CType> {
        match name {
            "Boolean" => Some(CType::Boolean),
            "String" => Some(CType::String),
            "Integer" => Some(CType::Integer),
            "Decimal" => Some(CType::Decimal),
            "Date" => Some(CType::Date),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CType::Boolean => "Boolean",
            CType::String => "String",
            CType::Integer => "Integer",
            CType::Decimal => "Decimal",
            CType::Date => "Date",
        }
    }

    /// Legal comparison operators for this type.
    pub fn operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            CType::Boolean => &[IsNull, IsNotNull],
            CType::String => &[IsNull, IsNotNull, Eq, Ne, In, NotIn, Like, NotLike],
            CType::Integer | CType::Decimal | CType::Date => &[
                IsNull, IsNotNull, Eq, Ne, In, NotIn, Lt, Le, Gt, Ge, Between, NotBetween,
            ],
        }
    }

    /// Check a runtime value against the representation set of this type.
    ///
    /// Integer rejects floats and booleans; Decimal takes any numeric
    /// representation but never a numeric string. Dates travel as strings
    /// (the bind layer owns their interpretation).
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            CType::Boolean => value.is_boolean(),
            CType::String | CType::Date => value.is_string(),
            CType::Integer => value.is_i64() || value.is_u64(),
            CType::Decimal => value.is_number(),
        }
    }

    /// Human description of the representation set, for error messages.
    pub fn expected(self) -> &'static str {
        match self {
            CType::Boolean => "a boolean",
            CType::String => "a string",
            CType::Integer => "a whole number",
            CType::Decimal => "a number",
            CType::Date => "a date string",
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Operand shape of a comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No operands: `is null`, `is not null`.
    Nullary,
    /// Exactly one scalar operand: `=`, `<`, `like`, ...
    UnaryScalar,
    /// One non-empty parenthesized collection of scalars: `in`, `not in`.
    UnaryCollection,
    /// Exactly two scalar operands: `between`, `not between`.
    Binary,
}

/// A comparison operator usable in filters and having conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    IsNull,
    IsNotNull,
    Eq,
    Ne,
    In,
    NotIn,
    Like,
    NotLike,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    NotBetween,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Operator> {
        match name {
            "is null" => Some(Operator::IsNull),
            "is not null" => Some(Operator::IsNotNull),
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            "in" => Some(Operator::In),
            "not in" => Some(Operator::NotIn),
            "like" => Some(Operator::Like),
            "not like" => Some(Operator::NotLike),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Le),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Ge),
            "between" => Some(Operator::Between),
            "not between" => Some(Operator::NotBetween),
            _ => None,
        }
    }

    /// The operator as it appears in SQL text.
    pub fn sql(self) -> &'static str {
        match self {
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::IsNull | Operator::IsNotNull => Arity::Nullary,
            Operator::Eq
            | Operator::Ne
            | Operator::Like
            | Operator::NotLike
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge => Arity::UnaryScalar,
            Operator::In | Operator::NotIn => Arity::UnaryCollection,
            Operator::Between | Operator::NotBetween => Arity::Binary,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// An aggregate function applicable to `calc` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn parse(name: &str) -> Option<Aggregate> {
        match name {
            "sum" => Some(Aggregate::Sum),
            "avg" => Some(Aggregate::Avg),
            "min" => Some(Aggregate::Min),
            "max" => Some(Aggregate::Max),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}
