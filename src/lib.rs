//! # datasample
//!
//! Declarative data-access schemas validated and compiled to parameterized
//! SQL.
//!
//! Report authors declare, once, a reusable schema: named tables,
//! selectable/filterable/aggregatable fields, and typed runtime
//! parameters. Report consumers submit a small runtime request (fields,
//! filters, grouping, having, ordering) that is checked against the schema
//! and compiled into a parameterized SQL statement. Unknown fields,
//! forbidden operators, wrong-typed parameters and aggregate/group-key
//! confusion are all rejected before any SQL reaches a database.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Raw schema dictionary (JSON-shaped)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Schema::assemble]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Schema (validated tables/fields/params)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!            ┌─────────────┴─────────────┐
//!            ▼ [check_params]            ▼ [check_options]
//! ┌─────────────────────┐    ┌─────────────────────────────┐
//! │  Parameter values   │    │  Runtime request (Options)  │
//! └─────────────────────┘    └─────────────────────────────┘
//!            │                            │
//!            └─────────────┬─────────────┘
//!                          ▼ [compose]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Statement: SQL text (:name binds) + bind map         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage aggregates all violations it finds and fails once with the
//! complete list; composition produces no partial SQL. All types are
//! immutable after construction and safe to share across threads.

pub mod catalog;
pub mod compose;
pub mod element;
pub mod error;
pub mod options;
pub mod params;
pub mod schema;

pub use compose::{compose, compose_prepared, Statement};
pub use error::{Error, ErrorBag};
pub use options::{check_options, Options};
pub use params::check_params;
pub use schema::Schema;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Aggregate, Arity, CType, Operator};
    pub use crate::compose::{compose, compose_prepared, Statement};
    pub use crate::element::{Field, Param};
    pub use crate::error::{Error, ErrorBag};
    pub use crate::options::{check_options, Condition, Options, OrderItem, SelectItem};
    pub use crate::params::check_params;
    pub use crate::schema::{Schema, TableDef};
}
