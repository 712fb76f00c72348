//! # Nexus Query
//!
//! A small query language over document metadata:
//!
//! ```text
//! FROM "goals" WHERE priority = high OR status != done SORT due DESC LIMIT 5 TABLE title, due as "Due"
//! ```
//!
//! Clauses are optional and may appear in any order. The pipeline is
//!
//! 1. [`expand_tag_shorthand`] turns bare `#tag` tokens into a `WHERE` clause
//! 2. [`parse`] builds a [`QueryRequest`] with a chumsky grammar
//! 3. [`execute`] scans the scoped folder, filters, sorts and truncates
//! 4. [`render`] formats the result as a markdown table or bullet list

#![warn(clippy::all)]

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval;
pub mod render;
pub mod shorthand;
pub mod syntax;

pub use ast::{Condition, Filter, Operator, Output, Projection, QueryRequest, Sort, SortDirection};
pub use engine::{execute, run, QueryOptions};
pub use error::{QueryError, QueryResult};
pub use render::render;
pub use shorthand::expand_tag_shorthand;
pub use syntax::parse;
