//! Clause builders.
//!
//! Each builder turns structured input into one SQL fragment. Fragments
//! that follow the table name (`join`, `where`, `group`, `order`, `limit`)
//! start with a space, or are empty when there is nothing to render.

mod columns;
mod filter;
mod join;
mod order;

pub use columns::columns;
pub use filter::{where_clause, CompareOp, Conjunction, Operand, Where, WhereNode, WhereValue};
pub use join::{join_clause, Join};
pub use order::{group_clause, limit_clause, order_clause, Direction, Limit};
