#![allow(dead_code)]

use slate_sql_core::clause::{Where, WhereNode};
use slate_sql_core::dialect::{MySqlDialect, SqliteDialect};
use slate_sql_core::schema::TableSchema;

pub fn mysql_where(filter: &Where) -> String {
    filter
        .to_sql(&MySqlDialect)
        .unwrap_or_else(|e| panic!("Failed to render {filter:?}\nError: {e:?}"))
}

pub fn sqlite_where(filter: &Where) -> String {
    filter
        .to_sql(&SqliteDialect)
        .unwrap_or_else(|e| panic!("Failed to render {filter:?}\nError: {e:?}"))
}

pub fn json_where(value: serde_json::Value) -> Where {
    Where::from_json(&value).unwrap_or_else(|e| panic!("Failed to read {value}\nError: {e:?}"))
}

pub fn tree(filter: &Where) -> WhereNode {
    filter
        .to_tree(Default::default())
        .unwrap_or_else(|e| panic!("Failed to parse {filter:?}\nError: {e:?}"))
}

pub fn schema(source: &str) -> TableSchema {
    TableSchema::from_json_str(source)
        .unwrap_or_else(|e| panic!("Failed to load schema: {source}\nError: {e:?}"))
}
