#![allow(dead_code)]

use slate_db::prelude::*;

/// A private in-memory SQLite database, already connected.
pub async fn memory_db() -> Database<SqliteBackend> {
    let config = DbConfig::sqlite(":memory:").expect("in-memory config is valid");
    let mut db = Database::with_config(config);
    db.connect()
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory database\nError: {e:?}"));
    db
}

pub fn schema(source: &str) -> TableSchema {
    TableSchema::from_json_str(source)
        .unwrap_or_else(|e| panic!("Failed to load schema: {source}\nError: {e:?}"))
}

pub async fn sync(
    db: &mut Database<SqliteBackend>,
    source: &str,
    options: SyncOptions,
) -> Vec<ChangeRecord> {
    db.update_schema(&schema(source), options)
        .await
        .unwrap_or_else(|e| panic!("Failed to sync: {source}\nError: {e:?}"))
}

pub async fn forced(db: &mut Database<SqliteBackend>, source: &str) -> Vec<ChangeRecord> {
    sync(db, source, SyncOptions::new().force(true)).await
}

/// A database holding the synced `source` schema.
pub async fn synced_db(source: &str) -> Database<SqliteBackend> {
    let mut db = memory_db().await;
    forced(&mut db, source).await;
    db
}

pub async fn column_names(db: &mut Database<SqliteBackend>, table: &str) -> Vec<String> {
    db.describe(table)
        .await
        .unwrap_or_else(|e| panic!("Failed to describe {table}\nError: {e:?}"))
        .into_iter()
        .map(|c| c.spec.name)
        .collect()
}

pub fn messages(log: &[ChangeRecord]) -> Vec<String> {
    log.iter().map(ToString::to_string).collect()
}
