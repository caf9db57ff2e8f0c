//! Schema synchronization against an in-memory SQLite database.

mod common;

use common::{column_names, forced, memory_db, messages, sync, synced_db};
use slate_db::prelude::*;
use slate_db::LiveColumn;
use slate_sql_core::change::{Outcome, SchemaChange, SkipReason};
use slate_sql_core::schema::IndexKind;

const FULL: &str = r#"{
    "users": {
        "name":  {"type": "VARCHAR(64)", "null": false, "default": ""},
        "email": {"type": "VARCHAR(255)", "index": "unique"},
        "age":   {"type": "INT", "default": 0, "index": true},
        "score": {"type": "FLOAT", "default": 1.5},
        "bio":   {"type": "TEXT"}
    },
    "posts": {
        "title": {},
        "body":  {"type": "TEXT", "default": "it's empty"}
    }
}"#;

async fn live_column(db: &mut Database<SqliteBackend>, table: &str, column: &str) -> LiveColumn {
    db.describe(table)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name() == column)
        .unwrap_or_else(|| panic!("{table}.{column} is missing"))
}

// =============================================================================
// Convergence
// =============================================================================

#[tokio::test]
async fn forced_sync_is_idempotent() {
    let mut db = memory_db().await;

    let first = forced(&mut db, FULL).await;
    assert!(!first.is_empty());
    assert!(first.iter().all(ChangeRecord::is_applied));

    let second = forced(&mut db, FULL).await;
    assert!(second.is_empty(), "{:?}", messages(&second));
}

#[tokio::test]
async fn fresh_tables_get_reserved_then_declared_columns() {
    let mut db = memory_db().await;
    let log = forced(&mut db, FULL).await;

    assert_eq!(
        messages(&log)[..3],
        [
            "created table `users`",
            "added column `users.name` VARCHAR(64) NOT NULL DEFAULT ",
            "added column `users.email` VARCHAR(255) NULL with unique index",
        ]
    );
    assert_eq!(
        column_names(&mut db, "users").await,
        vec!["id", "created_at", "updated_at", "name", "email", "age", "score", "bio"]
    );
    assert_eq!(
        column_names(&mut db, "posts").await,
        vec!["id", "created_at", "updated_at", "title", "body"]
    );

    let email = live_column(&mut db, "users", "email").await;
    assert_eq!(email.spec.index, IndexKind::Unique);
    assert_eq!(email.index_name.as_deref(), Some("index_users_email"));
    let age = live_column(&mut db, "users", "age").await;
    assert_eq!(age.spec.index, IndexKind::NonUnique);
}

#[tokio::test]
async fn declared_defaults_apply_to_new_rows() {
    let mut db = synced_db(FULL).await;
    let id = db.insert("posts", Values::new().set("title", "hello")).await.unwrap();
    let post = db
        .get("posts", &["body"], &Where::new().eq("id", id.as_str()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.text("body"), Some("it's empty"));
}

#[tokio::test]
async fn reserved_columns_are_never_declared() {
    let mut db = memory_db().await;
    let log = forced(
        &mut db,
        r#"{"users": {"id": {"type": "INT"}, "name": {}}}"#,
    )
    .await;
    assert_eq!(log.len(), 2);
    assert_eq!(live_column(&mut db, "users", "id").await.spec.engine_type, "VARCHAR(36)");
}

// =============================================================================
// Destructive gate
// =============================================================================

#[tokio::test]
async fn undeclared_column_drop_needs_force() {
    let mut db = synced_db(r#"{"users": {"name": {}, "legacy": {"index": true}}}"#).await;
    let v2 = r#"{"users": {"name": {}}}"#;

    for _ in 0..2 {
        let log = sync(&mut db, v2, SyncOptions::new()).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].outcome, Outcome::Skipped(SkipReason::Destructive));
        assert!(matches!(log[0].change, SchemaChange::DropColumn { .. }));
        assert!(column_names(&mut db, "users").await.contains(&"legacy".to_string()));
    }

    let log = forced(&mut db, v2).await;
    assert_eq!(messages(&log), vec!["dropped column `users.legacy`"]);
    assert_eq!(
        log[0].sql,
        vec![
            "DROP INDEX IF EXISTS index_users_legacy",
            "ALTER TABLE users DROP COLUMN legacy",
        ]
    );
    assert!(!column_names(&mut db, "users").await.contains(&"legacy".to_string()));
    assert!(forced(&mut db, v2).await.is_empty());
}

#[tokio::test]
async fn dropped_column_names_are_sanitized() {
    let mut db = synced_db(r#"{"users": {"name": {}}}"#).await;
    db.execute(r#"ALTER TABLE users ADD COLUMN "odd-name;" TEXT"#)
        .await
        .unwrap();

    let log = sync(&mut db, r#"{"users": {"name": {}}}"#, SyncOptions::new()).await;
    assert_eq!(log.len(), 1);
    assert!(log[0].is_skipped());
    assert_eq!(log[0].sql, vec!["ALTER TABLE users DROP COLUMN oddname"]);
}

#[tokio::test]
async fn redefinition_needs_force_and_keeps_rows() {
    let mut db = synced_db(r#"{"users": {"name": {"type": "VARCHAR(64)"}, "email": {"index": "unique"}}}"#).await;
    let id = db
        .insert("users", Values::new().set("name", "Ada").set("email", "ada@example.com"))
        .await
        .unwrap();
    let v2 = r#"{"users": {"name": {"type": "TEXT", "null": false, "default": ""}, "email": {"index": "unique"}}}"#;

    let log = sync(&mut db, v2, SyncOptions::new()).await;
    assert_eq!(log.len(), 1);
    assert!(log[0].is_skipped());
    assert_eq!(live_column(&mut db, "users", "name").await.spec.engine_type, "VARCHAR(64)");

    let log = forced(&mut db, v2).await;
    assert_eq!(
        messages(&log),
        vec!["modified column `users.name` to TEXT NOT NULL DEFAULT "]
    );
    let name = live_column(&mut db, "users", "name").await;
    assert_eq!(name.spec.engine_type, "TEXT");
    assert!(!name.spec.nullable);
    assert_eq!(
        live_column(&mut db, "users", "email").await.spec.index,
        IndexKind::Unique
    );

    let row = db
        .get("users", &["name", "email"], &Where::new().eq("id", id.as_str()))
        .await
        .unwrap()
        .expect("row survives the rebuild");
    assert_eq!(row.text("name"), Some("Ada"));
    assert_eq!(row.text("email"), Some("ada@example.com"));

    assert!(forced(&mut db, v2).await.is_empty());
}

// =============================================================================
// Indexes
// =============================================================================

#[tokio::test]
async fn adding_an_index_is_not_gated() {
    let mut db = synced_db(r#"{"users": {"email": {}}}"#).await;
    let log = sync(
        &mut db,
        r#"{"users": {"email": {"index": "unique"}}}"#,
        SyncOptions::new(),
    )
    .await;
    assert_eq!(messages(&log), vec!["added unique index on `users.email`"]);
    assert!(log[0].is_applied());
    assert_eq!(
        live_column(&mut db, "users", "email").await.spec.index,
        IndexKind::Unique
    );
}

#[tokio::test]
async fn replacing_an_index_waits_for_the_drop() {
    let mut db = synced_db(r#"{"users": {"email": {"index": "unique"}}}"#).await;
    let v2 = r#"{"users": {"email": {"index": true}}}"#;

    let log = sync(&mut db, v2, SyncOptions::new()).await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].outcome, Outcome::Skipped(SkipReason::Destructive));
    assert_eq!(log[1].outcome, Outcome::Skipped(SkipReason::PendingIndexDrop));

    let log = forced(&mut db, v2).await;
    assert_eq!(
        messages(&log),
        vec![
            "dropped index `index_users_email` on `users`",
            "added index on `users.email`",
        ]
    );
    assert_eq!(
        live_column(&mut db, "users", "email").await.spec.index,
        IndexKind::NonUnique
    );
    assert!(forced(&mut db, v2).await.is_empty());
}

#[tokio::test]
async fn removing_an_index_is_gated() {
    let mut db = synced_db(r#"{"users": {"age": {"type": "INT", "index": true}}}"#).await;
    let v2 = r#"{"users": {"age": {"type": "INT"}}}"#;

    let log = sync(&mut db, v2, SyncOptions::new()).await;
    assert_eq!(log.len(), 1);
    assert!(log[0].is_skipped());

    forced(&mut db, v2).await;
    assert_eq!(
        live_column(&mut db, "users", "age").await.spec.index,
        IndexKind::None
    );
}

// =============================================================================
// Dry run and failures
// =============================================================================

#[tokio::test]
async fn dry_run_plans_without_executing() {
    let mut db = memory_db().await;
    let log = sync(&mut db, FULL, SyncOptions::new().force(true).dry_run(true)).await;

    assert!(!log.is_empty());
    assert!(log.iter().all(|r| r.outcome == Outcome::Planned));
    assert_eq!(
        log[0].sql,
        vec![
            "CREATE TABLE users (id VARCHAR(36) NOT NULL, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
             updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, PRIMARY KEY (id))"
        ]
    );
    assert!(db.tables().await.unwrap().is_empty());

    forced(&mut db, FULL).await;
    let log = sync(&mut db, FULL, SyncOptions::new().dry_run(true)).await;
    assert!(log.is_empty());
}

#[tokio::test]
async fn failing_statement_aborts_with_its_sql() {
    let mut db = synced_db(r#"{"users": {"email": {}}}"#).await;
    db.insert("users", Values::new().set("email", "ada@example.com"))
        .await
        .unwrap();

    // SQLite cannot add a NOT NULL column without a default to a table
    // holding rows
    let err = db
        .update_schema(
            &common::schema(
                r#"{"users": {"email": {}, "name": {"null": false}}, "posts": {"title": {}}}"#,
            ),
            SyncOptions::new().force(true),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Statement { .. }));
    assert_eq!(
        err.sql(),
        Some("ALTER TABLE users ADD COLUMN name VARCHAR(128) NOT NULL")
    );
    assert!(db.last_error().is_some());
    // nothing after the failing statement ran
    assert_eq!(db.tables().await.unwrap(), vec!["users"]);
    assert_eq!(column_names(&mut db, "users").await, vec!["id", "created_at", "updated_at", "email"]);
}
