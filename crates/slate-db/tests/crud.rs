//! CRUD operations against an in-memory SQLite database.

mod common;

use common::{memory_db, synced_db};
use serde_json::json;
use slate_db::prelude::*;
use slate_sql_core::BuildError;

const USERS: &str = r#"{"users": {"name": {"type": "VARCHAR(64)"}}}"#;

const PEOPLE: &str = r#"{
    "people": {
        "name":  {"type": "VARCHAR(64)", "null": false, "default": ""},
        "age":   {"type": "INT", "default": 0},
        "score": {"type": "FLOAT"},
        "team":  {"type": "VARCHAR(16)"}
    }
}"#;

async fn people() -> Database<SqliteBackend> {
    let mut db = synced_db(PEOPLE).await;
    for (id, name, age, score, team) in [
        ("p1", "Ada", 36, 9.5, "red"),
        ("p2", "Grace", 45, 8.0, "blue"),
        ("p3", "Linus", 17, 7.5, "red"),
        ("p4", "Barbara", 52, 6.0, "blue"),
        ("p5", "Ken", 12, 5.5, "green"),
    ] {
        db.insert(
            "people",
            Values::new()
                .set("id", id)
                .set("name", name)
                .set("age", age)
                .set("score", score)
                .set("team", team),
        )
        .await
        .unwrap();
    }
    db
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn users_scenario() {
    let mut db = memory_db().await;

    let log = common::forced(&mut db, USERS).await;
    assert!(!log.is_empty());
    assert_eq!(
        common::column_names(&mut db, "users").await,
        vec!["id", "created_at", "updated_at", "name"]
    );

    let missing = db
        .get("users", &["*"], &Where::new().eq("id", "nonexistent"))
        .await
        .unwrap();
    assert!(missing.is_none());

    let id = db
        .insert("users", Values::new().set("name", "Ada"))
        .await
        .unwrap();
    assert!(!id.is_empty());

    let ada = db
        .get("users", &["*"], &Where::new().eq("name", "Ada"))
        .await
        .unwrap()
        .expect("inserted row is found");
    assert_eq!(ada.id(), Some(id));
    assert_eq!(ada.text("name"), Some("Ada"));
    assert!(ada.timestamp("created_at").is_some());
}

// =============================================================================
// Insert
// =============================================================================

#[tokio::test]
async fn generated_ids_are_unique() {
    let mut db = synced_db(USERS).await;
    let first = db.insert("users", Values::new().set("name", "x")).await.unwrap();
    let second = db.insert("users", Values::new().set("name", "x")).await.unwrap();
    assert!(!first.is_empty());
    assert_ne!(first, second);
    assert_eq!(db.count("users", &Where::new()).await.unwrap(), Some(2));
}

#[tokio::test]
async fn caller_supplied_id_is_kept() {
    let mut db = synced_db(USERS).await;
    let id = db
        .insert("users", Values::new().set("id", "u-1").set("name", "x"))
        .await
        .unwrap();
    assert_eq!(id, "u-1");
    assert!(db.last_query().unwrap().starts_with("INSERT INTO users (id, name)"));
}

#[tokio::test]
async fn hostile_values_round_trip() {
    let mut db = synced_db(USERS).await;
    let name = "Robert'); DROP TABLE users; --";
    let id = db.insert("users", Values::new().set("name", name)).await.unwrap();

    let row = db
        .get("users", &["name"], &Where::new().eq("id", id.as_str()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.text("name"), Some(name));
    assert_eq!(db.tables().await.unwrap(), vec!["users"]);
}

#[tokio::test]
async fn non_scalar_values_never_reach_the_database() {
    let mut db = synced_db(USERS).await;
    let before = db.last_query().map(str::to_string);

    let err = Values::from_json(&json!({"name": "x", "active": true})).unwrap_err();
    assert!(matches!(err, BuildError::ValueShape(_)));
    let err = Where::from_json(&json!({"name": {"nested": 1}}))
        .and_then(|w| w.to_sql(&slate_sql_core::SqliteDialect))
        .unwrap_err();
    assert!(matches!(err, BuildError::ValueShape(_)));

    let err = db
        .update("users", &Values::new(), &Where::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Build(BuildError::ValueShape(_))));
    assert_eq!(db.last_query().map(str::to_string), before);
}

// =============================================================================
// Select
// =============================================================================

#[tokio::test]
async fn select_defaults_to_newest_first() {
    let mut db = people().await;
    let rows = db
        .select(&QuerySpec::new("people").columns(["id"]))
        .await
        .unwrap();
    let ids: Vec<String> = rows.iter().filter_map(Record::id).collect();
    assert_eq!(ids, vec!["p5", "p4", "p3", "p2", "p1"]);
    assert_eq!(db.last_total(), Some(5));
}

#[tokio::test]
async fn limited_select_reports_unlimited_total() {
    let mut db = people().await;
    let query = QuerySpec::new("people")
        .columns(["name", "age"])
        .filter(Where::new().eq("age[>=]", 18))
        .order_by("age", Direction::Asc)
        .limit(Limit::Count(2));
    let rows = db.select(&query).await.unwrap();

    let names: Vec<&str> = rows.iter().filter_map(|r| r.text("name")).collect();
    assert_eq!(names, vec!["Ada", "Grace"]);
    assert_eq!(rows[0].int("age"), Some(36));
    assert_eq!(db.last_total(), Some(3));
    assert_eq!(
        db.last_query(),
        Some("SELECT name, age FROM people WHERE age >= 18 ORDER BY age ASC LIMIT 2")
    );
}

#[tokio::test]
async fn first_row_honours_order_and_reports_total() {
    let mut db = people().await;
    let oldest = db
        .first(
            QuerySpec::new("people")
                .columns(["name"])
                .filter(Where::new().eq("team", "blue"))
                .order_by("age", Direction::Desc),
        )
        .await
        .unwrap()
        .expect("blue team is not empty");
    assert_eq!(oldest.text("name"), Some("Barbara"));
    assert_eq!(db.last_total(), Some(2));
    assert_eq!(
        db.last_query(),
        Some("SELECT name FROM people WHERE team = 'blue' ORDER BY age DESC LIMIT 1")
    );

    let ken = db
        .get("people", &["name"], &Where::new().eq("team", "green"))
        .await
        .unwrap();
    assert_eq!(ken.and_then(|r| r.text("name").map(str::to_string)).as_deref(), Some("Ken"));
    assert_eq!(db.last_total(), Some(1));
    assert_eq!(
        db.last_query(),
        Some("SELECT name FROM people WHERE team = 'green' LIMIT 1")
    );

    let none = db
        .get("people", &["name"], &Where::new().eq("team", "black"))
        .await
        .unwrap();
    assert!(none.is_none());
    assert_eq!(db.last_total(), Some(0));
}

#[tokio::test]
async fn offset_limit_pages_through() {
    let mut db = people().await;
    let query = QuerySpec::new("people")
        .columns(["id"])
        .order_by("id", Direction::Asc)
        .limit(Limit::Range {
            offset: 2,
            count: 2,
        });
    let rows = db.select(&query).await.unwrap();
    let ids: Vec<String> = rows.iter().filter_map(Record::id).collect();
    assert_eq!(ids, vec!["p3", "p4"]);
    assert_eq!(db.last_total(), Some(5));
}

#[tokio::test]
async fn json_filters_with_groups() {
    let mut db = people().await;
    let filter = Where::from_json(&json!({
        "team": ["red", "blue"],
        "OR": {"age[<]": 20, "name[~]": "ace"}
    }))
    .unwrap();
    let rows = db
        .select(&QuerySpec::new("people").columns(["name"]).filter(filter).order_by("name", Direction::Asc))
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().filter_map(|r| r.text("name")).collect();
    assert_eq!(names, vec!["Grace", "Linus"]);
}

#[tokio::test]
async fn grouped_aggregates() {
    let mut db = people().await;
    let rows = db
        .select(
            &QuerySpec::new("people")
                .columns(["team", "COUNT(*) AS members", "MAX(age) AS oldest"])
                .group_by(["team"])
                .order_by("team", Direction::Asc),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].text("team"), Some("blue"));
    assert_eq!(rows[0].int("members"), Some(2));
    assert_eq!(rows[0].int("oldest"), Some(52));
}

// =============================================================================
// Aggregates
// =============================================================================

#[tokio::test]
async fn count_sum_and_has() {
    let mut db = people().await;
    let red = Where::new().eq("team", "red");
    assert_eq!(db.count("people", &red).await.unwrap(), Some(2));
    assert_eq!(db.sum("people", "score", &red).await.unwrap(), Some(17.0));
    assert_eq!(db.sum("people", "age", &red).await.unwrap(), Some(53.0));
    assert_eq!(db.has("people", &red).await.unwrap(), Some(true));

    let nobody = Where::new().eq("team", "purple");
    assert_eq!(db.count("people", &nobody).await.unwrap(), Some(0));
    assert_eq!(db.sum("people", "score", &nobody).await.unwrap(), None);
    assert_eq!(db.has("people", &nobody).await.unwrap(), Some(false));
}

// =============================================================================
// Update / delete / truncate
// =============================================================================

#[tokio::test]
async fn update_and_delete_report_affected_rows() {
    let mut db = people().await;
    let updated = db
        .update(
            "people",
            &Values::new().set("team", "gold"),
            &Where::new().eq("age[>]", 40),
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);
    assert_eq!(
        db.count("people", &Where::new().eq("team", "gold")).await.unwrap(),
        Some(2)
    );

    let deleted = db
        .delete("people", &Where::new().any_of("id", ["p1", "p5", "missing"]))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(db.count("people", &Where::new()).await.unwrap(), Some(3));
}

#[tokio::test]
async fn null_sentinel_clears_a_value() {
    let mut db = people().await;
    db.update(
        "people",
        &Values::new().set("team", "NULL"),
        &Where::new().eq("id", "p1"),
    )
    .await
    .unwrap();
    let row = db
        .get("people", &["team"], &Where::new().eq("id", "p1"))
        .await
        .unwrap()
        .unwrap();
    assert!(row.contains("team"));
    assert_eq!(row.get("team"), None);
}

#[tokio::test]
async fn truncate_empties_table() {
    let mut db = people().await;
    db.truncate("people").await.unwrap();
    assert_eq!(db.count("people", &Where::new()).await.unwrap(), Some(0));
    assert_eq!(db.last_query(), Some("SELECT COUNT(*) AS total FROM people"));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[tokio::test]
async fn statement_errors_are_recorded() {
    let mut db = memory_db().await;
    let err = db.query("SELECT * FROM nowhere").await.unwrap_err();

    assert!(matches!(err, DbError::Statement { .. }));
    assert_eq!(err.sql(), Some("SELECT * FROM nowhere"));
    assert!(!err.is_connectivity());
    assert!(db.last_error().unwrap().contains("no such table"));
    assert_eq!(db.last_query(), Some("SELECT * FROM nowhere"));
    assert!(db.is_connected());
}

#[tokio::test]
async fn success_clears_the_last_error() {
    let mut db = memory_db().await;
    db.query("SELECT * FROM nowhere").await.unwrap_err();
    assert!(db.last_error().is_some());

    let rows = db.query("SELECT 1 AS one").await.unwrap();
    assert_eq!(rows[0].int("one"), Some(1));
    assert_eq!(db.last_error(), None);

    db.execute("DELETE FROM nowhere").await.unwrap_err();
    assert!(db.last_error().is_some());
    db.tables().await.unwrap();
    assert_eq!(db.last_error(), None);
}

#[tokio::test]
async fn catalog_reads_are_recorded() {
    let mut db = synced_db(USERS).await;

    assert_eq!(db.tables().await.unwrap(), vec!["users"]);
    assert_eq!(db.last_query(), Some(SqliteBackend::TABLES_SQL));

    db.describe("users").await.unwrap();
    assert_eq!(db.last_query(), Some("PRAGMA table_info(users)"));

    let err = db.describe("").await.unwrap_err();
    assert!(matches!(err, DbError::Build(BuildError::EmptyIdentifier(_))));
}

#[tokio::test]
async fn connects_lazily() {
    let mut db = Database::<SqliteBackend>::with_config(DbConfig::sqlite(":memory:").unwrap());
    assert!(!db.is_connected());
    assert!(db.tables().await.unwrap().is_empty());
    assert!(db.is_connected());

    db.disconnect();
    assert!(!db.is_connected());
}

#[tokio::test]
async fn file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slate.db");
    let config = DbConfig::sqlite(path.to_string_lossy()).unwrap();

    let mut db = Database::<SqliteBackend>::with_config(config.clone());
    common::forced(&mut db, USERS).await;
    db.insert("users", Values::new().set("name", "Ada")).await.unwrap();
    drop(db);

    let mut db = Database::<SqliteBackend>::with_config(config);
    assert_eq!(db.count("users", &Where::new()).await.unwrap(), Some(1));
}
