//! SQLite storage backend for sync-daemon.

use super::{column_value, sql_type, ColumnValue};
use crate::error::StorageError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use sync_client::{Store, StoreError};
use sync_types::{LocalId, ResolvedRecord, ResourceDescriptor, ResourceType, Sid};
use tracing::debug;

/// SQLite-based record store.
///
/// Uses WAL mode for concurrent reads/writes. Every table has an
/// autoincrement `id`, a unique natural-key column, one column per
/// descriptor field, and one foreign-key column per dependency.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path) -> Result<Self, StorageError> {
        let path_str = path.to_str().ok_or_else(|| StorageError::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let options = SqliteConnectOptions::from_str(path_str)
            .map_err(StorageError::Database)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create one table per resource type.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        for resource_type in ResourceType::ALL {
            let descriptor = resource_type.descriptor();
            sqlx::query(&create_table_sql(descriptor))
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Migration(format!("{}: {e}", descriptor.table)))?;

            for dep in descriptor.dependencies {
                sqlx::query(&format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                    quote(&format!("idx_{}_{}", descriptor.table, dep.local_key)),
                    quote(descriptor.table),
                    quote(dep.local_key),
                ))
                .execute(&self.pool)
                .await
                .map_err(StorageError::Database)?;
            }
        }
        Ok(())
    }

    /// Number of stored records of `resource_type`.
    pub async fn count(&self, resource_type: ResourceType) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(resource_type.descriptor().table));
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        Ok(count as u64)
    }

    async fn lookup(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<Option<LocalId>, sqlx::Error> {
        let descriptor = resource_type.descriptor();
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1",
            quote(descriptor.table),
            quote(descriptor.natural_key)
        );
        let id: Option<i64> = sqlx::query_scalar(&sql)
            .bind(sid.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(LocalId::new))
    }
}

/// Quote an SQL identifier (`from`, `to` and `type` are reserved words).
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn create_table_sql(descriptor: &ResourceDescriptor) -> String {
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for field in descriptor.fields {
        let mut column = format!("{} {}", quote(field.name), sql_type(field.kind));
        if field.name == descriptor.natural_key {
            column.push_str(" NOT NULL UNIQUE");
        }
        columns.push(column);
    }
    for dep in descriptor.dependencies {
        columns.push(format!(
            "{} INTEGER REFERENCES {}(id)",
            quote(dep.local_key),
            quote(dep.parent.descriptor().table)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(descriptor.table),
        columns.join(",\n    ")
    )
}

fn insert_sql(descriptor: &ResourceDescriptor) -> String {
    let names: Vec<String> = descriptor
        .fields
        .iter()
        .map(|f| quote(f.name))
        .chain(descriptor.dependencies.iter().map(|d| quote(d.local_key)))
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        quote(descriptor.table),
        names.join(", "),
        placeholders.join(", ")
    )
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl Store for SqliteStore {
    async fn exists(&self, resource_type: ResourceType, sid: &Sid) -> Result<bool, StoreError> {
        Ok(self.lookup(resource_type, sid).await.map_err(backend)?.is_some())
    }

    async fn insert(&self, record: &ResolvedRecord) -> Result<LocalId, StoreError> {
        let descriptor = record.resource_type.descriptor();
        let sql = insert_sql(descriptor);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for field in descriptor.fields {
            query = match column_value(field, record.raw.get(field.name)) {
                ColumnValue::Text(v) => query.bind(v),
                ColumnValue::Integer(v) => query.bind(v),
                ColumnValue::Boolean(v) => query.bind(v),
            };
        }
        for dep in descriptor.dependencies {
            query = query.bind(record.parent_id(dep.local_key).map(|id| id.value()));
        }

        match query.fetch_one(&self.pool).await {
            Ok(id) => {
                debug!(resource_type = %record.resource_type, sid = %record.sid(), id, "Inserted record");
                Ok(LocalId::new(id))
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::ConstraintViolation {
                    resource_type: record.resource_type,
                    sid: record.sid().clone(),
                })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_id(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<Option<LocalId>, StoreError> {
        self.lookup(resource_type, sid).await.map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_client::{DependencyResolver, MockFetcher, SyncEngine};
    use sync_types::{ParentRef, RawRecord};

    fn resolved(
        resource_type: ResourceType,
        value: serde_json::Value,
        parents: Vec<ParentRef>,
    ) -> ResolvedRecord {
        ResolvedRecord {
            resource_type,
            raw: RawRecord::from_json(resource_type, value).unwrap(),
            parents,
        }
    }

    fn call(sid: &str) -> ResolvedRecord {
        resolved(
            ResourceType::Call,
            json!({
                "sid": sid,
                "from": "+15550100",
                "to": "+15550199",
                "status": "completed",
                "duration": "42",
                "start_time": "Fri, 17 Jul 2009 01:52:49 +0000",
                "price": null,
            }),
            vec![ParentRef {
                local_key: "account_id",
                parent: ResourceType::Account,
                id: None,
            }],
        )
    }

    #[test]
    fn create_table_quotes_reserved_words() {
        let sql = create_table_sql(ResourceType::Call.descriptor());
        assert!(sql.contains("\"from\" TEXT"));
        assert!(sql.contains("\"sid\" TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("\"account_id\" INTEGER REFERENCES \"accounts\"(id)"));
    }

    #[test]
    fn insert_sql_binds_every_column() {
        let descriptor = ResourceType::Recording.descriptor();
        let sql = insert_sql(descriptor);
        let expected = descriptor.fields.len() + descriptor.dependencies.len();
        assert!(sql.contains(&format!("?{expected})")));
        assert!(sql.ends_with("RETURNING id"));
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = SqliteStore::in_memory().await.unwrap();

        let id = store.insert(&call("CA1")).await.unwrap();

        let sid = Sid::new("CA1");
        assert!(store.exists(ResourceType::Call, &sid).await.unwrap());
        assert_eq!(store.find_id(ResourceType::Call, &sid).await.unwrap(), Some(id));
        assert!(!store.exists(ResourceType::Recording, &sid).await.unwrap());
        assert_eq!(store.count(ResourceType::Call).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn columns_are_typed_and_normalized() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert(&call("CA1")).await.unwrap();

        let (duration, start, from, price): (Option<i64>, Option<String>, Option<String>, Option<String>) =
            sqlx::query_as(
                "SELECT \"duration\", \"start_time\", \"from\", \"price\" FROM \"calls\" WHERE \"sid\" = 'CA1'",
            )
            .fetch_one(&store.pool)
            .await
            .unwrap();

        assert_eq!(duration, Some(42));
        assert_eq!(start.as_deref(), Some("2009-07-17 01:52:49"));
        assert_eq!(from.as_deref(), Some("+15550100"));
        assert_eq!(price, None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_constraint_violation() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert(&call("CA1")).await.unwrap();

        let result = store.insert(&call("CA1")).await;

        assert!(matches!(
            result,
            Err(StoreError::ConstraintViolation { .. })
        ));
        assert_eq!(store.count(ResourceType::Call).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn child_row_links_parent_id() {
        let store = SqliteStore::in_memory().await.unwrap();
        let call_id = store.insert(&call("CA1")).await.unwrap();

        let recording = RawRecord::from_json(
            ResourceType::Recording,
            json!({"sid": "RE1", "call_sid": "CA1", "duration": "3"}),
        )
        .unwrap();
        let resolved = DependencyResolver::new(&store)
            .resolve(ResourceType::Recording, &recording)
            .await
            .unwrap();
        store.insert(&resolved).await.unwrap();

        let linked: Option<i64> =
            sqlx::query_scalar("SELECT \"call_id\" FROM \"recordings\" WHERE \"sid\" = 'RE1'")
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(linked, Some(call_id.value()));
    }

    #[tokio::test]
    async fn unknown_parent_id_is_rejected_by_foreign_key() {
        let store = SqliteStore::in_memory().await.unwrap();
        let orphan = resolved(
            ResourceType::Recording,
            json!({"sid": "RE1", "call_sid": "CA404"}),
            vec![ParentRef {
                local_key: "call_id",
                parent: ResourceType::Call,
                id: Some(LocalId::new(999)),
            }],
        );

        let result = store.insert(&orphan).await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.run_migrations().await.unwrap();
        store.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twilio.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            store.insert(&call("CA1")).await.unwrap();
            store.pool.close().await;
        }

        let store = SqliteStore::new(&path).await.unwrap();
        assert!(store
            .exists(ResourceType::Call, &Sid::new("CA1"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn engine_cycle_against_sqlite() {
        let fetcher = MockFetcher::new(2);
        fetcher.push(
            ResourceType::Account,
            RawRecord::from_json(ResourceType::Account, json!({"sid": "AC1"})).unwrap(),
        );
        for i in 0..3 {
            fetcher.push(
                ResourceType::Call,
                RawRecord::from_json(
                    ResourceType::Call,
                    json!({"sid": format!("CA{i}"), "account_sid": "AC1", "status": "completed"}),
                )
                .unwrap(),
            );
        }
        let store = SqliteStore::in_memory().await.unwrap();
        let mut engine = SyncEngine::new(
            fetcher,
            store.clone(),
            &[ResourceType::Account, ResourceType::Call],
        )
        .unwrap();

        engine.run_cycle().await;
        let report = engine.run_cycle().await;

        assert_eq!(report.inserted(), 0);
        assert_eq!(store.count(ResourceType::Call).await.unwrap(), 3);
        assert_eq!(store.count(ResourceType::Account).await.unwrap(), 1);
    }
}
