use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use recsync_api::{BoxFuture, Record, RecordError, RecordStore};

// ═══════════════════════════════════════════════════════════════
//  Schema
// ═══════════════════════════════════════════════════════════════

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)";

/// DB-facing row shape, kept separate from the domain `Record`.
#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    name: String,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record { id: row.id, name: row.name }
    }
}

// ═══════════════════════════════════════════════════════════════
//  SqliteStore
// ═══════════════════════════════════════════════════════════════

/// SQLite-backed store gateway. Sole owner of the connection pool;
/// all SQL is runtime-checked and parameterized.
///
/// `acquire_timeout` bounds every operation's wait for a connection so
/// a wedged store surfaces `RecordError::Store` instead of hanging the
/// request.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, RecordError> {
        let options = SqliteConnectOptions::from_str(url).map_err(RecordError::store)?;

        // An in-memory database exists per connection; the pool must
        // not grow past one or each handle sees a different database.
        let memory = url.contains(":memory:");
        let max_connections = if memory { 1 } else { max_connections };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout);
        if memory {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(RecordError::store)?;
        tracing::debug!(url, max_connections, "store pool connected");
        Ok(Self { pool })
    }

    /// Create the `records` table if absent. No migration tooling.
    pub async fn init_schema(&self) -> Result<(), RecordError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(RecordError::store)?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn list(&self) -> BoxFuture<'_, Result<Vec<Record>, RecordError>> {
        Box::pin(async move {
            let rows: Vec<RecordRow> =
                sqlx::query_as("SELECT id, name FROM records ORDER BY id")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RecordError::store)?;
            Ok(rows.into_iter().map(Record::from).collect())
        })
    }

    fn create(&self, name: &str) -> BoxFuture<'_, Result<Record, RecordError>> {
        let name = name.to_string();
        Box::pin(async move {
            let result = sqlx::query("INSERT INTO records (name) VALUES (?1)")
                .bind(&name)
                .execute(&self.pool)
                .await
                .map_err(RecordError::store)?;
            Ok(Record { id: result.last_insert_rowid(), name })
        })
    }

    fn update(&self, id: i64, name: &str) -> BoxFuture<'_, Result<Record, RecordError>> {
        let name = name.to_string();
        Box::pin(async move {
            let result = sqlx::query("UPDATE records SET name = ?1 WHERE id = ?2")
                .bind(&name)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(RecordError::store)?;
            if result.rows_affected() == 0 {
                return Err(RecordError::NotFound(id));
            }
            Ok(Record { id, name })
        })
    }

    fn delete(&self, id: i64) -> BoxFuture<'_, Result<i64, RecordError>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM records WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(RecordError::store)?;
            if result.rows_affected() == 0 {
                return Err(RecordError::NotFound(id));
            }
            Ok(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:", 5, Duration::from_secs(5))
            .await
            .unwrap();
        store.init_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_then_list_contains_record_with_fresh_id() {
        let store = memory_store().await;
        let created = store.create("Alice").await.unwrap();
        assert_eq!(created.name, "Alice");

        let records = store.list().await.unwrap();
        assert_eq!(records, vec![created.clone()]);

        let second = store.create("Bob").await.unwrap();
        assert_ne!(second.id, created.id);
    }

    #[tokio::test]
    async fn update_renames_existing_record() {
        let store = memory_store().await;
        let created = store.create("Alice").await.unwrap();

        let updated = store.update(created.id, "Alicia").await.unwrap();
        assert_eq!(updated, Record { id: created.id, name: "Alicia".into() });
        assert_eq!(store.list().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn update_absent_id_is_not_found() {
        let store = memory_store().await;
        assert_eq!(
            store.update(999, "ghost").await,
            Err(RecordError::NotFound(999))
        );
    }

    #[tokio::test]
    async fn delete_removes_record_from_list() {
        let store = memory_store().await;
        let a = store.create("Alice").await.unwrap();
        let b = store.create("Bob").await.unwrap();

        assert_eq!(store.delete(a.id).await.unwrap(), a.id);
        assert_eq!(store.list().await.unwrap(), vec![b]);
        assert_eq!(store.delete(a.id).await, Err(RecordError::NotFound(a.id)));
    }

    #[tokio::test]
    async fn ids_are_never_reused_after_delete() {
        let store = memory_store().await;
        let a = store.create("Alice").await.unwrap();
        store.delete(a.id).await.unwrap();

        let b = store.create("Bob").await.unwrap();
        assert!(b.id > a.id);
    }
}
