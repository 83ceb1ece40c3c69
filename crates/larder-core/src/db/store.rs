//! Local record store used by the app and the sync engine

use std::path::Path;
use std::sync::Arc;

use libsql::{params, Connection};
use tokio::sync::Mutex;

use super::settings_repository::{LibSqlSettingsRepository, SettingsRepository};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{
    GroceryItem, GroceryList, Ingredient, MealPlan, Recipe, SyncData, SyncRecord, SyncSettings,
    SNAPSHOT_VERSION,
};
use crate::util::next_write_time;

const LAST_MODIFIED_KEY: &str = "lastModified";

/// Storage the sync engine reads snapshots from and commits merges into.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    /// Every record of one collection, tombstones included
    async fn read_all<R: SyncRecord>(&self) -> Result<Vec<R>>;

    /// Local high-water mark of `updated_at`
    async fn read_last_modified(&self) -> Result<i64>;

    /// Atomically write a merged snapshot and advance `lastModified` to
    /// `max(current, merged.last_modified)`. Returns the new value.
    ///
    /// Either every collection and the metadata are written, or nothing is.
    async fn commit(&self, merged: &SyncData) -> Result<i64>;

    /// Read all five collections plus `lastModified`
    async fn read_snapshot(&self) -> Result<SyncData> {
        Ok(SyncData {
            recipes: self.read_all::<Recipe>().await?,
            meal_plans: self.read_all::<MealPlan>().await?,
            ingredients: self.read_all::<Ingredient>().await?,
            grocery_lists: self.read_all::<GroceryList>().await?,
            grocery_items: self.read_all::<GroceryItem>().await?,
            last_modified: self.read_last_modified().await?,
            version: SNAPSHOT_VERSION,
        })
    }
}

/// Persistence for the user's sync target and last sync result.
#[allow(async_fn_in_trait)]
pub trait SyncSettingsStore {
    async fn load_sync_settings(&self) -> Result<SyncSettings>;

    async fn save_sync_settings(&self, settings: &SyncSettings) -> Result<()>;
}

/// Thread-safe libSQL-backed store.
///
/// Clones share one connection; every operation holds the lock for its whole
/// duration, so a sync commit never interleaves with a record write.
#[derive(Clone)]
pub struct LibSqlStore {
    db: Arc<Mutex<Database>>,
}

impl LibSqlStore {
    /// Open (or create) a store at the given filesystem path.
    pub async fn open_path(db_path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(db_path).await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Insert or overwrite a record, advancing `lastModified` if needed.
    pub async fn save<R: SyncRecord>(&self, record: &R) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();
        in_transaction(conn, || async {
            upsert_record(conn, record, false).await?;
            bump_last_modified(conn, record.updated_at()).await?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Fetch a live record by id
    pub async fn get<R: SyncRecord>(&self, id: &str) -> Result<Option<R>> {
        let db = self.db.lock().await;
        Ok(find_record::<R>(db.connection(), id)
            .await?
            .filter(|record| !record.is_deleted()))
    }

    /// List live records, most recently updated first
    pub async fn list<R: SyncRecord>(&self) -> Result<Vec<R>> {
        let db = self.db.lock().await;
        let sql = format!(
            "SELECT body FROM {} WHERE is_deleted = 0 ORDER BY updated_at DESC",
            R::COLLECTION.table_name()
        );
        query_records(db.connection(), &sql).await
    }

    /// Turn a record into a tombstone so the deletion syncs
    pub async fn soft_delete<R: SyncRecord>(&self, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let mut record = find_record::<R>(conn, id)
            .await?
            .filter(|record| !record.is_deleted())
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        record.mark_deleted(next_write_time(record.updated_at()));
        in_transaction(conn, || async {
            upsert_record(conn, &record, false).await?;
            bump_last_modified(conn, record.updated_at()).await?;
            Ok(())
        })
        .await?;
        tracing::debug!("Soft-deleted {} {id}", R::COLLECTION.table_name());
        Ok(())
    }
}

impl LocalStore for LibSqlStore {
    async fn read_all<R: SyncRecord>(&self) -> Result<Vec<R>> {
        let db = self.db.lock().await;
        let sql = format!("SELECT body FROM {}", R::COLLECTION.table_name());
        query_records(db.connection(), &sql).await
    }

    async fn read_last_modified(&self) -> Result<i64> {
        let db = self.db.lock().await;
        read_last_modified(db.connection()).await
    }

    async fn commit(&self, merged: &SyncData) -> Result<i64> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let last_modified = in_transaction(conn, || async {
            write_collection(conn, &merged.recipes).await?;
            write_collection(conn, &merged.meal_plans).await?;
            write_collection(conn, &merged.ingredients).await?;
            write_collection(conn, &merged.grocery_lists).await?;
            write_collection(conn, &merged.grocery_items).await?;
            bump_last_modified(conn, merged.last_modified).await
        })
        .await?;

        tracing::info!(
            "Committed {} records ({} tombstones), lastModified = {last_modified}",
            merged.record_count(),
            merged.tombstone_count()
        );
        Ok(last_modified)
    }
}

impl SyncSettingsStore for LibSqlStore {
    async fn load_sync_settings(&self) -> Result<SyncSettings> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection()).load().await
    }

    async fn save_sync_settings(&self, settings: &SyncSettings) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection())
            .save(settings)
            .await
    }
}

/// Run `body` inside `BEGIN IMMEDIATE` / `COMMIT`, rolling back on failure.
async fn in_transaction<T, F, Fut>(conn: &Connection, body: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    conn.execute("BEGIN IMMEDIATE", ()).await?;

    let value = match body().await {
        Ok(value) => value,
        Err(e) => {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }
    };

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(value)
}

/// Write merged records, never overwriting a row that was updated more
/// recently than the incoming record (a local edit made while the sync was
/// in flight). Rows absent from `records` are left in place.
async fn write_collection<R: SyncRecord>(conn: &Connection, records: &[R]) -> Result<()> {
    for record in records {
        upsert_record(conn, record, true).await?;
    }
    Ok(())
}

async fn upsert_record<R: SyncRecord>(conn: &Connection, record: &R, keep_newer: bool) -> Result<()> {
    let table = R::COLLECTION.table_name();
    let guard = if keep_newer {
        format!(" WHERE excluded.updated_at >= {table}.updated_at")
    } else {
        String::new()
    };
    let sql = format!(
        "INSERT INTO {table} (id, updated_at, is_deleted, body) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             updated_at = excluded.updated_at,
             is_deleted = excluded.is_deleted,
             body = excluded.body{guard}"
    );
    let body = serde_json::to_string(record)?;

    conn.execute(
        &sql,
        params![
            record.id().to_string(),
            record.updated_at(),
            i32::from(record.is_deleted()),
            body
        ],
    )
    .await?;
    Ok(())
}

async fn find_record<R: SyncRecord>(conn: &Connection, id: &str) -> Result<Option<R>> {
    let sql = format!(
        "SELECT body FROM {} WHERE id = ?1",
        R::COLLECTION.table_name()
    );
    let mut rows = conn.query(&sql, [id]).await?;
    match rows.next().await? {
        Some(row) => {
            let body: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&body)?))
        }
        None => Ok(None),
    }
}

async fn query_records<R: SyncRecord>(conn: &Connection, sql: &str) -> Result<Vec<R>> {
    let mut rows = conn.query(sql, ()).await?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        let body: String = row.get(0)?;
        records.push(serde_json::from_str(&body)?);
    }
    Ok(records)
}

async fn read_last_modified(conn: &Connection) -> Result<i64> {
    let mut rows = conn
        .query(
            "SELECT value FROM sync_metadata WHERE key = ?1",
            [LAST_MODIFIED_KEY],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

/// Raise `lastModified` to at least `candidate`; returns the stored value.
async fn bump_last_modified(conn: &Connection, candidate: i64) -> Result<i64> {
    let current = read_last_modified(conn).await?;
    let next = current.max(candidate);
    if next != current {
        conn.execute(
            "INSERT OR REPLACE INTO sync_metadata (key, value) VALUES (?1, ?2)",
            params![LAST_MODIFIED_KEY, next],
        )
        .await?;
    }
    Ok(next)
}
