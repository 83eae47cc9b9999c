//! SQLite Storage Implementation
//!
//! Durable item store with a separate writer and reader connection.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use super::{check_successor, ItemStore, Result, StorageError};
use crate::fsrs::Grade;
use crate::item::{Item, ItemFilter, ItemId, ItemKind, NewItem, RatingEvent, MAX_PRIORITY};

const ITEM_COLUMNS: &str = "id, title, kind, priority, category_id, favorite, created_at, \
     last_reviewed_at, next_due_at, review_count, stability, difficulty";

const EVENT_COLUMNS: &str = "id, item_id, raw_rating, grade, timestamp, elapsed_days, \
     retrievability, resulting_interval_days, resulting_next_due_at, stability_after, \
     difficulty_after";

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed [`ItemStore`]
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, making the store `Send + Sync` so hosts can
/// share it as `Arc<SqliteItemStore>`.
pub struct SqliteItemStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteItemStore").field("path", &self.path).finish()
    }
}

impl SqliteItemStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("LECTERN_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "lectern", "lectern").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("lectern.db"))
    }

    /// Open (or create) a store, applying pending migrations
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(parent, perms);
                }
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        tracing::debug!(path = %path.display(), "Opened item store");

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Database file location
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Number of stored items
    pub fn count_items(&self) -> Result<usize> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let count: i64 = reader.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Fixed-width RFC3339 so text comparison matches time order
    fn format_timestamp(value: DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Format a timestamp for writing, rejecting years that RFC 3339 text
    /// cannot carry (they would make the row unreadable)
    fn storable_timestamp(value: DateTime<Utc>, field_name: &str) -> Result<String> {
        if !(0..=9999).contains(&value.year()) {
            return Err(StorageError::Validation(format!(
                "{} {} is outside the storable range (years 0000-9999)",
                field_name,
                value.to_rfc3339()
            )));
        }
        Ok(Self::format_timestamp(value))
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(StorageError::InvalidTimestamp(format!(
                        "Invalid {} timestamp '{}': {}",
                        field_name, value, e
                    ))),
                )
            })
    }

    fn parse_optional_timestamp(
        value: Option<String>,
        field_name: &str,
    ) -> rusqlite::Result<Option<DateTime<Utc>>> {
        value
            .map(|s| Self::parse_timestamp(&s, field_name))
            .transpose()
    }

    /// Convert a row to Item
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let kind: String = row.get("kind")?;
        let priority: i64 = row.get("priority")?;
        let review_count: i64 = row.get("review_count")?;
        let created_at: String = row.get("created_at")?;

        Ok(Item {
            id: row.get("id")?,
            title: row.get("title")?,
            kind: ItemKind::parse_name(&kind),
            priority: priority.clamp(0, i64::from(MAX_PRIORITY)) as u8,
            category_id: row.get("category_id")?,
            favorite: row.get("favorite")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            last_reviewed_at: Self::parse_optional_timestamp(
                row.get("last_reviewed_at")?,
                "last_reviewed_at",
            )?,
            next_due_at: Self::parse_optional_timestamp(row.get("next_due_at")?, "next_due_at")?,
            review_count: review_count.max(0) as u32,
            stability: row.get("stability")?,
            difficulty: row.get("difficulty")?,
        })
    }

    /// Convert a row to RatingEvent
    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<RatingEvent> {
        let id: String = row.get("id")?;
        let grade: u8 = row.get("grade")?;
        let timestamp: String = row.get("timestamp")?;
        let resulting_next_due_at: String = row.get("resulting_next_due_at")?;

        let conversion = |e: Box<dyn std::error::Error + Send + Sync>| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e)
        };

        Ok(RatingEvent {
            id: Uuid::parse_str(&id).map_err(|e| conversion(Box::new(e)))?,
            item_id: row.get("item_id")?,
            raw_rating: row.get("raw_rating")?,
            grade: Grade::try_from(grade).map_err(|e| conversion(Box::new(e)))?,
            timestamp: Self::parse_timestamp(&timestamp, "timestamp")?,
            elapsed_days: row.get("elapsed_days")?,
            retrievability: row.get("retrievability")?,
            resulting_interval_days: row.get("resulting_interval_days")?,
            resulting_next_due_at: Self::parse_timestamp(
                &resulting_next_due_at,
                "resulting_next_due_at",
            )?,
            stability_after: row.get("stability_after")?,
            difficulty_after: row.get("difficulty_after")?,
        })
    }

    fn get_item_with(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS))?;
        let item = stmt
            .query_row(params![id], |row| Self::row_to_item(row))
            .optional()?;
        Ok(item)
    }

    /// WHERE clause and bound values for a filter
    fn filter_clause(filter: &ItemFilter) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(category_id) = filter.category_id {
            values.push(Value::Integer(category_id));
            conditions.push(format!("category_id = ?{}", values.len()));
        }
        if let Some(kind) = filter.kind {
            values.push(Value::Text(kind.as_str().to_string()));
            conditions.push(format!("kind = ?{}", values.len()));
        }
        if filter.favorites_only {
            conditions.push("favorite = 1".to_string());
        }
        if let Some(now) = filter.due_at {
            values.push(Value::Text(Self::format_timestamp(now)));
            conditions.push(format!(
                "(next_due_at IS NULL OR next_due_at <= ?{})",
                values.len()
            ));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, values)
    }

    fn update_item_field(&self, id: ItemId, sql: &str, value: Value) -> Result<Item> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let changed = writer.execute(sql, params![value, id])?;
        if changed == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Self::get_item_with(&writer, id)?.ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

// ============================================================================
// ITEM STORE
// ============================================================================

impl ItemStore for SqliteItemStore {
    fn load_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let (clause, mut values) = Self::filter_clause(filter);
        let mut sql = format!("SELECT {} FROM items{} ORDER BY id", ITEM_COLUMNS, clause);
        if let Some(limit) = filter.limit {
            values.push(Value::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values), |row| Self::row_to_item(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn load_item(&self, id: ItemId) -> Result<Option<Item>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        Self::get_item_with(&reader, id)
    }

    fn save_item_and_log(&self, item: &Item, event: &RatingEvent) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction()?;

        let stored = Self::get_item_with(&tx, item.id)?
            .ok_or_else(|| StorageError::NotFound(item.id.to_string()))?;
        check_successor(&stored, item, event)?;

        let last_reviewed_at = item
            .last_reviewed_at
            .map(|t| Self::storable_timestamp(t, "last_reviewed_at"))
            .transpose()?;
        let next_due_at = item
            .next_due_at
            .map(|t| Self::storable_timestamp(t, "next_due_at"))
            .transpose()?;
        let timestamp = Self::storable_timestamp(event.timestamp, "timestamp")?;
        let resulting_next_due_at =
            Self::storable_timestamp(event.resulting_next_due_at, "resulting_next_due_at")?;

        tx.execute(
            "UPDATE items SET
                last_reviewed_at = ?1,
                next_due_at = ?2,
                review_count = ?3,
                stability = ?4,
                difficulty = ?5
            WHERE id = ?6",
            params![
                last_reviewed_at,
                next_due_at,
                item.review_count,
                item.stability,
                item.difficulty,
                item.id,
            ],
        )?;

        tx.execute(
            &format!(
                "INSERT INTO rating_events ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                EVENT_COLUMNS
            ),
            params![
                event.id.to_string(),
                event.item_id,
                event.raw_rating,
                event.grade.value(),
                timestamp,
                event.elapsed_days,
                event.retrievability,
                event.resulting_interval_days,
                resulting_next_due_at,
                event.stability_after,
                event.difficulty_after,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn insert_item(&self, input: NewItem, created_at: DateTime<Utc>) -> Result<Item> {
        if input.priority > MAX_PRIORITY {
            return Err(StorageError::Validation(format!(
                "priority {} exceeds {}",
                input.priority, MAX_PRIORITY
            )));
        }

        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO items (title, kind, priority, category_id, favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.title,
                input.kind.as_str(),
                input.priority,
                input.category_id,
                input.favorite,
                Self::storable_timestamp(created_at, "created_at")?,
            ],
        )?;
        let id = writer.last_insert_rowid();

        Self::get_item_with(&writer, id)?.ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn set_priority(&self, id: ItemId, priority: u8) -> Result<Item> {
        if priority > MAX_PRIORITY {
            return Err(StorageError::Validation(format!(
                "priority {} exceeds {}",
                priority, MAX_PRIORITY
            )));
        }
        self.update_item_field(
            id,
            "UPDATE items SET priority = ?1 WHERE id = ?2",
            Value::Integer(i64::from(priority)),
        )
    }

    fn reschedule(&self, id: ItemId, next_due_at: DateTime<Utc>) -> Result<Item> {
        self.update_item_field(
            id,
            "UPDATE items SET next_due_at = ?1 WHERE id = ?2",
            Value::Text(Self::storable_timestamp(next_due_at, "next_due_at")?),
        )
    }

    fn rating_events(&self, item_id: Option<ItemId>) -> Result<Vec<RatingEvent>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let events = match item_id {
            Some(id) => {
                let mut stmt = reader.prepare(&format!(
                    "SELECT {} FROM rating_events WHERE item_id = ?1 ORDER BY timestamp, rowid",
                    EVENT_COLUMNS
                ))?;
                stmt.query_map(params![id], |row| Self::row_to_event(row))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = reader.prepare(&format!(
                    "SELECT {} FROM rating_events ORDER BY timestamp, rowid",
                    EVENT_COLUMNS
                ))?;
                stmt.query_map([], |row| Self::row_to_event(row))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(events)
    }
}

// ============================================================================
// TESTS
// ============================================================================
