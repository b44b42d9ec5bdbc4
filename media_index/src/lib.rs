//! SQLite-backed media index.

use media_source::{AccessPolicy, MediaId, MediaKind, MediaRecord, MediaSource, SourceError};
use rusqlite::{params, params_from_iter, Connection, Row};
use rusqlite_migration::{Migrations, M};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Database Error: {0}")]
    DatabaseError(String),
    #[error("Serialization Error: {0}")]
    SerializationError(String),
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Other Error: {0}")]
    Other(String),
}

#[derive(Clone)]
pub struct MediaIndex {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_RECORD: &str = "SELECT id, locator, capture_ts, width, height, is_video,
     duration_ms, is_favorite, volume
     FROM media_records";

fn apply_migrations(conn: &mut Connection) -> Result<(), IndexError> {
    let migrations = Migrations::new(vec![
        M::up(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);\
             INSERT INTO schema_version (version) VALUES (1);\
             CREATE TABLE IF NOT EXISTS media_records (\
                 id INTEGER PRIMARY KEY,\
                 locator TEXT NOT NULL,\
                 capture_ts INTEGER NOT NULL,\
                 width INTEGER NOT NULL DEFAULT 0,\
                 height INTEGER NOT NULL DEFAULT 0,\
                 is_video INTEGER NOT NULL DEFAULT 0,\
                 duration_ms INTEGER NOT NULL DEFAULT 0\
             );",
        ),
        M::up(
            "ALTER TABLE media_records ADD COLUMN is_favorite INTEGER NOT NULL DEFAULT 0;\
             UPDATE schema_version SET version = 2;",
        ),
        M::up(
            "ALTER TABLE media_records ADD COLUMN volume TEXT NOT NULL DEFAULT 'external_primary';\
             UPDATE schema_version SET version = 3;",
        ),
        M::up(
            "CREATE INDEX IF NOT EXISTS idx_media_records_capture_ts ON media_records (capture_ts);\
             CREATE INDEX IF NOT EXISTS idx_media_records_volume ON media_records (volume);\
             UPDATE schema_version SET version = 4;",
        ),
    ]);
    migrations
        .to_latest(conn)
        .map_err(|e| IndexError::DatabaseError(format!("Failed to apply migrations: {}", e)))?;
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let width: i64 = row.get(3)?;
    let height: i64 = row.get(4)?;
    let is_video: bool = row.get(5)?;
    let duration: i64 = row.get(6)?;
    Ok(MediaRecord {
        id: row.get(0)?,
        locator: row.get(1)?,
        capture_timestamp: row.get(2)?,
        width: u32::try_from(width).unwrap_or(0),
        height: u32::try_from(height).unwrap_or(0),
        kind: if is_video { MediaKind::Video } else { MediaKind::Image },
        duration_millis: u64::try_from(duration).unwrap_or(0),
        is_favorite: row.get(7)?,
        volume: row.get(8)?,
    })
}

fn insert_with(conn: &Connection, record: &MediaRecord) -> Result<(), IndexError> {
    let duration = i64::try_from(record.duration_millis)
        .map_err(|e| IndexError::SerializationError(format!("Duration out of range: {}", e)))?;
    conn.execute(
        "INSERT OR REPLACE INTO media_records (
            id, locator, capture_ts, width, height, is_video, duration_ms, is_favorite, volume
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id,
            record.locator,
            record.capture_timestamp,
            record.width,
            record.height,
            record.is_video(),
            duration,
            record.is_favorite,
            record.volume
        ],
    )
    .map_err(|e| IndexError::DatabaseError(format!("Failed to insert media record: {}", e)))?;
    Ok(())
}

impl MediaIndex {
    pub fn lock_conn(&self) -> Result<std::sync::MutexGuard<Connection>, IndexError> {
        self.conn
            .lock()
            .map_err(|_| IndexError::Other("Poisoned lock".into()))
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument)]
    pub fn new(db_path: &Path) -> Result<Self, IndexError> {
        let mut conn = Connection::open(db_path)
            .map_err(|e| IndexError::DatabaseError(format!("Failed to open database: {}", e)))?;
        apply_migrations(&mut conn)?;

        Ok(MediaIndex { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn insert_record(&self, record: &MediaRecord) -> Result<(), IndexError> {
        let conn = self.lock_conn()?;
        insert_with(&conn, record)
    }

    /// Insert all records in a single transaction.
    pub fn insert_records(&self, records: &[MediaRecord]) -> Result<(), IndexError> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| IndexError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;
        for record in records {
            insert_with(&tx, record)?;
        }
        tx.commit()
            .map_err(|e| IndexError::DatabaseError(format!("Failed to commit records: {}", e)))?;
        tracing::info!(items = records.len(), "Indexed media records");
        Ok(())
    }

    pub fn get_record(&self, id: MediaId) -> Result<Option<MediaRecord>, IndexError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_RECORD))
            .map_err(|e| IndexError::DatabaseError(format!("Failed to prepare statement: {}", e)))?;

        let mut rows = stmt
            .query(params![id])
            .map_err(|e| {
                IndexError::DatabaseError(format!("Failed to query media record: {}", e))
            })?;

        match rows
            .next()
            .map_err(|e| IndexError::DatabaseError(format!("Failed to get row: {}", e)))?
        {
            Some(row) => Ok(Some(
                record_from_row(row).map_err(|e| IndexError::DatabaseError(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn get_all_records(&self) -> Result<Vec<MediaRecord>, IndexError> {
        self.query_records(&AccessPolicy::All)
    }

    fn query_records(&self, policy: &AccessPolicy) -> Result<Vec<MediaRecord>, IndexError> {
        let start = std::time::Instant::now();
        let volumes: Vec<String> = match policy {
            AccessPolicy::Denied => return Ok(Vec::new()),
            AccessPolicy::Volumes(set) if set.is_empty() => return Ok(Vec::new()),
            AccessPolicy::Volumes(set) => set.iter().cloned().collect(),
            AccessPolicy::All => Vec::new(),
        };
        let sql = if volumes.is_empty() {
            format!("{} ORDER BY capture_ts DESC", SELECT_RECORD)
        } else {
            let placeholders = vec!["?"; volumes.len()].join(", ");
            format!(
                "{} WHERE volume IN ({}) ORDER BY capture_ts DESC",
                SELECT_RECORD, placeholders
            )
        };

        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| IndexError::DatabaseError(format!("Failed to prepare statement: {}", e)))?;
        let iter = stmt
            .query_map(params_from_iter(volumes.iter()), record_from_row)
            .map_err(|e| {
                IndexError::DatabaseError(format!("Failed to query media records: {}", e))
            })?;

        let mut items = Vec::new();
        for item in iter {
            items.push(item.map_err(|e| {
                IndexError::DatabaseError(format!(
                    "Failed to retrieve media record from iterator: {}",
                    e
                ))
            })?);
        }
        tracing::info!("index_load_time_ms" = %start.elapsed().as_millis(), "items" = items.len());
        Ok(items)
    }

    pub fn record_count(&self) -> Result<usize, IndexError> {
        let conn = self.lock_conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM media_records", [], |r| r.get(0))
            .map_err(|e| {
                IndexError::DatabaseError(format!("Failed to count media records: {}", e))
            })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Distinct volume names, sorted.
    pub fn volumes(&self) -> Result<Vec<String>, IndexError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT volume FROM media_records ORDER BY volume")
            .map_err(|e| IndexError::DatabaseError(format!("Failed to prepare statement: {}", e)))?;
        let iter = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| IndexError::DatabaseError(format!("Failed to query volumes: {}", e)))?;
        let mut volumes = Vec::new();
        for v in iter {
            volumes.push(v.map_err(|e| IndexError::DatabaseError(e.to_string()))?);
        }
        Ok(volumes)
    }

    pub fn set_favorite(&self, id: MediaId, favorite: bool) -> Result<bool, IndexError> {
        let conn = self.lock_conn()?;
        let changed = conn
            .execute(
                "UPDATE media_records SET is_favorite = ?1 WHERE id = ?2",
                params![favorite, id],
            )
            .map_err(|e| IndexError::DatabaseError(format!("Failed to update favorite: {}", e)))?;
        Ok(changed > 0)
    }

    pub fn delete_record(&self, id: MediaId) -> Result<(), IndexError> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM media_records WHERE id = ?1", params![id])
            .map_err(|e| {
                IndexError::DatabaseError(format!("Failed to delete media record: {}", e))
            })?;
        Ok(())
    }

    pub fn clear_index(&self) -> Result<(), IndexError> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM media_records", [])
            .map_err(|e| IndexError::DatabaseError(format!("Failed to clear index: {}", e)))?;
        Ok(())
    }

    pub fn export_records(&self, path: &Path) -> Result<(), IndexError> {
        let records = self.get_all_records()?;
        let data = serde_json::to_string_pretty(&records)
            .map_err(|e| IndexError::SerializationError(e.to_string()))?;
        std::fs::write(path, data).map_err(|e| IndexError::Io(e.to_string()))?;
        tracing::info!(items = records.len(), path = ?path, "Exported media records");
        Ok(())
    }

    pub fn import_records(&self, path: &Path) -> Result<usize, IndexError> {
        let data = std::fs::read_to_string(path).map_err(|e| IndexError::Io(e.to_string()))?;
        let records: Vec<MediaRecord> = serde_json::from_str(&data)
            .map_err(|e| IndexError::DeserializationError(e.to_string()))?;
        self.insert_records(&records)?;
        Ok(records.len())
    }

    pub async fn insert_records_async(&self, records: Vec<MediaRecord>) -> Result<(), IndexError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.insert_records(&records))
            .await
            .map_err(|e| IndexError::Other(e.to_string()))?
    }

    pub async fn get_all_records_async(&self) -> Result<Vec<MediaRecord>, IndexError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.get_all_records())
            .await
            .map_err(|e| IndexError::Other(e.to_string()))?
    }

    pub async fn set_favorite_async(
        &self,
        id: MediaId,
        favorite: bool,
    ) -> Result<bool, IndexError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.set_favorite(id, favorite))
            .await
            .map_err(|e| IndexError::Other(e.to_string()))?
    }
}

impl MediaSource for MediaIndex {
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn query(&self, policy: &AccessPolicy) -> Result<Vec<MediaRecord>, SourceError> {
        if *policy == AccessPolicy::Denied {
            return Err(SourceError::PermissionDenied);
        }
        self.query_records(policy).map_err(|e| {
            tracing::error!(error = %e, "Media index query failed");
            SourceError::Unavailable(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_record(id: MediaId, ts: i64) -> MediaRecord {
        MediaRecord::image(id, ts, 4032, 3024)
    }

    #[test]
    fn test_clear_index_empties_table() {
        let tmp = NamedTempFile::new().expect("create temp file");
        let index = MediaIndex::new(tmp.path()).expect("create index");

        index.insert_record(&sample_record(1, 10)).expect("insert");
        index.insert_record(&sample_record(2, 20)).expect("insert");
        assert_eq!(index.record_count().unwrap(), 2);

        index.clear_index().expect("clear index");

        let conn = Connection::open(tmp.path()).expect("open connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM media_records", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_index_new_invalid_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = MediaIndex::new(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_set_favorite() {
        let tmp = NamedTempFile::new().expect("create temp file");
        let index = MediaIndex::new(tmp.path()).expect("create index");
        index.insert_record(&sample_record(5, 10)).expect("insert");

        assert!(index.set_favorite(5, true).unwrap());
        assert!(index.get_record(5).unwrap().unwrap().is_favorite);
        assert!(!index.set_favorite(99, true).unwrap());
    }

    #[test]
    fn test_video_fields_survive_storage() {
        let tmp = NamedTempFile::new().expect("create temp file");
        let index = MediaIndex::new(tmp.path()).expect("create index");
        let clip = MediaRecord::video(3, 1_000, 1920, 1080, 90_500);
        index.insert_record(&clip).expect("insert");

        let stored = index.get_record(3).unwrap().unwrap();
        assert_eq!(stored, clip);
    }

    #[test]
    fn test_denied_policy_fails_query() {
        let tmp = NamedTempFile::new().expect("create temp file");
        let index = MediaIndex::new(tmp.path()).expect("create index");
        index.insert_record(&sample_record(1, 10)).expect("insert");
        assert_eq!(index.query(&AccessPolicy::Denied), Err(SourceError::PermissionDenied));
    }
}
