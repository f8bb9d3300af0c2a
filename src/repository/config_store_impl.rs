// ==========================================
// 面包生产线设定系统 - 配置存储实现 (SQLite)
// ==========================================
// 表: config_document（单文档，doc_id = 'blocks'）
// 语义: 整表替换写入，revision 每次保存自增
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::block::Block;
use crate::domain::config_document::ConfigDocument;
use crate::repository::config_store::ConfigurationStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

const BLOCKS_DOC_ID: &str = "blocks";

pub struct SqliteConfigurationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConfigurationStore {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let store = Self { conn };
        store.ensure_table()?;
        Ok(store)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_document (
              doc_id TEXT PRIMARY KEY,
              blocks_json TEXT NOT NULL,
              revision INTEGER NOT NULL,
              updated_at TEXT NOT NULL,
              updated_by TEXT
            );
            "#,
        )?;
        Ok(())
    }

    fn current_revision(conn: &Connection) -> RepositoryResult<i64> {
        let revision: Option<i64> = conn
            .query_row(
                "SELECT revision FROM config_document WHERE doc_id = ?1",
                params![BLOCKS_DOC_ID],
                |row| row.get(0),
            )
            .optional()?;
        Ok(revision.unwrap_or(0))
    }
}

#[async_trait]
impl ConfigurationStore for SqliteConfigurationStore {
    async fn load(&self) -> RepositoryResult<Option<ConfigDocument>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT blocks_json, revision, updated_at, updated_by
                FROM config_document
                WHERE doc_id = ?1
                "#,
                params![BLOCKS_DOC_ID],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let (blocks_json, revision, updated_at, updated_by) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let blocks: Vec<Block> = serde_json::from_str(&blocks_json)?;
        Ok(Some(ConfigDocument {
            blocks,
            revision,
            updated_at,
            updated_by,
        }))
    }

    async fn save(
        &self,
        blocks: &[Block],
        expected_revision: Option<i64>,
        operator: &str,
    ) -> RepositoryResult<i64> {
        let blocks_json = serde_json::to_string(blocks)?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let actual = Self::current_revision(&tx)?;
        if let Some(expected) = expected_revision {
            if expected != actual {
                return Err(RepositoryError::RevisionConflict { expected, actual });
            }
        }

        let next_revision = actual + 1;
        tx.execute(
            r#"
            INSERT INTO config_document (doc_id, blocks_json, revision, updated_at, updated_by)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(doc_id) DO UPDATE SET
                blocks_json = excluded.blocks_json,
                revision = excluded.revision,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
            params![BLOCKS_DOC_ID, blocks_json, next_revision, now, operator],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(revision = next_revision, blocks = blocks.len(), operator, "配置文档已写入");
        Ok(next_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::default_config::default_blocks;
    use tempfile::NamedTempFile;

    fn store() -> (NamedTempFile, SqliteConfigurationStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteConfigurationStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, store)
    }

    #[tokio::test]
    async fn test_load_empty_returns_none() {
        let (_tmp, store) = store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_tmp, store) = store();
        let blocks = default_blocks();

        let revision = store.save(&blocks, None, "admin").await.unwrap();
        assert_eq!(revision, 1);

        let doc = store.load().await.unwrap().unwrap();
        assert_eq!(doc.blocks, blocks);
        assert_eq!(doc.revision, 1);
        assert_eq!(doc.updated_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_last_writer_wins_without_expected_revision() {
        let (_tmp, store) = store();
        let blocks = default_blocks();
        store.save(&blocks, None, "a").await.unwrap();
        let revision = store.save(&blocks[..2], None, "b").await.unwrap();
        assert_eq!(revision, 2);
        assert_eq!(store.load().await.unwrap().unwrap().blocks.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_expected_revision_conflicts() {
        let (_tmp, store) = store();
        let blocks = default_blocks();
        store.save(&blocks, Some(0), "a").await.unwrap();
        store.save(&blocks, Some(1), "b").await.unwrap();

        let err = store.save(&blocks, Some(1), "c").await.unwrap_err();
        match err {
            RepositoryError::RevisionConflict { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
