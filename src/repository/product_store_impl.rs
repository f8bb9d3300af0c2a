// ==========================================
// 面包生产线设定系统 - 产品设定记录存储实现 (SQLite)
// ==========================================
// 表: product_record
// 说明: 核心字段单独成列便于检索；技术名键值以 JSON 存放于 data_json
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::{record_key, ProductRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_store::ProductRecordStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteProductRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProductRecordStore {
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

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS product_record (
              record_key TEXT PRIMARY KEY,
              code_article TEXT NOT NULL,
              numero_ligne TEXT NOT NULL,
              designation TEXT NOT NULL DEFAULT '',
              data_json TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              updated_by TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_product_record_code
              ON product_record(code_article);
            CREATE INDEX IF NOT EXISTS idx_product_record_line
              ON product_record(numero_ligne);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn into_record(raw: (String, String, String, String)) -> RepositoryResult<ProductRecord> {
        let (code_article, numero_ligne, designation, data_json) = raw;
        let values: BTreeMap<String, String> = serde_json::from_str(&data_json)?;
        Ok(ProductRecord {
            code_article,
            numero_ligne,
            designation,
            values,
        })
    }

    fn find(conn: &Connection, key: &str) -> RepositoryResult<Option<ProductRecord>> {
        let raw = conn
            .query_row(
                r#"
                SELECT code_article, numero_ligne, designation, data_json
                FROM product_record
                WHERE record_key = ?1
                "#,
                params![key],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::into_record).transpose()
    }

    /// 与已有记录合并后写入
    fn merge_and_write(
        conn: &Connection,
        record: ProductRecord,
        operator: &str,
    ) -> RepositoryResult<ProductRecord> {
        let merged = match Self::find(conn, &record.record_key())? {
            Some(mut existing) => {
                existing.merge_from(record);
                existing
            }
            None => record,
        };
        Self::write(conn, &merged, operator)?;
        Ok(merged)
    }

    fn write(conn: &Connection, record: &ProductRecord, operator: &str) -> RepositoryResult<()> {
        let data_json = serde_json::to_string(&record.values)?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        conn.execute(
            r#"
            INSERT INTO product_record (
                record_key, code_article, numero_ligne, designation, data_json, updated_at, updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(record_key) DO UPDATE SET
                designation = excluded.designation,
                data_json = excluded.data_json,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
            params![
                record.record_key(),
                record.code_article,
                record.numero_ligne,
                record.designation,
                data_json,
                now,
                operator,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ProductRecordStore for SqliteProductRecordStore {
    async fn save(&self, record: ProductRecord, operator: &str) -> RepositoryResult<ProductRecord> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let merged = Self::merge_and_write(&tx, record, operator)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(merged)
    }

    async fn save_all(
        &self,
        records: Vec<ProductRecord>,
        operator: &str,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(Self::merge_and_write(&tx, record, operator)?);
        }

        // 提交事务（出错时 tx 被 drop，自动回滚）
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tracing::debug!(count = saved.len(), "设定记录批量写入完成");
        Ok(saved)
    }

    async fn replace(&self, record: &ProductRecord, operator: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::write(&conn, record, operator)
    }

    async fn load_all(&self) -> RepositoryResult<Vec<ProductRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT code_article, numero_ligne, designation, data_json
            FROM product_record
            ORDER BY record_key
            "#,
        )?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::into_record).collect()
    }

    async fn load_one(
        &self,
        code_article: &str,
        numero_ligne: &str,
    ) -> RepositoryResult<Option<ProductRecord>> {
        let conn = self.get_conn()?;
        Self::find(&conn, &record_key(code_article, numero_ligne))
    }
}
