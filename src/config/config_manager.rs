// ==========================================
// 面包生产线设定系统 - 配置管理器
// ==========================================
// 职责: 系统设置的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::settings_reader::SettingsReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::BlockLineOverride;
use crate::engine::default_config::default_line_overrides;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

/// 配置键
pub mod config_keys {
    /// 区块产线覆写规则（JSON 数组）
    pub const BLOCK_LINE_OVERRIDES: &str = "visibility.block_line_overrides";
    /// 单次导入最大行数
    pub const IMPORT_MAX_ROWS: &str = "import.max_rows";
    /// 界面提示语言
    pub const UI_LOCALE: &str = "ui.locale";
}

/// 默认值
pub mod config_defaults {
    pub const IMPORT_MAX_ROWS: usize = 5_000;
    pub const UI_LOCALE: &str = "fr";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
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
            CREATE TABLE IF NOT EXISTS config_kv (
              scope_id TEXT NOT NULL,
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::ValidationError("配置键不能为空".to_string()));
        }
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key, "配置已更新");
        Ok(())
    }

    /// 全部 global 配置（按键排序）
    pub fn list_global_configs(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut configs = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            configs.insert(key, value);
        }
        Ok(configs)
    }

    /// 保存区块产线覆写规则
    pub fn set_block_line_overrides(&self, overrides: &[BlockLineOverride]) -> RepositoryResult<()> {
        let raw = serde_json::to_string(overrides)?;
        self.set_global_config_value(config_keys::BLOCK_LINE_OVERRIDES, &raw)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

// ==========================================
// SettingsReader Trait 实现
// ==========================================
#[async_trait]
impl SettingsReader for ConfigManager {
    async fn get_block_line_overrides(&self) -> RepositoryResult<Vec<BlockLineOverride>> {
        let raw = match self.get_global_config_value(config_keys::BLOCK_LINE_OVERRIDES)? {
            Some(v) => v,
            None => return Ok(default_line_overrides()),
        };

        match serde_json::from_str::<Vec<BlockLineOverride>>(&raw) {
            Ok(overrides) => Ok(overrides),
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::BLOCK_LINE_OVERRIDES,
                    raw_value = %raw,
                    error = %e,
                    "区块产线覆写配置格式错误，使用默认规则"
                );
                Ok(default_line_overrides())
            }
        }
    }

    async fn get_import_max_rows(&self) -> RepositoryResult<usize> {
        let value = self.get_config_or_default(
            config_keys::IMPORT_MAX_ROWS,
            &config_defaults::IMPORT_MAX_ROWS.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(config_defaults::IMPORT_MAX_ROWS))
    }

    async fn get_locale(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(config_keys::UI_LOCALE, config_defaults::UI_LOCALE)?;
        match value.trim() {
            "fr" | "en" | "zh-CN" => Ok(value.trim().to_string()),
            _ => Ok(config_defaults::UI_LOCALE.to_string()),
        }
    }
}
