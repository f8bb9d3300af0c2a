// ==========================================
// 面包生产线设定系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, EditorApi, ImportApi, ProductApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::repository::config_store_impl::SqliteConfigurationStore;
use crate::repository::product_store_impl::SqliteProductRecordStore;

/// 默认监听地址
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

// ==========================================
// AppSettings - 进程级设置（环境变量）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// REGLAGES_DB_PATH
    pub db_path: String,
    /// REGLAGES_LISTEN_ADDR
    pub listen_addr: String,
    /// REGLAGES_UPLOAD_DIR（导入文件暂存目录）
    pub upload_dir: PathBuf,
}

impl AppSettings {
    /// 从环境变量读取，缺失时使用默认值
    pub fn from_env() -> Self {
        let listen_addr = env_non_empty("REGLAGES_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let upload_dir = env_non_empty("REGLAGES_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("reglages-ligne-uploads"));

        Self {
            db_path: get_default_db_path(),
            listen_addr,
            upload_dir,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ==========================================
// AppState - 应用状态
// ==========================================

/// 应用状态
///
/// 包含所有API实例和共享资源，作为 axum 路由的共享状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 导入文件暂存目录
    pub upload_dir: PathBuf,

    /// 配置管理器（config_kv）
    pub config_manager: Arc<ConfigManager>,

    /// 区块配置API
    pub config_api: Arc<ConfigApi>,

    /// 配置编辑器API
    pub editor_api: Arc<EditorApi>,

    /// 设定单API
    pub product_api: Arc<ProductApi>,

    /// 设定单导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 所有存储共享同一个数据库连接
    pub fn new(settings: &AppSettings) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", settings.db_path);

        let conn = open_sqlite_connection(&settings.db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        std::fs::create_dir_all(&settings.upload_dir)
            .map_err(|e| format!("无法创建上传目录 {}: {}", settings.upload_dir.display(), e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let config_store = Arc::new(
            SqliteConfigurationStore::from_connection(conn.clone())
                .map_err(|e| format!("无法创建SqliteConfigurationStore: {}", e))?,
        );
        let product_store = Arc::new(
            SqliteProductRecordStore::from_connection(conn.clone())
                .map_err(|e| format!("无法创建SqliteProductRecordStore: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let config_api = Arc::new(ConfigApi::new(config_store, config_manager.clone()));
        let editor_api = Arc::new(EditorApi::new(config_api.clone()));
        let product_api = Arc::new(ProductApi::new(product_store.clone(), config_api.clone()));
        let import_api = Arc::new(ImportApi::new(
            product_store,
            config_api.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: settings.db_path.clone(),
            upload_dir: settings.upload_dir.clone(),
            config_manager,
            config_api,
            editor_api,
            product_api,
            import_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用 REGLAGES_DB_PATH；否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    if let Some(path) = env_non_empty("REGLAGES_DB_PATH") {
        return path;
    }

    let mut path = PathBuf::from("./reglages_ligne.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("reglages-ligne");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("reglages_ligne.db");
        }
    }

    path.to_string_lossy().to_string()
}
