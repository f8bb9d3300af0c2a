// ==========================================
// 面包生产线设定系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 产线设定单管理（区块/字段配置 + 按产线可见性）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 服务
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Block, BlockLineOverride, ConfigSnapshot, Field, LineRule, ProductRecord};

// 引擎
pub use engine::{EditSession, VisibilityResolver};

// API
pub use api::{ConfigApi, EditorApi, ImportApi, ProductApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "面包生产线设定系统";
