// ==========================================
// 面包生产线设定系统 - 配置层
// ==========================================
// 职责: 系统设置管理（区块产线覆写、导入上限、提示语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod settings_reader;

// 重导出核心配置管理器
pub use config_manager::{config_defaults, config_keys, ConfigManager};
pub use settings_reader::SettingsReader;
