// ==========================================
// 面包生产线设定系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod config_store;
pub mod config_store_impl;
pub mod error;
pub mod legacy_keys;
pub mod product_store;
pub mod product_store_impl;

// 重导出核心仓储
pub use config_store::ConfigurationStore;
pub use config_store_impl::SqliteConfigurationStore;
pub use error::{RepositoryError, RepositoryResult};
pub use legacy_keys::LegacyKeyNormalizer;
pub use product_store::ProductRecordStore;
pub use product_store_impl::SqliteProductRecordStore;
