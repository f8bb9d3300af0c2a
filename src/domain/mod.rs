// ==========================================
// 面包生产线设定系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod block;
pub mod config_document;
pub mod product;
pub mod types;

// 重导出核心类型
pub use block::{blocks_in_order, find_block, Block, Field};
pub use config_document::{ConfigDocument, ConfigSnapshot};
pub use product::{core_keys, record_key, ProductRecord};
pub use types::{BlockLineOverride, LineRule, MoveDirection, ALL_LINES};
