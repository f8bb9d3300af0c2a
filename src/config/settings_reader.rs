// ==========================================
// 面包生产线设定系统 - 系统设置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的设置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::BlockLineOverride;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SettingsReader: Send + Sync {
    /// 区块产线覆写规则
    ///
    /// # 默认值
    /// - 分割机/搓圆机在 2、5 线隐藏；压面机/成型机仅在 1、4、6 线显示
    async fn get_block_line_overrides(&self) -> RepositoryResult<Vec<BlockLineOverride>>;

    /// 单次导入最大行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_import_max_rows(&self) -> RepositoryResult<usize>;

    /// 提示语言（fr / en / zh-CN）
    ///
    /// # 默认值
    /// - fr
    async fn get_locale(&self) -> RepositoryResult<String>;
}
