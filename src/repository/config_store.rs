// ==========================================
// 面包生产线设定系统 - 配置存储 Trait
// ==========================================
// 职责: 区块配置文档的读取与整体替换写入
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::domain::block::Block;
use crate::domain::config_document::ConfigDocument;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ConfigurationStore Trait
// ==========================================
// 实现者: SqliteConfigurationStore
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// 读取配置文档
    ///
    /// # 返回
    /// - Ok(None): 尚未保存过配置，调用方使用内置默认配置
    async fn load(&self) -> RepositoryResult<Option<ConfigDocument>>;

    /// 整体替换写入区块列表
    ///
    /// # 参数
    /// - blocks: 完整区块列表
    /// - expected_revision: Some 时做版本比对，不一致返回 RevisionConflict；
    ///   None 时后写者覆盖
    /// - operator: 操作人
    ///
    /// # 返回
    /// - 写入后的 revision
    async fn save(
        &self,
        blocks: &[Block],
        expected_revision: Option<i64>,
        operator: &str,
    ) -> RepositoryResult<i64>;
}
