// ==========================================
// 面包生产线设定系统 - 产品设定记录存储 Trait
// ==========================================
// 主键: "{codeArticle}_{numeroLigne}"
// 语义: upsert-merge；不按字段删除
// ==========================================

use crate::domain::product::ProductRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ProductRecordStore Trait
// ==========================================
// 实现者: SqliteProductRecordStore
#[async_trait]
pub trait ProductRecordStore: Send + Sync {
    /// upsert-merge 写入
    ///
    /// # 返回
    /// - 合并后的完整记录
    async fn save(&self, record: ProductRecord, operator: &str) -> RepositoryResult<ProductRecord>;

    /// 批量 upsert-merge（单个事务；任一条失败则全部不写入）
    ///
    /// # 返回
    /// - 合并后的完整记录，顺序与输入一致
    async fn save_all(
        &self,
        records: Vec<ProductRecord>,
        operator: &str,
    ) -> RepositoryResult<Vec<ProductRecord>>;

    /// 整条替换写入（仅用于历史键迁移）
    async fn replace(&self, record: &ProductRecord, operator: &str) -> RepositoryResult<()>;

    /// 读取全部记录（按主键排序）
    async fn load_all(&self) -> RepositoryResult<Vec<ProductRecord>>;

    /// 读取单条记录
    async fn load_one(
        &self,
        code_article: &str,
        numero_ligne: &str,
    ) -> RepositoryResult<Option<ProductRecord>>;
}
