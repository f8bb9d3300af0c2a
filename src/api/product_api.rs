// ==========================================
// 面包生产线设定系统 - 设定单 API
// ==========================================
// 职责: 设定记录保存/查询/搜索、设定单视图、空白表单、CSV 导出、
//       历史键名迁移
// 读取: 所有读出的记录都经 LegacyKeyNormalizer 归一化
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::auth::require_operator;
use crate::api::config_api::ConfigApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_product_record;
use crate::domain::block::Block;
use crate::domain::product::{record_key, ProductRecord};
use crate::engine::sheet_view::{build_sheet_view, export_sheet_csv, SheetView};
use crate::repository::legacy_keys::LegacyKeyNormalizer;
use crate::repository::product_store::ProductRecordStore;

/// 历史键名迁移结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub scanned: usize,
    pub rewritten: usize,
}

// ==========================================
// ProductApi - 设定单 API
// ==========================================
pub struct ProductApi {
    store: Arc<dyn ProductRecordStore>,
    config_api: Arc<ConfigApi>,
}

impl ProductApi {
    pub fn new(store: Arc<dyn ProductRecordStore>, config_api: Arc<ConfigApi>) -> Self {
        Self { store, config_api }
    }

    async fn current_blocks(&self) -> ApiResult<Vec<Block>> {
        Ok(self.config_api.load_configuration().await?.blocks)
    }

    async fn normalizer(&self) -> ApiResult<LegacyKeyNormalizer> {
        let blocks = self.current_blocks().await?;
        Ok(normalizer_for(&blocks))
    }

    /// 保存设定记录（upsert-merge）
    ///
    /// # 返回
    /// - 合并后的完整记录
    pub async fn save_record(
        &self,
        operator: Option<&str>,
        record: ProductRecord,
    ) -> ApiResult<ProductRecord> {
        let operator = require_operator(operator)?;

        let record = ProductRecord {
            code_article: record.code_article.trim().to_string(),
            numero_ligne: record.numero_ligne.trim().to_string(),
            ..record
        };
        validate_product_record(&record)?;

        let (record, _) = self.normalizer().await?.normalize(record);
        let merged = self.store.save(record, operator).await?;
        tracing::info!(
            operator,
            record_key = %merged.record_key(),
            value_count = merged.values.len(),
            "设定记录已保存"
        );

        let (merged, _) = self.normalizer().await?.normalize(merged);
        Ok(merged)
    }

    /// 读取单条记录
    pub async fn load_record(&self, code_article: &str, numero_ligne: &str) -> ApiResult<ProductRecord> {
        let record = self
            .store
            .load_one(code_article, numero_ligne)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "设定记录(key={})不存在",
                    record_key(code_article, numero_ligne)
                ))
            })?;
        let (record, _) = self.normalizer().await?.normalize(record);
        Ok(record)
    }

    /// 全部记录（按主键排序）
    pub async fn list_records(&self) -> ApiResult<Vec<ProductRecord>> {
        let normalizer = self.normalizer().await?;
        let records = self.store.load_all().await?;
        Ok(records
            .into_iter()
            .map(|r| normalizer.normalize(r).0)
            .collect())
    }

    /// 搜索记录
    ///
    /// # 参数
    /// - query: 对 codeArticle 与 designation 做不区分大小写的子串匹配
    /// - line: 产线号精确过滤
    pub async fn search(&self, query: Option<&str>, line: Option<&str>) -> ApiResult<Vec<ProductRecord>> {
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let line = line.map(str::trim).filter(|l| !l.is_empty());

        let records = self.list_records().await?;
        Ok(records
            .into_iter()
            .filter(|r| line.map_or(true, |l| r.numero_ligne == l))
            .filter(|r| match &needle {
                Some(n) => {
                    r.code_article.to_lowercase().contains(n.as_str())
                        || r.designation.to_lowercase().contains(n.as_str())
                }
                None => true,
            })
            .collect())
    }

    /// 已有记录的设定单视图
    pub async fn sheet_view(&self, code_article: &str, numero_ligne: &str) -> ApiResult<SheetView> {
        let record = self.load_record(code_article, numero_ligne).await?;
        let blocks = self.current_blocks().await?;
        let resolver = self.config_api.resolver().await?;
        Ok(build_sheet_view(&resolver, &blocks, Some(&record), None))
    }

    /// 新建设定单用的空白表单
    pub async fn form_template(&self, line: Option<&str>) -> ApiResult<SheetView> {
        let blocks = self.current_blocks().await?;
        let resolver = self.config_api.resolver().await?;
        Ok(build_sheet_view(&resolver, &blocks, None, line))
    }

    /// 打印用 CSV
    pub async fn export_csv(&self, code_article: &str, numero_ligne: &str) -> ApiResult<String> {
        let view = self.sheet_view(code_article, numero_ligne).await?;
        export_sheet_csv(&view).map_err(|e| ApiError::InternalError(format!("CSV 导出失败: {}", e)))
    }

    /// 一次性把所有存量记录改写为规范键名
    pub async fn migrate_legacy_keys(&self, operator: Option<&str>) -> ApiResult<MigrationReport> {
        let operator = require_operator(operator)?;
        let normalizer = self.normalizer().await?;
        let records = self.store.load_all().await?;

        let mut report = MigrationReport {
            scanned: records.len(),
            rewritten: 0,
        };
        for record in records {
            let (normalized, changed) = normalizer.normalize(record);
            if changed {
                self.store.replace(&normalized, operator).await?;
                report.rewritten += 1;
            }
        }

        tracing::info!(
            operator,
            scanned = report.scanned,
            rewritten = report.rewritten,
            "历史键名迁移完成"
        );
        Ok(report)
    }
}

/// 以配置中全部字段技术名构建归一化器
pub fn normalizer_for(blocks: &[Block]) -> LegacyKeyNormalizer {
    LegacyKeyNormalizer::new(
        blocks
            .iter()
            .flat_map(|b| b.fields.iter().map(|f| f.technical_name.clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_manager::ConfigManager;
    use crate::repository::config_store_impl::SqliteConfigurationStore;
    use crate::repository::product_store_impl::SqliteProductRecordStore;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> (ProductApi, Arc<SqliteProductRecordStore>) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let config_store = SqliteConfigurationStore::from_connection(conn.clone()).unwrap();
        let manager = ConfigManager::from_connection(conn.clone()).unwrap();
        let config_api = Arc::new(ConfigApi::new(Arc::new(config_store), Arc::new(manager)));
        let store = Arc::new(SqliteProductRecordStore::from_connection(conn).unwrap());
        (ProductApi::new(store.clone(), config_api), store)
    }

    #[tokio::test]
    async fn test_save_requires_operator_and_keys() {
        let (api, _) = api();
        let record = ProductRecord::new("BAG001", "4", "Baguette");
        assert!(matches!(
            api.save_record(None, record).await,
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            api.save_record(Some("marie"), ProductRecord::new("BAG001", "", "")).await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_save_merges_and_search() {
        let (api, _) = api();
        api.save_record(
            Some("marie"),
            ProductRecord::new("BAG001", "4", "Baguette tradition").with_value("temperature_four", "240"),
        )
        .await
        .unwrap();
        let merged = api
            .save_record(
                Some("marie"),
                ProductRecord::new("BAG001", "4", "").with_value("duree_cuisson", "22"),
            )
            .await
            .unwrap();

        assert_eq!(merged.designation, "Baguette tradition");
        assert_eq!(merged.value("temperature_four"), Some("240"));
        assert_eq!(merged.value("duree_cuisson"), Some("22"));

        api.save_record(Some("marie"), ProductRecord::new("CRO002", "1", "Croissant"))
            .await
            .unwrap();

        assert_eq!(api.search(Some("tradi"), None).await.unwrap().len(), 1);
        assert_eq!(api.search(None, Some("1")).await.unwrap().len(), 1);
        assert_eq!(api.search(Some(" "), None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sheet_view_and_csv() {
        let (api, _) = api();
        api.save_record(
            Some("marie"),
            ProductRecord::new("BAG001", "2", "Baguette")
                .with_value("temperature_four", "240")
                .with_value("vitesse_diviseuse", "12"),
        )
        .await
        .unwrap();

        let view = api.sheet_view("BAG001", "2").await.unwrap();
        assert!(view.blocks.iter().all(|b| b.block_id != "b_diviseuse"));

        let csv = api.export_csv("BAG001", "2").await.unwrap();
        assert!(csv.starts_with("codeArticle;BAG001\n"));
        assert!(csv.contains("Four;Température (°C);240"));
        assert!(!csv.contains("12"));

        assert!(matches!(
            api.sheet_view("NOPE", "1").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_migrate_legacy_keys_rewrites_once() {
        let (api, store) = api();
        let legacy = ProductRecord::new("BAG001", "4", "")
            .with_value("Temperature_Four", "240")
            .with_value("Libelle", "Baguette");
        store.replace(&legacy, "import").await.unwrap();

        let loaded = api.load_record("BAG001", "4").await.unwrap();
        assert_eq!(loaded.value("temperature_four"), Some("240"));
        assert_eq!(loaded.designation, "Baguette");

        let report = api.migrate_legacy_keys(Some("marie")).await.unwrap();
        assert_eq!(report, MigrationReport { scanned: 1, rewritten: 1 });
        let again = api.migrate_legacy_keys(Some("marie")).await.unwrap();
        assert_eq!(again.rewritten, 0);
    }
}
