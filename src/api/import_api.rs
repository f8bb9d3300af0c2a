// ==========================================
// 面包生产线设定系统 - 设定单导入 API
// ==========================================
// 职责: 文件预览（建议映射）、可映射目标、按映射导入
// 写入: 全部记录在一个事务内 upsert-merge 到设定记录存储，失败时不写入任何记录
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::auth::require_operator;
use crate::api::config_api::ConfigApi;
use crate::api::error::ApiResult;
use crate::config::config_manager::ConfigManager;
use crate::config::settings_reader::SettingsReader;
use crate::engine::sheet_view::TargetField;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::product_importer::{ImportPreview, ProductImporter, SkippedRow};
use crate::repository::product_store::ProductRecordStore;

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// 写入的记录数（同键多行合并后计 1）
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
    /// 因所在产线不可见而丢弃的取值个数
    pub dropped_values: usize,
}

// ==========================================
// ImportApi - 导入 API
// ==========================================
pub struct ImportApi {
    store: Arc<dyn ProductRecordStore>,
    config_api: Arc<ConfigApi>,
    config_manager: Arc<ConfigManager>,
}

impl ImportApi {
    pub fn new(
        store: Arc<dyn ProductRecordStore>,
        config_api: Arc<ConfigApi>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            store,
            config_api,
            config_manager,
        }
    }

    /// 预览文件：表头、行数、样例行、建议映射
    pub async fn preview(&self, operator: Option<&str>, path: &Path) -> ApiResult<ImportPreview> {
        require_operator(operator)?;
        let sheet = UniversalFileParser.parse(path)?;

        let blocks = self.config_api.load_configuration().await?.blocks;
        let resolver = self.config_api.resolver().await?;
        let preview = ProductImporter::new(&resolver, &blocks).preview(&sheet);

        tracing::info!(
            file = %path.display(),
            rows = preview.row_count,
            mapped = preview.suggested_mapping.len(),
            "导入预览完成"
        );
        Ok(preview)
    }

    /// 可映射目标字段（仅当前可见字段）
    pub async fn targets(&self, line: Option<&str>) -> ApiResult<Vec<TargetField>> {
        let blocks = self.config_api.load_configuration().await?.blocks;
        let resolver = self.config_api.resolver().await?;
        Ok(ProductImporter::new(&resolver, &blocks).targets(line))
    }

    /// 按映射导入
    pub async fn import(
        &self,
        operator: Option<&str>,
        path: &Path,
        mapping: &ColumnMapping,
    ) -> ApiResult<ImportReport> {
        let operator = require_operator(operator)?;
        let sheet = UniversalFileParser.parse(path)?;
        let max_rows = self.config_manager.get_import_max_rows().await?;

        let blocks = self.config_api.load_configuration().await?.blocks;
        let resolver = self.config_api.resolver().await?;
        let plan = ProductImporter::new(&resolver, &blocks).plan(&sheet, mapping, max_rows)?;

        let imported = self.store.save_all(plan.records, operator).await?.len();

        tracing::info!(
            operator,
            file = %path.display(),
            rows = sheet.rows.len(),
            imported,
            skipped = plan.skipped.len(),
            "设定单导入完成"
        );

        Ok(ImportReport {
            imported,
            skipped: plan.skipped,
            dropped_values: plan.dropped_values,
        })
    }
}
