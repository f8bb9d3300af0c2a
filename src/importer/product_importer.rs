// ==========================================
// 面包生产线设定系统 - 设定单导入器
// ==========================================
// 流程: 解析文件 → 校验映射 → 逐行映射 → 按产线可见性过滤
// 输出: 待写入记录 + 跳过行报告（写入由 API 层完成）
// ==========================================

use crate::domain::block::Block;
use crate::domain::product::ProductRecord;
use crate::engine::sheet_view::{visible_target_fields, TargetField};
use crate::engine::visibility::VisibilityResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ColumnMapping, FieldMapper};
use crate::importer::file_parser::ParsedSheet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 预览中展示的样例行数
pub const PREVIEW_SAMPLE_ROWS: usize = 5;

/// 导入预览
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub row_count: usize,
    pub sample_rows: Vec<HashMap<String, String>>,
    pub suggested_mapping: ColumnMapping,
}

/// 被跳过的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 表格行号（表头为第 1 行）
    pub row: usize,
    pub reason: String,
}

/// 映射结果
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<SkippedRow>,
    /// 因所在产线不可见而丢弃的取值个数
    pub dropped_values: usize,
}

pub struct ProductImporter<'a> {
    resolver: &'a VisibilityResolver,
    blocks: &'a [Block],
    mapper: FieldMapper,
}

impl<'a> ProductImporter<'a> {
    pub fn new(resolver: &'a VisibilityResolver, blocks: &'a [Block]) -> Self {
        Self {
            resolver,
            blocks,
            mapper: FieldMapper,
        }
    }

    /// 生成预览（建议映射只考虑不限产线时可见的字段）
    pub fn preview(&self, sheet: &ParsedSheet) -> ImportPreview {
        let targets = self.targets(None);
        ImportPreview {
            headers: sheet.headers.clone(),
            row_count: sheet.rows.len(),
            sample_rows: sheet.rows.iter().take(PREVIEW_SAMPLE_ROWS).cloned().collect(),
            suggested_mapping: self.mapper.suggest(&sheet.headers, &targets),
        }
    }

    /// 可映射的目标字段
    pub fn targets(&self, line: Option<&str>) -> Vec<TargetField> {
        visible_target_fields(self.resolver, self.blocks, line)
    }

    /// 按映射生成待写入记录
    ///
    /// # 参数
    /// - max_rows: 单次导入行数上限，超出时整体拒绝
    ///
    /// # 返回
    /// - 主键缺失的行进入 skipped；同一记录键重复出现时按行序合并
    pub fn plan(
        &self,
        sheet: &ParsedSheet,
        mapping: &ColumnMapping,
        max_rows: usize,
    ) -> ImportResult<ImportPlan> {
        if sheet.rows.len() > max_rows {
            return Err(ImportError::TooManyRows {
                rows: sheet.rows.len(),
                max_rows,
            });
        }

        let known: HashSet<String> = self
            .blocks
            .iter()
            .flat_map(|b| b.fields.iter().map(|f| f.technical_name.clone()))
            .collect();
        self.mapper.validate(&sheet.headers, mapping, &known)?;

        let mut plan = ImportPlan::default();
        let mut visible_by_line: HashMap<String, HashSet<String>> = HashMap::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();

        for (idx, row) in sheet.rows.iter().enumerate() {
            let row_number = idx + 2;
            let mut record = match self.mapper.map_row(row, row_number, mapping) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(row = row_number, error = %e, "导入行被跳过");
                    plan.skipped.push(SkippedRow {
                        row: row_number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let visible = visible_by_line
                .entry(record.numero_ligne.clone())
                .or_insert_with(|| {
                    self.targets(Some(&record.numero_ligne))
                        .into_iter()
                        .map(|t| t.technical_name)
                        .collect()
                });
            let before = record.values.len();
            record.values.retain(|key, _| visible.contains(key));
            plan.dropped_values += before - record.values.len();

            match index_by_key.get(&record.record_key()) {
                Some(&existing) => plan.records[existing].merge_from(record),
                None => {
                    index_by_key.insert(record.record_key(), plan.records.len());
                    plan.records.push(record);
                }
            }
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::default_config::{default_blocks, default_line_overrides};

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> ParsedSheet {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let rows = rows
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().map(|c| c.to_string()))
                    .collect()
            })
            .collect();
        ParsedSheet { headers, rows }
    }

    fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
        pairs
            .iter()
            .map(|(h, t)| (h.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_plan_filters_values_by_row_line() {
        let blocks = default_blocks();
        let resolver = VisibilityResolver::new(default_line_overrides());
        let importer = ProductImporter::new(&resolver, &blocks);

        let data = sheet(
            &["Code", "Ligne", "Vitesse", "Sole"],
            &[&["BAG001", "4", "350", "250"], &["BAG001", "2", "350", "250"]],
        );
        let map = mapping(&[
            ("Code", "codeArticle"),
            ("Ligne", "numeroLigne"),
            ("Vitesse", "vitesse_diviseuse"),
            ("Sole", "temperature_sole"),
        ]);

        let plan = importer.plan(&data, &map, 100).unwrap();

        assert_eq!(plan.records.len(), 2);
        // 分割机在 2 线隐藏，sole 温度仅 4、6 线
        assert_eq!(plan.records[0].value("temperature_sole"), Some("250"));
        assert_eq!(plan.records[0].value("vitesse_diviseuse"), Some("350"));
        assert!(plan.records[1].value("temperature_sole").is_none());
        assert!(plan.records[1].value("vitesse_diviseuse").is_none());
        assert_eq!(plan.dropped_values, 2);
    }

    #[test]
    fn test_plan_reports_skipped_rows() {
        let blocks = default_blocks();
        let resolver = VisibilityResolver::default();
        let importer = ProductImporter::new(&resolver, &blocks);

        let data = sheet(&["Code", "Ligne"], &[&["BAG001", "4"], &["", "4"], &["CRO002", ""]]);
        let map = mapping(&[("Code", "codeArticle"), ("Ligne", "numeroLigne")]);

        let plan = importer.plan(&data, &map, 100).unwrap();
        assert_eq!(plan.records.len(), 1);
        let rows: Vec<usize> = plan.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![3, 4]);
    }

    #[test]
    fn test_plan_merges_duplicate_keys() {
        let blocks = default_blocks();
        let resolver = VisibilityResolver::default();
        let importer = ProductImporter::new(&resolver, &blocks);

        let data = sheet(
            &["Code", "Ligne", "Designation"],
            &[&["BAG001", "4", "Baguette"], &["BAG001", "4", "Baguette tradition"]],
        );
        let map = mapping(&[
            ("Code", "codeArticle"),
            ("Ligne", "numeroLigne"),
            ("Designation", "designation"),
        ]);
        let plan = importer.plan(&data, &map, 100).unwrap();
        assert_eq!(plan.records.len(), 1);
        assert_eq!(plan.records[0].designation, "Baguette tradition");
    }

    #[test]
    fn test_plan_rejects_too_many_rows() {
        let blocks = default_blocks();
        let resolver = VisibilityResolver::default();
        let importer = ProductImporter::new(&resolver, &blocks);
        let data = sheet(&["Code", "Ligne"], &[&["A", "1"], &["B", "1"]]);
        let map = mapping(&[("Code", "codeArticle"), ("Ligne", "numeroLigne")]);
        let result = importer.plan(&data, &map, 1);
        assert!(matches!(result, Err(ImportError::TooManyRows { rows: 2, max_rows: 1 })));
    }

    #[test]
    fn test_preview_limits_samples() {
        let blocks = default_blocks();
        let resolver = VisibilityResolver::default();
        let importer = ProductImporter::new(&resolver, &blocks);
        let rows: Vec<[&str; 2]> = (0..8).map(|_| ["BAG001", "4"]).collect();
        let row_refs: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
        let data = sheet(&["Code article", "Ligne"], &row_refs);

        let preview = importer.preview(&data);
        assert_eq!(preview.row_count, 8);
        assert_eq!(preview.sample_rows.len(), PREVIEW_SAMPLE_ROWS);
        assert_eq!(preview.suggested_mapping.len(), 2);
    }
}
