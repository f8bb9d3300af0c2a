// ==========================================
// 面包生产线设定系统 - 列映射器
// ==========================================
// 职责: 表头 → 存储键（核心字段键 / 字段技术名）的建议与应用
// 规则: 空单元格不写入记录，避免 upsert-merge 清空已有取值
// ==========================================

use crate::domain::product::{core_keys, is_valid_line_number, ProductRecord};
use crate::engine::sheet_view::TargetField;
use crate::engine::technical_name::normalize_technical_name;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::legacy_keys::core_key_for;
use std::collections::{BTreeMap, HashMap, HashSet};

/// 列映射：表头 → 存储键
pub type ColumnMapping = BTreeMap<String, String>;

pub struct FieldMapper;

impl FieldMapper {
    /// 根据表头与可映射字段生成建议映射
    ///
    /// 匹配顺序: 核心字段别名 → 规范化技术名 → 规范化字段名；
    /// 同一目标只分配给第一个匹配的表头。
    pub fn suggest(&self, headers: &[String], targets: &[TargetField]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        let mut taken: HashSet<String> = HashSet::new();

        for header in headers {
            let target = core_key_for(header)
                .map(str::to_string)
                .or_else(|| match_target(header, targets));

            if let Some(target) = target {
                if taken.insert(target.clone()) {
                    mapping.insert(header.clone(), target);
                }
            }
        }

        mapping
    }

    /// 校验映射
    ///
    /// # 参数
    /// - known_targets: 配置中全部字段的技术名
    pub fn validate(
        &self,
        headers: &[String],
        mapping: &ColumnMapping,
        known_targets: &HashSet<String>,
    ) -> ImportResult<()> {
        for (header, target) in mapping {
            if !headers.contains(header) {
                return Err(ImportError::UnknownColumn(header.clone()));
            }
            if !core_keys::ALL.contains(&target.as_str()) && !known_targets.contains(target) {
                return Err(ImportError::UnknownTarget(target.clone()));
            }
        }

        for required in [core_keys::CODE_ARTICLE, core_keys::NUMERO_LIGNE] {
            if !mapping.values().any(|t| t == required) {
                return Err(ImportError::MissingMapping(required.to_string()));
            }
        }
        Ok(())
    }

    /// 按映射把一行转换为设定记录
    ///
    /// # 参数
    /// - row_number: 表格中的行号（用于错误定位）
    pub fn map_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
        mapping: &ColumnMapping,
    ) -> ImportResult<ProductRecord> {
        let mut record = ProductRecord::default();

        for (header, target) in mapping {
            let value = match row.get(header).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => continue,
            };
            match target.as_str() {
                core_keys::CODE_ARTICLE => record.code_article = value,
                core_keys::NUMERO_LIGNE => record.numero_ligne = value,
                core_keys::DESIGNATION => record.designation = value,
                _ => {
                    record.values.insert(target.clone(), value);
                }
            }
        }

        for (field, value) in [
            (core_keys::CODE_ARTICLE, &record.code_article),
            (core_keys::NUMERO_LIGNE, &record.numero_ligne),
        ] {
            if value.is_empty() {
                return Err(ImportError::PrimaryKeyMissing {
                    row: row_number,
                    field: field.to_string(),
                });
            }
        }
        if !is_valid_line_number(&record.numero_ligne) {
            return Err(ImportError::InvalidLineNumber {
                row: row_number,
                value: record.numero_ligne,
            });
        }

        Ok(record)
    }
}

fn match_target(header: &str, targets: &[TargetField]) -> Option<String> {
    let wanted = normalize_technical_name(header.trim());
    if wanted.is_empty() {
        return None;
    }

    targets
        .iter()
        .find(|t| normalize_technical_name(&t.technical_name) == wanted)
        .or_else(|| {
            targets
                .iter()
                .find(|t| normalize_technical_name(&t.field_name) == wanted)
        })
        .map(|t| t.technical_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(field_name: &str, technical_name: &str) -> TargetField {
        TargetField {
            block_name: "Four".to_string(),
            field_name: field_name.to_string(),
            technical_name: technical_name.to_string(),
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_suggest_matches_core_and_fields() {
        let targets = vec![
            target("Température", "temperature_four"),
            target("Durée cuisson", "dureeCuisson"),
        ];
        let mapping = FieldMapper.suggest(
            &headers(&["Code article", "Ligne", "TEMPERATURE_FOUR", "dureecuisson", "Remarque"]),
            &targets,
        );

        assert_eq!(mapping.get("Code article").map(String::as_str), Some("codeArticle"));
        assert_eq!(mapping.get("Ligne").map(String::as_str), Some("numeroLigne"));
        assert_eq!(mapping.get("TEMPERATURE_FOUR").map(String::as_str), Some("temperature_four"));
        assert_eq!(mapping.get("dureecuisson").map(String::as_str), Some("dureeCuisson"));
        assert!(!mapping.contains_key("Remarque"));
    }

    #[test]
    fn test_suggest_assigns_each_target_once() {
        let targets = vec![target("Température", "temperature")];
        let mapping = FieldMapper.suggest(&headers(&["temperature", "Temperature"]), &targets);
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("temperature"));
    }

    #[test]
    fn test_validate_requires_primary_key_columns() {
        let known: HashSet<String> = ["temperature".to_string()].into_iter().collect();
        let hdrs = headers(&["Code", "Temp"]);
        let mut mapping = ColumnMapping::new();
        mapping.insert("Code".to_string(), "codeArticle".to_string());
        mapping.insert("Temp".to_string(), "temperature".to_string());

        let result = FieldMapper.validate(&hdrs, &mapping, &known);
        assert!(matches!(result, Err(ImportError::MissingMapping(f)) if f == "numeroLigne"));

        mapping.insert("Absent".to_string(), "numeroLigne".to_string());
        let result = FieldMapper.validate(&hdrs, &mapping, &known);
        assert!(matches!(result, Err(ImportError::UnknownColumn(c)) if c == "Absent"));
    }

    #[test]
    fn test_validate_rejects_unknown_target() {
        let hdrs = headers(&["Code", "Ligne", "X"]);
        let mut mapping = ColumnMapping::new();
        mapping.insert("Code".to_string(), "codeArticle".to_string());
        mapping.insert("Ligne".to_string(), "numeroLigne".to_string());
        mapping.insert("X".to_string(), "nope".to_string());
        let result = FieldMapper.validate(&hdrs, &mapping, &HashSet::new());
        assert!(matches!(result, Err(ImportError::UnknownTarget(t)) if t == "nope"));
    }

    #[test]
    fn test_map_row_skips_empty_cells() {
        let mut mapping = ColumnMapping::new();
        mapping.insert("Code".to_string(), "codeArticle".to_string());
        mapping.insert("Ligne".to_string(), "numeroLigne".to_string());
        mapping.insert("Temp".to_string(), "temperature".to_string());
        mapping.insert("Duree".to_string(), "duree".to_string());

        let record = FieldMapper
            .map_row(
                &row(&[("Code", " BAG001 "), ("Ligne", "4"), ("Temp", "240"), ("Duree", "  ")]),
                2,
                &mapping,
            )
            .unwrap();

        assert_eq!(record.record_key(), "BAG001_4");
        assert_eq!(record.value("temperature"), Some("240"));
        assert!(record.value("duree").is_none());
    }

    #[test]
    fn test_map_row_missing_line() {
        let mut mapping = ColumnMapping::new();
        mapping.insert("Code".to_string(), "codeArticle".to_string());
        mapping.insert("Ligne".to_string(), "numeroLigne".to_string());

        let result = FieldMapper.map_row(&row(&[("Code", "BAG001"), ("Ligne", "")]), 7, &mapping);
        assert!(matches!(
            result,
            Err(ImportError::PrimaryKeyMissing { row: 7, ref field }) if field == "numeroLigne"
        ));
    }

    #[test]
    fn test_map_row_rejects_separator_in_line() {
        let mut mapping = ColumnMapping::new();
        mapping.insert("Code".to_string(), "codeArticle".to_string());
        mapping.insert("Ligne".to_string(), "numeroLigne".to_string());

        let result = FieldMapper.map_row(&row(&[("Code", "A"), ("Ligne", "1_2")]), 3, &mapping);
        assert!(matches!(
            result,
            Err(ImportError::InvalidLineNumber { row: 3, ref value }) if value == "1_2"
        ));
    }
}
