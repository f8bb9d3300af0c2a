// ==========================================
// 面包生产线设定系统 - 表单与配置校验器
// ==========================================
// 职责: 编辑表单提交前校验、整份配置保存前校验、设定记录校验
// 说明: 引擎层的编辑函数不做校验，校验统一在此完成
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::block::{find_block, Block};
use crate::domain::product::{is_valid_line_number, ProductRecord, RECORD_KEY_SEPARATOR};
use crate::engine::edit_session::{BlockDraft, FieldDraft};
use crate::engine::technical_name::is_valid_technical_name;
use crate::engine::visibility::parse_applicable_lines;
use std::collections::HashSet;

/// 校验区块编辑表单
///
/// # 参数
/// - block_id: 正在编辑的区块（唯一性比较时排除自身）
pub fn validate_block_draft(blocks: &[Block], block_id: &str, draft: &BlockDraft) -> ApiResult<()> {
    let mut violations = draft_violations(&draft.name, &draft.technical_name, &draft.applicable_lines);

    let technical_name = draft.technical_name.trim();
    let taken = blocks
        .iter()
        .any(|b| b.id != block_id && b.technical_name == technical_name);
    if taken {
        violations.push(format!("区块技术名重复: {}", technical_name));
    }

    into_result(violations)
}

/// 校验字段编辑表单（技术名在所属区块内唯一）
pub fn validate_field_draft(
    blocks: &[Block],
    block_id: &str,
    field_id: &str,
    draft: &FieldDraft,
) -> ApiResult<()> {
    let block = find_block(blocks, block_id)
        .ok_or_else(|| ApiError::NotFound(format!("区块(id={})不存在", block_id)))?;

    let mut violations = draft_violations(&draft.name, &draft.technical_name, &draft.applicable_lines);

    let technical_name = draft.technical_name.trim();
    let taken = block
        .fields
        .iter()
        .any(|f| f.id != field_id && f.technical_name == technical_name);
    if taken {
        violations.push(format!("字段技术名在区块内重复: {}", technical_name));
    }

    into_result(violations)
}

/// 保存整份配置前的结构校验
///
/// - id 非空且唯一
/// - 技术名合法；区块技术名全局唯一，字段技术名区块内唯一
pub fn validate_configuration(blocks: &[Block]) -> ApiResult<()> {
    let mut violations = Vec::new();
    let mut block_ids = HashSet::new();
    let mut block_names = HashSet::new();

    for block in blocks {
        if block.id.trim().is_empty() {
            violations.push("区块 id 不能为空".to_string());
        } else if !block_ids.insert(block.id.as_str()) {
            violations.push(format!("区块 id 重复: {}", block.id));
        }

        if !is_valid_technical_name(&block.technical_name) {
            violations.push(format!("区块技术名不合法: {:?}", block.technical_name));
        } else if !block_names.insert(block.technical_name.as_str()) {
            violations.push(format!("区块技术名重复: {}", block.technical_name));
        }

        let mut field_ids = HashSet::new();
        let mut field_names = HashSet::new();
        for field in &block.fields {
            if field.id.trim().is_empty() {
                violations.push(format!("区块 {} 中存在空字段 id", block.id));
            } else if !field_ids.insert(field.id.as_str()) {
                violations.push(format!("区块 {} 中字段 id 重复: {}", block.id, field.id));
            }

            if !is_valid_technical_name(&field.technical_name) {
                violations.push(format!(
                    "区块 {} 中字段技术名不合法: {:?}",
                    block.id, field.technical_name
                ));
            } else if !field_names.insert(field.technical_name.as_str()) {
                violations.push(format!(
                    "区块 {} 中字段技术名重复: {}",
                    block.id, field.technical_name
                ));
            }
        }
    }

    into_result(violations)
}

/// 设定记录校验：主键字段非空，产线编号不含主键分隔符
pub fn validate_product_record(record: &ProductRecord) -> ApiResult<()> {
    if record.code_article.trim().is_empty() {
        return Err(ApiError::InvalidInput("codeArticle 不能为空".to_string()));
    }
    if record.numero_ligne.trim().is_empty() {
        return Err(ApiError::InvalidInput("numeroLigne 不能为空".to_string()));
    }
    if !is_valid_line_number(&record.numero_ligne) {
        return Err(ApiError::InvalidInput(format!(
            "numeroLigne 不能包含 '{}': {}",
            RECORD_KEY_SEPARATOR, record.numero_ligne
        )));
    }
    Ok(())
}

fn draft_violations(name: &str, technical_name: &str, applicable_lines: &str) -> Vec<String> {
    let mut violations = Vec::new();
    if name.trim().is_empty() {
        violations.push("名称不能为空".to_string());
    }
    if !is_valid_technical_name(technical_name.trim()) {
        violations.push(format!(
            "技术名只能包含字母、数字、下划线: {:?}",
            technical_name.trim()
        ));
    }
    if parse_applicable_lines(applicable_lines).is_empty() {
        violations.push("适用产线不能为空（使用 * 表示全部产线）".to_string());
    }
    violations
}

fn into_result(violations: Vec<String>) -> ApiResult<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(violations.join("; ")))
    }
}
