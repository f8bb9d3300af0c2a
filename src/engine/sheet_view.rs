// ==========================================
// 面包生产线设定系统 - 设定单视图
// ==========================================
// 职责: 表单 / 打印单 / 导出共用的渲染模型
// 规则: 先经 VisibilityResolver 过滤，再按 order 升序排列
// ==========================================

use crate::domain::block::{blocks_in_order, Block};
use crate::domain::product::ProductRecord;
use crate::engine::visibility::VisibilityResolver;
use serde::{Deserialize, Serialize};

/// 视图中的字段（含取值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetField {
    pub field_id: String,
    pub name: String,
    pub technical_name: String,
    /// 记录中没有该键时为空字符串
    pub value: String,
}

/// 视图中的区块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetBlock {
    pub block_id: String,
    pub name: String,
    pub technical_name: String,
    pub fields: Vec<SheetField>,
}

/// 一张设定单的完整视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub code_article: String,
    pub numero_ligne: String,
    pub designation: String,
    pub blocks: Vec<SheetBlock>,
}

/// 可映射的导入目标字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetField {
    pub block_name: String,
    pub field_name: String,
    pub technical_name: String,
}

/// 构建设定单视图
///
/// # 参数
/// - record: None 时生成空白表单（新建设定单）
/// - line: 产线号；record 存在时以 record.numero_ligne 为准
pub fn build_sheet_view(
    resolver: &VisibilityResolver,
    blocks: &[Block],
    record: Option<&ProductRecord>,
    line: Option<&str>,
) -> SheetView {
    let line = record.map(|r| r.numero_ligne.as_str()).or(line);

    let sheet_blocks = blocks_in_order(blocks)
        .into_iter()
        .filter(|b| resolver.block_passes(b, line))
        .map(|block| {
            let mut fields = resolver.visible_fields(block, line);
            fields.sort_by_key(|f| f.order);
            SheetBlock {
                block_id: block.id.clone(),
                name: block.name.clone(),
                technical_name: block.technical_name.clone(),
                fields: fields
                    .into_iter()
                    .map(|f| SheetField {
                        field_id: f.id.clone(),
                        name: f.name.clone(),
                        technical_name: f.technical_name.clone(),
                        value: record
                            .and_then(|r| r.value(&f.technical_name))
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect(),
            }
        })
        .collect();

    SheetView {
        code_article: record.map(|r| r.code_article.clone()).unwrap_or_default(),
        numero_ligne: line.unwrap_or_default().to_string(),
        designation: record.map(|r| r.designation.clone()).unwrap_or_default(),
        blocks: sheet_blocks,
    }
}

/// 当前可见的导入目标字段（按区块、字段 order 排列）
pub fn visible_target_fields(
    resolver: &VisibilityResolver,
    blocks: &[Block],
    line: Option<&str>,
) -> Vec<TargetField> {
    build_sheet_view(resolver, blocks, None, line)
        .blocks
        .into_iter()
        .flat_map(|block| {
            let block_name = block.name;
            block.fields.into_iter().map(move |f| TargetField {
                block_name: block_name.clone(),
                field_name: f.name,
                technical_name: f.technical_name,
            })
        })
        .collect()
}

/// 导出打印用 CSV（分号分隔）
///
/// 前三行为核心字段，之后每个可见字段一行: 区块;字段;取值
pub fn export_sheet_csv(view: &SheetView) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(["codeArticle", view.code_article.as_str()])?;
    writer.write_record(["numeroLigne", view.numero_ligne.as_str()])?;
    writer.write_record(["designation", view.designation.as_str()])?;
    writer.write_record(["bloc", "champ", "valeur"])?;

    for block in &view.blocks {
        for field in &block.fields {
            writer.write_record([block.name.as_str(), field.name.as_str(), field.value.as_str()])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
