// ==========================================
// 面包生产线设定系统 - 区块与字段实体
// ==========================================
// 职责: 定义配置文档中的 Block / Field 元数据
// 说明: Field 只描述如何展示与过滤取值，值本身存放于 ProductRecord
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Field - 字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    /// 存储键；在所属 Block 内唯一
    #[serde(default)]
    pub technical_name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub applicable_lines: Vec<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

// ==========================================
// Block - 区块
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub name: String,
    /// 全局唯一
    #[serde(default)]
    pub technical_name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub applicable_lines: Vec<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

fn default_visible() -> bool {
    true
}

impl Block {
    /// 按 id 查找字段
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// 按 order 升序排列的字段引用
    pub fn fields_in_order(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }
}

/// 按 id 查找区块
pub fn find_block<'a>(blocks: &'a [Block], block_id: &str) -> Option<&'a Block> {
    blocks.iter().find(|b| b.id == block_id)
}

/// 按 order 升序排列的区块引用
pub fn blocks_in_order(blocks: &[Block]) -> Vec<&Block> {
    let mut sorted: Vec<&Block> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.order);
    sorted
}
