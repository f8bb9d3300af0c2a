// ==========================================
// 面包生产线设定系统 - 编辑会话
// ==========================================
// 状态机（按实体类型各自独立）:
//   Idle -> Editing -> Saved     -> Idle
//                   -> Cancelled -> Idle
// 约束: 同一时刻最多一个区块、一个字段处于编辑中；
//       打开第二个编辑目标会隐式关闭第一个
// ==========================================

use crate::domain::block::{find_block, Block};
use crate::engine::config_editor::{update_block, update_field, BlockProperty, FieldProperty};
use crate::engine::visibility::parse_applicable_lines;
use serde::{Deserialize, Serialize};

/// 字段编辑目标（区块 id + 字段 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub block_id: String,
    pub field_id: String,
}

/// 编辑结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditOutcome {
    Saved,
    Cancelled,
    /// 当前没有对应的编辑目标
    NotEditing,
}

/// 区块编辑表单内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDraft {
    pub name: String,
    pub technical_name: String,
    /// 逗号分隔的适用产线文本
    pub applicable_lines: String,
    pub visible: bool,
}

/// 字段编辑表单内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    pub name: String,
    pub technical_name: String,
    pub applicable_lines: String,
    pub visible: bool,
}

impl BlockDraft {
    /// 从现有区块预填表单
    pub fn from_block(block: &Block) -> Self {
        Self {
            name: block.name.clone(),
            technical_name: block.technical_name.clone(),
            applicable_lines: block.applicable_lines.join(", "),
            visible: block.visible,
        }
    }
}

// ==========================================
// EditSession
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    pub editing_block_id: Option<String>,
    pub editing_field: Option<FieldRef>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开区块编辑
    ///
    /// # 返回
    /// - 被隐式关闭的前一个区块 id（如有）
    pub fn begin_block_edit(&mut self, block_id: &str) -> Option<String> {
        let previous = self.editing_block_id.replace(block_id.to_string());
        previous.filter(|p| p != block_id)
    }

    /// 打开字段编辑
    pub fn begin_field_edit(&mut self, block_id: &str, field_id: &str) -> Option<FieldRef> {
        let target = FieldRef {
            block_id: block_id.to_string(),
            field_id: field_id.to_string(),
        };
        let previous = self.editing_field.replace(target.clone());
        previous.filter(|p| *p != target)
    }

    pub fn is_editing_block(&self, block_id: &str) -> bool {
        self.editing_block_id.as_deref() == Some(block_id)
    }

    pub fn is_editing_field(&self, block_id: &str, field_id: &str) -> bool {
        self.editing_field
            .as_ref()
            .map(|r| r.block_id == block_id && r.field_id == field_id)
            .unwrap_or(false)
    }

    /// 提交区块编辑：将表单内容写入区块并回到 Idle
    ///
    /// 表单校验由调用方在此之前完成
    pub fn save_block_edit(&mut self, blocks: &[Block], draft: &BlockDraft) -> (Vec<Block>, EditOutcome) {
        let block_id = match self.editing_block_id.take() {
            Some(id) => id,
            None => return (blocks.to_vec(), EditOutcome::NotEditing),
        };
        (apply_block_draft(blocks, &block_id, draft), EditOutcome::Saved)
    }

    /// 提交字段编辑
    pub fn save_field_edit(&mut self, blocks: &[Block], draft: &FieldDraft) -> (Vec<Block>, EditOutcome) {
        let target = match self.editing_field.take() {
            Some(t) => t,
            None => return (blocks.to_vec(), EditOutcome::NotEditing),
        };
        (
            apply_field_draft(blocks, &target.block_id, &target.field_id, draft),
            EditOutcome::Saved,
        )
    }

    pub fn cancel_block_edit(&mut self) -> EditOutcome {
        match self.editing_block_id.take() {
            Some(_) => EditOutcome::Cancelled,
            None => EditOutcome::NotEditing,
        }
    }

    pub fn cancel_field_edit(&mut self) -> EditOutcome {
        match self.editing_field.take() {
            Some(_) => EditOutcome::Cancelled,
            None => EditOutcome::NotEditing,
        }
    }

    /// 编辑目标被删除时同步关闭
    pub fn forget_deleted(&mut self, blocks: &[Block]) {
        if let Some(id) = &self.editing_block_id {
            if find_block(blocks, id).is_none() {
                self.editing_block_id = None;
            }
        }
        if let Some(target) = &self.editing_field {
            let exists = find_block(blocks, &target.block_id)
                .and_then(|b| b.field(&target.field_id))
                .is_some();
            if !exists {
                self.editing_field = None;
            }
        }
    }
}

/// 将区块表单写入区块
pub fn apply_block_draft(blocks: &[Block], block_id: &str, draft: &BlockDraft) -> Vec<Block> {
    let next = update_block(blocks, block_id, BlockProperty::Name(draft.name.trim().to_string()));
    let next = update_block(
        &next,
        block_id,
        BlockProperty::TechnicalName(draft.technical_name.trim().to_string()),
    );
    let next = update_block(
        &next,
        block_id,
        BlockProperty::ApplicableLines(parse_applicable_lines(&draft.applicable_lines)),
    );
    update_block(&next, block_id, BlockProperty::Visible(draft.visible))
}

/// 将字段表单写入字段
pub fn apply_field_draft(
    blocks: &[Block],
    block_id: &str,
    field_id: &str,
    draft: &FieldDraft,
) -> Vec<Block> {
    let next = update_field(blocks, block_id, field_id, FieldProperty::Name(draft.name.trim().to_string()));
    let next = update_field(
        &next,
        block_id,
        field_id,
        FieldProperty::TechnicalName(draft.technical_name.trim().to_string()),
    );
    let next = update_field(
        &next,
        block_id,
        field_id,
        FieldProperty::ApplicableLines(parse_applicable_lines(&draft.applicable_lines)),
    );
    update_field(&next, block_id, field_id, FieldProperty::Visible(draft.visible))
}
