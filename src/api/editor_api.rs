// ==========================================
// 面包生产线设定系统 - 配置编辑器 API
// ==========================================
// 职责: 每个操作人一个编辑工作区（草稿区块列表 + 编辑会话），
//       逐条应用编辑命令，最后整体保存或丢弃
// 约束: 保存失败时工作区保持不变；保存以打开时的 revision 做版本比对
// ==========================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::api::auth::require_operator;
use crate::api::config_api::ConfigApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_block_draft, validate_field_draft};
use crate::domain::block::{Block, Field};
use crate::domain::config_document::ConfigSnapshot;
use crate::domain::types::MoveDirection;
use crate::engine::config_editor::{
    add_block, add_field, delete_block, delete_field, move_block, move_field, update_block,
    update_field, BlockProperty, FieldProperty,
};
use crate::engine::edit_session::{BlockDraft, EditOutcome, EditSession, FieldDraft};

// ==========================================
// 编辑命令
// ==========================================

/// 一次编辑意图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum EditorCommand {
    AddBlock,
    AddField {
        block_id: String,
    },
    DeleteBlock {
        block_id: String,
    },
    DeleteField {
        block_id: String,
        field_id: String,
    },
    MoveBlock {
        block_id: String,
        direction: MoveDirection,
    },
    MoveField {
        block_id: String,
        field_id: String,
        direction: MoveDirection,
    },
    UpdateBlock {
        block_id: String,
        change: BlockProperty,
    },
    UpdateField {
        block_id: String,
        field_id: String,
        change: FieldProperty,
    },
    BeginBlockEdit {
        block_id: String,
    },
    SaveBlockEdit {
        draft: BlockDraft,
    },
    CancelBlockEdit,
    BeginFieldEdit {
        block_id: String,
        field_id: String,
    },
    SaveFieldEdit {
        draft: FieldDraft,
    },
    CancelFieldEdit,
}

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum CommandOutcome {
    Applied,
    /// 目标不存在或已在边界，列表未变化
    Unchanged,
    BlockAdded {
        block: Block,
    },
    FieldAdded {
        block_id: String,
        field: Field,
    },
    EditStarted {
        /// 被隐式关闭的前一个编辑目标
        closed_previous: bool,
    },
    EditFinished {
        outcome: EditOutcome,
    },
}

// ==========================================
// EditorWorkspace - 编辑工作区
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorWorkspace {
    pub blocks: Vec<Block>,
    pub session: EditSession,
    /// 打开工作区时的配置 revision
    pub base_revision: i64,
    /// 是否有未保存的修改
    pub dirty: bool,
    /// 每次打开工作区分配的编号
    #[serde(skip)]
    lineage: u64,
    /// 已应用的命令数
    #[serde(skip)]
    generation: u64,
}

impl EditorWorkspace {
    pub fn from_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            blocks: snapshot.blocks,
            session: EditSession::new(),
            base_revision: snapshot.revision,
            dirty: false,
            lineage: 0,
            generation: 0,
        }
    }

    /// 应用一条命令
    ///
    /// 校验失败时工作区不变，编辑会话保持打开
    pub fn apply(&mut self, command: EditorCommand) -> ApiResult<CommandOutcome> {
        let outcome = match command {
            EditorCommand::AddBlock => {
                let (next, block) = add_block(&self.blocks);
                self.replace_blocks(next);
                CommandOutcome::BlockAdded { block }
            }
            EditorCommand::AddField { block_id } => {
                let (next, field) = add_field(&self.blocks, &block_id)
                    .ok_or_else(|| ApiError::NotFound(format!("区块(id={})不存在", block_id)))?;
                self.replace_blocks(next);
                CommandOutcome::FieldAdded { block_id, field }
            }
            EditorCommand::DeleteBlock { block_id } => {
                let outcome = self.replace_blocks(delete_block(&self.blocks, &block_id));
                self.session.forget_deleted(&self.blocks);
                outcome
            }
            EditorCommand::DeleteField { block_id, field_id } => {
                let outcome = self.replace_blocks(delete_field(&self.blocks, &block_id, &field_id));
                self.session.forget_deleted(&self.blocks);
                outcome
            }
            EditorCommand::MoveBlock {
                block_id,
                direction,
            } => self.replace_blocks(move_block(&self.blocks, &block_id, direction)),
            EditorCommand::MoveField {
                block_id,
                field_id,
                direction,
            } => self.replace_blocks(move_field(&self.blocks, &block_id, &field_id, direction)),
            EditorCommand::UpdateBlock { block_id, change } => {
                self.replace_blocks(update_block(&self.blocks, &block_id, change))
            }
            EditorCommand::UpdateField {
                block_id,
                field_id,
                change,
            } => self.replace_blocks(update_field(&self.blocks, &block_id, &field_id, change)),
            EditorCommand::BeginBlockEdit { block_id } => {
                self.ensure_block(&block_id)?;
                let previous = self.session.begin_block_edit(&block_id);
                CommandOutcome::EditStarted {
                    closed_previous: previous.is_some(),
                }
            }
            EditorCommand::SaveBlockEdit { draft } => {
                if let Some(block_id) = self.session.editing_block_id.clone() {
                    validate_block_draft(&self.blocks, &block_id, &draft)?;
                }
                let (next, outcome) = self.session.save_block_edit(&self.blocks, &draft);
                if outcome == EditOutcome::Saved {
                    self.replace_blocks(next);
                }
                CommandOutcome::EditFinished { outcome }
            }
            EditorCommand::CancelBlockEdit => CommandOutcome::EditFinished {
                outcome: self.session.cancel_block_edit(),
            },
            EditorCommand::BeginFieldEdit { block_id, field_id } => {
                let exists = self
                    .blocks
                    .iter()
                    .find(|b| b.id == block_id)
                    .and_then(|b| b.field(&field_id))
                    .is_some();
                if !exists {
                    return Err(ApiError::NotFound(format!(
                        "字段(block_id={}, field_id={})不存在",
                        block_id, field_id
                    )));
                }
                let previous = self.session.begin_field_edit(&block_id, &field_id);
                CommandOutcome::EditStarted {
                    closed_previous: previous.is_some(),
                }
            }
            EditorCommand::SaveFieldEdit { draft } => {
                if let Some(target) = self.session.editing_field.clone() {
                    validate_field_draft(&self.blocks, &target.block_id, &target.field_id, &draft)?;
                }
                let (next, outcome) = self.session.save_field_edit(&self.blocks, &draft);
                if outcome == EditOutcome::Saved {
                    self.replace_blocks(next);
                }
                CommandOutcome::EditFinished { outcome }
            }
            EditorCommand::CancelFieldEdit => CommandOutcome::EditFinished {
                outcome: self.session.cancel_field_edit(),
            },
        };

        Ok(outcome)
    }

    fn ensure_block(&self, block_id: &str) -> ApiResult<()> {
        if self.blocks.iter().any(|b| b.id == block_id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("区块(id={})不存在", block_id)))
        }
    }

    fn replace_blocks(&mut self, next: Vec<Block>) -> CommandOutcome {
        if next == self.blocks {
            return CommandOutcome::Unchanged;
        }
        self.blocks = next;
        self.dirty = true;
        CommandOutcome::Applied
    }
}

// ==========================================
// EditorApi - 编辑器 API
// ==========================================
pub struct EditorApi {
    config_api: Arc<ConfigApi>,
    workspaces: Mutex<HashMap<String, EditorWorkspace>>,
    next_lineage: AtomicU64,
}

impl EditorApi {
    pub fn new(config_api: Arc<ConfigApi>) -> Self {
        Self {
            config_api,
            workspaces: Mutex::new(HashMap::new()),
            next_lineage: AtomicU64::new(1),
        }
    }

    fn fresh_workspace(&self, snapshot: ConfigSnapshot) -> EditorWorkspace {
        let mut workspace = EditorWorkspace::from_snapshot(snapshot);
        workspace.lineage = self.next_lineage.fetch_add(1, Ordering::Relaxed);
        workspace
    }

    /// 工作区锁；持锁线程 panic 后继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, HashMap<String, EditorWorkspace>> {
        self.workspaces.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("编辑工作区锁曾被中断，继续使用现有工作区");
            PoisonError::into_inner(poisoned)
        })
    }

    /// 打开（或重新打开）工作区，丢弃之前未保存的修改
    pub async fn open(&self, operator: Option<&str>) -> ApiResult<EditorWorkspace> {
        let operator = require_operator(operator)?;
        let snapshot = self.config_api.load_configuration().await?;
        let workspace = self.fresh_workspace(snapshot);

        self.lock().insert(operator.to_string(), workspace.clone());
        tracing::info!(operator, revision = workspace.base_revision, "编辑工作区已打开");
        Ok(workspace)
    }

    /// 当前工作区
    pub fn current(&self, operator: Option<&str>) -> ApiResult<EditorWorkspace> {
        let operator = require_operator(operator)?;
        self.lock()
            .get(operator)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("操作人 {} 没有打开的编辑工作区", operator)))
    }

    /// 执行一条编辑命令
    pub fn command(
        &self,
        operator: Option<&str>,
        command: EditorCommand,
    ) -> ApiResult<(EditorWorkspace, CommandOutcome)> {
        let operator = require_operator(operator)?;
        let mut workspaces = self.lock();
        let workspace = workspaces
            .get_mut(operator)
            .ok_or_else(|| ApiError::NotFound(format!("操作人 {} 没有打开的编辑工作区", operator)))?;

        tracing::debug!(operator, ?command, "应用编辑命令");
        let outcome = workspace.apply(command)?;
        workspace.generation += 1;
        Ok((workspace.clone(), outcome))
    }

    /// 保存工作区
    ///
    /// # 返回
    /// - 成功: 保存后的快照；工作区仍是被保存的草稿时基于新 revision 重置，
    ///   保存期间又有新命令时保留新修改，仅推进 base_revision
    /// - 失败: 错误原样返回，工作区内容不变
    pub async fn save(&self, operator: Option<&str>) -> ApiResult<ConfigSnapshot> {
        let draft = self.current(operator)?;
        let operator = require_operator(operator)?;

        let saved = match self
            .config_api
            .save_configuration(Some(operator), draft.blocks, Some(draft.base_revision))
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(operator, error = %e, "编辑工作区保存失败，保留本地修改");
                return Err(e);
            }
        };

        let mut workspaces = self.lock();
        match workspaces.get_mut(operator) {
            Some(workspace) if workspace.lineage != draft.lineage => {
                // 保存期间工作区已被重新打开，保留新工作区
            }
            Some(workspace) if workspace.generation != draft.generation => {
                tracing::info!(
                    operator,
                    revision = saved.revision,
                    "保存期间有新的编辑命令，保留未保存修改"
                );
                workspace.base_revision = saved.revision;
            }
            Some(workspace) => *workspace = self.fresh_workspace(saved.clone()),
            None => {}
        }
        Ok(saved)
    }

    /// 丢弃工作区
    ///
    /// # 返回
    /// - 是否存在被丢弃的工作区
    pub fn discard(&self, operator: Option<&str>) -> ApiResult<bool> {
        let operator = require_operator(operator)?;
        let removed = self.lock().remove(operator).is_some();
        tracing::info!(operator, removed, "编辑工作区已丢弃");
        Ok(removed)
    }
}
