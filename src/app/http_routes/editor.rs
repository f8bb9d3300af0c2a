use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::{CommandOutcome, EditorCommand, EditorWorkspace};
use crate::app::state::AppState;
use crate::domain::config_document::ConfigSnapshot;
use crate::i18n::t;

use super::common::{HttpResult, Notified, Operator};

// ==========================================
// 配置编辑器相关路由
// ==========================================

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub workspace: EditorWorkspace,
    pub outcome: CommandOutcome,
}

#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    pub discarded: bool,
}

/// GET /api/editor
pub async fn current_workspace(
    State(state): State<Arc<AppState>>,
    operator: Operator,
) -> HttpResult<Json<EditorWorkspace>> {
    Ok(Json(state.editor_api.current(operator.as_deref())?))
}

/// POST /api/editor/open
pub async fn open_workspace(
    State(state): State<Arc<AppState>>,
    operator: Operator,
) -> HttpResult<Json<EditorWorkspace>> {
    Ok(Json(state.editor_api.open(operator.as_deref()).await?))
}

/// POST /api/editor/command
pub async fn apply_command(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    Json(command): Json<EditorCommand>,
) -> HttpResult<Json<CommandResponse>> {
    let (workspace, outcome) = state.editor_api.command(operator.as_deref(), command)?;
    Ok(Json(CommandResponse { workspace, outcome }))
}

/// POST /api/editor/save
pub async fn save_workspace(
    State(state): State<Arc<AppState>>,
    operator: Operator,
) -> HttpResult<Json<Notified<ConfigSnapshot>>> {
    let snapshot = state.editor_api.save(operator.as_deref()).await?;
    Ok(Json(Notified {
        data: snapshot,
        notification: t("config.saved"),
    }))
}

/// POST /api/editor/discard
pub async fn discard_workspace(
    State(state): State<Arc<AppState>>,
    operator: Operator,
) -> HttpResult<Json<DiscardResponse>> {
    let discarded = state.editor_api.discard(operator.as_deref())?;
    Ok(Json(DiscardResponse { discarded }))
}
