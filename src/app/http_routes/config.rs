use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::state::AppState;
use crate::domain::block::Block;
use crate::domain::config_document::ConfigSnapshot;
use crate::domain::types::BlockLineOverride;
use crate::i18n::t;

use super::common::{HttpResult, LineQuery, Notified, Operator};

// ==========================================
// 区块配置相关路由
// ==========================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConfigRequest {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub expected_revision: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfigRequest {
    #[serde(default)]
    pub expected_revision: Option<i64>,
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> HttpResult<Json<ConfigSnapshot>> {
    Ok(Json(state.config_api.load_configuration().await?))
}

/// PUT /api/config
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    Json(request): Json<SaveConfigRequest>,
) -> HttpResult<Json<Notified<ConfigSnapshot>>> {
    let snapshot = state
        .config_api
        .save_configuration(operator.as_deref(), request.blocks, request.expected_revision)
        .await?;
    Ok(Json(Notified {
        data: snapshot,
        notification: t("config.saved"),
    }))
}

/// POST /api/config/reset
pub async fn reset_config(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    request: Option<Json<ResetConfigRequest>>,
) -> HttpResult<Json<Notified<ConfigSnapshot>>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let snapshot = state
        .config_api
        .reset_to_default(operator.as_deref(), request.expected_revision)
        .await?;
    Ok(Json(Notified {
        data: snapshot,
        notification: t("config.reset"),
    }))
}

/// GET /api/config/visible?line=
pub async fn visible_blocks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LineQuery>,
) -> HttpResult<Json<Vec<Block>>> {
    Ok(Json(state.config_api.visible_blocks(query.line()).await?))
}

/// GET /api/config/overrides
pub async fn get_line_overrides(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<BlockLineOverride>>> {
    Ok(Json(state.config_api.line_overrides().await?))
}

/// PUT /api/config/overrides
pub async fn set_line_overrides(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    Json(overrides): Json<Vec<BlockLineOverride>>,
) -> HttpResult<Json<Vec<BlockLineOverride>>> {
    Ok(Json(
        state
            .config_api
            .set_line_overrides(operator.as_deref(), overrides)
            .await?,
    ))
}
