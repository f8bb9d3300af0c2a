use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    extract::{Multipart, Path as UrlPath, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::require_operator;
use crate::api::{ApiError, ImportReport};
use crate::app::state::AppState;
use crate::engine::sheet_view::TargetField;
use crate::i18n::t_with_args;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::product_importer::ImportPreview;

use super::common::{HttpResult, LineQuery, Notified, Operator};

// ==========================================
// 设定单导入相关路由
// ==========================================
// 流程: 上传文件 -> 预览（建议映射）-> 确认映射后提交
// 上传文件暂存在 upload_dir，以 uploadId 引用；
// 提交或放弃后删除，未处理的暂存文件超过 UPLOAD_TTL 后清理
// ==========================================

/// 上传大小上限
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 暂存文件保留时长
pub const UPLOAD_TTL: Duration = Duration::from_secs(60 * 60);

/// 允许的上传文件扩展名
const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub upload_id: String,
    pub preview: ImportPreview,
}

#[derive(Debug, Serialize)]
pub struct UploadDiscarded {
    pub discarded: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub upload_id: String,
    pub mapping: ColumnMapping,
}

/// POST /api/import/preview（multipart，字段名 file）
pub async fn preview_upload(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    mut multipart: Multipart,
) -> HttpResult<Json<PreviewResponse>> {
    require_operator(operator.as_deref())?;
    sweep_stale_uploads(&state.upload_dir, UPLOAD_TTL).await;

    let mut stored: Option<(String, PathBuf)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("上传内容无法解析: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| ApiError::InvalidInput("仅支持 csv/xlsx/xls 文件".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("读取上传文件失败: {}", e)))?;

        let upload_id = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);
        let path = state.upload_dir.join(&upload_id);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::InternalError(format!("保存上传文件失败: {}", e)))?;
        tracing::debug!(upload_id = %upload_id, size = bytes.len(), "上传文件已暂存");

        stored = Some((upload_id, path));
        break;
    }

    let (upload_id, path) =
        stored.ok_or_else(|| ApiError::InvalidInput("缺少上传文件字段 file".to_string()))?;

    match state.import_api.preview(operator.as_deref(), &path).await {
        Ok(preview) => Ok(Json(PreviewResponse { upload_id, preview })),
        Err(err) => {
            remove_upload(&path).await;
            Err(err.into())
        }
    }
}

/// GET /api/import/targets?line=
pub async fn import_targets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LineQuery>,
) -> HttpResult<Json<Vec<TargetField>>> {
    Ok(Json(state.import_api.targets(query.line()).await?))
}

/// POST /api/import/commit
pub async fn commit_import(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    Json(request): Json<CommitRequest>,
) -> HttpResult<Json<Notified<ImportReport>>> {
    require_operator(operator.as_deref())?;
    let path = resolve_upload(&state, &request.upload_id)?;

    let result = state
        .import_api
        .import(operator.as_deref(), &path, &request.mapping)
        .await;
    remove_upload(&path).await;

    let report = result?;
    let notification = t_with_args("import.done", &[("imported", &report.imported.to_string())]);
    Ok(Json(Notified {
        data: report,
        notification,
    }))
}

/// DELETE /api/import/uploads/:upload_id（放弃已预览的文件）
pub async fn discard_upload(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    UrlPath(upload_id): UrlPath<String>,
) -> HttpResult<Json<UploadDiscarded>> {
    require_operator(operator.as_deref())?;
    let path = resolve_upload(&state, &upload_id)?;
    let discarded = remove_upload(&path).await;
    tracing::info!(upload_id = %upload_id, discarded, "上传文件已放弃");
    Ok(Json(UploadDiscarded { discarded }))
}

/// 删除暂存目录中修改时间早于 max_age 的文件
///
/// # 返回
/// - 删除的文件数
pub async fn sweep_stale_uploads(dir: &Path, max_age: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "读取上传暂存目录失败");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let stale = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta
                .modified()
                .map(|modified| now.duration_since(modified).unwrap_or_default() >= max_age)
                .unwrap_or(false),
            _ => false,
        };
        if stale && remove_upload(&entry.path()).await {
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), removed, "已清理过期的上传暂存文件");
    }
    removed
}

/// uploadId 只能是暂存目录下的文件名
fn resolve_upload(state: &AppState, upload_id: &str) -> Result<PathBuf, ApiError> {
    let upload_id = upload_id.trim();
    if upload_id.is_empty()
        || upload_id.contains('/')
        || upload_id.contains('\\')
        || upload_id.contains("..")
    {
        return Err(ApiError::InvalidInput(format!("非法的 uploadId: {}", upload_id)));
    }
    Ok(state.upload_dir.join(upload_id))
}

async fn remove_upload(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(file = %path.display(), error = %e, "清理上传文件失败");
            false
        }
    }
}
