use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::MigrationReport;
use crate::app::state::AppState;
use crate::domain::product::ProductRecord;
use crate::engine::sheet_view::SheetView;
use crate::i18n::t;

use super::common::{HttpResult, LineQuery, Notified, Operator};

// ==========================================
// 设定单相关路由
// ==========================================

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub line: Option<String>,
}

/// GET /api/products?q=&line=
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> HttpResult<Json<Vec<ProductRecord>>> {
    let records = state
        .product_api
        .search(query.q.as_deref(), query.line.as_deref())
        .await?;
    Ok(Json(records))
}

/// PUT /api/products
pub async fn save_product(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    Json(record): Json<ProductRecord>,
) -> HttpResult<Json<Notified<ProductRecord>>> {
    let merged = state
        .product_api
        .save_record(operator.as_deref(), record)
        .await?;
    Ok(Json(Notified {
        data: merged,
        notification: t("product.saved"),
    }))
}

/// GET /api/products/:code/:line
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path((code, line)): Path<(String, String)>,
) -> HttpResult<Json<ProductRecord>> {
    Ok(Json(state.product_api.load_record(&code, &line).await?))
}

/// GET /api/products/:code/:line/sheet
pub async fn get_sheet(
    State(state): State<Arc<AppState>>,
    Path((code, line)): Path<(String, String)>,
) -> HttpResult<Json<SheetView>> {
    Ok(Json(state.product_api.sheet_view(&code, &line).await?))
}

/// GET /api/products/:code/:line/sheet.csv
pub async fn export_sheet(
    State(state): State<Arc<AppState>>,
    Path((code, line)): Path<(String, String)>,
) -> HttpResult<impl IntoResponse> {
    let csv = state.product_api.export_csv(&code, &line).await?;
    let disposition = format!(
        "attachment; filename=\"reglages_{}_{}.csv\"",
        sanitize_filename_part(&code),
        sanitize_filename_part(&line)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// GET /api/form?line=
pub async fn form_template(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LineQuery>,
) -> HttpResult<Json<SheetView>> {
    Ok(Json(state.product_api.form_template(query.line()).await?))
}

/// POST /api/products/migrate-legacy-keys
pub async fn migrate_legacy_keys(
    State(state): State<Arc<AppState>>,
    operator: Operator,
) -> HttpResult<Json<MigrationReport>> {
    Ok(Json(
        state
            .product_api
            .migrate_legacy_keys(operator.as_deref())
            .await?,
    ))
}

/// 文件名中只保留字母数字与 - _
fn sanitize_filename_part(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
