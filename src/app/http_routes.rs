// ==========================================
// 面包生产线设定系统 - HTTP 路由
// ==========================================
// 职责: 把 API 层暴露为 JSON over HTTP
// 认证: 操作人由前置代理通过 x-reglages-user 请求头传入
// ==========================================

mod common;
mod config;
mod editor;
mod import;
mod product;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;

pub use common::{ErrorResponse, OPERATOR_HEADER};
pub use import::{sweep_stale_uploads, MAX_UPLOAD_BYTES, UPLOAD_TTL};

/// 构建完整路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // 区块配置
        .route("/api/config", get(config::get_config).put(config::save_config))
        .route("/api/config/reset", post(config::reset_config))
        .route("/api/config/visible", get(config::visible_blocks))
        .route(
            "/api/config/overrides",
            get(config::get_line_overrides).put(config::set_line_overrides),
        )
        // 配置编辑器
        .route("/api/editor", get(editor::current_workspace))
        .route("/api/editor/open", post(editor::open_workspace))
        .route("/api/editor/command", post(editor::apply_command))
        .route("/api/editor/save", post(editor::save_workspace))
        .route("/api/editor/discard", post(editor::discard_workspace))
        // 设定单
        .route(
            "/api/products",
            get(product::search_products).put(product::save_product),
        )
        .route(
            "/api/products/migrate-legacy-keys",
            post(product::migrate_legacy_keys),
        )
        .route("/api/products/:code/:line", get(product::get_product))
        .route("/api/products/:code/:line/sheet", get(product::get_sheet))
        .route("/api/products/:code/:line/sheet.csv", get(product::export_sheet))
        .route("/api/form", get(product::form_template))
        // 导入
        .route(
            "/api/import/preview",
            post(import::preview_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/import/targets", get(import::import_targets))
        .route("/api/import/commit", post(import::commit_import))
        .route("/api/import/uploads/:upload_id", delete(import::discard_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 绑定地址并启动服务
pub async fn serve(state: Arc<AppState>, listen_addr: &str) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("HTTP 服务已启动: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
