// ==========================================
// 面包生产线设定系统 - 应用层
// ==========================================
// 职责: 组装共享状态，对外提供 HTTP 接口
// ==========================================

pub mod http_routes;
pub mod state;

// 重导出
pub use http_routes::{build_router, serve, sweep_stale_uploads, UPLOAD_TTL};
pub use state::{get_default_db_path, AppSettings, AppState, DEFAULT_LISTEN_ADDR};
