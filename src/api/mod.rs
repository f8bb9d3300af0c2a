// ==========================================
// 面包生产线设定系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由调用
// ==========================================

pub mod auth;
pub mod config_api;
pub mod editor_api;
pub mod error;
pub mod import_api;
pub mod product_api;
pub mod validator;

// 重导出核心类型
pub use auth::require_operator;
pub use config_api::ConfigApi;
pub use editor_api::{CommandOutcome, EditorApi, EditorCommand, EditorWorkspace};
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportReport};
pub use product_api::{MigrationReport, ProductApi};
