use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

// ==========================================
// 公共工具：错误映射、操作人提取
// ==========================================

/// 前置认证代理注入的操作人请求头
pub const OPERATOR_HEADER: &str = "x-reglages-user";

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 当前语言的界面提示
    pub notification: String,
}

/// ApiError 的 HTTP 包装
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        HttpError(err)
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

fn status_of(err: &ApiError) -> StatusCode {
    match err {
        ApiError::InvalidInput(_) | ApiError::ImportError(_) => StatusCode::BAD_REQUEST,
        ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        ApiError::VersionConflict { .. } => StatusCode::CONFLICT,
        ApiError::DatabaseError(_)
        | ApiError::DatabaseConnectionError(_)
        | ApiError::DatabaseTransactionError(_)
        | ApiError::InternalError(_)
        | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_of(&err);
        if status.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "请求处理失败");
        } else {
            tracing::warn!(code = err.code(), error = %err, "请求被拒绝");
        }

        let body = ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            notification: err.notification(),
        };
        (status, Json(body)).into_response()
    }
}

/// 请求中的操作人（可能缺失，是否必需由 API 层判定）
#[derive(Debug, Clone, Default)]
pub struct Operator(pub Option<String>);

impl Operator {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = match parts.headers.get(OPERATOR_HEADER) {
            Some(raw) => Some(
                raw.to_str()
                    .map_err(|_| ApiError::InvalidInput(format!("{} 请求头不是合法文本", OPERATOR_HEADER)))?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };
        Ok(Operator(value.filter(|v| !v.is_empty())))
    }
}

/// 产线查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineQuery {
    pub line: Option<String>,
}

impl LineQuery {
    pub fn line(&self) -> Option<&str> {
        self.line.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// 成功响应中附带的界面提示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notified<T> {
    #[serde(flatten)]
    pub data: T,
    pub notification: String,
}
