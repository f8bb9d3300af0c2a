// ==========================================
// 面包生产线设定系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/导入错误为用户友好的错误消息
// 提示: notification() 返回当前语言的界面提示
// ==========================================

use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("未认证: 写操作需要登录用户")]
    Unauthorized,

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("配置版本冲突: 期望revision={expected}，实际revision={actual}")]
    VersionConflict { expected: i64, actual: i64 },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定的错误代码（HTTP 响应体中的 code）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::VersionConflict { .. } => "VERSION_CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// 面向操作人员的提示（当前语言）
    pub fn notification(&self) -> String {
        match self {
            ApiError::Unauthorized => t("auth.required"),
            ApiError::VersionConflict { .. } => t("config.conflict"),
            ApiError::NotFound(detail) => t_with_args("common.not_found", &[("detail", detail)]),
            ApiError::InvalidInput(reason) | ApiError::ValidationError(reason) => {
                t_with_args("common.validation_failed", &[("reason", reason)])
            }
            ApiError::ImportError(reason) => t_with_args("import.failed", &[("reason", reason)]),
            _ => t("common.internal_error"),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RevisionConflict { expected, actual } => {
                ApiError::VersionConflict { expected, actual }
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => {
                ApiError::NotFound(t_with_args("import.file_not_found", &[("path", &path)]))
            }
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductRecord".to_string(),
            id: "BAG001_4".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ProductRecord"));
                assert!(msg.contains("BAG001_4"));
            }
            _ => panic!("Expected NotFound"),
        }

        let repo_err = RepositoryError::RevisionConflict {
            expected: 3,
            actual: 5,
        };
        let api_err: ApiError = repo_err.into();
        assert!(matches!(
            api_err,
            ApiError::VersionConflict {
                expected: 3,
                actual: 5
            }
        ));
        assert_eq!(api_err.code(), "VERSION_CONFLICT");
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::TooManyRows {
            rows: 10,
            max_rows: 5,
        }
        .into();
        assert_eq!(api_err.code(), "IMPORT_ERROR");

        let api_err: ApiError = ImportError::FileNotFound("/tmp/x.csv".to_string()).into();
        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains("/tmp/x.csv")),
            _ => panic!("Expected NotFound"),
        }
    }
}
