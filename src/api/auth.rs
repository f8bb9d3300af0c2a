// ==========================================
// 面包生产线设定系统 - 认证闸门
// ==========================================
// 写操作（保存记录、导入、修改配置）必须带操作人；只读操作开放
// 操作人由前置认证代理注入，本服务不做密码校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};

/// 取出有效操作人，缺失或空白时返回 Unauthorized
pub fn require_operator(operator: Option<&str>) -> ApiResult<&str> {
    match operator.map(str::trim) {
        Some(op) if !op.is_empty() => Ok(op),
        _ => {
            tracing::warn!("写操作缺少操作人，已拒绝");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_operator() {
        assert_eq!(require_operator(Some(" marie ")).unwrap(), "marie");
        assert!(matches!(require_operator(Some("  ")), Err(ApiError::Unauthorized)));
        assert!(matches!(require_operator(None), Err(ApiError::Unauthorized)));
    }
}
