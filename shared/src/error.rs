use std::fmt;

// =========================================================
// 错误类别枚举
// =========================================================

/// 错误类别
///
/// 对应界面上的处理方式：内联提示、强制重新登录、固定提示、原样转述。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 登录凭据错误（登录表单内联显示）
    Authentication,
    /// 会话过期：刷新令牌失败或不存在，必须重新登录
    SessionExpired,
    /// 403: 权限不足
    Forbidden,
    /// 其他非 2xx 响应，携带服务端给出的消息
    Rejected,
    /// 网络层失败（请求未到达或响应不可读）
    Network,
    /// 响应体无法解析为预期结构
    Decode,
    /// 客户端必填字段校验失败，请求未发出
    Validation,
}

impl ApiErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorKind::Authentication => "AUTHENTICATION_FAILED",
            ApiErrorKind::SessionExpired => "SESSION_EXPIRED",
            ApiErrorKind::Forbidden => "FORBIDDEN",
            ApiErrorKind::Rejected => "REJECTED",
            ApiErrorKind::Network => "NETWORK_ERROR",
            ApiErrorKind::Decode => "DECODE_ERROR",
            ApiErrorKind::Validation => "VALIDATION_ERROR",
        }
    }
}

// =========================================================
// 固定提示文案
// =========================================================

pub const MSG_FORBIDDEN: &str = "No tienes permisos de administrador para acceder a esta sección";
pub const MSG_SESSION_EXPIRED: &str = "Sesión expirada. Por favor, inicia sesión nuevamente.";
pub const MSG_BAD_CREDENTIALS: &str = "Credenciales incorrectas";

// =========================================================
// 核心错误类型
// =========================================================

/// 网关层统一错误
///
/// - kind: 错误类别
/// - message: 面向用户的可读消息
/// - status: HTTP 状态码（若错误来自响应）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    // --- Convenience constructors ---

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Authentication, message)
    }

    pub fn session_expired() -> Self {
        Self::new(ApiErrorKind::SessionExpired, MSG_SESSION_EXPIRED).with_status(401)
    }

    pub fn forbidden() -> Self {
        Self::new(ApiErrorKind::Forbidden, MSG_FORBIDDEN).with_status(403)
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Rejected, message).with_status(status)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    // --- Accessors ---

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    /// 是否需要强制重新登录
    pub fn requires_login(&self) -> bool {
        self.kind == ApiErrorKind::SessionExpired
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::decode(e.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =========================================================
// 错误体解析
// =========================================================

/// 从非 2xx 响应体中提取可读消息
///
/// 依次检查 `detail`、`message`、`error` 字段；都不存在时返回 None。
/// DRF 的字段级校验错误（`{"field": ["msg"]}`）取第一条。
pub fn extract_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    for key in ["detail", "message", "error"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                if let Some(serde_json::Value::String(s)) = items.first() {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    let object = value.as_object()?;
    object.iter().find_map(|(field, v)| match v {
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|m| m.as_str())
            .map(|m| format!("{}: {}", field, m)),
        _ => None,
    })
}

/// HTTP 状态码对应的标准原因短语（响应缺少正文消息时的回退）
pub fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_detail_over_message() {
        let body = br#"{"message": "m", "detail": "d", "error": "e"}"#;
        assert_eq!(extract_error_message(body), Some("d".to_string()));
    }

    #[test]
    fn test_extract_falls_through_to_error() {
        let body = br#"{"error": "boom"}"#;
        assert_eq!(extract_error_message(body), Some("boom".to_string()));
    }

    #[test]
    fn test_extract_field_errors() {
        let body = br#"{"username": ["Este nombre de usuario ya existe"]}"#;
        assert_eq!(
            extract_error_message(body),
            Some("username: Este nombre de usuario ya existe".to_string())
        );
    }

    #[test]
    fn test_extract_non_json() {
        assert_eq!(extract_error_message(b"<html>oops</html>"), None);
        assert_eq!(extract_error_message(b""), None);
    }

    #[test]
    fn test_display_is_message_only() {
        let e = ApiError::rejected(409, "Conflicto");
        assert_eq!(e.to_string(), "Conflicto");
        assert_eq!(e.status, Some(409));
        assert_eq!(e.error_code(), "REJECTED");
    }
}
