//! 鉴权错误定义。

use std::fmt;

/// 错误分类：调用方按分类决定重试或放弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// token 不可信：格式、issuer、签名任一环节失败。
    InvalidToken,
    /// 外部存储读取失败。
    Store,
    /// 签名失败或当前签名模式不支持该操作。
    Signing,
    /// 启动配置无效。
    Config,
}

/// 鉴权错误。
#[derive(Debug)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    /// 构造统一错误。
    pub fn new(kind: AuthErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// token 校验失败。所有失败分支共用同一 code 与文案。
    pub fn invalid_token() -> Self {
        Self::new(
            AuthErrorKind::InvalidToken,
            "ACCESS_TOKEN_INVALID",
            "Invalid token",
        )
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Store, "STORE_UNAVAILABLE", message)
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Signing, "SIGNING_FAILED", message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Config, "CONFIG_INVALID", message)
    }

    pub fn is_invalid_token(&self) -> bool {
        self.kind == AuthErrorKind::InvalidToken
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::{AuthError, AuthErrorKind};

    #[test]
    fn invalid_token_is_uniform() {
        let a = AuthError::invalid_token();
        let b = AuthError::invalid_token();
        assert_eq!(a.kind, AuthErrorKind::InvalidToken);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.to_string(), "ACCESS_TOKEN_INVALID: Invalid token");
    }
}
