//! 运行时配置
//!
//! 后端地址在编译期通过 `ESTUDIO_API_URL` 注入，未设置时使用本地开发地址。

use estudio_shared::gateway::{DEFAULT_API_URL, normalize_base_url};
use std::time::Duration;

/// 提示框显示时长
pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

/// 仪表盘紧急程度的刷新周期（毫秒）
pub const URGENCY_REFRESH_MS: u32 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_url: String,
}

impl RuntimeConfig {
    pub fn load() -> Self {
        Self::from_raw(option_env!("ESTUDIO_API_URL"))
    }

    fn from_raw(raw: Option<&str>) -> Self {
        let raw = raw.filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_API_URL);
        Self {
            api_url: normalize_base_url(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        assert_eq!(RuntimeConfig::from_raw(None).api_url, DEFAULT_API_URL);
        assert_eq!(RuntimeConfig::from_raw(Some("  ")).api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_trailing_slash_removed() {
        let cfg = RuntimeConfig::from_raw(Some("https://estudio.example/api/"));
        assert_eq!(cfg.api_url, "https://estudio.example/api");
    }
}
