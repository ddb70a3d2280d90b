//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其访问要求。

use estudio_shared::Id;
use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面 (默认路由)
    #[default]
    Login,
    /// 仪表盘
    Dashboard,
    /// 案件列表
    Cases,
    /// 新建案件
    NewCase,
    /// 案件详情
    CaseDetail(Id),
    /// 日历
    Calendar,
    /// 用户管理 (仅管理员)
    Users,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            "/expedientes" => Self::Cases,
            "/expedientes/nuevo" => Self::NewCase,
            "/calendario" => Self::Calendar,
            "/usuarios" => Self::Users,
            other => other
                .strip_prefix("/expedientes/")
                .and_then(|id| id.parse::<Id>().ok())
                .map(Self::CaseDetail)
                .unwrap_or(Self::NotFound),
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Cases => "/expedientes".to_string(),
            Self::NewCase => "/expedientes/nuevo".to_string(),
            Self::CaseDetail(id) => format!("/expedientes/{}", id),
            Self::Calendar => "/calendario".to_string(),
            Self::Users => "/usuarios".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::NotFound)
    }

    /// 仅管理员可访问
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::Users)
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }

    /// 守卫：给定认证状态与角色，返回实际应进入的路由
    ///
    /// 返回 `Err(redirect)` 表示需要重定向。
    pub fn guard(self, is_authenticated: bool, is_admin: bool) -> Result<Self, Self> {
        if self.requires_auth() && !is_authenticated {
            return Err(Self::auth_failure_redirect());
        }
        if self.should_redirect_when_authenticated() && is_authenticated {
            return Err(Self::auth_success_redirect());
        }
        if self.requires_admin() && !is_admin {
            return Err(Self::Dashboard);
        }
        Ok(self)
    }

    /// 导航栏高亮用：详情和新建都归属于案件列表
    pub fn section(&self) -> Self {
        match self {
            Self::NewCase | Self::CaseDetail(_) => Self::Cases,
            other => other.clone(),
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_round_trip() {
        for route in [
            AppRoute::Dashboard,
            AppRoute::Cases,
            AppRoute::NewCase,
            AppRoute::CaseDetail(42),
            AppRoute::Calendar,
            AppRoute::Users,
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
        assert_eq!(AppRoute::from_path("/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/login/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/expedientes/42/"), AppRoute::CaseDetail(42));
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(AppRoute::from_path("/expedientes/abc"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/expedientes/1/x"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nada"), AppRoute::NotFound);
    }

    #[test]
    fn test_guard_requires_login() {
        assert_eq!(AppRoute::Cases.guard(false, false), Err(AppRoute::Login));
        assert_eq!(AppRoute::CaseDetail(3).guard(false, true), Err(AppRoute::Login));
        assert_eq!(AppRoute::Login.guard(false, false), Ok(AppRoute::Login));
        assert_eq!(AppRoute::NotFound.guard(false, false), Ok(AppRoute::NotFound));
    }

    #[test]
    fn test_guard_after_login() {
        assert_eq!(AppRoute::Login.guard(true, false), Err(AppRoute::Dashboard));
        assert_eq!(AppRoute::Calendar.guard(true, false), Ok(AppRoute::Calendar));
    }

    #[test]
    fn test_users_page_is_admin_only() {
        assert_eq!(AppRoute::Users.guard(true, false), Err(AppRoute::Dashboard));
        assert_eq!(AppRoute::Users.guard(true, true), Ok(AppRoute::Users));
    }

    #[test]
    fn test_section() {
        assert_eq!(AppRoute::CaseDetail(1).section(), AppRoute::Cases);
        assert_eq!(AppRoute::Calendar.section(), AppRoute::Calendar);
    }
}
