//! 认证模块
//!
//! 管理当前用户与 API 实例，与路由系统解耦：
//! 路由服务通过注入的认证/角色信号来执行守卫。

use crate::api::{Api, build_api};
use crate::components::toast::Toast;
use crate::config::RuntimeConfig;
use estudio_shared::error::MSG_SESSION_EXPIRED;
use estudio_shared::{ApiResult, User};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

/// 认证状态
#[derive(Clone, Default)]
pub struct AuthState {
    /// 当前登录用户
    pub user: Option<User>,
    /// 是否正在向服务端确认已保存的会话
    pub is_verifying: bool,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }
}

/// 认证上下文
///
/// 包含读写信号与 API 实例，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub state: ReadSignal<AuthState>,
    pub set_state: WriteSignal<AuthState>,
    api: StoredValue<Api>,
}

impl AuthContext {
    /// 创建认证上下文
    ///
    /// 会话过期时网关回调到这里：清空当前用户并提示，路由守卫随之跳回登录页。
    pub fn new(config: &RuntimeConfig, toast: Toast) -> Self {
        let (state, set_state) = signal(AuthState::default());

        let on_expired = Arc::new(move || {
            log_warn!("[Auth] session expired");
            set_state.update(|s| s.user = None);
            toast.error(MSG_SESSION_EXPIRED);
        });

        Self {
            state,
            set_state,
            api: StoredValue::new(build_api(config, on_expired)),
        }
    }

    /// 获取 API 实例（内部均为 Arc，克隆代价很小）
    pub fn api(&self) -> Api {
        self.api.get_value()
    }

    /// 当前用户（非追踪）
    pub fn user(&self) -> Option<User> {
        self.state.with_untracked(|s| s.user.clone())
    }

    /// 认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.with(AuthState::is_authenticated))
    }

    pub fn is_admin_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.with(AuthState::is_admin))
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 初始化认证状态
///
/// 先同步恢复本地保存的用户（刷新页面后守卫立即可用），
/// 再异步向服务端确认；确认失败时会话被清空。
pub fn init_auth(ctx: &AuthContext) {
    let api = ctx.api();
    let stored = api.stored_user();
    let has_session = stored.is_some();
    ctx.set_state.set(AuthState {
        user: stored,
        is_verifying: has_session,
    });

    if !has_session {
        return;
    }

    let set_state = ctx.set_state;
    spawn_local(async move {
        let user = api.current_user().await;
        if user.is_none() {
            log_warn!("[Auth] stored session is no longer valid");
        }
        set_state.set(AuthState {
            user,
            is_verifying: false,
        });
    });
}

/// 登录并保存会话
pub async fn login(ctx: &AuthContext, username: &str, password: &str) -> ApiResult<User> {
    match ctx.api().login(username, password).await {
        Ok(user) => {
            log_info!("[Auth] logged in as {} ({})", user.username, user.role.code());
            ctx.set_state.update(|state| state.user = Some(user.clone()));
            Ok(user)
        }
        Err(e) => {
            log_warn!("[Auth] login failed: {}", e);
            Err(e)
        }
    }
}

/// 注销并清除状态
///
/// 导航由路由服务的认证状态监听自动处理。
pub fn logout(ctx: &AuthContext) {
    ctx.api().logout();
    ctx.set_state.update(|state| state.user = None);
}
