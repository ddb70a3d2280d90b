//! Estudio 前端应用
//!
//! 采用 Context-Driven 的架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 认证状态与 API 实例
//! - `components`: UI 组件层
//!
//! 业务规则（筛选、分页、日历、乐观更新）都在 `estudio-shared` 中，这里只做渲染与接线。

// =========================================================
// 日志宏
// =========================================================

#[cfg(target_arch = "wasm32")]
macro_rules! log_info {
    ($($t:tt)*) => (::web_sys::console::log_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_info {
    ($($t:tt)*) => (println!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_warn {
    ($($t:tt)*) => (::web_sys::console::warn_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_warn {
    ($($t:tt)*) => (eprintln!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_error {
    ($($t:tt)*) => (::web_sys::console::error_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error {
    ($($t:tt)*) => (eprintln!($($t)*))
}

mod api;
mod auth;
mod config;
mod components {
    pub mod calendar;
    pub mod case_detail;
    pub mod case_form;
    pub mod case_list;
    pub mod dashboard;
    pub mod layout;
    pub mod login;
    pub mod toast;
    pub mod users;
    pub mod widgets;
}

// 浏览器 API 适配层
pub(crate) mod web {
    mod dialog;
    mod http;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use dialog::{XLSX_MIME, confirm, download_bytes};
    pub use http::FetchClient;
    pub use storage::BrowserSessionStore;
    pub use timer::{Debounce, local_now, use_interval};
}

use crate::auth::{AuthContext, init_auth};
use crate::components::calendar::CalendarPage;
use crate::components::case_detail::CaseDetailPage;
use crate::components::case_form::NewCasePage;
use crate::components::case_list::CaseListPage;
use crate::components::dashboard::DashboardPage;
use crate::components::layout::Shell;
use crate::components::login::LoginPage;
use crate::components::toast::{Toast, ToastHost};
use crate::components::users::UsersPage;
use crate::config::RuntimeConfig;

use leptos::prelude::*;

use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件；需要登录的页面包在 `Shell` 里。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! { <Shell><DashboardPage /></Shell> }.into_any(),
        AppRoute::Cases => view! { <Shell><CaseListPage /></Shell> }.into_any(),
        AppRoute::NewCase => view! { <Shell><NewCasePage /></Shell> }.into_any(),
        AppRoute::CaseDetail(id) => view! { <Shell><CaseDetailPage id=id /></Shell> }.into_any(),
        AppRoute::Calendar => view! { <Shell><CalendarPage /></Shell> }.into_any(),
        AppRoute::Users => view! { <Shell><UsersPage /></Shell> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Página no encontrada"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = RuntimeConfig::load();
    log_info!("[App] backend at {}", config.api_url);

    // 1. 提示框与认证上下文
    let toast = Toast::new();
    provide_context(toast);
    let auth_ctx = AuthContext::new(&config, toast);
    provide_context(auth_ctx);

    // 2. 从本地存储恢复会话（路由创建前完成，首屏守卫才正确）
    init_auth(&auth_ctx);

    // 3. 注入认证与角色信号
    let is_authenticated = auth_ctx.is_authenticated_signal();
    let is_admin = auth_ctx.is_admin_signal();

    view! {
        <ToastHost />
        <Router is_authenticated=is_authenticated is_admin=is_admin>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
