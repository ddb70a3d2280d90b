//! 已登录页面的外壳：导航栏 + 内容区

use crate::auth::{logout, use_auth};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;

#[component]
fn NavLink(to: AppRoute, label: &'static str) -> impl IntoView {
    let router = use_router();
    let target = to.clone();
    let class = move || {
        if router.current_route().get().section() == target {
            "btn btn-ghost btn-sm btn-active"
        } else {
            "btn btn-ghost btn-sm"
        }
    };

    view! {
        <li>
            <Link to=to class="p-0">
                <span class=class>{label}</span>
            </Link>
        </li>
    }
}

#[component]
pub fn Shell(children: Children) -> impl IntoView {
    let auth = use_auth();
    let state = auth.state;

    let username = move || {
        state.with(|s| {
            s.user
                .as_ref()
                .map(|u| format!("{} · {}", u.username, u.role.label()))
                .unwrap_or_default()
        })
    };
    let is_admin = move || state.with(|s| s.is_admin());

    let on_logout = move |_| {
        log_info!("[Auth] logout");
        logout(&auth);
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-6">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <span class="btn btn-ghost text-xl">"Estudio Jurídico"</span>
                        <ul class="menu menu-horizontal px-1 gap-1">
                            <NavLink to=AppRoute::Dashboard label="Inicio" />
                            <NavLink to=AppRoute::Cases label="Expedientes" />
                            <NavLink to=AppRoute::Calendar label="Calendario" />
                            <Show when=is_admin>
                                <NavLink to=AppRoute::Users label="Usuarios" />
                            </Show>
                        </ul>
                    </div>
                    <div class="flex-none gap-2">
                        <span class="badge badge-neutral hidden md:inline-flex">{username}</span>
                        <button on:click=on_logout class="btn btn-outline btn-error btn-sm">
                            "Cerrar sesión"
                        </button>
                    </div>
                </div>

                {children()}
            </div>
        </div>
    }
}
