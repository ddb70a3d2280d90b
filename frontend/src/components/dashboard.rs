use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{PriorityBadge, Spinner, StatusBadge, UrgencyBadge};
use crate::config::URGENCY_REFRESH_MS;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use crate::web::{local_now, use_interval};
use estudio_shared::calendar::alert_urgency;
use estudio_shared::dashboard::{DashboardData, Feed, is_near_bottom, pending_count, sort_alert_feed};
use estudio_shared::date::display_day;
use estudio_shared::listing::{CaseFilters, replace_by_id};
use estudio_shared::protocol::AvisoDraft;
use estudio_shared::{Alerta, Case, Id};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 滚动事件里读取容器的位置
fn scrolled_near_bottom(ev: &web_sys::Event) -> bool {
    let el = event_target::<web_sys::Element>(ev);
    is_near_bottom(
        el.scroll_top() as f64,
        el.client_height() as f64,
        el.scroll_height() as f64,
    )
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let router = use_router();

    let (data, set_data) = signal(Option::<DashboardData>::None);
    let (loading, set_loading) = signal(true);
    let alerts = RwSignal::new(Feed::<Alerta>::default());
    let recent = RwSignal::new(Feed::<Case>::default());

    // 紧急程度按当前时间重新计算，每分钟刷新一次
    let (now, set_now) = signal(local_now());
    use_interval(URGENCY_REFRESH_MS, move || set_now.set(local_now()));

    let load_dashboard = move || {
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            match api.dashboard().await {
                Ok(payload) => {
                    let mut seeded = Feed::seeded(payload.alertas.clone());
                    sort_alert_feed(&mut seeded.items);
                    alerts.set(seeded);
                    recent.set(Feed::seeded(payload.recent_cases.clone()));
                    set_data.set(Some(payload));
                }
                Err(e) => toast.failure("Dashboard", &e),
            }
            set_loading.set(false);
        });
    };

    // 初始加载
    Effect::new(move |_| load_dashboard());

    let load_more_alerts = move || {
        let mut page = None;
        alerts.update(|f| page = f.begin_load());
        let Some(page) = page else { return };
        let api = auth.api();
        spawn_local(async move {
            let outcome = api.alert_feed(page).await;
            let mut result = Ok(0);
            alerts.update(|f| {
                result = f.finish_load(outcome);
                sort_alert_feed(&mut f.items);
            });
            if let Err(e) = result {
                toast.failure("Dashboard", &e);
            }
        });
    };

    let load_more_cases = move || {
        let mut page = None;
        recent.update(|f| page = f.begin_load());
        let Some(page) = page else { return };
        let api = auth.api();
        spawn_local(async move {
            let outcome = api.list_cases(&CaseFilters::default(), page).await;
            let mut result = Ok(0);
            recent.update(|f| result = f.finish_load(outcome));
            if let Err(e) = result {
                toast.failure("Dashboard", &e);
            }
        });
    };

    let toggle_alert = move |id: Id| {
        let api = auth.api();
        spawn_local(async move {
            match api.toggle_alerta(id).await {
                Ok(updated) => {
                    let done = updated.cumplida;
                    alerts.update(|f| {
                        replace_by_id(&mut f.items, updated);
                        sort_alert_feed(&mut f.items);
                    });
                    toast.success(if done { "Alerta completada" } else { "Alerta reabierta" });
                }
                Err(e) => toast.failure("Alertas", &e),
            }
        });
    };

    let pending = move || alerts.with(|f| pending_count(&f.items));

    view! {
        <Show when=move || !loading.get() || data.with(Option::is_some) fallback=|| view! { <Spinner /> }>
            {move || data.get().map(|d| view! { <StatsPanel data=d /> })}

            <AvisoForm />

            <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                // 提醒流
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body p-0">
                        <div class="flex items-center justify-between p-6 pb-2">
                            <h3 class="card-title">"Alertas"</h3>
                            <span class="badge badge-warning">{move || format!("{} pendientes", pending())}</span>
                        </div>
                        <div
                            class="overflow-y-auto max-h-96 px-6 pb-6 space-y-2"
                            on:scroll=move |ev| {
                                if scrolled_near_bottom(&ev) {
                                    load_more_alerts();
                                }
                            }
                        >
                            <Show when=move || alerts.with(|f| f.items.is_empty())>
                                <p class="text-center py-8 text-base-content/50">"No hay alertas"</p>
                            </Show>
                            <For
                                each=move || alerts.with(|f| f.items.clone())
                                key=|a| (a.id, a.cumplida)
                                children=move |alerta| {
                                    let id = alerta.id;
                                    let case_id = alerta.caso;
                                    let done = alerta.cumplida;
                                    let urgency_src = alerta.clone();
                                    let urgency = move || (!done).then(|| alert_urgency(&urgency_src, now.get())).flatten();
                                    view! {
                                        <div class=if done { "flex items-start gap-3 p-3 rounded-box bg-base-200 opacity-60" } else { "flex items-start gap-3 p-3 rounded-box bg-base-200" }>
                                            <input
                                                type="checkbox"
                                                class="checkbox checkbox-sm mt-1"
                                                prop:checked=done
                                                on:change=move |_| toggle_alert(id)
                                            />
                                            <div class="flex-1 min-w-0">
                                                <div class="flex items-center gap-2 flex-wrap">
                                                    <span class=if done { "font-semibold line-through" } else { "font-semibold" }>{alerta.titulo.clone()}</span>
                                                    <PriorityBadge priority=alerta.prioridad />
                                                    {move || view! { <UrgencyBadge urgency=urgency() /> }}
                                                </div>
                                                <p class="text-xs text-base-content/60">
                                                    {display_day(&alerta.fecha_vencimiento)}
                                                    {alerta.hora.clone().map(|h| format!(" {}", h))}
                                                    " · "
                                                    <a
                                                        class="link link-hover"
                                                        on:click=move |_| {
                                                            if let Some(case_id) = case_id {
                                                                router.go(AppRoute::CaseDetail(case_id));
                                                            }
                                                        }
                                                    >
                                                        {alerta.caso_caratula.clone().unwrap_or_else(|| "Sin carátula".to_string())}
                                                    </a>
                                                </p>
                                                {alerta.completed_by_username.clone().filter(|_| done).map(|u| view! {
                                                    <p class="text-xs text-success">{format!("Completada por {}", u)}</p>
                                                })}
                                            </div>
                                        </div>
                                    }
                                }
                            />
                            <Show when=move || alerts.with(|f| f.loading)>
                                <Spinner />
                            </Show>
                        </div>
                    </div>
                </div>

                // 最近案件流
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body p-0">
                        <div class="p-6 pb-2">
                            <h3 class="card-title">"Expedientes recientes"</h3>
                        </div>
                        <div
                            class="overflow-y-auto max-h-96 px-6 pb-6"
                            on:scroll=move |ev| {
                                if scrolled_near_bottom(&ev) {
                                    load_more_cases();
                                }
                            }
                        >
                            <table class="table table-zebra w-full">
                                <tbody>
                                    <For
                                        each=move || recent.with(|f| f.items.clone())
                                        key=|c| c.id
                                        children=move |case| {
                                            let id = case.id;
                                            view! {
                                                <tr class="hover cursor-pointer" on:click=move |_| router.go(AppRoute::CaseDetail(id))>
                                                    <td class="font-mono text-xs opacity-60">{case.codigo_interno.clone()}</td>
                                                    <td>
                                                        <div class="font-semibold">{case.caratula.clone()}</div>
                                                        <div class="text-xs opacity-60">{case.cliente_nombre.clone()}</div>
                                                    </td>
                                                    <td><StatusBadge status=case.estado /></td>
                                                </tr>
                                            }
                                        }
                                    />
                                </tbody>
                            </table>
                            <Show when=move || recent.with(|f| f.loading)>
                                <Spinner />
                            </Show>
                        </div>
                    </div>
                </div>
            </div>
        </Show>
    }
}

/// 统计卡片与分布表
#[component]
fn StatsPanel(data: DashboardData) -> impl IntoView {
    let stats = data.stats;
    let max_month = data.max_month_total().max(1);
    let fueros = data.fuero_rows();
    let lawyers = data.lawyer_rows();
    let months = data.cases_by_month.clone();

    view! {
        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
            <div class="stat">
                <div class="stat-title">"Expedientes"</div>
                <div class="stat-value text-primary">{stats.total_cases}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Activos"</div>
                <div class="stat-value text-success">{stats.active()}</div>
                <div class="stat-desc">{format!("{} abiertos · {} en trámite", stats.open_cases, stats.in_progress_cases)}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Pausados"</div>
                <div class="stat-value text-warning">{stats.paused_cases}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Cerrados"</div>
                <div class="stat-value">{stats.closed_cases}</div>
            </div>
        </div>

        <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title text-base">"Por fuero"</h3>
                    <table class="table table-sm">
                        <tbody>
                            {fueros.into_iter().map(|(name, total)| view! {
                                <tr><td>{name}</td><td class="text-right font-mono">{total}</td></tr>
                            }).collect_view()}
                        </tbody>
                    </table>
                </div>
            </div>
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title text-base">"Por abogado"</h3>
                    <table class="table table-sm">
                        <tbody>
                            {lawyers.into_iter().map(|(name, total)| view! {
                                <tr><td>{name}</td><td class="text-right font-mono">{total}</td></tr>
                            }).collect_view()}
                        </tbody>
                    </table>
                </div>
            </div>
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title text-base">"Nuevos por mes"</h3>
                    <div class="space-y-1">
                        {months.into_iter().map(|m| {
                            let width = format!("width: {}%", m.total * 100 / max_month);
                            view! {
                                <div class="flex items-center gap-2 text-xs">
                                    <span class="w-16 font-mono">{m.mes}</span>
                                    <div class="flex-1 bg-base-200 rounded h-3">
                                        <div class="bg-primary rounded h-3" style=width></div>
                                    </div>
                                    <span class="w-6 text-right">{m.total}</span>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                </div>
            </div>
        </div>
    }
}

/// 公告发布（仅管理员可见）
#[component]
fn AvisoForm() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let (contenido, set_contenido) = signal(String::new());
    let (sending, set_sending) = signal(false);

    let is_admin = move || auth.state.with(|s| s.is_admin());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(user) = auth.user() else { return };
        let draft = AvisoDraft::new(contenido.get_untracked().trim());
        let api = auth.api();
        set_sending.set(true);
        spawn_local(async move {
            match api.post_aviso(&draft, &user).await {
                Ok(_) => {
                    set_contenido.set(String::new());
                    toast.success("Aviso publicado");
                }
                Err(e) => toast.failure("Avisos", &e),
            }
            set_sending.set(false);
        });
    };

    view! {
        <Show when=is_admin>
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body flex-row items-end gap-4" on:submit=on_submit>
                    <div class="form-control flex-1">
                        <label class="label" for="aviso">
                            <span class="label-text">"Aviso para todo el estudio"</span>
                        </label>
                        <input
                            id="aviso"
                            type="text"
                            class="input input-bordered"
                            on:input=move |ev| set_contenido.set(event_target_value(&ev))
                            prop:value=contenido
                        />
                    </div>
                    <button class="btn btn-secondary" disabled=move || sending.get() || contenido.with(|c| c.trim().is_empty())>
                        "Publicar"
                    </button>
                </form>
            </div>
        </Show>
    }
}
