//! 日历视图
//!
//! 一次性拉取案件、alertas 与 actuaciones，在本地按日分组。

use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{PriorityBadge, Spinner, UrgencyBadge};
use crate::web::local_now;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use chrono::{Datelike, NaiveDate};
use estudio_shared::calendar::{CalendarIndex, DayEvents, MonthCursor, alert_urgency};
use estudio_shared::date::{DAY_NAMES_ES, display_day, month_title};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn CalendarPage() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();

    let index = RwSignal::new(CalendarIndex::default());
    let (loading, set_loading) = signal(true);
    let today = local_now().date();
    let cursor = RwSignal::new(MonthCursor::containing(today));
    let selected = RwSignal::new(Option::<NaiveDate>::None);

    Effect::new(move |_| {
        let api = auth.api();
        spawn_local(async move {
            match api.calendar().await {
                Ok(built) => {
                    let stats = built.stats();
                    log_info!(
                        "[Calendario] {} alertas y {} actuaciones cargadas",
                        stats.total_alerts,
                        stats.total_actuaciones
                    );
                    index.set(built);
                }
                Err(e) => toast.failure("Calendario", &e),
            }
            set_loading.set(false);
        });
    });

    let go_today = move |_| {
        cursor.set(MonthCursor::containing(today));
        selected.set(Some(today));
    };

    let cell_class = move |date: NaiveDate, in_month: bool| {
        let mut class = String::from("min-h-20 p-1 border border-base-200 text-left align-top cursor-pointer hover:bg-base-200");
        if !in_month {
            class.push_str(" text-base-content/30");
        }
        if date == today {
            class.push_str(" bg-primary/10 font-bold");
        }
        if selected.get() == Some(date) {
            class.push_str(" ring-2 ring-primary");
        }
        class
    };

    view! {
        <div class="grid grid-cols-1 xl:grid-cols-3 gap-6">
            <div class="card bg-base-100 shadow-xl xl:col-span-2">
                <div class="card-body">
                    <div class="flex items-center justify-between">
                        <h3 class="card-title">{move || { let c = cursor.get(); month_title(c.year, c.month) }}</h3>
                        <div class="join">
                            <button class="btn btn-sm join-item" on:click=move |_| cursor.update(|c| *c = c.previous())>"‹"</button>
                            <button class="btn btn-sm join-item" on:click=go_today>"Hoy"</button>
                            <button class="btn btn-sm join-item" on:click=move |_| cursor.update(|c| *c = c.next())>"›"</button>
                        </div>
                    </div>

                    <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
                        <div class="grid grid-cols-7 text-xs font-semibold text-center mt-2">
                            {DAY_NAMES_ES.iter().map(|d| view! { <div class="py-1">{*d}</div> }).collect_view()}
                        </div>
                        <div class="grid grid-cols-7">
                            {move || cursor.get().grid().into_iter().map(|cell| {
                                let date = cell.date;
                                let events = index.with(|i| i.events_for(date));
                                let alerts = events.alerts.len();
                                let acts = events.actuaciones.len();
                                view! {
                                    <div
                                        class=move || cell_class(date, cell.is_current_month)
                                        on:click=move |_| selected.set(Some(date))
                                    >
                                        <span class="text-sm">{date.day()}</span>
                                        <div class="flex flex-wrap gap-1 mt-1">
                                            {(alerts > 0).then(|| view! {
                                                <span class="badge badge-warning badge-xs">{alerts}</span>
                                            })}
                                            {(acts > 0).then(|| view! {
                                                <span class="badge badge-info badge-xs">{acts}</span>
                                            })}
                                        </div>
                                    </div>
                                }
                            }).collect_view()}
                        </div>
                    </Show>
                </div>
            </div>

            <div class="space-y-6">
                <CalendarStatsCard index=index />
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        {move || match selected.get() {
                            None => view! {
                                <p class="text-base-content/50">"Seleccione un día para ver sus eventos"</p>
                            }.into_any(),
                            Some(date) => view! {
                                <DayPanel date=date events=index.with(|i| i.events_for(date)) />
                            }.into_any(),
                        }}
                    </div>
                </div>
            </div>
        </div>
    }
}

#[component]
fn CalendarStatsCard(index: RwSignal<CalendarIndex>) -> impl IntoView {
    let stats = move || index.with(CalendarIndex::stats);
    view! {
        <div class="stats stats-vertical shadow w-full">
            <div class="stat">
                <div class="stat-title">"Alertas"</div>
                <div class="stat-value text-2xl">{move || stats().total_alerts}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Pendientes"</div>
                <div class="stat-value text-2xl text-warning">{move || stats().pending_alerts}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Actuaciones"</div>
                <div class="stat-value text-2xl text-info">{move || stats().total_actuaciones}</div>
            </div>
        </div>
    }
}

/// 选中日期的事件列表，点击跳到对应案件
#[component]
fn DayPanel(date: NaiveDate, events: DayEvents) -> impl IntoView {
    let router = use_router();
    let now = local_now();
    let title = display_day(&date.format("%Y-%m-%d").to_string());

    view! {
        <h3 class="card-title text-base">{title}</h3>
        {events.is_empty().then(|| view! {
            <p class="text-base-content/50 text-sm">"Sin eventos"</p>
        })}
        <ul class="space-y-2">
            {events.alerts.into_iter().map(|item| {
                let case_id = item.case_id;
                let urgency = (!item.alerta.cumplida).then(|| alert_urgency(&item.alerta, now)).flatten();
                view! {
                    <li
                        class="p-2 rounded-box bg-warning/10 cursor-pointer hover:bg-warning/20"
                        on:click=move |_| router.go(AppRoute::CaseDetail(case_id))
                    >
                        <div class="flex flex-wrap items-center gap-2">
                            <span class=if item.alerta.cumplida { "font-semibold line-through" } else { "font-semibold" }>
                                {item.alerta.titulo.clone()}
                            </span>
                            <PriorityBadge priority=item.alerta.prioridad />
                            <UrgencyBadge urgency=urgency />
                        </div>
                        <p class="text-xs text-base-content/60">{item.caratula}</p>
                    </li>
                }
            }).collect_view()}
            {events.actuaciones.into_iter().map(|item| {
                let case_id = item.case_id;
                view! {
                    <li
                        class="p-2 rounded-box bg-info/10 cursor-pointer hover:bg-info/20"
                        on:click=move |_| router.go(AppRoute::CaseDetail(case_id))
                    >
                        <span class="badge badge-outline badge-sm">{item.actuacion.tipo.clone()}</span>
                        <p class="text-sm">{item.actuacion.descripcion.clone()}</p>
                        <p class="text-xs text-base-content/60">{item.caratula}</p>
                    </li>
                }
            }).collect_view()}
        </ul>
    }
}
