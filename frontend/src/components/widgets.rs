//! 页面间共用的小组件

use estudio_shared::calendar::Urgency;
use estudio_shared::{Audit, CaseStatus, Priority, Tag};
use leptos::prelude::*;

pub fn status_class(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Open => "badge badge-success",
        CaseStatus::InProgress => "badge badge-info",
        CaseStatus::Paused => "badge badge-warning",
        CaseStatus::Closed => "badge badge-neutral",
    }
}

pub fn priority_class(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "badge badge-error badge-outline",
        Priority::Medium => "badge badge-warning badge-outline",
        Priority::Low => "badge badge-ghost",
    }
}

#[component]
pub fn StatusBadge(status: CaseStatus) -> impl IntoView {
    view! { <span class=status_class(status)>{status.label()}</span> }
}

#[component]
pub fn PriorityBadge(priority: Priority) -> impl IntoView {
    view! { <span class=priority_class(priority)>{priority.label()}</span> }
}

#[component]
pub fn UrgencyBadge(urgency: Option<Urgency>) -> impl IntoView {
    urgency.map(|u| {
        view! {
            <span class=format!("badge border-0 text-white {}", u.css_class())>{u.label()}</span>
        }
    })
}

#[component]
pub fn TagChips(tags: Vec<Tag>) -> impl IntoView {
    view! {
        <div class="flex flex-wrap gap-1">
            {tags
                .into_iter()
                .map(|t| {
                    let style = format!("background-color: {}; color: white;", t.color);
                    view! { <span class="badge badge-sm border-0" style=style title=t.descripcion>{t.nombre}</span> }
                })
                .collect_view()}
        </div>
    }
}

/// 审计信息：谁创建、谁最后修改
#[component]
pub fn AuditLine(audit: Audit) -> impl IntoView {
    let created = audit
        .created_by_username
        .map(|u| format!("Creado por {}", u));
    let modified = audit
        .last_modified_by_username
        .map(|u| format!("Modificado por {}", u));
    let text = [created, modified]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ");

    (!text.is_empty()).then(|| view! { <p class="text-xs text-base-content/50">{text}</p> })
}

/// 带标签的单行输入框
#[component]
pub fn TextField(
    label: &'static str,
    value: RwSignal<String>,
    #[prop(optional)] required: bool,
    #[prop(optional)] placeholder: &'static str,
    #[prop(default = "text")] kind: &'static str,
    #[prop(optional, into)] disabled: MaybeProp<bool>,
) -> impl IntoView {
    view! {
        <label class="form-control w-full">
            <span class="label-text text-xs font-semibold">
                {label} {required.then_some(" *")}
            </span>
            <input
                type=kind
                class="input input-bordered input-sm w-full"
                placeholder=placeholder
                required=required
                disabled=move || disabled.get().unwrap_or(false)
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        </label>
    }
}

#[component]
pub fn TextArea(
    label: &'static str,
    value: RwSignal<String>,
    #[prop(default = 3)] rows: u32,
) -> impl IntoView {
    view! {
        <label class="form-control w-full">
            <span class="label-text text-xs font-semibold">{label}</span>
            <textarea
                class="textarea textarea-bordered textarea-sm w-full"
                rows=rows
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            ></textarea>
        </label>
    }
}

#[component]
pub fn Spinner() -> impl IntoView {
    view! {
        <div class="flex justify-center py-8">
            <span class="loading loading-spinner loading-md text-primary"></span>
        </div>
    }
}

/// 分页条
#[component]
pub fn Pager(
    #[prop(into)] page: Signal<usize>,
    #[prop(into)] pages: Signal<usize>,
    #[prop(into)] on_change: Callback<usize>,
) -> impl IntoView {
    view! {
        <Show when=move || { pages.get() > 1 }>
            <div class="join flex justify-center mt-4">
                <button
                    class="join-item btn btn-sm"
                    disabled=move || page.get() <= 1
                    on:click=move |_| on_change.run(page.get_untracked().saturating_sub(1).max(1))
                >
                    "«"
                </button>
                <button class="join-item btn btn-sm btn-disabled">
                    {move || format!("Página {} de {}", page.get(), pages.get())}
                </button>
                <button
                    class="join-item btn btn-sm"
                    disabled=move || page.get() >= pages.get()
                    on:click=move |_| on_change.run(page.get_untracked() + 1)
                >
                    "»"
                </button>
            </div>
        </Show>
    }
}
