//! 案件详情页
//!
//! 头部信息、状态乐观更新、编辑/删除/导出，以及三个子标签页。

mod actuaciones;
mod alertas;
mod notes;

use crate::auth::use_auth;
use crate::components::case_form::CaseForm;
use crate::components::toast::use_toast;
use crate::components::widgets::{AuditLine, Spinner, StatusBadge, TagChips};
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use crate::web::{XLSX_MIME, confirm, download_bytes};
use actuaciones::ActuacionesTab;
use alertas::AlertasTab;
use estudio_shared::api::{Lookups, timeline_filename};
use estudio_shared::date::display_day;
use estudio_shared::optimistic::Snapshot;
use estudio_shared::protocol::{CaseDraft, CasePatch};
use estudio_shared::{Case, CaseStatus, Id};
use leptos::prelude::*;
use leptos::task::spawn_local;
use notes::NotesTab;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Actuaciones,
    Alertas,
    Notas,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Actuaciones, Tab::Alertas, Tab::Notas];

    fn label(&self) -> &'static str {
        match self {
            Tab::Actuaciones => "Actuaciones",
            Tab::Alertas => "Alertas",
            Tab::Notas => "Notas",
        }
    }
}

/// 修改已加载的案件；未加载时什么也不做
fn edit_case(case: RwSignal<Option<Case>>, edit: impl FnOnce(&mut Case)) {
    case.update(|c| {
        if let Some(c) = c {
            edit(c);
        }
    });
}

#[component]
pub fn CaseDetailPage(id: Id) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let router = use_router();

    let case = RwSignal::new(Option::<Case>::None);
    let lookups = RwSignal::new(Lookups::default());
    let (loading, set_loading) = signal(true);
    let (editing, set_editing) = signal(false);
    let (saving, set_saving) = signal(false);
    let (exporting, set_exporting) = signal(false);
    let tab = RwSignal::new(Tab::Actuaciones);
    let is_admin = auth.is_admin_signal();

    Effect::new(move |_| {
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            match api.get_case(id).await {
                Ok(fetched) => case.set(Some(fetched)),
                Err(e) => toast.failure("Expediente", &e),
            }
            set_loading.set(false);
            match api.lookups().await {
                Ok(data) => lookups.set(data),
                Err(e) => toast.failure("Expediente", &e),
            }
        });
    });

    // 乐观更新：本地先改，失败只回滚改动的字段
    let patch_optimistic = move |patch: CasePatch, done: &'static str| {
        let Some(actor) = auth.user() else { return };
        let mut snapshot = None;
        edit_case(case, |c| snapshot = Some(Snapshot::apply(c, &patch)));
        let Some(snapshot) = snapshot else { return };
        let api = auth.api();
        spawn_local(async move {
            let outcome = api.update_case(id, &patch, &actor).await;
            let mut result = Ok(());
            edit_case(case, |c| result = snapshot.settle(c, outcome));
            match result {
                Ok(()) => toast.success(done),
                Err(e) => toast.failure("Expediente", &e),
            }
        });
    };

    let on_status = move |ev: leptos::ev::Event| {
        let Some(estado) = CaseStatus::from_label(&event_target_value(&ev)) else { return };
        if case.with_untracked(|c| c.as_ref().map(|c| c.estado)) == Some(estado) {
            return;
        }
        patch_optimistic(CasePatch::status(estado), "Estado actualizado");
    };

    let lawyer_input = RwSignal::new(String::new());
    let on_reassign = move |_| {
        let name = lawyer_input.get_untracked().trim().to_string();
        if name.is_empty() {
            toast.error("Ingrese el nombre del abogado");
            return;
        }
        lawyer_input.set(String::new());
        patch_optimistic(CasePatch::lawyer(name), "Abogado reasignado");
    };

    let on_save = move |draft: CaseDraft| {
        let Some(actor) = auth.user() else { return };
        let Some(patch) = case.with_untracked(|c| c.as_ref().map(|c| CasePatch::between(c, &draft))) else {
            return;
        };
        if patch.is_empty() {
            set_editing.set(false);
            return;
        }
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            match api.update_case(id, &patch, &actor).await {
                Ok(updated) => {
                    case.set(Some(updated));
                    set_editing.set(false);
                    toast.success("Expediente actualizado");
                }
                Err(e) => toast.failure("Expediente", &e),
            }
            set_saving.set(false);
        });
    };

    let on_delete = move |_| {
        let caratula = case.with_untracked(|c| c.as_ref().map(|c| c.caratula.clone()).unwrap_or_default());
        if !confirm(&format!("¿Eliminar el expediente \"{}\"? Esta acción no se puede deshacer.", caratula)) {
            return;
        }
        let api = auth.api();
        spawn_local(async move {
            match api.delete_case(id).await {
                Ok(()) => {
                    toast.success("Expediente eliminado");
                    router.go(AppRoute::Cases);
                }
                Err(e) => toast.failure("Expediente", &e),
            }
        });
    };

    let on_export = move |_| {
        let filename = case.with_untracked(|c| timeline_filename(c.as_ref().map(|c| c.codigo_interno.as_str()).unwrap_or("")));
        let api = auth.api();
        set_exporting.set(true);
        spawn_local(async move {
            match api.export_timeline(id).await {
                Ok(bytes) => {
                    if let Err(e) = download_bytes(&bytes, &filename, XLSX_MIME) {
                        log_error!("[Expediente] download failed: {:?}", e);
                        toast.error("No se pudo guardar el archivo");
                    }
                }
                Err(e) => toast.failure("Expediente", &e),
            }
            set_exporting.set(false);
        });
    };

    view! {
        <Show
            when=move || case.with(Option::is_some)
            fallback=move || view! {
                <Show when=move || loading.get() fallback=|| view! {
                    <div class="alert alert-warning">"No se encontró el expediente"</div>
                }>
                    <Spinner />
                </Show>
            }
        >
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <Show
                        when=move || editing.get()
                        fallback=move || view! {
                            {move || case.get().map(|c| view! { <CaseHeader case=c /> })}

                            <div class="flex flex-wrap gap-2 items-end mt-4">
                                <label class="form-control">
                                    <span class="label-text text-xs">"Estado"</span>
                                    <select class="select select-bordered select-sm" on:change=on_status>
                                        {CaseStatus::ALL.into_iter().map(|s| view! {
                                            <option
                                                value=s.label()
                                                selected=move || case.with(|c| c.as_ref().map(|c| c.estado)) == Some(s)
                                            >
                                                {s.label()}
                                            </option>
                                        }).collect_view()}
                                    </select>
                                </label>
                                <Show when=move || is_admin.get()>
                                    <div class="join">
                                        <input
                                            class="input input-bordered input-sm join-item"
                                            placeholder="Reasignar abogado"
                                            prop:value=move || lawyer_input.get()
                                            on:input=move |ev| lawyer_input.set(event_target_value(&ev))
                                        />
                                        <button class="btn btn-sm join-item" on:click=on_reassign>"Reasignar"</button>
                                    </div>
                                </Show>
                                <div class="flex-1"></div>
                                <button class="btn btn-sm btn-outline" on:click=move |_| set_editing.set(true)>"Editar"</button>
                                <button class="btn btn-sm btn-outline" disabled=move || exporting.get() on:click=on_export>
                                    "Exportar historial"
                                </button>
                                <button class="btn btn-sm btn-error btn-outline" on:click=on_delete>"Eliminar"</button>
                            </div>
                        }
                    >
                        {move || case.get_untracked().map(|c| view! {
                            <CaseForm
                                initial=CaseDraft::from_case(&c)
                                lookups=lookups
                                lawyer_locked=Signal::derive(move || !is_admin.get())
                                submit_label="Guardar cambios"
                                busy=saving
                                on_submit=on_save
                                on_cancel=move |_| set_editing.set(false)
                            />
                        })}
                    </Show>
                </div>
            </div>

            <div role="tablist" class="tabs tabs-bordered mt-6">
                {Tab::ALL.into_iter().map(|t| view! {
                    <a
                        role="tab"
                        class=move || if tab.get() == t { "tab tab-active" } else { "tab" }
                        on:click=move |_| tab.set(t)
                    >
                        {t.label()}
                    </a>
                }).collect_view()}
            </div>
            <div class="card bg-base-100 shadow-xl mt-2">
                <div class="card-body">
                    {move || match tab.get() {
                        Tab::Actuaciones => view! { <ActuacionesTab case=case case_id=id lookups=lookups /> }.into_any(),
                        Tab::Alertas => view! { <AlertasTab case=case case_id=id /> }.into_any(),
                        Tab::Notas => view! { <NotesTab case=case case_id=id /> }.into_any(),
                    }}
                </div>
            </div>
        </Show>
    }
}

#[component]
fn CaseHeader(case: Case) -> impl IntoView {
    let cliente = if case.cliente_dni.is_empty() {
        case.cliente_nombre.clone()
    } else {
        format!("{} ({})", case.cliente_nombre, case.cliente_dni)
    };
    let rows = [
        ("Nro. expediente", case.nro_expediente.clone()),
        ("Juzgado", case.juzgado.clone()),
        ("Fuero", case.fuero.clone()),
        ("Abogado", case.abogado_responsable.clone()),
        ("Cliente", cliente),
        ("Contraparte", case.contraparte.clone()),
        ("Inicio", display_day(&case.fecha_inicio)),
    ];

    view! {
        <div class="flex flex-wrap items-start gap-3">
            <div class="flex-1">
                <p class="text-xs font-mono text-base-content/50">{case.codigo_interno.clone()}</p>
                <h2 class="text-2xl font-bold">{case.caratula.clone()}</h2>
            </div>
            <StatusBadge status=case.estado />
        </div>
        <TagChips tags=case.etiquetas.clone() />
        <dl class="grid grid-cols-1 md:grid-cols-3 gap-x-6 gap-y-2 mt-4 text-sm">
            {rows.into_iter().filter(|(_, v)| !v.trim().is_empty()).map(|(k, v)| view! {
                <div>
                    <dt class="text-xs text-base-content/50">{k}</dt>
                    <dd>{v}</dd>
                </div>
            }).collect_view()}
        </dl>
        {case.folder_link.clone().map(|href| view! {
            <a class="link link-primary text-sm" href=href target="_blank" rel="noopener">"Carpeta digital"</a>
        })}
        <AuditLine audit=case.audit.clone() />
    }
}
