//! 诉讼动态标签页：按日期倒序、分页，支持模板

use super::edit_case;
use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{AuditLine, Pager, TextArea, TextField};
use crate::web::{confirm, local_now};
use estudio_shared::api::Lookups;
use estudio_shared::date::display_day;
use estudio_shared::listing::{page_count, paginate, remove_by_id, sort_actuaciones, upsert};
use estudio_shared::protocol::ActuacionDraft;
use estudio_shared::{ACTUACION_PAGE_SIZE, ACTUACION_TIPOS, Actuacion, Case, Id};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn today() -> String {
    local_now().date().format("%Y-%m-%d").to_string()
}

#[component]
pub(super) fn ActuacionesTab(
    case: RwSignal<Option<Case>>,
    case_id: Id,
    lookups: RwSignal<Lookups>,
) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();

    let page = RwSignal::new(1usize);
    let (form_open, set_form_open) = signal(false);
    let (saving, set_saving) = signal(false);
    let editing = RwSignal::new(Option::<Id>::None);
    let fecha = RwSignal::new(today());
    let tipo = RwSignal::new(ACTUACION_TIPOS[0].to_string());
    let descripcion = RwSignal::new(String::new());

    let sorted = Memo::new(move |_| {
        let mut items = case.with(|c| c.as_ref().map(|c| c.actuaciones.clone()).unwrap_or_default());
        sort_actuaciones(&mut items);
        items
    });
    let pages = Signal::derive(move || page_count(sorted.with(Vec::len), ACTUACION_PAGE_SIZE));
    let visible = move || sorted.with(|items| paginate(items, page.get(), ACTUACION_PAGE_SIZE).to_vec());

    let reset = move || {
        editing.set(None);
        fecha.set(today());
        tipo.set(ACTUACION_TIPOS[0].to_string());
        descripcion.set(String::new());
        set_form_open.set(false);
    };

    let start_edit = move |a: &Actuacion| {
        let draft = ActuacionDraft::from(a);
        fecha.set(draft.fecha);
        tipo.set(draft.tipo);
        descripcion.set(draft.descripcion);
        editing.set(Some(a.id));
        set_form_open.set(true);
    };

    // 模板占位符以当前案件与所填日期展开
    let apply_template = move |ev: leptos::ev::Event| {
        let Ok(template_id) = event_target_value(&ev).parse::<Id>() else { return };
        let Some(template) = lookups.with_untracked(|l| l.templates.iter().find(|t| t.id == template_id).cloned()) else {
            return;
        };
        let text = case.with_untracked(|c| c.as_ref().map(|c| template.render(c, &fecha.get_untracked())));
        if let Some(text) = text {
            descripcion.set(text);
        }
        if !template.tipo.trim().is_empty() {
            tipo.set(template.tipo);
        }
    };

    let save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = ActuacionDraft {
            fecha: fecha.get_untracked(),
            descripcion: descripcion.get_untracked().trim().to_string(),
            tipo: tipo.get_untracked(),
        };
        let target = editing.get_untracked();
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            let outcome = match target {
                Some(id) => api.update_actuacion(id, &draft).await,
                None => api.add_actuacion(case_id, &draft).await,
            };
            match outcome {
                Ok(saved) => {
                    edit_case(case, |c| upsert(&mut c.actuaciones, saved));
                    toast.success(if target.is_some() { "Actuación actualizada" } else { "Actuación registrada" });
                    reset();
                }
                Err(e) => toast.failure("Actuaciones", &e),
            }
            set_saving.set(false);
        });
    };

    let delete = move |id: Id| {
        if !confirm("¿Eliminar esta actuación?") {
            return;
        }
        let api = auth.api();
        spawn_local(async move {
            match api.delete_actuacion(id).await {
                Ok(()) => {
                    edit_case(case, |c| {
                        remove_by_id(&mut c.actuaciones, id);
                    });
                    toast.success("Actuación eliminada");
                }
                Err(e) => toast.failure("Actuaciones", &e),
            }
        });
    };

    view! {
        <div class="flex justify-between items-center">
            <h3 class="font-bold">{move || format!("Actuaciones ({})", sorted.with(Vec::len))}</h3>
            <Show when=move || !form_open.get()>
                <button class="btn btn-sm btn-primary" on:click=move |_| set_form_open.set(true)>"+ Nueva actuación"</button>
            </Show>
        </div>

        <Show when=move || form_open.get()>
            <form class="bg-base-200 rounded-box p-4 space-y-3" on:submit=save>
                <div class="grid grid-cols-1 md:grid-cols-3 gap-3">
                    <TextField label="Fecha" value=fecha kind="date" required=true />
                    <label class="form-control w-full">
                        <span class="label-text text-xs font-semibold">"Tipo"</span>
                        <select class="select select-bordered select-sm" on:change=move |ev| tipo.set(event_target_value(&ev))>
                            {ACTUACION_TIPOS.iter().map(|t| view! {
                                <option value=*t selected=move || tipo.get() == *t>{*t}</option>
                            }).collect_view()}
                        </select>
                    </label>
                    <label class="form-control w-full">
                        <span class="label-text text-xs font-semibold">"Plantilla"</span>
                        <select class="select select-bordered select-sm" on:change=apply_template>
                            <option value="">"Sin plantilla"</option>
                            {move || lookups.with(|l| l.templates.clone()).into_iter().map(|t| view! {
                                <option value=t.id.to_string()>{t.nombre}</option>
                            }).collect_view()}
                        </select>
                    </label>
                </div>
                <TextArea label="Descripción" value=descripcion rows=4 />
                <div class="flex gap-2 justify-end">
                    <button type="button" class="btn btn-sm btn-ghost" on:click=move |_| reset()>"Cancelar"</button>
                    <button type="submit" class="btn btn-sm btn-primary" disabled=move || saving.get()>
                        {move || if editing.get().is_some() { "Guardar" } else { "Registrar" }}
                    </button>
                </div>
            </form>
        </Show>

        <Show when=move || sorted.with(Vec::is_empty)>
            <p class="text-center py-6 text-base-content/50">"Sin actuaciones registradas"</p>
        </Show>
        <ul class="timeline timeline-vertical timeline-compact">
            <For
                each=visible
                key=|a| (a.id, a.audit.updated_at.clone(), a.descripcion.clone())
                children=move |a| {
                    let id = a.id;
                    let source = a.clone();
                    view! {
                        <li>
                            <div class="timeline-start text-xs font-mono">{display_day(&a.fecha)}</div>
                            <div class="timeline-middle">"●"</div>
                            <div class="timeline-end timeline-box w-full">
                                <div class="flex justify-between gap-2">
                                    <span class="badge badge-outline badge-sm">{a.tipo.clone()}</span>
                                    <div class="flex gap-1">
                                        <button class="btn btn-ghost btn-xs" on:click=move |_| start_edit(&source)>"Editar"</button>
                                        <button class="btn btn-ghost btn-xs text-error" on:click=move |_| delete(id)>"Eliminar"</button>
                                    </div>
                                </div>
                                <p class="whitespace-pre-line mt-1">{a.descripcion.clone()}</p>
                                <AuditLine audit=a.audit.clone() />
                            </div>
                            <hr />
                        </li>
                    }
                }
            />
        </ul>
        <Pager page=page pages=pages on_change=move |n| page.set(n) />
    }
}
