//! 提醒标签页

use super::edit_case;
use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{PriorityBadge, TextArea, TextField, UrgencyBadge};
use crate::config::URGENCY_REFRESH_MS;
use crate::web::{confirm, local_now, use_interval};
use estudio_shared::calendar::alert_urgency;
use estudio_shared::dashboard::{pending_count, sort_alert_feed};
use estudio_shared::date::display_day;
use estudio_shared::listing::{remove_by_id, replace_by_id, upsert};
use estudio_shared::protocol::AlertaDraft;
use estudio_shared::{Alerta, Case, Id, Priority};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
struct AlertaForm {
    titulo: RwSignal<String>,
    resumen: RwSignal<String>,
    fecha_vencimiento: RwSignal<String>,
    hora: RwSignal<String>,
    prioridad: RwSignal<Priority>,
    minutos: RwSignal<String>,
}

impl AlertaForm {
    fn new() -> Self {
        Self {
            titulo: RwSignal::new(String::new()),
            resumen: RwSignal::new(String::new()),
            fecha_vencimiento: RwSignal::new(String::new()),
            hora: RwSignal::new(String::new()),
            prioridad: RwSignal::new(Priority::default()),
            minutos: RwSignal::new(String::new()),
        }
    }

    fn fill(&self, draft: AlertaDraft) {
        self.titulo.set(draft.titulo);
        self.resumen.set(draft.resumen);
        self.fecha_vencimiento.set(draft.fecha_vencimiento);
        self.hora.set(draft.hora.unwrap_or_default());
        self.prioridad.set(draft.prioridad);
        self.minutos
            .set(draft.tiempo_estimado_minutos.map(|m| m.to_string()).unwrap_or_default());
    }

    fn clear(&self) {
        self.fill(AlertaDraft::default());
    }

    fn to_draft(&self) -> AlertaDraft {
        let hora = self.hora.get_untracked();
        AlertaDraft {
            titulo: self.titulo.get_untracked().trim().to_string(),
            resumen: self.resumen.get_untracked().trim().to_string(),
            fecha_vencimiento: self.fecha_vencimiento.get_untracked(),
            hora: Some(hora).filter(|h| !h.trim().is_empty()),
            prioridad: self.prioridad.get_untracked(),
            tiempo_estimado_minutos: self.minutos.get_untracked().trim().parse().ok(),
        }
    }
}

#[component]
pub(super) fn AlertasTab(case: RwSignal<Option<Case>>, case_id: Id) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();

    let form = AlertaForm::new();
    let editing = RwSignal::new(Option::<Id>::None);
    let (form_open, set_form_open) = signal(false);
    let (saving, set_saving) = signal(false);

    let (now, set_now) = signal(local_now());
    use_interval(URGENCY_REFRESH_MS, move || set_now.set(local_now()));

    let sorted = Memo::new(move |_| {
        let mut items = case.with(|c| c.as_ref().map(|c| c.alertas.clone()).unwrap_or_default());
        sort_alert_feed(&mut items);
        items
    });

    let reset = move || {
        form.clear();
        editing.set(None);
        set_form_open.set(false);
    };

    let start_edit = move |a: &Alerta| {
        form.fill(AlertaDraft::from(a));
        editing.set(Some(a.id));
        set_form_open.set(true);
    };

    let save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = form.to_draft();
        let target = editing.get_untracked();
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            let outcome = match target {
                Some(id) => api.update_alerta(id, &draft).await,
                None => api.add_alerta(case_id, &draft).await,
            };
            match outcome {
                Ok(saved) => {
                    edit_case(case, |c| upsert(&mut c.alertas, saved));
                    toast.success(if target.is_some() { "Alerta actualizada" } else { "Alerta creada" });
                    reset();
                }
                Err(e) => toast.failure("Alertas", &e),
            }
            set_saving.set(false);
        });
    };

    let toggle = move |id: Id| {
        let api = auth.api();
        spawn_local(async move {
            match api.toggle_alerta(id).await {
                Ok(updated) => {
                    let done = updated.cumplida;
                    edit_case(case, |c| {
                        replace_by_id(&mut c.alertas, updated);
                    });
                    toast.success(if done { "Alerta completada" } else { "Alerta reabierta" });
                }
                Err(e) => toast.failure("Alertas", &e),
            }
        });
    };

    let delete = move |id: Id| {
        if !confirm("¿Eliminar esta alerta?") {
            return;
        }
        let api = auth.api();
        spawn_local(async move {
            match api.delete_alerta(id).await {
                Ok(()) => {
                    edit_case(case, |c| {
                        remove_by_id(&mut c.alertas, id);
                    });
                    toast.success("Alerta eliminada");
                }
                Err(e) => toast.failure("Alertas", &e),
            }
        });
    };

    view! {
        <div class="flex justify-between items-center">
            <h3 class="font-bold">
                {move || format!("Alertas ({} pendientes)", sorted.with(|items| pending_count(items)))}
            </h3>
            <Show when=move || !form_open.get()>
                <button class="btn btn-sm btn-primary" on:click=move |_| set_form_open.set(true)>"+ Nueva alerta"</button>
            </Show>
        </div>

        <Show when=move || form_open.get()>
            <form class="bg-base-200 rounded-box p-4 space-y-3" on:submit=save>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    <TextField label="Título" value=form.titulo required=true />
                    <label class="form-control w-full">
                        <span class="label-text text-xs font-semibold">"Prioridad"</span>
                        <select
                            class="select select-bordered select-sm"
                            on:change=move |ev| {
                                if let Some(p) = Priority::from_label(&event_target_value(&ev)) {
                                    form.prioridad.set(p);
                                }
                            }
                        >
                            {Priority::ALL.into_iter().map(|p| view! {
                                <option value=p.label() selected=move || form.prioridad.get() == p>{p.label()}</option>
                            }).collect_view()}
                        </select>
                    </label>
                    <TextField label="Vencimiento" value=form.fecha_vencimiento kind="date" required=true />
                    <TextField label="Hora" value=form.hora kind="time" />
                    <TextField label="Tiempo estimado (min)" value=form.minutos kind="number" />
                </div>
                <TextArea label="Resumen" value=form.resumen />
                <div class="flex gap-2 justify-end">
                    <button type="button" class="btn btn-sm btn-ghost" on:click=move |_| reset()>"Cancelar"</button>
                    <button type="submit" class="btn btn-sm btn-primary" disabled=move || saving.get()>
                        {move || if editing.get().is_some() { "Guardar" } else { "Crear alerta" }}
                    </button>
                </div>
            </form>
        </Show>

        <Show when=move || sorted.with(Vec::is_empty)>
            <p class="text-center py-6 text-base-content/50">"Sin alertas"</p>
        </Show>
        <div class="space-y-2">
            <For
                each=move || sorted.get()
                key=|a| (a.id, a.cumplida, a.audit.updated_at.clone(), a.titulo.clone())
                children=move |alerta| {
                    let id = alerta.id;
                    let done = alerta.cumplida;
                    let source = alerta.clone();
                    let urgency_src = alerta.clone();
                    let urgency = move || (!done).then(|| alert_urgency(&urgency_src, now.get())).flatten();
                    let due = match &alerta.hora {
                        Some(h) => format!("{} {}", display_day(&alerta.fecha_vencimiento), h),
                        None => display_day(&alerta.fecha_vencimiento),
                    };
                    let completed = alerta
                        .completed_by_username
                        .clone()
                        .filter(|_| done)
                        .map(|u| format!("Completada por {}", u));
                    view! {
                        <div class=if done { "flex items-start gap-3 p-3 rounded-box bg-base-200 opacity-60" } else { "flex items-start gap-3 p-3 rounded-box bg-base-200" }>
                            <input type="checkbox" class="checkbox checkbox-sm mt-1" checked=done on:change=move |_| toggle(id) />
                            <div class="flex-1">
                                <div class="flex flex-wrap items-center gap-2">
                                    <span class=if done { "font-semibold line-through" } else { "font-semibold" }>{alerta.titulo.clone()}</span>
                                    <PriorityBadge priority=alerta.prioridad />
                                    {move || view! { <UrgencyBadge urgency=urgency() /> }}
                                </div>
                                <p class="text-xs text-base-content/60">{due}</p>
                                <p class="text-sm whitespace-pre-line">{alerta.resumen.clone()}</p>
                                {completed.map(|t| view! { <p class="text-xs text-success">{t}</p> })}
                            </div>
                            <div class="flex gap-1">
                                <button class="btn btn-ghost btn-xs" on:click=move |_| start_edit(&source)>"Editar"</button>
                                <button class="btn btn-ghost btn-xs text-error" on:click=move |_| delete(id)>"Eliminar"</button>
                            </div>
                        </div>
                    }
                }
            />
        </div>
    }
}
