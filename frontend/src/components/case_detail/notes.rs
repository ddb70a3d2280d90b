//! 笔记标签页：按创建时间倒序、分页

use super::edit_case;
use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{AuditLine, Pager, TextArea, TextField};
use crate::web::confirm;
use estudio_shared::listing::{page_count, paginate, remove_by_id, sort_notes, upsert};
use estudio_shared::protocol::NoteDraft;
use estudio_shared::rich_text::to_plain_text;
use estudio_shared::{Case, Id, NOTE_PAGE_SIZE, Note, NoteLabel};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn label_class(label: NoteLabel) -> &'static str {
    match label {
        NoteLabel::Strategy => "badge badge-primary badge-sm",
        NoteLabel::Documentation => "badge badge-secondary badge-sm",
        NoteLabel::Research => "badge badge-accent badge-sm",
        NoteLabel::CaseLaw => "badge badge-info badge-sm",
    }
}

#[component]
pub(super) fn NotesTab(case: RwSignal<Option<Case>>, case_id: Id) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();

    let page = RwSignal::new(1usize);
    let editing = RwSignal::new(Option::<Id>::None);
    let (form_open, set_form_open) = signal(false);
    let (saving, set_saving) = signal(false);
    let titulo = RwSignal::new(String::new());
    let resumen = RwSignal::new(String::new());
    let contenido = RwSignal::new(String::new());
    let etiqueta = RwSignal::new(NoteLabel::default());

    let sorted = Memo::new(move |_| {
        let mut items = case.with(|c| c.as_ref().map(|c| c.notas.clone()).unwrap_or_default());
        sort_notes(&mut items);
        items
    });
    let pages = Signal::derive(move || page_count(sorted.with(Vec::len), NOTE_PAGE_SIZE));
    let visible = move || sorted.with(|items| paginate(items, page.get(), NOTE_PAGE_SIZE).to_vec());

    let fill = move |draft: NoteDraft| {
        titulo.set(draft.titulo);
        resumen.set(draft.resumen);
        contenido.set(draft.contenido);
        etiqueta.set(draft.etiqueta);
    };

    let reset = move || {
        fill(NoteDraft::default());
        editing.set(None);
        set_form_open.set(false);
    };

    let start_edit = move |n: &Note| {
        fill(NoteDraft::from(n));
        editing.set(Some(n.id));
        set_form_open.set(true);
    };

    let save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = NoteDraft {
            titulo: titulo.get_untracked().trim().to_string(),
            resumen: resumen.get_untracked().trim().to_string(),
            contenido: contenido.get_untracked().trim().to_string(),
            etiqueta: etiqueta.get_untracked(),
        };
        let target = editing.get_untracked();
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            let outcome = match target {
                Some(id) => api.update_note(id, &draft).await,
                None => api.add_note(case_id, &draft).await,
            };
            match outcome {
                Ok(saved) => {
                    edit_case(case, |c| upsert(&mut c.notas, saved));
                    // 新笔记排在最前
                    if target.is_none() {
                        page.set(1);
                    }
                    toast.success(if target.is_some() { "Nota actualizada" } else { "Nota creada" });
                    reset();
                }
                Err(e) => toast.failure("Notas", &e),
            }
            set_saving.set(false);
        });
    };

    let delete = move |id: Id| {
        if !confirm("¿Eliminar esta nota?") {
            return;
        }
        let api = auth.api();
        spawn_local(async move {
            match api.delete_note(id).await {
                Ok(()) => {
                    edit_case(case, |c| {
                        remove_by_id(&mut c.notas, id);
                    });
                    toast.success("Nota eliminada");
                }
                Err(e) => toast.failure("Notas", &e),
            }
        });
    };

    view! {
        <div class="flex justify-between items-center">
            <h3 class="font-bold">{move || format!("Notas ({})", sorted.with(Vec::len))}</h3>
            <Show when=move || !form_open.get()>
                <button class="btn btn-sm btn-primary" on:click=move |_| set_form_open.set(true)>"+ Nueva nota"</button>
            </Show>
        </div>

        <Show when=move || form_open.get()>
            <form class="bg-base-200 rounded-box p-4 space-y-3" on:submit=save>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    <TextField label="Título" value=titulo required=true />
                    <label class="form-control w-full">
                        <span class="label-text text-xs font-semibold">"Etiqueta"</span>
                        <select
                            class="select select-bordered select-sm"
                            on:change=move |ev| {
                                if let Some(l) = NoteLabel::from_label(&event_target_value(&ev)) {
                                    etiqueta.set(l);
                                }
                            }
                        >
                            {NoteLabel::ALL.into_iter().map(|l| view! {
                                <option value=l.label() selected=move || etiqueta.get() == l>{l.label()}</option>
                            }).collect_view()}
                        </select>
                    </label>
                </div>
                <TextArea label="Resumen" value=resumen rows=2 />
                <TextArea label="Contenido" value=contenido rows=6 />
                <div class="flex gap-2 justify-end">
                    <button type="button" class="btn btn-sm btn-ghost" on:click=move |_| reset()>"Cancelar"</button>
                    <button type="submit" class="btn btn-sm btn-primary" disabled=move || saving.get()>
                        {move || if editing.get().is_some() { "Guardar" } else { "Crear nota" }}
                    </button>
                </div>
            </form>
        </Show>

        <Show when=move || sorted.with(Vec::is_empty)>
            <p class="text-center py-6 text-base-content/50">"Sin notas"</p>
        </Show>
        <div class="space-y-3">
            <For
                each=visible
                key=|n| (n.id, n.audit.updated_at.clone(), n.titulo.clone())
                children=move |note| {
                    let id = note.id;
                    let source = note.clone();
                    view! {
                        <div class="collapse collapse-arrow bg-base-200">
                            <input type="checkbox" />
                            <div class="collapse-title">
                                <div class="flex items-center gap-2">
                                    <span class=label_class(note.etiqueta)>{note.etiqueta.label()}</span>
                                    <span class="font-semibold">{note.titulo.clone()}</span>
                                </div>
                                <p class="text-sm text-base-content/70">{note.resumen.clone()}</p>
                            </div>
                            <div class="collapse-content">
                                <p class="whitespace-pre-line">{to_plain_text(&note.contenido)}</p>
                                <div class="flex justify-between items-center mt-2">
                                    <AuditLine audit=note.audit.clone() />
                                    <div class="flex gap-1">
                                        <button class="btn btn-ghost btn-xs" on:click=move |_| start_edit(&source)>"Editar"</button>
                                        <button class="btn btn-ghost btn-xs text-error" on:click=move |_| delete(id)>"Eliminar"</button>
                                    </div>
                                </div>
                            </div>
                        </div>
                    }
                }
            />
        </div>
        <Pager page=page pages=pages on_change=move |n| page.set(n) />
    }
}
