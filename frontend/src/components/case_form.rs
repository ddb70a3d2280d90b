//! 案件表单
//!
//! 新建页与详情页的编辑模式共用同一个 `CaseForm`。

mod form_state;

use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::TextField;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use crate::web::local_now;
use estudio_shared::api::Lookups;
use estudio_shared::listing::upsert;
use estudio_shared::protocol::{CaseDraft, ClientDraft, TagDraft};
use estudio_shared::{CaseStatus, FUEROS, Id};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub use form_state::CaseFormState;

#[component]
pub fn CaseForm(
    initial: CaseDraft,
    lookups: RwSignal<Lookups>,
    /// 非管理员不能改派负责律师
    #[prop(into)]
    lawyer_locked: Signal<bool>,
    submit_label: &'static str,
    #[prop(into)] busy: Signal<bool>,
    #[prop(into)] on_submit: Callback<CaseDraft>,
    #[prop(into)] on_cancel: Callback<()>,
) -> impl IntoView {
    let form = CaseFormState::new(&initial);

    let on_form_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        on_submit.run(form.to_draft());
    };

    let on_client_change = move |ev: leptos::ev::Event| {
        let id = event_target_value(&ev).parse::<Id>().ok();
        form.cliente_id.set(id);
        // 选中登记过的客户时同步显示名与证件号
        if let Some(id) = id {
            if let Some(c) = lookups.with_untracked(|l| l.clientes.iter().find(|c| c.id == id).cloned()) {
                form.cliente_nombre.set(c.nombre_completo);
                form.cliente_dni.set(c.dni_ruc);
            }
        }
    };

    view! {
        <form class="space-y-6" on:submit=on_form_submit>
            <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                <div class="md:col-span-2">
                    <TextField label="Carátula" value=form.caratula required=true placeholder="Pérez c/ López s/ Daños y Perjuicios" />
                </div>
                <TextField label="Nro. de expediente" value=form.nro_expediente placeholder="123456/2024" />
                <TextField label="Juzgado" value=form.juzgado />
                <label class="form-control w-full">
                    <span class="label-text text-xs font-semibold">"Fuero"</span>
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| form.fuero.set(event_target_value(&ev))
                    >
                        {FUEROS.iter().map(|f| view! {
                            <option value=*f selected=move || form.fuero.get() == *f>{*f}</option>
                        }).collect_view()}
                    </select>
                </label>
                <label class="form-control w-full">
                    <span class="label-text text-xs font-semibold">"Estado"</span>
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| {
                            if let Some(s) = CaseStatus::from_label(&event_target_value(&ev)) {
                                form.estado.set(s);
                            }
                        }
                    >
                        {CaseStatus::ALL.into_iter().map(|s| view! {
                            <option value=s.label() selected=move || form.estado.get() == s>{s.label()}</option>
                        }).collect_view()}
                    </select>
                </label>
                <TextField
                    label="Abogado responsable"
                    value=form.abogado_responsable
                    placeholder="Dr. Nombre Apellido"
                    disabled=lawyer_locked
                />
                <TextField label="Fecha de inicio" value=form.fecha_inicio kind="date" />
                <TextField label="Contraparte" value=form.contraparte />
                <TextField label="Carpeta digital" value=form.folder_link kind="url" placeholder="https://..." />
            </div>

            <div class="divider text-xs">"Cliente"</div>
            <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                <label class="form-control w-full">
                    <span class="label-text text-xs font-semibold">"Cliente registrado"</span>
                    <select class="select select-bordered select-sm" on:change=on_client_change>
                        <option value="" selected=move || form.cliente_id.get().is_none()>"Sin registrar"</option>
                        {move || lookups.with(|l| l.clientes.clone()).into_iter().map(|c| {
                            let id = c.id;
                            view! {
                                <option value=id.to_string() selected=move || form.cliente_id.get() == Some(id)>
                                    {c.nombre_completo}
                                </option>
                            }
                        }).collect_view()}
                    </select>
                </label>
                <TextField label="Nombre del cliente" value=form.cliente_nombre />
                <TextField label="DNI / CUIT" value=form.cliente_dni />
            </div>
            <QuickClient lookups=lookups form=form />

            <div class="divider text-xs">"Etiquetas"</div>
            <div class="flex flex-wrap gap-2">
                {move || lookups.with(|l| l.tags.clone()).into_iter().map(|t| {
                    let id = t.id;
                    let style = format!("border-color: {};", t.color);
                    view! {
                        <label class="label cursor-pointer gap-2 border rounded-box px-2 py-1" style=style>
                            <input
                                type="checkbox"
                                class="checkbox checkbox-xs"
                                prop:checked=move || form.etiquetas_ids.with(|ids| ids.contains(&id))
                                on:change=move |_| form.toggle_tag(id)
                            />
                            <span class="label-text text-sm">{t.nombre}</span>
                        </label>
                    }
                }).collect_view()}
            </div>
            <QuickTag lookups=lookups form=form />

            <div class="flex gap-2 justify-end">
                <button type="button" class="btn btn-ghost" on:click=move |_| on_cancel.run(())>"Cancelar"</button>
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    {move || if busy.get() {
                        view! { <span class="loading loading-spinner"></span> "Guardando..." }.into_any()
                    } else {
                        submit_label.into_any()
                    }}
                </button>
            </div>
        </form>
    }
}

/// 在表单内直接登记新客户
#[component]
fn QuickClient(lookups: RwSignal<Lookups>, form: CaseFormState) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let (open, set_open) = signal(false);
    let nombre = RwSignal::new(String::new());
    let dni = RwSignal::new(String::new());
    let telefono = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());

    let save = move |_| {
        let draft = ClientDraft {
            nombre_completo: nombre.get_untracked().trim().to_string(),
            dni_ruc: dni.get_untracked().trim().to_string(),
            telefono: telefono.get_untracked().trim().to_string(),
            email: email.get_untracked().trim().to_string(),
            ..Default::default()
        };
        let api = auth.api();
        spawn_local(async move {
            match api.create_client(&draft).await {
                Ok(client) => {
                    form.cliente_id.set(Some(client.id));
                    form.cliente_nombre.set(client.nombre_completo.clone());
                    form.cliente_dni.set(client.dni_ruc.clone());
                    lookups.update(|l| upsert(&mut l.clientes, client));
                    for field in [nombre, dni, telefono, email] {
                        field.set(String::new());
                    }
                    set_open.set(false);
                    toast.success("Cliente registrado");
                }
                Err(e) => toast.failure("Clientes", &e),
            }
        });
    };

    view! {
        <Show
            when=move || open.get()
            fallback=move || view! {
                <button type="button" class="btn btn-link btn-xs" on:click=move |_| set_open.set(true)>
                    "+ Registrar nuevo cliente"
                </button>
            }
        >
            <div class="grid grid-cols-1 md:grid-cols-5 gap-2 items-end bg-base-200 p-3 rounded-box">
                <TextField label="Nombre completo" value=nombre required=true />
                <TextField label="DNI / RUC" value=dni />
                <TextField label="Teléfono" value=telefono />
                <TextField label="Email" value=email kind="email" />
                <div class="flex gap-1">
                    <button type="button" class="btn btn-sm btn-secondary" on:click=save>"Guardar"</button>
                    <button type="button" class="btn btn-sm btn-ghost" on:click=move |_| set_open.set(false)>"×"</button>
                </div>
            </div>
        </Show>
    }
}

/// 在表单内直接创建新标签并勾选
#[component]
fn QuickTag(lookups: RwSignal<Lookups>, form: CaseFormState) -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let nombre = RwSignal::new(String::new());
    let color = RwSignal::new("#3B82F6".to_string());

    let save = move |_| {
        let draft = TagDraft {
            nombre: nombre.get_untracked().trim().to_string(),
            color: color.get_untracked(),
            descripcion: String::new(),
        };
        let api = auth.api();
        spawn_local(async move {
            match api.create_tag(&draft).await {
                Ok(tag) => {
                    form.toggle_tag(tag.id);
                    lookups.update(|l| upsert(&mut l.tags, tag));
                    nombre.set(String::new());
                }
                Err(e) => toast.failure("Etiquetas", &e),
            }
        });
    };

    view! {
        <div class="flex gap-2 items-end">
            <TextField label="Nueva etiqueta" value=nombre />
            <input
                type="color"
                class="w-10 h-8 cursor-pointer"
                prop:value=move || color.get()
                on:input=move |ev| color.set(event_target_value(&ev))
            />
            <button type="button" class="btn btn-sm btn-outline" on:click=save>"Crear"</button>
        </div>
    }
}

// =========================================================
// 新建页面
// =========================================================

#[component]
pub fn NewCasePage() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let router = use_router();
    let lookups = RwSignal::new(Lookups::default());
    let (saving, set_saving) = signal(false);

    Effect::new(move |_| {
        let api = auth.api();
        spawn_local(async move {
            match api.lookups().await {
                Ok(data) => lookups.set(data),
                Err(e) => toast.failure("Expedientes", &e),
            }
        });
    });

    let initial = CaseDraft {
        fuero: "Civil".to_string(),
        fecha_inicio: local_now().date().format("%Y-%m-%d").to_string(),
        ..Default::default()
    };

    let on_submit = move |draft: CaseDraft| {
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            match api.create_case(&draft).await {
                Ok(created) => {
                    toast.success("Expediente creado");
                    router.go(AppRoute::CaseDetail(created.id));
                }
                Err(e) => toast.failure("Expedientes", &e),
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">"Apertura de expediente"</h3>
                <CaseForm
                    initial=initial
                    lookups=lookups
                    lawyer_locked=false
                    submit_label="Registrar expediente"
                    busy=saving
                    on_submit=on_submit
                    on_cancel=move |_| router.go(AppRoute::Cases)
                />
            </div>
        </div>
    }
}
