use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{Pager, Spinner, StatusBadge, TagChips};
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use crate::web::{Debounce, XLSX_MIME, download_bytes};
use estudio_shared::api::{EXPORT_CASES_FILENAME, Lookups};
use estudio_shared::listing::{CaseListState, FilterChange, Page, Reload, sort_by_status};
use estudio_shared::{CASE_PAGE_SIZE, Case, CaseStatus, FUEROS, Id};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn parse_id(raw: &str) -> Option<Id> {
    raw.parse().ok()
}

#[component]
pub fn CaseListPage() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();
    let router = use_router();

    let state = RwSignal::new(CaseListState::default());
    let page = RwSignal::new(Page::<Case>::default());
    let (loading, set_loading) = signal(true);
    let (exporting, set_exporting) = signal(false);
    let lookups = RwSignal::new(Lookups::default());
    let debounce = Debounce::new();

    // 请求当前筛选条件与页码；后到的响应覆盖先到的
    let reload = move || {
        let (filters, number) = state.with_untracked(|s| (s.filters.clone(), s.page));
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            match api.list_cases(&filters, number).await {
                Ok(mut fresh) => {
                    sort_by_status(&mut fresh.results);
                    page.set(fresh);
                }
                Err(e) => toast.failure("Expedientes", &e),
            }
            set_loading.set(false);
        });
    };

    let apply = move |change: FilterChange| {
        let mut how = Reload::Immediate;
        state.update(|s| how = s.apply(change));
        match how {
            Reload::Immediate => {
                debounce.cancel();
                reload();
            }
            Reload::Debounced(ms) => debounce.schedule(ms, reload),
        }
    };

    let on_page = move |n: usize| {
        state.update(|s| s.set_page(n));
        reload();
    };

    let on_export = move |_| {
        let filters = state.with_untracked(|s| s.filters.clone());
        let api = auth.api();
        set_exporting.set(true);
        spawn_local(async move {
            match api.export_cases(&filters).await {
                Ok(bytes) => {
                    if let Err(e) = download_bytes(&bytes, EXPORT_CASES_FILENAME, XLSX_MIME) {
                        log_error!("[Expedientes] download failed: {:?}", e);
                        toast.error("No se pudo guardar el archivo");
                    }
                }
                Err(e) => toast.failure("Expedientes", &e),
            }
            set_exporting.set(false);
        });
    };

    // 初始加载：列表 + 下拉框选项
    Effect::new(move |_| {
        reload();
        let api = auth.api();
        spawn_local(async move {
            match api.lookups().await {
                Ok(data) => lookups.set(data),
                Err(e) => toast.failure("Expedientes", &e),
            }
        });
    });

    let filters = move || state.with(|s| s.filters.clone());
    let current_page = Signal::derive(move || state.with(|s| s.page));
    let total_pages = Signal::derive(move || page.with(|p| p.total_pages(CASE_PAGE_SIZE)));

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between flex-wrap gap-2">
                    <div>
                        <h3 class="card-title">"Expedientes"</h3>
                        <p class="text-base-content/70 text-sm">
                            {move || format!("{} resultados", page.with(|p| p.count))}
                        </p>
                    </div>
                    <div class="flex gap-2">
                        <button class="btn btn-outline btn-sm" on:click=on_export disabled=move || exporting.get()>
                            {move || if exporting.get() { "Exportando..." } else { "Exportar Excel" }}
                        </button>
                        <button class="btn btn-primary btn-sm" on:click=move |_| router.go(AppRoute::NewCase)>
                            "Nuevo expediente"
                        </button>
                    </div>
                </div>

                // 筛选条件
                <div class="grid grid-cols-1 md:grid-cols-4 gap-2 mt-4">
                    <input
                        type="search"
                        class="input input-bordered input-sm md:col-span-2"
                        placeholder="Buscar por carátula, cliente, expediente o código"
                        prop:value=move || filters().search
                        on:input=move |ev| apply(FilterChange::Search(event_target_value(&ev)))
                    />
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| apply(FilterChange::Estado(CaseStatus::from_label(&event_target_value(&ev))))
                    >
                        <option value="" selected=move || filters().estado.is_none()>"Todos los estados"</option>
                        {CaseStatus::ALL.into_iter().map(|s| view! {
                            <option value=s.label() selected=move || filters().estado == Some(s)>{s.label()}</option>
                        }).collect_view()}
                    </select>
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| apply(FilterChange::Fuero(event_target_value(&ev)))
                    >
                        <option value="" selected=move || filters().fuero.is_empty()>"Todos los fueros"</option>
                        {FUEROS.iter().map(|f| view! {
                            <option value=*f selected=move || filters().fuero == *f>{*f}</option>
                        }).collect_view()}
                    </select>
                    <input
                        type="text"
                        class="input input-bordered input-sm"
                        placeholder="Abogado"
                        prop:value=move || filters().abogado
                        on:input=move |ev| apply(FilterChange::Abogado(event_target_value(&ev)))
                    />
                    <input
                        type="text"
                        class="input input-bordered input-sm"
                        placeholder="Juzgado"
                        prop:value=move || filters().juzgado
                        on:input=move |ev| apply(FilterChange::Juzgado(event_target_value(&ev)))
                    />
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| apply(FilterChange::Cliente(parse_id(&event_target_value(&ev))))
                    >
                        <option value="" selected=move || filters().cliente.is_none()>"Todos los clientes"</option>
                        {move || lookups.with(|l| l.clientes.clone()).into_iter().map(|c| {
                            let id = c.id;
                            view! {
                                <option value=id.to_string() selected=move || filters().cliente == Some(id)>{c.nombre_completo}</option>
                            }
                        }).collect_view()}
                    </select>
                    <select
                        class="select select-bordered select-sm"
                        on:change=move |ev| apply(FilterChange::Etiqueta(parse_id(&event_target_value(&ev))))
                    >
                        <option value="" selected=move || filters().etiqueta.is_none()>"Todas las etiquetas"</option>
                        {move || lookups.with(|l| l.tags.clone()).into_iter().map(|t| {
                            let id = t.id;
                            view! {
                                <option value=id.to_string() selected=move || filters().etiqueta == Some(id)>{t.nombre}</option>
                            }
                        }).collect_view()}
                    </select>
                    <label class="form-control">
                        <span class="label-text text-xs">"Inicio desde"</span>
                        <input type="date" class="input input-bordered input-sm"
                            prop:value=move || filters().fecha_inicio_desde
                            on:change=move |ev| apply(FilterChange::FechaInicioDesde(event_target_value(&ev)))
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text text-xs">"Inicio hasta"</span>
                        <input type="date" class="input input-bordered input-sm"
                            prop:value=move || filters().fecha_inicio_hasta
                            on:change=move |ev| apply(FilterChange::FechaInicioHasta(event_target_value(&ev)))
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text text-xs">"Modificado desde"</span>
                        <input type="date" class="input input-bordered input-sm"
                            prop:value=move || filters().fecha_modificacion_desde
                            on:change=move |ev| apply(FilterChange::FechaModificacionDesde(event_target_value(&ev)))
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text text-xs">"Modificado hasta"</span>
                        <input type="date" class="input input-bordered input-sm"
                            prop:value=move || filters().fecha_modificacion_hasta
                            on:change=move |ev| apply(FilterChange::FechaModificacionHasta(event_target_value(&ev)))
                        />
                    </label>
                    <button
                        class="btn btn-ghost btn-sm self-end"
                        disabled=move || state.with(|s| s.filters.is_empty())
                        on:click=move |_| apply(FilterChange::Clear)
                    >
                        "Limpiar filtros"
                    </button>
                </div>

                <div class="overflow-x-auto w-full mt-4">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Código"</th>
                                <th>"Carátula"</th>
                                <th class="hidden md:table-cell">"Expediente"</th>
                                <th class="hidden md:table-cell">"Juzgado / Fuero"</th>
                                <th class="hidden lg:table-cell">"Abogado"</th>
                                <th>"Estado"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || !loading.get() && page.with(|p| p.results.is_empty())>
                                <tr>
                                    <td colspan="6" class="text-center py-8 text-base-content/50">
                                        "No se encontraron expedientes"
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || page.with(|p| p.results.clone())
                                key=|c| c.id
                                children=move |case| {
                                    let id = case.id;
                                    view! {
                                        <tr class="hover cursor-pointer" on:click=move |_| router.go(AppRoute::CaseDetail(id))>
                                            <td class="font-mono text-xs">{case.codigo_interno.clone()}</td>
                                            <td>
                                                <div class="font-semibold">{case.caratula.clone()}</div>
                                                <div class="text-xs opacity-60">{case.cliente_nombre.clone()}</div>
                                                <TagChips tags=case.etiquetas.clone() />
                                            </td>
                                            <td class="hidden md:table-cell font-mono text-sm">{case.nro_expediente.clone()}</td>
                                            <td class="hidden md:table-cell text-sm">
                                                <div>{case.juzgado.clone()}</div>
                                                <div class="opacity-60">{case.fuero.clone()}</div>
                                            </td>
                                            <td class="hidden lg:table-cell text-sm">{case.abogado_responsable.clone()}</td>
                                            <td><StatusBadge status=case.estado /></td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
                <Show when=move || loading.get()>
                    <Spinner />
                </Show>

                <Pager page=current_page pages=total_pages on_change=on_page />
            </div>
        </div>
    }
}
