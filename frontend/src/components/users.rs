//! 用户管理（仅管理员）

use crate::auth::use_auth;
use crate::components::toast::use_toast;
use crate::components::widgets::{Spinner, TextField};
use crate::web::confirm;
use estudio_shared::listing::{remove_by_id, upsert};
use estudio_shared::protocol::{MIN_PASSWORD_LEN, NewUser};
use estudio_shared::{Id, Role, User};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn role_class(role: Role) -> &'static str {
    match role {
        Role::Admin => "badge badge-primary",
        Role::Lawyer => "badge badge-secondary",
        Role::Basic => "badge badge-ghost",
    }
}

#[component]
pub fn UsersPage() -> impl IntoView {
    let auth = use_auth();
    let toast = use_toast();

    let users = RwSignal::new(Vec::<User>::new());
    let (loading, set_loading) = signal(true);
    let (saving, set_saving) = signal(false);
    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let role = RwSignal::new(Role::Lawyer);
    let me = auth.user().map(|u| u.id);

    Effect::new(move |_| {
        let api = auth.api();
        spawn_local(async move {
            match api.list_users().await {
                Ok(list) => users.set(list),
                Err(e) => toast.failure("Usuarios", &e),
            }
            set_loading.set(false);
        });
    });

    let on_create = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let new_user = NewUser {
            username: username.get_untracked().trim().to_string(),
            password: password.get_untracked(),
            rol: role.get_untracked(),
        };
        let api = auth.api();
        set_saving.set(true);
        spawn_local(async move {
            match api.create_user(&new_user).await {
                Ok(created) => {
                    toast.success(format!("Usuario {} creado", created.username));
                    users.update(|list| upsert(list, created));
                    username.set(String::new());
                    password.set(String::new());
                    role.set(Role::Lawyer);
                }
                Err(e) => toast.failure("Usuarios", &e),
            }
            set_saving.set(false);
        });
    };

    let on_delete = move |id: Id, name: String| {
        if !confirm(&format!("¿Eliminar al usuario {}?", name)) {
            return;
        }
        let api = auth.api();
        spawn_local(async move {
            match api.delete_user(id).await {
                Ok(()) => {
                    users.update(|list| {
                        remove_by_id(list, id);
                    });
                    toast.success("Usuario eliminado");
                }
                Err(e) => toast.failure("Usuarios", &e),
            }
        });
    };

    view! {
        <div class="grid grid-cols-1 lg:grid-cols-3 gap-6">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title">"Nuevo usuario"</h3>
                    <form class="space-y-3" on:submit=on_create>
                        <TextField label="Usuario" value=username required=true />
                        <TextField label="Contraseña" value=password kind="password" required=true />
                        <p class="text-xs text-base-content/50">
                            {format!("Mínimo {} caracteres", MIN_PASSWORD_LEN)}
                        </p>
                        <label class="form-control w-full">
                            <span class="label-text text-xs font-semibold">"Rol"</span>
                            <select
                                class="select select-bordered select-sm"
                                on:change=move |ev| {
                                    if let Some(r) = Role::from_code(&event_target_value(&ev)) {
                                        role.set(r);
                                    }
                                }
                            >
                                {Role::ALL.into_iter().map(|r| view! {
                                    <option value=r.code() selected=move || role.get() == r>{r.label()}</option>
                                }).collect_view()}
                            </select>
                        </label>
                        <button type="submit" class="btn btn-primary w-full" disabled=move || saving.get()>
                            "Crear usuario"
                        </button>
                    </form>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl lg:col-span-2">
                <div class="card-body">
                    <h3 class="card-title">"Usuarios"</h3>
                    <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
                        <table class="table">
                            <thead>
                                <tr>
                                    <th>"Usuario"</th>
                                    <th>"Rol"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <For
                                    each=move || users.get()
                                    key=|u| (u.id, u.role)
                                    children=move |u| {
                                        let id = u.id;
                                        let name = u.username.clone();
                                        // 不能删除自己
                                        let is_me = me == Some(id);
                                        view! {
                                            <tr>
                                                <td class="font-medium">{u.username.clone()}</td>
                                                <td><span class=role_class(u.role)>{u.role.label()}</span></td>
                                                <td class="text-right">
                                                    <button
                                                        class="btn btn-ghost btn-xs text-error"
                                                        disabled=is_me
                                                        on:click=move |_| on_delete(id, name.clone())
                                                    >
                                                        "Eliminar"
                                                    </button>
                                                </td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </Show>
                </div>
            </div>
        </div>
    }
}
