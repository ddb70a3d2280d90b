use super::*;
use crate::error::MSG_FORBIDDEN;
use crate::listing::remove_by_id;
use crate::optimistic::Snapshot;
use crate::request::MockHttpClient;
use crate::session::MemorySessionStore;
use crate::{CaseStatus, Priority, Role};
use serde_json::json;
use std::sync::Arc;

const BASE: &str = "http://api.test/api";

struct Harness {
    client: Arc<MockHttpClient>,
    store: Arc<MemorySessionStore>,
    api: EstudioApi<MockHttpClient, MemorySessionStore>,
}

fn harness() -> Harness {
    let client = Arc::new(MockHttpClient::new());
    let store = Arc::new(MemorySessionStore::with_tokens("tok", "ref"));
    let api = EstudioApi::new(ApiGateway::new(client.clone(), store.clone(), BASE));
    Harness { client, store, api }
}

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn user(role: Role) -> User {
    User {
        id: 1,
        username: "ana".into(),
        role,
    }
}

fn case_json(id: u64, estado: &str) -> serde_json::Value {
    json!({
        "id": id,
        "codigo_interno": format!("ENT-{:03}", id),
        "caratula": "Pérez c/ Gómez",
        "estado": estado,
        "abogado_responsable": "Dra. Neira",
        "cliente": {"id": 4, "nombre_completo": "Juan Pérez"},
        "last_modified_by_username": "ana",
        "notas": [
            {"id": 1, "titulo": "n1", "contenido": "a"},
            {"id": 2, "titulo": "n2", "contenido": "b"},
            {"id": 3, "titulo": "n3", "contenido": "c"}
        ]
    })
}

// =========================================================
// 认证
// =========================================================

#[tokio::test]
async fn test_login_stores_tokens_and_normalized_user() {
    let h = harness();
    h.store.clear();
    h.client.mock_response(
        &url(LOGIN_PATH),
        200,
        json!({
            "access": "a1",
            "refresh": "r1",
            "user": {"id": "7", "username": "admin", "is_admin": true}
        }),
    );

    let logged = h.api.login(" admin ", "secret").await.unwrap();
    assert_eq!(logged.id, 7);
    assert_eq!(logged.role, Role::Admin);
    assert_eq!(h.store.access_token().as_deref(), Some("a1"));
    assert_eq!(h.store.refresh_token().as_deref(), Some("r1"));
    assert_eq!(h.store.current_user(), Some(logged));

    let sent = h.client.requests_to(&url(LOGIN_PATH));
    assert_eq!(sent[0].header("Authorization"), None);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(sent[0].body.as_deref().unwrap()).unwrap(),
        json!({"username": "admin", "password": "secret"})
    );
}

#[tokio::test]
async fn test_bad_credentials_are_authentication_errors() {
    let h = harness();
    h.client.mock_response(
        &url(LOGIN_PATH),
        401,
        json!({"detail": "No active account found with the given credentials"}),
    );

    let err = h.api.login("ana", "mala").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Authentication);
    assert_eq!(
        err.message(),
        "No active account found with the given credentials"
    );
    // 登录失败不触发刷新
    assert!(h.client.requests_to(&url("/auth/refresh/")).is_empty());
}

#[tokio::test]
async fn test_login_failure_without_body_uses_default_message() {
    let h = harness();
    h.client.mock_raw(&url(LOGIN_PATH), 400, b"oops".to_vec());

    let err = h.api.login("ana", "x").await.unwrap_err();
    assert_eq!(err.message(), MSG_BAD_CREDENTIALS);
}

#[tokio::test]
async fn test_blank_login_is_not_sent() {
    let h = harness();
    let err = h.api.login("  ", "x").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Validation);
    assert!(h.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_current_user_requires_stored_user() {
    let h = harness();
    assert!(h.api.current_user().await.is_none());
    assert!(h.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_current_user_refreshes_stored_copy() {
    let h = harness();
    h.store.set_current_user(&user(Role::Basic));
    h.client.mock_response(
        &url(ME_PATH),
        200,
        json!({"id": 1, "username": "ana", "rol": "abogado"}),
    );

    let me = h.api.current_user().await.unwrap();
    assert_eq!(me.role, Role::Lawyer);
    assert_eq!(h.store.current_user().unwrap().role, Role::Lawyer);
}

#[tokio::test]
async fn test_current_user_clears_invalid_session() {
    let h = harness();
    h.store.set_current_user(&user(Role::Basic));
    h.client.mock_response(&url(ME_PATH), 500, json!({}));

    assert!(h.api.current_user().await.is_none());
    assert!(h.store.access_token().is_none());
    assert!(h.api.stored_user().is_none());
}

// =========================================================
// 案件
// =========================================================

#[tokio::test]
async fn test_list_cases_sends_filters_and_page() {
    let h = harness();
    let filters = CaseFilters {
        search: "gómez".into(),
        estado: Some(CaseStatus::Open),
        ..Default::default()
    };
    let expected = url("/cases/?search=g%C3%B3mez&estado=Abierto&page=2");
    h.client.mock_response(
        &expected,
        200,
        json!({"results": [case_json(1, "Abierto")], "count": 9, "next": null, "previous": "p"}),
    );

    let page = h.api.list_cases(&filters, 2).await.unwrap();
    assert_eq!(page.count, 9);
    assert_eq!(page.results[0].cliente_nombre, "Juan Pérez");
    assert_eq!(page.results[0].cliente_id, Some(4));
    assert_eq!(h.client.requests_to(&expected).len(), 1);
}

#[tokio::test]
async fn test_all_cases_follows_pages_until_last() {
    let h = harness();
    h.client.mock_response(
        &url("/cases/?page=1"),
        200,
        json!({"results": [case_json(1, "Abierto"), case_json(2, "Abierto")], "count": 3, "next": "p2", "previous": null}),
    );
    h.client.mock_response(
        &url("/cases/?page=2"),
        200,
        json!({"results": [case_json(2, "Abierto"), case_json(3, "Cerrado")], "count": 3, "next": null, "previous": "p1"}),
    );

    let cases = h.api.all_cases(&CaseFilters::default()).await.unwrap();
    let ids: Vec<u64> = cases.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(h.client.requests_to(&url("/cases/?page=3")).is_empty());
}

#[tokio::test]
async fn test_calendar_groups_records_from_their_own_endpoints() {
    let h = harness();
    // 列表接口只返回摘要字段，没有 alertas / actuaciones
    h.client.mock_response(
        &url("/cases/?page=1"),
        200,
        json!({"results": [
            {"id": 1, "codigo_interno": "ENT-001", "caratula": "Pérez c/ Gómez", "estado": "Abierto",
             "cliente_nombre": "Juan Pérez", "etiquetas": [], "total_actuaciones": 1, "alertas_pendientes": 1},
            {"id": 2, "codigo_interno": "ENT-002", "caratula": "Ruiz c/ Sur", "estado": "Pausado"}
        ], "count": 2, "next": null, "previous": null}),
    );
    h.client.mock_response(
        &url("/alertas/?page=1"),
        200,
        json!([
            {"id": 11, "caso": 1, "titulo": "Contestar", "fecha_vencimiento": "2025-03-04", "cumplida": false},
            {"id": 12, "caso": 2, "titulo": "Audiencia", "fecha_vencimiento": "2025-03-04", "cumplida": true},
            {"id": 13, "caso": 77, "titulo": "Ajeno", "fecha_vencimiento": "2025-03-04"}
        ]),
    );
    h.client.mock_response(
        &url("/actuaciones/?page=1"),
        200,
        json!([{"id": 21, "caso": 2, "fecha": "2025-03-05", "descripcion": "Escrito"}]),
    );

    let index = h.api.calendar().await.unwrap();
    let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
    let events = index.events_for(day);
    let titles: Vec<&str> = events.alerts.iter().map(|a| a.caratula.as_str()).collect();
    assert_eq!(titles, vec!["Pérez c/ Gómez", "Ruiz c/ Sur"]);

    let stats = index.stats();
    assert_eq!(stats.total_alerts, 2);
    assert_eq!(stats.pending_alerts, 1);
    assert_eq!(stats.total_actuaciones, 1);
    assert!(h.client.requests_to(&url("/alertas/?page=2")).is_empty());
}

#[tokio::test]
async fn test_create_case_requires_caratula() {
    let h = harness();
    let err = h.api.create_case(&CaseDraft::default()).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Validation);
    assert!(h.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_create_case_returns_server_representation() {
    let h = harness();
    h.client
        .mock_response(&url("/cases/"), 201, case_json(12, "Abierto"));
    let draft = CaseDraft {
        caratula: "Pérez c/ Gómez".into(),
        cliente_id: Some(4),
        etiquetas_ids: vec![1, 2],
        ..Default::default()
    };

    let created = h.api.create_case(&draft).await.unwrap();
    assert_eq!(created.codigo_interno, "ENT-012");

    let sent = &h.client.requests_to(&url("/cases/"))[0];
    let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["etiquetas_ids"], json!([1, 2]));
    assert!(body.get("codigo_interno").is_none());
}

#[tokio::test]
async fn test_only_admin_reassigns_lawyer() {
    let h = harness();
    let patch = CasePatch::lawyer("Dr. Soto");

    let err = h
        .api
        .update_case(3, &patch, &user(Role::Lawyer))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Forbidden);
    assert_eq!(err.message(), MSG_FORBIDDEN);
    assert!(h.client.requests.borrow().is_empty());

    let mut updated = case_json(3, "Abierto");
    updated["abogado_responsable"] = json!("Dr. Soto");
    h.client.mock_response(&url("/cases/3/"), 200, updated);
    let case = h
        .api
        .update_case(3, &patch, &user(Role::Admin))
        .await
        .unwrap();
    assert_eq!(case.abogado_responsable, "Dr. Soto");
}

#[tokio::test]
async fn test_status_edit_rolls_back_on_server_error() {
    let h = harness();
    let mut local: Case = serde_json::from_value(case_json(5, "Abierto")).unwrap();
    let original = local.clone();
    h.client.mock_response(
        &url("/cases/5/"),
        400,
        json!({"estado": ["Transición no permitida"]}),
    );

    let patch = CasePatch::status(CaseStatus::Closed);
    let snap = Snapshot::apply(&mut local, &patch);
    assert_eq!(local.estado, CaseStatus::Closed);

    let outcome = h.api.update_case(5, &patch, &user(Role::Lawyer)).await;
    let err = snap.settle(&mut local, outcome).unwrap_err();
    assert_eq!(err.message(), "estado: Transición no permitida");
    assert_eq!(local, original);
}

#[tokio::test]
async fn test_status_edit_takes_server_audit_fields() {
    let h = harness();
    let mut local: Case = serde_json::from_value(case_json(5, "Abierto")).unwrap();
    let mut server = case_json(5, "Pausado");
    server["last_modified_by_username"] = json!("luis");
    h.client.mock_response(&url("/cases/5/"), 200, server);

    let patch = CasePatch::status(CaseStatus::Paused);
    let snap = Snapshot::apply(&mut local, &patch);
    let outcome = h.api.update_case(5, &patch, &user(Role::Basic)).await;
    snap.settle(&mut local, outcome).unwrap();

    assert_eq!(local.estado, CaseStatus::Paused);
    assert_eq!(
        local.audit.last_modified_by_username.as_deref(),
        Some("luis")
    );
}

#[tokio::test]
async fn test_delete_case_accepts_no_content() {
    let h = harness();
    h.client.mock_raw(&url("/cases/8/"), 204, Vec::new());
    h.api.delete_case(8).await.unwrap();

    let sent = h.client.requests_to(&url("/cases/8/"));
    assert_eq!(sent[0].method, crate::request::HttpMethod::Delete);
}

// =========================================================
// 子集合
// =========================================================

#[tokio::test]
async fn test_toggle_twice_restores_state_and_clears_actor() {
    let h = harness();
    let toggle = url("/alertas/9/toggle_cumplida/");
    h.client.mock_response(
        &toggle,
        200,
        json!({
            "id": 9, "titulo": "Apelar", "fecha_vencimiento": "2025-01-10",
            "cumplida": true, "completed_by": 1, "completed_by_username": "ana",
            "completed_at": "2025-01-09T10:00:00Z"
        }),
    );
    h.client.mock_response(
        &toggle,
        200,
        json!({
            "id": 9, "titulo": "Apelar", "fecha_vencimiento": "2025-01-10",
            "cumplida": false, "completed_by": null, "completed_by_username": null,
            "completed_at": null
        }),
    );

    let first = h.api.toggle_alerta(9).await.unwrap();
    assert!(first.cumplida);
    assert_eq!(first.completed_by_username.as_deref(), Some("ana"));

    let second = h.api.toggle_alerta(9).await.unwrap();
    assert!(!second.cumplida);
    assert_eq!(second.completed_by, None);
    assert_eq!(second.completed_by_username, None);
    assert_eq!(second.completed_at, None);
    assert_eq!(h.client.requests_to(&toggle).len(), 2);
}

#[tokio::test]
async fn test_add_alerta_posts_to_case_action() {
    let h = harness();
    let endpoint = url("/cases/3/add_alerta/");
    h.client.mock_response(
        &endpoint,
        201,
        json!({"id": 40, "caso": 3, "titulo": "Audiencia", "fecha_vencimiento": "2025-02-01",
               "prioridad": "Alta", "created_by_username": "ana"}),
    );
    let draft = AlertaDraft {
        titulo: "Audiencia".into(),
        fecha_vencimiento: "2025-02-01".into(),
        prioridad: Priority::High,
        ..Default::default()
    };

    let alerta = h.api.add_alerta(3, &draft).await.unwrap();
    assert_eq!(alerta.caso, Some(3));
    assert_eq!(alerta.prioridad, Priority::High);
    assert_eq!(alerta.audit.created_by_username.as_deref(), Some("ana"));
}

#[tokio::test]
async fn test_note_delete_then_local_removal() {
    let h = harness();
    let mut case: Case = serde_json::from_value(case_json(1, "Abierto")).unwrap();
    h.client.mock_raw(&url("/notas/2/"), 204, Vec::new());

    h.api.delete_note(2).await.unwrap();
    remove_by_id(&mut case.notas, 2);

    let ids: Vec<u64> = case.notas.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_failed_delete_leaves_collection_alone() {
    let h = harness();
    h.client
        .mock_response(&url("/actuaciones/4/"), 404, json!({"detail": "No encontrado."}));

    let err = h.api.delete_actuacion(4).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Rejected);
    assert_eq!(err.message(), "No encontrado.");
}

#[tokio::test]
async fn test_alert_feed_uses_fixed_page_size() {
    let h = harness();
    let feed_url = url("/alertas/?page_size=5&page=3");
    h.client.mock_response(
        &feed_url,
        200,
        json!({"results": [{"id": 1, "fecha_vencimiento": "2025-01-01", "caso_caratula": "X"}], "next": null}),
    );

    let page = h.api.alert_feed(3).await.unwrap();
    assert_eq!(page.results[0].caso_caratula.as_deref(), Some("X"));
    assert!(!page.has_next());
}

// =========================================================
// 用户 / 查找表 / 导出
// =========================================================

#[tokio::test]
async fn test_users_accept_paginated_and_legacy_shapes() {
    let h = harness();
    h.client.mock_response(
        &url("/users/"),
        200,
        json!({"count": 3, "results": [
            {"id": 1, "username": "root", "is_admin": true},
            {"id": 2, "username": "luis", "rol": "abogado", "is_admin": false},
            {"id": 3, "username": "eva", "isAdmin": false}
        ]}),
    );

    let users = h.api.list_users().await.unwrap();
    let roles: Vec<Role> = users.iter().map(|u| u.role).collect();
    assert_eq!(roles, vec![Role::Admin, Role::Lawyer, Role::Basic]);
}

#[tokio::test]
async fn test_create_user_validates_password() {
    let h = harness();
    let err = h
        .api
        .create_user(&NewUser {
            username: "nuevo".into(),
            password: "123".into(),
            rol: Role::Basic,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Validation);
    assert!(h.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_users_forbidden_for_non_admin() {
    let h = harness();
    h.client
        .mock_response(&url("/users/"), 403, json!({"detail": "nope"}));
    let err = h.api.list_users().await.unwrap_err();
    assert_eq!(err.message(), MSG_FORBIDDEN);
}

#[tokio::test]
async fn test_lookups_loads_all_three() {
    let h = harness();
    h.client.mock_response(
        &url("/clientes/"),
        200,
        json!([{"id": 1, "nombre_completo": "Juan Pérez"}]),
    );
    h.client.mock_response(
        &url("/tags/"),
        200,
        json!([{"id": 2, "nombre": "Urgente", "color": "#EF4444"}]),
    );
    h.client.mock_response(
        &url("/actuacion-templates/"),
        200,
        json!({"results": [{"id": 3, "nombre": "Escrito simple", "descripcion_template": "Se presenta escrito en {caratula}"}]}),
    );

    let lookups = h.api.lookups().await.unwrap();
    assert_eq!(lookups.clientes[0].nombre_completo, "Juan Pérez");
    assert_eq!(lookups.tags[0].color, "#EF4444");
    assert_eq!(lookups.templates[0].id, 3);
}

#[tokio::test]
async fn test_lookups_fail_if_any_fails() {
    let h = harness();
    h.client.mock_response(&url("/clientes/"), 200, json!([]));
    h.client.mock_response(&url("/tags/"), 500, json!({"error": "db"}));
    h.client
        .mock_response(&url("/actuacion-templates/"), 200, json!([]));

    let err = h.api.lookups().await.unwrap_err();
    assert_eq!(err.message(), "db");
}

#[tokio::test]
async fn test_export_returns_raw_bytes() {
    let h = harness();
    let endpoint = url("/cases/export_excel/?estado=Cerrado");
    h.client.mock_raw(&endpoint, 200, vec![0x50, 0x4B, 0x03, 0x04]);
    let filters = CaseFilters {
        estado: Some(CaseStatus::Closed),
        ..Default::default()
    };

    let bytes = h.api.export_cases(&filters).await.unwrap();
    assert_eq!(bytes, vec![0x50, 0x4B, 0x03, 0x04]);
    assert_eq!(timeline_filename("ENT-004"), "timeline_ENT-004.xlsx");
}

#[tokio::test]
async fn test_export_failure_has_fixed_message() {
    let h = harness();
    h.client
        .mock_raw(&url("/cases/2/export_timeline/"), 500, b"<html>".to_vec());

    let err = h.api.export_timeline(2).await.unwrap_err();
    assert_eq!(err.message(), "Error al exportar el timeline del caso");
    assert_eq!(err.status, Some(500));
}

#[tokio::test]
async fn test_aviso_is_admin_only() {
    let h = harness();
    let draft = AvisoDraft::new("Feriado");
    let err = h
        .api
        .post_aviso(&draft, &user(Role::Lawyer))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Forbidden);

    h.client.mock_response(
        &url("/avisos/"),
        201,
        json!({"id": 1, "contenido": "Feriado", "active": true}),
    );
    let aviso = h
        .api
        .post_aviso(&draft, &user(Role::Admin))
        .await
        .unwrap()
        .unwrap();
    assert!(aviso.active);
}

#[tokio::test]
async fn test_expired_session_during_mutation() {
    let h = harness();
    h.client.mock_response(&url("/notas/1/"), 401, json!({}));
    h.client
        .mock_response(&url("/auth/refresh/"), 401, json!({"detail": "expired"}));

    let err = h.api.delete_note(1).await.unwrap_err();
    assert!(err.requires_login());
    assert!(h.store.refresh_token().is_none());
}
