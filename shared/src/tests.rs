use super::*;
use serde_json::json;

#[test]
fn test_user_role_from_rol() {
    let u: User = serde_json::from_value(json!({"id": 1, "username": "a", "rol": "abogado"})).unwrap();
    assert_eq!(u.role, Role::Lawyer);
    assert!(!u.is_admin());
}

#[test]
fn test_user_role_from_legacy_flags() {
    let snake: User =
        serde_json::from_value(json!({"id": 1, "username": "a", "is_admin": true})).unwrap();
    assert!(snake.is_admin());

    let camel: User =
        serde_json::from_value(json!({"id": "2", "username": "b", "isAdmin": true})).unwrap();
    assert!(camel.is_admin());
    assert_eq!(camel.id, 2);

    let none: User = serde_json::from_value(json!({"id": 3, "username": "c"})).unwrap();
    assert_eq!(none.role, Role::Basic);
}

#[test]
fn test_explicit_rol_beats_legacy_flag() {
    let u: User = serde_json::from_value(
        json!({"id": 1, "username": "a", "rol": "usuario", "is_admin": true}),
    )
    .unwrap();
    assert_eq!(u.role, Role::Basic);
}

#[test]
fn test_stored_user_round_trips_through_storage_shape() {
    let u = User {
        id: 4,
        username: "eva".into(),
        role: Role::Admin,
    };
    let stored = serde_json::to_string(&u).unwrap();
    assert!(stored.contains(r#""rol":"admin""#));
    let back: User = serde_json::from_str(&stored).unwrap();
    assert_eq!(back, u);
}

#[test]
fn test_case_client_as_id_or_nested() {
    let listed: Case = serde_json::from_value(json!({
        "id": 1, "cliente": 9, "cliente_nombre_display": "Ana Ruiz"
    }))
    .unwrap();
    assert_eq!(listed.cliente_id, Some(9));
    assert_eq!(listed.cliente_nombre, "Ana Ruiz");

    let detailed: Case = serde_json::from_value(json!({
        "id": 1, "cliente": {"id": 9, "nombre_completo": "Ana Ruiz", "dni_ruc": "123"}
    }))
    .unwrap();
    assert_eq!(detailed.cliente_id, Some(9));
    assert_eq!(detailed.cliente_nombre, "Ana Ruiz");

    let legacy: Case = serde_json::from_value(json!({
        "id": 1, "cliente": null, "cliente_nombre": "Sin registro"
    }))
    .unwrap();
    assert_eq!(legacy.cliente_id, None);
    assert_eq!(legacy.cliente_nombre, "Sin registro");
}

#[test]
fn test_case_tolerates_nulls_and_missing_collections() {
    let c: Case = serde_json::from_value(json!({
        "id": "15",
        "caratula": null,
        "folder_link": "",
        "estado": "En Trámite",
        "etiquetas": null,
        "created_by_username": "ana"
    }))
    .unwrap();
    assert_eq!(c.id, 15);
    assert_eq!(c.caratula, "");
    assert_eq!(c.folder_link, None);
    assert_eq!(c.estado, CaseStatus::InProgress);
    assert!(c.etiquetas.is_empty());
    assert!(c.actuaciones.is_empty());
    assert_eq!(c.audit.created_by_username.as_deref(), Some("ana"));
}

#[test]
fn test_status_weights() {
    assert_eq!(CaseStatus::Open.weight(), CaseStatus::InProgress.weight());
    assert!(CaseStatus::InProgress.weight() < CaseStatus::Paused.weight());
    assert!(CaseStatus::Paused.weight() < CaseStatus::Closed.weight());
    assert_eq!(CaseStatus::from_label("Pausado"), Some(CaseStatus::Paused));
    assert_eq!(CaseStatus::from_label("pausado"), None);
}

#[test]
fn test_template_placeholders() {
    let case: Case = serde_json::from_value(json!({
        "id": 1,
        "caratula": "Pérez c/ Gómez",
        "nro_expediente": "123/2024",
        "juzgado": "Juzgado Civil 2",
        "cliente": {"id": 2, "nombre_completo": "Juan Pérez"}
    }))
    .unwrap();
    let template: ActuacionTemplate = serde_json::from_value(json!({
        "id": 1,
        "nombre": "Escrito",
        "descripcion_template": "{fecha}: escrito de {cliente} en {caratula} ({nro_expediente}, {juzgado})"
    }))
    .unwrap();
    assert_eq!(
        template.render(&case, "2025-01-10"),
        "2025-01-10: escrito de Juan Pérez en Pérez c/ Gómez (123/2024, Juzgado Civil 2)"
    );
}

#[test]
fn test_note_label_and_priority_defaults() {
    let n: Note = serde_json::from_value(json!({"id": 1, "titulo": "t"})).unwrap();
    assert_eq!(n.etiqueta, NoteLabel::Strategy);
    let a: Alerta = serde_json::from_value(json!({"id": 1, "hora": "  "})).unwrap();
    assert_eq!(a.prioridad, Priority::Medium);
    assert_eq!(a.hora, None);
}
