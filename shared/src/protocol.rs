//! 请求体定义
//!
//! 创建用 `*Draft`，局部更新用 `*Patch`（只序列化被设置的字段）。
//! 审计字段、`codigo_interno` 等服务端字段不会出现在这里。

use crate::error::{ApiError, ApiResult};
use crate::{Actuacion, Alerta, Case, CaseStatus, Id, Note, NoteLabel, Priority, Role, User};
use serde::{Deserialize, Serialize};

/// 发送前的必填字段检查
pub trait Validate {
    fn validate(&self) -> ApiResult<()>;
}

fn required(value: &str, message: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::validation(message))
    } else {
        Ok(())
    }
}

pub const MIN_PASSWORD_LEN: usize = 4;

// =========================================================
// 认证
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        required(&self.username, "Ingresa el usuario")?;
        required(&self.password, "Ingresa la contraseña")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

// =========================================================
// 案件
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseDraft {
    pub caratula: String,
    pub nro_expediente: String,
    pub juzgado: String,
    pub fuero: String,
    pub estado: CaseStatus,
    pub abogado_responsable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<Id>,
    pub cliente_nombre: String,
    pub cliente_dni: String,
    pub contraparte: String,
    pub fecha_inicio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_link: Option<String>,
    pub etiquetas_ids: Vec<Id>,
}

impl Validate for CaseDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.caratula, "La carátula es obligatoria")
    }
}

/// 案件局部更新；未设置的字段不会发送
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caratula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nro_expediente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juzgado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abogado_responsable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contraparte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etiquetas_ids: Option<Vec<Id>>,
}

impl CasePatch {
    pub fn status(estado: CaseStatus) -> Self {
        Self {
            estado: Some(estado),
            ..Default::default()
        }
    }

    pub fn lawyer(abogado: impl Into<String>) -> Self {
        Self {
            abogado_responsable: Some(abogado.into()),
            ..Default::default()
        }
    }

    pub fn touches_lawyer(&self) -> bool {
        self.abogado_responsable.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Validate for CasePatch {
    fn validate(&self) -> ApiResult<()> {
        match &self.caratula {
            Some(c) => required(c, "La carátula es obligatoria"),
            None => Ok(()),
        }
    }
}

impl CaseDraft {
    /// 编辑表单的初始值
    pub fn from_case(case: &Case) -> Self {
        Self {
            caratula: case.caratula.clone(),
            nro_expediente: case.nro_expediente.clone(),
            juzgado: case.juzgado.clone(),
            fuero: case.fuero.clone(),
            estado: case.estado,
            abogado_responsable: case.abogado_responsable.clone(),
            cliente_id: case.cliente_id,
            cliente_nombre: case.cliente_nombre.clone(),
            cliente_dni: case.cliente_dni.clone(),
            contraparte: case.contraparte.clone(),
            fecha_inicio: case.fecha_inicio.clone(),
            folder_link: case.folder_link.clone(),
            etiquetas_ids: case.etiquetas.iter().map(|t| t.id).collect(),
        }
    }
}

fn changed(before: &str, after: &str) -> Option<String> {
    (before != after).then(|| after.to_string())
}

impl CasePatch {
    /// 只包含编辑后发生变化的字段
    ///
    /// 清空 folder_link 时发送空串；标签按集合比较，顺序无关。
    pub fn between(case: &Case, draft: &CaseDraft) -> Self {
        let mut before_tags: Vec<Id> = case.etiquetas.iter().map(|t| t.id).collect();
        let mut after_tags = draft.etiquetas_ids.clone();
        before_tags.sort_unstable();
        after_tags.sort_unstable();
        after_tags.dedup();

        Self {
            caratula: changed(&case.caratula, &draft.caratula),
            nro_expediente: changed(&case.nro_expediente, &draft.nro_expediente),
            juzgado: changed(&case.juzgado, &draft.juzgado),
            fuero: changed(&case.fuero, &draft.fuero),
            estado: (case.estado != draft.estado).then_some(draft.estado),
            abogado_responsable: changed(&case.abogado_responsable, &draft.abogado_responsable),
            cliente_id: draft.cliente_id.filter(|id| case.cliente_id != Some(*id)),
            contraparte: changed(&case.contraparte, &draft.contraparte),
            fecha_inicio: changed(&case.fecha_inicio, &draft.fecha_inicio),
            folder_link: changed(
                case.folder_link.as_deref().unwrap_or(""),
                draft.folder_link.as_deref().unwrap_or("").trim(),
            ),
            etiquetas_ids: (before_tags != after_tags).then_some(after_tags),
        }
    }
}

// =========================================================
// 子集合
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActuacionDraft {
    pub fecha: String,
    pub descripcion: String,
    pub tipo: String,
}

impl Validate for ActuacionDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.descripcion, "La descripción es obligatoria")?;
        required(&self.fecha, "La fecha es obligatoria")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertaDraft {
    pub titulo: String,
    pub resumen: String,
    pub fecha_vencimiento: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora: Option<String>,
    pub prioridad: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiempo_estimado_minutos: Option<u32>,
}

impl Validate for AlertaDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.titulo, "El título es obligatorio")?;
        required(&self.fecha_vencimiento, "La fecha de vencimiento es obligatoria")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteDraft {
    pub titulo: String,
    pub resumen: String,
    pub contenido: String,
    pub etiqueta: NoteLabel,
}

impl Validate for NoteDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.titulo, "El título es obligatorio")?;
        required(&self.contenido, "El contenido es obligatorio")
    }
}

impl From<&Actuacion> for ActuacionDraft {
    fn from(a: &Actuacion) -> Self {
        Self {
            fecha: a.fecha.chars().take(10).collect(),
            descripcion: a.descripcion.clone(),
            tipo: a.tipo.clone(),
        }
    }
}

impl From<&Alerta> for AlertaDraft {
    fn from(a: &Alerta) -> Self {
        Self {
            titulo: a.titulo.clone(),
            resumen: a.resumen.clone(),
            fecha_vencimiento: a.fecha_vencimiento.chars().take(10).collect(),
            hora: a.hora.clone(),
            prioridad: a.prioridad,
            tiempo_estimado_minutos: a.tiempo_estimado_minutos,
        }
    }
}

impl From<&Note> for NoteDraft {
    fn from(n: &Note) -> Self {
        Self {
            titulo: n.titulo.clone(),
            resumen: n.resumen.clone(),
            contenido: n.contenido.clone(),
            etiqueta: n.etiqueta,
        }
    }
}

// =========================================================
// 用户与查找表
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub rol: Role,
}

impl Validate for NewUser {
    fn validate(&self) -> ApiResult<()> {
        required(&self.username, "El usuario es obligatorio")?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "La contraseña debe tener al menos {} caracteres",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientDraft {
    pub nombre_completo: String,
    pub dni_ruc: String,
    pub telefono: String,
    pub email: String,
    pub direccion: String,
    pub notas: String,
}

impl Validate for ClientDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.nombre_completo, "El nombre es obligatorio")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDraft {
    pub nombre: String,
    pub color: String,
    pub descripcion: String,
}

impl Validate for TagDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.nombre, "El nombre es obligatorio")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateDraft {
    pub nombre: String,
    pub tipo: String,
    pub descripcion_template: String,
}

impl Validate for TemplateDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.nombre, "El nombre es obligatorio")?;
        required(&self.descripcion_template, "La plantilla no puede estar vacía")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvisoDraft {
    pub contenido: String,
    pub active: bool,
}

impl AvisoDraft {
    pub fn new(contenido: impl Into<String>) -> Self {
        Self {
            contenido: contenido.into(),
            active: true,
        }
    }
}

impl Validate for AvisoDraft {
    fn validate(&self) -> ApiResult<()> {
        required(&self.contenido, "El aviso no puede estar vacío")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiErrorKind;
    use serde_json::json;

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = CasePatch::status(CaseStatus::Paused);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"estado": "Pausado"}));
        assert!(!patch.touches_lawyer());
        assert!(CasePatch::default().is_empty());
    }

    #[test]
    fn test_blank_caratula_is_rejected() {
        let draft = CaseDraft {
            caratula: "   ".into(),
            ..Default::default()
        };
        assert_eq!(draft.validate().unwrap_err().kind, ApiErrorKind::Validation);
    }

    #[test]
    fn test_short_password_is_rejected() {
        let user = NewUser {
            username: "maria".into(),
            password: "abc".into(),
            rol: Role::Lawyer,
        };
        assert!(user.validate().is_err());

        let user = NewUser {
            password: "abcd".into(),
            ..user
        };
        assert!(user.validate().is_ok());
        assert_eq!(serde_json::to_value(&user).unwrap()["rol"], "abogado");
    }

    #[test]
    fn test_alerta_requires_title_and_due_date() {
        let mut draft = AlertaDraft {
            titulo: "Contestar demanda".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
        draft.fecha_vencimiento = "2025-01-10".into();
        assert!(draft.validate().is_ok());

        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["prioridad"], "Media");
        assert!(body.get("hora").is_none());
    }

    #[test]
    fn test_aviso_is_active() {
        let body = serde_json::to_value(AvisoDraft::new("Feriado el lunes")).unwrap();
        assert_eq!(body, json!({"contenido": "Feriado el lunes", "active": true}));
    }

    fn sample_case() -> Case {
        serde_json::from_value(json!({
            "id": 7,
            "caratula": "Díaz c/ Transportes SA",
            "nro_expediente": "55/2023",
            "estado": "Abierto",
            "abogado_responsable": "Dra. Neira",
            "cliente": {"id": 3, "nombre_completo": "Ana Díaz"},
            "folder_link": "https://drive.example/f/1",
            "etiquetas": [{"id": 2, "nombre": "Urgente"}, {"id": 5, "nombre": "Civil"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_unchanged_draft_gives_empty_patch() {
        let case = sample_case();
        let draft = CaseDraft::from_case(&case);
        assert_eq!(draft.etiquetas_ids, vec![2, 5]);
        assert!(CasePatch::between(&case, &draft).is_empty());
    }

    #[test]
    fn test_patch_between_only_changed_fields() {
        let case = sample_case();
        let mut draft = CaseDraft::from_case(&case);
        draft.juzgado = "Juzgado Civil 4".into();
        draft.estado = CaseStatus::Paused;
        draft.etiquetas_ids = vec![5, 2, 5];
        draft.folder_link = None;

        let patch = CasePatch::between(&case, &draft);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"juzgado": "Juzgado Civil 4", "estado": "Pausado", "folder_link": ""})
        );
        assert!(!patch.touches_lawyer());

        draft.abogado_responsable = "Dr. Soto".into();
        assert!(CasePatch::between(&case, &draft).touches_lawyer());
    }

    #[test]
    fn test_edit_drafts_keep_calendar_day() {
        let a: Alerta = serde_json::from_value(json!({
            "id": 1, "titulo": "Contestar", "fecha_vencimiento": "2025-01-10T00:00:00Z",
            "hora": "09:30", "prioridad": "Alta"
        }))
        .unwrap();
        let draft = AlertaDraft::from(&a);
        assert_eq!(draft.fecha_vencimiento, "2025-01-10");
        assert_eq!(draft.hora.as_deref(), Some("09:30"));
        assert_eq!(draft.prioridad, Priority::High);
    }
}
