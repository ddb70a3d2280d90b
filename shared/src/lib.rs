use serde::{Deserialize, Serialize};
use std::fmt;

pub mod api;
pub mod calendar;
pub mod dashboard;
pub mod date;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod optimistic;
pub mod protocol;
pub mod request;
pub mod rich_text;
pub mod serde_helper;
pub mod session;

pub use chrono;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use serde_helper::Id;

use serde_helper::{id, non_empty, null_as_default, opt_id};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const STORAGE_ACCESS_TOKEN: &str = "access_token";
pub const STORAGE_REFRESH_TOKEN: &str = "refresh_token";
pub const STORAGE_CURRENT_USER: &str = "current_user";

/// 后端案件列表的固定页大小
pub const CASE_PAGE_SIZE: usize = 8;
/// 案件详情内的子集合分页
pub const ACTUACION_PAGE_SIZE: usize = 5;
pub const NOTE_PAGE_SIZE: usize = 3;
/// 仪表盘提醒流每页条数
pub const ALERT_FEED_PAGE_SIZE: usize = 5;

/// 已知的法律管辖领域（fuero 是自由文本，这里只是常用取值）
pub const FUEROS: &[&str] = &["Civil", "Comercial", "Penal", "Laboral", "Familia"];

/// 常用的 actuación 类型
pub const ACTUACION_TIPOS: &[&str] = &[
    "Escrito",
    "Audiencia",
    "Notificación",
    "Resolución",
    "Diligencia",
    "Otro",
];

// =========================================================
// 领域枚举 (Domain Enums)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    #[default]
    #[serde(rename = "Abierto")]
    Open,
    #[serde(rename = "En Trámite")]
    InProgress,
    #[serde(rename = "Pausado")]
    Paused,
    #[serde(rename = "Cerrado")]
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [
        CaseStatus::Open,
        CaseStatus::InProgress,
        CaseStatus::Paused,
        CaseStatus::Closed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Abierto",
            CaseStatus::InProgress => "En Trámite",
            CaseStatus::Paused => "Pausado",
            CaseStatus::Closed => "Cerrado",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// 默认排序权重：活跃 < 暂停 < 结案
    pub fn weight(&self) -> u8 {
        match self {
            CaseStatus::Open | CaseStatus::InProgress => 0,
            CaseStatus::Paused => 1,
            CaseStatus::Closed => 2,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[default]
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
            Priority::Low => "Baja",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NoteLabel {
    #[default]
    #[serde(rename = "Estrategia")]
    Strategy,
    #[serde(rename = "Documentación")]
    Documentation,
    #[serde(rename = "Investigación")]
    Research,
    #[serde(rename = "Jurisprudencia")]
    CaseLaw,
}

impl NoteLabel {
    pub const ALL: [NoteLabel; 4] = [
        NoteLabel::Strategy,
        NoteLabel::Documentation,
        NoteLabel::Research,
        NoteLabel::CaseLaw,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NoteLabel::Strategy => "Estrategia",
            NoteLabel::Documentation => "Documentación",
            NoteLabel::Research => "Investigación",
            NoteLabel::CaseLaw => "Jurisprudencia",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == label)
    }
}

impl fmt::Display for NoteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(rename = "abogado")]
    Lawyer,
    #[default]
    #[serde(rename = "usuario")]
    Basic,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Lawyer, Role::Basic];

    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lawyer => "abogado",
            Role::Basic => "usuario",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Lawyer => "Abogado",
            Role::Basic => "Usuario",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

// =========================================================
// 审计字段
// =========================================================

/// 由服务端写入的审计信息，客户端只读
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default, deserialize_with = "opt_id")]
    pub created_by: Option<Id>,
    #[serde(default, deserialize_with = "non_empty")]
    pub created_by_username: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub last_modified_by: Option<Id>,
    #[serde(default, deserialize_with = "non_empty")]
    pub last_modified_by_username: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub updated_at: Option<String>,
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actuacion {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    #[serde(default, deserialize_with = "opt_id")]
    pub caso: Option<Id>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fecha: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descripcion: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tipo: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alerta {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    #[serde(default, deserialize_with = "opt_id")]
    pub caso: Option<Id>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub titulo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resumen: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub hora: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fecha_vencimiento: String,
    #[serde(default)]
    pub cumplida: bool,
    #[serde(default)]
    pub prioridad: Priority,
    #[serde(default)]
    pub tiempo_estimado_minutos: Option<u32>,
    #[serde(default, deserialize_with = "opt_id")]
    pub completed_by: Option<Id>,
    #[serde(default, deserialize_with = "non_empty")]
    pub completed_by_username: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub completed_at: Option<String>,
    /// 仪表盘提醒流附带的案件标题
    #[serde(default, deserialize_with = "non_empty")]
    pub caso_caratula: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    #[serde(default, deserialize_with = "opt_id")]
    pub caso: Option<Id>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub titulo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resumen: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contenido: String,
    #[serde(default)]
    pub etiqueta: NoteLabel,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre_completo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dni_ruc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub telefono: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub direccion: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notas: String,
    #[serde(default)]
    pub total_expedientes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    pub nombre: String,
    #[serde(default = "default_tag_color")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descripcion: String,
}

fn default_tag_color() -> String {
    "#3B82F6".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuacionTemplate {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    pub nombre: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tipo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descripcion_template: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub created_by_username: Option<String>,
}

impl ActuacionTemplate {
    /// 用案件信息填充模板占位符
    ///
    /// 支持 `{caratula}` `{cliente}` `{nro_expediente}` `{juzgado}` `{fecha}`。
    pub fn render(&self, case: &Case, fecha: &str) -> String {
        self.descripcion_template
            .replace("{caratula}", &case.caratula)
            .replace("{cliente}", &case.cliente_nombre)
            .replace("{nro_expediente}", &case.nro_expediente)
            .replace("{juzgado}", &case.juzgado)
            .replace("{fecha}", fecha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aviso {
    #[serde(deserialize_with = "id")]
    pub id: Id,
    pub contenido: String,
    #[serde(default)]
    pub active: bool,
}

// =========================================================
// 用户（含旧字段兼容）
// =========================================================

/// 规范化后的用户
///
/// 旧后端只返回 `is_admin` / `isAdmin`，新后端返回 `rol`；反序列化时合并为 `role`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserWire")]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Deserialize)]
struct UserWire {
    #[serde(deserialize_with = "id")]
    id: Id,
    username: String,
    #[serde(default, deserialize_with = "non_empty")]
    rol: Option<String>,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default, rename = "isAdmin")]
    is_admin_legacy: Option<bool>,
}

impl From<UserWire> for User {
    fn from(w: UserWire) -> Self {
        let legacy_admin = w.is_admin.or(w.is_admin_legacy).unwrap_or(false);
        let role = match w.rol.as_deref().and_then(Role::from_code) {
            Some(role) => role,
            None if legacy_admin => Role::Admin,
            None => Role::Basic,
        };
        Self {
            id: w.id,
            username: w.username,
            role,
        }
    }
}

// =========================================================
// 案件 (Expediente)
// =========================================================

/// 规范化后的案件
///
/// 列表接口里 `cliente` 是主键，详情接口里是嵌套对象；两者都归一到
/// `cliente_id` + `cliente_nombre`。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "CaseWire")]
pub struct Case {
    pub id: Id,
    pub codigo_interno: String,
    pub caratula: String,
    pub nro_expediente: String,
    pub juzgado: String,
    pub fuero: String,
    pub estado: CaseStatus,
    pub abogado_responsable: String,
    pub cliente_id: Option<Id>,
    pub cliente_nombre: String,
    pub cliente_dni: String,
    pub contraparte: String,
    pub fecha_inicio: String,
    pub folder_link: Option<String>,
    pub etiquetas: Vec<Tag>,
    pub audit: Audit,
    pub actuaciones: Vec<Actuacion>,
    pub alertas: Vec<Alerta>,
    pub notas: Vec<Note>,
}

impl Case {
    pub fn has_tag(&self, tag_id: Id) -> bool {
        self.etiquetas.iter().any(|t| t.id == tag_id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClientField {
    Id(#[serde(deserialize_with = "id")] Id),
    Nested(Client),
}

#[derive(Deserialize)]
struct CaseWire {
    #[serde(deserialize_with = "id")]
    id: Id,
    #[serde(default, deserialize_with = "null_as_default")]
    codigo_interno: String,
    #[serde(default, deserialize_with = "null_as_default")]
    caratula: String,
    #[serde(default, deserialize_with = "null_as_default")]
    nro_expediente: String,
    #[serde(default, deserialize_with = "null_as_default")]
    juzgado: String,
    #[serde(default, deserialize_with = "null_as_default")]
    fuero: String,
    #[serde(default)]
    estado: CaseStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    abogado_responsable: String,
    #[serde(default)]
    cliente: Option<ClientField>,
    #[serde(default, deserialize_with = "opt_id")]
    cliente_id: Option<Id>,
    #[serde(default, deserialize_with = "non_empty")]
    cliente_nombre: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    cliente_nombre_display: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    cliente_dni: String,
    #[serde(default, deserialize_with = "null_as_default")]
    contraparte: String,
    #[serde(default, deserialize_with = "null_as_default")]
    fecha_inicio: String,
    #[serde(default, deserialize_with = "non_empty")]
    folder_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    etiquetas: Vec<Tag>,
    #[serde(flatten)]
    audit: Audit,
    #[serde(default, deserialize_with = "null_as_default")]
    actuaciones: Vec<Actuacion>,
    #[serde(default, deserialize_with = "null_as_default")]
    alertas: Vec<Alerta>,
    #[serde(default, deserialize_with = "null_as_default")]
    notas: Vec<Note>,
}

impl From<CaseWire> for Case {
    fn from(w: CaseWire) -> Self {
        let (nested_id, nested_name) = match w.cliente {
            Some(ClientField::Id(id)) => (Some(id), None),
            Some(ClientField::Nested(c)) => (Some(c.id), Some(c.nombre_completo)),
            None => (None, None),
        };
        let cliente_nombre = nested_name
            .filter(|n| !n.is_empty())
            .or(w.cliente_nombre_display)
            .or(w.cliente_nombre)
            .unwrap_or_default();

        Self {
            id: w.id,
            codigo_interno: w.codigo_interno,
            caratula: w.caratula,
            nro_expediente: w.nro_expediente,
            juzgado: w.juzgado,
            fuero: w.fuero,
            estado: w.estado,
            abogado_responsable: w.abogado_responsable,
            cliente_id: nested_id.or(w.cliente_id),
            cliente_nombre,
            cliente_dni: w.cliente_dni,
            contraparte: w.contraparte,
            fecha_inicio: w.fecha_inicio,
            folder_link: w.folder_link,
            etiquetas: w.etiquetas,
            audit: w.audit,
            actuaciones: w.actuaciones,
            alertas: w.alertas,
            notas: w.notas,
        }
    }
}

/// 带 id 的实体，用于集合内的替换/删除/去重
pub trait Identified {
    fn id(&self) -> Id;
}

macro_rules! impl_identified {
    ($($t:ty),* $(,)?) => {
        $(impl Identified for $t {
            fn id(&self) -> Id {
                self.id
            }
        })*
    };
}

impl_identified!(Case, Actuacion, Alerta, Note, User, Client, Tag, ActuacionTemplate, Aviso);

#[cfg(test)]
mod tests;
