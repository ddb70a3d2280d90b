//! 表单状态管理模块
//!
//! 将零散的 signal 整合为 `CaseFormState`，负责数据的持有、回填与转换为请求体。

use estudio_shared::protocol::CaseDraft;
use estudio_shared::{CaseStatus, Id};
use leptos::prelude::*;

/// 表单状态结构体
///
/// 使用 `RwSignal` 因为它实现了 `Copy` trait，适合作为 Props 在组件间传递。
#[derive(Clone, Copy)]
pub struct CaseFormState {
    pub caratula: RwSignal<String>,
    pub nro_expediente: RwSignal<String>,
    pub juzgado: RwSignal<String>,
    pub fuero: RwSignal<String>,
    pub estado: RwSignal<CaseStatus>,
    pub abogado_responsable: RwSignal<String>,
    pub cliente_id: RwSignal<Option<Id>>,
    pub cliente_nombre: RwSignal<String>,
    pub cliente_dni: RwSignal<String>,
    pub contraparte: RwSignal<String>,
    pub fecha_inicio: RwSignal<String>,
    pub folder_link: RwSignal<String>,
    pub etiquetas_ids: RwSignal<Vec<Id>>,
}

impl CaseFormState {
    pub fn new(initial: &CaseDraft) -> Self {
        Self {
            caratula: RwSignal::new(initial.caratula.clone()),
            nro_expediente: RwSignal::new(initial.nro_expediente.clone()),
            juzgado: RwSignal::new(initial.juzgado.clone()),
            fuero: RwSignal::new(initial.fuero.clone()),
            estado: RwSignal::new(initial.estado),
            abogado_responsable: RwSignal::new(initial.abogado_responsable.clone()),
            cliente_id: RwSignal::new(initial.cliente_id),
            cliente_nombre: RwSignal::new(initial.cliente_nombre.clone()),
            cliente_dni: RwSignal::new(initial.cliente_dni.clone()),
            contraparte: RwSignal::new(initial.contraparte.clone()),
            fecha_inicio: RwSignal::new(initial.fecha_inicio.chars().take(10).collect()),
            folder_link: RwSignal::new(initial.folder_link.clone().unwrap_or_default()),
            etiquetas_ids: RwSignal::new(initial.etiquetas_ids.clone()),
        }
    }

    pub fn toggle_tag(&self, id: Id) {
        self.etiquetas_ids.update(|ids| {
            if let Some(pos) = ids.iter().position(|x| *x == id) {
                ids.remove(pos);
            } else {
                ids.push(id);
            }
        });
    }

    /// 将表单状态转换为请求体（文本两端空白去掉）
    pub fn to_draft(&self) -> CaseDraft {
        let text = |s: RwSignal<String>| s.get_untracked().trim().to_string();
        let folder = text(self.folder_link);
        CaseDraft {
            caratula: text(self.caratula),
            nro_expediente: text(self.nro_expediente),
            juzgado: text(self.juzgado),
            fuero: text(self.fuero),
            estado: self.estado.get_untracked(),
            abogado_responsable: text(self.abogado_responsable),
            cliente_id: self.cliente_id.get_untracked(),
            cliente_nombre: text(self.cliente_nombre),
            cliente_dni: text(self.cliente_dni),
            contraparte: text(self.contraparte),
            fecha_inicio: text(self.fecha_inicio),
            folder_link: (!folder.is_empty()).then_some(folder),
            etiquetas_ids: self.etiquetas_ids.get_untracked(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_round_trip_trims_and_drops_empty_folder() {
        let initial = CaseDraft {
            caratula: "Ruiz c/ Banco Sur".into(),
            fecha_inicio: "2025-02-01T00:00:00Z".into(),
            folder_link: Some("https://drive/x".into()),
            etiquetas_ids: vec![1, 2],
            ..Default::default()
        };
        let form = CaseFormState::new(&initial);
        assert_eq!(form.fecha_inicio.get_untracked(), "2025-02-01");

        form.caratula.set("  Ruiz c/ Banco Sur S.A.  ".into());
        form.folder_link.set("   ".into());
        form.toggle_tag(1);
        form.toggle_tag(3);

        let draft = form.to_draft();
        assert_eq!(draft.caratula, "Ruiz c/ Banco Sur S.A.");
        assert_eq!(draft.folder_link, None);
        assert_eq!(draft.etiquetas_ids, vec![2, 3]);
    }
}
