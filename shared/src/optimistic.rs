//! 乐观更新
//!
//! 先在本地应用局部修改，再发出 PATCH：
//! - 成功：用服务端返回的完整表示替换本地副本（包含重新计算的审计字段）
//! - 失败：只回滚本次修改涉及的字段，且仅当字段仍是本次写入的值
//!
//! 回滚期间其它操作合并进来的子集合和后续修改都保留。

use crate::error::ApiResult;
use crate::protocol::CasePatch;
use crate::{Case, CaseStatus, Id};

/// 可以通过 PATCH 修改的标量字段
#[derive(Debug, Clone, PartialEq)]
struct EditableFields {
    caratula: String,
    nro_expediente: String,
    juzgado: String,
    fuero: String,
    estado: CaseStatus,
    abogado_responsable: String,
    cliente_id: Option<Id>,
    contraparte: String,
    fecha_inicio: String,
    folder_link: Option<String>,
}

impl EditableFields {
    fn of(case: &Case) -> Self {
        Self {
            caratula: case.caratula.clone(),
            nro_expediente: case.nro_expediente.clone(),
            juzgado: case.juzgado.clone(),
            fuero: case.fuero.clone(),
            estado: case.estado,
            abogado_responsable: case.abogado_responsable.clone(),
            cliente_id: case.cliente_id,
            contraparte: case.contraparte.clone(),
            fecha_inicio: case.fecha_inicio.clone(),
            folder_link: case.folder_link.clone(),
        }
    }
}

fn restore<V: PartialEq + Clone>(slot: &mut V, applied: &V, previous: &V) {
    if slot == applied {
        *slot = previous.clone();
    }
}

/// 一次进行中的乐观修改
#[derive(Debug, Clone)]
#[must_use = "必须调用 settle 结束一次乐观更新"]
pub struct Snapshot {
    previous: EditableFields,
    applied: EditableFields,
}

impl Snapshot {
    /// 记录修改前的字段并立即应用本地修改
    pub fn apply(current: &mut Case, patch: &CasePatch) -> Self {
        let previous = EditableFields::of(current);
        apply_case_patch(current, patch);
        let applied = EditableFields::of(current);
        Self { previous, applied }
    }

    /// 根据服务端结果结束本次更新
    pub fn settle(self, current: &mut Case, outcome: ApiResult<Case>) -> ApiResult<()> {
        match outcome {
            Ok(server) => {
                *current = server;
                Ok(())
            }
            Err(e) => {
                self.rollback(current);
                Err(e)
            }
        }
    }

    fn rollback(&self, case: &mut Case) {
        let (p, a) = (&self.previous, &self.applied);
        restore(&mut case.caratula, &a.caratula, &p.caratula);
        restore(&mut case.nro_expediente, &a.nro_expediente, &p.nro_expediente);
        restore(&mut case.juzgado, &a.juzgado, &p.juzgado);
        restore(&mut case.fuero, &a.fuero, &p.fuero);
        restore(&mut case.estado, &a.estado, &p.estado);
        restore(
            &mut case.abogado_responsable,
            &a.abogado_responsable,
            &p.abogado_responsable,
        );
        restore(&mut case.cliente_id, &a.cliente_id, &p.cliente_id);
        restore(&mut case.contraparte, &a.contraparte, &p.contraparte);
        restore(&mut case.fecha_inicio, &a.fecha_inicio, &p.fecha_inicio);
        restore(&mut case.folder_link, &a.folder_link, &p.folder_link);
    }
}

/// 把局部更新应用到本地案件副本
pub fn apply_case_patch(case: &mut Case, patch: &CasePatch) {
    if let Some(v) = &patch.caratula {
        case.caratula = v.clone();
    }
    if let Some(v) = &patch.nro_expediente {
        case.nro_expediente = v.clone();
    }
    if let Some(v) = &patch.juzgado {
        case.juzgado = v.clone();
    }
    if let Some(v) = &patch.fuero {
        case.fuero = v.clone();
    }
    if let Some(v) = patch.estado {
        case.estado = v;
    }
    if let Some(v) = &patch.abogado_responsable {
        case.abogado_responsable = v.clone();
    }
    if let Some(v) = patch.cliente_id {
        case.cliente_id = Some(v);
    }
    if let Some(v) = &patch.contraparte {
        case.contraparte = v.clone();
    }
    if let Some(v) = &patch.fecha_inicio {
        case.fecha_inicio = v.clone();
    }
    if let Some(v) = &patch.folder_link {
        case.folder_link = Some(v.clone()).filter(|s| !s.trim().is_empty());
    }
    // etiquetas_ids 只有服务端能展开为完整的 Tag，本地不预先修改
}
