//! 列表：筛选、排序、分页
//!
//! 顶层案件列表由服务端分页（客户端只维护筛选条件与页码），
//! 案件内的 actuaciones / notas 随案件一次性加载，在内存中切片分页。

use crate::date::{parse_datetime, parse_day};
use crate::{Actuacion, Case, CaseStatus, Id, Identified, Note};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::cmp::Reverse;

/// 文本筛选的防抖延迟
pub const SEARCH_DEBOUNCE_MS: u32 = 500;

// =========================================================
// 筛选条件
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilters {
    pub search: String,
    pub estado: Option<CaseStatus>,
    pub abogado: String,
    pub fuero: String,
    pub juzgado: String,
    pub cliente: Option<Id>,
    pub etiqueta: Option<Id>,
    pub fecha_inicio_desde: String,
    pub fecha_inicio_hasta: String,
    pub fecha_modificacion_desde: String,
    pub fecha_modificacion_hasta: String,
}

impl CaseFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 转为查询参数（不含页码），未设置的条件不出现
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: String| {
            if !value.trim().is_empty() {
                pairs.push((key.to_string(), value.trim().to_string()));
            }
        };
        push("search", self.search.clone());
        push(
            "estado",
            self.estado.map(|s| s.label().to_string()).unwrap_or_default(),
        );
        push("abogado", self.abogado.clone());
        push("fuero", self.fuero.clone());
        push("juzgado", self.juzgado.clone());
        push(
            "cliente",
            self.cliente.map(|c| c.to_string()).unwrap_or_default(),
        );
        push(
            "etiqueta",
            self.etiqueta.map(|t| t.to_string()).unwrap_or_default(),
        );
        push("fecha_inicio_desde", self.fecha_inicio_desde.clone());
        push("fecha_inicio_hasta", self.fecha_inicio_hasta.clone());
        push("fecha_modificacion_desde", self.fecha_modificacion_desde.clone());
        push("fecha_modificacion_hasta", self.fecha_modificacion_hasta.clone());
        pairs
    }

    /// 客户端侧的同义判定
    ///
    /// 自由文本在 carátula、cliente、nro_expediente、codigo_interno 中任一命中即可；
    /// 其余条件之间为 AND。
    pub fn matches(&self, case: &Case) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let hit = [
                &case.caratula,
                &case.cliente_nombre,
                &case.nro_expediente,
                &case.codigo_interno,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&search));
            if !hit {
                return false;
            }
        }

        if let Some(estado) = self.estado {
            if case.estado != estado {
                return false;
            }
        }
        if !contains_ci(&case.abogado_responsable, &self.abogado)
            || !contains_ci(&case.juzgado, &self.juzgado)
        {
            return false;
        }
        if !self.fuero.trim().is_empty() && case.fuero != self.fuero.trim() {
            return false;
        }
        if let Some(cliente) = self.cliente {
            if case.cliente_id != Some(cliente) {
                return false;
            }
        }
        if let Some(tag) = self.etiqueta {
            if !case.has_tag(tag) {
                return false;
            }
        }

        let modified = case.audit.updated_at.as_deref().unwrap_or_default();
        within(
            &case.fecha_inicio,
            &self.fecha_inicio_desde,
            &self.fecha_inicio_hasta,
        ) && within(
            modified,
            &self.fecha_modificacion_desde,
            &self.fecha_modificacion_hasta,
        )
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 闭区间日期判定；设置了边界但值无法解析时不命中
fn within(value: &str, from: &str, to: &str) -> bool {
    let from = parse_day(from);
    let to = parse_day(to);
    if from.is_none() && to.is_none() {
        return true;
    }
    parse_day(value).is_some_and(|day| day_in_range(day, from, to))
}

/// 筛选 + 默认排序
pub fn filter_cases(cases: &[Case], filters: &CaseFilters) -> Vec<Case> {
    let mut out: Vec<Case> = cases.iter().filter(|c| filters.matches(c)).cloned().collect();
    sort_by_status(&mut out);
    out
}

// =========================================================
// 排序
// =========================================================

/// 默认排序：活跃 → 暂停 → 结案；同档保持原顺序
pub fn sort_by_status(cases: &mut [Case]) {
    cases.sort_by_key(|c| c.estado.weight());
}

/// actuaciones 按日期倒序；无法解析的日期排在最后
pub fn sort_actuaciones(items: &mut [Actuacion]) {
    items.sort_by_key(|a| Reverse(parse_datetime(&a.fecha)));
}

/// 笔记按创建时间倒序
pub fn sort_notes(items: &mut [Note]) {
    items.sort_by_key(|n| {
        Reverse(
            n.audit
                .created_at
                .as_deref()
                .and_then(parse_datetime),
        )
    });
}

// =========================================================
// 分页
// =========================================================

/// 规范化后的分页响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
            previous: None,
        }
    }
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn total_pages(&self, page_size: usize) -> usize {
        page_count(self.count, page_size)
    }
}

// 后端可能返回 `{results, count, next, previous}`、裸数组或 `{data: [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire<T> {
    Paged {
        results: Vec<T>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
    Data {
        data: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let page = match PageWire::<T>::deserialize(deserializer)? {
            PageWire::Paged {
                results,
                count,
                next,
                previous,
            } => Page {
                count: count.unwrap_or(results.len()),
                results,
                next,
                previous,
            },
            PageWire::Data { data } | PageWire::Bare(data) => Page {
                count: data.len(),
                results: data,
                next: None,
                previous: None,
            },
        };
        Ok(page)
    }
}

/// 总页数，至少为 1
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// 内存切片分页，页码从 1 开始；越界页码夹到最后一页
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 || items.is_empty() {
        return items;
    }
    let page = page.clamp(1, page_count(items.len(), page_size));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

// =========================================================
// 列表状态
// =========================================================

/// 单个筛选条件的变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Search(String),
    Estado(Option<CaseStatus>),
    Abogado(String),
    Fuero(String),
    Juzgado(String),
    Cliente(Option<Id>),
    Etiqueta(Option<Id>),
    FechaInicioDesde(String),
    FechaInicioHasta(String),
    FechaModificacionDesde(String),
    FechaModificacionHasta(String),
    Clear,
}

impl FilterChange {
    /// 键入型的文本条件需要防抖
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FilterChange::Search(_) | FilterChange::Abogado(_) | FilterChange::Juzgado(_)
        )
    }
}

/// 筛选变化后的重新加载方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    Immediate,
    Debounced(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseListState {
    pub filters: CaseFilters,
    pub page: usize,
}

impl Default for CaseListState {
    fn default() -> Self {
        Self {
            filters: CaseFilters::default(),
            page: 1,
        }
    }
}

impl CaseListState {
    /// 应用筛选变化；任何变化都回到第 1 页
    pub fn apply(&mut self, change: FilterChange) -> Reload {
        let reload = if change.is_text() {
            Reload::Debounced(SEARCH_DEBOUNCE_MS)
        } else {
            Reload::Immediate
        };
        let f = &mut self.filters;
        match change {
            FilterChange::Search(v) => f.search = v,
            FilterChange::Estado(v) => f.estado = v,
            FilterChange::Abogado(v) => f.abogado = v,
            FilterChange::Fuero(v) => f.fuero = v,
            FilterChange::Juzgado(v) => f.juzgado = v,
            FilterChange::Cliente(v) => f.cliente = v,
            FilterChange::Etiqueta(v) => f.etiqueta = v,
            FilterChange::FechaInicioDesde(v) => f.fecha_inicio_desde = v,
            FilterChange::FechaInicioHasta(v) => f.fecha_inicio_hasta = v,
            FilterChange::FechaModificacionDesde(v) => f.fecha_modificacion_desde = v,
            FilterChange::FechaModificacionHasta(v) => f.fecha_modificacion_hasta = v,
            FilterChange::Clear => *f = CaseFilters::default(),
        }
        self.page = 1;
        reload
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// 筛选参数 + 页码
    pub fn query(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.to_query();
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs
    }
}

// =========================================================
// 集合维护（服务端返回值为准，直接替换）
// =========================================================

/// 按 id 替换；不存在时插入到最前
pub fn upsert<T: Identified>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|x| x.id() == item.id()) {
        Some(i) => items[i] = item,
        None => items.insert(0, item),
    }
}

/// 按 id 替换；返回是否找到
pub fn replace_by_id<T: Identified>(items: &mut [T], item: T) -> bool {
    match items.iter_mut().find(|x| x.id() == item.id()) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

/// 按 id 删除；其余元素顺序不变
pub fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: Id) -> Option<T> {
    let index = items.iter().position(|x| x.id() == id)?;
    Some(items.remove(index))
}

/// 追加尚未出现的元素，返回实际追加的数量
pub fn extend_unique<T: Identified>(items: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let before = items.len();
    for item in incoming {
        if !items.iter().any(|x| x.id() == item.id()) {
            items.push(item);
        }
    }
    items.len() - before
}

/// 某天是否在 [from, to] 内（边界为空表示不限）
pub fn day_in_range(day: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|f| day >= f) && to.is_none_or(|t| day <= t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(id: u64, estado: &str, caratula: &str) -> Case {
        serde_json::from_value(json!({
            "id": id,
            "codigo_interno": format!("ENT-{:03}", id),
            "caratula": caratula,
            "nro_expediente": format!("{}/2024", 1000 + id),
            "estado": estado,
            "cliente_nombre": format!("Cliente {}", id),
            "abogado_responsable": "Dra. Neira",
            "juzgado": "Juzgado Civil 3",
            "fuero": "Civil",
            "fecha_inicio": "2024-03-15"
        }))
        .unwrap()
    }

    fn mixed() -> Vec<Case> {
        vec![
            case(1, "Cerrado", "C1"),
            case(2, "Abierto", "A1"),
            case(3, "Pausado", "P1"),
            case(4, "En Trámite", "T1"),
            case(5, "Cerrado", "C2"),
            case(6, "Abierto", "A2"),
            case(7, "Pausado", "P2"),
        ]
    }

    #[test]
    fn test_default_order_scenario() {
        let mut cases = vec![
            case(1, "Cerrado", "C"),
            case(2, "Abierto", "A"),
            case(3, "Pausado", "B"),
        ];
        sort_by_status(&mut cases);
        let captions: Vec<&str> = cases.iter().map(|c| c.caratula.as_str()).collect();
        assert_eq!(captions, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_sort_is_stable_within_tier() {
        let mut cases = mixed();
        sort_by_status(&mut cases);
        let ids: Vec<u64> = cases.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 4, 6, 3, 7, 1, 5]);
    }

    #[test]
    fn test_status_filter_partitions_the_set() {
        let cases = mixed();
        let mut union: Vec<u64> = Vec::new();
        for status in CaseStatus::ALL {
            let filters = CaseFilters {
                estado: Some(status),
                ..Default::default()
            };
            let hits = filter_cases(&cases, &filters);
            assert!(hits.iter().all(|c| c.estado == status));
            union.extend(hits.iter().map(|c| c.id));
        }
        union.sort();
        assert_eq!(union, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_search_on_docket_number_only() {
        let cases: Vec<Case> = (1..=5).map(|i| case(i, "Abierto", "Pérez c/ Gómez")).collect();
        let filters = CaseFilters {
            search: "1003/2024".into(),
            ..Default::default()
        };
        let hits = filter_cases(&cases, &filters);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 3);
    }

    #[test]
    fn test_search_is_case_insensitive_or_across_fields() {
        let cases = mixed();
        let by_code = CaseFilters {
            search: "ent-007".into(),
            ..Default::default()
        };
        assert_eq!(filter_cases(&cases, &by_code)[0].id, 7);

        let by_client = CaseFilters {
            search: "CLIENTE 2".into(),
            estado: Some(CaseStatus::Open),
            ..Default::default()
        };
        assert_eq!(filter_cases(&cases, &by_client).len(), 1);

        let conflicting = CaseFilters {
            search: "cliente 2".into(),
            estado: Some(CaseStatus::Closed),
            ..Default::default()
        };
        assert!(filter_cases(&cases, &conflicting).is_empty());
    }

    #[test]
    fn test_lawyer_substring_and_date_range() {
        let cases = mixed();
        let filters = CaseFilters {
            abogado: "neira".into(),
            fecha_inicio_desde: "2024-03-01".into(),
            fecha_inicio_hasta: "2024-03-15".into(),
            ..Default::default()
        };
        assert_eq!(filter_cases(&cases, &filters).len(), 7);

        let filters = CaseFilters {
            fecha_inicio_desde: "2024-03-16".into(),
            ..Default::default()
        };
        assert!(filter_cases(&cases, &filters).is_empty());
    }

    #[test]
    fn test_to_query_skips_unset() {
        let filters = CaseFilters {
            search: " pérez ".into(),
            estado: Some(CaseStatus::InProgress),
            etiqueta: Some(4),
            ..Default::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("search".to_string(), "pérez".to_string()),
                ("estado".to_string(), "En Trámite".to_string()),
                ("etiqueta".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_change_resets_page_and_debounces_text() {
        let mut state = CaseListState::default();
        state.set_page(3);
        assert_eq!(
            state.apply(FilterChange::Search("gom".into())),
            Reload::Debounced(SEARCH_DEBOUNCE_MS)
        );
        assert_eq!(state.page, 1);

        state.set_page(2);
        assert_eq!(
            state.apply(FilterChange::Estado(Some(CaseStatus::Paused))),
            Reload::Immediate
        );
        assert_eq!(state.page, 1);
        assert_eq!(
            state.query().last(),
            Some(&("page".to_string(), "1".to_string()))
        );
    }

    #[test]
    fn test_page_accepts_all_shapes() {
        let paged: Page<u32> =
            serde_json::from_value(json!({"results": [1, 2], "count": 10, "next": "n", "previous": null}))
                .unwrap();
        assert_eq!(paged.count, 10);
        assert!(paged.has_next());
        assert_eq!(paged.total_pages(8), 2);

        let bare: Page<u32> = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(bare.count, 3);
        assert!(!bare.has_next());

        let data: Page<u32> = serde_json::from_value(json!({"data": [7]})).unwrap();
        assert_eq!(data.results, vec![7]);
    }

    #[test]
    fn test_paginate_slices_and_clamps() {
        let items: Vec<u32> = (1..=12).collect();
        assert_eq!(paginate(&items, 1, 5), &[1, 2, 3, 4, 5]);
        assert_eq!(paginate(&items, 3, 5), &[11, 12]);
        assert_eq!(paginate(&items, 9, 5), &[11, 12]);
        assert_eq!(paginate(&items, 0, 5), &[1, 2, 3, 4, 5]);
        assert_eq!(page_count(0, 3), 1);
        assert_eq!(page_count(7, 3), 3);
    }

    #[test]
    fn test_remove_note_keeps_others_untouched() {
        let mut parent: Case = serde_json::from_value(json!({
            "id": 1,
            "notas": [
                {"id": 10, "titulo": "a", "contenido": "x"},
                {"id": 11, "titulo": "b", "contenido": "y"},
                {"id": 12, "titulo": "c", "contenido": "z"}
            ]
        }))
        .unwrap();
        let before = parent.notas.clone();

        let removed = remove_by_id(&mut parent.notas, 11).unwrap();
        assert_eq!(removed.titulo, "b");
        assert_eq!(parent.notas, vec![before[0].clone(), before[2].clone()]);
        assert!(remove_by_id(&mut parent.notas, 99).is_none());
    }

    #[test]
    fn test_upsert_and_extend_unique() {
        let mut cases = vec![case(1, "Abierto", "A"), case(2, "Abierto", "B")];
        upsert(&mut cases, case(2, "Cerrado", "B"));
        assert_eq!(cases[1].estado, CaseStatus::Closed);
        upsert(&mut cases, case(3, "Abierto", "C"));
        assert_eq!(cases[0].id, 3);

        let added = extend_unique(&mut cases, vec![case(1, "Abierto", "A"), case(4, "Abierto", "D")]);
        assert_eq!(added, 1);
        assert_eq!(cases.len(), 4);
    }

    #[test]
    fn test_sub_collection_ordering() {
        let parent: Case = serde_json::from_value(json!({
            "id": 1,
            "actuaciones": [
                {"id": 1, "fecha": "2024-01-05", "descripcion": "a"},
                {"id": 2, "fecha": "2024-02-01", "descripcion": "b"},
                {"id": 3, "fecha": "", "descripcion": "c"},
                {"id": 4, "fecha": "2024-02-01", "descripcion": "d"}
            ],
            "notas": [
                {"id": 7, "titulo": "x", "created_at": "2024-01-01T10:00:00Z"},
                {"id": 8, "titulo": "y", "created_at": "2024-03-01T10:00:00Z"}
            ]
        }))
        .unwrap();

        let mut acts = parent.actuaciones.clone();
        sort_actuaciones(&mut acts);
        let ids: Vec<u64> = acts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);

        let mut notes = parent.notas.clone();
        sort_notes(&mut notes);
        assert_eq!(notes[0].id, 8);
    }
}
