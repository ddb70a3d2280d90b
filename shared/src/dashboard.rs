//! 仪表盘
//!
//! 服务端汇总的统计数字 + 两条按需加载的数据流（提醒流、最近案件流）。
//! 每次 "加载更多" 都会按 id 去重后再追加，防止分页重叠导致重复条目。

use crate::calendar::alert_due;
use crate::error::ApiResult;
use crate::listing::{Page, extend_unique};
use crate::{Alerta, Case, FUEROS, Identified};
use serde::Deserialize;
use std::collections::BTreeMap;

/// 距底部多少像素内触发加载更多
pub const NEAR_BOTTOM_PX: f64 = 80.0;

// =========================================================
// 统计数据
// =========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub total_cases: u32,
    #[serde(default)]
    pub open_cases: u32,
    #[serde(default)]
    pub in_progress_cases: u32,
    #[serde(default)]
    pub paused_cases: u32,
    #[serde(default)]
    pub closed_cases: u32,
}

impl StatusCounts {
    /// 仍在办理中的案件数（Abierto + En Trámite）
    pub fn active(&self) -> u32 {
        self.open_cases + self.in_progress_cases
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonthCount {
    pub mes: String,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub stats: StatusCounts,
    #[serde(default)]
    pub stats_by_fuero: BTreeMap<String, u32>,
    #[serde(default)]
    pub stats_by_abogado: BTreeMap<String, u32>,
    #[serde(default)]
    pub cases_by_month: Vec<MonthCount>,
    #[serde(default)]
    pub recent_cases: Vec<Case>,
    #[serde(default)]
    pub alertas: Vec<Alerta>,
}

impl DashboardData {
    /// 管辖领域：已知领域按固定顺序在前，其余按名称
    pub fn fuero_rows(&self) -> Vec<(String, u32)> {
        let mut rows: Vec<(String, u32)> = FUEROS
            .iter()
            .map(|f| (f.to_string(), self.stats_by_fuero.get(*f).copied().unwrap_or(0)))
            .collect();
        rows.extend(
            self.stats_by_fuero
                .iter()
                .filter(|(k, _)| !FUEROS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), *v)),
        );
        rows
    }

    /// 律师：案件数多的在前，同数按名称
    pub fn lawyer_rows(&self) -> Vec<(String, u32)> {
        let mut rows: Vec<(String, u32)> = self
            .stats_by_abogado
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    /// 柱状图比例基准
    pub fn max_month_total(&self) -> u32 {
        self.cases_by_month.iter().map(|m| m.total).max().unwrap_or(0)
    }
}

// =========================================================
// 按需加载的数据流
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed<T> {
    pub items: Vec<T>,
    pub next_page: usize,
    pub has_more: bool,
    pub loading: bool,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            loading: false,
        }
    }
}

impl<T: Identified> Feed<T> {
    /// 以首屏数据初始化；后续从第 2 页开始
    pub fn seeded(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: 2,
            has_more: true,
            loading: false,
        }
    }

    /// 可以加载时返回要请求的页码，并标记为加载中
    pub fn begin_load(&mut self) -> Option<usize> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(self.next_page)
    }

    /// 合并一页结果，返回实际新增的条数
    ///
    /// 失败时保留已有条目与页码，允许下次重试。
    pub fn finish_load(&mut self, outcome: ApiResult<Page<T>>) -> ApiResult<usize> {
        self.loading = false;
        let page = outcome?;
        self.has_more = page.has_next() && !page.results.is_empty();
        self.next_page += 1;
        Ok(extend_unique(&mut self.items, page.results))
    }
}

/// 提醒流排序：未完成在前；同组内到期早的在前，无法解析的排最后
pub fn sort_alert_feed(alerts: &mut [Alerta]) {
    alerts.sort_by_key(|a| {
        let due = alert_due(a);
        (a.cumplida, due.is_none(), due)
    });
}

/// 未完成提醒数
pub fn pending_count(alerts: &[Alerta]) -> usize {
    alerts.iter().filter(|a| !a.cumplida).count()
}

/// 滚动容器是否已接近底部
pub fn is_near_bottom(scroll_top: f64, client_height: f64, scroll_height: f64) -> bool {
    scroll_top + client_height >= scroll_height - NEAR_BOTTOM_PX
}
