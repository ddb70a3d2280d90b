//! 日历聚合
//!
//! 按日历日分组 alertas 与 actuaciones，并标注所属案件。
//! 日期只比较 `YYYY-MM-DD`，时间与时区偏移一律忽略；
//! 日期缺失或无法解析的条目不进入任何一天。

use crate::date::{first_of_month, parse_datetime, parse_day, parse_time, shift_month};
use crate::{Actuacion, Alerta, Case, Id};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashMap};

/// 网格固定为 6 周
pub const GRID_CELLS: usize = 42;

// =========================================================
// 月份网格
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_current_month: bool,
}

/// 显示中的月份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Self {
        let (year, month) = shift_month(year, month.clamp(1, 12), 0);
        Self { year, month }
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn previous(self) -> Self {
        let (year, month) = shift_month(self.year, self.month, -1);
        Self { year, month }
    }

    pub fn next(self) -> Self {
        let (year, month) = shift_month(self.year, self.month, 1);
        Self { year, month }
    }

    pub fn grid(self) -> Vec<DayCell> {
        month_grid(self.year, self.month)
    }
}

/// 42 格月视图：从本月 1 日所在周的周日开始
pub fn month_grid(year: i32, month: u32) -> Vec<DayCell> {
    let Some(first) = first_of_month(year, month) else {
        return Vec::new();
    };
    let lead = first.weekday().num_days_from_sunday() as i64;
    let start = first - Duration::days(lead);
    start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| DayCell {
            date,
            is_current_month: date.year() == year && date.month() == month,
        })
        .collect()
}

// =========================================================
// 按日分组
// =========================================================

/// 带上所属案件信息的日历条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAlert {
    pub case_id: Id,
    pub caratula: String,
    pub alerta: Alerta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarActuacion {
    pub case_id: Id,
    pub caratula: String,
    pub actuacion: Actuacion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEvents {
    pub alerts: Vec<CalendarAlert>,
    pub actuaciones: Vec<CalendarActuacion>,
}

impl DayEvents {
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.actuaciones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alerts.len() + self.actuaciones.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarStats {
    pub total_alerts: usize,
    pub pending_alerts: usize,
    pub total_actuaciones: usize,
}

/// 日历索引：日期 -> 当日事件
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    days: BTreeMap<NaiveDate, DayEvents>,
    stats: CalendarStats,
}

fn owner(captions: &HashMap<Id, String>, caso: Option<Id>) -> Option<(Id, String)> {
    let id = caso?;
    captions.get(&id).map(|c| (id, c.clone()))
}

fn caption(case: &Case) -> String {
    if case.caratula.trim().is_empty() {
        "Sin carátula".to_string()
    } else {
        case.caratula.clone()
    }
}

impl CalendarIndex {
    /// 从案件自带的 alertas / actuaciones 建立索引（案件详情的形状）
    pub fn build(cases: &[Case]) -> Self {
        let mut index = Self::default();
        for case in cases {
            for alerta in &case.alertas {
                index.push_alert(case.id, caption(case), alerta);
            }
            for actuacion in &case.actuaciones {
                index.push_actuacion(case.id, caption(case), actuacion);
            }
        }
        index
    }

    /// 从独立拉取的 alertas / actuaciones 建立索引
    ///
    /// 列表接口不返回子集合，条目按 `caso` 归到案件名下；
    /// 所属案件不在 `cases` 中（无权查看或已删除）的条目被忽略。
    pub fn from_records(cases: &[Case], alertas: &[Alerta], actuaciones: &[Actuacion]) -> Self {
        let captions: HashMap<Id, String> = cases.iter().map(|c| (c.id, caption(c))).collect();
        let mut index = Self::default();
        for alerta in alertas {
            if let Some((id, caratula)) = owner(&captions, alerta.caso) {
                index.push_alert(id, caratula, alerta);
            }
        }
        for actuacion in actuaciones {
            if let Some((id, caratula)) = owner(&captions, actuacion.caso) {
                index.push_actuacion(id, caratula, actuacion);
            }
        }
        index
    }

    fn push_alert(&mut self, case_id: Id, caratula: String, alerta: &Alerta) {
        let Some(day) = parse_day(&alerta.fecha_vencimiento) else {
            return;
        };
        self.stats.total_alerts += 1;
        if !alerta.cumplida {
            self.stats.pending_alerts += 1;
        }
        self.days.entry(day).or_default().alerts.push(CalendarAlert {
            case_id,
            caratula,
            alerta: alerta.clone(),
        });
    }

    fn push_actuacion(&mut self, case_id: Id, caratula: String, actuacion: &Actuacion) {
        let Some(day) = parse_day(&actuacion.fecha) else {
            return;
        };
        self.stats.total_actuaciones += 1;
        self.days
            .entry(day)
            .or_default()
            .actuaciones
            .push(CalendarActuacion {
                case_id,
                caratula,
                actuacion: actuacion.clone(),
            });
    }

    /// 某日的全部事件；没有事件时返回空集合
    pub fn events_for(&self, date: NaiveDate) -> DayEvents {
        self.days.get(&date).cloned().unwrap_or_default()
    }

    pub fn has_events(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn stats(&self) -> CalendarStats {
        self.stats
    }
}

// =========================================================
// 紧急程度
// =========================================================

/// 从最紧急到最不紧急
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Overdue,
    Today,
    Urgent,
    Pending,
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Overdue => "Vencido",
            Urgency::Today => "Hoy",
            Urgency::Urgent => "Urgente",
            Urgency::Pending => "Pendiente",
        }
    }

    /// 界面上的色块 class
    pub fn css_class(&self) -> &'static str {
        match self {
            Urgency::Overdue => "bg-red-500",
            Urgency::Today => "bg-red-400",
            Urgency::Urgent => "bg-orange-400",
            Urgency::Pending => "bg-blue-400",
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// 提醒的到期时刻
///
/// `fecha_vencimiento` 自带时间时直接使用；否则取 `hora`，
/// 两者都没有时视为当天 23:59:59。
pub fn alert_due(alerta: &Alerta) -> Option<NaiveDateTime> {
    let raw = alerta.fecha_vencimiento.trim();
    if raw.len() > 10 {
        if let Some(dt) = parse_datetime(raw) {
            return Some(dt);
        }
    }
    let day = parse_day(raw)?;
    let time = alerta
        .hora
        .as_deref()
        .and_then(parse_time)
        .unwrap_or_else(end_of_day);
    Some(day.and_time(time))
}

/// 纯函数：每次渲染都按当前时间重新计算
pub fn classify_urgency(due: NaiveDateTime, now: NaiveDateTime) -> Urgency {
    let remaining = due - now;
    if remaining < Duration::zero() {
        Urgency::Overdue
    } else if remaining < Duration::hours(24) {
        Urgency::Today
    } else if remaining < Duration::hours(72) {
        Urgency::Urgent
    } else {
        Urgency::Pending
    }
}

/// 无法确定到期时刻的提醒返回 None
pub fn alert_urgency(alerta: &Alerta, now: NaiveDateTime) -> Option<Urgency> {
    alert_due(alerta).map(|due| classify_urgency(due, now))
}
