//! 定时器封装
//!
//! 基于 `gloo-timers`，定时器的生命周期绑定到当前响应式 Owner：
//! 组件卸载时存储被释放，定时器随 drop 一起取消。

use gloo_timers::callback::{Interval, Timeout};
use leptos::prelude::*;

/// 防抖器
///
/// 每次 `schedule` 都会替换掉尚未触发的回调，只有最后一次会执行。
#[derive(Clone, Copy)]
pub struct Debounce {
    pending: StoredValue<Option<Timeout>, LocalStorage>,
}

impl Debounce {
    pub fn new() -> Self {
        Self {
            pending: StoredValue::new_local(None),
        }
    }

    pub fn schedule(&self, millis: u32, callback: impl FnOnce() + 'static) {
        // 旧的 Timeout 被 drop 即取消
        self.pending.set_value(Some(Timeout::new(millis, callback)));
    }

    pub fn cancel(&self) {
        self.pending.set_value(None);
    }
}

/// 周期性回调，随当前组件一起销毁
pub fn use_interval(millis: u32, callback: impl FnMut() + 'static) {
    let _ = StoredValue::new_local(Interval::new(millis, callback));
}

/// 浏览器本地时间（紧急程度按本地时间计算）
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
