//! 全局提示框
//!
//! 每个发起请求的处理函数自己捕获错误并转成提示，不向上抛出。

use crate::config::TOAST_LIFETIME;
use estudio_shared::ApiError;
use leptos::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    seq: u32,
    pub message: String,
    pub is_error: bool,
}

#[derive(Clone, Copy)]
pub struct Toast {
    notice: ReadSignal<Option<Notice>>,
    set_notice: WriteSignal<Option<Notice>>,
    counter: StoredValue<u32>,
}

impl Toast {
    pub fn new() -> Self {
        let (notice, set_notice) = signal(None);
        Self {
            notice,
            set_notice,
            counter: StoredValue::new(0),
        }
    }

    fn show(&self, message: String, is_error: bool) {
        self.counter.update_value(|c| *c = c.wrapping_add(1));
        let seq = self.counter.get_value();
        self.set_notice.set(Some(Notice {
            seq,
            message,
            is_error,
        }));

        // 只清除自己这一条，避免把紧随其后的新提示提前关掉
        let notice = self.notice;
        let set_notice = self.set_notice;
        set_timeout(
            move || {
                if notice.with_untracked(|n| n.as_ref().map(|n| n.seq)) == Some(seq) {
                    set_notice.set(None);
                }
            },
            TOAST_LIFETIME,
        );
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message.into(), false);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message.into(), true);
    }

    /// 记录并提示一次失败的操作
    pub fn failure(&self, action: &str, err: &ApiError) {
        log_error!("[{}] {} ({})", action, err, err.error_code());
        // 会话过期由外壳统一处理（跳转登录页并提示）
        if !err.requires_login() {
            self.error(err.message().to_string());
        }
    }
}

pub fn use_toast() -> Toast {
    use_context::<Toast>().expect("Toast should be provided")
}

#[component]
pub fn ToastHost() -> impl IntoView {
    let toast = use_toast();
    let notice = toast.notice;

    view! {
        <Show when=move || notice.with(|n| n.is_some())>
            <div class="toast toast-top toast-end z-50">
                <div class=move || {
                    if notice.with(|n| n.as_ref().is_some_and(|n| n.is_error)) {
                        "alert alert-error shadow-lg"
                    } else {
                        "alert alert-success shadow-lg"
                    }
                }>
                    <span>{move || notice.with(|n| n.as_ref().map(|n| n.message.clone()).unwrap_or_default())}</span>
                </div>
            </div>
        </Show>
    }
}
