//! 浏览器会话存储
//!
//! 令牌以原始字符串保存，当前用户以 JSON 保存，键名与旧版页面保持一致，
//! 这样已登录的浏览器在升级后无需重新登录。

use estudio_shared::session::SessionStore;
use estudio_shared::{STORAGE_ACCESS_TOKEN, STORAGE_CURRENT_USER, STORAGE_REFRESH_TOKEN, User};
use gloo_storage::{LocalStorage, Storage};

/// 基于 LocalStorage 的 `SessionStore`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSessionStore;

impl BrowserSessionStore {
    fn raw_get(key: &str) -> Option<String> {
        LocalStorage::raw()
            .get_item(key)
            .ok()
            .flatten()
            .filter(|v| !v.is_empty())
    }

    fn raw_set(key: &str, value: &str) {
        if LocalStorage::raw().set_item(key, value).is_err() {
            log_warn!("[Storage] failed to write {}", key);
        }
    }
}

impl SessionStore for BrowserSessionStore {
    fn access_token(&self) -> Option<String> {
        Self::raw_get(STORAGE_ACCESS_TOKEN)
    }

    fn refresh_token(&self) -> Option<String> {
        Self::raw_get(STORAGE_REFRESH_TOKEN)
    }

    fn current_user(&self) -> Option<User> {
        // 解析失败（旧格式或被篡改）视为未登录
        LocalStorage::get::<User>(STORAGE_CURRENT_USER).ok()
    }

    fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        Self::raw_set(STORAGE_ACCESS_TOKEN, access);
        if let Some(refresh) = refresh {
            Self::raw_set(STORAGE_REFRESH_TOKEN, refresh);
        }
    }

    fn set_current_user(&self, user: &User) {
        if let Err(e) = LocalStorage::set(STORAGE_CURRENT_USER, user) {
            log_warn!("[Storage] failed to store user: {}", e);
        }
    }

    fn clear(&self) {
        LocalStorage::delete(STORAGE_ACCESS_TOKEN);
        LocalStorage::delete(STORAGE_REFRESH_TOKEN);
        LocalStorage::delete(STORAGE_CURRENT_USER);
    }
}
