//! 会话模块
//!
//! 会话（令牌 + 当前用户）通过 `SessionStore` 注入网关，
//! 浏览器端由 LocalStorage 实现，测试使用内存实现。

use crate::User;
use std::sync::Arc;

#[cfg(test)]
use std::cell::RefCell;

/// 已认证的会话快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }
}

/// 会话持久化特性
///
/// 所有方法都是同步的：浏览器存储本身就是同步 API。
pub trait SessionStore {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn current_user(&self) -> Option<User>;

    /// 写入访问令牌；`refresh` 为 None 时保留原有的刷新令牌
    fn set_tokens(&self, access: &str, refresh: Option<&str>);
    fn set_current_user(&self, user: &User);

    /// 注销或会话不可恢复时清空全部状态
    fn clear(&self);

    fn snapshot(&self) -> Session {
        Session {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
            user: self.current_user(),
        }
    }
}

/// 会话过期回调
///
/// 代替整页跳转：由外壳层决定如何回到登录页。
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

// =========================================================
// 测试工具: MemorySessionStore
// =========================================================

#[cfg(test)]
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RefCell<Session>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store.set_tokens(access, Some(refresh));
        store
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        self.inner.borrow().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.borrow().refresh_token.clone()
    }

    fn current_user(&self) -> Option<User> {
        self.inner.borrow().user.clone()
    }

    fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        inner.access_token = Some(access.to_string());
        if let Some(refresh) = refresh {
            inner.refresh_token = Some(refresh.to_string());
        }
    }

    fn set_current_user(&self, user: &User) {
        self.inner.borrow_mut().user = Some(user.clone());
    }

    fn clear(&self) {
        *self.inner.borrow_mut() = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_refresh_token_survives_access_rotation() {
        let store = MemorySessionStore::with_tokens("a1", "r1");
        store.set_tokens("a2", None);
        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_clear_drops_everything() {
        let store = MemorySessionStore::with_tokens("a", "r");
        store.set_current_user(&User {
            id: 1,
            username: "ana".into(),
            role: Role::Lawyer,
        });
        assert!(store.snapshot().is_authenticated());

        store.clear();
        assert_eq!(store.snapshot(), Session::default());
    }
}
