//! 浏览器端 API 实例
//!
//! 把共享层的 `EstudioApi` 绑定到 fetch 传输与 LocalStorage 会话。

use crate::config::RuntimeConfig;
use crate::web::{BrowserSessionStore, FetchClient};
use estudio_shared::api::EstudioApi;
use estudio_shared::gateway::ApiGateway;
use estudio_shared::session::SessionExpiredHook;
use std::sync::Arc;

pub type Api = EstudioApi<FetchClient, BrowserSessionStore>;

pub fn build_api(config: &RuntimeConfig, on_session_expired: SessionExpiredHook) -> Api {
    let gateway = ApiGateway::new(
        Arc::new(FetchClient),
        Arc::new(BrowserSessionStore),
        &config.api_url,
    )
    .with_session_expired_hook(on_session_expired);
    EstudioApi::new(gateway)
}
