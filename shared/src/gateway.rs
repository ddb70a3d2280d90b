//! API 网关
//!
//! 所有后端调用的唯一出口：
//! - 自动附加 Bearer 访问令牌
//! - 401 时使用刷新令牌换取新的访问令牌，并且只重试一次
//! - 刷新失败或重试仍为 401 时清空会话并触发过期回调
//! - 非 2xx 响应统一转换为 `ApiError`

use crate::error::{ApiError, ApiResult, extract_error_message, status_text};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::session::{SessionExpiredHook, SessionStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// 刷新接口的相对路径
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// 去掉末尾斜杠；空串回退为默认地址
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

// =========================================================
// 请求描述
// =========================================================

/// 一次网关调用的描述（路径相对 base_url）
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// 追加查询参数；空值跳过
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.trim().is_empty() {
            self.query.push((key.to_string(), value));
        }
        self
    }

    pub fn query_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        for (k, v) in pairs {
            self = self.query(&k, v);
        }
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// 拼接完整 URL
    pub fn url(&self, base_url: &str) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        if self.query.is_empty() {
            return format!("{}{}", base_url, path);
        }
        let qs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect();
        format!("{}{}?{}", base_url, path, qs.join("&"))
    }
}

/// 查询参数的百分号编码（RFC 3986 非保留字符原样保留）
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

// =========================================================
// 网关
// =========================================================

pub struct ApiGateway<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    base_url: String,
    on_session_expired: Option<SessionExpiredHook>,
}

impl<C, S> Clone for ApiGateway<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
            base_url: self.base_url.clone(),
            on_session_expired: self.on_session_expired.clone(),
        }
    }
}

impl<C: HttpClient, S: SessionStore> ApiGateway<C, S> {
    pub fn new(client: Arc<C>, store: Arc<S>, base_url: &str) -> Self {
        Self {
            client,
            store,
            base_url: normalize_base_url(base_url),
            on_session_expired: None,
        }
    }

    /// 注册会话过期回调（通常用于跳转到登录页）
    pub fn with_session_expired_hook(mut self, hook: SessionExpiredHook) -> Self {
        self.on_session_expired = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn build(&self, req: &ApiRequest, token: Option<&str>) -> HttpRequest {
        let mut http = HttpRequest::new(&req.url(&self.base_url), req.method)
            .with_header("Content-Type", "application/json");
        if let Some(token) = token {
            http = http.with_header("Authorization", &format!("Bearer {}", token));
        }
        if let Some(body) = &req.body {
            http = http.with_body(body.clone());
        }
        http
    }

    /// 不附带令牌、不做刷新的调用（登录、刷新本身）
    pub async fn send_anonymous(&self, req: &ApiRequest) -> ApiResult<HttpResponse> {
        self.client.send(self.build(req, None)).await
    }

    /// 发送请求并返回成功（2xx）的原始响应
    pub async fn send(&self, req: &ApiRequest) -> ApiResult<HttpResponse> {
        let token = self.store.access_token();
        let resp = self.client.send(self.build(req, token.as_deref())).await?;

        let resp = if resp.status == 401 {
            let fresh = self.refresh_access_token().await?;
            let retried = self.client.send(self.build(req, Some(&fresh))).await?;
            if retried.status == 401 {
                return Err(self.expire_session());
            }
            retried
        } else {
            resp
        };

        check_status(resp)
    }

    /// 用刷新令牌换取新的访问令牌；失败即视为会话过期
    async fn refresh_access_token(&self) -> ApiResult<String> {
        let Some(refresh) = self.store.refresh_token() else {
            return Err(self.expire_session());
        };

        let req = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh: &refresh })?;
        let parsed = match self.send_anonymous(&req).await {
            Ok(resp) if resp.ok() => resp.json::<RefreshResponse>().ok(),
            _ => None,
        };

        match parsed {
            Some(tokens) => {
                self.store
                    .set_tokens(&tokens.access, tokens.refresh.as_deref());
                Ok(tokens.access)
            }
            None => Err(self.expire_session()),
        }
    }

    fn expire_session(&self) -> ApiError {
        self.store.clear();
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
        ApiError::session_expired()
    }

    // --- 类型化的便捷方法 ---

    /// 期望响应有正文
    pub async fn fetch<T: DeserializeOwned>(&self, req: &ApiRequest) -> ApiResult<T> {
        let resp = self.send(req).await?;
        if resp.is_empty() {
            return Err(ApiError::decode("respuesta vacía"));
        }
        resp.json()
    }

    /// 204 或空正文返回 None
    pub async fn fetch_optional<T: DeserializeOwned>(&self, req: &ApiRequest) -> ApiResult<Option<T>> {
        let resp = self.send(req).await?;
        if resp.is_empty() {
            return Ok(None);
        }
        resp.json().map(Some)
    }

    /// 忽略响应正文（删除等）
    pub async fn execute(&self, req: &ApiRequest) -> ApiResult<()> {
        self.send(req).await.map(|_| ())
    }

    /// 二进制下载（导出表格）
    pub async fn fetch_bytes(&self, req: &ApiRequest) -> ApiResult<Vec<u8>> {
        Ok(self.send(req).await?.body)
    }
}

/// 非 2xx 响应 -> ApiError
pub fn check_status(resp: HttpResponse) -> ApiResult<HttpResponse> {
    match resp.status {
        s if (200..300).contains(&s) => Ok(resp),
        401 => Err(ApiError::session_expired()),
        403 => Err(ApiError::forbidden()),
        s => {
            let message =
                extract_error_message(&resp.body).unwrap_or_else(|| status_text(s).to_string());
            Err(ApiError::rejected(s, message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiErrorKind, MSG_FORBIDDEN};
    use crate::request::MockHttpClient;
    use crate::session::MemorySessionStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "http://api.test/api";

    fn setup(
        access: &str,
        refresh: &str,
    ) -> (
        Arc<MockHttpClient>,
        Arc<MemorySessionStore>,
        ApiGateway<MockHttpClient, MemorySessionStore>,
    ) {
        let client = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemorySessionStore::with_tokens(access, refresh));
        let gateway = ApiGateway::new(client.clone(), store.clone(), BASE);
        (client, store, gateway)
    }

    fn counting_hook() -> (SessionExpiredHook, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let hook: SessionExpiredHook = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (hook, count)
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://x/api/"), "http://x/api");
        assert_eq!(normalize_base_url("  "), DEFAULT_API_URL);
    }

    #[test]
    fn test_query_encoding_skips_blank_values() {
        let req = ApiRequest::get("/cases/")
            .query("search", "Pérez & Cía")
            .query("estado", "")
            .query("page", 2);
        assert_eq!(
            req.url(BASE),
            "http://api.test/api/cases/?search=P%C3%A9rez%20%26%20C%C3%ADa&page=2"
        );
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let (client, _store, gw) = setup("tok-1", "ref-1");
        let url = format!("{}/cases/1/", BASE);
        client.mock_response(&url, 200, json!({"ok": true}));

        let _: serde_json::Value = gw.fetch(&ApiRequest::get("/cases/1/")).await.unwrap();

        let sent = client.requests_to(&url);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("Authorization"), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries() {
        let (client, store, gw) = setup("old", "ref-1");
        let url = format!("{}/cases/", BASE);
        let refresh_url = format!("{}{}", BASE, REFRESH_PATH);
        client.mock_response(&url, 401, json!({"detail": "token expired"}));
        client.mock_response(&url, 200, json!([]));
        client.mock_response(&refresh_url, 200, json!({"access": "new"}));

        let result: Vec<serde_json::Value> = gw.fetch(&ApiRequest::get("/cases/")).await.unwrap();
        assert!(result.is_empty());

        let sent = client.requests_to(&url);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].header("Authorization"), Some("Bearer old"));
        assert_eq!(sent[1].header("Authorization"), Some("Bearer new"));

        let refreshes = client.requests_to(&refresh_url);
        assert_eq!(refreshes.len(), 1);
        assert_eq!(refreshes[0].body.as_deref(), Some(r#"{"refresh":"ref-1"}"#));
        assert_eq!(store.access_token().as_deref(), Some("new"));
        assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));
    }

    #[tokio::test]
    async fn test_second_401_expires_session() {
        let (client, store, gw) = setup("old", "ref-1");
        let (hook, count) = counting_hook();
        let gw = gw.with_session_expired_hook(hook);
        let url = format!("{}/cases/", BASE);
        client.mock_response(&url, 401, json!({}));
        client.mock_response(
            &format!("{}{}", BASE, REFRESH_PATH),
            200,
            json!({"access": "new"}),
        );

        let err = gw.execute(&ApiRequest::get("/cases/")).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::SessionExpired);
        assert_eq!(client.requests_to(&url).len(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_expires_session() {
        let (client, store, gw) = setup("old", "ref-1");
        let (hook, count) = counting_hook();
        let gw = gw.with_session_expired_hook(hook);
        let url = format!("{}/alertas/", BASE);
        client.mock_response(&url, 401, json!({}));
        client.mock_response(
            &format!("{}{}", BASE, REFRESH_PATH),
            401,
            json!({"detail": "Token is invalid"}),
        );

        let err = gw.execute(&ApiRequest::get("/alertas/")).await.unwrap_err();
        assert!(err.requires_login());
        assert_eq!(client.requests_to(&url).len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(store.access_token().is_none());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_without_refresh_call() {
        let client = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemorySessionStore::new());
        let gw = ApiGateway::new(client.clone(), store, BASE);
        let url = format!("{}/cases/", BASE);
        client.mock_response(&url, 401, json!({}));

        let err = gw.execute(&ApiRequest::get("/cases/")).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::SessionExpired);
        assert!(
            client
                .requests_to(&format!("{}{}", BASE, REFRESH_PATH))
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_403_uses_fixed_message() {
        let (client, _store, gw) = setup("t", "r");
        let url = format!("{}/users/", BASE);
        client.mock_response(&url, 403, json!({"detail": "You do not have permission"}));

        let err = gw.execute(&ApiRequest::get("/users/")).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Forbidden);
        assert_eq!(err.message(), MSG_FORBIDDEN);
    }

    #[tokio::test]
    async fn test_error_message_extraction_and_fallback() {
        let (client, _store, gw) = setup("t", "r");
        let a = format!("{}/cases/9/", BASE);
        let b = format!("{}/cases/10/", BASE);
        client.mock_response(&a, 400, json!({"message": "Carátula requerida"}));
        client.mock_raw(&b, 500, b"<html>boom</html>".to_vec());

        let err = gw.execute(&ApiRequest::get("/cases/9/")).await.unwrap_err();
        assert_eq!(err.message(), "Carátula requerida");
        assert_eq!(err.status, Some(400));

        let err = gw.execute(&ApiRequest::get("/cases/10/")).await.unwrap_err();
        assert_eq!(err.message(), "Internal Server Error");
        assert_eq!(err.kind, ApiErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_no_content_is_none() {
        let (client, _store, gw) = setup("t", "r");
        let url = format!("{}/cases/3/", BASE);
        client.mock_raw(&url, 204, Vec::new());

        let out: Option<serde_json::Value> = gw
            .fetch_optional(&ApiRequest::delete("/cases/3/"))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_network_failure_surfaces() {
        let (client, _store, gw) = setup("t", "r");
        let url = format!("{}/cases/", BASE);
        client.mock_unreachable(&url);

        let err = gw.execute(&ApiRequest::get("/cases/")).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
    }
}
