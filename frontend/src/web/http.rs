//! HTTP 传输层
//!
//! 基于 `gloo-net` 实现共享层的 `HttpClient` 特性。
//! 刷新令牌、错误分类都在网关完成，这里只负责把请求送出去并读回原始字节。

use async_trait::async_trait;
use estudio_shared::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use estudio_shared::{ApiError, ApiResult};
use gloo_net::http::{Method, RequestBuilder};

/// 传输层错误
#[derive(Debug)]
pub enum HttpError {
    /// 请求构建失败
    RequestBuildFailed(String),
    /// 网络请求失败
    NetworkError(String),
    /// 响应读取失败
    ResponseParseFailed(String),
}

impl core::fmt::Display for HttpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HttpError::RequestBuildFailed(msg) => write!(f, "No se pudo preparar la solicitud: {}", msg),
            HttpError::NetworkError(msg) => write!(f, "Error de conexión: {}", msg),
            HttpError::ResponseParseFailed(msg) => write!(f, "Respuesta ilegible: {}", msg),
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::ResponseParseFailed(_) => ApiError::decode(e.to_string()),
            _ => ApiError::network(e.to_string()),
        }
    }
}

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

impl FetchClient {
    async fn dispatch(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = RequestBuilder::new(&req.url).method(method_of(req.method));
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match req.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| HttpError::RequestBuildFailed(e.to_string()))?;

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .binary()
            .await
            .map_err(|e| HttpError::ResponseParseFailed(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let method = req.method.as_str();
        let url = req.url.clone();
        self.dispatch(req).await.map_err(|e| {
            log_error!("[Http] {} {} failed: {}", method, url, e);
            ApiError::from(e)
        })
    }
}
