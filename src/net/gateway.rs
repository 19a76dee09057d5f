//! HTTP gateway: the single door every console request goes through.
//!
//! DESIGN
//! ======
//! Just before a request leaves, the gateway stamps it with the current
//! credential (`Authorization: Bearer ...`) and a fresh `X-Request-ID`.
//! When the server answers 401 the gateway clears the session first and only
//! then sends the navigator to the login page, so the guard evaluating that
//! navigation already sees the signed-out session. The 401 still reaches the
//! caller as an error.
//!
//! Base URL and timeout come from `ClientConfig` at construction and never
//! change afterwards.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::RequestError;
use crate::config::ClientConfig;
use crate::router::history::Navigator;
use crate::router::routes::{LOGIN_PATH, is_login_path};
use crate::state::session::SessionStore;
use crate::state::storage::{CookieMirror, JarMirror};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// An outbound call and its mutable header set.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: HeaderMap::new(), body: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, RequestError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeader` if `value` contains bytes not allowed in a header.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, RequestError> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }
}

/// A 2xx response with its body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    cookie_mirror: Option<Arc<dyn CookieMirror>>,
}

impl Gateway {
    /// Build a gateway over `session`. When the base URL is absolute, the
    /// gateway's cookie jar is registered as a cookie mirror on the session
    /// so that signing out also drops any `access_token` cookie. The
    /// registration ends when the last clone of this gateway is dropped.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, session: SessionStore, navigator: Arc<dyn Navigator>) -> Result<Self, RequestError> {
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| RequestError::HttpClientBuild(e.to_string()))?;

        let base_url = config.api_base_url.trim_end_matches('/').to_owned();
        let mut cookie_mirror = None;
        if let Ok(url) = reqwest::Url::parse(&base_url) {
            let mirror: Arc<dyn CookieMirror> = Arc::new(JarMirror::new(jar, url));
            session.add_cookie_mirror(&mirror);
            cookie_mirror = Some(mirror);
        }

        Ok(Self { http, base_url, timeout: config.timeout, session, navigator, cookie_mirror })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for `path`. Paths that are already absolute URLs are
    /// used unchanged.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Stamp `headers` with the current credential and a request id.
    /// Without a credential no `Authorization` header is added.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeader` if the credential contains bytes not allowed
    /// in a header.
    pub fn prepare(&self, headers: &mut HeaderMap) -> Result<(), RequestError> {
        let token = self.session.get();
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if !headers.contains_key(REQUEST_ID_HEADER) {
            let id = uuid::Uuid::new_v4().to_string();
            headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id)?);
        }
        Ok(())
    }

    /// Dispatch `request`.
    ///
    /// # Errors
    ///
    /// Returns `Status` for any non-2xx answer (a 401 also signs the session
    /// out), `Timeout` after the configured timeout, and `Network` /
    /// `InvalidUrl` when the request never reaches a server.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
        let ApiRequest { method, path, mut headers, body } = request;
        self.prepare(&mut headers)?;

        let url = self.url(&path);
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        tracing::debug!(%method, %url, %request_id, "dispatching request");

        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let err = RequestError::from_transport(&e);
            tracing::debug!(%method, %url, %request_id, error = %err, "request failed");
            err
        })?;

        let status = response.status().as_u16();
        if status == 401 {
            self.on_unauthorized();
        }

        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| RequestError::from_transport(&e))?;

        if !(200..300).contains(&status) {
            tracing::debug!(%method, %url, %request_id, status, "request rejected");
            return Err(RequestError::Status { status, body });
        }
        Ok(ApiResponse { status, headers, body })
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also `Decode` for an unexpected body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also `Decode` for an unexpected body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// PUT `body` as JSON to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also `Decode` for an unexpected body.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await?.json()
    }

    /// DELETE `path`.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, RequestError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Session-loss handling: clear first, then leave for the login page
    /// unless already there.
    fn on_unauthorized(&self) {
        self.session.clear();
        let current = self.navigator.current_path();
        if is_login_path(&current) {
            tracing::debug!(%current, "credential rejected on login page");
            return;
        }
        tracing::warn!(%current, "credential rejected, redirecting to login");
        self.navigator.push(LOGIN_PATH);
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("session", &self.session)
            .field("cookie_mirror", &self.cookie_mirror.is_some())
            .finish_non_exhaustive()
    }
}
