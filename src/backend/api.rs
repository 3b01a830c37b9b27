//! HTTP client for the catalog REST backend
//!
//! Every call goes through [`ApiClient::execute`], which attaches the bearer
//! token, interprets the response, and turns a rejected credential into a
//! cleared session.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;

use super::error::ApiError;
use super::session::Session;
use super::Backend;

/// Message some backend routes answer with (status 200) instead of a 401
pub const AUTH_REQUIRED_MESSAGE: &str = "Authorization token required.";

/// Write verbs used by mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl WriteMethod {
    fn as_method(self) -> Method {
        match self {
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// Query string parameters.
///
/// Keys are kept sorted so two parameter sets with the same content compare
/// and hash equal. A key with several values is sent as repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single value, replacing any previous ones
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), vec![value.to_string()]);
    }

    /// Add a value, keeping previous ones
    pub fn append(&mut self, key: &str, value: impl ToString) {
        self.0.entry(key.to_string()).or_default().push(value.to_string());
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattened `(key, value)` pairs in key order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish();
        f.write_str(&encoded)
    }
}

/// Client for the catalog backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::new(),
            base_url: normalize_base(base_url)?,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL and append `params`
    pub fn build_url(&self, path: &str, params: Option<&QueryParams>) -> Result<Url, ApiError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ApiError::InvalidRequest("empty request path".into()));
        }
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("bad path {:?}: {}", path, e)))?;
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.query_pairs_mut().extend_pairs(params.pairs());
        }
        Ok(url)
    }

    pub async fn get(&self, path: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let url = self.build_url(path, Some(params))?;
        self.execute(self.client.get(url.clone()), "GET", &url).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(WriteMethod::Post, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(WriteMethod::Put, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.send(WriteMethod::Delete, path, body).await
    }

    pub async fn send(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.build_url(path, None)?;
        let mut request = self.client.request(method.as_method(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, method.as_method().as_str(), &url).await
    }

    async fn execute(&self, request: RequestBuilder, verb: &str, url: &Url) -> Result<Value, ApiError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        tracing::debug!("{} {}", verb, url);

        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            let bytes = response.bytes().await?;
            interpret_response(status, &content_type, &bytes)
        }
        .await;

        if let Err(err) = &result {
            if err.is_unauthorized() {
                tracing::warn!("{} {} rejected credential, redirecting to login", verb, url);
                self.session.clear();
            } else {
                tracing::warn!("{} {} failed: {}", verb, url, err);
            }
        }
        result
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ApiError> {
        self.get(path, params).await
    }

    async fn write(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.send(method, path, body).await
    }
}

fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| ApiError::InvalidRequest(format!("bad base url {:?}: {}", base_url, e)))
}

/// Turn a raw response into a JSON value or an error.
///
/// Non-JSON bodies are wrapped as `{"message": <text>}`. A 401, or a
/// successful body whose message says a token is required, is reported as
/// [`ApiError::Unauthorized`].
pub fn interpret_response(status: StatusCode, content_type: &str, bytes: &[u8]) -> Result<Value, ApiError> {
    let body = if content_type.contains("application/json") {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => value,
            Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
            Err(_) => json!({ "message": String::from_utf8_lossy(bytes) }),
        }
    } else {
        json!({ "message": String::from_utf8_lossy(bytes) })
    };

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(
            "Unauthorized. Redirecting to login...".into(),
        ));
    }
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body,
        });
    }
    if body.get("message").and_then(Value::as_str) == Some(AUTH_REQUIRED_MESSAGE) {
        return Err(ApiError::Unauthorized(
            "Authorization token required. Redirecting to login...".into(),
        ));
    }
    Ok(body)
}
