use std::sync::Arc;

use reqwest::{
    Method, Url,
    cookie::{CookieStore, Jar},
    header::{ACCEPT, HeaderValue},
};
use sanctum_auth::Token;
use serde::Serialize;

use crate::{
    config::{Endpoint, RouteConfig},
    error::SessionError,
};

/// Cookie set by the CSRF pre-flight
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header the backend expects the CSRF cookie value echoed in
pub const HDR_X_XSRF_TOKEN: &str = "x-xsrf-token";

/// Builds the cookie jar and reqwest client used by default.
///
/// The jar plays the role of a browser's credentialed cookie storage: the
/// session and `XSRF-TOKEN` cookies set by the backend ride along on every
/// later request.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn default_http_client() -> Result<(reqwest::Client, Arc<Jar>), SessionError> {
    let jar = Arc::new(Jar::default());
    let http = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()?;
    Ok((http, jar))
}

/// HTTP plumbing shared by every action
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    http: reqwest::Client,
    jar: Arc<Jar>,
    config: RouteConfig,
}

impl HttpTransport {
    pub(crate) fn new(http: reqwest::Client, jar: Arc<Jar>, config: RouteConfig) -> Self {
        Self { http, jar, config }
    }

    pub(crate) const fn config(&self) -> &RouteConfig {
        &self.config
    }

    pub(crate) fn with_http_client(mut self, http: reqwest::Client, jar: Arc<Jar>) -> Self {
        self.http = http;
        self.jar = jar;
        self
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, SessionError> {
        let raw = self.config.url(endpoint);
        Url::parse(&raw).map_err(|e| SessionError::Config(format!("invalid URL '{raw}': {e}")))
    }

    /// Current `XSRF-TOKEN` cookie value for `url`, percent-decoded
    pub(crate) fn xsrf_token(&self, url: &Url) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name != XSRF_COOKIE {
                return None;
            }
            urlencoding::decode(value).ok().map(std::borrow::Cow::into_owned)
        })
    }

    pub(crate) async fn get(
        &self,
        endpoint: Endpoint,
        bearer: Option<&Token>,
    ) -> Result<bytes::Bytes, SessionError> {
        let url = self.endpoint_url(endpoint)?;
        let request = self.request(Method::GET, url, bearer);
        self.execute(endpoint, request).await
    }

    pub(crate) async fn post_json<I>(
        &self,
        endpoint: Endpoint,
        body: &I,
        bearer: Option<&Token>,
    ) -> Result<bytes::Bytes, SessionError>
    where
        I: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint_url(endpoint)?;
        let request = self.request(Method::POST, url, bearer).json(body);
        self.execute(endpoint, request).await
    }

    pub(crate) async fn post_empty(
        &self,
        endpoint: Endpoint,
        bearer: Option<&Token>,
    ) -> Result<bytes::Bytes, SessionError> {
        let url = self.endpoint_url(endpoint)?;
        let request = self.request(Method::POST, url, bearer);
        self.execute(endpoint, request).await
    }

    fn request(&self, method: Method, url: Url, bearer: Option<&Token>) -> reqwest::RequestBuilder {
        let mutating = method != Method::GET;
        let xsrf = if mutating { self.xsrf_token(&url) } else { None };

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose());
        }
        if let Some(xsrf) = xsrf {
            request = request.header(HDR_X_XSRF_TOKEN, xsrf);
        }
        request
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<bytes::Bytes, SessionError> {
        let request = request.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), ?endpoint, "sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(status = status.as_u16(), ?endpoint, "response received");

        if status.is_success() {
            return Ok(bytes);
        }

        Err(crate::error::deserialize_api_error(status, &bytes))
    }
}

/// Reads the token a sign-in/sign-up call returns.
///
/// Accepts a JSON string, a JSON object carrying `token`, `access_token` or
/// `plainTextToken`, or a raw text body. Cookie-session backends answer with
/// an empty body (204) or an object without a token; both yield `Ok(None)`.
pub(crate) fn parse_token(body: &[u8]) -> Result<Option<Token>, SessionError> {
    let raw = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => {
            let Some(token) = ["token", "access_token", "plainTextToken"]
                .iter()
                .find_map(|key| map.get(*key).and_then(serde_json::Value::as_str))
            else {
                return Ok(None);
            };
            token.to_owned()
        }
        Ok(serde_json::Value::Null) => return Ok(None),
        _ => String::from_utf8(body.to_vec())
            .map_err(|e| SessionError::Serde(format!("token response is not UTF-8: {e}")))?,
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }
    Token::parse(raw)
        .map(Some)
        .map_err(|e| SessionError::Serde(format!("token response: {e}")))
}
