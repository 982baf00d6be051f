use std::sync::Arc;

use ra_tls::TlsContext;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{RaAuthConfig, official};
use crate::errors::{RaAuthError, Result};

/// Decoded provider response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, `Null` when the body is empty or not JSON
    pub body: Value,
    /// Why a non-empty body could not be decoded, with the start of the body
    pub decode_error: Option<String>,
}

impl HttpResponse {
    /// The JSON body, failing with `MalformedResponse` when it did not decode
    pub fn json(self) -> Result<Value> {
        match self.decode_error {
            Some(reason) => Err(RaAuthError::MalformedResponse(reason)),
            None => Ok(self.body),
        }
    }
}

/// Cookie-keeping HTTP client for one authentication lifecycle.
///
/// Every request goes out over the fingerprinted TLS config with the official
/// client's default headers. Non-2xx answers become [`RaAuthError::Http`];
/// nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpSession {
    http: Client,
    tls: Arc<TlsContext>,
}

impl HttpSession {
    pub fn new(tls: Arc<TlsContext>, config: &RaAuthConfig) -> Result<Self> {
        let http = Client::builder()
            .use_preconfigured_tls(tls.client_config())
            .cookie_store(true)
            .http1_only()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .default_headers(default_headers(&config.user_agent)?)
            .build()?;

        Ok(Self { http, tls })
    }

    pub fn tls(&self) -> &Arc<TlsContext> {
        &self.tls
    }

    pub async fn get(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse> {
        self.send::<()>(Method::GET, url, None, headers).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        json: &T,
        headers: HeaderMap,
    ) -> Result<HttpResponse> {
        self.send(Method::POST, url, Some(json), headers).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        json: &T,
        headers: HeaderMap,
    ) -> Result<HttpResponse> {
        self.send(Method::PUT, url, Some(json), headers).await
    }

    #[instrument(skip_all, fields(%method, url = %url))]
    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &Url,
        json: Option<&T>,
        headers: HeaderMap,
    ) -> Result<HttpResponse> {
        let mut request = self.http.request(method, url.clone()).headers(headers);
        if let Some(json) = json {
            request = request.json(json);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RaAuthError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        let bytes = response.bytes().await?;
        let (body, decode_error) = if bytes.is_empty() {
            (Value::Null, None)
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => (body, None),
                Err(e) => {
                    debug!("Response body is not JSON: {}", e);
                    let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
                    (Value::Null, Some(format!("body is not JSON ({e}): {snippet}")))
                }
            }
        };

        debug!(%status, "Request completed");
        Ok(HttpResponse {
            status,
            headers,
            body,
            decode_error,
        })
    }
}

fn default_headers(user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(official::ACCEPT_ENCODING));
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(official::CACHE_CONTROL));
    headers.insert(ACCEPT, HeaderValue::from_static(official::ACCEPT));
    Ok(headers)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use ra_tls::{RIOT_CLIENT_PROFILE, build_tls_context};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    pub(crate) fn test_tls() -> Arc<TlsContext> {
        Arc::new(build_tls_context(&RIOT_CLIENT_PROFILE).unwrap())
    }

    fn test_session(config: &RaAuthConfig) -> HttpSession {
        HttpSession::new(test_tls(), config).unwrap()
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_default_headers_sent() {
        let server = MockServer::start().await;
        let config = RaAuthConfig::official();

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("accept", "application/json"))
            .and(header("cache-control", "no-cache"))
            .and(body_json(json!({"hello": "world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&config);
        let response = session
            .post(&url(&server, "/echo"), &json!({"hello": "world"}), HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"ok": true}));

        let received = server.received_requests().await.unwrap();
        let headers = &received[0].headers;
        assert_eq!(headers["user-agent"], config.user_agent.as_str());
        assert_eq!(headers["accept-encoding"], "deflate, gzip, zstd");
    }

    #[tokio::test]
    async fn test_non_success_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/fail"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let session = test_session(&RaAuthConfig::official());
        let err = session
            .put(&url(&server, "/fail"), &json!({}), HeaderMap::new())
            .await
            .unwrap_err();

        match err {
            RaAuthError::Http {
                status,
                body_snippet,
            } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body_snippet, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cookies_persist_between_requests() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "asid=abc123; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/whoami"))
            .and(header("cookie", "asid=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cookie": true})))
            .mount(&server)
            .await;

        let session = test_session(&RaAuthConfig::official());
        let login = session
            .post(&url(&server, "/login"), &json!({}), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(login.body, Value::Null);
        assert!(login.decode_error.is_none());

        let whoami = session
            .get(&url(&server, "/whoami"), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(whoami.body, json!({"cookie": true}));
    }

    #[tokio::test]
    async fn test_non_json_body_keeps_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let session = test_session(&RaAuthConfig::official());
        let response = session
            .get(&url(&server, "/html"), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.body, Value::Null);
        assert!(response.decode_error.is_some());

        match response.json() {
            Err(RaAuthError::MalformedResponse(reason)) => {
                assert!(reason.contains("<html></html>"));
            }
            other => panic!("Expected MalformedResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut config = RaAuthConfig::official();
        config.http_timeouts.request = Duration::from_millis(100);
        let session = test_session(&config);

        let err = session
            .get(&url(&server, "/slow"), HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RaAuthError::Timeout(_)));
    }
}
