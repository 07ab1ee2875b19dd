use super::{InvocationResponse, InvocationTransport, TransportError};
use async_trait::async_trait;
use reqwest::Proxy;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Default invocation endpoint; `{region}` is substituted per call.
pub const DEFAULT_INVOKE_ENDPOINT: &str = "https://lambda.{region}.amazonaws.com";

/// API version segment of the function invocation path.
const INVOKE_API_VERSION: &str = "2015-03-31";

/// Header the platform sets when the function itself raised an error.
const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint_template: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport from environment settings.
    pub fn new() -> Result<Self, TransportError> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("WARMER_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(
                env::var("WARMER_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("WARMER_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint_template: env::var("WARMER_INVOKE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_INVOKE_ENDPOINT.to_string()),
            token: env::var("WARMER_INVOKE_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    /// Override the invocation endpoint template (primarily for testing with mock servers).
    pub fn with_endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint_template = template.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn invocation_url(&self, function_name: &str, region: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.endpoint_template.replace("{region}", region))?;
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::Other(format!(
                    "endpoint '{}' cannot be used as a base URL",
                    self.endpoint_template
                ))
            })?
            .pop_if_empty()
            .extend([INVOKE_API_VERSION, "functions", function_name, "invocations"]);
        Ok(url)
    }

    /// GET a JSON document, returning the HTTP status alongside the parsed body.
    ///
    /// Non-success statuses are not turned into errors here; callers decide what they mean.
    pub async fn get_json(&self, url: Url) -> Result<(u16, Value), TransportError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, parse_body(&text)))
    }
}

#[async_trait]
impl InvocationTransport for HttpTransport {
    async fn invoke(
        &self,
        function_name: &str,
        region: &str,
        payload: &Value,
    ) -> Result<InvocationResponse, TransportError> {
        let url = self.invocation_url(function_name, region)?;
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .client
            .post(url)
            .json(payload)
            .header("x-warmer-request-id", &request_id);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let function_error = response
            .headers()
            .get(FUNCTION_ERROR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = parse_body(&response.text().await?);

        debug!(
            function = function_name,
            region,
            http_status = status,
            request_id = request_id.as_str(),
            "invocation completed"
        );

        if !(200..300).contains(&status) {
            return Ok(InvocationResponse::failed(status, body));
        }
        if let Some(kind) = function_error {
            return Ok(InvocationResponse::failed(
                status,
                serde_json::json!({ "function_error": kind, "body": body }),
            ));
        }
        Ok(InvocationResponse::ok(body))
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
