//! One-shot `tools/call` over HTTP

use super::error::InvokeError;
use super::sse::parse_sse_events;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use toolbridge_core::mcp::protocol::methods;
use toolbridge_core::mcp::{McpRequest, McpResponse};
use toolbridge_core::tools::codes::TOOL_INVOCATION_FAILED;
use toolbridge_core::{McpToolResult, ToolOutput};
use tracing::{debug, instrument, warn};

/// Default per-request timeout
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(60);

const REQUEST_ID: i64 = 1;

/// A single remote operation call
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeRequest {
    pub endpoint: String,
    pub operation: String,
    pub arguments: Value,
    pub headers: HashMap<String, String>,
}

impl InvokeRequest {
    pub fn new(
        endpoint: impl Into<String>,
        operation: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            operation: operation.into(),
            arguments,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// JSON-RPC envelope sent as the request body
    pub fn to_rpc(&self) -> McpRequest {
        McpRequest::new(REQUEST_ID, methods::TOOLS_CALL).with_params(json!({
            "name": self.operation,
            "arguments": self.arguments,
        }))
    }
}

/// Stateless tool invoker.
///
/// Each call is one POST with no retry. Nothing about a call is kept
/// afterwards; the HTTP client only pools connections.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    client: Client,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new() -> Result<Self, InvokeError> {
        Self::with_timeout(DEFAULT_INVOKE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, InvokeError> {
        let client = Client::builder().build().map_err(|e| InvokeError::Client {
            message: e.to_string(),
        })?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke and fold every failure into a flagged output
    pub async fn invoke(&self, request: &InvokeRequest) -> ToolOutput {
        match self.call(request).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Invocation of '{}' failed: {}", request.operation, e);
                ToolOutput::error(TOOL_INVOCATION_FAILED, e.to_string())
            }
        }
    }

    /// Invoke and surface failures as [`InvokeError`]
    #[instrument(
        skip(self, request),
        fields(endpoint = %request.endpoint, operation = %request.operation)
    )]
    pub async fn call(&self, request: &InvokeRequest) -> Result<ToolOutput, InvokeError> {
        let endpoint = request.endpoint.as_str();

        let response = self
            .client
            .post(endpoint)
            .headers(build_headers(&request.headers))
            .timeout(self.timeout)
            .json(&request.to_rpc())
            .send()
            .await
            .map_err(|e| request_error(endpoint, e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(|e| request_error(endpoint, e))?;

        if !status.is_success() {
            return Err(InvokeError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!("Received {} bytes ({})", body.len(), content_type);
        let response = decode_response(&content_type, &body)?;
        let result = response.into_result().map_err(|e| InvokeError::Rpc {
            code: e.code,
            message: e.message,
        })?;
        normalize_result(result)
    }
}

fn request_error(endpoint: &str, err: reqwest::Error) -> InvokeError {
    if err.is_timeout() {
        InvokeError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        InvokeError::transport(endpoint, err.to_string())
    }
}

fn build_headers(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/event-stream"),
    );

    for (key, value) in headers {
        match (HeaderName::try_from(key.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("Skipping invalid header '{}'", key),
        }
    }
    map
}

/// Parse a plain JSON body or the first JSON-RPC message of an SSE body
pub(crate) fn decode_response(content_type: &str, body: &str) -> Result<McpResponse, InvokeError> {
    if content_type.contains("text/event-stream") {
        return parse_sse_events(body)
            .into_iter()
            .filter(|event| event.is_message())
            .find_map(|event| serde_json::from_str::<McpResponse>(&event.data).ok())
            .ok_or_else(|| InvokeError::decode("event stream carried no JSON-RPC response"));
    }

    serde_json::from_str(body).map_err(|e| InvokeError::decode(e.to_string()))
}

/// Turn a `tools/call` result into the uniform envelope.
///
/// Objects with `content` are read as tool results. Bare strings become
/// text; anything else is rendered as JSON text.
pub(crate) fn normalize_result(result: Value) -> Result<ToolOutput, InvokeError> {
    if result.get("content").is_some() {
        return serde_json::from_value::<McpToolResult>(result)
            .map(ToolOutput::from)
            .map_err(|e| InvokeError::decode(format!("malformed tool result: {}", e)));
    }

    match result {
        Value::String(text) => Ok(ToolOutput::text(text)),
        Value::Null => Ok(ToolOutput::success(Vec::new())),
        other => Ok(ToolOutput::text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/mcp", addr)
    }

    fn rpc_result(result: Value) -> Value {
        json!({"jsonrpc": "2.0", "id": 1, "result": result})
    }

    #[test]
    fn test_request_envelope() {
        let request = InvokeRequest::new("http://localhost/mcp", "search", json!({"q": "rust"}));
        let body = serde_json::to_value(request.to_rpc()).unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "tools/call");
        assert_eq!(body["params"]["name"], "search");
        assert_eq!(body["params"]["arguments"]["q"], "rust");
    }

    #[test]
    fn test_decode_sse_takes_first_response() {
        let body = "event: endpoint\ndata: /mcp\n\n\
                    data: not json\n\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"first\"}\n\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"second\"}\n\n";
        let response = decode_response("text/event-stream; charset=utf-8", body).unwrap();
        assert_eq!(response.into_result().unwrap(), json!("first"));

        assert!(decode_response("text/event-stream", ": ping\n\n").is_err());
    }

    #[test]
    fn test_normalize_result_shapes() {
        let tool = normalize_result(json!({
            "content": [{"type": "text", "text": "ok"}],
            "isError": true
        }))
        .unwrap();
        assert!(tool.is_error);
        assert_eq!(tool.text_content(), "ok");

        assert_eq!(normalize_result(json!("plain")).unwrap().text_content(), "plain");
        assert_eq!(normalize_result(json!({"n": 1})).unwrap().text_content(), r#"{"n":1}"#);
        assert!(normalize_result(json!({"content": "nope"})).is_err());
    }

    #[tokio::test]
    async fn test_invoke_json_response_with_headers() {
        let app = Router::new().route(
            "/mcp",
            post(|headers: AxumHeaders, axum::Json(body): axum::Json<Value>| async move {
                let token = headers
                    .get("x-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let text = format!("{}:{}", token, body["params"]["arguments"]["q"]);
                axum::Json(rpc_result(json!({"content": [{"type": "text", "text": text}]})))
            }),
        );
        let endpoint = serve(app).await;

        let invoker = ToolInvoker::new().unwrap();
        let request = InvokeRequest::new(endpoint, "search", json!({"q": "rust"}))
            .with_header("x-api-key", "secret");
        let output = invoker.invoke(&request).await;

        assert!(!output.is_error);
        assert_eq!(output.text_content(), r#"secret:"rust""#);
    }

    #[tokio::test]
    async fn test_invoke_sse_response() {
        let app = Router::new().route(
            "/mcp",
            post(|| async {
                let frame = format!("event: message\ndata: {}\n\n", rpc_result(json!("streamed")));
                ([(header::CONTENT_TYPE, "text/event-stream")], frame)
            }),
        );
        let endpoint = serve(app).await;

        let invoker = ToolInvoker::new().unwrap();
        let output = invoker
            .invoke(&InvokeRequest::new(endpoint, "echo", json!({})))
            .await;
        assert_eq!(output.text_content(), "streamed");
    }

    #[tokio::test]
    async fn test_failures_become_flagged_outputs() {
        let app = Router::new()
            .route(
                "/mcp",
                post(|| async {
                    (StatusCode::INTERNAL_SERVER_ERROR, "overloaded").into_response()
                }),
            )
            .route(
                "/rpc-error",
                post(|| async {
                    axum::Json(json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "error": {"code": -32602, "message": "Unknown tool"}
                    }))
                }),
            );
        let endpoint = serve(app).await;
        let invoker = ToolInvoker::new().unwrap();

        let status = invoker
            .call(&InvokeRequest::new(endpoint.clone(), "x", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(status, InvokeError::Status { status: 500, .. }));

        let rpc_endpoint = endpoint.replace("/mcp", "/rpc-error");
        let output = invoker
            .invoke(&InvokeRequest::new(rpc_endpoint, "x", json!({})))
            .await;
        assert!(output.is_error);
        assert_eq!(output.error_code.as_deref(), Some(TOOL_INVOCATION_FAILED));
        assert!(output.text_content().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let app = Router::new().route(
            "/mcp",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                axum::Json(rpc_result(json!("late")))
            }),
        );
        let endpoint = serve(app).await;

        let invoker = ToolInvoker::with_timeout(Duration::from_millis(100)).unwrap();
        let err = invoker
            .call(&InvokeRequest::new(endpoint, "slow", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let invoker = ToolInvoker::new().unwrap();
        let output = invoker
            .invoke(&InvokeRequest::new("http://127.0.0.1:9/mcp", "x", json!({})))
            .await;
        assert!(output.is_error);
        assert_eq!(output.error_code.as_deref(), Some(TOOL_INVOCATION_FAILED));
    }
}
