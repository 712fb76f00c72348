//! Line-delimited JSON transport
//!
//! Each input line is one request:
//!
//! ```text
//! {"id": 1, "method": "tools/list"}
//! {"id": 2, "method": "tools/call", "params": {"name": "read_document", "arguments": {"path": "a.md"}}}
//! {"id": 3, "method": "resources/list"}
//! {"id": 4, "method": "resources/read", "params": {"uri": "nexus://tags"}}
//! ```
//!
//! Each request gets exactly one response line. The `id`, when present, is
//! echoed back. Failures are reported as `{"error": {"kind", "message",
//! "violations"?}}` and never end the loop.

use nexus_plugins::{HostError, PluginHost};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: String,
}

/// Transport-level failure, reported with the same shape as host errors
struct Failure {
    kind: &'static str,
    message: String,
    violations: Option<Value>,
}

impl Failure {
    fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            violations: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut error = json!({ "kind": self.kind, "message": self.message });
        if let Some(violations) = &self.violations {
            error["violations"] = violations.clone();
        }
        json!({ "error": error })
    }
}

impl From<HostError> for Failure {
    fn from(error: HostError) -> Self {
        let violations = error
            .violations()
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null));
        Self {
            kind: error.kind(),
            message: error.to_string(),
            violations,
        }
    }
}

/// Handle one request line and build its response object
pub async fn handle_line(host: &PluginHost, line: &str) -> Value {
    let (id, outcome) = match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            let id = request.id.clone();
            (id, dispatch(host, request).await)
        }
        Err(e) => {
            // Salvage the id so the caller can still correlate the error
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").cloned());
            (id, Err(Failure::new("parse_error", format!("Invalid request: {e}"))))
        }
    };

    let body = match outcome {
        Ok(value) => value,
        Err(failure) => failure.to_value(),
    };

    let mut response = Map::new();
    if let Some(id) = id {
        response.insert("id".to_string(), id);
    }
    if let Value::Object(fields) = body {
        response.extend(fields);
    }
    Value::Object(response)
}

async fn dispatch(host: &PluginHost, request: Request) -> Result<Value, Failure> {
    debug!("Handling {}", request.method);
    match request.method.as_str() {
        "tools/list" => Ok(json!({ "tools": host.list_operations() })),
        "tools/call" => {
            let params: CallParams = params(request.params)?;
            let arguments = match params.arguments {
                Value::Null => Value::Object(Map::new()),
                other => other,
            };
            let output = host.call(&params.name, arguments).await?;
            serde_json::to_value(output)
                .map_err(|e| Failure::new("internal_error", e.to_string()))
        }
        "resources/list" => Ok(json!({ "resources": host.list_resources() })),
        "resources/read" => {
            let params: ReadParams = params(request.params)?;
            let text = host.read_resource(&params.uri).await?;
            Ok(json!({ "contents": [{ "uri": params.uri, "text": text }] }))
        }
        other => Err(Failure::new(
            "unknown_method",
            format!("Unknown method: {other}"),
        )),
    }
}

fn params<T: serde::de::DeserializeOwned>(raw: Value) -> Result<T, Failure> {
    serde_json::from_value(raw).map_err(|e| Failure::new("invalid_params", e.to_string()))
}

/// Serve requests from `reader` until EOF, then stop the host
pub async fn serve<R, W>(host: &mut PluginHost, reader: R, writer: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Serving {} operations on stdio", host.list_operations().len());

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(host, &line).await;
        if let Some(error) = response.get("error") {
            warn!("Request failed: {}", error);
        }

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    info!("Input closed, stopping");
    host.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_plugins::{Bundle, Operation, ToolOutput};
    use std::sync::Arc;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct EchoArgs {
        word: String,
    }

    struct Echo;

    #[async_trait::async_trait]
    impl Bundle for Echo {
        fn operations(&self) -> Vec<Operation> {
            vec![Operation::new("echo", "Echo a word", |args: EchoArgs| async move {
                Ok(ToolOutput::text(args.word))
            })]
        }
    }

    async fn host() -> PluginHost {
        let mut host = PluginHost::new();
        host.load("echo", Arc::new(Echo)).await.unwrap();
        host
    }

    #[tokio::test]
    async fn test_call_echoes_id() {
        let host = host().await;
        let response = handle_line(
            &host,
            r#"{"id": 7, "method": "tools/call", "params": {"name": "echo", "arguments": {"word": "hi"}}}"#,
        )
        .await;
        assert_eq!(
            response,
            json!({ "id": 7, "content": [{ "type": "text", "text": "hi" }] })
        );
    }

    #[tokio::test]
    async fn test_violations_reported() {
        let host = host().await;
        let response = handle_line(
            &host,
            r#"{"method": "tools/call", "params": {"name": "echo", "arguments": {}}}"#,
        )
        .await;
        assert_eq!(response["error"]["kind"], json!("invalid_arguments"));
        assert!(response["error"]["violations"].as_array().is_some());
        assert!(response.get("id").is_none());
    }

    #[tokio::test]
    async fn test_malformed_and_unknown() {
        let host = host().await;

        let response = handle_line(&host, "{not json").await;
        assert_eq!(response["error"]["kind"], json!("parse_error"));

        let response = handle_line(&host, r#"{"id": "x", "method": "tools/destroy"}"#).await;
        assert_eq!(response["id"], json!("x"));
        assert_eq!(response["error"]["kind"], json!("unknown_method"));

        let response = handle_line(&host, r#"{"id": 1, "method": "resources/read"}"#).await;
        assert_eq!(response["error"]["kind"], json!("invalid_params"));
    }
}
