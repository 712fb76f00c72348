//! Operation records and argument contracts

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::FieldViolation;

type Invoker = dyn Fn(Value) -> Result<BoxFuture<'static, anyhow::Result<ToolOutput>>, Vec<FieldViolation>>
    + Send
    + Sync;

/// A named operation contributed by a bundle.
///
/// Built from a typed argument struct and an async handler. The contract is
/// the struct's JSON Schema; raw arguments are validated against it and then
/// deserialized before the handler is called.
#[derive(Clone)]
pub struct Operation {
    name: String,
    description: String,
    contract: Value,
    contract_error: Option<String>,
    invoker: Arc<Invoker>,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

impl Operation {
    pub fn new<A, F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolOutput>> + Send + 'static,
    {
        let name = name.into();
        let contract = serde_json::to_value(schemars::schema_for!(A)).unwrap_or(Value::Null);

        let validator = match jsonschema::validator_for(&contract) {
            Ok(validator) => Ok(Arc::new(validator)),
            Err(e) => Err(e.to_string()),
        };
        let contract_error = validator.as_ref().err().cloned();

        let invoker = move |raw: Value| -> Result<BoxFuture<'static, anyhow::Result<ToolOutput>>, Vec<FieldViolation>> {
            let validator = validator.as_ref().map_err(|message| {
                vec![FieldViolation {
                    path: String::new(),
                    message: message.clone(),
                }]
            })?;

            let violations: Vec<FieldViolation> = validator
                .iter_errors(&raw)
                .map(|error| FieldViolation {
                    path: error.instance_path.to_string(),
                    message: error.to_string(),
                })
                .collect();
            if !violations.is_empty() {
                return Err(violations);
            }

            let args: A = serde_json::from_value(raw).map_err(|e| {
                vec![FieldViolation {
                    path: String::new(),
                    message: e.to_string(),
                }]
            })?;

            Ok(Box::pin(handler(args)))
        };

        Self {
            name,
            description: description.into(),
            contract,
            contract_error,
            invoker: Arc::new(invoker),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema of the arguments
    pub fn contract(&self) -> &Value {
        &self.contract
    }

    /// Set when the contract failed to compile
    pub fn contract_error(&self) -> Option<&str> {
        self.contract_error.as_deref()
    }

    /// Validate `raw` and, if it conforms, return the handler's future.
    ///
    /// Nothing runs until the returned future is polled.
    pub fn invoke(
        &self,
        raw: Value,
    ) -> Result<BoxFuture<'static, anyhow::Result<ToolOutput>>, Vec<FieldViolation>> {
        (self.invoker)(raw)
    }

    /// Serializable description for listings
    pub fn info(&self) -> OperationInfo {
        OperationInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.contract.clone(),
        }
    }
}

/// What `tools/list` reports for each operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One piece of operation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// Result of a successful operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<Content>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
        }
    }

    /// Pretty-printed JSON as text
    pub fn json<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    /// All text content joined with newlines
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Content::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize, JsonSchema)]
    struct GreetArgs {
        name: String,
        #[serde(default = "default_times")]
        times: u32,
        #[serde(default)]
        shout: bool,
    }

    fn default_times() -> u32 {
        1
    }

    fn greet() -> Operation {
        Operation::new("greet", "Say hello", |args: GreetArgs| async move {
            let mut line = format!("hello {}", args.name);
            if args.shout {
                line = line.to_uppercase();
            }
            Ok(ToolOutput::text(vec![line; args.times as usize].join(" ")))
        })
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let output = greet().invoke(json!({ "name": "ada" })).unwrap().await.unwrap();
        assert_eq!(output.as_text(), "hello ada");

        let output = greet()
            .invoke(json!({ "name": "ada", "times": 2, "shout": true }))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(output.as_text(), "HELLO ADA HELLO ADA");
    }

    #[test]
    fn test_violations_reported_per_field() {
        let violations = greet()
            .invoke(json!({ "times": "many" }))
            .err()
            .unwrap();

        assert!(violations.iter().any(|v| v.path.is_empty() && v.message.contains("name")));
        assert!(violations.iter().any(|v| v.path == "/times"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(greet().invoke(json!("ada")).is_err());
        assert!(greet().invoke(Value::Null).is_err());
    }

    #[test]
    fn test_handler_not_called_on_violation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let op = Operation::new("count", "Count calls", move |_args: GreetArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(ToolOutput::text("ok")) }
        });

        assert!(op.invoke(json!({})).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_info_exposes_contract() {
        let info = greet().info();
        assert_eq!(info.name, "greet");
        assert_eq!(info.input_schema["required"], json!(["name"]));
        assert!(greet().contract_error().is_none());

        let serialized = serde_json::to_value(&info).unwrap();
        assert!(serialized.get("inputSchema").is_some());
    }

    #[test]
    fn test_output_serialization() {
        let output = ToolOutput::text("done");
        assert_eq!(
            serde_json::to_value(output).unwrap(),
            json!({ "content": [{ "type": "text", "text": "done" }] })
        );
    }
}
