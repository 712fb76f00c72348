//! Host lifecycle and dispatch behaviour with recording test bundles

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use nexus_plugins::{Bundle, HostError, Operation, PluginHost, ResourceInfo, ToolOutput};

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Deserialize, JsonSchema)]
struct WriteArgs {
    key: String,
    #[serde(default)]
    fail: bool,
    /// Index into this list; out of range panics inside the handler
    #[serde(default)]
    slots: Vec<String>,
}

/// Records every hook and handler call into a shared journal
struct RecordingBundle {
    label: &'static str,
    ops: Vec<&'static str>,
    journal: Journal,
    fail_load: bool,
    fail_hooks: bool,
}

impl RecordingBundle {
    fn new(label: &'static str, ops: Vec<&'static str>, journal: &Journal) -> Self {
        Self {
            label,
            ops,
            journal: journal.clone(),
            fail_load: false,
            fail_hooks: false,
        }
    }

    fn record(&self, event: &str) {
        self.journal.lock().push(format!("{}:{}", self.label, event));
    }
}

#[async_trait]
impl Bundle for RecordingBundle {
    fn operations(&self) -> Vec<Operation> {
        self.ops
            .iter()
            .map(|name| {
                let journal = self.journal.clone();
                let op_name = name.to_string();
                Operation::new(*name, "Records its key", move |args: WriteArgs| {
                    let journal = journal.clone();
                    let op_name = op_name.clone();
                    async move {
                        if args.fail {
                            anyhow::bail!("refused to write {}", args.key);
                        }
                        if args.key == "slot" {
                            let first = &args.slots[0];
                            journal.lock().push(format!("slot({first})"));
                        }
                        journal.lock().push(format!("{}({})", op_name, args.key));
                        Ok(ToolOutput::text(format!("wrote {}", args.key)))
                    }
                })
            })
            .collect()
    }

    fn resources(&self) -> Vec<ResourceInfo> {
        vec![ResourceInfo::new(
            format!("test://{}", self.label),
            self.label,
            "text/plain",
        )]
    }

    async fn read_resource(&self, uri: &str) -> anyhow::Result<Option<String>> {
        Ok((uri == format!("test://{}", self.label)).then(|| format!("resource of {}", self.label)))
    }

    fn usage_hint(&self, operation: &str) -> Option<String> {
        Some(format!("usage: {operation} {{\"key\": \"...\"}}"))
    }

    async fn on_load(&self) -> anyhow::Result<()> {
        self.record("load");
        if self.fail_load {
            anyhow::bail!("load refused");
        }
        Ok(())
    }

    async fn on_unload(&self) -> anyhow::Result<()> {
        self.record("unload");
        if self.fail_hooks {
            anyhow::bail!("unload refused");
        }
        Ok(())
    }

    async fn on_started(&self) -> anyhow::Result<()> {
        self.record("started");
        if self.fail_hooks {
            anyhow::bail!("started refused");
        }
        Ok(())
    }

    async fn on_stopping(&self) -> anyhow::Result<()> {
        self.record("stopping");
        Ok(())
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_duplicate_load_rejected() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host
        .load("a", Arc::new(RecordingBundle::new("a2", vec!["other"], &log)))
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::DuplicateBundle(ref n) if n == "a"));
    assert_eq!(host.list_operations().len(), 1);
    assert_eq!(*log.lock(), vec!["a:load"]);
}

#[tokio::test]
async fn test_unknown_operation_invokes_nothing() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host.call("erase", json!({ "key": "x" })).await.unwrap_err();
    assert_eq!(err.kind(), "operation_not_found");
    assert_eq!(*log.lock(), vec!["a:load"]);
}

#[tokio::test]
async fn test_invalid_arguments_precede_handler() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host.call("write", json!({ "key": 7 })).await.unwrap_err();
    match &err {
        HostError::InvalidArguments {
            operation,
            violations,
        } => {
            assert_eq!(operation, "write");
            assert_eq!(violations[0].path, "/key");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*log.lock(), vec!["a:load"]);

    let output = host.call("write", json!({ "key": "k1" })).await.unwrap();
    assert_eq!(output.as_text(), "wrote k1");
    assert_eq!(*log.lock(), vec!["a:load", "write(k1)"]);
}

#[tokio::test]
async fn test_handler_failure_carries_hint() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host
        .call("write", json!({ "key": "k", "fail": true }))
        .await
        .unwrap_err();
    let HostError::OperationFailed { message, .. } = err else {
        panic!("expected operation failure");
    };
    assert!(message.starts_with("refused to write k"));
    assert!(message.contains("usage: write"));
}

#[tokio::test]
async fn test_handler_panic_becomes_failure() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host
        .call("write", json!({ "key": "slot", "slots": [] }))
        .await
        .unwrap_err();
    let HostError::OperationFailed { operation, message } = err else {
        panic!("expected operation failure");
    };
    assert_eq!(operation, "write");
    assert!(message.starts_with("operation panicked: index out of bounds"));
    assert!(message.contains("usage: write"));

    // the host keeps serving after the panic
    let output = host
        .call("write", json!({ "key": "slot", "slots": ["s0"] }))
        .await
        .unwrap();
    assert_eq!(output.as_text(), "wrote slot");
    assert_eq!(*log.lock(), vec!["a:load", "slot(s0)", "write(slot)"]);
}

#[tokio::test]
async fn test_operation_conflict_leaves_no_trace() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["write"], &log)))
        .await
        .unwrap();

    let err = host
        .load("b", Arc::new(RecordingBundle::new("b", vec!["read", "write"], &log)))
        .await
        .unwrap_err();
    match err {
        HostError::OperationConflict {
            operation,
            bundle,
            existing,
        } => {
            assert_eq!(operation, "write");
            assert_eq!(bundle, "b");
            assert_eq!(existing, "a");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(!host.is_loaded("b"));
    assert!(matches!(
        host.call("read", json!({ "key": "x" })).await,
        Err(HostError::OperationNotFound(_))
    ));
    // load hook of the rejected bundle never ran
    assert_eq!(*log.lock(), vec!["a:load"]);
}

#[tokio::test]
async fn test_duplicate_operation_within_bundle() {
    let log = journal();
    let mut host = PluginHost::new();
    let err = host
        .load("a", Arc::new(RecordingBundle::new("a", vec!["x", "x"], &log)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "operation_conflict");
}

#[tokio::test]
async fn test_failed_load_hook_not_registered() {
    let log = journal();
    let mut host = PluginHost::new();
    let mut bundle = RecordingBundle::new("a", vec!["write"], &log);
    bundle.fail_load = true;

    let err = host.load("a", Arc::new(bundle)).await.unwrap_err();
    assert!(matches!(err, HostError::BundleLoad { ref message, .. } if message == "load refused"));
    assert!(host.list_operations().is_empty());
    assert!(host.bundle_names().is_empty());
}

#[tokio::test]
async fn test_unload_rebuilds_registry() {
    let log = journal();
    let mut host = PluginHost::new();
    let mut bundle = RecordingBundle::new("a", vec!["write"], &log);
    bundle.fail_hooks = true;
    host.load("a", Arc::new(bundle)).await.unwrap();

    host.unload("a").await.unwrap();
    assert!(host.list_operations().is_empty());
    assert!(matches!(
        host.unload("a").await,
        Err(HostError::UnknownBundle(_))
    ));
}

#[tokio::test]
async fn test_start_stop_ordering() {
    let log = journal();
    let mut host = PluginHost::new();
    let mut failing = RecordingBundle::new("b", vec!["b_op"], &log);
    failing.fail_hooks = true;

    host.start(vec![
        (
            "a".to_string(),
            Arc::new(RecordingBundle::new("a", vec!["a_op"], &log)) as Arc<dyn Bundle>,
        ),
        ("b".to_string(), Arc::new(failing) as Arc<dyn Bundle>),
    ])
    .await
    .unwrap();

    let names: Vec<_> = host.list_operations().into_iter().map(|o| o.name).collect();
    assert_eq!(names, vec!["a_op", "b_op"]);

    host.stop().await;
    assert!(host.bundle_names().is_empty());
    assert_eq!(
        *log.lock(),
        vec![
            "a:load", "b:load", "a:started", "b:started", "b:stopping", "a:stopping", "b:unload",
            "a:unload",
        ]
    );
}

#[tokio::test]
async fn test_resources_route_to_owner() {
    let log = journal();
    let mut host = PluginHost::new();
    host.load("a", Arc::new(RecordingBundle::new("a", vec!["a_op"], &log)))
        .await
        .unwrap();
    host.load("b", Arc::new(RecordingBundle::new("b", vec!["b_op"], &log)))
        .await
        .unwrap();

    let uris: Vec<_> = host.list_resources().into_iter().map(|r| r.uri).collect();
    assert_eq!(uris, vec!["test://a", "test://b"]);
    assert_eq!(host.read_resource("test://b").await.unwrap(), "resource of b");
    assert!(matches!(
        host.read_resource("test://c").await,
        Err(HostError::ResourceNotFound(_))
    ));
}
