use asr::*;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

struct ReachableBucket;

impl ObjectStorage for ReachableBucket {
    fn test_bucket<'a>(
        &'a self,
        _credentials: &'a BucketCredentials,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a + Send>> {
        Box::pin(async { Ok(()) })
    }
}

struct FixedId;

impl IdGenerator for FixedId {
    fn generate(&self) -> String {
        "Q7xk2".to_string()
    }
}

#[derive(Default)]
struct RecordingNode {
    memory_output: String,
    executed: Mutex<Vec<String>>,
}

impl NodeHandle for RecordingNode {
    fn execute<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + 'a + Send>> {
        self.executed.lock().unwrap().push(command.to_string());
        let output = if command.contains("/proc/meminfo") {
            self.memory_output.clone()
        } else {
            String::new()
        };
        Box::pin(async move { Ok(output) })
    }
}

fn provider(extra: serde_json::Value) -> GoogleProvider {
    let mut config = json!({
        "project": "odm-project",
        "zone": "europe-west1-b",
        "gcs": {
            "endpoint": "storage.googleapis.com",
            "bucket": "odm-results",
            "accessID": "GOOG1E",
            "secretKey": "secret"
        },
        "tags": ["clusterodm", "autoscale"]
    });
    if let (Some(config), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        config.extend(extra.clone());
    }

    GoogleProvider::new(config)
        .unwrap()
        .with_object_storage(Arc::new(ReachableBucket))
        .with_public_address(Arc::new(PublicAddressResolver::new(Some(
            "https://odm.example.com".to_string(),
        ))))
        .with_id_generator(Arc::new(FixedId))
}

#[tokio::test]
async fn scale_out_flow() {
    let provider = provider(json!({ "addSwap": 1 }));
    provider.initialize().await.unwrap();

    assert!(provider.can_handle(30));
    assert_eq!(provider.generate_hostname(30).unwrap(), "clusterodm-30-q7xk2");

    let args = provider.create_args(30).unwrap();
    assert_eq!(args[5], "n2-standard-2");
    assert_eq!(args[9], "100");
    assert_eq!(&args[args.len() - 2..], ["--google-tags", "clusterodm,autoscale"]);

    let node = RecordingNode {
        memory_output: "2048".to_string(),
        ..Default::default()
    };
    let request = RequestContext::new("http", "10.0.0.1:3000");
    provider
        .setup_machine(&request, "hooktoken", &node, "nodetoken")
        .await
        .unwrap();

    let executed = node.executed.lock().unwrap();
    assert_eq!(executed.len(), 3);
    assert!(executed[1].starts_with("sudo fallocate -l 2097152 /swapfile"));
    assert!(executed[2].contains("--webhook 'https://odm.example.com/commit?token=hooktoken'"));
    assert!(executed[2].ends_with("--token nodetoken"));
}

#[tokio::test]
async fn unparseable_memory_aborts_bootstrap() {
    let provider = provider(json!({ "addSwap": 0.5 }));
    provider.initialize().await.unwrap();

    let node = RecordingNode {
        memory_output: "MemTotal: unknown".to_string(),
        ..Default::default()
    };
    let request = RequestContext::new("http", "10.0.0.1:3000");
    let err = provider
        .setup_machine(&request, "hooktoken", &node, "nodetoken")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Bootstrap);
    assert!(err.to_string().contains("MemTotal: unknown"));
    let executed = node.executed.lock().unwrap();
    assert_eq!(executed.len(), 1);
    assert!(!executed.iter().any(|command| command.contains("docker")));
}

#[tokio::test]
async fn setup_before_initialize_is_rejected() {
    let provider = provider(json!({}));
    let node = RecordingNode::default();
    let request = RequestContext::new("http", "10.0.0.1:3000");

    let err = provider
        .setup_machine(&request, "hooktoken", &node, "nodetoken")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotInitialized));
    assert!(node.executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_tier_table_handles_nothing() {
    let provider = provider(json!({ "imageSizeMapping": [] }));
    provider.initialize().await.unwrap();

    assert!(!provider.can_handle(1));
    let err = provider.create_args(1).unwrap_err();
    assert!(!err.is_fatal());
}
