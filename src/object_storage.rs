use crate::*;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
};
use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin};

const PROBE_KEY: &str = "asr-connectivity-probe.txt";
const DEFAULT_REGION: &str = "us-east-1";

/// Object storage the workers upload results to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCredentials {
    #[serde(rename = "accessID")]
    pub access_key: String,
    #[serde(rename = "secretKey")]
    pub secret_key: String,
    pub endpoint: String,
    pub bucket: String,
}

pub trait ObjectStorage: Send + Sync {
    /// Succeeds only if `bucket` is writable with the given credentials.
    fn test_bucket<'a>(
        &'a self,
        credentials: &'a BucketCredentials,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a + Send>>;
}

/// S3-compatible storage reached through `aws-sdk-s3`.
#[derive(Debug, Default, Clone)]
pub struct S3ObjectStorage;

impl S3ObjectStorage {
    async fn client(credentials: &BucketCredentials) -> Client {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(Credentials::new(
                &credentials.access_key,
                &credentials.secret_key,
                None,
                None,
                "asr",
            ))
            .region(Region::new(DEFAULT_REGION))
            .endpoint_url(endpoint_url(&credentials.endpoint))
            .load()
            .await;

        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        Client::from_conf(config)
    }
}

impl ObjectStorage for S3ObjectStorage {
    fn test_bucket<'a>(
        &'a self,
        credentials: &'a BucketCredentials,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a + Send>> {
        Box::pin(async move {
            let client = Self::client(credentials).await;
            probe_bucket(&client, &credentials.bucket).await
        })
    }
}

/// Writes then removes a small object.
#[instrument(skip(client))]
pub async fn probe_bucket(client: &Client, bucket: &str) -> anyhow::Result<()> {
    client
        .put_object()
        .bucket(bucket)
        .key(PROBE_KEY)
        .body(ByteStream::from_static(b""))
        .send()
        .await?;

    client
        .delete_object()
        .bucket(bucket)
        .key(PROBE_KEY)
        .send()
        .await?;

    info!("Can write to bucket");
    Ok(())
}

/// Endpoints are usually configured as bare hosts (`storage.googleapis.com`).
pub fn endpoint_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}
