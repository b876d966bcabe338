use super::*;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

pub const DRIVER_NAME: &str = "google";

const REQUIRED_KEYS: &[&str] = &[
    "project",
    "zone",
    "gcs.endpoint",
    "gcs.bucket",
    "gcs.accessID",
    "gcs.secretKey",
];
const TIERS_KEY: &str = "imageSizeMapping";
const SSH_KEY_PATH: &str = "sshKey.path";
const WEBHOOK_PATH: &str = "/commit";

fn defaults() -> Value {
    json!({
        "project": "CHANGEME!",
        "zone": "CHANGEME!",
        "gcs": {
            "endpoint": "CHANGEME!",
            "bucket": "CHANGEME!",
            "accessID": "CHANGEME!",
            "secretKey": "CHANGEME!"
        },
        "machineImage": "ubuntu-os-cloud/global/images/ubuntu-2010-groovy-v20210325",
        "maxRuntime": -1,
        "maxUploadTime": -1,
        "instanceLimit": -1,
        "createRetries": 1,
        "tags": ["clusterodm"],
        "imageSizeMapping": [
            {"maxImages": 5, "machineType": "n1-standard-1", "preemptible": true, "storage": 10},
            {"maxImages": 50, "machineType": "n2-standard-2", "preemptible": true, "storage": 100}
        ],
        "dockerImage": "opendronemap/nodeodm"
    })
}

/// Everything `initialize` checked, published once.
#[derive(Debug)]
struct Validated {
    tiers: TierTable,
    create_args: CreateArgsConfig,
    bootstrap: Bootstrap,
}

/// Google Compute Engine machines with results stored in Google Cloud
/// Storage through its S3-compatible API.
pub struct GoogleProvider {
    config: ConfigStore,
    limits: ProviderLimits,
    object_storage: Arc<dyn ObjectStorage>,
    public_address: Arc<dyn PublicAddress>,
    ids: Arc<dyn IdGenerator>,
    initialize_started: AtomicBool,
    validated: OnceLock<Validated>,
}

impl GoogleProvider {
    pub fn new(user_config: Value) -> Result<Self> {
        let config = ConfigStore::new(defaults(), user_config);
        let limits = ProviderLimits::from_config(&config)?;
        Ok(Self {
            config,
            limits,
            object_storage: Arc::new(S3ObjectStorage),
            public_address: Arc::new(PublicAddressResolver::default()),
            ids: Arc::new(ShortIdGenerator),
            initialize_started: AtomicBool::new(false),
            validated: OnceLock::new(),
        })
    }

    pub fn with_object_storage(mut self, object_storage: Arc<dyn ObjectStorage>) -> Self {
        self.object_storage = object_storage;
        self
    }

    pub fn with_public_address(mut self, public_address: Arc<dyn PublicAddress>) -> Self {
        self.public_address = public_address;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    fn validated(&self) -> Result<&Validated> {
        self.validated.get().ok_or(Error::NotInitialized)
    }

    async fn validate(&self) -> Result<Validated> {
        self.config.validate_required_keys(REQUIRED_KEYS)?;
        let project: String = self.config.require("project")?;
        let zone: String = self.config.require("zone")?;
        let storage: BucketCredentials = self.config.require("gcs")?;

        let probe = self.object_storage.test_bucket(&storage).await;
        telemetry::send_bucket_probe_status(DRIVER_NAME, probe.is_ok());
        probe.map_err(|source| Error::Connectivity {
            bucket: storage.bucket.clone(),
            source,
        })?;

        let tiers = match self.config.lookup(TIERS_KEY) {
            None | Some(Value::Null) => TierTable::default(),
            Some(value) => TierTable::from_config(TIERS_KEY, value)?,
        };

        let ssh_key_path: String = self.config.get_or(SSH_KEY_PATH, String::new())?;
        if !ssh_key_path.is_empty() {
            info!("Using existing SSH key");
            if !tokio::fs::try_exists(&ssh_key_path).await.unwrap_or(false) {
                return Err(Error::invalid_config(SSH_KEY_PATH, "file does not exist"));
            }
        }

        let swap_ratio: Option<f64> = self.config.get("addSwap")?;
        if swap_ratio.is_some_and(|ratio| !ratio.is_finite() || ratio < 0.0) {
            return Err(Error::invalid_config("addSwap", "must be a non-negative number"));
        }

        Ok(Validated {
            tiers,
            create_args: CreateArgsConfig {
                project,
                zone,
                machine_image: self.config.require("machineImage")?,
                tags: self.config.get_or("tags", Vec::new())?,
            },
            bootstrap: Bootstrap {
                docker_image: self.config.require("dockerImage")?,
                storage,
                swap_ratio,
            },
        })
    }
}

impl AutoscaleProvider for GoogleProvider {
    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn initialize<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>> {
        Box::pin(
            async move {
                if self.initialize_started.swap(true, Ordering::SeqCst) {
                    return Err(Error::AlreadyInitialized);
                }

                let validated = match self.validate().await {
                    Ok(validated) => validated,
                    Err(err) => {
                        error!(%err, "Provider initialization failed");
                        return Err(err);
                    }
                };
                info!(tiers = validated.tiers.tiers().len(), "Provider initialized");

                self.validated
                    .set(validated)
                    .map_err(|_| Error::AlreadyInitialized)
            }
            .instrument(info_span!("initialize", driver = DRIVER_NAME)),
        )
    }

    fn image_properties(&self, batch_size: u32) -> Result<MachineProfile> {
        let batch = NonZeroU32::new(batch_size).ok_or(Error::InvalidBatchSize(batch_size))?;
        match self.validated()?.tiers.resolve(batch) {
            Some(profile) => Ok(profile.clone()),
            None => {
                telemetry::send_capacity_miss(DRIVER_NAME, batch_size);
                Err(Error::NoCapacity(batch_size))
            }
        }
    }

    fn can_handle(&self, batch_size: u32) -> bool {
        match (NonZeroU32::new(batch_size), self.validated.get()) {
            (Some(batch), Some(validated)) => validated.tiers.can_handle(batch),
            _ => false,
        }
    }

    fn create_args(&self, batch_size: u32) -> Result<Vec<String>> {
        let profile = self.image_properties(batch_size)?;
        build_create_args(&self.validated()?.create_args, &profile)
    }

    fn generate_hostname(&self, batch_size: u32) -> Result<String> {
        node_name::generate_hostname(self.ids.as_ref(), batch_size)
    }

    fn setup_machine<'a>(
        &'a self,
        request: &'a RequestContext,
        token: &'a str,
        node: &'a dyn NodeHandle,
        node_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>> {
        Box::pin(async move {
            let validated = self.validated()?;
            let webhook = self
                .public_address
                .public_address_path(WEBHOOK_PATH, request, token);
            validated.bootstrap.run(node, &webhook, node_token).await
        })
    }

    fn max_runtime(&self) -> Option<Duration> {
        self.limits.max_runtime
    }

    fn max_upload_time(&self) -> Option<Duration> {
        self.limits.max_upload_time
    }

    fn machines_limit(&self) -> Option<u32> {
        self.limits.machines_limit
    }

    fn create_retries(&self) -> u32 {
        self.limits.create_retries
    }

    fn downloads_base_url(&self) -> Result<String> {
        let bucket: String = self.config.require("gcs.bucket")?;
        let endpoint: String = self.config.require("gcs.endpoint")?;
        Ok(format!("https://{bucket}.{endpoint}"))
    }
}
