pub mod google;

use crate::*;
use serde_json::Value;
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

/// One cloud backend the scheduler can scale out onto.
///
/// `initialize` must complete successfully once before anything that needs
/// validated configuration (`image_properties`, `create_args`,
/// `setup_machine`) is called.
pub trait AutoscaleProvider: Send + Sync {
    fn driver_name(&self) -> &'static str;

    fn initialize<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

    /// The cheapest machine profile able to handle `batch_size`.
    fn image_properties(&self, batch_size: u32) -> Result<MachineProfile>;

    fn can_handle(&self, batch_size: u32) -> bool;

    /// Arguments for the external provisioning tool.
    fn create_args(&self, batch_size: u32) -> Result<Vec<String>>;

    fn generate_hostname(&self, batch_size: u32) -> Result<String>;

    /// Bootstraps a node that is already reachable through `node`. A failure
    /// leaves the node half set up; tearing it down is up to the caller.
    fn setup_machine<'a>(
        &'a self,
        request: &'a RequestContext,
        token: &'a str,
        node: &'a dyn NodeHandle,
        node_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

    fn max_runtime(&self) -> Option<Duration>;

    fn max_upload_time(&self) -> Option<Duration>;

    fn machines_limit(&self) -> Option<u32>;

    fn create_retries(&self) -> u32;

    fn downloads_base_url(&self) -> Result<String>;
}

/// Scheduler-facing passthroughs. Negative values in the config mean
/// "unlimited".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLimits {
    pub max_runtime: Option<Duration>,
    pub max_upload_time: Option<Duration>,
    pub machines_limit: Option<u32>,
    pub create_retries: u32,
}

impl ProviderLimits {
    pub fn from_config(config: &ConfigStore) -> Result<Self> {
        Ok(Self {
            max_runtime: seconds(config, "maxRuntime")?,
            max_upload_time: seconds(config, "maxUploadTime")?,
            machines_limit: non_negative(config, "instanceLimit")?,
            create_retries: config.get_or("createRetries", 1)?,
        })
    }
}

fn seconds(config: &ConfigStore, key: &str) -> Result<Option<Duration>> {
    Ok(config
        .get::<i64>(key)?
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs as u64)))
}

fn non_negative(config: &ConfigStore, key: &str) -> Result<Option<u32>> {
    match config.get::<i64>(key)? {
        None => Ok(None),
        Some(value) if value < 0 => Ok(None),
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| Error::invalid_config(key, "out of range")),
    }
}

impl ProviderVariant {
    pub fn build(
        self,
        public_address: Arc<dyn PublicAddress>,
    ) -> Result<Arc<dyn AutoscaleProvider>> {
        match self {
            ProviderVariant::Google(user_config) => {
                let provider = google::GoogleProvider::new(user_config)?
                    .with_public_address(public_address);
                Ok(Arc::new(provider) as Arc<dyn AutoscaleProvider>)
            }
        }
    }
}
