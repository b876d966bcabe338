use asr::{AsrArgs, AutoscaleProvider, PublicAddress, PublicAddressResolver};
use color_eyre::{Result, eyre::WrapErr};
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "asr-providers.json";

pub struct AsrParams {
    pub providers: Vec<Arc<dyn AutoscaleProvider>>,
}

impl AsrParams {
    pub fn load() -> Result<Self> {
        let path = std::env::var("ASR_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let content = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read providers file at {path}"))?;
        let args: AsrArgs = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse providers file at {path}"))?;

        let public_address: Arc<dyn PublicAddress> =
            Arc::new(PublicAddressResolver::new(args.public_address));

        let providers = args
            .providers
            .into_iter()
            .map(|variant| variant.build(public_address.clone()))
            .collect::<asr::Result<Vec<_>>>()?;
        info!(count = providers.len(), %path, "Loaded providers");

        Ok(AsrParams { providers })
    }
}
