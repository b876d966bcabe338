//! Dry run for a providers file: initializes every provider and prints what
//! would be handed to the provisioning tool for a batch size.
//!
//! ```text
//! ASR_CONFIG_PATH=asr-providers.json asr 42
//! ```

mod params;

use asr::telemetry;
use color_eyre::eyre::{Result, eyre};
use params::AsrParams;
use tracing::*;

fn main() -> Result<()> {
    color_eyre::install()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let telemetry_providers = telemetry::setup()?;
        let result = dry_run().await;
        telemetry::on_shutdown(telemetry_providers)?;
        result
    })
}

async fn dry_run() -> Result<()> {
    let batch_size: u32 = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: asr <batch-size>"))?
        .parse()?;

    let params = AsrParams::load()?;
    if params.providers.is_empty() {
        warn!("No providers configured");
    }

    for provider in &params.providers {
        let driver = provider.driver_name();
        provider.initialize().await?;

        if !provider.can_handle(batch_size) {
            info!(driver, batch_size, "Provider cannot handle batch size");
            continue;
        }

        let profile = provider.image_properties(batch_size)?;
        let hostname = provider.generate_hostname(batch_size)?;
        let args = provider.create_args(batch_size)?;
        info!(driver, %hostname, machine_type = %profile.machine_type, "Resolved machine");
        println!("{driver}\t{hostname}\t{}", args.join(" "));
    }

    Ok(())
}
