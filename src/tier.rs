use crate::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;

/// A machine configuration deemed adequate for batches up to `max_batch_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityTier {
    #[serde(rename = "maxImages", alias = "maxBatchSize")]
    pub max_batch_size: u32,
    pub machine_type: String,
    #[serde(default)]
    pub preemptible: bool,
    #[serde(rename = "storage", alias = "storageGiB")]
    pub storage_gib: u32,
}

/// The tier picked for a particular batch size.
pub type MachineProfile = CapacityTier;

/// Capacity tiers sorted ascending by `max_batch_size`.
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    tiers: Vec<CapacityTier>,
}

impl TierTable {
    /// Parses and sorts a tier table. The sort is stable, so tiers sharing a
    /// `max_batch_size` keep their declaration order.
    pub fn from_config(key: &str, value: &Value) -> Result<Self> {
        let Value::Array(entries) = value else {
            return Err(Error::invalid_config(key, "array expected"));
        };

        let mut tiers = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let tier: CapacityTier = serde_json::from_value(entry.clone())
                    .map_err(|err| Error::invalid_config(format!("{key}[{index}]"), err.to_string()))?;
                if tier.max_batch_size == 0 {
                    return Err(Error::invalid_config(
                        format!("{key}[{index}].maxImages"),
                        "must be greater than 0",
                    ));
                }
                if tier.storage_gib == 0 {
                    return Err(Error::invalid_config(
                        format!("{key}[{index}].storage"),
                        "must be greater than 0",
                    ));
                }
                Ok(tier)
            })
            .collect::<Result<Vec<_>>>()?;

        tiers.sort_by_key(|tier| tier.max_batch_size);
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[CapacityTier] {
        &self.tiers
    }

    /// Cheapest tier whose `max_batch_size` covers `batch_size`.
    pub fn resolve(&self, batch_size: NonZeroU32) -> Option<&CapacityTier> {
        self.tiers
            .iter()
            .find(|tier| tier.max_batch_size >= batch_size.get())
    }

    pub fn can_handle(&self, batch_size: NonZeroU32) -> bool {
        self.resolve(batch_size).is_some()
    }
}
