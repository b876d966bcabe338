use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contents of the providers file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrArgs {
    /// Overrides the address workers use to reach the scheduler's webhook.
    #[serde(default)]
    pub public_address: Option<String>,
    pub providers: Vec<ProviderVariant>,
}

/// One configured provider. The remaining keys of the entry are merged over
/// the driver's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderVariant {
    Google(Value),
}
