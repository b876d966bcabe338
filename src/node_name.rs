use crate::*;
use rand::{Rng, distr::Alphanumeric};

const HOSTNAME_PREFIX: &str = "clusterodm";
const SHORT_ID_LEN: usize = 22;

pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random alphanumeric ids, roughly as wide as a short uuid.
#[derive(Debug, Clone, Default)]
pub struct ShortIdGenerator;

impl IdGenerator for ShortIdGenerator {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SHORT_ID_LEN)
            .map(char::from)
            .collect()
    }
}

/// `clusterodm-{batch_size}-{id}`, lowercased so it is a valid hostname.
pub fn generate_hostname(ids: &dyn IdGenerator, batch_size: u32) -> Result<String> {
    if batch_size == 0 {
        return Err(Error::InvalidBatchSize(batch_size));
    }
    Ok(format!("{HOSTNAME_PREFIX}-{batch_size}-{}", ids.generate()).to_lowercase())
}
