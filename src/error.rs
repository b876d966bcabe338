use crate::bootstrap::BootstrapStep;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing \"{0}\" from config")]
    MissingConfigKey(String),
    #[error("Invalid config key {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
    #[error("Cannot connect to bucket {bucket}. Check your object storage configuration")]
    Connectivity {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("No capacity tier can handle batch size {0}")]
    NoCapacity(u32),
    #[error("Invalid batch size {0}")]
    InvalidBatchSize(u32),
    #[error("Invalid machine profile: {0}")]
    InvalidProfile(String),
    #[error("Bootstrap failed at {step}: {output}")]
    Bootstrap { step: BootstrapStep, output: String },
    #[error("Provider is already initialized")]
    AlreadyInitialized,
    #[error("Provider is not initialized")]
    NotInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connectivity,
    Capacity,
    ProvisioningBuild,
    Bootstrap,
    Lifecycle,
}

impl Error {
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingConfigKey(_) | Error::InvalidConfig { .. } => ErrorKind::Configuration,
            Error::Connectivity { .. } => ErrorKind::Connectivity,
            Error::NoCapacity(_) | Error::InvalidBatchSize(_) => ErrorKind::Capacity,
            Error::InvalidProfile(_) => ErrorKind::ProvisioningBuild,
            Error::Bootstrap { .. } => ErrorKind::Bootstrap,
            Error::AlreadyInitialized | Error::NotInitialized => ErrorKind::Lifecycle,
        }
    }

    /// Capacity errors mean "try another provider or defer", everything else
    /// leaves the provider or the node unusable.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_errors_are_not_fatal() {
        assert!(!Error::NoCapacity(100).is_fatal());
        assert!(!Error::InvalidBatchSize(0).is_fatal());
        assert!(Error::MissingConfigKey("project".to_string()).is_fatal());
    }

    #[test]
    fn test_connectivity_is_distinct_from_configuration() {
        let connectivity = Error::Connectivity {
            bucket: "bucket".to_string(),
            source: anyhow::anyhow!("403"),
        };
        assert_eq!(connectivity.kind(), ErrorKind::Connectivity);
        assert_eq!(
            Error::invalid_config("tags", "array expected").kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_missing_key_message_names_path() {
        let err = Error::MissingConfigKey("gcs.bucket".to_string());
        assert_eq!(err.to_string(), "Missing \"gcs.bucket\" from config");
    }
}
