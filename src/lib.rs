//! Autoscaling providers for a compute-cluster scheduler.
//!
//! A provider picks the cheapest machine tier for a batch size, builds the
//! provisioning tool's arguments, validates its configuration once at
//! startup, and bootstraps freshly created nodes over a remote-execution
//! handle owned by the scheduler.

pub mod args;
pub mod bootstrap;
pub mod config;
pub mod create_args;
pub mod error;
pub mod host_provider;
pub mod node_name;
pub mod object_storage;
pub mod remote;
pub mod telemetry;
pub mod tier;
pub mod webhook;

pub use args::{AsrArgs, ProviderVariant};
pub use bootstrap::{Bootstrap, BootstrapStep};
pub use config::ConfigStore;
pub use create_args::{CreateArgsConfig, build_create_args};
pub use error::{Error, ErrorKind, Result};
pub use host_provider::{AutoscaleProvider, ProviderLimits, google::GoogleProvider};
pub use node_name::{IdGenerator, ShortIdGenerator};
pub use object_storage::{BucketCredentials, ObjectStorage, S3ObjectStorage};
pub use remote::{NodeHandle, RemoteCommand, RemoteScript};
pub use tier::{CapacityTier, MachineProfile, TierTable};
pub use webhook::{PublicAddress, PublicAddressResolver, RequestContext};

use tracing::{Instrument, error, info, info_span, instrument};
