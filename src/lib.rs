//! sharectl - Windows file-sharing service manager
//!
//! Toggles the FTP/IIS, SMB and NFS sharing roles by sequencing the
//! operating system's feature-management and service-control commands,
//! and aggregates per-feature status from the feature enumeration.

pub mod config;
pub mod elevation;
pub mod ops;

pub use config::Config;
pub use ops::controller::ServiceController;
pub use ops::runner::CommandRunner;
pub use ops::{
    CommandResult, Feature, FeatureStatus, LogSink, LoggerSink, MemorySink, OpError, Operation,
};
