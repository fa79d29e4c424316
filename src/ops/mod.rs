//! Operation framework for sharectl
//!
//! This module defines the named file-sharing operations and the shared types
//! that flow between the command runner and the service controller.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub mod controller;
pub mod runner;
pub mod status;

/// Windows optional features managed by this tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feature {
    Ftp,
    Smb,
    Nfs,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Ftp, Feature::Smb, Feature::Nfs];

    /// The feature token as it appears in `dism /online /Get-Features` output
    pub fn dism_token(&self) -> &'static str {
        match self {
            Feature::Ftp => "IIS-FTPServer",
            Feature::Smb => "SMB1Protocol",
            Feature::Nfs => "ServicesForNFS-Server",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::Ftp => "FTP",
            Feature::Smb => "SMB",
            Feature::Nfs => "NFS",
        }
    }
}

/// Enabled/disabled state of a single feature, derived from a feature listing.
/// Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub feature: Feature,
    pub enabled: bool,
}

const ENABLE_FTP_COMMANDS: &[&str] = &[
    "dism /online /enable-feature /featurename:IIS-WebServerRole /all",
    "dism /online /enable-feature /featurename:IIS-FTPServer /all",
];

// Disable in reverse order of enabling
const DISABLE_FTP_COMMANDS: &[&str] = &[
    "dism /online /disable-feature /featurename:IIS-FTPServer",
    "dism /online /disable-feature /featurename:IIS-WebServerRole",
];

const START_FTP_COMMANDS: &[&str] = &["net start ftpsvc"];
const STOP_FTP_COMMANDS: &[&str] = &["net stop ftpsvc"];

const START_SMB_COMMANDS: &[&str] =
    &["dism /online /enable-feature /featurename:SMB1Protocol /all"];
const STOP_SMB_COMMANDS: &[&str] = &["dism /online /disable-feature /featurename:SMB1Protocol"];

const START_NFS_COMMANDS: &[&str] =
    &["dism /online /enable-feature /featurename:ServicesForNFS-Server /all"];
const STOP_NFS_COMMANDS: &[&str] =
    &["dism /online /disable-feature /featurename:ServicesForNFS-Server"];

/// The IIS management console, launched fire-and-forget rather than waited on
pub const IIS_MANAGER_COMMAND: &str = "inetmgr";

/// Feature enumeration command used by the status check. `/English` forces
/// untranslated output so the parser sees stable tokens.
pub fn feature_listing_command(english_output: bool) -> &'static str {
    if english_output {
        "dism /online /Get-Features /English"
    } else {
        "dism /online /Get-Features"
    }
}

/// The supported high-level operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    EnableFtpFeature,
    DisableFtpFeature,
    StartFtp,
    StopFtp,
    StartIis,
    StartSmb,
    StopSmb,
    StartNfs,
    StopNfs,
    CheckStatus,
}

impl Operation {
    /// Subcommand spelling used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Operation::EnableFtpFeature => "enable-ftp",
            Operation::DisableFtpFeature => "disable-ftp",
            Operation::StartFtp => "start-ftp",
            Operation::StopFtp => "stop-ftp",
            Operation::StartIis => "start-iis",
            Operation::StartSmb => "start-smb",
            Operation::StopSmb => "stop-smb",
            Operation::StartNfs => "start-nfs",
            Operation::StopNfs => "stop-nfs",
            Operation::CheckStatus => "status",
        }
    }

    pub fn from_name(name: &str) -> Option<Operation> {
        let op = match name {
            "enable-ftp" => Operation::EnableFtpFeature,
            "disable-ftp" => Operation::DisableFtpFeature,
            "start-ftp" => Operation::StartFtp,
            "stop-ftp" => Operation::StopFtp,
            "start-iis" => Operation::StartIis,
            "start-smb" => Operation::StartSmb,
            "stop-smb" => Operation::StopSmb,
            "start-nfs" => Operation::StartNfs,
            "stop-nfs" => Operation::StopNfs,
            "status" => Operation::CheckStatus,
            _ => return None,
        };
        Some(op)
    }

    /// The fixed, ordered command list this operation runs. Empty for the
    /// operations that do not run a sequential pipeline (`StartIis` spawns
    /// detached, `CheckStatus` has its own enumeration path).
    pub fn commands(&self) -> &'static [&'static str] {
        match self {
            Operation::EnableFtpFeature => ENABLE_FTP_COMMANDS,
            Operation::DisableFtpFeature => DISABLE_FTP_COMMANDS,
            Operation::StartFtp => START_FTP_COMMANDS,
            Operation::StopFtp => STOP_FTP_COMMANDS,
            Operation::StartSmb => START_SMB_COMMANDS,
            Operation::StopSmb => STOP_SMB_COMMANDS,
            Operation::StartNfs => START_NFS_COMMANDS,
            Operation::StopNfs => STOP_NFS_COMMANDS,
            Operation::StartIis | Operation::CheckStatus => &[],
        }
    }

    /// Whether the operation changes system state and therefore requires an
    /// elevated process. Reading the feature list works unelevated.
    pub fn needs_elevation(&self) -> bool {
        !matches!(self, Operation::CheckStatus)
    }

    pub fn begin_message(&self) -> &'static str {
        match self {
            Operation::EnableFtpFeature => "Enabling IIS and FTP features...",
            Operation::DisableFtpFeature => "Disabling IIS and FTP features...",
            Operation::StartFtp => "Starting FTP server...",
            Operation::StopFtp => "Stopping FTP server...",
            Operation::StartIis => "Launching IIS Manager...",
            Operation::StartSmb => "Enabling SMB service...",
            Operation::StopSmb => "Disabling SMB service...",
            Operation::StartNfs => "Enabling NFS service...",
            Operation::StopNfs => "Disabling NFS service...",
            Operation::CheckStatus => "Checking feature status...",
        }
    }

    pub fn done_message(&self) -> &'static str {
        match self {
            Operation::EnableFtpFeature => "IIS and FTP features enabled",
            Operation::DisableFtpFeature => "IIS and FTP features disabled",
            Operation::StartFtp => "FTP server started",
            Operation::StopFtp => "FTP server stopped",
            Operation::StartIis => "IIS Manager launched",
            Operation::StartSmb => "SMB service enabled (a reboot may be required)",
            Operation::StopSmb => "SMB service disabled",
            Operation::StartNfs => "NFS service enabled",
            Operation::StopNfs => "NFS service disabled",
            Operation::CheckStatus => "Feature status check complete",
        }
    }
}

/// Captured outcome of a single shell command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// The command line as passed to the shell
    pub command: String,

    /// Process exit code (-1 if terminated without one)
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    /// Wall-clock execution time in milliseconds
    pub duration_ms: u64,
}

impl CommandResult {
    /// Success and failure are mutually exclusive and determined by the exit code
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Operation error
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("unsupported on this platform: {0}")]
    Unsupported(String),
}

impl OpError {
    /// Build the aggregated failure for a pipeline step that returned non-zero
    pub fn from_result(result: &CommandResult) -> Self {
        OpError::CommandFailed {
            command: result.command.clone(),
            exit_code: result.exit_code,
            stderr: result.stderr.trim_end().to_string(),
        }
    }
}

/// Destination for human-readable progress lines. Injected into the
/// controller so the core has no dependency on any particular front-end.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

/// Default sink that forwards lines to the `log` crate
pub struct LoggerSink;

impl LogSink for LoggerSink {
    fn append(&self, line: &str) {
        log::info!("{}", line);
    }
}

/// Sink that collects lines in memory. Appends are serialized by the mutex,
/// so concurrent operations may interleave but never corrupt the buffer.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
