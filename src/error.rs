//! Custom error types for the acquisition pipeline.
//!
//! All failure modes funnel into [`AcqError`]. The pipeline makes no attempt
//! to retry anything: setup failures (register mapping, privilege drop,
//! channel wiring) indicate misconfiguration or insufficient privilege, and
//! protocol invariant violations (the ADC null bit, a closed channel)
//! indicate a wiring or kernel-level fault. Both classes terminate the
//! process, each with a distinct exit code so a supervising service manager
//! can tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, AcqError>;

/// Errors that can occur in the acquisition pipeline.
#[derive(Error, Debug)]
pub enum AcqError {
    /// The `/dev/mem` window for a peripheral could not be mapped.
    /// Usually means the process is not running as root.
    #[error("failed to map {peripheral} registers from /dev/mem: {source}")]
    RegisterMap {
        peripheral: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A GPIO pin number outside `[0, 54)` was passed to the driver.
    #[error("invalid GPIO pin {pin}: valid pins are 0..{limit}")]
    InvalidPin { pin: u32, limit: u32 },

    /// The ADC's mandated null bit was set in a response word. The codec
    /// never returns a sample from such a response; a set null bit means
    /// the wiring or the SPI clock is wrong.
    #[error("ADC null bit set in response word {word:#06x}: check wiring and SPI clock")]
    AdcNullBit { word: u16 },

    /// The sample channel between producer and consumer closed. The channel
    /// is expected to stay open for the lifetime of the process.
    #[error("sample channel closed unexpectedly")]
    ChannelClosed,

    /// `setuid` to the configured unprivileged identity failed. Continuing
    /// privileged would be a security defect, so this is fatal.
    #[error("failed to drop privileges to uid {uid}: {source}")]
    PrivilegeDrop {
        uid: u32,
        #[source]
        source: std::io::Error,
    },

    /// `prctl(PR_SET_NAME)` failed, so an external controller would not be
    /// able to find the consumer by name.
    #[error("failed to set process name {name:?}: {source}")]
    ProcessName {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The SIGUSR1 stream could not be installed.
    #[error("failed to install dump signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Writing the dump file failed.
    #[error("failed to dump buffer to {path:?}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but holds a logically invalid value.
    #[error("configuration validation error: {0}")]
    Configuration(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline task panicked or was cancelled.
    #[error("pipeline task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl AcqError {
    /// Process exit code for this failure class.
    ///
    /// The daemon never exits 0 in normal operation (the loops are
    /// infinite), so every code here is nonzero and stable for operability.
    pub fn exit_code(&self) -> i32 {
        match self {
            AcqError::RegisterMap { .. } => 2,
            AcqError::ChannelClosed => 3,
            AcqError::PrivilegeDrop { .. } | AcqError::ProcessName { .. } => 4,
            AcqError::Signal(_) | AcqError::TaskJoin(_) => 5,
            AcqError::Config(_) | AcqError::Configuration(_) => 6,
            AcqError::AdcNullBit { .. } => 7,
            AcqError::InvalidPin { .. } | AcqError::Dump { .. } | AcqError::Io(_) => 1,
        }
    }
}
