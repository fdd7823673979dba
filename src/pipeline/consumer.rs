//! Consumer loop: own the ring buffer, ingest samples, serve dump requests.
//!
//! On startup the consumer sheds its elevated identity: `setuid` to the
//! configured unprivileged user (the hardware mapping already happened, so
//! root is no longer needed, and staying privileged would also prevent that
//! user's controller from signaling us), then `prctl(PR_SET_NAME)` so the
//! controller can find our pid by name. Both steps are fatal on failure.

use crate::data::dump::DumpWriter;
use crate::data::ring_buffer::SampleRing;
use crate::data::Sample;
use crate::error::{AcqError, AppResult};
use crate::pipeline::ControlMessage;
use std::ffi::CString;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Identity the consumer assumes before processing samples.
#[derive(Debug, Clone, Default)]
pub struct ConsumerIdentity {
    /// Uid to drop to, if any.
    pub uid: Option<u32>,
    /// Process name to expose, if any.
    pub process_name: Option<String>,
}

impl ConsumerIdentity {
    /// Identity from the loaded configuration section.
    pub fn from_config(config: &crate::config::ConsumerConfig) -> Self {
        Self {
            uid: config.uid,
            process_name: config.process_name.clone(),
        }
    }

    /// Keep the inherited uid and name; used by tests and mock runs.
    pub fn inherited() -> Self {
        Self::default()
    }

    /// Apply the identity. Order matters: drop privilege first so a
    /// failure never leaves a renamed-but-root process behind.
    #[allow(unsafe_code)]
    fn assume(&self) -> AppResult<()> {
        if let Some(uid) = self.uid {
            // SAFETY: plain syscall wrapper, no memory handed to the kernel.
            let rc = unsafe { libc::setuid(uid) };
            if rc != 0 {
                return Err(AcqError::PrivilegeDrop {
                    uid,
                    source: std::io::Error::last_os_error(),
                });
            }
            info!(uid, "dropped privileges");
        }

        if let Some(name) = &self.process_name {
            let cname = CString::new(name.as_str()).map_err(|_| AcqError::ProcessName {
                name: name.clone(),
                source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
            })?;
            // SAFETY: PR_SET_NAME reads at most 16 bytes from a valid
            // NUL-terminated buffer, which CString guarantees.
            let rc = unsafe { libc::prctl(libc::PR_SET_NAME, cname.as_ptr()) };
            if rc != 0 {
                return Err(AcqError::ProcessName {
                    name: name.clone(),
                    source: std::io::Error::last_os_error(),
                });
            }
            info!(name = %name, "process renamed for discoverability");
        }

        Ok(())
    }
}

/// Ingest samples into the ring and rewrite the dump file on request.
///
/// A closed sample channel is fatal; so is a closed control channel, since
/// it means the signal forwarder died and dumps can no longer be triggered.
/// Never returns `Ok`.
pub async fn run_consumer(
    mut samples: mpsc::Receiver<Sample>,
    mut control: mpsc::Receiver<ControlMessage>,
    ring: Arc<SampleRing>,
    dump: DumpWriter,
    identity: ConsumerIdentity,
) -> AppResult<()> {
    identity.assume()?;
    info!(
        pid = std::process::id(),
        dump_path = %dump.path().display(),
        "consumer ready; SIGUSR1 flushes the buffer"
    );

    loop {
        tokio::select! {
            sample = samples.recv() => {
                let sample = sample.ok_or(AcqError::ChannelClosed)?;
                ring.push(sample);
            }
            message = control.recv() => {
                match message.ok_or(AcqError::ChannelClosed)? {
                    ControlMessage::Flush => {
                        let snapshot = ring.snapshot_oldest_first();
                        dump.write_snapshot(&snapshot)?;
                        info!(samples = snapshot.len(), "buffer dumped");
                    }
                }
            }
        }
    }
}
