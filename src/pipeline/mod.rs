//! The acquisition pipeline: producer, consumer, and the supervisor that
//! wires them together.
//!
//! Two tasks connected by exactly one bounded, FIFO, lossless channel. The
//! producer polls the sample source on a fixed period and sends each sample;
//! the consumer owns the ring buffer, ingests samples, and serves dump
//! requests. The external `SIGUSR1` trigger is forwarded into the consumer
//! through a separate control channel, so the dump itself runs on the
//! runtime with ordinary file I/O instead of inside an async-signal
//! handler.
//!
//! Neither loop ever returns `Ok`; the only exits are fatal errors, and the
//! supervisor surfaces the first of them.

pub mod consumer;
pub mod producer;

pub use consumer::{run_consumer, ConsumerIdentity};
pub use producer::run_producer;

use crate::config::Config;
use crate::data::dump::DumpWriter;
use crate::data::ring_buffer::SampleRing;
use crate::error::{AcqError, AppResult};
use crate::hardware::SampleSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Requests delivered to the consumer outside the sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Snapshot the ring buffer and rewrite the dump file.
    Flush,
}

/// Run the full pipeline until a fatal error.
///
/// Sequence: the caller has already mapped the hardware (the source holds
/// it); create the channels, subscribe to `SIGUSR1`, spawn both loops, and
/// wait. The consumer drops privileges on startup, so everything that
/// needs root has happened by the time it runs.
pub async fn run(config: &Config, source: Box<dyn SampleSource>) -> AppResult<()> {
    config.validate()?;

    let ring = Arc::new(SampleRing::new(config.buffer.capacity));
    let period = Duration::from_millis(config.acquisition.sample_period_ms);
    let (sample_tx, sample_rx) = mpsc::channel(config.acquisition.channel_depth);
    let (control_tx, control_rx) = mpsc::channel(1);

    let mut dump_signal = signal(SignalKind::user_defined1()).map_err(AcqError::Signal)?;
    tokio::spawn(async move {
        while dump_signal.recv().await.is_some() {
            // a dump already in flight makes a second queued request moot
            if let Err(err) = control_tx.try_send(ControlMessage::Flush) {
                if matches!(err, mpsc::error::TrySendError::Closed(_)) {
                    break;
                }
                warn!("dump already pending, ignoring SIGUSR1");
            }
        }
    });

    info!(
        capacity = config.buffer.capacity,
        period_ms = config.acquisition.sample_period_ms,
        dump_path = %config.dump.path.display(),
        "pipeline starting"
    );

    let producer = tokio::spawn(run_producer(source, sample_tx, period));
    let consumer = tokio::spawn(run_consumer(
        sample_rx,
        control_rx,
        Arc::clone(&ring),
        DumpWriter::new(config.dump.path.clone()),
        ConsumerIdentity::from_config(&config.consumer),
    ));

    // both loops are infinite; the first fatal error wins
    tokio::try_join!(flatten(producer), flatten(consumer))?;
    Ok(())
}

async fn flatten(handle: JoinHandle<AppResult<()>>) -> AppResult<()> {
    handle.await?
}
