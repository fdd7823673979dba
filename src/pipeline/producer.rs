//! Producer loop: poll the sample source, forward into the channel.

use crate::data::Sample;
use crate::error::{AcqError, AppResult};
use crate::hardware::SampleSource;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Poll `source` every `period` and send each sample into the channel.
///
/// The period is measured from loop start; per-sample hardware latency is
/// absorbed as drift rather than corrected. A sampling failure or a closed
/// channel is fatal; the channel is expected to stay open for the process
/// lifetime. Never returns `Ok`.
pub async fn run_producer(
    mut source: Box<dyn SampleSource>,
    samples: mpsc::Sender<Sample>,
    period: Duration,
) -> AppResult<()> {
    info!(period_ms = period.as_millis() as u64, "producer started");

    loop {
        let sample = source.sample()?;
        samples
            .send(sample)
            .await
            .map_err(|_| AcqError::ChannelClosed)?;
        tokio::time::sleep(period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockLightSensor;

    #[test]
    fn boxed_mock_sensor_is_a_valid_source() {
        // run_producer takes the source by box; make sure the trait object
        // wiring holds together
        let mut source: Box<dyn SampleSource> = Box::new(MockLightSensor::with_seed(1));
        let sample = source.sample().expect("mock sampling is infallible");
        assert!(sample.value() <= Sample::MAX_VALUE);
    }

    #[tokio::test]
    async fn producer_forwards_samples_in_order() {
        let source = Box::new(MockLightSensor::with_seed(9));
        let mut expected = MockLightSensor::with_seed(9);
        let (tx, mut rx) = mpsc::channel(8);

        let handle = tokio::spawn(run_producer(source, tx, Duration::ZERO));

        for _ in 0..32 {
            let got = rx.recv().await.expect("producer keeps sending");
            let want = expected.sample().expect("mock sampling is infallible");
            assert_eq!(got, want);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn closed_channel_is_fatal() {
        let source = Box::new(MockLightSensor::with_seed(2));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let err = run_producer(source, tx, Duration::ZERO)
            .await
            .expect_err("send into a closed channel must fail");
        assert!(matches!(err, AcqError::ChannelClosed));
    }
}
