//! Mock hardware implementations.
//!
//! Two fakes with different jobs:
//!
//! - [`MockAdcBus`] replays scripted wire responses and records everything
//!   the codec did to the bus, for protocol tests (including faults the real
//!   converter should never produce, like a set null bit).
//! - [`MockLightSensor`] is a drop-in [`SampleSource`] that random-walks a
//!   plausible light level, so the whole pipeline runs on a machine with no
//!   ADC and no root.

use crate::data::Sample;
use crate::error::AppResult;
use crate::hardware::spi::SpiClock;
use crate::hardware::{AdcBus, SampleSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Scripted serial bus for codec tests.
#[derive(Debug, Default)]
pub struct MockAdcBus {
    responses: VecDeque<u8>,
    sent: Vec<u8>,
    begun_with: Option<SpiClock>,
    ended: bool,
}

impl MockAdcBus {
    /// Bus that will answer the next transfers with `responses`, then zeros.
    pub fn with_responses(responses: &[u8]) -> Self {
        Self {
            responses: responses.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Every byte the codec transmitted, in order.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// The clock the codec configured, if `begin` ran.
    pub fn begun_with(&self) -> Option<SpiClock> {
        self.begun_with
    }

    /// Whether the codec released the bus.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl AdcBus for MockAdcBus {
    fn begin(&mut self, clock: SpiClock) -> AppResult<()> {
        self.begun_with = Some(clock);
        self.ended = false;
        Ok(())
    }

    fn transfer(&mut self, out: u8) -> AppResult<u8> {
        self.sent.push(out);
        Ok(self.responses.pop_front().unwrap_or(0))
    }

    fn end(&mut self) {
        self.ended = true;
    }
}

/// Simulated ambient light level.
///
/// Random-walks inside the 10-bit range with occasional larger jumps, which
/// is enough texture to make dumps and plots look like a real room.
pub struct MockLightSensor {
    level: f64,
    rng: StdRng,
}

impl MockLightSensor {
    /// Sensor starting at mid-scale.
    pub fn new() -> Self {
        Self {
            level: f64::from(Sample::MAX_VALUE) / 2.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sensor for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            level: f64::from(Sample::MAX_VALUE) / 2.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for MockLightSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockLightSensor {
    fn sample(&mut self) -> AppResult<Sample> {
        let step = if self.rng.gen_bool(0.02) {
            // someone flipped a light switch
            self.rng.gen_range(-200.0..200.0)
        } else {
            self.rng.gen_range(-6.0..6.0)
        };
        self.level = (self.level + step).clamp(0.0, f64::from(Sample::MAX_VALUE));
        Ok(Sample::from_adc_word(self.level as u16))
    }
}
