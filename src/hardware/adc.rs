//! MCP3002 protocol codec.
//!
//! One sample is two full-duplex byte exchanges. The first byte carries the
//! configuration nibble in its top bits: start bit, single-ended mode,
//! channel 0, MSB-first output. The second byte is all zeros and exists only
//! to supply the clock pulses that shift the remaining data bits out of the
//! converter. The two response bytes concatenate to a 16-bit word in which
//! bit 10 is the protocol's mandated null bit; the ten bits below it are the
//! reading.

use crate::data::Sample;
use crate::error::{AcqError, AppResult};
use crate::hardware::spi::SpiClock;
use crate::hardware::{AdcBus, SampleSource};

/// Start-of-communication bit.
const CFG_START: u8 = 0b1000;
/// Single-ended mode (referencing ground), not differential.
const CFG_SINGLE_ENDED: u8 = 0b0100;
/// Channel 0. Channel 1 would be `0b0010`; this codec only reads channel 0.
const CFG_CHANNEL_0: u8 = 0b0000;
/// MSB-first output.
const CFG_MSB_FIRST: u8 = 0b0001;

/// Configuration byte, nibble shifted into the transmit-first bit positions.
const CONFIG_BYTE: u8 = (CFG_START | CFG_SINGLE_ENDED | CFG_CHANNEL_0 | CFG_MSB_FIRST) << 3;

/// The converter clocks out a zero immediately before the 10 data bits.
const NULL_BIT: u16 = 1 << 10;

/// MCP3002 codec over any [`AdcBus`].
pub struct Mcp3002<B: AdcBus> {
    bus: B,
    clock: SpiClock,
}

impl<B: AdcBus> Mcp3002<B> {
    /// Codec at the standard 976 kHz exchange rate.
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, SpiClock::Khz976)
    }

    /// Codec at an explicit exchange rate.
    pub fn with_clock(bus: B, clock: SpiClock) -> Self {
        Self { bus, clock }
    }

    /// Give the bus back, e.g. to inspect a mock after a test.
    pub fn into_bus(self) -> B {
        self.bus
    }
}

impl<B: AdcBus + Send> SampleSource for Mcp3002<B> {
    /// Read one 10-bit value from the converter.
    ///
    /// Owns bus configuration per call: the exchange is bracketed by
    /// `begin`/`end` and assumes nothing about bus state between samples.
    /// A set null bit is [`AcqError::AdcNullBit`] and is fatal upstream; a
    /// corrupted sample must never reach the buffer.
    fn sample(&mut self) -> AppResult<Sample> {
        self.bus.begin(self.clock)?;
        let high = self.bus.transfer(CONFIG_BYTE)?;
        let low = self.bus.transfer(0x00)?;
        self.bus.end();

        let word = u16::from(high) << 8 | u16::from(low);
        if word & NULL_BIT != 0 {
            return Err(AcqError::AdcNullBit { word });
        }
        Ok(Sample::from_adc_word(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockAdcBus;

    #[test]
    fn config_byte_encodes_start_single_ended_channel0_msb_first() {
        assert_eq!(CONFIG_BYTE, 0x68);
    }

    #[test]
    fn sample_concatenates_both_response_bytes() {
        let bus = MockAdcBus::with_responses(&[0x02, 0xAB]);
        let mut adc = Mcp3002::new(bus);

        let sample = adc.sample().expect("valid response");
        assert_eq!(sample.value(), 0x02AB);
    }

    #[test]
    fn sample_sends_config_then_clock_filler() {
        let bus = MockAdcBus::with_responses(&[0x00, 0x7F]);
        let mut adc = Mcp3002::new(bus);
        adc.sample().expect("valid response");

        let bus = adc.into_bus();
        assert_eq!(bus.sent(), &[CONFIG_BYTE, 0x00]);
        assert_eq!(bus.begun_with(), Some(SpiClock::Khz976));
        assert!(bus.ended());
    }

    #[test]
    fn sample_masks_to_ten_bits() {
        // bits above the null bit are shift garbage and must be dropped
        let bus = MockAdcBus::with_responses(&[0xFB, 0xFF]);
        let mut adc = Mcp3002::new(bus);

        let sample = adc.sample().expect("valid response");
        assert_eq!(sample.value(), 0x03FF);
    }

    #[test]
    fn set_null_bit_is_a_fatal_invariant_violation() {
        let bus = MockAdcBus::with_responses(&[0x04, 0x00]);
        let mut adc = Mcp3002::new(bus);

        match adc.sample() {
            Err(AcqError::AdcNullBit { word }) => assert_eq!(word, 0x0400),
            other => panic!("expected AdcNullBit, got {other:?}"),
        }
    }

    #[test]
    fn samples_stay_in_ten_bit_range() {
        for responses in [[0x00, 0x00], [0x01, 0x55], [0x03, 0xFF], [0xF9, 0x23]] {
            let bus = MockAdcBus::with_responses(&responses);
            let mut adc = Mcp3002::new(bus);
            let sample = adc.sample().expect("null bit clear");
            assert!(sample.value() <= Sample::MAX_VALUE);
        }
    }
}
