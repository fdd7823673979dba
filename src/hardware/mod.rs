//! Hardware drivers for the board's memory-mapped peripherals.
//!
//! Three layers, leaves first:
//!
//! - [`mmio`]: maps one page of `/dev/mem` per peripheral and provides
//!   bounds-checked volatile register access. Heap-backed blocks exist for
//!   tests, so the GPIO and SPI logic runs without hardware or root.
//! - [`gpio`]: pin function selection and pin read/write against the GPIO
//!   register block.
//! - [`spi`] / [`adc`]: the SPI0 byte-transfer primitive and the MCP3002
//!   protocol codec built on it.
//!
//! [`mock`] provides a scripted bus for codec tests and a simulated light
//! sensor for running the full pipeline without hardware.

pub mod adc;
pub mod gpio;
pub mod mmio;
pub mod mock;
pub mod spi;

use crate::data::Sample;
use crate::error::AppResult;
use crate::hardware::spi::SpiClock;

/// Byte-oriented synchronous serial bus as the ADC codec sees it.
///
/// Implemented by the real [`spi::Spi0`] peripheral and by
/// [`mock::MockAdcBus`] for tests. The codec owns bus configuration per
/// sample: every exchange is bracketed by `begin`/`end` and does not assume
/// the clock or chip-select state persists between calls.
pub trait AdcBus {
    /// Configure the bus for an exchange at the given clock.
    fn begin(&mut self, clock: SpiClock) -> AppResult<()>;

    /// Full-duplex exchange of one byte. Blocks until the hardware reports
    /// completion.
    fn transfer(&mut self, out: u8) -> AppResult<u8>;

    /// Release the bus after an exchange.
    fn end(&mut self);
}

/// Anything the producer loop can poll for samples.
///
/// Implemented by [`adc::Mcp3002`] over the real bus and by
/// [`mock::MockLightSensor`] for hardware-free runs.
pub trait SampleSource: Send {
    /// Acquire one sample. Errors are fatal to the pipeline.
    fn sample(&mut self) -> AppResult<Sample>;
}
