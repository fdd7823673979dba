//! SPI0 master driver.
//!
//! Byte-oriented full-duplex transfers against the SPI0 register block.
//! `begin` hands pins 7..=11 to the peripheral (Alt0), programs the clock
//! divider and raises TA (transfer active); `transfer` pushes one byte
//! through the FIFO and blocks until the hardware reports DONE; `end` drops
//! TA so the chip select deasserts. The codec above re-runs `begin` for
//! every sample, so nothing here assumes state persists between exchanges.

use crate::error::AppResult;
use crate::hardware::gpio::{Gpio, PinFunction};
use crate::hardware::mmio::{RegisterBlock, SPI0_BASE};
use crate::hardware::AdcBus;
use serde::{Deserialize, Serialize};

/// Word offset of the control/status register.
const SPI_CS: usize = 0;
/// Word offset of the TX/RX FIFO register.
const SPI_FIFO: usize = 1;
/// Word offset of the clock divider register.
const SPI_CLK: usize = 2;

/// Clear the RX FIFO.
const CS_CLEAR_RX: u32 = 1 << 4;
/// Clear the TX FIFO.
const CS_CLEAR_TX: u32 = 1 << 5;
/// Transfer active: chip select asserted, clock running while data moves.
const CS_TA: u32 = 1 << 7;
/// Transfer done: TX FIFO drained and the last clock finished.
const CS_DONE: u32 = 1 << 16;
/// TX FIFO can accept data.
const CS_TXD: u32 = 1 << 18;

/// Pins handed to the SPI0 peripheral: CE1, CE0, MISO, MOSI, SCLK.
const SPI0_PINS: [u32; 5] = [7, 8, 9, 10, 11];

/// Core clock feeding the SPI divider.
const CORE_CLOCK_HZ: u32 = 250_000_000;

/// Named SPI clock rates, as dividers of the 250 MHz core clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiClock {
    /// ~244 kHz (divider 1024), slow enough for breadboard wiring.
    Khz244,
    /// ~976 kHz (divider 256), the rate the ADC is sampled at.
    Khz976,
}

impl SpiClock {
    /// Power-of-two divider programmed into the CLK register.
    pub const fn divider(self) -> u32 {
        match self {
            SpiClock::Khz244 => 1024,
            SpiClock::Khz976 => 256,
        }
    }

    /// Approximate bus rate in hertz.
    pub const fn hertz(self) -> u32 {
        CORE_CLOCK_HZ / self.divider()
    }
}

/// The SPI0 peripheral.
///
/// Owns both its own register window and the GPIO driver: `begin` must
/// reassign the bus pins, and the GPIO window is mapped exactly once per
/// process, so whoever talks SPI holds it.
pub struct Spi0 {
    regs: RegisterBlock,
    gpio: Gpio,
}

impl Spi0 {
    /// Map the SPI0 page of `/dev/mem`, taking ownership of the GPIO
    /// driver. Call once per process, before dropping privileges.
    pub fn map(gpio: Gpio) -> AppResult<Self> {
        Ok(Self {
            regs: RegisterBlock::map_device(SPI0_BASE, "SPI0")?,
            gpio,
        })
    }

    /// Build a driver over already-mapped (or emulated) blocks.
    pub fn with_blocks(regs: RegisterBlock, gpio: Gpio) -> Self {
        Self { regs, gpio }
    }

    /// Access to the pin driver, for callers that own the bus but still
    /// need plain GPIO (load/done handshake lines and the like).
    pub fn gpio(&self) -> &Gpio {
        &self.gpio
    }
}

impl AdcBus for Spi0 {
    fn begin(&mut self, clock: SpiClock) -> AppResult<()> {
        for pin in SPI0_PINS {
            self.gpio.set_function(pin, PinFunction::Alt0)?;
        }
        self.regs.write(SPI_CLK, clock.divider());
        self.regs.write(SPI_CS, CS_CLEAR_RX | CS_CLEAR_TX);
        self.regs.write(SPI_CS, self.regs.read(SPI_CS) | CS_TA);
        Ok(())
    }

    fn transfer(&mut self, out: u8) -> AppResult<u8> {
        while self.regs.read(SPI_CS) & CS_TXD == 0 {
            std::hint::spin_loop();
        }
        self.regs.write(SPI_FIFO, u32::from(out));
        while self.regs.read(SPI_CS) & CS_DONE == 0 {
            std::hint::spin_loop();
        }
        Ok((self.regs.read(SPI_FIFO) & 0xFF) as u8)
    }

    fn end(&mut self) {
        self.regs.write(SPI_CS, self.regs.read(SPI_CS) & !CS_TA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulated_spi() -> Spi0 {
        Spi0::with_blocks(
            RegisterBlock::emulated(),
            Gpio::with_block(RegisterBlock::emulated()),
        )
    }

    #[test]
    fn begin_programs_pins_clock_and_transfer_active() {
        let mut spi = emulated_spi();
        spi.begin(SpiClock::Khz976).expect("begin");

        for pin in SPI0_PINS {
            assert_eq!(spi.gpio.function_of(pin).expect("read"), PinFunction::Alt0);
        }
        assert_eq!(spi.regs.read(SPI_CLK), 256);
        assert_ne!(spi.regs.read(SPI_CS) & CS_TA, 0);
    }

    #[test]
    fn end_drops_transfer_active() {
        let mut spi = emulated_spi();
        spi.begin(SpiClock::Khz244).expect("begin");
        assert_eq!(spi.regs.read(SPI_CLK), 1024);

        spi.end();
        assert_eq!(spi.regs.read(SPI_CS) & CS_TA, 0);
    }

    #[test]
    fn clock_rates_divide_the_core_clock() {
        assert_eq!(SpiClock::Khz976.hertz(), 976_562);
        assert_eq!(SpiClock::Khz244.hertz(), 244_140);
    }
}
