//! GPIO pin driver.
//!
//! Function selection is a read-modify-write against the FSEL registers
//! (ten pins of three bits each per 32-bit register); pin writes go through
//! the dedicated SET/CLR pulse registers and are never read-modify-write;
//! pin reads inspect the LEV level registers.

use crate::error::{AcqError, AppResult};
use crate::hardware::mmio::{RegisterBlock, GPIO_BASE};

/// Number of GPIO pins on the header.
pub const NR_PINS: u32 = 54;

/// Word offset of the first FSEL register.
const FSEL_BASE: usize = 0;
/// Word offset of the first SET pulse register.
const SET_BASE: usize = 7;
/// Word offset of the first CLR pulse register.
const CLR_BASE: usize = 10;
/// Word offset of the first LEV level register.
const LEV_BASE: usize = 13;

/// Bits per pin in an FSEL register.
const FUNCTION_BITS: u32 = 3;
/// Pins controlled by one FSEL register.
const PINS_PER_FSEL: u32 = 10;
const FUNCTION_MASK: u32 = (1 << FUNCTION_BITS) - 1;

/// Function code for one GPIO pin.
///
/// The alternate-function codes are not in numeric order; the hardware
/// interleaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    Input,
    Output,
    Alt0,
    Alt1,
    Alt2,
    Alt3,
    Alt4,
    Alt5,
}

impl PinFunction {
    /// The 3-bit code the FSEL register stores for this function.
    pub const fn code(self) -> u32 {
        match self {
            PinFunction::Input => 0b000,
            PinFunction::Output => 0b001,
            PinFunction::Alt5 => 0b010,
            PinFunction::Alt4 => 0b011,
            PinFunction::Alt0 => 0b100,
            PinFunction::Alt1 => 0b101,
            PinFunction::Alt2 => 0b110,
            PinFunction::Alt3 => 0b111,
        }
    }

    /// Decode a 3-bit FSEL field. Total: every code is a function.
    pub const fn from_code(code: u32) -> Self {
        match code & FUNCTION_MASK {
            0b000 => PinFunction::Input,
            0b001 => PinFunction::Output,
            0b010 => PinFunction::Alt5,
            0b011 => PinFunction::Alt4,
            0b100 => PinFunction::Alt0,
            0b101 => PinFunction::Alt1,
            0b110 => PinFunction::Alt2,
            _ => PinFunction::Alt3,
        }
    }
}

/// The GPIO register window.
pub struct Gpio {
    regs: RegisterBlock,
}

impl Gpio {
    /// Map the GPIO page of `/dev/mem`. Call once per process, before
    /// dropping privileges.
    pub fn map() -> AppResult<Self> {
        Ok(Self {
            regs: RegisterBlock::map_device(GPIO_BASE, "GPIO")?,
        })
    }

    /// Build a driver over an already-mapped (or emulated) block.
    pub fn with_block(regs: RegisterBlock) -> Self {
        Self { regs }
    }

    fn check_pin(pin: u32) -> AppResult<()> {
        if pin >= NR_PINS {
            return Err(AcqError::InvalidPin {
                pin,
                limit: NR_PINS,
            });
        }
        Ok(())
    }

    /// Select the function of one pin, preserving the function fields of
    /// the other nine pins in the same FSEL register.
    pub fn set_function(&self, pin: u32, function: PinFunction) -> AppResult<()> {
        Self::check_pin(pin)?;

        let offset = FSEL_BASE + (pin / PINS_PER_FSEL) as usize;
        let shift = FUNCTION_BITS * (pin % PINS_PER_FSEL);

        let mut field = self.regs.read(offset);
        field &= !(FUNCTION_MASK << shift);
        field |= function.code() << shift;
        self.regs.write(offset, field);
        Ok(())
    }

    /// Read back the function field of one pin.
    pub fn function_of(&self, pin: u32) -> AppResult<PinFunction> {
        Self::check_pin(pin)?;

        let offset = FSEL_BASE + (pin / PINS_PER_FSEL) as usize;
        let shift = FUNCTION_BITS * (pin % PINS_PER_FSEL);
        Ok(PinFunction::from_code(self.regs.read(offset) >> shift))
    }

    /// Drive one pin high or low through the SET/CLR pulse registers.
    ///
    /// Writing a 1 bit pulses that pin; 0 bits are no-ops, so no
    /// read-modify-write is needed (or correct) here.
    pub fn write_pin(&self, pin: u32, value: bool) -> AppResult<()> {
        Self::check_pin(pin)?;

        let bank = (pin / 32) as usize;
        let offset = if value { SET_BASE } else { CLR_BASE } + bank;
        self.regs.write(offset, 1 << (pin % 32));
        Ok(())
    }

    /// Read the level currently on one pin.
    pub fn read_pin(&self, pin: u32) -> AppResult<bool> {
        Self::check_pin(pin)?;

        let bank = (pin / 32) as usize;
        let level = self.regs.read(LEV_BASE + bank);
        Ok(level & (1 << (pin % 32)) != 0)
    }
}
