//! Sample data handling: the sample type, the shared ring buffer, and the
//! dump-file writer.

pub mod dump;
pub mod ring_buffer;

use std::fmt;

/// One 10-bit light-level reading, immutable once produced.
///
/// The invariant (`value <= 1023`) is established at construction and holds
/// for every `Sample` in the system; the codec refuses responses whose null
/// bit is set rather than masking a corrupted word into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample(u16);

impl Sample {
    /// Largest representable reading.
    pub const MAX_VALUE: u16 = (1 << 10) - 1;

    /// A sample from an in-range value.
    pub fn new(value: u16) -> Option<Self> {
        (value <= Self::MAX_VALUE).then_some(Self(value))
    }

    /// The low ten bits of a validated ADC response word.
    pub fn from_adc_word(word: u16) -> Self {
        Self(word & Self::MAX_VALUE)
    }

    /// The reading as an integer.
    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Sample {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}
