//! I2C bus configuration
//!
//! Bus transfers go through `embedded_hal::i2c::I2c`. This module holds the
//! clock configuration shared by chip HALs.

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Upper bound on status polls while waiting for a transfer to finish
    pub poll_budget: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Poll budget used by the presets
    pub const DEFAULT_POLL_BUDGET: u32 = 100_000;

    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        poll_budget: Self::DEFAULT_POLL_BUDGET,
    };

    /// Approximate duration of one register write (address + 2 bytes) in microseconds
    ///
    /// Counts 9 clocks per byte plus start and stop, which is close enough
    /// for checking step pacing against bus latency.
    pub const fn register_write_us(&self) -> u32 {
        let bits: u32 = 3 * 9 + 2;
        (bits * 1_000_000).div_ceil(self.frequency)
    }
}
