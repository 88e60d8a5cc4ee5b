//! Pad configuration (control module)
//!
//! The I2C1 pins share their pads with SPI0 and have to be muxed over before
//! the bus is usable. The button pad is a GPIO by default; it is set to
//! input with pull-up so an open switch reads high.

use crate::mmio::Block;

/// Control module base
pub const CONTROL_MODULE_BASE: usize = 0x44E1_0000;

/// Pad configuration register offsets
pub mod pads {
    /// conf_spi0_d1, P9.18, I2C1_SDA in mode 2
    pub const SPI0_D1: usize = 0x958;
    /// conf_spi0_cs0, P9.17, I2C1_SCL in mode 2
    pub const SPI0_CS0: usize = 0x95C;
    /// conf_gpmc_ad3, P8.6, GPIO1_3 in mode 7
    pub const GPMC_AD3: usize = 0x80C;
}

/// Pad setting: mux mode, pull and receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadConfig {
    /// Mux mode (0-7)
    pub mode: u8,
    /// Pull enabled
    pub pull: bool,
    /// Pull-up rather than pull-down
    pub pull_up: bool,
    /// Input receiver enabled
    pub receiver: bool,
}

impl PadConfig {
    /// I2C pad: mode 2, pull-up, receiver on
    pub const I2C: Self = Self {
        mode: 2,
        pull: true,
        pull_up: true,
        receiver: true,
    };

    /// GPIO input with pull-up
    pub const GPIO_INPUT_PULLUP: Self = Self {
        mode: 7,
        pull: true,
        pull_up: true,
        receiver: true,
    };

    /// Register encoding
    pub const fn bits(self) -> u32 {
        let mut bits = (self.mode & 0x7) as u32;
        if !self.pull {
            bits |= 1 << 3;
        }
        if self.pull_up {
            bits |= 1 << 4;
        }
        if self.receiver {
            bits |= 1 << 5;
        }
        bits
    }
}

/// Handle to the pad configuration registers
#[derive(Debug, Clone, Copy)]
pub struct PinMux {
    control: Block,
}

impl PinMux {
    /// Create a handle to the control module
    ///
    /// # Safety
    ///
    /// Pad registers are only writable in privileged mode. Must only be used
    /// during single-threaded bring-up.
    pub const unsafe fn new() -> Self {
        Self {
            control: Block::new(CONTROL_MODULE_BASE),
        }
    }

    /// Configure one pad
    pub fn set(&self, pad: usize, config: PadConfig) {
        self.control.write(pad, config.bits());
    }

    /// Route I2C1 to P9.17/P9.18
    pub fn route_i2c1(&self) {
        self.set(pads::SPI0_D1, PadConfig::I2C);
        self.set(pads::SPI0_CS0, PadConfig::I2C);
    }

    /// Make P8.6 a pulled-up GPIO input
    pub fn route_button(&self) {
        self.set(pads::GPMC_AD3, PadConfig::GPIO_INPUT_PULLUP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_encoding() {
        assert_eq!(PadConfig::I2C.bits(), 0x32);
        assert_eq!(PadConfig::GPIO_INPUT_PULLUP.bits(), 0x37);
    }
}
