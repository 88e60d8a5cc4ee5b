//! Peripheral clock gating (PRCM)
//!
//! Modules come out of reset with their interface and functional clocks
//! gated. Each one used by the firmware is switched to MODULEMODE=ENABLE in
//! the CM_PER domain and then polled until its IDLEST field reports it
//! functional.

use crate::mmio::Block;

/// CM_PER (peripheral clock module) base
pub const CM_PER_BASE: usize = 0x44E0_0000;
/// CM_DPLL (clock source selection) base
pub const CM_DPLL_BASE: usize = 0x44E0_0500;

/// CM_PER register offsets
pub mod regs {
    /// I2C1 clock control
    pub const I2C1_CLKCTRL: usize = 0x48;
    /// GPIO1 clock control
    pub const GPIO1_CLKCTRL: usize = 0xAC;
    /// DMTimer5 clock control
    pub const TIMER5_CLKCTRL: usize = 0xEC;
    /// DMTimer5 functional clock source (CM_DPLL)
    pub const CLKSEL_TIMER5_CLK: usize = 0x18;
}

/// MODULEMODE = ENABLE
const MODULEMODE_ENABLE: u32 = 0x2;
/// GPIO debounce clock (OPTFCLKEN_GPIO_1_GDBCLK)
const GPIO_DEBOUNCE_CLK: u32 = 1 << 18;
/// IDLEST field, 0 = fully functional
const IDLEST_MASK: u32 = 0x3 << 16;
/// Timer source: 32.768 kHz oscillator
const CLKSEL_32KHZ: u32 = 0x2;

/// Polls allowed for a module to report functional
const IDLEST_BUDGET: u32 = 10_000;

/// A module did not leave idle after its clock was enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockNotReady {
    /// CLKCTRL register offset of the module
    pub clkctrl: usize,
}

/// Handle to the clock control registers
#[derive(Debug, Clone, Copy)]
pub struct ClockControl {
    cm_per: Block,
    cm_dpll: Block,
}

impl ClockControl {
    /// Create a handle to CM_PER and CM_DPLL
    ///
    /// # Safety
    ///
    /// Must run in a privileged mode, and only during single-threaded
    /// bring-up.
    pub const unsafe fn new() -> Self {
        Self {
            cm_per: Block::new(CM_PER_BASE),
            cm_dpll: Block::new(CM_DPLL_BASE),
        }
    }

    fn enable(&self, clkctrl: usize, value: u32) -> Result<(), ClockNotReady> {
        self.cm_per.write(clkctrl, value);
        self.cm_per
            .poll(clkctrl, IDLEST_BUDGET, |v| v & IDLEST_MASK == 0)
            .map(|_| ())
            .ok_or(ClockNotReady { clkctrl })
    }

    /// Clock GPIO1 including its debounce clock
    pub fn enable_gpio1(&self) -> Result<(), ClockNotReady> {
        self.enable(regs::GPIO1_CLKCTRL, MODULEMODE_ENABLE | GPIO_DEBOUNCE_CLK)
    }

    /// Clock DMTimer5 from the 32.768 kHz oscillator
    pub fn enable_timer5(&self) -> Result<(), ClockNotReady> {
        self.cm_dpll.write(regs::CLKSEL_TIMER5_CLK, CLKSEL_32KHZ);
        self.enable(regs::TIMER5_CLKCTRL, MODULEMODE_ENABLE)
    }

    /// Clock I2C1
    pub fn enable_i2c1(&self) -> Result<(), ClockNotReady> {
        self.enable(regs::I2C1_CLKCTRL, MODULEMODE_ENABLE)
    }
}

/// Functional clock DMTimer5 runs from after [`ClockControl::enable_timer5`]
pub const TIMER5_CLOCK_HZ: u32 = 32_768;
