//! DMTimer in one-shot mode
//!
//! The DMTimer counts up from `TCRR` and raises its overflow interrupt on
//! the wrap from `0xFFFF_FFFF` to 0. With auto-reload (`TCLR.AR`) left clear
//! it stops there and `TCRR` keeps the wrapped value, so the counter has to
//! be restored from `TLDR` before the next start. That restore is
//! [`OneShotTimer::reload`] and happens in the dispatcher's timer branch.

use ratchet_hal::{load_value, OneShotTimer, TimerError};

use crate::clock::TIMER5_CLOCK_HZ;
use crate::mmio::Block;

/// DMTimer register offsets
pub mod regs {
    /// OCP configuration (soft reset)
    pub const TIOCP_CFG: usize = 0x10;
    /// Interrupt status (W1C)
    pub const IRQSTATUS: usize = 0x28;
    /// Interrupt enable set
    pub const IRQENABLE_SET: usize = 0x2C;
    /// Control
    pub const TCLR: usize = 0x38;
    /// Counter
    pub const TCRR: usize = 0x3C;
    /// Load value
    pub const TLDR: usize = 0x40;
}

/// Overflow interrupt bit (IRQSTATUS / IRQENABLE)
const OVF_IT: u32 = 0x2;
/// TIOCP_CFG.SOFTRESET, self-clearing
const SOFTRESET: u32 = 0x1;
/// TCLR.ST
const TCLR_START: u32 = 0x1;

const RESET_BUDGET: u32 = 10_000;

/// One DMTimer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Module base address
    pub base: usize,
    /// Functional clock selected for the module (Hz)
    pub clock_hz: u32,
}

impl TimerConfig {
    /// DMTimer5 clocked from the 32.768 kHz oscillator
    pub const TIMER5: Self = Self {
        base: 0x4804_6000,
        clock_hz: TIMER5_CLOCK_HZ,
    };
}

/// DMTimer used as a one-shot countdown
#[derive(Debug, Clone, Copy)]
pub struct DmTimer {
    regs: Block,
    clock_hz: u32,
}

impl DmTimer {
    /// Create a handle for the configured timer
    ///
    /// # Safety
    ///
    /// `config.base` must be a DMTimer base address whose functional clock
    /// runs at `config.clock_hz`.
    pub const unsafe fn new(config: TimerConfig) -> Self {
        Self {
            regs: Block::new(config.base),
            clock_hz: config.clock_hz,
        }
    }
}

impl OneShotTimer for DmTimer {
    fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn configure(&mut self, delay_ms: u32) -> Result<(), TimerError> {
        let load = load_value(delay_ms, self.clock_hz)?;

        self.regs.write(regs::TIOCP_CFG, SOFTRESET);
        if self
            .regs
            .poll(regs::TIOCP_CFG, RESET_BUDGET, |v| v & SOFTRESET == 0)
            .is_none()
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("timer {=usize:#x} reset timed out", self.regs.base());
        }

        // Stopped, one-shot, no prescaler
        self.regs.write(regs::TCLR, 0);
        self.regs.write(regs::TLDR, load);
        self.regs.write(regs::TCRR, load);
        self.regs.write(regs::IRQSTATUS, OVF_IT);
        self.regs.write(regs::IRQENABLE_SET, OVF_IT);
        Ok(())
    }

    fn start(&mut self) {
        self.regs.write(regs::TCLR, TCLR_START);
    }

    fn reload(&mut self) {
        let load = self.regs.read(regs::TLDR);
        self.regs.write(regs::TCRR, load);
    }

    fn is_overflowed(&self) -> bool {
        self.regs.any_set(regs::IRQSTATUS, OVF_IT)
    }

    fn clear_overflow(&mut self) {
        self.regs.write(regs::IRQSTATUS, OVF_IT);
    }
}
