//! Busy-wait delay
//!
//! Only used during bring-up (PCA9685 oscillator start-up), before any
//! timer is free for it.

use embedded_hal::delay::DelayNs;

/// Spin delay calibrated from the core clock
///
/// Each loop iteration takes at least one core cycle, so the delay is never
/// shorter than asked for; it is usually a few times longer.
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    cycles_per_us: u32,
}

impl SpinDelay {
    /// Core clock after the ROM boot loader hands over
    pub const BOOT_CORE_HZ: u32 = 500_000_000;

    /// Create a delay for a core clock
    pub const fn new(core_hz: u32) -> Self {
        let cycles_per_us = core_hz / 1_000_000;
        Self {
            cycles_per_us: if cycles_per_us == 0 { 1 } else { cycles_per_us },
        }
    }
}

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.cycles_per_us as u64).div_ceil(1000);
        for _ in 0..cycles {
            core::hint::spin_loop();
        }
    }
}
