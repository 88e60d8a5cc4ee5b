//! Cortex-A8 interrupt masking and idle
//!
//! IRQs are masked with the CPSR I bit. The AM335x has one core, so masking
//! IRQs is all a critical section needs. FIQs are not used.

use ratchet_hal::{Cancelled, IdleWait};

#[cfg(target_arch = "arm")]
mod arch {
    /// CPSR I bit
    const CPSR_I: u32 = 1 << 7;

    #[inline(always)]
    pub fn irq_disable() -> bool {
        let cpsr: u32;
        // SAFETY: reads CPSR and sets the I bit; acts as a compiler barrier
        unsafe {
            core::arch::asm!("mrs {0}, cpsr", "cpsid i", out(reg) cpsr, options(nostack, preserves_flags));
        }
        cpsr & CPSR_I == 0
    }

    #[inline(always)]
    pub unsafe fn irq_unmask() {
        core::arch::asm!("cpsie i", options(nostack, preserves_flags));
    }

    #[inline(always)]
    pub fn wfi() {
        // SAFETY: WFI only suspends the core
        unsafe { core::arch::asm!("wfi", options(nostack, preserves_flags)) };
    }
}

// Host builds: no interrupts to mask
#[cfg(not(target_arch = "arm"))]
mod arch {
    pub fn irq_disable() -> bool {
        false
    }

    pub unsafe fn irq_unmask() {}

    pub fn wfi() {
        core::hint::spin_loop();
    }
}

/// Mask IRQs, returning whether they were enabled before
#[inline(always)]
pub fn irq_disable() -> bool {
    arch::irq_disable()
}

/// Restore the IRQ mask saved by [`irq_disable`]
///
/// # Safety
///
/// `was_enabled` must come from the matching [`irq_disable`], and sections
/// must be released in reverse order of acquisition.
#[inline(always)]
pub unsafe fn irq_restore(was_enabled: bool) {
    if was_enabled {
        arch::irq_unmask();
    }
}

/// Unmask IRQs
///
/// # Safety
///
/// Must not be called inside a critical section, and every interrupt the
/// INTC lets through must have a dispatcher ready for it.
#[inline(always)]
pub unsafe fn irq_enable() {
    arch::irq_unmask();
}

/// Wait for interrupt
///
/// A pending IRQ wakes the core even while the CPSR I bit is set.
#[inline(always)]
pub fn wfi() {
    arch::wfi();
}

#[cfg(feature = "critical-section-impl")]
mod critical {
    use critical_section::RawRestoreState;

    struct CpsrCriticalSection;
    critical_section::set_impl!(CpsrCriticalSection);

    unsafe impl critical_section::Impl for CpsrCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            super::irq_disable()
        }

        unsafe fn release(was_enabled: RawRestoreState) {
            super::irq_restore(was_enabled)
        }
    }
}

/// Low-power wait between interrupts
///
/// The condition is checked with IRQs masked and WFI is entered from that
/// masked state. An interrupt landing after the check stays pending, wakes
/// the core out of WFI, and is taken as soon as the mask is restored, so
/// a wakeup cannot slip in between check and sleep.
///
/// Must only be used once IRQs have been enabled; with the mask already set
/// on entry the dispatcher never runs and the wait spins forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuIdle;

impl IdleWait for CpuIdle {
    fn idle_unless<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Cancelled> {
        let was_enabled = irq_disable();
        if !ready() {
            wfi();
        }
        // SAFETY: paired with the irq_disable above
        unsafe { irq_restore(was_enabled) };
        Ok(())
    }
}
