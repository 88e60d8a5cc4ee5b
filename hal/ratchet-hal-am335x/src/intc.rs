//! ARM interrupt controller (INTC)
//!
//! 128 interrupt inputs in four banks of 32, each masked by default. The
//! controller presents one IRQ at a time and will not present another
//! until software writes `CONTROL.NEWIRQAGR`.

use ratchet_hal::InterruptController;

use crate::mmio::Block;

/// INTC register offsets
pub mod regs {
    /// Module configuration (soft reset)
    pub const SYSCONFIG: usize = 0x10;
    /// Reset status
    pub const SYSSTATUS: usize = 0x14;
    /// Active IRQ number and spurious flag
    pub const SIR_IRQ: usize = 0x40;
    /// New IRQ / FIQ agreement
    pub const CONTROL: usize = 0x48;

    /// Mask clear for bank `n`
    pub const fn mir_clear(bank: usize) -> usize {
        0x88 + 0x20 * bank
    }
}

/// Interrupt numbers used by the firmware
pub mod irq {
    /// DMTimer5
    pub const TINT5: u8 = 93;
    /// GPIO1 line A
    pub const GPIOINT1A: u8 = 98;
}

const SOFTRESET: u32 = 0x2;
const RESETDONE: u32 = 0x1;
const NEWIRQAGR: u32 = 0x1;
const RESET_BUDGET: u32 = 10_000;

/// Bank register offset and bit for an interrupt number
pub const fn bank_bit(irq: u8) -> (usize, u32) {
    ((irq as usize >> 5) & 0x3, 1 << (irq & 0x1F))
}

/// Controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntcConfig {
    /// Module base address
    pub base: usize,
}

impl IntcConfig {
    /// The AM335x MPU subsystem INTC
    pub const AM335X: Self = Self { base: 0x4820_0000 };
}

/// Interrupt controller handle
#[derive(Debug, Clone, Copy)]
pub struct Intc {
    regs: Block,
}

impl Intc {
    /// Create a handle
    ///
    /// # Safety
    ///
    /// `config.base` must be the INTC base address.
    pub const unsafe fn new(config: IntcConfig) -> Self {
        Self {
            regs: Block::new(config.base),
        }
    }

    /// Soft-reset the controller, masking every input
    ///
    /// Returns `false` if the reset did not complete in time.
    pub fn reset(&self) -> bool {
        self.regs.write(regs::SYSCONFIG, SOFTRESET);
        self.regs
            .poll(regs::SYSSTATUS, RESET_BUDGET, |v| v & RESETDONE != 0)
            .is_some()
    }

    /// Let an interrupt input through
    pub fn unmask(&self, irq: u8) {
        let (bank, bit) = bank_bit(irq);
        self.regs.write(regs::mir_clear(bank), bit);
    }
}

impl InterruptController for Intc {
    fn end_of_interrupt(&mut self) {
        self.regs.write(regs::CONTROL, NEWIRQAGR);
    }

    fn active_source(&self) -> u32 {
        self.regs.read(regs::SIR_IRQ)
    }
}
