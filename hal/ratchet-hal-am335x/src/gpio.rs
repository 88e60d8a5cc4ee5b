//! GPIO falling-edge detection
//!
//! Each GPIO bank latches detected edges in `IRQSTATUS_0` (write 1 to
//! clear) and raises its "A" interrupt line while any enabled bit is set.
//! Debouncing is done by the bank's own filter, clocked from the 32 kHz
//! debounce clock in steps of 31 µs.

use ratchet_hal::EdgeSource;

use crate::mmio::Block;

/// GPIO register offsets
pub mod regs {
    /// Module configuration (soft reset)
    pub const SYSCONFIG: usize = 0x10;
    /// Interrupt status, line 0 (W1C)
    pub const IRQSTATUS_0: usize = 0x2C;
    /// Interrupt enable set, line 0
    pub const IRQSTATUS_SET_0: usize = 0x34;
    /// Reset status
    pub const SYSSTATUS: usize = 0x114;
    /// Output enable (1 = input)
    pub const OE: usize = 0x134;
    /// Falling-edge detection enable
    pub const FALLINGDETECT: usize = 0x14C;
    /// Debounce enable
    pub const DEBOUNCENABLE: usize = 0x150;
    /// Debounce time, shared by the whole bank
    pub const DEBOUNCINGTIME: usize = 0x154;
}

const SOFTRESET: u32 = 0x2;
const RESETDONE: u32 = 0x1;
const RESET_BUDGET: u32 = 10_000;

/// Debounce filter resolution (µs)
pub const DEBOUNCE_STEP_US: u32 = 31;

/// `DEBOUNCINGTIME` value for a debounce window
///
/// The filter time is `(value + 1) × 31 µs`; the window is rounded down to
/// whole steps and clamped to what the 8-bit field can hold.
pub const fn debounce_value(debounce_ms: u32) -> u8 {
    let steps = debounce_ms.saturating_mul(1000) / DEBOUNCE_STEP_US;
    if steps == 0 {
        0
    } else if steps > 256 {
        u8::MAX
    } else {
        (steps - 1) as u8
    }
}

/// One GPIO line used as an edge source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioEdgeConfig {
    /// Bank base address
    pub base: usize,
    /// Line within the bank (0-31)
    pub pin: u8,
}

impl GpioEdgeConfig {
    /// BeagleBone Black button: GPIO1_3 on P8.6
    pub const BBB_BUTTON: Self = Self {
        base: 0x4804_C000,
        pin: 3,
    };

    /// Bit of this line in every per-line register
    pub const fn mask(&self) -> u32 {
        1 << (self.pin & 0x1F)
    }
}

/// Debounced falling-edge detector on one GPIO line
#[derive(Debug, Clone, Copy)]
pub struct GpioEdge {
    bank: Block,
    mask: u32,
}

impl GpioEdge {
    /// Create a handle for the configured line
    ///
    /// # Safety
    ///
    /// `config.base` must be a GPIO bank base address. Handles may be copied
    /// into interrupt context; the caller must make sure read-modify-write
    /// sequences on `FALLINGDETECT` from the main loop run with interrupts
    /// masked.
    pub const unsafe fn new(config: GpioEdgeConfig) -> Self {
        Self {
            bank: Block::new(config.base),
            mask: config.mask(),
        }
    }

    /// Soft-reset the whole bank
    ///
    /// Returns `false` if the reset did not complete in time.
    fn reset(&self) -> bool {
        self.bank.write(regs::SYSCONFIG, SOFTRESET);
        self.bank
            .poll(regs::SYSSTATUS, RESET_BUDGET, |v| v & RESETDONE != 0)
            .is_some()
    }
}

impl EdgeSource for GpioEdge {
    fn configure(&mut self, debounce_ms: u32) {
        if !self.reset() {
            // Registers still respond; carry on with whatever state is left
            #[cfg(feature = "defmt")]
            defmt::warn!("GPIO bank {=usize:#x} reset timed out", self.bank.base());
        }

        self.bank.set_bits(regs::OE, self.mask);
        self.bank
            .write(regs::DEBOUNCINGTIME, debounce_value(debounce_ms) as u32);
        self.bank.set_bits(regs::DEBOUNCENABLE, self.mask);
        self.bank.write(regs::IRQSTATUS_0, self.mask);
        self.bank.set_bits(regs::FALLINGDETECT, self.mask);
        self.bank.write(regs::IRQSTATUS_SET_0, self.mask);
    }

    fn enable(&mut self) {
        self.bank.set_bits(regs::FALLINGDETECT, self.mask);
    }

    fn disable(&mut self) {
        self.bank.clear_bits(regs::FALLINGDETECT, self.mask);
    }

    fn acknowledge(&mut self) {
        // W1C: only this line's latch is touched
        self.bank.write(regs::IRQSTATUS_0, self.mask);
    }

    fn is_pending(&self) -> bool {
        self.bank.any_set(regs::IRQSTATUS_0, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmio::RegisterFile;

    #[test]
    fn test_debounce_value() {
        // 5 ms / 31 µs = 161 steps
        assert_eq!(debounce_value(5), 0xA0);
        assert_eq!(debounce_value(0), 0);
        assert_eq!(debounce_value(7), 224);
        assert_eq!(debounce_value(100), 0xFF);
    }

    #[test]
    fn test_button_mask() {
        assert_eq!(GpioEdgeConfig::BBB_BUTTON.mask(), 0x8);
    }

    const LINE: u32 = 0x8;

    fn bank() -> (RegisterFile, GpioEdge) {
        let file = RegisterFile::new(0x200);
        file.set(regs::SYSSTATUS, RESETDONE);
        // SAFETY: backed by `file`, which outlives the handle in every test
        let edge = unsafe { GpioEdge::new(GpioEdgeConfig { base: file.base(), pin: 3 }) };
        (file, edge)
    }

    #[test]
    fn test_configure_programs_line() {
        let (file, mut edge) = bank();
        file.set(regs::OE, 0x1);

        edge.configure(5);

        assert_eq!(file.get(regs::SYSCONFIG), SOFTRESET);
        assert_eq!(file.get(regs::OE), 0x1 | LINE);
        assert_eq!(file.get(regs::DEBOUNCINGTIME), 0xA0);
        assert_eq!(file.get(regs::DEBOUNCENABLE), LINE);
        assert_eq!(file.get(regs::FALLINGDETECT), LINE);
        assert_eq!(file.get(regs::IRQSTATUS_SET_0), LINE);
    }

    #[test]
    fn test_enable_twice_is_idempotent() {
        let (file, mut edge) = bank();
        file.set(regs::FALLINGDETECT, 0x1);

        edge.enable();
        let once = file.get(regs::FALLINGDETECT);
        edge.enable();

        assert_eq!(once, 0x1 | LINE);
        assert_eq!(file.get(regs::FALLINGDETECT), once);
    }

    #[test]
    fn test_disable_keeps_debounce() {
        let (file, mut edge) = bank();
        edge.configure(5);
        file.set(regs::FALLINGDETECT, 0x1 | LINE);

        edge.disable();

        assert_eq!(file.get(regs::FALLINGDETECT), 0x1);
        assert_eq!(file.get(regs::DEBOUNCENABLE), LINE);
        assert_eq!(file.get(regs::DEBOUNCINGTIME), 0xA0);
    }

    #[test]
    fn test_acknowledge_writes_only_own_bit() {
        let (file, mut edge) = bank();
        file.set(regs::IRQSTATUS_0, 0xFF);
        assert!(edge.is_pending());

        edge.acknowledge();

        // W1C register: the value written is the set of latches cleared
        assert_eq!(file.get(regs::IRQSTATUS_0), LINE);
    }

    #[test]
    fn test_pending_ignores_other_lines() {
        let (file, edge) = bank();
        file.set(regs::IRQSTATUS_0, !LINE);
        assert!(!edge.is_pending());
    }
}
