//! Interrupt mailbox
//!
//! The only data shared between interrupt context and the main loop. The
//! dispatcher posts, the main loop consumes. Every access is a single atomic
//! load, store or swap, so nothing here needs a lock and nothing can tear
//! when an interrupt lands mid-access.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-slot event flags posted by the dispatcher
#[derive(Debug)]
pub struct IrqFlags {
    /// Button edge consumed; cleared when the run that followed finishes
    button: AtomicBool,
    /// Timer overflowed since the last step was started
    tick: AtomicBool,
}

impl Default for IrqFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqFlags {
    /// Create an empty mailbox (both flags clear)
    pub const fn new() -> Self {
        Self {
            button: AtomicBool::new(false),
            tick: AtomicBool::new(false),
        }
    }

    /// Record a consumed button edge (interrupt context)
    pub fn post_button(&self) {
        self.button.store(true, Ordering::Release);
    }

    /// Check whether a button edge is outstanding
    pub fn button_pending(&self) -> bool {
        self.button.load(Ordering::Acquire)
    }

    /// Clear the button flag once its run has finished
    pub fn clear_button(&self) {
        self.button.store(false, Ordering::Release);
    }

    /// Record a timer overflow (interrupt context)
    pub fn post_tick(&self) {
        self.tick.store(true, Ordering::Release);
    }

    /// Check whether a tick is waiting, without consuming it
    pub fn tick_pending(&self) -> bool {
        self.tick.load(Ordering::Acquire)
    }

    /// Consume the tick if one is waiting
    pub fn take_tick(&self) -> bool {
        self.tick.swap(false, Ordering::AcqRel)
    }
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    /// Interrupts attributed to the button line
    pub edges: u32,
    /// Interrupts attributed to the timer
    pub ticks: u32,
    /// Interrupts with no recognised source
    pub spurious: u32,
    /// Controller source register at the last spurious interrupt
    pub last_spurious_source: u32,
}

/// Spurious interrupts seen since the main loop last looked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpuriousReport {
    /// How many arrived since the previous report
    pub new: u32,
    /// Controller source register at the most recent one
    pub last_source: u32,
}

/// Interrupt counters, written by the dispatcher and read by the main loop
///
/// This is the diagnostic channel for unattributed interrupts: the
/// dispatcher only counts, the main loop does the logging.
#[derive(Debug)]
pub struct DispatchStats {
    edges: AtomicU32,
    ticks: AtomicU32,
    spurious: AtomicU32,
    last_spurious_source: AtomicU32,
    /// Spurious count already handed out by `take_spurious`
    reported_spurious: AtomicU32,
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStats {
    /// Create zeroed counters
    pub const fn new() -> Self {
        Self {
            edges: AtomicU32::new(0),
            ticks: AtomicU32::new(0),
            spurious: AtomicU32::new(0),
            last_spurious_source: AtomicU32::new(0),
            reported_spurious: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_edge(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_spurious(&self, source: u32) {
        self.last_spurious_source.store(source, Ordering::Relaxed);
        self.spurious.fetch_add(1, Ordering::Release);
    }

    /// Copy all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            edges: self.edges.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Acquire),
            last_spurious_source: self.last_spurious_source.load(Ordering::Relaxed),
        }
    }

    /// Whether [`take_spurious`](Self::take_spurious) has anything to report
    pub fn has_unreported_spurious(&self) -> bool {
        self.spurious.load(Ordering::Acquire) != self.reported_spurious.load(Ordering::Relaxed)
    }

    /// Spurious interrupts not yet reported, if any (main loop only)
    pub fn take_spurious(&self) -> Option<SpuriousReport> {
        let total = self.spurious.load(Ordering::Acquire);
        let reported = self.reported_spurious.load(Ordering::Relaxed);
        if total == reported {
            return None;
        }

        self.reported_spurious.store(total, Ordering::Relaxed);
        Some(SpuriousReport {
            new: total.wrapping_sub(reported),
            last_source: self.last_spurious_source.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_start_clear() {
        let flags = IrqFlags::new();
        assert!(!flags.button_pending());
        assert!(!flags.tick_pending());
        assert!(!flags.take_tick());
    }

    #[test]
    fn test_button_flag_persists_until_cleared() {
        let flags = IrqFlags::new();
        flags.post_button();

        // Reading does not consume
        assert!(flags.button_pending());
        assert!(flags.button_pending());

        flags.clear_button();
        assert!(!flags.button_pending());
    }

    #[test]
    fn test_tick_is_single_slot() {
        let flags = IrqFlags::new();
        flags.post_tick();
        flags.post_tick();

        assert!(flags.tick_pending());
        assert!(flags.take_tick());
        assert!(!flags.take_tick());
        assert!(!flags.tick_pending());
    }

    #[test]
    fn test_stats_counting() {
        let stats = DispatchStats::new();
        stats.record_edge();
        stats.record_tick();
        stats.record_tick();

        let snap = stats.snapshot();
        assert_eq!(snap.edges, 1);
        assert_eq!(snap.ticks, 2);
        assert_eq!(snap.spurious, 0);
    }

    #[test]
    fn test_spurious_reported_once() {
        let stats = DispatchStats::new();
        assert_eq!(stats.take_spurious(), None);

        stats.record_spurious(0x80);
        stats.record_spurious(0x7F);
        assert_eq!(
            stats.take_spurious(),
            Some(SpuriousReport { new: 2, last_source: 0x7F })
        );
        assert_eq!(stats.take_spurious(), None);

        stats.record_spurious(0x01);
        assert_eq!(
            stats.take_spurious(),
            Some(SpuriousReport { new: 1, last_source: 0x01 })
        );
        assert_eq!(stats.snapshot().spurious, 3);
    }

    #[test]
    fn test_unreported_spurious_tracks_take() {
        let stats = DispatchStats::new();
        assert!(!stats.has_unreported_spurious());

        stats.record_spurious(0x7F);
        assert!(stats.has_unreported_spurious());
        // Checking does not consume
        assert!(stats.has_unreported_spurious());

        stats.take_spurious();
        assert!(!stats.has_unreported_spurious());
    }
}
