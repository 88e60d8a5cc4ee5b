//! Low-power wait abstraction
//!
//! The main loop has two blocking waits: for a button press while idle, and
//! for the timer tick between steps. Both are woken only by the interrupt
//! dispatcher.

/// The wait was abandoned before its condition held
///
/// Bare-metal implementations never return this. Host harnesses do, so a
/// scripted scenario can end without hanging the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cancelled;

/// Suspend the main loop until an interrupt has been serviced
pub trait IdleWait {
    /// Sleep unless `ready` already holds
    ///
    /// `ready` is evaluated with interrupts masked and the sleep is entered
    /// from that masked state, so an interrupt arriving between the check and
    /// the sleep still wakes the core. Returns after at most one wakeup; the
    /// caller re-checks its condition in a loop.
    fn idle_unless<F: FnMut() -> bool>(&mut self, ready: F) -> Result<(), Cancelled>;

    /// Block until `ready` holds
    ///
    /// `ready` is called several times per wakeup and must only observe the
    /// condition, never consume it.
    fn block_until<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Cancelled> {
        while !ready() {
            self.idle_unless(&mut ready)?;
        }
        Ok(())
    }
}
