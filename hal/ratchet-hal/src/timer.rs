//! One-shot timer abstractions
//!
//! The timer counts up from a load value and raises a single overflow
//! interrupt when it wraps past `u32::MAX`. It does not reload itself: the
//! count register has to be restored with [`OneShotTimer::reload`] before the
//! next [`OneShotTimer::start`].

/// Errors from timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Delay rounds down to less than one timer tick
    TooShort,
    /// Delay needs more ticks than the 32-bit counter holds
    TooLong,
}

/// Compute the load value that overflows after `delay_ms`
///
/// `ticks = delay_ms * clock_hz / 1000` and the counter is loaded with
/// `u32::MAX - ticks + 1`, so exactly `ticks` increments reach the overflow.
///
/// # Arguments
/// * `delay_ms` - Delay until the overflow interrupt
/// * `clock_hz` - Timer input clock
pub fn load_value(delay_ms: u32, clock_hz: u32) -> Result<u32, TimerError> {
    let ticks = delay_ms as u64 * clock_hz as u64 / 1000;

    if ticks == 0 {
        return Err(TimerError::TooShort);
    }
    if ticks > u32::MAX as u64 + 1 {
        return Err(TimerError::TooLong);
    }

    // ticks == 2^32 yields 0, a full wrap of the counter
    Ok((u32::MAX as u64 - ticks + 1) as u32)
}

/// Countdown-to-interrupt timer without auto-reload
pub trait OneShotTimer {
    /// Input clock of the counter in Hz
    fn clock_hz(&self) -> u32;

    /// Load the counter for `delay_ms` and enable the overflow interrupt
    ///
    /// Does not start counting.
    fn configure(&mut self, delay_ms: u32) -> Result<(), TimerError>;

    /// Begin counting from the current count register value
    fn start(&mut self);

    /// Restore the count register from the configured load value
    fn reload(&mut self);

    /// Check whether the overflow interrupt is pending
    fn is_overflowed(&self) -> bool;

    /// Clear the overflow pending bit
    fn clear_overflow(&mut self);
}
