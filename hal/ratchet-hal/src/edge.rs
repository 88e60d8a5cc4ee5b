//! Edge detector abstractions
//!
//! A single button line watched for debounced falling edges. Debouncing is
//! done by the peripheral, not in software.

/// Debounced falling-edge source on one input line
///
/// The dispatcher uses [`is_pending`](EdgeSource::is_pending),
/// [`acknowledge`](EdgeSource::acknowledge) and
/// [`disable`](EdgeSource::disable) from interrupt context. The motion
/// controller uses [`acknowledge`](EdgeSource::acknowledge) and
/// [`enable`](EdgeSource::enable) once per completed run.
pub trait EdgeSource {
    /// Set up debouncing and arm falling-edge detection
    ///
    /// # Arguments
    /// * `debounce_ms` - Hardware filter window; shorter transitions are dropped
    fn configure(&mut self, debounce_ms: u32);

    /// Re-arm falling-edge detection
    ///
    /// Calling this while already armed has no further effect.
    fn enable(&mut self);

    /// Mask falling-edge detection, leaving the debounce setup untouched
    fn disable(&mut self);

    /// Clear the device's own edge-pending latch for this line
    ///
    /// Must precede [`enable`](EdgeSource::enable), otherwise a stale latch
    /// fires again as soon as detection is re-armed.
    fn acknowledge(&mut self);

    /// Check whether an edge on this line is latched
    fn is_pending(&self) -> bool;
}
