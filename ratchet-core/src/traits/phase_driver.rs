//! Motor phase driver trait
//!
//! Abstracts over whatever sets the four H-bridge inputs (a PCA9685 on I2C
//! today, GPIO pins or a shift register elsewhere).

use crate::phase::PhaseIndex;

/// Drives the H-bridge inputs into a phase pattern
pub trait PhaseDriver {
    /// Error type for the underlying transport
    type Error;

    /// Set all four lines to the pattern of `phase`
    ///
    /// Issues one blocking write per line, in [`MotorLine::WRITE_ORDER`].
    /// Must only be called from main-loop context. Transport errors are
    /// returned as-is, without retry.
    ///
    /// [`MotorLine::WRITE_ORDER`]: crate::phase::MotorLine::WRITE_ORDER
    fn apply(&mut self, phase: PhaseIndex) -> Result<(), Self::Error>;
}
