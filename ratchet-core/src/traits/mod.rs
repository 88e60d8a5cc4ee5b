//! Driver traits
//!
//! Peripheral traits live in `ratchet-hal`. This module defines the motor
//! side, which sits one level higher: a driver chip on the I2C bus.

pub mod phase_driver;

pub use phase_driver::PhaseDriver;

/// Values that can appear in log messages
///
/// `defmt::Format` with the `defmt` feature, anything without it.
#[cfg(feature = "defmt")]
pub trait Loggable: defmt::Format {}

#[cfg(feature = "defmt")]
impl<T: defmt::Format + ?Sized> Loggable for T {}

/// Values that can appear in log messages
///
/// `defmt::Format` with the `defmt` feature, anything without it.
#[cfg(not(feature = "defmt"))]
pub trait Loggable {}

#[cfg(not(feature = "defmt"))]
impl<T: ?Sized> Loggable for T {}
