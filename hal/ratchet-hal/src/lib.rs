//! Ratchet Hardware Abstraction Layer
//!
//! This crate defines the peripheral traits the motion core is written
//! against. Chip-specific crates (currently the AM335x) implement them with
//! register access; host tests implement them with simulated state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ratchet-firmware                       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ratchet-core (dispatcher, controller)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ratchet-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ ratchet-hal-  │
//!             │    am335x     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`edge::EdgeSource`] - Debounced falling-edge detector on one input line
//! - [`timer::OneShotTimer`] - Countdown timer that fires once per start
//! - [`irq::InterruptController`] - Processor-level interrupt acceptance
//! - [`wait::IdleWait`] - Low-power wait that an interrupt wakes
//!
//! The I2C bus itself is abstracted by `embedded_hal::i2c::I2c`; this crate
//! only carries its timing configuration ([`i2c::I2cConfig`]).

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod edge;
pub mod i2c;
pub mod irq;
pub mod timer;
pub mod wait;

// Re-export key traits at crate root for convenience
pub use edge::EdgeSource;
pub use i2c::I2cConfig;
pub use irq::InterruptController;
pub use timer::{load_value, OneShotTimer, TimerError};
pub use wait::{Cancelled, IdleWait};
