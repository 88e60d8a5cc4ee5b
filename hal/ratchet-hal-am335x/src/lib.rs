//! AM335x-specific HAL for the Ratchet firmware
//!
//! Register-level implementations of the `ratchet-hal` traits for the TI
//! AM335x Sitara (Cortex-A8) as found on the BeagleBone Black:
//!
//! - [`gpio::GpioEdge`] - debounced falling-edge detection on a GPIO line
//! - [`dmtimer::DmTimer`] - DMTimer in one-shot mode
//! - [`intc::Intc`] - the ARM interrupt controller
//! - [`i2c::Am335xI2c`] - I2C master implementing `embedded_hal::i2c::I2c`
//! - [`cpu::CpuIdle`] - WFI-based idle wait, plus the CPSR critical section
//! - [`delay::SpinDelay`] - busy-wait `embedded_hal::delay::DelayNs`
//!
//! [`clock`] and [`pinmux`] cover the board bring-up the peripherals need
//! before any of the above is touched.
//!
//! # Handles
//!
//! Every peripheral handle is a `Copy` wrapper around the base address of
//! its register block, taken from a config struct (`GpioEdgeConfig`,
//! `TimerConfig`, ...). Building a handle is `unsafe`: the caller vouches
//! that the address is right and that concurrent use is coordinated. After
//! that, register access is safe.
//!
//! # Features
//!
//! - `critical-section-impl` - Register the CPSR critical section (default)
//! - `defmt` - Enable debug formatting support

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod cpu;
pub mod delay;
pub mod dmtimer;
pub mod gpio;
pub mod i2c;
pub mod intc;
pub mod mmio;
pub mod pinmux;

pub use cpu::CpuIdle;
pub use delay::SpinDelay;
pub use dmtimer::{DmTimer, TimerConfig};
pub use gpio::{GpioEdge, GpioEdgeConfig};
pub use i2c::{Am335xI2c, I2cBlock, I2cError};
pub use intc::{Intc, IntcConfig};
