//! Board-agnostic motion control core for the Ratchet stepper firmware
//!
//! This crate contains the logic that does not depend on a specific chip:
//!
//! - Phase table and step-to-phase derivation
//! - Run state machine
//! - Interrupt mailbox shared between the dispatcher and the main loop
//! - Interrupt dispatcher (edge vs. timer attribution)
//! - Motion controller (the step loop)
//! - Configuration type definitions and validation
//!
//! Peripherals are reached through the traits in `ratchet-hal` and
//! [`traits::PhaseDriver`], so everything here runs against simulated
//! hardware in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod mailbox;
pub mod phase;
pub mod state;
pub mod traits;

#[cfg(test)]
mod sim;
