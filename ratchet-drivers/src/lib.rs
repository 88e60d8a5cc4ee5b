//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in ratchet-core:
//!
//! - Stepper phase drivers (PCA9685 on the Adafruit motor bonnet)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod stepper;
