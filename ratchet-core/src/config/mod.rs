//! Configuration types
//!
//! Motion pacing and motor driver settings. The firmware compiles these in
//! from `machine.toml`; nothing is configurable at runtime.

pub mod types;

pub use types::*;
