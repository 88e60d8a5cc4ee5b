//! Run state machine
//!
//! The controller's position in a run is explicit, finite and deterministic.
//! Every transition is a pure function of the current phase and an event.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{MotionPhase, RunState};
