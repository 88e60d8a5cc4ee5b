//! State machine definition
//!
//! ```text
//!            EdgeConsumed             StepIssued
//!   Idle ─────────────────▶ Commanding ──────────▶ AwaitingTick
//!    ▲                        │   ▲                     │
//!    │        BusFault        │   │ TimerTick{more}     │
//!    ├────────────────────────┘   └─────────────────────┤
//!    │                                                  │
//!    └──────────── TimerTick{last} / Cancelled ─────────┘
//! ```

use super::events::Event;

/// Coarse run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Waiting for a button press, edge detection armed
    Idle,
    /// Stepping, edge detection masked
    Running,
}

/// Fine-grained controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// No run in progress
    Idle,
    /// Writing the next phase pattern to the driver
    Commanding,
    /// Timer armed, sleeping until it overflows
    AwaitingTick,
}

impl MotionPhase {
    /// Coarse state for this phase
    pub fn run_state(&self) -> RunState {
        match self {
            MotionPhase::Idle => RunState::Idle,
            MotionPhase::Commanding | MotionPhase::AwaitingTick => RunState::Running,
        }
    }

    /// Check if the bus may be driven in this phase
    pub fn bus_allowed(&self) -> bool {
        matches!(self, MotionPhase::Commanding)
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use MotionPhase::*;

        match (self, event) {
            (Idle, EdgeConsumed) => Commanding,

            (Commanding, StepIssued) => AwaitingTick,
            (Commanding, BusFault) => Idle,

            (AwaitingTick, TimerTick { more_steps: true }) => Commanding,
            (AwaitingTick, TimerTick { more_steps: false }) => Idle,
            (AwaitingTick, Cancelled) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_starts_run() {
        assert_eq!(MotionPhase::Idle.transition(Event::EdgeConsumed), MotionPhase::Commanding);
    }

    #[test]
    fn test_step_cycle() {
        let phase = MotionPhase::Commanding;

        let waiting = phase.transition(Event::StepIssued);
        assert_eq!(waiting, MotionPhase::AwaitingTick);

        let next = waiting.transition(Event::TimerTick { more_steps: true });
        assert_eq!(next, MotionPhase::Commanding);
    }

    #[test]
    fn test_last_tick_returns_to_idle() {
        let done = MotionPhase::AwaitingTick.transition(Event::TimerTick { more_steps: false });
        assert_eq!(done, MotionPhase::Idle);
    }

    #[test]
    fn test_aborts_return_to_idle() {
        assert_eq!(MotionPhase::Commanding.transition(Event::BusFault), MotionPhase::Idle);
        assert_eq!(MotionPhase::AwaitingTick.transition(Event::Cancelled), MotionPhase::Idle);
    }

    #[test]
    fn test_stray_events_ignored() {
        // A second edge cannot restart a run in progress
        assert_eq!(
            MotionPhase::AwaitingTick.transition(Event::EdgeConsumed),
            MotionPhase::AwaitingTick
        );
        assert_eq!(
            MotionPhase::Commanding.transition(Event::EdgeConsumed),
            MotionPhase::Commanding
        );
        // A tick while idle does nothing
        assert_eq!(
            MotionPhase::Idle.transition(Event::TimerTick { more_steps: true }),
            MotionPhase::Idle
        );
    }

    #[test]
    fn test_run_state() {
        assert_eq!(MotionPhase::Idle.run_state(), RunState::Idle);
        assert_eq!(MotionPhase::Commanding.run_state(), RunState::Running);
        assert_eq!(MotionPhase::AwaitingTick.run_state(), RunState::Running);
    }

    #[test]
    fn test_bus_allowed() {
        assert!(MotionPhase::Commanding.bus_allowed());
        assert!(!MotionPhase::Idle.bus_allowed());
        assert!(!MotionPhase::AwaitingTick.bus_allowed());
    }
}
