//! Events that trigger state transitions

/// Events that can move the controller between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Dispatcher consumed a button edge
    EdgeConsumed,
    /// All four line writes of a step went out and the timer was started
    StepIssued,
    /// Timer overflow observed by the main loop
    TimerTick {
        /// Whether the run still has steps left
        more_steps: bool,
    },
    /// A bus write failed while commanding a step
    BusFault,
    /// The host harness abandoned a wait
    Cancelled,
}
