//! Interrupt controller abstraction

/// Processor-side interrupt acceptance
///
/// Device-level pending bits are acknowledged by each peripheral. This trait
/// covers the controller that sits between the peripherals and the core.
pub trait InterruptController {
    /// Allow the controller to present the next interrupt
    ///
    /// Called once at the very end of every dispatch, after the peripheral
    /// that raised the interrupt has been acknowledged.
    fn end_of_interrupt(&mut self);

    /// Raw status of the active interrupt, for diagnostics
    ///
    /// Chips without a readable source register return 0.
    fn active_source(&self) -> u32 {
        0
    }
}
