//! Interrupt dispatcher
//!
//! Both interrupt sources share one processor vector. On every entry the
//! dispatcher works out which peripheral raised it, acknowledges that
//! peripheral, posts the matching flag to the mailbox and finally lets the
//! interrupt controller present the next interrupt.
//!
//! # Priority
//!
//! The button edge is checked first and at most one source is serviced per
//! entry. When both are pending, the timer stays latched; its line is still
//! asserted after [`InterruptController::end_of_interrupt`], so the
//! controller raises it again straight away and the next entry services it.
//! Nothing is lost, and the edge is never delayed behind a tick.
//!
//! # Ordering
//!
//! Peripheral acknowledgement always happens before end-of-interrupt. The
//! reverse order would let the controller re-sample a line that is about to
//! be cleared and either re-enter for nothing or drop a real interrupt.

use ratchet_hal::{EdgeSource, InterruptController, OneShotTimer};

use crate::mailbox::{DispatchStats, IrqFlags};

/// Which source a dispatch serviced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatched {
    /// Button edge: detection masked, button flag posted
    Edge,
    /// Timer overflow: counter reloaded, tick posted
    Timer,
    /// No recognised source; counted and ignored
    Spurious,
}

/// Interrupt dispatcher
///
/// Holds no state of its own beyond the peripheral handles, so interrupt
/// entry code can build one per interrupt.
pub struct Dispatcher<'a, E, T, C> {
    edge: E,
    timer: T,
    intc: C,
    flags: &'a IrqFlags,
    stats: &'a DispatchStats,
}

impl<'a, E, T, C> Dispatcher<'a, E, T, C>
where
    E: EdgeSource,
    T: OneShotTimer,
    C: InterruptController,
{
    /// Create a dispatcher over the given peripherals
    pub fn new(edge: E, timer: T, intc: C, flags: &'a IrqFlags, stats: &'a DispatchStats) -> Self {
        Self {
            edge,
            timer,
            intc,
            flags,
            stats,
        }
    }

    /// Service one interrupt
    ///
    /// Never blocks and never touches the I2C bus.
    pub fn dispatch(&mut self) -> Dispatched {
        let serviced = if self.edge.is_pending() {
            self.edge.acknowledge();
            // Presses during the run are dropped, not queued
            self.edge.disable();
            self.flags.post_button();
            self.stats.record_edge();
            Dispatched::Edge
        } else if self.timer.is_overflowed() {
            self.timer.clear_overflow();
            // One-shot: the counter stays wrapped until reloaded
            self.timer.reload();
            self.flags.post_tick();
            self.stats.record_tick();
            Dispatched::Timer
        } else {
            self.stats.record_spurious(self.intc.active_source());
            Dispatched::Spurious
        };

        self.intc.end_of_interrupt();
        trace!("dispatched {}", serviced);

        serviced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Op, Sim};

    fn dispatch_once(sim: &Sim) -> Dispatched {
        sim.dispatcher().dispatch()
    }

    #[test]
    fn test_edge_only() {
        let sim = Sim::new();
        sim.arm_edge();
        sim.press();
        sim.clear_log();

        assert_eq!(dispatch_once(&sim), Dispatched::Edge);

        assert!(sim.flags.button_pending());
        assert!(!sim.flags.tick_pending());
        assert_eq!(sim.log(), vec![Op::EdgeAck, Op::EdgeDisable, Op::EndOfInterrupt]);
        assert!(!sim.state().edge_armed);
        assert!(!sim.state().edge_latched);
    }

    #[test]
    fn test_timer_only() {
        let sim = Sim::new();
        sim.configure_timer(500);
        sim.overflow();
        sim.clear_log();

        assert_eq!(dispatch_once(&sim), Dispatched::Timer);

        assert!(sim.flags.tick_pending());
        assert!(!sim.flags.button_pending());
        assert_eq!(
            sim.log(),
            vec![Op::TimerClearOverflow, Op::TimerReload, Op::EndOfInterrupt]
        );
        let state = sim.state();
        assert!(!state.timer_overflow);
        assert_eq!(state.timer_count, state.timer_load);
    }

    #[test]
    fn test_both_pending_services_edge_first() {
        let sim = Sim::new();
        sim.arm_edge();
        sim.configure_timer(500);
        sim.press();
        sim.overflow();
        sim.clear_log();

        assert_eq!(dispatch_once(&sim), Dispatched::Edge);
        // Timer untouched and still latched for the next entry
        assert!(sim.state().timer_overflow);
        assert!(!sim.flags.tick_pending());
        assert!(!sim.log().contains(&Op::TimerClearOverflow));

        assert_eq!(dispatch_once(&sim), Dispatched::Timer);
        assert!(sim.flags.tick_pending());
        assert!(!sim.state().timer_overflow);
    }

    #[test]
    fn test_spurious_still_ends_interrupt() {
        let sim = Sim::new();

        assert_eq!(dispatch_once(&sim), Dispatched::Spurious);

        assert_eq!(sim.log(), vec![Op::EndOfInterrupt]);
        assert!(!sim.flags.button_pending());
        assert!(!sim.flags.tick_pending());

        let report = sim.stats.take_spurious().unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.last_source, Sim::SPURIOUS_SOURCE);
    }

    #[test]
    fn test_end_of_interrupt_is_last() {
        let sim = Sim::new();
        sim.arm_edge();
        sim.configure_timer(500);

        for source in 0..3 {
            match source {
                0 => sim.press(),
                1 => sim.overflow(),
                _ => {}
            }
            sim.clear_log();
            dispatch_once(&sim);

            let log = sim.log();
            assert_eq!(log.last(), Some(&Op::EndOfInterrupt));
            assert_eq!(log.iter().filter(|op| **op == Op::EndOfInterrupt).count(), 1);
        }
    }

    #[test]
    fn test_stats_follow_dispatches() {
        let sim = Sim::new();
        sim.arm_edge();
        sim.configure_timer(500);

        sim.press();
        dispatch_once(&sim);
        sim.overflow();
        dispatch_once(&sim);
        sim.overflow();
        dispatch_once(&sim);
        dispatch_once(&sim);

        let snap = sim.stats.snapshot();
        assert_eq!(snap.edges, 1);
        assert_eq!(snap.ticks, 2);
        assert_eq!(snap.spurious, 1);
    }
}
