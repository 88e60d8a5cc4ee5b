//! Motion controller
//!
//! The main-loop half of the firmware. It sleeps until the dispatcher posts
//! a button edge, then walks the step counter through one run: command the
//! phase over the bus, start the one-shot timer, sleep until the dispatcher
//! posts the tick, repeat. When the run ends, for any reason, the edge
//! detector is re-armed so the next press is seen.
//!
//! The controller never runs in interrupt context and is the only code that
//! touches the bus.

use ratchet_hal::{Cancelled, EdgeSource, IdleWait, OneShotTimer, TimerError};

use crate::config::MotionConfig;
use crate::mailbox::{DispatchStats, IrqFlags};
use crate::phase::PhaseIndex;
use crate::state::{Event, MotionPhase, RunState};
use crate::traits::{Loggable, PhaseDriver};

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunReport {
    /// Steps taken
    pub steps: u16,
    /// Phase the motor was left in
    pub last_phase: PhaseIndex,
}

/// Why a run ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError<E> {
    /// The driver failed to command a step; earlier steps completed
    Bus {
        /// Step number (1-based) whose bus writes failed
        step: u16,
        /// Transport error from the driver
        error: E,
    },
    /// The tick wait was abandoned (host harness only)
    Cancelled {
        /// Step that was waiting for its tick
        step: u16,
    },
}

impl<E> RunError<E> {
    /// Step number the run stopped at
    pub fn step(&self) -> u16 {
        match self {
            RunError::Bus { step, .. } | RunError::Cancelled { step } => *step,
        }
    }
}

/// Step sequencer for one motor
pub struct MotionController<'a, D, E, T, W> {
    driver: D,
    edge: E,
    timer: T,
    wait: W,
    flags: &'a IrqFlags,
    config: MotionConfig,
    phase: MotionPhase,
    step: u16,
    runs: u32,
}

impl<'a, D, E, T, W> MotionController<'a, D, E, T, W>
where
    D: PhaseDriver,
    E: EdgeSource,
    T: OneShotTimer,
    W: IdleWait,
{
    /// Create a controller; no hardware is touched until [`Self::prepare`]
    pub fn new(driver: D, edge: E, timer: T, wait: W, flags: &'a IrqFlags, config: MotionConfig) -> Self {
        Self {
            driver,
            edge,
            timer,
            wait,
            flags,
            config,
            phase: MotionPhase::Idle,
            step: 0,
            runs: 0,
        }
    }

    /// Configure the edge detector and the step timer
    ///
    /// Must run before interrupts are unmasked. The timer is loaded but not
    /// started.
    pub fn prepare(&mut self) -> Result<(), TimerError> {
        self.edge.configure(self.config.debounce_ms);
        self.timer.configure(self.config.step_delay_ms)?;
        debug!(
            "edge debounce {} ms, step delay {} ms at {} Hz",
            self.config.debounce_ms,
            self.config.step_delay_ms,
            self.timer.clock_hz()
        );
        Ok(())
    }

    /// Coarse run state
    pub fn run_state(&self) -> RunState {
        self.phase.run_state()
    }

    /// Steps taken in the current or most recent run
    pub fn step_counter(&self) -> u16 {
        self.step
    }

    /// Phase last commanded, `None` before the first step of a run
    pub fn current_phase(&self) -> Option<PhaseIndex> {
        if self.step == 0 {
            None
        } else {
            Some(PhaseIndex::from_step(self.step))
        }
    }

    /// Runs started since boot
    pub fn run_count(&self) -> u32 {
        self.runs
    }

    /// Motor driver, for bring-up before the first run
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Sleep until the dispatcher posts a button edge
    pub fn wait_for_press(&mut self) -> Result<(), Cancelled> {
        let flags = self.flags;
        self.wait.block_until(|| flags.button_pending())
    }

    /// Take one full run of steps
    ///
    /// The edge detector was masked by the dispatcher when the press was
    /// consumed. It is re-armed exactly once on the way out, whether the run
    /// completed or not.
    pub fn run(&mut self) -> Result<RunReport, RunError<D::Error>> {
        self.phase = self.phase.transition(Event::EdgeConsumed);
        self.step = 0;
        self.runs = self.runs.wrapping_add(1);
        // A leftover tick from an abandoned wait must not pace step 1
        self.flags.take_tick();

        info!("run {} started: {} steps", self.runs, self.config.max_steps);
        let outcome = self.step_loop();
        self.rearm();

        outcome
    }

    fn step_loop(&mut self) -> Result<RunReport, RunError<D::Error>> {
        let flags = self.flags;

        while self.step < self.config.max_steps {
            self.step += 1;
            let phase = PhaseIndex::from_step(self.step);
            debug_assert!(self.phase.bus_allowed());

            if let Err(error) = self.driver.apply(phase) {
                self.phase = self.phase.transition(Event::BusFault);
                return Err(RunError::Bus {
                    step: self.step,
                    error,
                });
            }

            // Counter was reloaded by the dispatcher on the previous tick
            self.timer.start();
            self.phase = self.phase.transition(Event::StepIssued);

            if self.wait.block_until(|| flags.tick_pending()).is_err() {
                self.phase = self.phase.transition(Event::Cancelled);
                return Err(RunError::Cancelled { step: self.step });
            }
            flags.take_tick();

            let more_steps = self.step < self.config.max_steps;
            self.phase = self.phase.transition(Event::TimerTick { more_steps });
        }

        Ok(RunReport {
            steps: self.step,
            last_phase: PhaseIndex::from_step(self.step),
        })
    }

    /// Clear the press and re-arm edge detection
    ///
    /// The stale latch is cleared before detection is re-armed, and the flag
    /// is cleared in the same masked section, so an edge arriving right after
    /// re-arming is never wiped out by the flag clear.
    fn rearm(&mut self) {
        critical_section::with(|_| {
            self.edge.acknowledge();
            self.flags.clear_button();
            self.edge.enable();
        });
        self.phase = MotionPhase::Idle;
    }

    /// Serve button presses until the wait is cancelled
    ///
    /// On target the wait never cancels, so this never returns. Run errors are
    /// logged and the loop carries on with the edge detector re-armed.
    /// Spurious interrupts wake the idle wait as well, so they are reported
    /// without waiting for the next press.
    pub fn serve(&mut self, stats: &DispatchStats) -> Cancelled
    where
        D::Error: Loggable,
    {
        let flags = self.flags;

        loop {
            if let Some(report) = stats.take_spurious() {
                warn!(
                    "{} spurious interrupt(s), last source {=u32:#x}",
                    report.new,
                    report.last_source
                );
            }

            let woke = self
                .wait
                .block_until(|| flags.button_pending() || stats.has_unreported_spurious());
            if let Err(cancelled) = woke {
                return cancelled;
            }
            if !flags.button_pending() {
                continue;
            }

            match self.run() {
                Ok(report) => info!(
                    "run complete: {} steps, phase {}",
                    report.steps,
                    report.last_phase.get()
                ),
                Err(RunError::Bus { step, error }) => {
                    warn!("run aborted at step {}: {}", step, error)
                }
                Err(RunError::Cancelled { .. }) => return Cancelled,
            }
            debug!("interrupt counts: {}", stats.snapshot());
        }
    }
}
