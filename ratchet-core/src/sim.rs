//! Simulated board for host tests
//!
//! One `RefCell` holds the whole peripheral state; the handles below borrow
//! it briefly per call, the same way register handles on the target all
//! point at one memory map. Time only moves when the main loop sleeps:
//! each sleep delivers the next hardware event and runs the dispatcher, the
//! way an interrupt would.

use core::cell::{Ref, RefCell};

use ratchet_hal::{
    load_value, Cancelled, EdgeSource, IdleWait, InterruptController, OneShotTimer, TimerError,
};

use crate::dispatch::Dispatcher;
use crate::mailbox::{DispatchStats, IrqFlags};
use crate::phase::PhaseIndex;
use crate::traits::PhaseDriver;

/// Peripheral operations, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    EdgeConfigure(u32),
    EdgeEnable,
    EdgeDisable,
    EdgeAck,
    TimerConfigure(u32),
    TimerStart,
    TimerReload,
    TimerClearOverflow,
    EndOfInterrupt,
    Apply(u8),
}

/// Transport error from the simulated driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimBusError;

#[derive(Debug, Default)]
pub struct SimState {
    pub edge_armed: bool,
    pub edge_latched: bool,
    pub debounce_ms: u32,

    pub timer_load: u32,
    pub timer_count: u32,
    pub timer_running: bool,
    pub timer_overflow: bool,
    /// Starts issued while the counter still held its wrapped value
    pub stale_starts: u32,

    pub log: Vec<Op>,
    pub applied: Vec<u8>,
    pub apply_calls: u32,
    pub sleeps: u32,

    /// Unattributed interrupts delivered once the board is otherwise quiet
    pub idle_spurious: u32,
    /// Presses delivered once the board is otherwise quiet, after any
    /// `idle_spurious`
    pub presses: u32,
    /// Press delivered alongside the tick that follows this many applies
    pub press_during_step: Option<usize>,
    /// Apply call number (1-based) that fails
    pub fail_apply_at: Option<u32>,
}

pub struct Sim {
    state: RefCell<SimState>,
    pub flags: IrqFlags,
    pub stats: DispatchStats,
}

impl Sim {
    pub const SPURIOUS_SOURCE: u32 = 0x7F;
    pub const CLOCK_HZ: u32 = 32_768;

    pub fn new() -> Self {
        Self {
            state: RefCell::new(SimState::default()),
            flags: IrqFlags::new(),
            stats: DispatchStats::new(),
        }
    }

    pub fn state(&self) -> Ref<'_, SimState> {
        self.state.borrow()
    }

    pub fn script(&self, f: impl FnOnce(&mut SimState)) {
        f(&mut self.state.borrow_mut());
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn arm_edge(&self) {
        self.state.borrow_mut().edge_armed = true;
    }

    /// Falling edge on the button; latched only while detection is armed
    pub fn press(&self) {
        let mut s = self.state.borrow_mut();
        if s.edge_armed {
            s.edge_latched = true;
        }
    }

    pub fn configure_timer(&self, delay_ms: u32) {
        let mut s = self.state.borrow_mut();
        s.timer_load = load_value(delay_ms, Self::CLOCK_HZ).unwrap();
        s.timer_count = s.timer_load;
    }

    /// Counter wraps past zero
    pub fn overflow(&self) {
        let mut s = self.state.borrow_mut();
        s.timer_running = false;
        s.timer_count = 0;
        s.timer_overflow = true;
    }

    pub fn edge(&self) -> SimEdge<'_> {
        SimEdge(&self.state)
    }

    pub fn timer(&self) -> SimTimer<'_> {
        SimTimer(&self.state)
    }

    pub fn intc(&self) -> SimIntc<'_> {
        SimIntc(&self.state)
    }

    pub fn driver(&self) -> SimDriver<'_> {
        SimDriver(&self.state)
    }

    pub fn waiter(&self) -> SimWait<'_> {
        SimWait(self)
    }

    pub fn dispatcher(&self) -> Dispatcher<'_, SimEdge<'_>, SimTimer<'_>, SimIntc<'_>> {
        Dispatcher::new(self.edge(), self.timer(), self.intc(), &self.flags, &self.stats)
    }

    fn any_pending(&self) -> bool {
        let s = self.state.borrow();
        s.edge_latched || s.timer_overflow
    }

    /// Deliver the next hardware event, then take interrupts until quiet
    fn advance(&self) -> Result<(), Cancelled> {
        let mut spurious = false;
        {
            let mut s = self.state.borrow_mut();
            s.sleeps += 1;

            if s.timer_running {
                s.timer_running = false;
                s.timer_count = 0;
                s.timer_overflow = true;
                if s.press_during_step == Some(s.applied.len()) {
                    s.press_during_step = None;
                    if s.edge_armed {
                        s.edge_latched = true;
                    }
                }
            } else if s.idle_spurious > 0 {
                s.idle_spurious -= 1;
                spurious = true;
            } else if s.presses > 0 {
                s.presses -= 1;
                if s.edge_armed {
                    s.edge_latched = true;
                }
            } else {
                return Err(Cancelled);
            }
        }

        if spurious {
            self.dispatcher().dispatch();
        }
        while self.any_pending() {
            self.dispatcher().dispatch();
        }
        Ok(())
    }
}

pub struct SimEdge<'a>(&'a RefCell<SimState>);

impl EdgeSource for SimEdge<'_> {
    fn configure(&mut self, debounce_ms: u32) {
        let mut s = self.0.borrow_mut();
        s.debounce_ms = debounce_ms;
        s.edge_armed = true;
        s.log.push(Op::EdgeConfigure(debounce_ms));
    }

    fn enable(&mut self) {
        let mut s = self.0.borrow_mut();
        s.edge_armed = true;
        s.log.push(Op::EdgeEnable);
    }

    fn disable(&mut self) {
        let mut s = self.0.borrow_mut();
        s.edge_armed = false;
        s.log.push(Op::EdgeDisable);
    }

    fn acknowledge(&mut self) {
        let mut s = self.0.borrow_mut();
        s.edge_latched = false;
        s.log.push(Op::EdgeAck);
    }

    fn is_pending(&self) -> bool {
        self.0.borrow().edge_latched
    }
}

pub struct SimTimer<'a>(&'a RefCell<SimState>);

impl OneShotTimer for SimTimer<'_> {
    fn clock_hz(&self) -> u32 {
        Sim::CLOCK_HZ
    }

    fn configure(&mut self, delay_ms: u32) -> Result<(), TimerError> {
        let load = load_value(delay_ms, Sim::CLOCK_HZ)?;
        let mut s = self.0.borrow_mut();
        s.timer_load = load;
        s.timer_count = load;
        s.log.push(Op::TimerConfigure(delay_ms));
        Ok(())
    }

    fn start(&mut self) {
        let mut s = self.0.borrow_mut();
        if s.timer_count != s.timer_load {
            s.stale_starts += 1;
        }
        s.timer_running = true;
        s.log.push(Op::TimerStart);
    }

    fn reload(&mut self) {
        let mut s = self.0.borrow_mut();
        s.timer_count = s.timer_load;
        s.log.push(Op::TimerReload);
    }

    fn is_overflowed(&self) -> bool {
        self.0.borrow().timer_overflow
    }

    fn clear_overflow(&mut self) {
        let mut s = self.0.borrow_mut();
        s.timer_overflow = false;
        s.log.push(Op::TimerClearOverflow);
    }
}

pub struct SimIntc<'a>(&'a RefCell<SimState>);

impl InterruptController for SimIntc<'_> {
    fn end_of_interrupt(&mut self) {
        self.0.borrow_mut().log.push(Op::EndOfInterrupt);
    }

    fn active_source(&self) -> u32 {
        Sim::SPURIOUS_SOURCE
    }
}

pub struct SimDriver<'a>(&'a RefCell<SimState>);

impl PhaseDriver for SimDriver<'_> {
    type Error = SimBusError;

    fn apply(&mut self, phase: PhaseIndex) -> Result<(), SimBusError> {
        let mut s = self.0.borrow_mut();
        s.apply_calls += 1;
        if s.fail_apply_at == Some(s.apply_calls) {
            return Err(SimBusError);
        }
        s.applied.push(phase.get());
        s.log.push(Op::Apply(phase.get()));
        Ok(())
    }
}

pub struct SimWait<'a>(&'a Sim);

impl IdleWait for SimWait<'_> {
    fn idle_unless<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Cancelled> {
        if ready() {
            return Ok(());
        }
        self.0.advance()
    }
}

/// Wait whose wakeups never come
pub struct NeverWait;

impl IdleWait for NeverWait {
    fn idle_unless<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Cancelled> {
        if ready() {
            Ok(())
        } else {
            Err(Cancelled)
        }
    }
}
