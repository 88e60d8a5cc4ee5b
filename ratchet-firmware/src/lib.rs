//! Ratchet - Button-Triggered Stepper Firmware
//!
//! Firmware library for the BeagleBone Black. One press of the button on
//! P8.6 turns the stepper on the motor bonnet a fixed number of full steps,
//! each commanded over I2C to the PCA9685 and paced by DMTimer5.
//!
//! # Entry points
//!
//! The board's startup code owns the vector table, stacks and processor
//! modes. It links this library and calls:
//!
//! - [`ratchet_main`] from reset with IRQs masked (never returns)
//! - [`ratchet_irq`] from the IRQ vector, after saving context
//!
//! The final link must include `defmt.x` for logging over RTT.

#![no_std]

mod board;

/// Machine configuration from machine.toml
mod machine {
    include!(concat!(env!("OUT_DIR"), "/machine_config.rs"));
}

use core::convert::Infallible;

use defmt::{error, info};
use defmt_rtt as _;

use ratchet_core::controller::MotionController;
use ratchet_core::dispatch::Dispatcher;
use ratchet_core::mailbox::{DispatchStats, IrqFlags};
use ratchet_drivers::stepper::Pca9685;
use ratchet_hal::TimerError;
use ratchet_hal_am335x::clock::ClockNotReady;
use ratchet_hal_am335x::{cpu, CpuIdle, I2cError, SpinDelay};

use crate::machine::MACHINE;

/// Interrupt mailbox shared by `ratchet_irq` and the main loop
static FLAGS: IrqFlags = IrqFlags::new();
/// Interrupt counters
static STATS: DispatchStats = DispatchStats::new();

/// Bring-up failures
#[derive(Debug, Clone, Copy, defmt::Format)]
enum StartupError {
    /// A peripheral clock never came up
    Clock(ClockNotReady),
    /// Step delay out of the timer's range
    Timer(TimerError),
    /// I2C controller reset timed out
    Bus(I2cError),
    /// PCA9685 did not take its setup writes
    Driver(I2cError),
    /// Interrupt controller reset timed out
    Intc,
}

/// Reset entry
#[no_mangle]
pub extern "C" fn ratchet_main() -> ! {
    info!(
        "ratchet: {} steps per press, {} ms apart",
        MACHINE.motion.max_steps,
        MACHINE.motion.step_delay_ms
    );

    match run() {
        Ok(never) => match never {},
        Err(e) => {
            error!("startup failed: {}", e);
            park()
        }
    }
}

/// IRQ entry, once per interrupt
#[no_mangle]
pub extern "C" fn ratchet_irq() {
    let mut dispatcher = Dispatcher::new(
        board::button(),
        board::step_timer(),
        board::intc(),
        &FLAGS,
        &STATS,
    );
    dispatcher.dispatch();
}

/// Bring the board up, then serve presses forever
fn run() -> Result<Infallible, StartupError> {
    board::bring_up().map_err(StartupError::Clock)?;

    let driver = Pca9685::new(board::motor_bus(MACHINE.bus.i2c()), MACHINE.pca9685);
    let mut controller = MotionController::new(
        driver,
        board::button(),
        board::step_timer(),
        CpuIdle,
        &FLAGS,
        MACHINE.motion,
    );

    // Edge source, then timer
    controller.prepare().map_err(StartupError::Timer)?;

    // Bus, then the chip on it
    let pca = controller.driver_mut();
    pca.bus_mut().init().map_err(StartupError::Bus)?;
    pca.init(&mut SpinDelay::new(SpinDelay::BOOT_CORE_HZ))
        .map_err(StartupError::Driver)?;
    info!("pca9685 at {=u8:#x} ready", MACHINE.pca9685.address);

    let intc = board::intc();
    if !intc.reset() {
        return Err(StartupError::Intc);
    }
    for irq in board::IRQS {
        intc.unmask(irq);
    }

    // SAFETY: every peripheral is configured and `ratchet_irq` serves
    // each input unmasked above
    unsafe { cpu::irq_enable() };
    info!("waiting for button");

    // CpuIdle never cancels
    controller.serve(&STATS);
    error!("main loop returned");
    park()
}

/// Stop with IRQs masked
fn park() -> ! {
    cpu::irq_disable();
    loop {
        cpu::wfi();
    }
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    cpu::irq_disable();
    error!("panic: {}", defmt::Display2Format(info));
    loop {
        cpu::wfi();
    }
}
