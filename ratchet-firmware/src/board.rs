//! BeagleBone Black wiring
//!
//! Which AM335x blocks the firmware uses, and the handles to them. The
//! handles carry nothing but base addresses, so the main loop and the IRQ
//! entry each build their own from the same constants.

use ratchet_hal::I2cConfig;
use ratchet_hal_am335x::clock::{ClockControl, ClockNotReady};
use ratchet_hal_am335x::intc::irq;
use ratchet_hal_am335x::pinmux::PinMux;
use ratchet_hal_am335x::{
    Am335xI2c, DmTimer, GpioEdge, GpioEdgeConfig, I2cBlock, Intc, IntcConfig, TimerConfig,
};

/// Button on P8.6
pub const BUTTON: GpioEdgeConfig = GpioEdgeConfig::BBB_BUTTON;
/// Step pacing timer
pub const STEP_TIMER: TimerConfig = TimerConfig::TIMER5;
/// Bus to the motor bonnet (P9.17/P9.18)
pub const MOTOR_BUS: I2cBlock = I2cBlock::I2C1;
/// Interrupt controller
pub const INTC: IntcConfig = IntcConfig::AM335X;

/// Interrupt inputs the dispatcher serves
pub const IRQS: [u8; 2] = [irq::GPIOINT1A, irq::TINT5];

/// Button edge detector
pub fn button() -> GpioEdge {
    // SAFETY: fixed GPIO1 base; FALLINGDETECT is only modified by the
    // dispatcher (IRQs masked) and the controller's masked re-arm
    unsafe { GpioEdge::new(BUTTON) }
}

/// Step timer
pub fn step_timer() -> DmTimer {
    // SAFETY: fixed DMTimer5 base, clocked at 32.768 kHz by `bring_up`
    unsafe { DmTimer::new(STEP_TIMER) }
}

/// Interrupt controller
pub fn intc() -> Intc {
    // SAFETY: fixed INTC base
    unsafe { Intc::new(INTC) }
}

/// Motor bus; called once, the PCA9685 driver owns it afterwards
pub fn motor_bus(config: I2cConfig) -> Am335xI2c {
    // SAFETY: fixed I2C1 base and the only handle to it
    unsafe { Am335xI2c::new(MOTOR_BUS, config) }
}

/// Clock and pad setup for every block above
pub fn bring_up() -> Result<(), ClockNotReady> {
    // SAFETY: runs once, privileged, before IRQs are enabled
    let (clocks, pins) = unsafe { (ClockControl::new(), PinMux::new()) };

    clocks.enable_gpio1()?;
    clocks.enable_timer5()?;
    clocks.enable_i2c1()?;

    pins.route_button();
    pins.route_i2c1();
    Ok(())
}
