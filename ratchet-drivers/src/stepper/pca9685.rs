//! PCA9685 phase driver (I2C)
//!
//! The PCA9685 is a 16-channel, 12-bit PWM controller. On the Adafruit motor
//! bonnet its outputs feed two TB6612 H-bridges, so each bridge input is a
//! PWM channel that is simply held fully on or fully off.
//!
//! # Channel map
//!
//! | Bridge input | Channel |
//! |--------------|---------|
//! | PWMA         | LED2    |
//! | AIN2         | LED3    |
//! | AIN1         | LED4    |
//! | BIN1         | LED5    |
//! | BIN2         | LED6    |
//! | PWMB         | LED7    |
//!
//! # Switching
//!
//! At init every motor line gets the full-on bit in `LEDn_ON_H`. After that
//! a line is switched with a single write to `LEDn_OFF_H`: the full-off bit
//! takes priority over full-on, so `0x10` turns the line off and `0x00`
//! turns it back on. One phase change is therefore four register writes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use ratchet_core::config::DriverConfig;
use ratchet_core::phase::{InvalidPhase, MotorLine, PhaseIndex};
use ratchet_core::traits::PhaseDriver;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// LED0 on-time, high byte (full-on bit lives here)
    pub const LED0_ON_H: u8 = 0x07;
    /// LED0 off-time, high byte (full-off bit lives here)
    pub const LED0_OFF_H: u8 = 0x09;
    /// All channels off-time, high byte
    pub const ALL_LED_OFF_H: u8 = 0xFD;
    /// PWM frequency prescaler (writable only in sleep)
    pub const PRE_SCALE: u8 = 0xFE;

    /// `LEDn_ON_H` for a channel
    pub const fn led_on_h(channel: u8) -> u8 {
        LED0_ON_H + 4 * channel
    }

    /// `LEDn_OFF_H` for a channel
    pub const fn led_off_h(channel: u8) -> u8 {
        LED0_OFF_H + 4 * channel
    }
}

/// MODE1 bits
mod mode1 {
    /// Low-power mode, oscillator off
    pub const SLEEP: u8 = 0x10;
    /// Normal mode, oscillator on
    pub const NORMAL: u8 = 0x00;
}

/// Full-on / full-off bit in the `_H` registers
const FULL: u8 = 0x10;

/// Oscillator start-up time after leaving sleep (µs)
const OSC_STARTUP_US: u32 = 500;

/// Bonnet channel assignments
pub mod channel {
    /// Bridge A speed input
    pub const PWMA: u8 = 2;
    /// Bridge A input 2
    pub const AIN2: u8 = 3;
    /// Bridge A input 1
    pub const AIN1: u8 = 4;
    /// Bridge B input 1
    pub const BIN1: u8 = 5;
    /// Bridge B input 2
    pub const BIN2: u8 = 6;
    /// Bridge B speed input
    pub const PWMB: u8 = 7;
}

/// PWM channel driving an H-bridge input
pub const fn line_channel(line: MotorLine) -> u8 {
    match line {
        MotorLine::Ain1 => channel::AIN1,
        MotorLine::Ain2 => channel::AIN2,
        MotorLine::Bin1 => channel::BIN1,
        MotorLine::Bin2 => channel::BIN2,
    }
}

/// PCA9685 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pca9685Error<E> {
    /// Phase index outside 1..=4; nothing was written
    InvalidPhase(u8),
    /// Bus transfer failed
    Bus(E),
}

impl<E> From<InvalidPhase> for Pca9685Error<E> {
    fn from(err: InvalidPhase) -> Self {
        Pca9685Error::InvalidPhase(err.0)
    }
}

/// PCA9685 on an I2C bus
pub struct Pca9685<I2C> {
    i2c: I2C,
    config: DriverConfig,
}

impl<I2C> Pca9685<I2C>
where
    I2C: I2c,
{
    /// Create a driver; the chip is not touched until [`init`](Self::init)
    pub fn new(i2c: I2C, config: DriverConfig) -> Self {
        Self { i2c, config }
    }

    /// Bus the chip sits on
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.config.address, &[register, value])
    }

    /// Bring the chip up with every motor line off
    ///
    /// The prescaler only latches while the oscillator is asleep, so it is
    /// written between entering and leaving sleep. Both bridge speed inputs
    /// end up held fully on.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        let prescale = self.config.prescale();

        self.write_register(reg::MODE1, mode1::SLEEP)?;
        self.write_register(reg::PRE_SCALE, prescale)?;
        self.write_register(reg::MODE1, mode1::NORMAL)?;
        delay.delay_us(OSC_STARTUP_US);

        self.write_register(reg::ALL_LED_OFF_H, FULL)?;

        for line in MotorLine::WRITE_ORDER {
            self.write_register(reg::led_on_h(line_channel(line)), FULL)?;
        }

        for speed in [channel::PWMA, channel::PWMB] {
            self.write_register(reg::led_on_h(speed), FULL)?;
            self.write_register(reg::led_off_h(speed), 0x00)?;
        }

        Ok(())
    }

    /// Switch one bridge input
    pub fn set_line(&mut self, line: MotorLine, on: bool) -> Result<(), I2C::Error> {
        let value = if on { 0x00 } else { FULL };
        self.write_register(reg::led_off_h(line_channel(line)), value)
    }

    /// Apply a phase given as a plain number
    ///
    /// Rejects indices outside 1..=4 before any bus traffic.
    pub fn apply_raw(&mut self, index: u8) -> Result<(), Pca9685Error<I2C::Error>> {
        let phase = PhaseIndex::new(index)?;
        self.apply(phase)
    }
}

impl<I2C> PhaseDriver for Pca9685<I2C>
where
    I2C: I2c,
{
    type Error = Pca9685Error<I2C::Error>;

    fn apply(&mut self, phase: PhaseIndex) -> Result<(), Self::Error> {
        for (line, on) in phase.pattern().lines() {
            self.set_line(line, on).map_err(Pca9685Error::Bus)?;
        }
        Ok(())
    }
}
