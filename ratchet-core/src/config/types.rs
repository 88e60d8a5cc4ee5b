//! Configuration type definitions
//!
//! These types describe one machine: how far a press moves the motor, how
//! steps are paced, and how the PCA9685 on the I2C bus is set up.

use ratchet_hal::I2cConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Full steps per button press
pub const MAX_STEPS: u16 = 200;

/// Delay between steps in milliseconds
pub const STEP_DELAY_MS: u32 = 500;

/// Button debounce window in milliseconds
pub const DEBOUNCE_MS: u32 = 5;

/// Shortest allowed step delay
///
/// A step issues four blocking bus writes before the timer is restarted, so
/// the delay has to cover that with margin.
pub const MIN_STEP_DELAY_MS: u32 = 10;

/// Longest debounce window the GPIO filter can hold (256 × 31 µs)
pub const MAX_DEBOUNCE_MS: u32 = 7;

/// Bus writes per step (one per H-bridge line)
pub const WRITES_PER_STEP: u32 = 4;

/// PCA9685 internal oscillator
pub const PCA9685_OSCILLATOR_HZ: u32 = 25_000_000;

/// Smallest PRE_SCALE value the PCA9685 accepts
pub const MIN_PRESCALE: u8 = 3;

/// Default PCA9685 address (motor bonnet with no address jumpers)
pub const PCA9685_ADDRESS: u8 = 0x60;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A run must take at least one step
    ZeroSteps,
    /// Step delay shorter than the bus needs to command a step
    StepDelayTooShort,
    /// Debounce window outside 1..=MAX_DEBOUNCE_MS
    DebounceOutOfRange,
    /// PWM frequency outside what the prescaler can divide down to
    PwmFrequencyOutOfRange,
    /// Device address outside the PCA9685 range (0x40..=0x7F)
    InvalidAddress,
    /// Bus frequency of zero or above fast mode plus
    BusFrequencyOutOfRange,
}

/// Step pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MotionConfig {
    /// Steps taken per button press
    pub max_steps: u16,
    /// Delay between steps (ms)
    pub step_delay_ms: u32,
    /// Button debounce window (ms)
    pub debounce_ms: u32,
}

impl MotionConfig {
    /// Factory defaults: 200 steps, 500 ms apart, 5 ms debounce
    pub const DEFAULT: Self = Self {
        max_steps: MAX_STEPS,
        step_delay_ms: STEP_DELAY_MS,
        debounce_ms: DEBOUNCE_MS,
    };
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// PCA9685 settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DriverConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Oscillator feeding the prescaler (Hz)
    pub oscillator_hz: u32,
    /// PWM output frequency (Hz)
    pub pwm_frequency_hz: u32,
}

impl DriverConfig {
    /// Motor bonnet defaults
    pub const DEFAULT: Self = Self {
        address: PCA9685_ADDRESS,
        oscillator_hz: PCA9685_OSCILLATOR_HZ,
        pwm_frequency_hz: 1_000,
    };

    /// Prescaler for the PWM frequency before clamping
    ///
    /// `round(oscillator / (4096 × frequency)) - 1`, or `None` for a zero
    /// frequency.
    pub const fn raw_prescale(&self) -> Option<u64> {
        if self.pwm_frequency_hz == 0 {
            return None;
        }
        let counts = 4096 * self.pwm_frequency_hz as u64;
        let divider = (self.oscillator_hz as u64 + counts / 2) / counts;
        Some(divider.saturating_sub(1))
    }

    /// PRE_SCALE register value, clamped to the 3..=255 the chip accepts
    ///
    /// A zero frequency selects the slowest rate.
    pub const fn prescale(&self) -> u8 {
        match self.raw_prescale() {
            None => u8::MAX,
            Some(raw) if raw < MIN_PRESCALE as u64 => MIN_PRESCALE,
            Some(raw) if raw > u8::MAX as u64 => u8::MAX,
            Some(raw) => raw as u8,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// I2C bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct BusConfig {
    /// SCL frequency (Hz)
    pub frequency_hz: u32,
}

impl BusConfig {
    /// Fast mode
    pub const DEFAULT: Self = Self {
        frequency_hz: 400_000,
    };

    /// Convert to the HAL bus configuration
    pub const fn i2c(&self) -> I2cConfig {
        I2cConfig {
            frequency: self.frequency_hz,
            poll_budget: I2cConfig::DEFAULT_POLL_BUDGET,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MachineConfig {
    /// Step pacing
    pub motion: MotionConfig,
    /// Motor driver chip
    pub pca9685: DriverConfig,
    /// I2C bus
    pub bus: BusConfig,
}

impl MachineConfig {
    /// Factory defaults for every section
    pub const DEFAULT: Self = Self {
        motion: MotionConfig::DEFAULT,
        pca9685: DriverConfig::DEFAULT,
        bus: BusConfig::DEFAULT,
    };

    /// Check the configuration against hardware limits
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motion.max_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }

        if self.motion.debounce_ms == 0 || self.motion.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::DebounceOutOfRange);
        }

        if self.bus.frequency_hz == 0 || self.bus.frequency_hz > 1_000_000 {
            return Err(ConfigError::BusFrequencyOutOfRange);
        }

        // The timer restarts only after all four writes of a step are done
        let step_us = self.motion.step_delay_ms as u64 * 1000;
        let bus_us = WRITES_PER_STEP as u64 * self.bus.i2c().register_write_us() as u64;
        if self.motion.step_delay_ms < MIN_STEP_DELAY_MS || step_us <= bus_us {
            return Err(ConfigError::StepDelayTooShort);
        }

        if !(0x40..=0x7F).contains(&self.pca9685.address) {
            return Err(ConfigError::InvalidAddress);
        }

        match self.pca9685.raw_prescale() {
            Some(raw) if raw >= MIN_PRESCALE as u64 && raw <= u8::MAX as u64 => {}
            _ => return Err(ConfigError::PwmFrequencyOutOfRange),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(MachineConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(MachineConfig::default(), MachineConfig::DEFAULT);
    }

    #[test]
    fn test_default_values() {
        let config = MachineConfig::default();
        assert_eq!(config.motion.max_steps, 200);
        assert_eq!(config.motion.step_delay_ms, 500);
        assert_eq!(config.motion.debounce_ms, 5);
        assert_eq!(config.pca9685.address, 0x60);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let mut config = MachineConfig::DEFAULT;
        config.motion.max_steps = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSteps));
    }

    #[test]
    fn test_step_delay_floor() {
        let mut config = MachineConfig::DEFAULT;
        config.motion.step_delay_ms = MIN_STEP_DELAY_MS - 1;
        assert_eq!(config.validate(), Err(ConfigError::StepDelayTooShort));

        config.motion.step_delay_ms = MIN_STEP_DELAY_MS;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_slow_bus_needs_longer_steps() {
        // Four writes at 1 kHz take ~116 ms
        let mut config = MachineConfig::DEFAULT;
        config.bus.frequency_hz = 1_000;
        config.motion.step_delay_ms = 100;
        assert_eq!(config.validate(), Err(ConfigError::StepDelayTooShort));

        config.motion.step_delay_ms = 200;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_debounce_range() {
        let mut config = MachineConfig::DEFAULT;
        config.motion.debounce_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::DebounceOutOfRange));

        config.motion.debounce_ms = MAX_DEBOUNCE_MS + 1;
        assert_eq!(config.validate(), Err(ConfigError::DebounceOutOfRange));

        config.motion.debounce_ms = MAX_DEBOUNCE_MS;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_address_range() {
        let mut config = MachineConfig::DEFAULT;
        config.pca9685.address = 0x3F;
        assert_eq!(config.validate(), Err(ConfigError::InvalidAddress));

        config.pca9685.address = 0x40;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_pwm_frequency_range() {
        let mut config = MachineConfig::DEFAULT;

        // 25 MHz / 4096 / 2000 Hz = 3.05 -> 3 - 1, below the prescaler minimum
        config.pca9685.pwm_frequency_hz = 2_000;
        assert_eq!(config.validate(), Err(ConfigError::PwmFrequencyOutOfRange));

        // 25 MHz / 4096 / 20 Hz = 305.2 -> 305 - 1, above the maximum
        config.pca9685.pwm_frequency_hz = 20;
        assert_eq!(config.validate(), Err(ConfigError::PwmFrequencyOutOfRange));

        config.pca9685.pwm_frequency_hz = 0;
        assert_eq!(config.validate(), Err(ConfigError::PwmFrequencyOutOfRange));

        config.pca9685.pwm_frequency_hz = 50;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_pwm_frequency_limits_follow_rounded_prescale() {
        let mut config = MachineConfig::DEFAULT;

        // Datasheet maximum: 25 MHz / 4096 / 1526 Hz = 3.9997 -> 4 - 1
        config.pca9685.pwm_frequency_hz = 1_526;
        assert_eq!(config.pca9685.raw_prescale(), Some(3));
        assert_eq!(config.validate(), Ok(()));

        // 25 MHz / 4096 / 24 Hz = 254.3 -> 254 - 1
        config.pca9685.pwm_frequency_hz = 24;
        assert_eq!(config.pca9685.raw_prescale(), Some(253));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_prescale() {
        // 25 MHz / 4096 / 1 kHz = 6.1 -> 6 - 1
        assert_eq!(DriverConfig::DEFAULT.prescale(), 5);

        let servo = DriverConfig {
            pwm_frequency_hz: 50,
            ..DriverConfig::DEFAULT
        };
        // 25 MHz / 4096 / 50 Hz = 122.07 -> 122 - 1
        assert_eq!(servo.prescale(), 121);
    }

    #[test]
    fn test_prescale_clamps() {
        let at = |pwm_frequency_hz| DriverConfig {
            pwm_frequency_hz,
            ..DriverConfig::DEFAULT
        };
        assert_eq!(at(10_000).prescale(), MIN_PRESCALE);
        assert_eq!(at(1).prescale(), 255);
        assert_eq!(at(0).prescale(), 255);
        assert_eq!(at(0).raw_prescale(), None);
    }

    #[test]
    fn test_bus_frequency_range() {
        let mut config = MachineConfig::DEFAULT;
        config.bus.frequency_hz = 0;
        assert_eq!(config.validate(), Err(ConfigError::BusFrequencyOutOfRange));

        config.bus.frequency_hz = 3_400_000;
        assert_eq!(config.validate(), Err(ConfigError::BusFrequencyOutOfRange));
    }
}
