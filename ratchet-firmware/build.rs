//! Build script for ratchet-firmware
//!
//! - Parses and validates machine.toml at compile time
//! - Emits the validated configuration as a `const` for the firmware

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ratchet_core::config::{ConfigError, MachineConfig};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let config = load_config();
    emit_config(&config);
}

/// Read, parse and validate machine.toml
fn load_config() -> MachineConfig {
    println!("cargo:rerun-if-changed=machine.toml");

    let path = Path::new("machine.toml");
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| fail("cannot read machine.toml", &e.to_string()));
    let config: MachineConfig =
        toml::from_str(&text).unwrap_or_else(|e| fail("machine.toml does not parse", &e.to_string()));

    if let Err(e) = config.validate() {
        fail("machine.toml is outside hardware limits", &describe(e, &config));
    }

    println!(
        "cargo:warning=machine.toml validated: {} steps every {} ms",
        config.motion.max_steps, config.motion.step_delay_ms
    );
    config
}

/// Stop the build with an indented report
fn fail(what: &str, detail: &str) -> ! {
    let detail: Vec<_> = detail.lines().map(|line| format!("    {line}")).collect();
    panic!("\nratchet-firmware: {what}\n{}\n", detail.join("\n"));
}

/// Human-readable explanation of a validation failure
fn describe(error: ConfigError, config: &MachineConfig) -> String {
    match error {
        ConfigError::ZeroSteps => "[motion] max_steps must be at least 1".to_string(),
        ConfigError::StepDelayTooShort => format!(
            "[motion] step_delay_ms = {} is too short: minimum is {} ms and it must\n\
             exceed four register writes at {} Hz ({} µs each)",
            config.motion.step_delay_ms,
            ratchet_core::config::MIN_STEP_DELAY_MS,
            config.bus.frequency_hz,
            config.bus.i2c().register_write_us()
        ),
        ConfigError::DebounceOutOfRange => format!(
            "[motion] debounce_ms = {} must be 1-{}",
            config.motion.debounce_ms,
            ratchet_core::config::MAX_DEBOUNCE_MS
        ),
        ConfigError::PwmFrequencyOutOfRange => format!(
            "[pca9685] pwm_frequency_hz = {} cannot be reached from a {} Hz oscillator",
            config.pca9685.pwm_frequency_hz, config.pca9685.oscillator_hz
        ),
        ConfigError::InvalidAddress => format!(
            "[pca9685] address = {:#04x} must be 0x40-0x7f",
            config.pca9685.address
        ),
        ConfigError::BusFrequencyOutOfRange => format!(
            "[bus] frequency_hz = {} must be 1-1000000",
            config.bus.frequency_hz
        ),
    }
}

/// Write `$OUT_DIR/machine_config.rs`
fn emit_config(config: &MachineConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let motion = &config.motion;
    let driver = &config.pca9685;
    let bus = &config.bus;

    let source = format!(
        "/// Machine configuration from machine.toml (validated at build time)\n\
         pub const MACHINE: ratchet_core::config::MachineConfig = ratchet_core::config::MachineConfig {{\n\
         \x20   motion: ratchet_core::config::MotionConfig {{\n\
         \x20       max_steps: {},\n\
         \x20       step_delay_ms: {},\n\
         \x20       debounce_ms: {},\n\
         \x20   }},\n\
         \x20   pca9685: ratchet_core::config::DriverConfig {{\n\
         \x20       address: {:#04x},\n\
         \x20       oscillator_hz: {},\n\
         \x20       pwm_frequency_hz: {},\n\
         \x20   }},\n\
         \x20   bus: ratchet_core::config::BusConfig {{\n\
         \x20       frequency_hz: {},\n\
         \x20   }},\n\
         }};\n",
        motion.max_steps,
        motion.step_delay_ms,
        motion.debounce_ms,
        driver.address,
        driver.oscillator_hz,
        driver.pwm_frequency_hz,
        bus.frequency_hz,
    );

    fs::write(out_dir.join("machine_config.rs"), source)
        .expect("failed to write machine_config.rs");
}
