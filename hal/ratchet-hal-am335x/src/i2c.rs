//! I2C master (polled)
//!
//! Blocking master transfers on one of the AM335x I2C controllers. Every
//! wait is a bounded poll of `IRQSTATUS_RAW` sized by
//! [`I2cConfig::poll_budget`]; running out of budget is reported as
//! [`I2cError::Timeout`] instead of hanging the main loop.
//!
//! A transaction is split into segments of adjacent same-direction
//! operations. Each segment gets one START and one `CNT`; segments after
//! the first go out as repeated STARTs, and only the last ends in STOP.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use ratchet_hal::I2cConfig;

use crate::mmio::Block;

/// I2C register offsets
pub mod regs {
    /// System configuration (soft reset)
    pub const SYSC: usize = 0x10;
    /// Raw interrupt status
    pub const IRQSTATUS_RAW: usize = 0x24;
    /// Interrupt status (W1C)
    pub const IRQSTATUS: usize = 0x28;
    /// System status (reset done)
    pub const SYSS: usize = 0x90;
    /// Data count
    pub const CNT: usize = 0x98;
    /// Data access
    pub const DATA: usize = 0x9C;
    /// Configuration
    pub const CON: usize = 0xA4;
    /// Target address
    pub const SA: usize = 0xAC;
    /// Clock prescaler
    pub const PSC: usize = 0xB0;
    /// SCL low time
    pub const SCLL: usize = 0xB4;
    /// SCL high time
    pub const SCLH: usize = 0xB8;
}

/// Status bits (IRQSTATUS / IRQSTATUS_RAW)
mod status {
    pub const AL: u32 = 1 << 0;
    pub const NACK: u32 = 1 << 1;
    pub const ARDY: u32 = 1 << 2;
    pub const RRDY: u32 = 1 << 3;
    pub const XRDY: u32 = 1 << 4;
    pub const BB: u32 = 1 << 12;
    pub const ALL: u32 = 0x7FFF;
}

/// CON bits
mod con {
    pub const EN: u32 = 1 << 15;
    pub const MST: u32 = 1 << 10;
    pub const TRX: u32 = 1 << 9;
    pub const STP: u32 = 1 << 1;
    pub const STT: u32 = 1 << 0;
}

const SRST: u32 = 0x2;
const RDONE: u32 = 0x1;
/// Largest byte count per segment (`CNT` is 16 bits; 0 means 65536)
const MAX_SEGMENT: usize = 0xFFFF;

/// Internal sampling clock the prescaler divides down to
pub const INTERNAL_CLOCK_HZ: u32 = 12_000_000;

/// One I2C controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cBlock {
    /// Module base address
    pub base: usize,
    /// Functional clock (Hz)
    pub functional_clock_hz: u32,
}

impl I2cBlock {
    /// I2C1 on P9.17/P9.18
    pub const I2C1: Self = Self {
        base: 0x4802_A000,
        functional_clock_hz: 48_000_000,
    };
}

/// Clock divider settings for a bus frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SclTiming {
    /// PSC register value
    pub psc: u32,
    /// SCLL register value
    pub scll: u32,
    /// SCLH register value
    pub sclh: u32,
}

/// Prescaler and SCL dividers for a bus frequency
///
/// `PSC = fclk / 12 MHz - 1`, `SCLL = 12 MHz / 2f - 7`, `SCLH = 12 MHz / 2f - 5`.
pub const fn scl_timing(functional_clock_hz: u32, frequency_hz: u32) -> SclTiming {
    let psc = (functional_clock_hz / INTERNAL_CLOCK_HZ).saturating_sub(1);
    let half_period = if frequency_hz == 0 {
        u32::MAX
    } else {
        INTERNAL_CLOCK_HZ / (2 * frequency_hz)
    };
    SclTiming {
        psc,
        scll: half_period.saturating_sub(7),
        sclh: half_period.saturating_sub(5),
    }
}

/// I2C transfer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Address or data byte not acknowledged
    Nack,
    /// Another master took the bus
    ArbitrationLost,
    /// Bus stayed busy or a transfer never completed
    Timeout,
    /// A segment with no bytes, or more than `CNT` can count
    Length,
}

impl i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            I2cError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            I2cError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            I2cError::Timeout | I2cError::Length => ErrorKind::Other,
        }
    }
}

/// Polled I2C master
#[derive(Debug)]
pub struct Am335xI2c {
    regs: Block,
    functional_clock_hz: u32,
    config: I2cConfig,
}

impl Am335xI2c {
    /// Create a handle; the controller is not touched until [`init`](Self::init)
    ///
    /// # Safety
    ///
    /// `block.base` must be an I2C controller base address, and this must be
    /// the only handle to it.
    pub const unsafe fn new(block: I2cBlock, config: I2cConfig) -> Self {
        Self {
            regs: Block::new(block.base),
            functional_clock_hz: block.functional_clock_hz,
            config,
        }
    }

    /// Reset the controller and program the bus clock
    pub fn init(&mut self) -> Result<(), I2cError> {
        self.regs.write(regs::CON, 0);
        self.regs.write(regs::SYSC, SRST);
        // Reset only completes with the module enabled
        self.regs.write(regs::CON, con::EN);
        self.regs
            .poll(regs::SYSS, self.config.poll_budget, |v| v & RDONE != 0)
            .ok_or(I2cError::Timeout)?;

        let timing = scl_timing(self.functional_clock_hz, self.config.frequency);
        self.regs.write(regs::CON, 0);
        self.regs.write(regs::PSC, timing.psc);
        self.regs.write(regs::SCLL, timing.scll);
        self.regs.write(regs::SCLH, timing.sclh);
        self.regs.write(regs::CON, con::EN);
        Ok(())
    }

    /// Poll until any of `mask` is raised, failing on NACK or lost arbitration
    fn wait_for(&self, mask: u32) -> Result<u32, I2cError> {
        let raw = self
            .regs
            .poll(regs::IRQSTATUS_RAW, self.config.poll_budget, |v| {
                v & (mask | status::NACK | status::AL) != 0
            })
            .ok_or(I2cError::Timeout)?;

        if raw & status::NACK != 0 {
            self.abort();
            return Err(I2cError::Nack);
        }
        if raw & status::AL != 0 {
            self.regs.write(regs::IRQSTATUS, status::ALL);
            return Err(I2cError::ArbitrationLost);
        }
        Ok(raw)
    }

    /// Release the bus after a failed transfer
    fn abort(&self) {
        self.regs.set_bits(regs::CON, con::STP);
        self.regs.write(regs::IRQSTATUS, status::ALL);
    }

    fn wait_bus_free(&self) -> Result<(), I2cError> {
        self.regs
            .poll(regs::IRQSTATUS_RAW, self.config.poll_budget, |v| {
                v & status::BB == 0
            })
            .map(|_| ())
            .ok_or(I2cError::Timeout)
    }

    /// Move one segment: a (repeated) START, `CNT` bytes in one direction,
    /// and a STOP only if `stop` is set
    ///
    /// Without a STOP the controller holds SCL low after the last byte and
    /// the next segment's START goes out as a repeated START.
    fn segment(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
        restart: bool,
        stop: bool,
    ) -> Result<(), I2cError> {
        if !restart {
            self.wait_bus_free()?;
        }
        let transmit = !is_read(&operations[0]);
        let len = operations.iter().map(op_len).sum::<usize>();

        self.regs.write(regs::SA, address as u32);
        self.regs.write(regs::CNT, len as u32);
        self.regs.write(regs::IRQSTATUS, status::ALL);
        self.regs.write(regs::CON, control(transmit, stop));

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.wait_for(status::XRDY)?;
                        self.regs.write(regs::DATA, byte as u32);
                        self.regs.write(regs::IRQSTATUS, status::XRDY);
                    }
                }
                Operation::Read(buffer) => {
                    for slot in buffer.iter_mut() {
                        self.wait_for(status::RRDY)?;
                        *slot = self.regs.read(regs::DATA) as u8;
                        self.regs.write(regs::IRQSTATUS, status::RRDY);
                    }
                }
            }
        }

        self.wait_for(status::ARDY)?;
        self.regs.write(regs::IRQSTATUS, status::ARDY);
        if stop {
            self.wait_bus_free()?;
        }
        Ok(())
    }
}

/// `CON` value that starts a master segment
pub const fn control(transmit: bool, stop: bool) -> u32 {
    let mut value = con::EN | con::MST | con::STT;
    if transmit {
        value |= con::TRX;
    }
    if stop {
        value |= con::STP;
    }
    value
}

fn is_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(_))
}

fn op_len(op: &Operation<'_>) -> usize {
    match op {
        Operation::Write(bytes) => bytes.len(),
        Operation::Read(buffer) => buffer.len(),
    }
}

/// End of the run of same-direction operations starting at `start`
fn segment_end(operations: &[Operation<'_>], start: usize) -> usize {
    let read = is_read(&operations[start]);
    operations[start..]
        .iter()
        .position(|op| is_read(op) != read)
        .map_or(operations.len(), |n| start + n)
}

impl ErrorType for Am335xI2c {
    type Error = I2cError;
}

impl i2c::I2c for Am335xI2c {
    /// Adjacent operations in the same direction share one segment, a change
    /// of direction is a repeated START, and only the last segment ends
    /// with a STOP.
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // Check every segment against CNT before touching the bus
        let mut start = 0;
        while start < operations.len() {
            let end = segment_end(operations, start);
            let len = operations[start..end].iter().map(op_len).sum::<usize>();
            if len == 0 || len > MAX_SEGMENT {
                return Err(I2cError::Length);
            }
            start = end;
        }

        let mut start = 0;
        while start < operations.len() {
            let end = segment_end(operations, start);
            let last = end == operations.len();
            self.segment(address, &mut operations[start..end], start > 0, last)?;
            start = end;
        }
        Ok(())
    }
}
