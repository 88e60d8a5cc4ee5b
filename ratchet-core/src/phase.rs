//! Full-step phase table
//!
//! A two-coil stepper is driven through four H-bridge inputs. Each full step
//! energises the coils in one of four patterns; cycling through them in order
//! turns the rotor one step per pattern.
//!
//! Patterns are stored as four bits, most significant first:
//!
//! ```text
//! bit:    3     2     1     0
//! line: AIN1  AIN2  BIN1  BIN2
//!
//! Step 1: 0     1     0     1
//! Step 2: 1     0     0     1
//! Step 3: 1     0     1     0
//! Step 4: 0     1     1     0
//! ```

/// Number of distinct phases in a full-step cycle
pub const PHASE_COUNT: u8 = 4;

/// H-bridge control line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorLine {
    /// Coil A, input 1
    Ain1,
    /// Coil A, input 2
    Ain2,
    /// Coil B, input 1
    Bin1,
    /// Coil B, input 2
    Bin2,
}

impl MotorLine {
    /// All lines in the order they are written to the driver
    pub const WRITE_ORDER: [MotorLine; 4] =
        [MotorLine::Ain1, MotorLine::Ain2, MotorLine::Bin1, MotorLine::Bin2];

    /// Bit position of this line inside a [`PhasePattern`]
    pub const fn bit(self) -> u8 {
        match self {
            MotorLine::Ain1 => 3,
            MotorLine::Ain2 => 2,
            MotorLine::Bin1 => 1,
            MotorLine::Bin2 => 0,
        }
    }
}

/// Four-bit ON/OFF pattern for the H-bridge inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhasePattern(u8);

impl PhasePattern {
    /// Raw pattern bits (AIN1 in bit 3 through BIN2 in bit 0)
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `line` is driven in this pattern
    pub const fn is_on(self, line: MotorLine) -> bool {
        (self.0 >> line.bit()) & 0x01 != 0
    }

    /// Line states in write order, paired with their line
    pub fn lines(self) -> impl Iterator<Item = (MotorLine, bool)> {
        MotorLine::WRITE_ORDER
            .into_iter()
            .map(move |line| (line, self.is_on(line)))
    }
}

/// Patterns indexed by phase - 1
const PATTERNS: [PhasePattern; PHASE_COUNT as usize] = [
    PhasePattern(0b0101),
    PhasePattern(0b1001),
    PhasePattern(0b1010),
    PhasePattern(0b0110),
];

/// Phase index outside 1..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPhase(pub u8);

/// Position within the four-phase cycle, always in 1..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseIndex(u8);

impl PhaseIndex {
    /// First phase of the cycle
    pub const FIRST: Self = Self(1);

    /// Create a phase index, rejecting values outside 1..=4
    pub const fn new(index: u8) -> Result<Self, InvalidPhase> {
        if index >= 1 && index <= PHASE_COUNT {
            Ok(Self(index))
        } else {
            Err(InvalidPhase(index))
        }
    }

    /// Phase for a 1-based step number: `((step - 1) mod 4) + 1`
    ///
    /// Step 0 (no step taken yet) maps to phase 4, the phase preceding
    /// step 1 in the cycle.
    pub const fn from_step(step: u16) -> Self {
        let zero_based = (step as u32 + PHASE_COUNT as u32 - 1) % PHASE_COUNT as u32;
        Self(zero_based as u8 + 1)
    }

    /// The index as a number in 1..=4
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Pattern for this phase
    pub const fn pattern(self) -> PhasePattern {
        PATTERNS[(self.0 - 1) as usize]
    }

    /// The phase after this one, wrapping 4 to 1
    pub const fn next(self) -> Self {
        Self(self.0 % PHASE_COUNT + 1)
    }
}

impl TryFrom<u8> for PhaseIndex {
    type Error = InvalidPhase;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
