//! Basic Computer register file.
//!
//! Holds every architectural register and single-bit flag of the machine,
//! together with the control-unit state that lives in flip-flops: the
//! decoded opcode and the timing counter `t`.

use crate::word::ADDR_MASK;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of an architectural register or flag, for host access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterName {
    Ar,
    Pc,
    Ac,
    Dr,
    Ir,
    Tr,
    Inpr,
    Outr,
    I,
    E,
    R,
    S,
    Fgi,
    Fgo,
    Ien,
    Sc,
    Opcode,
    T,
}

impl RegisterName {
    /// Every register, in display order.
    pub const ALL: [RegisterName; 18] = [
        RegisterName::Ar,
        RegisterName::Pc,
        RegisterName::Ac,
        RegisterName::Dr,
        RegisterName::Ir,
        RegisterName::Tr,
        RegisterName::Inpr,
        RegisterName::Outr,
        RegisterName::I,
        RegisterName::E,
        RegisterName::R,
        RegisterName::S,
        RegisterName::Fgi,
        RegisterName::Fgo,
        RegisterName::Ien,
        RegisterName::Sc,
        RegisterName::Opcode,
        RegisterName::T,
    ];

    /// Width of the register in bits.
    pub const fn width(self) -> u32 {
        match self {
            RegisterName::Ar | RegisterName::Pc => 12,
            RegisterName::Ac | RegisterName::Dr | RegisterName::Ir | RegisterName::Tr => 16,
            RegisterName::Inpr | RegisterName::Outr => 8,
            RegisterName::Opcode | RegisterName::T => 3,
            RegisterName::I
            | RegisterName::E
            | RegisterName::R
            | RegisterName::S
            | RegisterName::Fgi
            | RegisterName::Fgo
            | RegisterName::Ien
            | RegisterName::Sc => 1,
        }
    }

    /// Largest value the register can hold.
    pub const fn max_value(self) -> u16 {
        ((1u32 << self.width()) - 1) as u16
    }

    /// Conventional upper-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            RegisterName::Ar => "AR",
            RegisterName::Pc => "PC",
            RegisterName::Ac => "AC",
            RegisterName::Dr => "DR",
            RegisterName::Ir => "IR",
            RegisterName::Tr => "TR",
            RegisterName::Inpr => "INPR",
            RegisterName::Outr => "OUTR",
            RegisterName::I => "I",
            RegisterName::E => "E",
            RegisterName::R => "R",
            RegisterName::S => "S",
            RegisterName::Fgi => "FGI",
            RegisterName::Fgo => "FGO",
            RegisterName::Ien => "IEN",
            RegisterName::Sc => "SC",
            RegisterName::Opcode => "OPCODE",
            RegisterName::T => "T",
        }
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RegisterName {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        RegisterName::ALL
            .into_iter()
            .find(|r| r.as_str() == upper)
            .ok_or_else(|| RegisterError::UnknownRegister(s.to_string()))
    }
}

/// The Basic Computer register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    /// AR: 12-bit address register
    pub ar: u16,
    /// PC: 12-bit program counter
    pub pc: u16,
    /// AC: accumulator
    pub ac: u16,
    /// DR: data register (memory operand)
    pub dr: u16,
    /// IR: instruction register
    pub ir: u16,
    /// TR: temporary register, holds the return address on interrupt entry
    pub tr: u16,
    /// INPR: input character
    pub inpr: u8,
    /// OUTR: output character
    pub outr: u8,

    /// I: indirect bit of the current instruction
    pub i: bool,
    /// E: carry/extend
    pub e: bool,
    /// R: interrupt cycle pending
    pub r: bool,
    /// S: run flag, cleared by HLT
    pub s: bool,
    /// FGI: input character ready
    pub fgi: bool,
    /// FGO: output device ready for a character
    pub fgo: bool,
    /// IEN: interrupts enabled
    pub ien: bool,
    /// SC: timing sequence started
    pub sc: bool,

    /// Decoded 3-bit opcode of the current instruction
    pub opcode: u8,
    /// Timing state, a 3-bit counter
    pub t: u8,
}

impl RegisterFile {
    /// Create a register file with every register and flag cleared.
    pub fn new() -> Self {
        Self {
            ar: 0,
            pc: 0,
            ac: 0,
            dr: 0,
            ir: 0,
            tr: 0,
            inpr: 0,
            outr: 0,
            i: false,
            e: false,
            r: false,
            s: false,
            fgi: false,
            fgo: false,
            ien: false,
            sc: false,
            opcode: 0,
            t: 0,
        }
    }

    /// Clear everything, then place the machine at `start_address` ready to
    /// run. The output device starts idle, so FGO is set.
    pub fn reset(&mut self, start_address: u16) {
        *self = Self::new();
        self.pc = start_address & ADDR_MASK;
        self.fgo = true;
        self.s = true;
    }

    /// Read a register by name, zero-extended to 16 bits.
    pub fn get(&self, name: RegisterName) -> u16 {
        match name {
            RegisterName::Ar => self.ar,
            RegisterName::Pc => self.pc,
            RegisterName::Ac => self.ac,
            RegisterName::Dr => self.dr,
            RegisterName::Ir => self.ir,
            RegisterName::Tr => self.tr,
            RegisterName::Inpr => self.inpr as u16,
            RegisterName::Outr => self.outr as u16,
            RegisterName::I => self.i as u16,
            RegisterName::E => self.e as u16,
            RegisterName::R => self.r as u16,
            RegisterName::S => self.s as u16,
            RegisterName::Fgi => self.fgi as u16,
            RegisterName::Fgo => self.fgo as u16,
            RegisterName::Ien => self.ien as u16,
            RegisterName::Sc => self.sc as u16,
            RegisterName::Opcode => self.opcode as u16,
            RegisterName::T => self.t as u16,
        }
    }

    /// Write a register by name. Values wider than the register are
    /// rejected rather than truncated.
    pub fn set(&mut self, name: RegisterName, value: u16) -> Result<(), RegisterError> {
        if value > name.max_value() {
            return Err(RegisterError::ValueOutOfRange {
                register: name,
                value,
                width: name.width(),
            });
        }

        let flag = value != 0;
        match name {
            RegisterName::Ar => self.ar = value,
            RegisterName::Pc => self.pc = value,
            RegisterName::Ac => self.ac = value,
            RegisterName::Dr => self.dr = value,
            RegisterName::Ir => self.ir = value,
            RegisterName::Tr => self.tr = value,
            RegisterName::Inpr => self.inpr = value as u8,
            RegisterName::Outr => self.outr = value as u8,
            RegisterName::I => self.i = flag,
            RegisterName::E => self.e = flag,
            RegisterName::R => self.r = flag,
            RegisterName::S => self.s = flag,
            RegisterName::Fgi => self.fgi = flag,
            RegisterName::Fgo => self.fgo = flag,
            RegisterName::Ien => self.ien = flag,
            RegisterName::Sc => self.sc = flag,
            RegisterName::Opcode => self.opcode = value as u8,
            RegisterName::T => self.t = value as u8,
        }
        Ok(())
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from host access to the register file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("unknown register: {0}")]
    UnknownRegister(String),

    #[error("value {value:#x} does not fit in {width}-bit register {register}")]
    ValueOutOfRange { register: RegisterName, value: u16, width: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let mut regs = RegisterFile::new();
        regs.ac = 0x1234;
        regs.ien = true;
        regs.reset(0x100);

        assert_eq!(regs.pc, 0x100);
        assert_eq!(regs.ac, 0);
        assert!(regs.s);
        assert!(!regs.sc);
        assert!(!regs.ien);
        assert!(regs.fgo);
        assert_eq!(regs.t, 0);
    }

    #[test]
    fn test_get_set_by_name() {
        let mut regs = RegisterFile::new();
        for name in RegisterName::ALL {
            regs.set(name, name.max_value()).unwrap();
            assert_eq!(regs.get(name), name.max_value(), "{name}");
        }
    }

    #[test]
    fn test_set_rejects_wide_values() {
        let mut regs = RegisterFile::new();
        assert_eq!(
            regs.set(RegisterName::Pc, 0x1000),
            Err(RegisterError::ValueOutOfRange {
                register: RegisterName::Pc,
                value: 0x1000,
                width: 12,
            })
        );
        assert!(regs.set(RegisterName::E, 2).is_err());
        assert!(regs.set(RegisterName::Outr, 0x100).is_err());
        assert!(regs.set(RegisterName::T, 7).is_ok());
    }

    #[test]
    fn test_parse_register_name() {
        assert_eq!("ac".parse::<RegisterName>(), Ok(RegisterName::Ac));
        assert_eq!(" FGO ".parse::<RegisterName>(), Ok(RegisterName::Fgo));
        assert!("XR".parse::<RegisterName>().is_err());
    }
}
