//! Instruction decoder for the Basic Computer.
//!
//! Every 16-bit word decodes to something: words whose opcode is 7 but
//! whose command field is not exactly one recognised bit decode to
//! [`Instruction::Unknown`], which the machine executes as a no-op.

use crate::word::{self, OPCODE_NON_MEMORY};
use serde::{Serialize, Deserialize};

/// Memory-reference operations (opcodes 0 through 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryOp {
    /// AC := AC & M[EA]
    And,
    /// {E, AC} := AC + M[EA]
    Add,
    /// AC := M[EA]
    Lda,
    /// M[EA] := AC
    Sta,
    /// PC := EA
    Bun,
    /// M[EA] := PC, PC := EA + 1
    Bsa,
    /// M[EA] := M[EA] + 1, skip if the result is zero
    Isz,
}

impl MemoryOp {
    pub const ALL: [MemoryOp; 7] = [
        MemoryOp::And,
        MemoryOp::Add,
        MemoryOp::Lda,
        MemoryOp::Sta,
        MemoryOp::Bun,
        MemoryOp::Bsa,
        MemoryOp::Isz,
    ];

    /// Map a 3-bit opcode to its operation. Opcode 7 is not a memory
    /// reference and yields `None`.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.get(opcode as usize).copied()
    }

    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            MemoryOp::And => "AND",
            MemoryOp::Add => "ADD",
            MemoryOp::Lda => "LDA",
            MemoryOp::Sta => "STA",
            MemoryOp::Bun => "BUN",
            MemoryOp::Bsa => "BSA",
            MemoryOp::Isz => "ISZ",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == text)
    }
}

/// Register-reference operations (opcode 7, I = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterOp {
    Cla,
    Cle,
    Cma,
    Cme,
    Cir,
    Cil,
    Inc,
    Spa,
    Sna,
    Sza,
    Sze,
    Hlt,
}

impl RegisterOp {
    const TABLE: [(RegisterOp, u16, &'static str); 12] = [
        (RegisterOp::Cla, 0x800, "CLA"),
        (RegisterOp::Cle, 0x400, "CLE"),
        (RegisterOp::Cma, 0x200, "CMA"),
        (RegisterOp::Cme, 0x100, "CME"),
        (RegisterOp::Cir, 0x080, "CIR"),
        (RegisterOp::Cil, 0x040, "CIL"),
        (RegisterOp::Inc, 0x020, "INC"),
        (RegisterOp::Spa, 0x010, "SPA"),
        (RegisterOp::Sna, 0x008, "SNA"),
        (RegisterOp::Sza, 0x004, "SZA"),
        (RegisterOp::Sze, 0x002, "SZE"),
        (RegisterOp::Hlt, 0x001, "HLT"),
    ];

    /// Look up the command whose one-hot mask equals `bits` exactly.
    pub fn from_mask(bits: u16) -> Option<Self> {
        Self::TABLE.iter().find(|(_, m, _)| *m == bits).map(|(op, _, _)| *op)
    }

    pub fn mask(self) -> u16 {
        Self::TABLE[self as usize].1
    }

    pub fn mnemonic(self) -> &'static str {
        Self::TABLE[self as usize].2
    }

    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::TABLE.iter().find(|(_, _, m)| *m == text).map(|(op, _, _)| *op)
    }
}

/// Input/output-reference operations (opcode 7, I = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoOp {
    Inp,
    Out,
    Ski,
    Sko,
    Ion,
    Iof,
}

impl IoOp {
    const TABLE: [(IoOp, u16, &'static str); 6] = [
        (IoOp::Inp, 0x800, "INP"),
        (IoOp::Out, 0x400, "OUT"),
        (IoOp::Ski, 0x200, "SKI"),
        (IoOp::Sko, 0x100, "SKO"),
        (IoOp::Ion, 0x080, "ION"),
        (IoOp::Iof, 0x040, "IOF"),
    ];

    pub fn from_mask(bits: u16) -> Option<Self> {
        Self::TABLE.iter().find(|(_, m, _)| *m == bits).map(|(op, _, _)| *op)
    }

    pub fn mask(self) -> u16 {
        Self::TABLE[self as usize].1
    }

    pub fn mnemonic(self) -> &'static str {
        Self::TABLE[self as usize].2
    }

    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::TABLE.iter().find(|(_, _, m)| *m == text).map(|(op, _, _)| *op)
    }
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Memory-reference instruction with a 12-bit address field.
    Memory { op: MemoryOp, address: u16, indirect: bool },
    /// Register-reference instruction.
    Register(RegisterOp),
    /// Input/output-reference instruction.
    Io(IoOp),
    /// Opcode 7 with a command field that names no single command.
    Unknown { indirect: bool, bits: u16 },
}

impl Instruction {
    /// Timing states the instruction occupies after its priming tick,
    /// T0 included. ISZ also spends the idle T7 before the counter wraps.
    /// Indirect addressing costs nothing extra: a direct reference idles
    /// through T3 instead.
    pub fn ticks(&self) -> u8 {
        match self {
            Instruction::Memory { op, .. } => match op {
                MemoryOp::Sta | MemoryOp::Bun => 5,
                MemoryOp::And | MemoryOp::Add | MemoryOp::Lda | MemoryOp::Bsa => 6,
                MemoryOp::Isz => 8,
            },
            Instruction::Register(_) | Instruction::Io(_) | Instruction::Unknown { .. } => 4,
        }
    }
}

/// Decode a 16-bit instruction word. Decoding never fails.
pub fn decode(word: u16) -> Instruction {
    let indirect = word::indirect_bit(word);
    let field = word::address_field(word);

    match MemoryOp::from_opcode(word::opcode_field(word)) {
        Some(op) => Instruction::Memory { op, address: field, indirect },
        None if indirect => match IoOp::from_mask(field) {
            Some(op) => Instruction::Io(op),
            None => Instruction::Unknown { indirect, bits: field },
        },
        None => match RegisterOp::from_mask(field) {
            Some(op) => Instruction::Register(op),
            None => Instruction::Unknown { indirect, bits: field },
        },
    }
}

/// Encode an instruction back to its 16-bit word.
pub fn encode(instr: &Instruction) -> u16 {
    match *instr {
        Instruction::Memory { op, address, indirect } => word::compose(indirect, op.opcode(), address),
        Instruction::Register(op) => word::compose(false, OPCODE_NON_MEMORY, op.mask()),
        Instruction::Io(op) => word::compose(true, OPCODE_NON_MEMORY, op.mask()),
        Instruction::Unknown { indirect, bits } => word::compose(indirect, OPCODE_NON_MEMORY, bits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_memory_reference() {
        assert_eq!(
            decode(0x2004),
            Instruction::Memory { op: MemoryOp::Lda, address: 4, indirect: false }
        );
        assert_eq!(
            decode(0x9005),
            Instruction::Memory { op: MemoryOp::Add, address: 5, indirect: true }
        );
        assert_eq!(
            decode(0xE123),
            Instruction::Memory { op: MemoryOp::Isz, address: 0x123, indirect: true }
        );
    }

    #[test]
    fn test_decode_register_reference() {
        assert_eq!(decode(0x7001), Instruction::Register(RegisterOp::Hlt));
        assert_eq!(decode(0x7200), Instruction::Register(RegisterOp::Cma));
        assert_eq!(decode(0x7020), Instruction::Register(RegisterOp::Inc));
        assert_eq!(decode(0x7800), Instruction::Register(RegisterOp::Cla));
    }

    #[test]
    fn test_decode_io_reference() {
        assert_eq!(decode(0xF800), Instruction::Io(IoOp::Inp));
        assert_eq!(decode(0xF400), Instruction::Io(IoOp::Out));
        assert_eq!(decode(0xF080), Instruction::Io(IoOp::Ion));
        assert_eq!(decode(0xF040), Instruction::Io(IoOp::Iof));
    }

    #[test]
    fn test_decode_unknown_commands() {
        // No bit set, two bits set, and an I/O bit that does not exist
        assert_eq!(decode(0x7000), Instruction::Unknown { indirect: false, bits: 0 });
        assert_eq!(decode(0x7801), Instruction::Unknown { indirect: false, bits: 0x801 });
        assert_eq!(decode(0xF001), Instruction::Unknown { indirect: true, bits: 0x001 });
    }

    #[test]
    fn test_every_word_reencodes() {
        for word in (0..=u16::MAX).step_by(7) {
            assert_eq!(encode(&decode(word)), word, "{word:#06x}");
        }
    }

    #[test]
    fn test_mnemonic_lookup() {
        assert_eq!(MemoryOp::from_mnemonic("BSA"), Some(MemoryOp::Bsa));
        assert_eq!(RegisterOp::from_mnemonic("SZE"), Some(RegisterOp::Sze));
        assert_eq!(IoOp::from_mnemonic("SKO"), Some(IoOp::Sko));
        assert_eq!(IoOp::from_mnemonic("HLT"), None);
    }

    #[test]
    fn test_tables_match_enum_order() {
        for (op, mask, name) in RegisterOp::TABLE {
            assert_eq!(op.mask(), mask);
            assert_eq!(op.mnemonic(), name);
        }
        for (op, mask, name) in IoOp::TABLE {
            assert_eq!(op.mask(), mask);
            assert_eq!(op.mnemonic(), name);
        }
    }
}
