//! Disassembler for Basic Computer programs.
//!
//! Produces text the assembler accepts back. Words that decode to no
//! instruction are shown as `HEX` data.

use crate::asm::image::ProgramImage;
use crate::cpu::decode::{decode, Instruction};
use crate::cpu::Memory;

/// Disassemble a single word to text.
pub fn disassemble_word(word: u16) -> String {
    format_instruction(&decode(word))
}

/// Disassemble an image into a listing, one line per word.
pub fn disassemble(image: &ProgramImage) -> String {
    let mut output = String::new();
    output.push_str("/ Basic Computer disassembly\n");
    output.push_str("/ --------------------------\n\n");

    let mut next: Option<u16> = None;
    for (address, word) in image.iter() {
        if next != Some(address) {
            output.push_str(&format!("        ORG {:03X}\n", address));
        }
        output.push_str(&format!("        {:<12} / {:03X}: {:04X}\n", disassemble_word(word), address, word));
        next = Some(address + 1);
    }
    output.push_str("        END\n");

    output
}

/// Disassemble `count` words of memory starting at `start`, wrapping at the
/// top of memory.
pub fn disassemble_range(mem: &Memory, start: u16, count: usize) -> Vec<(u16, u16, String)> {
    (0..count)
        .map(|i| {
            let address = start.wrapping_add(i as u16) & crate::word::ADDR_MASK;
            let word = mem.read(address);
            (address, word, disassemble_word(word))
        })
        .collect()
}

/// Format a decoded instruction as assembly text.
fn format_instruction(instr: &Instruction) -> String {
    match instr {
        Instruction::Memory { op, address, indirect: false } => format!("{} {:03X}", op.mnemonic(), address),
        Instruction::Memory { op, address, indirect: true } => format!("{} {:03X} I", op.mnemonic(), address),
        Instruction::Register(op) => op.mnemonic().to_string(),
        Instruction::Io(op) => op.mnemonic().to_string(),
        Instruction::Unknown { .. } => format!("HEX {:04X}", crate::cpu::decode::encode(instr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_words() {
        assert_eq!(disassemble_word(0x2004), "LDA 004");
        assert_eq!(disassemble_word(0x9ABC), "ADD ABC I");
        assert_eq!(disassemble_word(0x7001), "HLT");
        assert_eq!(disassemble_word(0xF080), "ION");
        assert_eq!(disassemble_word(0x7003), "HEX 7003");
        assert_eq!(disassemble_word(0xFFE9), "HEX FFE9");
    }

    #[test]
    fn test_disassemble_listing() {
        let mut image = ProgramImage::new();
        image.insert(0x100, 0x2104);
        image.insert(0x101, 0x7001);

        let text = disassemble(&image);
        assert!(text.contains("ORG 100"));
        assert!(text.contains("LDA 104"));
        assert!(text.contains("HLT"));
        assert!(text.trim_end().ends_with("END"));
    }

    #[test]
    fn test_disassemble_range_wraps() {
        let mut mem = Memory::new();
        mem.write(0xFFF, 0x7800);
        mem.write(0x000, 0x7001);

        let lines = disassemble_range(&mem, 0xFFF, 2);
        assert_eq!(lines[0], (0xFFF, 0x7800, "CLA".to_string()));
        assert_eq!(lines[1], (0x000, 0x7001, "HLT".to_string()));
    }
}
