//! Two-pass assembler for Basic Computer programs.
//!
//! Syntax:
//! ```text
//! / Comment
//!         ORG 100     / Set the location counter (hex)
//!         LDA A       / Memory reference by label
//!         ADD PTR I   / Indirect reference
//!         STA 106     / Memory reference by hex address
//!         HLT
//! A,      DEC 83      / Label definitions end with a comma
//! PTR,    HEX 105
//!         DEC -23
//!         END
//! ```
//!
//! Numbers are hexadecimal except after `DEC`. A name defined as a label
//! takes precedence over reading it as a hex number.

use crate::asm::image::ProgramImage;
use crate::cpu::decode::{encode, Instruction, IoOp, MemoryOp, RegisterOp};
use crate::cpu::MEMORY_SIZE;
use crate::word::ADDR_MASK;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a program image.
pub fn assemble(source: &str) -> Result<ProgramImage, AssemblerError> {
    let lines = source
        .lines()
        .enumerate()
        .map(|(n, text)| parse_line(text, n + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut asm = Assembler::new();
    asm.collect_symbols(&lines)?;
    asm.emit_all(&lines)?;
    Ok(asm.output)
}

/// One source line split into its fields.
#[derive(Debug)]
struct Line<'a> {
    number: usize,
    label: Option<&'a str>,
    mnemonic: Option<String>,
    operand: Option<&'a str>,
    indirect: bool,
}

fn parse_line(text: &str, number: usize) -> Result<Line<'_>, AssemblerError> {
    let code = match text.find('/') {
        Some(idx) => &text[..idx],
        None => text,
    };

    let (label, rest) = match code.find(',') {
        Some(idx) => {
            let label = code[..idx].trim();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: number,
                    message: format!("invalid label '{}'", label),
                });
            }
            (Some(label), &code[idx + 1..])
        }
        None => (None, code),
    };

    let mut tokens = rest.split_whitespace();
    let mnemonic = tokens.next().map(|m| m.to_ascii_uppercase());
    let operand = tokens.next();
    let indirect = match tokens.next() {
        None => false,
        Some(t) if t.eq_ignore_ascii_case("I") => true,
        Some(t) => {
            return Err(AssemblerError::SyntaxError {
                line: number,
                message: format!("unexpected '{}'", t),
            })
        }
    };
    if let Some(extra) = tokens.next() {
        return Err(AssemblerError::SyntaxError {
            line: number,
            message: format!("unexpected '{}'", extra),
        });
    }

    Ok(Line { number, label, mnemonic, operand, indirect })
}

/// The assembler state.
struct Assembler {
    /// Location counter.
    location: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, u16>,
    /// Output image.
    output: ProgramImage,
}

impl Assembler {
    fn new() -> Self {
        Self {
            location: 0,
            symbols: HashMap::new(),
            output: ProgramImage::new(),
        }
    }

    /// Pass 1: assign an address to every label.
    fn collect_symbols(&mut self, lines: &[Line<'_>]) -> Result<(), AssemblerError> {
        self.location = 0;

        for line in lines {
            if let Some(label) = line.label {
                let address = self.checked_location(line.number)?;
                if self.symbols.insert(label.to_ascii_uppercase(), address).is_some() {
                    return Err(AssemblerError::DuplicateLabel {
                        line: line.number,
                        label: label.to_string(),
                    });
                }
            }

            match line.mnemonic.as_deref() {
                None => {}
                Some("END") => break,
                Some("ORG") => self.location = self.origin(line)?,
                Some(_) => self.location += 1,
            }
        }

        Ok(())
    }

    /// Pass 2: encode every word.
    fn emit_all(&mut self, lines: &[Line<'_>]) -> Result<(), AssemblerError> {
        self.location = 0;

        for line in lines {
            let Some(mnemonic) = line.mnemonic.as_deref() else {
                continue;
            };

            let word = match mnemonic {
                "END" => break,
                "ORG" => {
                    self.location = self.origin(line)?;
                    continue;
                }
                "HEX" => {
                    let text = self.require_operand(line)?;
                    self.parse_number(text, line.number, 0xFFFF)?
                }
                "DEC" => {
                    let text = self.require_operand(line)?;
                    parse_decimal(text, line.number)?
                }
                _ => encode(&self.parse_instruction(mnemonic, line)?),
            };

            self.emit(word, line.number)?;
        }

        Ok(())
    }

    fn parse_instruction(&self, mnemonic: &str, line: &Line<'_>) -> Result<Instruction, AssemblerError> {
        if let Some(op) = MemoryOp::from_mnemonic(mnemonic) {
            let text = self.require_operand(line)?;
            let address = self.parse_number(text, line.number, ADDR_MASK)?;
            return Ok(Instruction::Memory { op, address, indirect: line.indirect });
        }

        let instr = if let Some(op) = RegisterOp::from_mnemonic(mnemonic) {
            Instruction::Register(op)
        } else if let Some(op) = IoOp::from_mnemonic(mnemonic) {
            Instruction::Io(op)
        } else {
            return Err(AssemblerError::UnknownMnemonic {
                line: line.number,
                mnemonic: mnemonic.to_string(),
            });
        };

        if line.operand.is_some() || line.indirect {
            return Err(AssemblerError::SyntaxError {
                line: line.number,
                message: format!("{} takes no operand", mnemonic),
            });
        }
        Ok(instr)
    }

    fn origin(&self, line: &Line<'_>) -> Result<usize, AssemblerError> {
        let text = self.require_operand(line)?;
        let value = u32::from_str_radix(text, 16).map_err(|_| AssemblerError::SyntaxError {
            line: line.number,
            message: format!("invalid origin '{}'", text),
        })?;
        if value as usize >= MEMORY_SIZE {
            return Err(AssemblerError::ValueOutOfRange { line: line.number, value: value as i64 });
        }
        Ok(value as usize)
    }

    fn require_operand<'a>(&self, line: &Line<'a>) -> Result<&'a str, AssemblerError> {
        line.operand.ok_or_else(|| AssemblerError::SyntaxError {
            line: line.number,
            message: format!("{} requires an operand", line.mnemonic.as_deref().unwrap_or("")),
        })
    }

    /// A label, or else a hex number no larger than `max`.
    fn parse_number(&self, text: &str, line: usize, max: u16) -> Result<u16, AssemblerError> {
        if let Some(&address) = self.symbols.get(&text.to_ascii_uppercase()) {
            return Ok(address);
        }

        let value = u32::from_str_radix(text, 16).map_err(|_| AssemblerError::UndefinedLabel {
            line,
            label: text.to_string(),
        })?;
        if value > max as u32 {
            return Err(AssemblerError::ValueOutOfRange { line, value: value as i64 });
        }
        Ok(value as u16)
    }

    fn checked_location(&self, line: usize) -> Result<u16, AssemblerError> {
        if self.location >= MEMORY_SIZE {
            return Err(AssemblerError::ValueOutOfRange { line, value: self.location as i64 });
        }
        Ok(self.location as u16)
    }

    fn emit(&mut self, word: u16, line: usize) -> Result<(), AssemblerError> {
        let address = self.checked_location(line)?;
        if self.output.insert(address, word).is_some() {
            return Err(AssemblerError::Overlap { line, address });
        }
        self.location += 1;
        Ok(())
    }
}

/// A signed or unsigned decimal that fits in 16 bits, as two's complement.
fn parse_decimal(text: &str, line: usize) -> Result<u16, AssemblerError> {
    let value: i64 = text.parse().map_err(|_| AssemblerError::SyntaxError {
        line,
        message: format!("invalid decimal '{}'", text),
    })?;
    if !(i16::MIN as i64..=u16::MAX as i64).contains(&value) {
        return Err(AssemblerError::ValueOutOfRange { line, value });
    }
    Ok(value as u16)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("label defined twice on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("address {address:03X} assembled twice (line {line})")]
    Overlap { line: usize, address: u16 },
}
