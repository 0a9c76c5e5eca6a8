//! Program images and their on-disk format.
//!
//! An image is a sparse map from 12-bit address to 16-bit word. On disk it
//! uses the `$readmemh` text format hardware testbenches load memories
//! from:
//! - `@addr` moves the load address (hex)
//! - every other token is one hex word stored at the load address, which
//!   then advances by one
//! - `//` starts a comment that runs to the end of the line

use crate::asm::disasm::disassemble_word;
use crate::cpu::{Cpu, CpuError, MEMORY_SIZE};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// A program ready to be placed in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    words: BTreeMap<u16, u16>,
}

impl ProgramImage {
    /// Create an empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a word, returning whatever was there before.
    pub fn insert(&mut self, address: u16, word: u16) -> Option<u16> {
        self.words.insert(address, word)
    }

    pub fn get(&self, address: u16) -> Option<u16> {
        self.words.get(&address).copied()
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.words.iter().map(|(&a, &w)| (a, w))
    }

    /// Lowest occupied address, the conventional entry point.
    pub fn start(&self) -> Option<u16> {
        self.words.keys().next().copied()
    }

    /// Copy every word into the machine's memory.
    pub fn load_into(&self, cpu: &mut Cpu) -> Result<(), CpuError> {
        for (address, word) in self.iter() {
            cpu.load_word(address as usize, word)?;
        }
        log::debug!("loaded {} words", self.len());
        Ok(())
    }
}

/// Parse an image from `$readmemh` text.
pub fn parse_image(text: &str) -> Result<ProgramImage, ImageError> {
    let mut image = ProgramImage::new();
    let mut address: usize = 0;

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let code = match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        };

        for token in code.split_whitespace() {
            if let Some(addr) = token.strip_prefix('@') {
                address = usize::from_str_radix(addr, 16).map_err(|_| ImageError::ParseError {
                    line: line_num,
                    message: format!("invalid address '{}'", token),
                })?;
                continue;
            }

            if token.len() > 4 {
                return Err(ImageError::ParseError {
                    line: line_num,
                    message: format!("'{}' is wider than 16 bits", token),
                });
            }
            let word = u16::from_str_radix(token, 16).map_err(|_| ImageError::ParseError {
                line: line_num,
                message: format!("invalid hex word '{}'", token),
            })?;

            if address >= MEMORY_SIZE {
                return Err(ImageError::AddressOutOfRange { line: line_num, address });
            }
            image.insert(address as u16, word);
            address += 1;
        }
    }

    Ok(image)
}

/// Render an image as `$readmemh` text with a disassembly comment on every
/// word.
pub fn format_image(image: &ProgramImage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Basic Computer memory image");
    let _ = writeln!(out, "// {} words", image.len());

    let mut next: Option<u16> = None;
    for (address, word) in image.iter() {
        if next != Some(address) {
            let _ = writeln!(out, "@{:03X}", address);
        }
        let _ = writeln!(out, "{:04X} // {:03X}: {}", word, address, disassemble_word(word));
        next = Some(address + 1);
    }

    out
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    parse_image(&text)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ProgramImage) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), format_image(image))
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("address {address:#x} on line {line} is outside memory")]
    AddressOutOfRange { line: usize, address: usize },
}
