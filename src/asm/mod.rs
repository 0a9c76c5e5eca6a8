//! Assembler and disassembler for Basic Computer programs.
//!
//! This module provides:
//! - A two-pass assembler (source text → program image)
//! - A disassembler (words → readable text)
//! - The `$readmemh` memory image format

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use image::{load_image, parse_image, save_image, ImageError, ProgramImage};
