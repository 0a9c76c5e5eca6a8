//! # Basic Computer Simulator
//!
//! A cycle-accurate simulator of the control unit and datapath of Mano's
//! "Basic Computer", the 16-bit accumulator machine used to teach computer
//! organisation.
//!
//! Each call to [`Cpu::step`] is one clock edge. The register values, flags
//! and memory contents after every edge match the register-transfer design
//! of the machine, including its timing sequencer and interrupt cycle.

pub mod word;
pub mod cpu;
pub mod asm;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, Instruction, Memory, RegisterFile, RegisterName, RunOutcome, Step};
pub use asm::{assemble, disassemble, AssemblerError, ProgramImage, load_image, save_image};
pub use config::MachineConfig;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
