//! CPU emulation for the Basic Computer.
//!
//! This module implements the register-transfer model of the machine:
//! - 4096 sixteen-bit memory words
//! - AR, PC, AC, DR, IR, TR, INPR, OUTR and the single-bit flags
//! - a timing sequencer, interrupt logic and the control unit, all
//!   evaluated against one snapshot per clock edge

pub mod memory;
pub mod registers;
pub mod decode;
pub mod staged;
pub mod sequencer;
pub mod interrupt;
pub mod control;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{RegisterError, RegisterFile, RegisterName};
pub use decode::{decode, encode, Instruction, IoOp, MemoryOp, RegisterOp};
pub use staged::StagedWrites;
pub use sequencer::{Phase, TimingState};
pub use execute::{clock_edge, Block, Cpu, CpuError, RunOutcome, Step, MAX_CYCLE_TICKS};
