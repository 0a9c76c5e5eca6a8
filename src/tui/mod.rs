//! TUI debugger for the Basic Computer.
//!
//! Provides an interactive terminal-based debugger with:
//! - Every register, flag and the timing state
//! - Memory view
//! - Tick/instruction/run/breakpoint controls
//! - Disassembly around PC

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
