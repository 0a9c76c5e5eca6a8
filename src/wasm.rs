//! WebAssembly bindings for the Basic Computer simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::{Cpu, ProgramImage, RunOutcome, Step};
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_word;
use crate::cpu::{RegisterName, MAX_CYCLE_TICKS, MEMORY_SIZE};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    image: ProgramImage,
    /// Characters printed during `run`, not yet handed to JavaScript.
    output: String,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            image: ProgramImage::new(),
            output: String::new(),
        }
    }

    /// Load a program from assembly source code and reset to its lowest
    /// address. Returns the number of words assembled.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = image.len();
        self.image = image;
        self.reset()?;
        Ok(len)
    }

    /// Apply one clock edge. Returns the new timing state, or -1 if halted.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> i32 {
        match self.cpu.step() {
            Step::Tick { t } => t as i32,
            Step::Halted => -1,
        }
    }

    /// Run one instruction cycle. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if self.cpu.is_halted() {
            return Err(JsError::new("CPU is halted"));
        }

        self.cpu.step_instruction(MAX_CYCLE_TICKS);
        Ok(disassemble_word(self.cpu.regs.ir))
    }

    /// Run until halt or max ticks. Printed characters are buffered for
    /// `take_output`. Returns true if the machine halted.
    #[wasm_bindgen]
    pub fn run(&mut self, max_ticks: u32) -> bool {
        let output = &mut self.output;
        let outcome = self
            .cpu
            .run_until_halt_with(u64::from(max_ticks), |byte| output.push(byte as char));
        matches!(outcome, RunOutcome::Halted { .. })
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.cpu = Cpu::new();
        self.output.clear();
        self.image.load_into(&mut self.cpu)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.cpu.reset(self.image.start().unwrap_or(0));
        Ok(())
    }

    /// Offer characters to the input device.
    #[wasm_bindgen]
    pub fn queue_input(&mut self, text: &str) {
        self.cpu.queue_input(text.as_bytes());
    }

    /// Collect everything the program has printed since the last call.
    #[wasm_bindgen]
    pub fn take_output(&mut self) -> String {
        let mut out = std::mem::take(&mut self.output);
        while let Some(byte) = self.cpu.take_output() {
            out.push(byte as char);
        }
        out
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get tick count.
    #[wasm_bindgen]
    pub fn ticks(&self) -> u64 {
        self.cpu.ticks
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Get accumulator value.
    #[wasm_bindgen]
    pub fn accumulator(&self) -> u16 {
        self.cpu.regs.ac
    }

    /// Get a register by name (e.g. "AC", "FGI", "T"). Unknown names are an
    /// error.
    #[wasm_bindgen]
    pub fn register(&self, name: &str) -> Result<u16, JsError> {
        let name: RegisterName = name.parse()
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.get_register(name))
    }

    /// Get memory word at address (0-4095). Out-of-range reads return 0.
    #[wasm_bindgen]
    pub fn memory_at(&self, address: usize) -> u16 {
        self.cpu.peek_memory(address).unwrap_or(0)
    }

    /// Get all memory as an array of words.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u16> {
        (0..MEMORY_SIZE).map(|i| self.memory_at(i)).collect()
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.regs)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return word count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let image = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(image.len())
}

/// Disassemble a single 16-bit word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_word(word)
}
