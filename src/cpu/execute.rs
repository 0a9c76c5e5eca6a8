//! CPU composition root for the Basic Computer.
//!
//! Owns the register file and memory and drives one clock edge per
//! [`Cpu::step`]. On every edge the timing sequencer, the interrupt logic
//! and the control unit all read the same pre-edge snapshot; their staged
//! writes are merged and committed at once.

use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{RegisterError, RegisterName};
use crate::cpu::sequencer::{self, Phase, TimingState};
use crate::cpu::{control, interrupt, Memory, RegisterFile, StagedWrites};
use crate::word::ADDR_MASK;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Longest instruction cycle in ticks: ISZ's priming tick plus T0 through T7.
pub const MAX_CYCLE_TICKS: u64 = 9;

/// The combinational blocks evaluated on every clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    Sequencer,
    Interrupt,
    Control,
}

impl Block {
    pub const ALL: [Block; 3] = [Block::Sequencer, Block::Interrupt, Block::Control];

    fn evaluate(self, regs: &RegisterFile, mem: &Memory) -> StagedWrites {
        match self {
            Block::Sequencer => sequencer::clock(regs),
            Block::Interrupt => interrupt::evaluate(regs),
            Block::Control => control::evaluate(regs, mem),
        }
    }
}

/// Compute the writes of one clock edge, evaluating the blocks in `order`.
///
/// Every block sees the same `regs` and `mem`, so the result does not
/// depend on `order`.
pub fn clock_edge(regs: &RegisterFile, mem: &Memory, order: &[Block]) -> StagedWrites {
    order.iter().fold(StagedWrites::hold(), |mut acc, block| {
        acc.merge(block.evaluate(regs, mem));
        acc
    })
}

/// Result of a single [`Cpu::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// One edge was applied; `t` is the new value of the timing counter.
    Tick { t: u8 },
    /// S = 0; nothing happened.
    Halted,
}

/// Result of running more than one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The machine executed HLT (or was already halted).
    Halted { ticks: u64 },
    /// An instruction cycle finished and the machine is still running.
    Boundary { ticks: u64 },
    /// The tick budget ran out first. Not a fault.
    TickBudgetExhausted { ticks: u64 },
}

impl RunOutcome {
    /// Edges executed during the run.
    pub fn ticks(&self) -> u64 {
        match *self {
            RunOutcome::Halted { ticks }
            | RunOutcome::Boundary { ticks }
            | RunOutcome::TickBudgetExhausted { ticks } => ticks,
        }
    }

    pub fn halted(&self) -> bool {
        matches!(self, RunOutcome::Halted { .. })
    }
}

/// The Basic Computer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: RegisterFile,
    /// Main memory.
    pub mem: Memory,
    /// Clock edges applied since reset.
    pub ticks: u64,
    /// Instruction and interrupt cycles completed since reset.
    pub instructions: u64,
    /// Characters waiting to be strobed into INPR.
    input: VecDeque<u8>,
    /// OUTR holds a character the host has not collected yet.
    output_pending: bool,
    /// The next edge begins a new instruction or interrupt cycle.
    boundary: bool,
}

impl Cpu {
    /// Create a new CPU with zeroed state. The machine is halted until
    /// [`Cpu::reset`] is called.
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            mem: Memory::new(),
            ticks: 0,
            instructions: 0,
            input: VecDeque::new(),
            output_pending: false,
            boundary: true,
        }
    }

    /// Reset registers and counters and start running at `start_address`.
    /// Memory is kept.
    pub fn reset(&mut self, start_address: u16) {
        log::debug!("reset: PC={:03X}", start_address & ADDR_MASK);
        self.regs.reset(start_address);
        self.ticks = 0;
        self.instructions = 0;
        self.input.clear();
        self.output_pending = false;
        self.boundary = true;
    }

    /// Preload a memory word.
    pub fn load_word(&mut self, address: usize, value: u16) -> Result<(), CpuError> {
        Ok(self.mem.load(address, value)?)
    }

    /// Preload a contiguous block of words.
    pub fn load_program(&mut self, start: usize, program: &[u16]) -> Result<(), CpuError> {
        Ok(self.mem.load_program(start, program)?)
    }

    /// Read a memory word.
    pub fn peek_memory(&self, address: usize) -> Result<u16, CpuError> {
        Ok(self.mem.peek(address)?)
    }

    /// Read a register.
    pub fn get_register(&self, name: RegisterName) -> u16 {
        self.regs.get(name)
    }

    /// Overwrite a register, for test setup or a debugger.
    pub fn set_register(&mut self, name: RegisterName, value: u16) -> Result<(), CpuError> {
        Ok(self.regs.set(name, value)?)
    }

    /// Apply one clock edge.
    pub fn step(&mut self) -> Step {
        if !self.regs.s {
            return Step::Halted;
        }

        let phase = sequencer::phase(&self.regs);
        let writes = clock_edge(&self.regs, &self.mem, &Block::ALL);

        // A cycle ends when the control unit clears SC, or when ISZ's idle
        // T7 hands straight over to the next T0.
        let cycle_done = writes.sc == Some(false) || phase == Phase::Run(TimingState::T7);

        if let (Phase::Run(TimingState::T2), false) = (phase, self.regs.r) {
            log::debug!(
                "{:03X}: {}",
                self.regs.pc.wrapping_sub(1) & ADDR_MASK,
                crate::asm::disasm::disassemble_word(self.regs.ir)
            );
        }

        writes.apply(&mut self.regs, &mut self.mem);
        self.ticks += 1;
        if cycle_done {
            self.instructions += 1;
        }
        self.boundary = cycle_done;
        if writes.outr.is_some() {
            self.output_pending = true;
        }
        self.strobe_input();

        log::trace!(
            "tick {}: t={} SC={} PC={:03X} AR={:03X} AC={:04X} E={}",
            self.ticks,
            self.regs.t,
            self.regs.sc as u8,
            self.regs.pc,
            self.regs.ar,
            self.regs.ac,
            self.regs.e as u8
        );

        if !self.regs.s {
            log::debug!("halted after {} ticks", self.ticks);
        }

        Step::Tick { t: self.regs.t }
    }

    /// Step until the current instruction cycle completes, the machine
    /// halts, or `max_ticks` edges have been applied.
    pub fn step_instruction(&mut self, max_ticks: u64) -> RunOutcome {
        let target = self.instructions + 1;
        let mut ticks = 0;

        while ticks < max_ticks {
            if self.step() == Step::Halted {
                return RunOutcome::Halted { ticks };
            }
            ticks += 1;
            if !self.regs.s {
                return RunOutcome::Halted { ticks };
            }
            if self.instructions >= target {
                return RunOutcome::Boundary { ticks };
            }
        }

        RunOutcome::TickBudgetExhausted { ticks }
    }

    /// Step until S = 0 or `max_ticks` edges have been applied.
    ///
    /// The printer is left alone: a program that waits on SKO after its
    /// first OUT spins until the host calls [`Cpu::take_output`]. Use
    /// [`Cpu::run_until_halt_with`] to have each character collected.
    pub fn run_until_halt(&mut self, max_ticks: u64) -> RunOutcome {
        self.run_loop(max_ticks, |_| {})
    }

    /// Like [`Cpu::run_until_halt`], but every character the program
    /// writes is collected after the edge that wrote it and handed to
    /// `on_output`, which raises FGO again.
    pub fn run_until_halt_with<F: FnMut(u8)>(&mut self, max_ticks: u64, mut on_output: F) -> RunOutcome {
        self.run_loop(max_ticks, |cpu| {
            if let Some(byte) = cpu.take_output() {
                on_output(byte);
            }
        })
    }

    fn run_loop<F: FnMut(&mut Self)>(&mut self, max_ticks: u64, mut after_edge: F) -> RunOutcome {
        let mut ticks = 0;

        while ticks < max_ticks {
            if self.step() == Step::Halted {
                return RunOutcome::Halted { ticks };
            }
            ticks += 1;
            after_edge(self);
        }

        if self.is_halted() {
            return RunOutcome::Halted { ticks };
        }

        log::warn!("no HLT within {} ticks (PC={:03X})", max_ticks, self.regs.pc);
        RunOutcome::TickBudgetExhausted { ticks }
    }

    /// Present a character on the input device: INPR is loaded and FGI
    /// raised, as a keyboard strobe would.
    pub fn provide_input(&mut self, byte: u8) {
        self.regs.inpr = byte;
        self.regs.fgi = true;
    }

    /// Queue characters to be presented one at a time, each as soon as the
    /// program has consumed the previous one with INP.
    pub fn queue_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
        self.strobe_input();
    }

    /// Characters still waiting in the input queue.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Collect the character in OUTR, if the program has written one since
    /// the last call. Collecting it raises FGO, as a printer finishing
    /// would.
    pub fn take_output(&mut self) -> Option<u8> {
        if !self.output_pending {
            return None;
        }
        self.output_pending = false;
        self.regs.fgo = true;
        Some(self.regs.outr)
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        !self.regs.s
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.regs.s
    }

    /// True if the next edge starts a fresh instruction cycle.
    pub fn at_instruction_boundary(&self) -> bool {
        self.boundary
    }

    fn strobe_input(&mut self) {
        if !self.regs.fgi {
            if let Some(byte) = self.input.pop_front() {
                self.provide_input(byte);
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("ticks", &self.ticks)
            .field("instructions", &self.instructions)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors from host access to the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),
}
