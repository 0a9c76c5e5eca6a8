//! Timing sequencer.
//!
//! A 3-bit counter `t` plus the SC ("sequence started") flag. While the
//! machine runs, a cleared SC costs one priming tick that zeroes `t` and sets
//! SC; after that `t` counts up on every edge until the control logic clears
//! SC again.

use crate::cpu::{RegisterFile, StagedWrites};
use serde::{Serialize, Deserialize};

/// The timing states T0 through T7. Only T0..T6 carry micro-operations;
/// T7 is visited by ISZ while the counter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingState {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
}

impl TimingState {
    /// Decode the low 3 bits of the counter.
    pub fn from_counter(t: u8) -> Self {
        match t & 0b111 {
            0 => TimingState::T0,
            1 => TimingState::T1,
            2 => TimingState::T2,
            3 => TimingState::T3,
            4 => TimingState::T4,
            5 => TimingState::T5,
            6 => TimingState::T6,
            _ => TimingState::T7,
        }
    }

    /// The fetch and decode states, during which interrupts are not sampled.
    pub fn is_fetch(self) -> bool {
        matches!(self, TimingState::T0 | TimingState::T1 | TimingState::T2)
    }
}

/// What the sequencer does on the coming edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// S = 0: the counter is held at zero and nothing executes.
    Idle,
    /// S = 1, SC = 0: the counter restarts; nothing executes.
    Prime,
    /// S = 1, SC = 1: the micro-operations of this timing state execute.
    Run(TimingState),
}

/// Classify the coming edge from the pre-edge state.
pub fn phase(regs: &RegisterFile) -> Phase {
    match (regs.s, regs.sc) {
        (false, _) => Phase::Idle,
        (true, false) => Phase::Prime,
        (true, true) => Phase::Run(TimingState::from_counter(regs.t)),
    }
}

/// Writes produced by the sequencer on one edge.
pub fn clock(regs: &RegisterFile) -> StagedWrites {
    match phase(regs) {
        // Cpu::step stops before evaluating a halted machine, so a halted
        // CPU keeps the t it had after HLT. This arm serves callers of
        // clock_edge that evaluate an S = 0 snapshot directly.
        Phase::Idle => StagedWrites { t: Some(0), ..StagedWrites::hold() },
        Phase::Prime => StagedWrites { t: Some(0), sc: Some(true), ..StagedWrites::hold() },
        Phase::Run(_) => StagedWrites {
            t: Some(regs.t.wrapping_add(1) & 0b111),
            ..StagedWrites::hold()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs(s: bool, sc: bool, t: u8) -> RegisterFile {
        RegisterFile { s, sc, t, ..RegisterFile::new() }
    }

    #[test]
    fn test_idle_holds_counter_at_zero() {
        let w = clock(&regs(false, true, 4));
        assert_eq!(w.t, Some(0));
        assert_eq!(w.sc, None);
        assert_eq!(phase(&regs(false, true, 4)), Phase::Idle);
    }

    #[test]
    fn test_priming_tick() {
        let r = regs(true, false, 3);
        assert_eq!(phase(&r), Phase::Prime);
        let w = clock(&r);
        assert_eq!(w.t, Some(0));
        assert_eq!(w.sc, Some(true));
    }

    #[test]
    fn test_counter_advances() {
        let r = regs(true, true, 2);
        assert_eq!(phase(&r), Phase::Run(TimingState::T2));
        assert_eq!(clock(&r).t, Some(3));
    }

    #[test]
    fn test_counter_wraps_after_t7() {
        let r = regs(true, true, 7);
        assert_eq!(phase(&r), Phase::Run(TimingState::T7));
        assert_eq!(clock(&r).t, Some(0));
    }
}
