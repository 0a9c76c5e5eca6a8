//! Control unit: the instruction-cycle state machine.
//!
//! For each timing state this computes the register transfers of one clock
//! edge from the pre-edge registers and memory. Nothing here mutates state;
//! the result is a [`StagedWrites`] record for the CPU to commit.
//!
//! | State | R = 0                               | R = 1                    |
//! |-------|-------------------------------------|--------------------------|
//! | T0    | AR ← PC                             | AR ← 0, TR ← PC          |
//! | T1    | IR ← M[AR], PC ← PC + 1             | M[AR] ← TR, PC ← 0       |
//! | T2    | decode IR into opcode, AR and I     | PC ← PC + 1, IEN, R, SC ← 0 |
//! | T3..  | indirect lookup, then execute       |                          |

use crate::cpu::decode::{IoOp, MemoryOp, RegisterOp};
use crate::cpu::sequencer::{self, Phase, TimingState};
use crate::cpu::{Memory, RegisterFile, StagedWrites};
use crate::word::{self, arith, ADDR_MASK, BYTE_MASK};

/// Writes produced by the control logic on one edge.
pub fn evaluate(regs: &RegisterFile, mem: &Memory) -> StagedWrites {
    let mut w = StagedWrites::hold();

    let state = match sequencer::phase(regs) {
        Phase::Run(state) => state,
        Phase::Idle | Phase::Prime => return w,
    };

    match state {
        TimingState::T0 => fetch_address(regs, &mut w),
        TimingState::T1 => fetch_instruction(regs, mem, &mut w),
        TimingState::T2 => decode(regs, &mut w),
        TimingState::T3 => dispatch(regs, mem, &mut w),
        TimingState::T4 => execute_t4(regs, mem, &mut w),
        TimingState::T5 => execute_t5(regs, &mut w),
        TimingState::T6 => execute_t6(regs, &mut w),
        TimingState::T7 => {}
    }

    w
}

fn fetch_address(regs: &RegisterFile, w: &mut StagedWrites) {
    if regs.r {
        w.ar = Some(0);
        w.tr = Some(regs.pc);
    } else {
        w.ar = Some(regs.pc);
    }
}

fn fetch_instruction(regs: &RegisterFile, mem: &Memory, w: &mut StagedWrites) {
    if regs.r {
        w.mem = Some((regs.ar, regs.tr));
        w.pc = Some(0);
    } else {
        w.ir = Some(mem.read(regs.ar));
        w.pc = Some(word::next_address(regs.pc));
    }
}

fn decode(regs: &RegisterFile, w: &mut StagedWrites) {
    if regs.r {
        log::debug!("interrupt cycle: return address {:03X} saved at 000", regs.tr & ADDR_MASK);
        w.pc = Some(word::next_address(regs.pc));
        w.ien = Some(false);
        w.r = Some(false);
        w.sc = Some(false);
    } else {
        w.opcode = Some(word::opcode_field(regs.ir));
        w.ar = Some(word::address_field(regs.ir));
        w.i = Some(word::indirect_bit(regs.ir));
    }
}

fn dispatch(regs: &RegisterFile, mem: &Memory, w: &mut StagedWrites) {
    let command = word::address_field(regs.ir);

    match MemoryOp::from_opcode(regs.opcode) {
        Some(_) => {
            if regs.i {
                w.ar = Some(mem.read(regs.ar) & ADDR_MASK);
            }
        }
        None => {
            w.sc = Some(false);
            if regs.i {
                match IoOp::from_mask(command) {
                    Some(op) => execute_io(op, regs, w),
                    None => log::debug!("ignoring I/O command bits {:03X}", command),
                }
            } else {
                match RegisterOp::from_mask(command) {
                    Some(op) => execute_register(op, regs, w),
                    None => log::debug!("ignoring register command bits {:03X}", command),
                }
            }
        }
    }
}

fn skip_if(condition: bool, regs: &RegisterFile, w: &mut StagedWrites) {
    if condition {
        w.pc = Some(word::next_address(regs.pc));
    }
}

fn execute_register(op: RegisterOp, regs: &RegisterFile, w: &mut StagedWrites) {
    match op {
        RegisterOp::Cla => w.ac = Some(0),
        RegisterOp::Cle => w.e = Some(false),
        RegisterOp::Cma => w.ac = Some(arith::complement(regs.ac)),
        RegisterOp::Cme => w.e = Some(!regs.e),
        RegisterOp::Cir => {
            let (ac, e) = arith::rotate_right(regs.ac, regs.e);
            w.ac = Some(ac);
            w.e = Some(e);
        }
        RegisterOp::Cil => {
            let (ac, e) = arith::rotate_left(regs.ac, regs.e);
            w.ac = Some(ac);
            w.e = Some(e);
        }
        RegisterOp::Inc => w.ac = Some(arith::increment(regs.ac)),
        RegisterOp::Spa => skip_if(!word::is_negative(regs.ac), regs, w),
        RegisterOp::Sna => skip_if(word::is_negative(regs.ac), regs, w),
        RegisterOp::Sza => skip_if(regs.ac == 0, regs, w),
        RegisterOp::Sze => skip_if(!regs.e, regs, w),
        RegisterOp::Hlt => {
            log::debug!("HLT at PC={:03X}", regs.pc);
            w.s = Some(false);
        }
    }
}

fn execute_io(op: IoOp, regs: &RegisterFile, w: &mut StagedWrites) {
    match op {
        IoOp::Inp => {
            w.ac = Some((regs.ac & !BYTE_MASK) | regs.inpr as u16);
            w.fgi = Some(false);
        }
        IoOp::Out => {
            w.outr = Some((regs.ac & BYTE_MASK) as u8);
            w.fgo = Some(false);
        }
        IoOp::Ski => skip_if(regs.fgi, regs, w),
        IoOp::Sko => skip_if(regs.fgo, regs, w),
        IoOp::Ion => w.ien = Some(true),
        IoOp::Iof => w.ien = Some(false),
    }
}

fn execute_t4(regs: &RegisterFile, mem: &Memory, w: &mut StagedWrites) {
    let Some(op) = MemoryOp::from_opcode(regs.opcode) else {
        return;
    };

    match op {
        MemoryOp::And | MemoryOp::Add | MemoryOp::Lda | MemoryOp::Isz => {
            w.dr = Some(mem.read(regs.ar));
        }
        MemoryOp::Sta => {
            w.mem = Some((regs.ar, regs.ac));
            w.sc = Some(false);
        }
        MemoryOp::Bun => {
            w.pc = Some(regs.ar);
            w.sc = Some(false);
        }
        MemoryOp::Bsa => {
            w.mem = Some((regs.ar, regs.pc));
            w.ar = Some(word::next_address(regs.ar));
        }
    }
}

fn execute_t5(regs: &RegisterFile, w: &mut StagedWrites) {
    let Some(op) = MemoryOp::from_opcode(regs.opcode) else {
        return;
    };

    match op {
        MemoryOp::And => {
            w.ac = Some(regs.ac & regs.dr);
            w.sc = Some(false);
        }
        MemoryOp::Add => {
            let (sum, carry) = arith::add(regs.ac, regs.dr);
            w.ac = Some(sum);
            w.e = Some(carry);
            w.sc = Some(false);
        }
        MemoryOp::Lda => {
            w.ac = Some(regs.dr);
            w.sc = Some(false);
        }
        MemoryOp::Bsa => {
            w.pc = Some(regs.ar);
            w.sc = Some(false);
        }
        MemoryOp::Isz => w.dr = Some(arith::increment(regs.dr)),
        MemoryOp::Sta | MemoryOp::Bun => {}
    }
}

// SC stays set here: the counter runs on through T7 and wraps to T0, so the
// next fetch starts without a priming tick.
fn execute_t6(regs: &RegisterFile, w: &mut StagedWrites) {
    if MemoryOp::from_opcode(regs.opcode) == Some(MemoryOp::Isz) {
        w.mem = Some((regs.ar, regs.dr));
        skip_if(regs.dr == 0, regs, w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registers positioned at timing state `t` of a running cycle.
    fn at(t: u8) -> RegisterFile {
        RegisterFile { s: true, sc: true, t, ..RegisterFile::new() }
    }

    #[test]
    fn test_nothing_runs_outside_run_phase() {
        let mem = Memory::new();
        let mut regs = at(0);
        regs.sc = false;
        assert!(evaluate(&regs, &mem).is_hold());
        regs.s = false;
        assert!(evaluate(&regs, &mem).is_hold());
    }

    #[test]
    fn test_fetch_sequence() {
        let mut mem = Memory::new();
        mem.write(0x10, 0x9123);

        let mut regs = at(0);
        regs.pc = 0x10;
        assert_eq!(evaluate(&regs, &mem).ar, Some(0x10));

        let mut regs = at(1);
        regs.ar = 0x10;
        regs.pc = 0x10;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.ir, Some(0x9123));
        assert_eq!(w.pc, Some(0x11));

        let mut regs = at(2);
        regs.ir = 0x9123;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.opcode, Some(1));
        assert_eq!(w.ar, Some(0x123));
        assert_eq!(w.i, Some(true));
        assert_eq!(w.sc, None);
    }

    #[test]
    fn test_interrupt_cycle() {
        let mem = Memory::new();

        let mut regs = at(0);
        regs.r = true;
        regs.pc = 0x205;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ar, w.tr), (Some(0), Some(0x205)));

        let mut regs = at(1);
        regs.r = true;
        regs.tr = 0x205;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.mem, Some((0, 0x205)));
        assert_eq!(w.pc, Some(0));
        assert_eq!(w.ir, None);

        let mut regs = at(2);
        regs.r = true;
        regs.ien = true;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.pc, Some(1));
        assert_eq!((w.ien, w.r, w.sc), (Some(false), Some(false), Some(false)));
        assert_eq!(w.opcode, None);
    }

    #[test]
    fn test_indirect_lookup_at_t3() {
        let mut mem = Memory::new();
        mem.write(0x050, 0xF123);

        let mut regs = at(3);
        regs.opcode = 2;
        regs.i = true;
        regs.ar = 0x050;
        // Only the 12-bit address part of the pointer is used
        assert_eq!(evaluate(&regs, &mem).ar, Some(0x123));

        regs.i = false;
        assert!(evaluate(&regs, &mem).is_hold());
    }

    #[test]
    fn test_register_reference_ends_cycle() {
        let mem = Memory::new();
        let mut regs = at(3);
        regs.opcode = 7;
        regs.ir = 0x7800;
        regs.ac = 0x1234;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.ac, Some(0));
        assert_eq!(w.sc, Some(false));
    }

    #[test]
    fn test_unknown_command_only_clears_sc() {
        let mem = Memory::new();
        for (ir, i) in [(0x7000, false), (0x7003, false), (0xF001, true), (0xFC00, true)] {
            let mut regs = at(3);
            regs.opcode = 7;
            regs.i = i;
            regs.ir = ir;
            let w = evaluate(&regs, &mem);
            assert_eq!(w, StagedWrites { sc: Some(false), ..StagedWrites::hold() }, "{ir:#06x}");
        }
    }

    #[test]
    fn test_skip_instructions() {
        let mem = Memory::new();
        let mut regs = at(3);
        regs.opcode = 7;
        regs.pc = 0x0FFF;

        regs.ir = 0x7004; // SZA
        regs.ac = 0;
        assert_eq!(evaluate(&regs, &mem).pc, Some(0));
        regs.ac = 1;
        assert_eq!(evaluate(&regs, &mem).pc, None);

        regs.ir = 0x7010; // SPA
        assert_eq!(evaluate(&regs, &mem).pc, Some(0));
        regs.ir = 0x7008; // SNA
        assert_eq!(evaluate(&regs, &mem).pc, None);
        regs.ac = 0x8000;
        assert_eq!(evaluate(&regs, &mem).pc, Some(0));

        regs.ir = 0x7002; // SZE
        regs.e = true;
        assert_eq!(evaluate(&regs, &mem).pc, None);
    }

    #[test]
    fn test_io_commands() {
        let mem = Memory::new();
        let mut regs = at(3);
        regs.opcode = 7;
        regs.i = true;
        regs.ac = 0xAB00;
        regs.inpr = 0x41;
        regs.fgi = true;

        regs.ir = 0xF800; // INP
        let w = evaluate(&regs, &mem);
        assert_eq!(w.ac, Some(0xAB41));
        assert_eq!(w.fgi, Some(false));

        regs.ac = 0x1242;
        regs.ir = 0xF400; // OUT
        let w = evaluate(&regs, &mem);
        assert_eq!(w.outr, Some(0x42));
        assert_eq!(w.fgo, Some(false));

        regs.ir = 0xF200; // SKI
        regs.pc = 7;
        assert_eq!(evaluate(&regs, &mem).pc, Some(8));

        regs.ir = 0xF080; // ION
        assert_eq!(evaluate(&regs, &mem).ien, Some(true));
    }

    #[test]
    fn test_e_and_circulate_commands() {
        let mem = Memory::new();
        let mut regs = at(3);
        regs.opcode = 7;
        regs.e = true;

        regs.ir = 0x7400; // CLE
        let w = evaluate(&regs, &mem);
        assert_eq!((w.e, w.ac, w.sc), (Some(false), None, Some(false)));

        regs.ir = 0x7100; // CME
        assert_eq!(evaluate(&regs, &mem).e, Some(false));
        regs.e = false;
        assert_eq!(evaluate(&regs, &mem).e, Some(true));

        regs.ir = 0x7080; // CIR
        regs.ac = 0x0003;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ac, w.e), (Some(0x0001), Some(true)));
        regs.e = true;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ac, w.e), (Some(0x8001), Some(true)));

        regs.ir = 0x7040; // CIL
        regs.ac = 0x8001;
        regs.e = false;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ac, w.e), (Some(0x0002), Some(true)));
        regs.ac = 0x4000;
        regs.e = true;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ac, w.e), (Some(0x8001), Some(false)));
    }

    #[test]
    fn test_iof_and_sko() {
        let mem = Memory::new();
        let mut regs = at(3);
        regs.opcode = 7;
        regs.i = true;
        regs.ien = true;
        regs.pc = 0x040;

        regs.ir = 0xF040; // IOF
        let w = evaluate(&regs, &mem);
        assert_eq!((w.ien, w.sc), (Some(false), Some(false)));

        regs.ir = 0xF100; // SKO
        regs.fgo = false;
        let w = evaluate(&regs, &mem);
        assert_eq!((w.pc, w.sc), (None, Some(false)));
        regs.fgo = true;
        assert_eq!(evaluate(&regs, &mem).pc, Some(0x041));
    }

    #[test]
    fn test_and_at_t5() {
        let mem = Memory::new();
        let mut regs = at(5);
        regs.opcode = MemoryOp::And.opcode();
        regs.ac = 0xFF0F;
        regs.dr = 0x0FF0;
        regs.e = true;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.ac, Some(0x0F00));
        assert_eq!(w.e, None);
        assert_eq!(w.sc, Some(false));
    }

    #[test]
    fn test_add_sets_carry() {
        let mem = Memory::new();
        let mut regs = at(5);
        regs.opcode = MemoryOp::Add.opcode();
        regs.ac = 83;
        regs.dr = 0xFFE9;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.ac, Some(60));
        assert_eq!(w.e, Some(true));
        assert_eq!(w.sc, Some(false));
    }

    #[test]
    fn test_bsa_sequence() {
        let mem = Memory::new();
        let mut regs = at(4);
        regs.opcode = MemoryOp::Bsa.opcode();
        regs.ar = 0x200;
        regs.pc = 0x101;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.mem, Some((0x200, 0x101)));
        assert_eq!(w.ar, Some(0x201));
        assert_eq!(w.sc, None);

        let mut regs = at(5);
        regs.opcode = MemoryOp::Bsa.opcode();
        regs.ar = 0x201;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.pc, Some(0x201));
        assert_eq!(w.sc, Some(false));
    }

    #[test]
    fn test_isz_keeps_sequence_running() {
        let mem = Memory::new();
        let mut regs = at(5);
        regs.opcode = MemoryOp::Isz.opcode();
        regs.dr = 0xFFFF;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.dr, Some(0));
        assert_eq!(w.sc, None);

        let mut regs = at(6);
        regs.opcode = MemoryOp::Isz.opcode();
        regs.ar = 0x30;
        regs.dr = 0;
        regs.pc = 0x11;
        let w = evaluate(&regs, &mem);
        assert_eq!(w.mem, Some((0x30, 0)));
        assert_eq!(w.pc, Some(0x12));
        assert_eq!(w.sc, None);

        assert!(evaluate(&at(7), &mem).is_hold());
    }
}
