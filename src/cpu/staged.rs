//! Staged register-transfer writes.
//!
//! Every block of the machine reads the state as it stood before the clock
//! edge and describes its outputs as a [`StagedWrites`] record. The records
//! are merged and committed together, so no block ever observes another
//! block's output from the same edge.

use crate::cpu::{Memory, RegisterFile};
use serde::{Serialize, Deserialize};

/// Pending writes for one clock edge. `None` means "hold".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedWrites {
    pub ar: Option<u16>,
    pub pc: Option<u16>,
    pub ac: Option<u16>,
    pub dr: Option<u16>,
    pub ir: Option<u16>,
    pub tr: Option<u16>,
    pub outr: Option<u8>,
    pub i: Option<bool>,
    pub e: Option<bool>,
    pub r: Option<bool>,
    pub s: Option<bool>,
    pub fgi: Option<bool>,
    pub fgo: Option<bool>,
    pub ien: Option<bool>,
    pub sc: Option<bool>,
    pub opcode: Option<u8>,
    pub t: Option<u8>,
    /// At most one memory write per edge: `(address, value)`.
    pub mem: Option<(u16, u16)>,
}

/// Combine two staged values for the same register.
///
/// The blocks of the machine drive disjoint registers on any given edge, so
/// a collision means the control logic itself is wrong.
fn join<T: PartialEq + Copy + std::fmt::Debug>(name: &str, a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => {
            debug_assert_eq!(x, y, "conflicting writes to {name} on one clock edge");
            Some(y)
        }
        (x, y) => y.or(x),
    }
}

impl StagedWrites {
    /// A record with no writes.
    pub fn hold() -> Self {
        Self::default()
    }

    /// True if nothing is written.
    pub fn is_hold(&self) -> bool {
        *self == Self::default()
    }

    /// Merge another block's writes into this record.
    pub fn merge(&mut self, other: StagedWrites) {
        self.ar = join("AR", self.ar, other.ar);
        self.pc = join("PC", self.pc, other.pc);
        self.ac = join("AC", self.ac, other.ac);
        self.dr = join("DR", self.dr, other.dr);
        self.ir = join("IR", self.ir, other.ir);
        self.tr = join("TR", self.tr, other.tr);
        self.outr = join("OUTR", self.outr, other.outr);
        self.i = join("I", self.i, other.i);
        self.e = join("E", self.e, other.e);
        self.r = join("R", self.r, other.r);
        self.s = join("S", self.s, other.s);
        self.fgi = join("FGI", self.fgi, other.fgi);
        self.fgo = join("FGO", self.fgo, other.fgo);
        self.ien = join("IEN", self.ien, other.ien);
        self.sc = join("SC", self.sc, other.sc);
        self.opcode = join("opcode", self.opcode, other.opcode);
        self.t = join("t", self.t, other.t);
        self.mem = join("memory", self.mem, other.mem);
    }

    /// Commit every staged write.
    pub fn apply(&self, regs: &mut RegisterFile, mem: &mut Memory) {
        fn put<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        put(&mut regs.ar, self.ar);
        put(&mut regs.pc, self.pc);
        put(&mut regs.ac, self.ac);
        put(&mut regs.dr, self.dr);
        put(&mut regs.ir, self.ir);
        put(&mut regs.tr, self.tr);
        put(&mut regs.outr, self.outr);
        put(&mut regs.i, self.i);
        put(&mut regs.e, self.e);
        put(&mut regs.r, self.r);
        put(&mut regs.s, self.s);
        put(&mut regs.fgi, self.fgi);
        put(&mut regs.fgo, self.fgo);
        put(&mut regs.ien, self.ien);
        put(&mut regs.sc, self.sc);
        put(&mut regs.opcode, self.opcode);
        put(&mut regs.t, self.t);

        if let Some((addr, value)) = self.mem {
            mem.write(addr, value);
        }
    }
}
