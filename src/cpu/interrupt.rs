//! Interrupt request logic.
//!
//! Outside the fetch states, an enabled machine with either I/O flag up
//! raises R. The control unit lowers R again when it finishes the interrupt
//! cycle.

use crate::cpu::sequencer::TimingState;
use crate::cpu::{RegisterFile, StagedWrites};

/// True if the request condition holds for the pre-edge state.
pub fn requested(regs: &RegisterFile) -> bool {
    !TimingState::from_counter(regs.t).is_fetch() && regs.ien && (regs.fgi || regs.fgo)
}

/// Writes produced by the interrupt logic on one edge.
pub fn evaluate(regs: &RegisterFile) -> StagedWrites {
    if !requested(regs) {
        return StagedWrites::hold();
    }

    if !regs.r {
        log::debug!("interrupt requested at T{} (FGI={}, FGO={})", regs.t, regs.fgi, regs.fgo);
    }
    StagedWrites { r: Some(true), ..StagedWrites::hold() }
}
