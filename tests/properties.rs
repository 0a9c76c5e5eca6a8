//! Property tests for the clock-edge model.

use mano::cpu::{clock_edge, Block, IoOp, RegisterOp};
use mano::{Cpu, Memory, RegisterFile, Step};
use proptest::prelude::*;

fn arb_registers() -> impl Strategy<Value = RegisterFile> {
    let words = (0u16..0x1000, 0u16..0x1000, any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>());
    let bytes = (any::<u8>(), any::<u8>(), 0u8..8, 0u8..8);
    let flags = prop::array::uniform8(any::<bool>());

    (words, bytes, flags).prop_map(|((ar, pc, ac, dr, ir, tr), (inpr, outr, opcode, t), f)| {
        RegisterFile {
            ar,
            pc,
            ac,
            dr,
            ir,
            tr,
            inpr,
            outr,
            i: f[0],
            e: f[1],
            r: f[2],
            s: f[3],
            fgi: f[4],
            fgo: f[5],
            ien: f[6],
            sc: f[7],
            opcode,
            t,
        }
    })
}

fn arb_memory() -> impl Strategy<Value = Memory> {
    prop::collection::vec((0u16..0x1000, any::<u16>()), 0..64).prop_map(|cells| {
        let mut mem = Memory::new();
        for (address, word) in cells {
            mem.write(address, word);
        }
        mem
    })
}

/// The six orders the three blocks can be evaluated in.
fn permutations() -> Vec<[Block; 3]> {
    let [a, b, c] = Block::ALL;
    vec![[a, b, c], [a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]]
}

/// Registers about to execute the T3 edge of an opcode-7 word.
fn at_t3(regs: RegisterFile, indirect: bool, bits: u16) -> RegisterFile {
    RegisterFile {
        ir: (if indirect { 0xF000 } else { 0x7000 }) | bits,
        opcode: 7,
        i: indirect,
        s: true,
        sc: true,
        t: 3,
        ..regs
    }
}

proptest! {
    #[test]
    fn same_program_same_trace(program in prop::collection::vec(any::<u16>(), 1..32), ticks in 0usize..400) {
        let mut a = Cpu::new();
        a.load_program(0, &program).unwrap();
        a.reset(0);
        let mut b = a.clone();

        for _ in 0..ticks {
            prop_assert_eq!(a.step(), b.step());
            prop_assert_eq!(&a.regs, &b.regs);
        }
        prop_assert!(a.mem == b.mem);
        prop_assert_eq!(a.ticks, b.ticks);
    }

    #[test]
    fn commit_does_not_depend_on_block_order(regs in arb_registers(), mem in arb_memory()) {
        let expected = clock_edge(&regs, &mem, &Block::ALL);
        for order in permutations() {
            prop_assert_eq!(&clock_edge(&regs, &mem, &order), &expected);
        }
    }

    #[test]
    fn halted_machine_stays_put(regs in arb_registers(), mem in arb_memory()) {
        let mut cpu = Cpu::new();
        cpu.regs = RegisterFile { s: false, ..regs };
        cpu.mem = mem;
        let before = cpu.clone();

        for _ in 0..4 {
            prop_assert_eq!(cpu.step(), Step::Halted);
        }
        prop_assert_eq!(&cpu.regs, &before.regs);
        prop_assert!(cpu.mem == before.mem);
        prop_assert_eq!(cpu.ticks, before.ticks);
    }

    #[test]
    fn timing_counter_advances_by_one(regs in arb_registers(), mem in arb_memory()) {
        let mut cpu = Cpu::new();
        cpu.regs = RegisterFile { s: true, sc: true, ..regs };
        cpu.mem = mem;
        let t = cpu.regs.t;

        prop_assert_eq!(cpu.step(), Step::Tick { t: (t + 1) % 8 });
    }

    #[test]
    fn unknown_register_command_only_clears_sc(
        regs in arb_registers(),
        bits in (0u16..0x1000).prop_filter("not a register command", |&b| RegisterOp::from_mask(b).is_none()),
    ) {
        let mut cpu = Cpu::new();
        cpu.regs = at_t3(regs, false, bits);
        let before = cpu.regs.clone();

        cpu.step();
        prop_assert!(!cpu.regs.sc);
        prop_assert_eq!(cpu.regs.ac, before.ac);
        prop_assert_eq!(cpu.regs.e, before.e);
        prop_assert_eq!(cpu.regs.pc, before.pc);
        prop_assert!(cpu.regs.s);
    }

    #[test]
    fn unknown_io_command_only_clears_sc(
        regs in arb_registers(),
        bits in prop_oneof![
            (0u16..0x1000).prop_filter("not an I/O command", |&b| IoOp::from_mask(b).is_none()),
            (0u32..6).prop_map(|n| 1u16 << n),
        ],
    ) {
        let mut cpu = Cpu::new();
        cpu.regs = at_t3(regs, true, bits);
        let before = cpu.regs.clone();

        cpu.step();
        prop_assert!(!cpu.regs.sc);
        prop_assert_eq!(cpu.regs.ac, before.ac);
        prop_assert_eq!(cpu.regs.pc, before.pc);
        prop_assert_eq!(cpu.regs.outr, before.outr);
        prop_assert_eq!(cpu.regs.fgi, before.fgi);
        prop_assert_eq!(cpu.regs.fgo, before.fgo);
        prop_assert_eq!(cpu.regs.ien, before.ien);
    }
}
