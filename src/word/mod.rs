//! Binary word primitives for the Basic Computer.
//!
//! Every architectural value fits in a `u16`. This module knows the field
//! layout of a 16-bit instruction word and the widths of the narrower
//! registers:
//! - bit 15: indirect flag `I`
//! - bits 14..12: opcode
//! - bits 11..0: memory address or one-hot command mask

pub mod arith;

pub use arith::{add, complement, increment, rotate_left, rotate_right};

/// Mask for a 12-bit address (AR, PC, address field of an instruction).
pub const ADDR_MASK: u16 = 0x0FFF;

/// Mask for an 8-bit I/O character (INPR, OUTR).
pub const BYTE_MASK: u16 = 0x00FF;

/// Sign bit of a 16-bit word.
pub const SIGN_BIT: u16 = 0x8000;

/// Number of the opcode reserved for register- and I/O-reference words.
pub const OPCODE_NON_MEMORY: u8 = 0b111;

/// Indirect addressing flag (bit 15).
#[inline]
pub const fn indirect_bit(word: u16) -> bool {
    word & SIGN_BIT != 0
}

/// Opcode field (bits 14..12).
#[inline]
pub const fn opcode_field(word: u16) -> u8 {
    ((word >> 12) & 0b111) as u8
}

/// Address or command field (bits 11..0).
#[inline]
pub const fn address_field(word: u16) -> u16 {
    word & ADDR_MASK
}

/// Assemble a word from its three fields. Out-of-range parts are truncated.
#[inline]
pub const fn compose(indirect: bool, opcode: u8, field: u16) -> u16 {
    let i = if indirect { SIGN_BIT } else { 0 };
    i | (((opcode & 0b111) as u16) << 12) | (field & ADDR_MASK)
}

/// Next 12-bit address, wrapping from 4095 to 0.
#[inline]
pub const fn next_address(addr: u16) -> u16 {
    addr.wrapping_add(1) & ADDR_MASK
}

/// True if the word is negative when read as two's complement.
#[inline]
pub const fn is_negative(word: u16) -> bool {
    word & SIGN_BIT != 0
}

/// Interpret a word as a signed two's-complement value.
#[inline]
pub const fn to_signed(word: u16) -> i16 {
    word as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_extraction() {
        // ADD 5 with the indirect bit set
        let word = 0x9005;
        assert!(indirect_bit(word));
        assert_eq!(opcode_field(word), 1);
        assert_eq!(address_field(word), 5);

        let hlt = 0x7001;
        assert!(!indirect_bit(hlt));
        assert_eq!(opcode_field(hlt), OPCODE_NON_MEMORY);
        assert_eq!(address_field(hlt), 0x001);
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose(false, 2, 4), 0x2004);
        assert_eq!(compose(true, 7, 0x800), 0xF800);
        // Address field truncates to 12 bits
        assert_eq!(compose(false, 0, 0x1234), 0x0234);
    }

    #[test]
    fn test_next_address_wraps() {
        assert_eq!(next_address(0), 1);
        assert_eq!(next_address(0x0FFE), 0x0FFF);
        assert_eq!(next_address(0x0FFF), 0);
    }

    #[test]
    fn test_signedness() {
        assert!(is_negative(0xFFE9));
        assert_eq!(to_signed(0xFFE9), -23);
        assert!(!is_negative(83));
    }
}
