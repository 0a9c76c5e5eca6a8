//! Accumulator arithmetic.
//!
//! These are the ALU operations the control unit uses. The carry/extend flag
//! `E` travels alongside the 16-bit accumulator as a `bool`.

use super::SIGN_BIT;

/// 17-bit addition: returns the low 16 bits and the carry out.
pub fn add(a: u16, b: u16) -> (u16, bool) {
    a.overflowing_add(b)
}

/// Increment by one, wrapping at 16 bits.
pub fn increment(value: u16) -> u16 {
    value.wrapping_add(1)
}

/// Bitwise complement of the accumulator.
pub fn complement(value: u16) -> u16 {
    !value
}

/// Circulate `{E, AC}` right: E enters bit 15, bit 0 leaves into E.
pub fn rotate_right(ac: u16, e: bool) -> (u16, bool) {
    let carry_in = if e { SIGN_BIT } else { 0 };
    ((ac >> 1) | carry_in, ac & 1 != 0)
}

/// Circulate `{E, AC}` left: E enters bit 0, bit 15 leaves into E.
pub fn rotate_left(ac: u16, e: bool) -> (u16, bool) {
    ((ac << 1) | e as u16, ac & SIGN_BIT != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_basic() {
        assert_eq!(add(83, 0xFFE9), (60, true));
        assert_eq!(add(100, 50), (150, false));
    }

    #[test]
    fn test_add_carry_out() {
        let (sum, carry) = add(0xFFFF, 1);
        assert_eq!(sum, 0);
        assert!(carry);
    }

    #[test]
    fn test_complement_then_increment_negates() {
        // 83 - (-23) computed the way the machine does it
        let negated = increment(complement(0xFFE9));
        assert_eq!(negated, 23);
        assert_eq!(add(negated, 83).0, 106);
    }

    #[test]
    fn test_rotate_right() {
        assert_eq!(rotate_right(0x0001, false), (0x0000, true));
        assert_eq!(rotate_right(0x0002, true), (0x8001, false));
    }

    #[test]
    fn test_rotate_left() {
        assert_eq!(rotate_left(0x8000, false), (0x0000, true));
        assert_eq!(rotate_left(0x4000, true), (0x8001, false));
    }

    #[test]
    fn test_rotate_is_reversible() {
        for (ac, e) in [(0x1234u16, true), (0xABCD, false), (0, true)] {
            let (r, re) = rotate_right(ac, e);
            assert_eq!(rotate_left(r, re), (ac, e));
        }
    }
}
