//! 4-bit ripple-carry adder.
//!
//! Four [`full_adder1`] stages chained low to high. The carry out of each
//! stage feeds the next, so the result settles bit by bit the way the
//! hardware's carry chain does.

use crate::logic::Word4;
use crate::logic::gates::full_adder1;

/// Number of full-adder stages in the chain.
pub const STAGES: usize = Word4::WIDTH;

/// Add two words with carry-in, returning `(sum, carry_out)`.
pub fn add4(a: Word4, b: Word4, cin: bool) -> (Word4, bool) {
    let mut sum = [false; STAGES];
    let mut carry = cin;

    for i in 0..STAGES {
        let (s, c) = full_adder1(a.bit(i), b.bit(i), carry);
        sum[i] = s;
        carry = c;
    }

    (Word4::from_bits(sum), carry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_basic() {
        let (sum, carry) = add4(Word4::truncate(5), Word4::truncate(6), false);
        assert_eq!(sum.value(), 11);
        assert!(!carry);
    }

    #[test]
    fn test_add_overflow_sets_carry() {
        let (sum, carry) = add4(Word4::MAX, Word4::truncate(1), false);
        assert_eq!(sum.value(), 0);
        assert!(carry);
    }

    #[test]
    fn test_carry_in_propagates() {
        let (sum, carry) = add4(Word4::MAX, Word4::ZERO, true);
        assert_eq!(sum.value(), 0);
        assert!(carry);
    }

    #[test]
    fn test_add_exhaustive() {
        for a in Word4::all() {
            for b in Word4::all() {
                for cin in [false, true] {
                    let total = u16::from(a.value()) + u16::from(b.value()) + u16::from(cin);
                    let (sum, cout) = add4(a, b, cin);
                    assert_eq!(u16::from(sum.value()), total % 16, "{a} + {b} + {cin}");
                    assert_eq!(cout, total >= 16, "carry of {a} + {b} + {cin}");
                }
            }
        }
    }

    #[test]
    fn test_add_commutativity() {
        for a in Word4::all() {
            for b in Word4::all() {
                assert_eq!(add4(a, b, false), add4(b, a, false));
            }
        }
    }
}
