//! Single-bit gate models.
//!
//! The machine's gate library only offers AND, OR and NOT. Exclusive-or
//! and the full adder are therefore composed from those primitives here
//! rather than taken from the host's `^` and `+`.

/// Exclusive-or built from AND/OR/NOT: `(a & !b) | (!a & b)`.
#[inline]
pub fn xor1(a: bool, b: bool) -> bool {
    (a && !b) || (!a && b)
}

/// 1-bit full adder, returning `(sum, carry_out)`.
///
/// `sum = (a xor b) xor cin`, `cout = (a & b) | (cin & (a xor b))`.
#[inline]
pub fn full_adder1(a: bool, b: bool, cin: bool) -> (bool, bool) {
    let half = xor1(a, b);
    let sum = xor1(half, cin);
    let cout = (a && b) || (cin && half);
    (sum, cout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_truth_table() {
        assert!(!xor1(false, false));
        assert!(xor1(false, true));
        assert!(xor1(true, false));
        assert!(!xor1(true, true));
    }

    #[test]
    fn test_xor_matches_native_bitwise() {
        for a in 0u8..16 {
            for b in 0u8..16 {
                let gate = (0..4).fold(0u8, |acc, i| {
                    let bit = xor1((a >> i) & 1 == 1, (b >> i) & 1 == 1);
                    acc | (u8::from(bit) << i)
                });
                assert_eq!(gate, a ^ b, "xor1 disagrees for {a:X} ^ {b:X}");
            }
        }
    }

    #[test]
    fn test_full_adder_truth_table() {
        // (a, b, cin) -> (sum, cout)
        let table = [
            ((false, false, false), (false, false)),
            ((false, false, true), (true, false)),
            ((false, true, false), (true, false)),
            ((false, true, true), (false, true)),
            ((true, false, false), (true, false)),
            ((true, false, true), (false, true)),
            ((true, true, false), (false, true)),
            ((true, true, true), (true, true)),
        ];

        for ((a, b, cin), expected) in table {
            assert_eq!(full_adder1(a, b, cin), expected, "row {a} {b} {cin}");
        }
    }
}
