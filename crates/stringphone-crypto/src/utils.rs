//! Constant-time comparison helpers.
//!
//! Identifiers and keys are compared without leaking, through timing, how
//! many leading bytes matched.

use constant_time_eq::constant_time_eq;

/// Compare two byte slices in constant time.
///
/// Slices of different length compare unequal.
///
/// ```rust
/// use stringphone_crypto::utils::constant_time_compare;
///
/// assert!(constant_time_compare(b"abc", b"abc"));
/// assert!(!constant_time_compare(b"abc", b"abd"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq(a, b)
}

/// Compare two fixed-size arrays in constant time.
pub fn constant_time_compare_array<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    constant_time_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare(b"hello world", b"hello world"));
    }

    #[test]
    fn test_constant_time_compare_different() {
        assert!(!constant_time_compare(b"hello world", b"hello worlD"));
    }

    #[test]
    fn test_constant_time_compare_different_length() {
        assert!(!constant_time_compare(b"hello", b"hello world"));
    }

    #[test]
    fn test_constant_time_compare_id_sized() {
        let a = [0u8; 16];
        let mut b = [0u8; 16];
        assert!(constant_time_compare_array(&a, &b));
        b[15] = 1;
        assert!(!constant_time_compare_array(&a, &b));
    }
}
