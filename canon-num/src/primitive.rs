//! Functions to construct [`Integer`]s, [`Float`]s, and [`Complex`] numbers from various
//! types.

use rug::{Assign, Complex, Float, Integer};

/// The number of bits of precision to use when computing arbitrary-precision values.
pub const PRECISION: u32 = 1 << 9;

/// The digits used by [`from_str_radix`], in order of increasing value.
pub const DIGITS: [char; 64] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    '+', '/',
];

/// Creates an [`Integer`] with the given value.
pub fn int<T>(n: T) -> Integer
where
    Integer: From<T>,
{
    Integer::from(n)
}

/// Creates a [`Float`] with the given value.
pub fn float<T>(n: T) -> Float
where
    Float: Assign<T>,
{
    Float::with_val(PRECISION, n)
}

/// Creates a [`Complex`] with the given value.
pub fn complex<T>(n: T) -> Complex
where
    Complex: Assign<T>,
{
    Complex::with_val(PRECISION, n)
}

/// Parses an integer from a string, with the given radix. The radix must be between 2 and 64,
/// inclusive.
///
/// Returns the value parsed so far along with the offending character when a digit is not valid
/// in the given radix, so callers can report an `unexpected-digit` error at the right position.
pub fn from_str_radix(s: &str, radix: u8) -> Result<Integer, (Integer, char)> {
    let allowed_digits = &DIGITS[..radix as usize];

    let mut result = int(0);
    let radix = int(radix);
    for c in s.chars() {
        let Some(digit) = allowed_digits.iter().position(|&d| d == c) else {
            return Err((result, c));
        };
        result *= &radix;
        result += int(digit);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radix_eval() {
        let expected = 1072;
        let numbers = [
            (2, "10000110000"),
            (8, "2060"),
            (25, "1hm"),
            (32, "11g"),
            (47, "mC"),
        ];

        for (radix, number) in numbers.iter() {
            assert_eq!(from_str_radix(number, *radix).unwrap(), expected);
        }
    }

    #[test]
    fn radix_rejects_digit() {
        let (partial, c) = from_str_radix("12a", 10).unwrap_err();
        assert_eq!(partial, 12);
        assert_eq!(c, 'a');
    }
}
