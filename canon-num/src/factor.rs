//! Integer factorization helpers: gcd/lcm, prime factorization, exact root extraction, and
//! perfect-power detection.
//!
//! Root extraction is what lets the canonicalizer keep radicals exact: `sqrt(75)` decomposes to
//! `5 * sqrt(3)` by splitting the prime factorization of 75 into the part with exponent
//! multiples of 2 and the remainder, instead of falling back to a decimal approximation.

use rug::{ops::Pow, Integer};
use std::collections::HashMap;
use super::primitive::int;

/// Returns the greatest common divisor of two integers.
pub fn gcd(a: &Integer, b: &Integer) -> Integer {
    Integer::from(a.gcd_ref(b))
}

/// Returns the least common multiple of two integers.
pub fn lcm(a: &Integer, b: &Integer) -> Integer {
    Integer::from(a.lcm_ref(b))
}

/// Returns the prime factorization of the given integer as a map from prime to multiplicity.
/// A negative input carries a `-1` factor with multiplicity 1; `0` and `±1` factor to an empty
/// map (plus the sign factor).
pub fn prime_factorization(mut n: Integer) -> HashMap<Integer, u32> {
    let mut factors = HashMap::new();
    if n < 0 {
        factors.insert(int(-1), 1);
        n = -n;
    }

    let mut i = int(2);
    while int((&i) * (&i)) <= n {
        while n.is_divisible(&i) {
            *factors.entry(i.clone()).or_insert(0) += 1;
            n /= &i;
        }
        i += 1;
    }
    if n > 1 {
        *factors.entry(n).or_insert(0) += 1;
    }

    factors
}

/// Decomposes `n` into `(outside, inside)` such that `n = outside^k * inside`, with `outside`
/// maximal. `inside` carries every prime whose multiplicity is not a multiple of `k`, so
/// `factor_root(75, 2)` is `(5, 3)` and `factor_root(8, 3)` is `(2, 1)`.
///
/// Expects `n >= 0`; callers handle the sign (and the complex branch for even roots of negative
/// values) before extracting.
pub fn factor_root(n: &Integer, k: u32) -> (Integer, Integer) {
    debug_assert!(k >= 1);
    debug_assert!(*n >= 0);

    if *n <= 1 || k == 1 {
        return (n.clone(), int(1));
    }

    let mut outside = int(1);
    let mut inside = int(1);
    for (prime, count) in prime_factorization(n.clone()) {
        if count / k > 0 {
            outside *= prime.clone().pow(count / k);
        }
        if count % k > 0 {
            inside *= prime.pow(count % k);
        }
    }

    (outside, inside)
}

/// If `n = base^exp` for some `exp > 1`, returns the decomposition with the largest exponent.
/// `0`, `1`, and negative inputs are not considered perfect powers.
pub fn perfect_power(n: &Integer) -> Option<(Integer, u32)> {
    if *n <= 1 {
        return None;
    }

    let factors = prime_factorization(n.clone());
    let exp = factors
        .values()
        .copied()
        .fold(0u32, |acc, count| gcd_u32(acc, count));
    if exp < 2 {
        return None;
    }

    let mut base = int(1);
    for (prime, count) in factors {
        base *= prime.pow(count / exp);
    }
    Some((base, exp))
}

fn gcd_u32(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn factorization() {
        let factors = prime_factorization(int(360));
        let expected: HashMap<Integer, u32> =
            [(int(2), 3), (int(3), 2), (int(5), 1)].into_iter().collect();
        assert_eq!(factors, expected);
    }

    #[test]
    fn factorization_of_negative() {
        let factors = prime_factorization(int(-12));
        assert_eq!(factors[&int(-1)], 1);
        assert_eq!(factors[&int(2)], 2);
        assert_eq!(factors[&int(3)], 1);
    }

    #[test]
    fn square_root_extraction() {
        assert_eq!(factor_root(&int(75), 2), (int(5), int(3)));
        assert_eq!(factor_root(&int(144), 2), (int(12), int(1)));
        assert_eq!(factor_root(&int(7), 2), (int(1), int(7)));
    }

    #[test]
    fn cube_root_extraction() {
        assert_eq!(factor_root(&int(8), 3), (int(2), int(1)));
        assert_eq!(factor_root(&int(54), 3), (int(3), int(2)));
    }

    #[test]
    fn perfect_powers() {
        assert_eq!(perfect_power(&int(64)), Some((int(2), 6)));
        assert_eq!(perfect_power(&int(36)), Some((int(6), 2)));
        assert_eq!(perfect_power(&int(72)), None);
        assert_eq!(perfect_power(&int(1)), None);
    }

    #[test]
    fn gcd_lcm() {
        assert_eq!(gcd(&int(12), &int(18)), 6);
        assert_eq!(lcm(&int(4), &int(6)), 12);
    }
}
