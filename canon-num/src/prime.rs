//! Tri-state primality testing.
//!
//! Below the square of the largest tabulated prime, trial division against a fixed table of the
//! first 1000 primes (up to 7919) gives a definite answer. Above it, Miller-Rabin with 30 random
//! witnesses can prove compositeness but only ever make primality *probable*, so the result is a
//! tri-state: [`Primality::Unknown`] is a legitimate, documented outcome for large probable
//! primes, never rounded up to `Prime`.

use once_cell::sync::Lazy;
use rand::Rng;
use rug::{integer::Order, Integer};
use super::primitive::int;

/// The number of Miller-Rabin rounds to run above the deterministic range.
const MILLER_RABIN_ROUNDS: usize = 30;

/// The largest prime in [`SMALL_PRIMES`].
pub const SMALL_PRIME_LIMIT: u64 = 7919;

/// The result of a primality test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primality {
    /// The number is prime.
    Prime,

    /// The number is composite (or below 2).
    Composite,

    /// The number is probably prime, but beyond the deterministic range; primality was not
    /// proven.
    Unknown,
}

/// The first 1000 primes, i.e. every prime up to and including 7919.
static SMALL_PRIMES: Lazy<Vec<u64>> = Lazy::new(|| {
    let limit = SMALL_PRIME_LIMIT as usize + 1;
    let mut sieve = vec![true; limit];
    let mut primes = Vec::with_capacity(1000);
    for n in 2..limit {
        if sieve[n] {
            primes.push(n as u64);
            let mut multiple = n * n;
            while multiple < limit {
                sieve[multiple] = false;
                multiple += n;
            }
        }
    }
    primes
});

/// Tests the primality of `n`.
pub fn is_prime(n: &Integer) -> Primality {
    if *n < 2 {
        return Primality::Composite;
    }

    for &p in SMALL_PRIMES.iter() {
        if *n == p {
            return Primality::Prime;
        }
        if n.is_divisible_u(p as u32) {
            return Primality::Composite;
        }
    }

    // trial division by every prime up to 7919 is exhaustive below 7919^2
    if *n < SMALL_PRIME_LIMIT * SMALL_PRIME_LIMIT {
        return Primality::Prime;
    }

    let mut rng = rand::thread_rng();
    for _ in 0..MILLER_RABIN_ROUNDS {
        let witness = random_witness(n, &mut rng);
        if miller_rabin_composite(n, &witness) {
            return Primality::Composite;
        }
    }

    Primality::Unknown
}

/// Picks a uniform-ish witness in `[2, n - 2]` from machine randomness.
fn random_witness(n: &Integer, rng: &mut impl Rng) -> Integer {
    let chunks = (n.significant_bits() as usize + 63) / 64 + 1;
    let digits: Vec<u64> = (0..chunks).map(|_| rng.gen()).collect();

    let mut witness = Integer::new();
    witness.assign_digits(&digits, Order::Lsf);
    witness % Integer::from(n - 3) + 2
}

/// One Miller-Rabin round: returns true if `witness` proves `n` composite.
fn miller_rabin_composite(n: &Integer, witness: &Integer) -> bool {
    let n_minus_1 = Integer::from(n - 1);
    let s = n_minus_1.find_one(0).unwrap_or(0);
    let d = Integer::from(&n_minus_1 >> s);

    // witness^d mod n; the exponent is positive, so pow_mod cannot fail
    let mut x = witness.clone().pow_mod(&d, n).unwrap();
    if x == 1 || x == n_minus_1 {
        return false;
    }

    for _ in 1..s {
        x = x.pow_mod(&int(2), n).unwrap();
        if x == n_minus_1 {
            return false;
        }
    }

    true
}
