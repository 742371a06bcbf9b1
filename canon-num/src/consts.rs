//! Lazily computed arbitrary-precision constants, at the working [`PRECISION`].
//!
//! These back the named constants the engine binds in every default context.
//!
//! [`PRECISION`]: super::primitive::PRECISION

use once_cell::sync::Lazy;
use rug::{Complex, Float};
use super::primitive::{complex, float};

/// The imaginary unit.
pub static I: Lazy<Complex> = Lazy::new(|| complex((0, 1)));

/// Euler's number.
pub static E: Lazy<Float> = Lazy::new(|| float(1).exp());

/// The golden ratio.
pub static PHI: Lazy<Float> = Lazy::new(|| (float(1) + float(5).sqrt()) / float(2));

pub static PI: Lazy<Float> = Lazy::new(|| float(-1).acos());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_have_their_values() {
        assert!((PI.to_f64() - std::f64::consts::PI).abs() < 1e-15);
        assert!((E.to_f64() - std::f64::consts::E).abs() < 1e-15);
        assert!((PHI.to_f64() - 1.618_033_988_749_894_8).abs() < 1e-15);
        assert_eq!(I.real().to_f64(), 0.0);
        assert_eq!(I.imag().to_f64(), 1.0);
    }
}
