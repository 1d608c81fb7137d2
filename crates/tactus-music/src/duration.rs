//! Exact rational durations and positions.
//!
//! Everything rhythmic in braille music is a non-negative rational with a
//! small denominator: powers of two from the plain note values, times odd
//! factors contributed by tuplets.  Construction reduces via gcd, so a
//! denominator can be inspected directly to answer questions like "is this
//! position dyadic".

use num_rational::Rational64;
use num_traits::Zero;

pub type Rational = Rational64;

/// Shorthand constructor, reducing on the way in.
pub fn rational(numer: i64, denom: i64) -> Rational {
    Rational::new(numer, denom)
}

/// Factor contributed by augmentation dots: `2 - 2^-dots`.
///
/// Zero dots yield 1, one dot 3/2, two dots 7/4, and so on.
pub fn augmentation_dots_factor(dots: u32) -> Rational {
    Rational::new((1i64 << (dots + 1)) - 1, 1i64 << dots)
}

/// True if the reduced denominator is a power of two.
///
/// Positions inside an active tuplet are generally not dyadic; once the
/// innermost tuplet closes the running position must be dyadic again.
pub fn is_dyadic(value: Rational) -> bool {
    let denom = *value.denom();
    denom & (denom - 1) == 0
}

/// True if `value` is an integer multiple of `unit`.
pub fn no_remainder(value: Rational, unit: Rational) -> bool {
    (value / unit).is_integer()
}

/// Greatest common divisor over rationals.
pub fn gcd(a: Rational, b: Rational) -> Rational {
    if b.is_zero() {
        a
    } else {
        gcd(b, a - b * (a / b).floor())
    }
}

/// Least common multiple over rationals.
pub fn lcm(a: Rational, b: Rational) -> Rational {
    if a.is_zero() || b.is_zero() {
        Rational::zero()
    } else {
        a * b / gcd(a, b)
    }
}
