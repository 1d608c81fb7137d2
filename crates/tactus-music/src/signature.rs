//! Key and time signatures.

use std::str::FromStr;

use thiserror::Error;

use crate::braille;
use crate::duration::Rational;

/// Error when decoding a braille key or time signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("expected a number sign")]
    MissingNumberSign,
    #[error("expected a digit")]
    MissingDigit,
    #[error("expected a sharp or flat sign")]
    MissingAccidental,
    #[error("unexpected trailing cell")]
    TrailingInput,
    #[error("not a braille cell: {0:?}")]
    NotBraille(char),
}

/// Key signature as a signed count of accidentals.
///
/// Plain signatures use -7..=7; the range extends to ±14 once double sharps
/// or double flats enter the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeySignature {
    pub fifths: i32,
}

impl KeySignature {
    pub fn new(fifths: i32) -> Self {
        Self { fifths }
    }
}

impl FromStr for KeySignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        braille::parse_key_signature(s)
    }
}

/// A time signature, preserving the written numerator and denominator.
///
/// The rational value of 6/8 equals that of 3/4, but the written integers
/// matter to the engine: the beat unit is `1/denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    numerator: i64,
    denominator: i64,
}

impl TimeSignature {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn as_rational(&self) -> Rational {
        Rational::new(self.numerator, self.denominator)
    }

    /// The duration of one beat.
    pub fn beat(&self) -> Rational {
        Rational::new(1, self.denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl From<TimeSignature> for Rational {
    fn from(time: TimeSignature) -> Rational {
        time.as_rational()
    }
}

impl PartialEq<Rational> for TimeSignature {
    fn eq(&self, other: &Rational) -> bool {
        self.as_rational() == *other
    }
}

impl FromStr for TimeSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        braille::parse_time_signature(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::rational;

    #[test]
    fn test_time_signature_value() {
        let time = TimeSignature::new(12, 8);
        assert_eq!(time.as_rational(), rational(3, 2));
        assert_eq!(time.numerator(), 12);
        assert_eq!(time.denominator(), 8);
        assert_eq!(time.beat(), rational(1, 8));
        assert_eq!(time, rational(3, 2));
    }

    #[test]
    fn test_default_is_common_time() {
        assert_eq!(TimeSignature::default(), rational(1, 1));
    }
}
