pub mod braille;
pub mod duration;
pub mod pitch;
pub mod signature;

pub use duration::{augmentation_dots_factor, gcd, is_dyadic, lcm, no_remainder, rational, Rational};
pub use pitch::{Accidental, Articulation, Fingering, Interval, Step, STEPS_PER_OCTAVE};
pub use signature::{KeySignature, SignatureError, TimeSignature};
