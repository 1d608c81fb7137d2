//! Alteration calculation.
//!
//! Assigns every note and chord interval its signed alteration (-3..=3)
//! from the key signature and the accidentals seen so far in the measure.
//! Accidental memory is per octave and step, resets at each measure start,
//! and must be fed in chronological order, which means sorting the signs of
//! all voices by onset before visiting them.

use num_traits::Zero;
use tactus_ast::{Measure, Pitch, Sign};
use tactus_music::{Accidental, KeySignature, Rational, Step};

const SHARP_ORDER: [Step; 7] = [
    Step::F,
    Step::C,
    Step::G,
    Step::D,
    Step::A,
    Step::E,
    Step::B,
];
const FLAT_ORDER: [Step; 7] = [
    Step::B,
    Step::E,
    Step::A,
    Step::D,
    Step::G,
    Step::C,
    Step::F,
];

pub struct AlterationCalculator {
    memory: [[Accidental; 7]; 10],
    key: KeySignature,
}

impl Default for AlterationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl AlterationCalculator {
    pub fn new() -> Self {
        Self {
            memory: [[Accidental::Natural; 7]; 10],
            key: KeySignature::default(),
        }
    }

    pub fn set_key(&mut self, key: KeySignature) {
        self.key = key;
    }

    pub fn calculate(&mut self, measure: &mut Measure) {
        self.reset_memory();
        for (_, path) in chronological(measure) {
            let (voice, partial_measure, partial_voice, index) = path;
            let sign =
                &mut measure.voices[voice].partial_measures[partial_measure].voices[partial_voice]
                    .signs[index];
            match sign {
                Sign::Note(note) => {
                    note.pitch.alter = self.alter(&note.pitch);
                }
                Sign::Chord(chord) => {
                    chord.base.pitch.alter = self.alter(&chord.base.pitch);
                    for interval in &mut chord.intervals {
                        interval.pitch.alter = self.alter(&interval.pitch);
                    }
                }
                Sign::MovingNote(moving) => {
                    moving.base.pitch.alter = self.alter(&moving.base.pitch);
                    for interval in &mut moving.intervals {
                        interval.pitch.alter = self.alter(&interval.pitch);
                    }
                }
                _ => {}
            }
        }
    }

    /// Seed the memory with the key signature.
    ///
    /// Sharps accumulate in the order F C G D A E B; counts past seven turn
    /// the earlier entries into double sharps.  Flats mirror this with
    /// B E A D G C F and double flats.
    fn reset_memory(&mut self) {
        self.memory = [[Accidental::Natural; 7]; 10];
        let fifths = self.key.fifths;
        for octave in 0..10 {
            if fifths > 0 {
                for index in 0..fifths.clamp(0, 14) as usize {
                    let step = SHARP_ORDER[index % 7];
                    self.memory[octave][step.rank() as usize] = if index < 7 {
                        Accidental::Sharp
                    } else {
                        Accidental::DoubleSharp
                    };
                }
            } else {
                for index in 0..(-fifths).clamp(0, 14) as usize {
                    let step = FLAT_ORDER[index % 7];
                    self.memory[octave][step.rank() as usize] = if index < 7 {
                        Accidental::Flat
                    } else {
                        Accidental::DoubleFlat
                    };
                }
            }
        }
    }

    fn alter(&mut self, pitch: &Pitch) -> i8 {
        let octave = (pitch.octave as usize).min(9);
        let slot = &mut self.memory[octave][pitch.step.rank() as usize];
        if let Some(accidental) = pitch.accidental {
            *slot = accidental;
        }
        slot.alter()
    }
}

type SignPath = (usize, usize, usize, usize);

/// Stable onset-sorted list of every sign in the measure.
fn chronological(measure: &Measure) -> Vec<(Rational, SignPath)> {
    let mut order = Vec::new();
    for (voice_index, voice) in measure.voices.iter().enumerate() {
        let mut voice_position = Rational::zero();
        for (pm_index, partial_measure) in voice.partial_measures.iter().enumerate() {
            for (pv_index, partial_voice) in partial_measure.voices.iter().enumerate() {
                let mut position = voice_position;
                for (sign_index, sign) in partial_voice.signs.iter().enumerate() {
                    order.push((position, (voice_index, pm_index, pv_index, sign_index)));
                    position += sign.duration();
                }
            }
            voice_position += partial_measure.duration();
        }
    }
    order.sort_by(|a, b| a.0.cmp(&b.0));
    order
}
