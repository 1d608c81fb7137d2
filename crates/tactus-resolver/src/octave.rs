//! Octave calculation.
//!
//! Braille music only writes an octave mark where one is needed, much like
//! relative-octave entry in LilyPond.  This pass walks the music in program
//! order and assigns every note a definitive octave: explicit marks win,
//! otherwise the step distance to the previous note decides whether the
//! melody crossed into the next octave.

use tactus_ast::{Interval, Measure, Note, Sign};
use tactus_music::{Step, STEPS_PER_OCTAVE};

use crate::error::CompileError;

/// Direction chord intervals are read in: down from the base on the upper
/// staff, up from the base on the lower staff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntervalDirection {
    #[default]
    Down,
    Up,
}

pub struct OctaveCalculator {
    prev: Option<(Step, i32)>,
    direction: IntervalDirection,
}

impl Default for OctaveCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl OctaveCalculator {
    pub fn new() -> Self {
        Self {
            prev: None,
            direction: IntervalDirection::Down,
        }
    }

    pub fn set_direction(&mut self, direction: IntervalDirection) {
        self.direction = direction;
    }

    pub fn reset(&mut self) {
        self.prev = None;
        self.direction = IntervalDirection::Down;
    }

    pub fn calculate(&mut self, measure: &mut Measure) -> Result<(), CompileError> {
        for voice in &mut measure.voices {
            let sequential_parts = voice.partial_measures.len() > 1;
            for partial_measure in &mut voice.partial_measures {
                let parallel = partial_measure.voices.len() > 1;
                for partial_voice in &mut partial_measure.voices {
                    for sign in &mut partial_voice.signs {
                        self.sign(sign)?;
                    }
                    if parallel {
                        self.prev = None;
                    }
                }
                if sequential_parts {
                    self.prev = None;
                }
            }
        }
        Ok(())
    }

    fn sign(&mut self, sign: &mut Sign) -> Result<(), CompileError> {
        match sign {
            Sign::Note(note) => self.note(note),
            Sign::Chord(chord) => {
                self.note(&mut chord.base)?;
                stack_intervals(self.direction, &chord.base, &mut chord.intervals, true);
                Ok(())
            }
            Sign::MovingNote(moving) => {
                self.note(&mut moving.base)?;
                stack_intervals(self.direction, &moving.base, &mut moving.intervals, false);
                Ok(())
            }
            // The note after a clef must carry its own octave mark.
            Sign::Clef(_) => {
                self.prev = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn note(&mut self, note: &mut Note) -> Result<(), CompileError> {
        let octave = if let Some(spec) = note.pitch.octave_spec {
            spec as i32
        } else if let Some((prev_step, prev_octave)) = self.prev {
            let step = note.pitch.step;
            if (step == Step::C && (prev_step == Step::B || prev_step == Step::A))
                || (step == Step::D && prev_step == Step::B)
            {
                prev_octave + 1
            } else if (step == Step::B && (prev_step == Step::C || prev_step == Step::D))
                || (step == Step::A && prev_step == Step::C)
            {
                prev_octave - 1
            } else {
                prev_octave
            }
        } else {
            return Err(CompileError::MissingOctaveMark { node: note.id });
        };
        note.pitch.octave = octave.clamp(0, 9) as u8;
        self.prev = Some((note.pitch.step, octave));
        Ok(())
    }
}

/// Resolve interval steps and octaves relative to the chord base.
///
/// `cumulative` stacks each interval on the previous one (chords); moving
/// notes measure every interval from the base anew.
fn stack_intervals(
    direction: IntervalDirection,
    base: &Note,
    intervals: &mut [Interval],
    cumulative: bool,
) {
    let mut step = base.pitch.step.rank();
    let mut octave = base.pitch.octave as i32;
    for interval in intervals {
        if !cumulative {
            step = base.pitch.step.rank();
            octave = base.pitch.octave as i32;
        }
        match direction {
            IntervalDirection::Down => step -= interval.steps.steps(),
            IntervalDirection::Up => step += interval.steps.steps(),
        }
        while step > Step::B.rank() {
            octave += 1;
            step -= STEPS_PER_OCTAVE;
        }
        while step < 0 {
            octave -= 1;
            step += STEPS_PER_OCTAVE;
        }
        if let Some(spec) = interval.pitch.octave_spec {
            octave = spec as i32;
        }
        interval.pitch.octave = octave.clamp(0, 9) as u8;
        interval.pitch.step = Step::from_rank(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_ast::{
        AmbiguousValue, Chord, MovingNote, PartialMeasure, PartialVoice, Voice,
    };
    use tactus_core::NodeId;
    use tactus_music::Interval as IntervalSize;

    fn note(id: u32, step: Step, octave_spec: Option<u8>) -> Note {
        let mut note = Note::new(NodeId::new(id), AmbiguousValue::QuarterOr64th, step);
        note.pitch.octave_spec = octave_spec;
        note
    }

    fn measure_of(signs: Vec<Sign>) -> Measure {
        Measure::new(
            NodeId::new(90),
            vec![Voice::new(
                NodeId::new(91),
                vec![PartialMeasure::new(
                    NodeId::new(92),
                    vec![PartialVoice::new(NodeId::new(93), signs)],
                )],
            )],
        )
    }

    fn octaves(measure: &Measure) -> Vec<u8> {
        measure.voices[0].partial_measures[0].voices[0]
            .signs
            .iter()
            .filter_map(|sign| match sign {
                Sign::Note(note) => Some(note.pitch.octave),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_step_distance_rules() {
        // c4 b3 a3 b3 c4 d4 b3: small steps stay close, the B-C boundary
        // moves the octave.
        let mut measure = measure_of(vec![
            Sign::Note(note(0, Step::C, Some(4))),
            Sign::Note(note(1, Step::B, None)),
            Sign::Note(note(2, Step::A, None)),
            Sign::Note(note(3, Step::B, None)),
            Sign::Note(note(4, Step::C, None)),
            Sign::Note(note(5, Step::D, None)),
            Sign::Note(note(6, Step::B, None)),
        ]);
        let mut calculator = OctaveCalculator::new();
        calculator.calculate(&mut measure).unwrap();
        assert_eq!(octaves(&measure), vec![4, 3, 3, 3, 4, 4, 3]);
    }

    #[test]
    fn test_fifth_keeps_octave() {
        let mut measure = measure_of(vec![
            Sign::Note(note(0, Step::C, Some(4))),
            Sign::Note(note(1, Step::G, None)),
        ]);
        let mut calculator = OctaveCalculator::new();
        calculator.calculate(&mut measure).unwrap();
        assert_eq!(octaves(&measure), vec![4, 4]);
    }

    #[test]
    fn test_missing_octave_mark() {
        let mut measure = measure_of(vec![Sign::Note(note(7, Step::E, None))]);
        let mut calculator = OctaveCalculator::new();
        let error = calculator.calculate(&mut measure).unwrap_err();
        assert!(matches!(error, CompileError::MissingOctaveMark { node } if node == NodeId::new(7)));
    }

    #[test]
    fn test_clef_clears_previous_note() {
        let mut measure = measure_of(vec![
            Sign::Note(note(0, Step::C, Some(4))),
            Sign::Clef(tactus_ast::Clef::new(NodeId::new(1), tactus_ast::ClefSign::F)),
            Sign::Note(note(2, Step::D, None)),
        ]);
        let mut calculator = OctaveCalculator::new();
        assert!(calculator.calculate(&mut measure).is_err());
    }

    #[test]
    fn test_chord_intervals_stack_down() {
        let mut chord = Chord {
            id: NodeId::new(0),
            base: note(1, Step::C, Some(5)),
            intervals: vec![
                Interval::new(NodeId::new(2), IntervalSize::Third),
                Interval::new(NodeId::new(3), IntervalSize::Third),
            ],
            all_tied: false,
        };
        chord.base.pitch.octave = 0;
        let mut measure = measure_of(vec![Sign::Chord(chord)]);
        let mut calculator = OctaveCalculator::new();
        calculator.calculate(&mut measure).unwrap();
        match &measure.voices[0].partial_measures[0].voices[0].signs[0] {
            Sign::Chord(chord) => {
                // c5 - 3rd = a4, another 3rd down = f4.
                assert_eq!(chord.intervals[0].pitch.step, Step::A);
                assert_eq!(chord.intervals[0].pitch.octave, 4);
                assert_eq!(chord.intervals[1].pitch.step, Step::F);
                assert_eq!(chord.intervals[1].pitch.octave, 4);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_moving_note_intervals_measure_from_base() {
        let mut moving = MovingNote {
            id: NodeId::new(0),
            base: note(1, Step::G, Some(4)),
            intervals: vec![
                Interval::new(NodeId::new(2), IntervalSize::Second),
                Interval::new(NodeId::new(3), IntervalSize::Second),
            ],
        };
        moving.base.pitch.octave = 0;
        let mut measure = measure_of(vec![Sign::MovingNote(moving)]);
        let mut calculator = OctaveCalculator::new();
        calculator.set_direction(IntervalDirection::Up);
        calculator.calculate(&mut measure).unwrap();
        match &measure.voices[0].partial_measures[0].voices[0].signs[0] {
            Sign::MovingNote(moving) => {
                // Both seconds from g4, not stacked: a4 and a4.
                assert_eq!(moving.intervals[0].pitch.step, Step::A);
                assert_eq!(moving.intervals[1].pitch.step, Step::A);
                assert_eq!(moving.intervals[0].pitch.octave, 4);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parallel_partial_voices_need_fresh_marks() {
        let measure = Measure::new(
            NodeId::new(90),
            vec![Voice::new(
                NodeId::new(91),
                vec![PartialMeasure::new(
                    NodeId::new(92),
                    vec![
                        PartialVoice::new(
                            NodeId::new(93),
                            vec![Sign::Note(note(0, Step::C, Some(4)))],
                        ),
                        PartialVoice::new(
                            NodeId::new(94),
                            vec![Sign::Note(note(1, Step::E, None))],
                        ),
                    ],
                )],
            )],
        );
        let mut measure = measure;
        let mut calculator = OctaveCalculator::new();
        assert!(calculator.calculate(&mut measure).is_err());
    }
}
