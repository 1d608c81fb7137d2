//! Pass orchestration.
//!
//! The compiler walks every part staff by staff and runs value
//! disambiguation, octave calculation and alteration calculation in that
//! order, keeping the per-staff state (time signature, anacrusis, octave
//! memory) where it belongs.  The first error is handed to the caller's
//! report callback and compilation stops; on success the unfolder fills in
//! the parallel unfolded representation.

use tactus_ast::{ParagraphElement, Score};
use tactus_core::{Diagnostics, NodeId};
use tactus_music::TimeSignature;

use crate::alteration::AlterationCalculator;
use crate::error::CompileError;
use crate::octave::{IntervalDirection, OctaveCalculator};
use crate::unfold::unfold;
use crate::value::ValueDisambiguator;

pub struct Compiler<F> {
    report_error: F,
    global_time_signature: TimeSignature,
}

impl<F: FnMut(NodeId, &str)> Compiler<F> {
    pub fn new(report_error: F) -> Self {
        Self::with_time_signature(report_error, TimeSignature::default())
    }

    /// A compiler whose fallback time signature differs from common time;
    /// a time signature in the score still wins.
    pub fn with_time_signature(report_error: F, time_signature: TimeSignature) -> Self {
        Self {
            report_error,
            global_time_signature: time_signature,
        }
    }

    /// Resolve the whole score in place.
    ///
    /// Returns true iff every staff disambiguated cleanly; the unfolded
    /// representation is filled in on success.  On failure the first
    /// diagnostic has been reported through the callback.
    pub fn compile(&mut self, score: &mut Score) -> bool {
        match self.run(score) {
            Ok(()) => {
                unfold(score);
                true
            }
            Err(error) => {
                (self.report_error)(error.node(), &error.to_string());
                false
            }
        }
    }

    fn run(&mut self, score: &mut Score) -> Result<(), CompileError> {
        if let Some(time) = score.time_sigs.first() {
            self.global_time_signature = *time;
        }
        let key = score.key_sig;

        let mut octaves = OctaveCalculator::new();
        let mut alterations = AlterationCalculator::new();
        for part in &mut score.parts {
            let staff_count = part
                .iter()
                .map(|section| section.paragraphs.len())
                .max()
                .unwrap_or(0);
            for staff_index in 0..staff_count {
                let direction = match staff_index {
                    0 => IntervalDirection::Down,
                    1 => IntervalDirection::Up,
                    _ => {
                        let node = part
                            .iter()
                            .find(|section| section.paragraphs.len() > staff_index)
                            .map(|section| section.id)
                            .unwrap_or_default();
                        return Err(CompileError::TooManyStaves { node });
                    }
                };

                // Staff n is the concatenation of paragraph n of every
                // section of the part.
                let mut elements: Vec<&mut ParagraphElement> = part
                    .iter_mut()
                    .filter_map(|section| section.paragraphs.get_mut(staff_index))
                    .flat_map(|paragraph| paragraph.elements.iter_mut())
                    .collect();

                let mut values = ValueDisambiguator::new(self.global_time_signature);
                values.run(&mut elements)?;

                octaves.set_direction(direction);
                alterations.set_key(key);
                for element in elements {
                    if let ParagraphElement::Measure(measure) = element {
                        octaves.calculate(measure)?;
                        alterations.calculate(measure);
                    }
                }
                octaves.reset();
            }
        }
        Ok(())
    }
}

/// Resolve `score` in place, reporting the first error through the
/// callback.
pub fn compile(score: &mut Score, report_error: impl FnMut(NodeId, &str)) -> bool {
    Compiler::new(report_error).compile(score)
}

/// Convenience wrapper collecting errors into a [`Diagnostics`].
pub fn compile_to_diagnostics(score: &mut Score) -> (bool, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let ok = {
        let mut compiler = Compiler::new(|node, message: &str| {
            diagnostics.error(message, node);
        });
        compiler.compile(score)
    };
    (ok, diagnostics)
}
