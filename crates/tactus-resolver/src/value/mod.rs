//! Value disambiguation.
//!
//! Six-dot braille overloads every rhythmic sign with two meanings: the cell
//! of a whole note doubles as a 16th, a half as a 32nd, a quarter as a 64th
//! and an eighth as a 128th.  This pass enumerates every reading of each
//! measure consistent with the time signature, scores the candidates, and
//! writes the single surviving interpretation back into the tree.

mod interpreter;
mod measure;
mod proxy;
mod tuplet;

pub use proxy::{ProxyKind, ValueCategory, ValueProxy};
pub use tuplet::{DoubledTuplet, MeasureDoubledTuplets};

use log::debug;
use num_traits::Zero;
use tactus_ast::{Measure, ParagraphElement};
use tactus_music::{Rational, TimeSignature};

use crate::error::CompileError;
use measure::MeasureInterpretations;

fn as_measure_mut(element: &mut ParagraphElement) -> &mut Measure {
    match element {
        ParagraphElement::Measure(measure) => measure,
        ParagraphElement::KeyAndTime(_) => {
            unreachable!("value disambiguation only visits measures")
        }
    }
}

/// Per-staff value disambiguation with cross-measure state.
///
/// Carries the previous measure's duration (for full-measure similes), the
/// doubled tuplets still open across the bar line, and a pending anacrusis
/// waiting for its closing partial measure.
pub struct ValueDisambiguator {
    time_signature: TimeSignature,
    prev_duration: Rational,
    prev_doubled_tuplets: MeasureDoubledTuplets,
    anacrusis: Option<(usize, MeasureInterpretations)>,
}

impl ValueDisambiguator {
    pub fn new(time_signature: TimeSignature) -> Self {
        Self {
            time_signature,
            prev_duration: Rational::zero(),
            prev_doubled_tuplets: MeasureDoubledTuplets::new(),
            anacrusis: None,
        }
    }

    /// Disambiguate one staff, elements in source order.
    pub fn run(&mut self, elements: &mut [&mut ParagraphElement]) -> Result<(), CompileError> {
        for index in 0..elements.len() {
            match &*elements[index] {
                ParagraphElement::KeyAndTime(signature) => {
                    self.time_signature = signature.time;
                }
                ParagraphElement::Measure(_) => self.measure(elements, index)?,
            }
        }
        self.end_of_staff(elements)
    }

    fn measure(
        &mut self,
        elements: &mut [&mut ParagraphElement],
        index: usize,
    ) -> Result<(), CompileError> {
        let measure_id = elements[index].id();
        let mut interpretations = {
            let measure = match &*elements[index] {
                ParagraphElement::Measure(measure) => measure,
                ParagraphElement::KeyAndTime(_) => unreachable!(),
            };
            MeasureInterpretations::new(
                measure,
                self.time_signature,
                self.prev_duration,
                &self.prev_doubled_tuplets,
            )
        };
        debug!(
            "measure {:?}: {} interpretation(s), complete: {}",
            measure_id,
            interpretations.len(),
            interpretations.contains_complete_measure()
        );

        if !interpretations.contains_complete_measure() && !interpretations.is_empty() {
            match self.anacrusis.take() {
                None => {
                    // Possibly an anacrusis; defer until a matching short
                    // measure turns up.
                    debug!("measure {:?}: deferring as anacrusis", measure_id);
                    self.anacrusis = Some((index, interpretations));
                    self.prev_duration = Rational::zero();
                    self.prev_doubled_tuplets.clear();
                    return Ok(());
                }
                Some((pending_index, pending)) => {
                    if pending.completes_uniquely(&interpretations) {
                        let time_signature = self.time_signature.as_rational();
                        for lhs in pending.iter() {
                            for rhs in interpretations.iter() {
                                if lhs.duration() + rhs.duration() == time_signature {
                                    let (left, right) = elements.split_at_mut(index);
                                    lhs.accept(as_measure_mut(&mut *left[pending_index]));
                                    rhs.accept(as_measure_mut(&mut *right[0]));
                                    self.prev_duration = rhs.duration();
                                    self.prev_doubled_tuplets = rhs.doubled_tuplets();
                                    return Ok(());
                                }
                            }
                        }
                    }
                    self.anacrusis = Some((pending_index, pending));
                }
            }
        }

        match interpretations.len() {
            1 => {
                if let Some(winner) = interpretations.first() {
                    winner.accept(as_measure_mut(&mut *elements[index]));
                    self.prev_duration = winner.duration();
                    self.prev_doubled_tuplets = winner.doubled_tuplets();
                }
                Ok(())
            }
            0 => Err(CompileError::NoInterpretations { node: measure_id }),
            count => {
                let mut details = String::new();
                for interpretation in interpretations.iter_mut() {
                    let mean = interpretation.harmonic_mean();
                    let score = *mean.numer() as f64 / *mean.denom() as f64;
                    details.push_str(&format!("\n{}: {}", score, interpretation));
                }
                Err(CompileError::AmbiguousInterpretations {
                    node: measure_id,
                    count,
                    details,
                })
            }
        }
    }

    /// Close out a staff: a still-ambiguous pending anacrusis is an error, a
    /// uniquely-read pending one is accepted as written.
    fn end_of_staff(&mut self, elements: &mut [&mut ParagraphElement]) -> Result<(), CompileError> {
        if let Some((pending_index, pending)) = self.anacrusis.take() {
            if pending.len() > 1 {
                return Err(CompileError::UnterminatedAnacrusis {
                    node: pending.measure_id(),
                });
            }
            if let Some(only) = pending.first() {
                only.accept(as_measure_mut(&mut *elements[pending_index]));
            }
        }
        Ok(())
    }
}
