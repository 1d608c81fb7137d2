//! Simile expansion.
//!
//! Builds the parallel unfolded representation of the score in which every
//! simile is replaced by the material it stands for.  A full-measure simile
//! becomes literal copies of the previous measure; a partial-measure simile
//! splices in the signs accumulated since the start of its partial voice.
//! The original parts are left untouched.

use log::trace;
use tactus_ast::unfolded;
use tactus_ast::{
    Measure, ParagraphElement, Part, PartialVoice, Score, Sign, Simile,
};

/// Fill `score.unfolded_parts` from the resolved parts.
pub fn unfold(score: &mut Score) {
    score.unfolded_parts = score.parts.iter().map(unfold_part).collect();
}

fn unfold_part(part: &Part) -> unfolded::Part {
    let staff_count = part
        .iter()
        .map(|section| section.paragraphs.len())
        .max()
        .unwrap_or(0);

    (0..staff_count)
        .map(|staff_index| {
            let mut staff = unfolded::Staff::default();
            let mut prev_measure: Option<unfolded::Measure> = None;
            for section in part {
                let Some(paragraph) = section.paragraphs.get(staff_index) else {
                    continue;
                };
                for element in &paragraph.elements {
                    match element {
                        ParagraphElement::KeyAndTime(signature) => {
                            staff
                                .elements
                                .push(unfolded::StaffElement::KeyAndTime(*signature));
                        }
                        ParagraphElement::Measure(measure) => {
                            if let Some(simile) = full_measure_simile(measure) {
                                if let Some(prev) = &prev_measure {
                                    trace!(
                                        "expanding full-measure simile into {} copies",
                                        simile.count.max(1)
                                    );
                                    for _ in 0..simile.count.max(1) {
                                        staff
                                            .elements
                                            .push(unfolded::StaffElement::Measure(prev.clone()));
                                    }
                                }
                            } else {
                                let expanded = unfold_measure(measure);
                                prev_measure = Some(expanded.clone());
                                staff
                                    .elements
                                    .push(unfolded::StaffElement::Measure(expanded));
                            }
                        }
                    }
                }
            }
            staff
        })
        .collect()
}

/// A measure whose entire content is one simile sign.
fn full_measure_simile(measure: &Measure) -> Option<&Simile> {
    if measure.voices.len() != 1 {
        return None;
    }
    let voice = &measure.voices[0];
    if voice.partial_measures.len() != 1 || voice.partial_measures[0].voices.len() != 1 {
        return None;
    }
    match voice.partial_measures[0].voices[0].signs.as_slice() {
        [Sign::Simile(simile)] => Some(simile),
        _ => None,
    }
}

fn unfold_measure(measure: &Measure) -> unfolded::Measure {
    unfolded::Measure {
        id: measure.id,
        ending: measure.ending,
        voices: measure
            .voices
            .iter()
            .map(|voice| unfolded::Voice {
                id: voice.id,
                partial_measures: voice
                    .partial_measures
                    .iter()
                    .map(|partial_measure| unfolded::PartialMeasure {
                        id: partial_measure.id,
                        voices: partial_measure
                            .voices
                            .iter()
                            .map(unfold_partial_voice)
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn unfold_partial_voice(partial_voice: &PartialVoice) -> unfolded::PartialVoice {
    let mut signs: Vec<unfolded::Sign> = Vec::new();
    for sign in &partial_voice.signs {
        match sign {
            Sign::ValueDistinction(_) => {}
            Sign::Simile(simile) => {
                let repeated = signs.clone();
                for _ in 0..simile.count.max(1) {
                    signs.extend(repeated.iter().cloned());
                }
            }
            other => {
                if let Some(converted) = convert(other) {
                    signs.push(converted);
                }
            }
        }
    }
    unfolded::PartialVoice {
        id: partial_voice.id,
        signs,
    }
}

fn convert(sign: &Sign) -> Option<unfolded::Sign> {
    match sign {
        Sign::Note(note) => Some(unfolded::Sign::Note(note.clone())),
        Sign::Rest(rest) => Some(unfolded::Sign::Rest(rest.clone())),
        Sign::Chord(chord) => Some(unfolded::Sign::Chord(chord.clone())),
        Sign::MovingNote(moving) => Some(unfolded::Sign::MovingNote(moving.clone())),
        Sign::Hyphen(hyphen) => Some(unfolded::Sign::Hyphen(*hyphen)),
        Sign::Tie(tie) => Some(unfolded::Sign::Tie(*tie)),
        Sign::TupletStart(tuplet) => Some(unfolded::Sign::TupletStart(*tuplet)),
        Sign::HandSign(hand) => Some(unfolded::Sign::HandSign(*hand)),
        Sign::Clef(clef) => Some(unfolded::Sign::Clef(*clef)),
        Sign::Barline(barline) => Some(unfolded::Sign::Barline(*barline)),
        Sign::ValueDistinction(_) | Sign::Simile(_) => None,
    }
}
