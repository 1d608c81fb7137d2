//! The unfolded score representation.
//!
//! Mirrors the ambiguous tree but with every simile replaced by the literal
//! material it stands for; value distinctions have served their purpose
//! during disambiguation and are dropped as well.  The unfolder adds this
//! representation next to the original parts without touching them.

use num_traits::Zero;
use tactus_core::NodeId;
use tactus_music::Rational;

use crate::score::KeyAndTimeSignature;
use crate::sign::{
    Barline, Chord, Clef, HandSign, Hyphen, MovingNote, Note, Rest, Tie, TupletStart,
};

/// A sign of the unfolded tree: no similes, no value distinctions.
#[derive(Clone, Debug, PartialEq)]
pub enum Sign {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    MovingNote(MovingNote),
    Hyphen(Hyphen),
    Tie(Tie),
    TupletStart(TupletStart),
    HandSign(HandSign),
    Clef(Clef),
    Barline(Barline),
}

impl Sign {
    pub fn duration(&self) -> Rational {
        match self {
            Sign::Note(note) => note.rhythm.as_rational(),
            Sign::Rest(rest) => rest.rhythm.as_rational(),
            Sign::Chord(chord) => chord.base.rhythm.as_rational(),
            Sign::MovingNote(moving) => moving.base.rhythm.as_rational(),
            _ => Rational::zero(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct PartialVoice {
    pub id: NodeId,
    pub signs: Vec<Sign>,
}

impl PartialVoice {
    pub fn duration(&self) -> Rational {
        self.signs.iter().map(Sign::duration).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct PartialMeasure {
    pub id: NodeId,
    pub voices: Vec<PartialVoice>,
}

impl PartialMeasure {
    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(PartialVoice::duration)
            .unwrap_or_else(Rational::zero)
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Voice {
    pub id: NodeId,
    pub partial_measures: Vec<PartialMeasure>,
}

impl Voice {
    pub fn duration(&self) -> Rational {
        self.partial_measures
            .iter()
            .map(PartialMeasure::duration)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Measure {
    pub id: NodeId,
    pub ending: Option<u32>,
    pub voices: Vec<Voice>,
}

impl Measure {
    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(Voice::duration)
            .unwrap_or_else(Rational::zero)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StaffElement {
    Measure(Measure),
    KeyAndTime(KeyAndTimeSignature),
}

impl StaffElement {
    pub fn duration(&self) -> Rational {
        match self {
            StaffElement::Measure(measure) => measure.duration(),
            StaffElement::KeyAndTime(_) => Rational::zero(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Staff {
    pub elements: Vec<StaffElement>,
}

impl Staff {
    pub fn duration(&self) -> Rational {
        self.elements.iter().map(StaffElement::duration).sum()
    }
}

pub type Part = Vec<Staff>;
