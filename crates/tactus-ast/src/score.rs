//! Containers from partial voices up to the score.
//!
//! A measure holds simultaneous voices (full-measure in-accord); a voice is
//! a sequence of partial measures; a partial measure holds simultaneous
//! partial voices (partial in-accord).  Post-resolution, all parallel
//! members of a container have equal duration.

use num_traits::Zero;
use tactus_core::NodeId;
use tactus_music::{KeySignature, Rational, TimeSignature};

use crate::sign::Sign;
use crate::unfolded;

/// A horizontal run of signs.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PartialVoice {
    pub id: NodeId,
    pub signs: Vec<Sign>,
}

impl PartialVoice {
    pub fn new(id: NodeId, signs: Vec<Sign>) -> Self {
        Self { id, signs }
    }

    pub fn duration(&self) -> Rational {
        self.signs.iter().map(Sign::duration).sum()
    }
}

/// Simultaneous partial voices within a fragment of a measure.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PartialMeasure {
    pub id: NodeId,
    pub voices: Vec<PartialVoice>,
}

impl PartialMeasure {
    pub fn new(id: NodeId, voices: Vec<PartialVoice>) -> Self {
        Self { id, voices }
    }

    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(PartialVoice::duration)
            .unwrap_or_else(Rational::zero)
    }
}

/// Sequential partial measures forming one voice of a measure.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Voice {
    pub id: NodeId,
    pub partial_measures: Vec<PartialMeasure>,
}

impl Voice {
    pub fn new(id: NodeId, partial_measures: Vec<PartialMeasure>) -> Self {
        Self {
            id,
            partial_measures,
        }
    }

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
    /// Volta number when this measure opens an alternative ending.
    pub ending: Option<u32>,
    pub voices: Vec<Voice>,
}

impl Measure {
    pub fn new(id: NodeId, voices: Vec<Voice>) -> Self {
        Self {
            id,
            ending: None,
            voices,
        }
    }

    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(Voice::duration)
            .unwrap_or_else(Rational::zero)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyAndTimeSignature {
    pub id: NodeId,
    pub key: KeySignature,
    pub time: TimeSignature,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParagraphElement {
    Measure(Measure),
    KeyAndTime(KeyAndTimeSignature),
}

impl ParagraphElement {
    pub fn id(&self) -> NodeId {
        match self {
            ParagraphElement::Measure(measure) => measure.id,
            ParagraphElement::KeyAndTime(signature) => signature.id,
        }
    }

    pub fn duration(&self) -> Rational {
        match self {
            ParagraphElement::Measure(measure) => measure.duration(),
            ParagraphElement::KeyAndTime(_) => Rational::zero(),
        }
    }
}

/// One staff's worth of music within a section.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Paragraph {
    pub id: NodeId,
    pub elements: Vec<ParagraphElement>,
}

impl Paragraph {
    pub fn new(id: NodeId, elements: Vec<ParagraphElement>) -> Self {
        Self { id, elements }
    }

    pub fn duration(&self) -> Rational {
        self.elements.iter().map(ParagraphElement::duration).sum()
    }
}

/// An inclusive range of printed measure numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasureRange {
    pub first: u32,
    pub last: u32,
}

/// A section of a part.  Paragraph index within the section selects the
/// staff: paragraph 0 is the upper staff, paragraph 1 the lower.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Section {
    pub id: NodeId,
    pub number: Option<u32>,
    pub range: Option<MeasureRange>,
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn new(id: NodeId, paragraphs: Vec<Paragraph>) -> Self {
        Self {
            id,
            number: None,
            range: None,
            paragraphs,
        }
    }
}

pub type Part = Vec<Section>;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Score {
    pub key_sig: KeySignature,
    pub time_sigs: Vec<TimeSignature>,
    pub parts: Vec<Part>,
    /// Filled by the unfolder after a successful compile.
    pub unfolded_parts: Vec<unfolded::Part>,
}

impl Score {
    pub fn new(key_sig: KeySignature, time_sig: Option<TimeSignature>, parts: Vec<Part>) -> Self {
        Self {
            key_sig,
            time_sigs: time_sig.into_iter().collect(),
            parts,
            unfolded_parts: Vec::new(),
        }
    }
}
