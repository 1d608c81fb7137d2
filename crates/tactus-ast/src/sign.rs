//! Signs of the ambiguous score tree.
//!
//! Every braille rhythmic sign encodes a pair of possible note values; the
//! parser records the pair as an [`AmbiguousValue`] and leaves the resolved
//! fields of [`Rhythm`] and [`Pitch`] zeroed.  Value disambiguation, octave
//! calculation and alteration calculation fill them in place.

use num_traits::{One, Zero};
use tactus_core::NodeId;
use tactus_music::{
    augmentation_dots_factor, Accidental, Articulation, Fingering, Rational, Step,
};

/// The value class of a rhythmic sign before its family is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AmbiguousValue {
    WholeOr16th,
    HalfOr32nd,
    QuarterOr64th,
    EighthOr128th,
    #[default]
    Unknown,
}

impl AmbiguousValue {
    /// Rank 0..3 within a duration family.
    pub fn index(self) -> usize {
        match self {
            AmbiguousValue::WholeOr16th => 0,
            AmbiguousValue::HalfOr32nd => 1,
            AmbiguousValue::QuarterOr64th => 2,
            AmbiguousValue::EighthOr128th => 3,
            AmbiguousValue::Unknown => panic!("unknown ambiguous value has no rank"),
        }
    }
}

/// Role of a sign within a note group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NotegroupMember {
    #[default]
    None,
    Begin,
    Middle,
    End,
}

/// Rhythmic storage shared by notes, rests, chords and moving notes.
///
/// `resolved_type` is the undotted value and stays zero until value
/// disambiguation accepts an interpretation; `factor` is the product of the
/// tuplet ratios in effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Rhythm {
    pub ambiguous_value: AmbiguousValue,
    pub dots: u32,
    pub resolved_type: Rational,
    pub factor: Rational,
    pub notegroup_member: NotegroupMember,
    pub tuplet_begin: Vec<Rational>,
    pub tuplet_end: u32,
}

impl Default for Rhythm {
    fn default() -> Self {
        Self {
            ambiguous_value: AmbiguousValue::Unknown,
            dots: 0,
            resolved_type: Rational::zero(),
            factor: Rational::one(),
            notegroup_member: NotegroupMember::None,
            tuplet_begin: Vec::new(),
            tuplet_end: 0,
        }
    }
}

impl Rhythm {
    pub fn new(ambiguous_value: AmbiguousValue, dots: u32) -> Self {
        Self {
            ambiguous_value,
            dots,
            ..Self::default()
        }
    }

    /// Full duration of the resolved sign.
    pub fn as_rational(&self) -> Rational {
        self.resolved_type * augmentation_dots_factor(self.dots) * self.factor
    }
}

/// Pitch storage shared by notes and chord intervals.
///
/// `octave` and `alter` are filled by the octave and alteration passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pitch {
    pub accidental: Option<Accidental>,
    pub octave_spec: Option<u8>,
    pub octave: u8,
    pub step: Step,
    pub alter: i8,
    pub tie: Option<TieKind>,
}

impl Pitch {
    pub fn new(step: Step) -> Self {
        Self {
            accidental: None,
            octave_spec: None,
            octave: 0,
            step,
            alter: 0,
            tie: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlurKind {
    Single,
    CrossStaff,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slur {
    pub kind: SlurKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TieKind {
    Single,
    Chord,
    Arpeggio,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: NodeId,
    pub rhythm: Rhythm,
    pub pitch: Pitch,
    pub articulations: Vec<Articulation>,
    pub slurs: Vec<Slur>,
    pub fingers: Vec<Fingering>,
}

impl Note {
    pub fn new(id: NodeId, ambiguous_value: AmbiguousValue, step: Step) -> Self {
        Self {
            id,
            rhythm: Rhythm::new(ambiguous_value, 0),
            pitch: Pitch::new(step),
            articulations: Vec::new(),
            slurs: Vec::new(),
            fingers: Vec::new(),
        }
    }

    pub fn is_grace(&self) -> bool {
        self.articulations.iter().any(|a| a.is_grace())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rest {
    pub id: NodeId,
    pub rhythm: Rhythm,
    /// Rest inserted by the transcriber rather than the composer.
    pub by_transcriber: bool,
    /// Set by value disambiguation when the rest fills the whole measure.
    pub whole_measure: bool,
}

impl Rest {
    pub fn new(id: NodeId, ambiguous_value: AmbiguousValue) -> Self {
        Self {
            id,
            rhythm: Rhythm::new(ambiguous_value, 0),
            by_transcriber: false,
            whole_measure: false,
        }
    }
}

/// One interval of a chord or moving-note sign.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub id: NodeId,
    pub pitch: Pitch,
    pub steps: tactus_music::Interval,
    pub fingers: Vec<Fingering>,
}

impl Interval {
    pub fn new(id: NodeId, steps: tactus_music::Interval) -> Self {
        Self {
            id,
            pitch: Pitch::new(Step::C),
            steps,
            fingers: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chord {
    pub id: NodeId,
    pub base: Note,
    pub intervals: Vec<Interval>,
    pub all_tied: bool,
}

/// A chord-like sign whose intervals sound one after another within the
/// duration of the base note.
#[derive(Clone, Debug, PartialEq)]
pub struct MovingNote {
    pub id: NodeId,
    pub base: Note,
    pub intervals: Vec<Interval>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDistinctionKind {
    Distinct,
    LargeFollows,
    SmallFollows,
}

/// Explicit hint from the transcriber forcing upcoming values into one
/// duration family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueDistinction {
    pub id: NodeId,
    pub kind: ValueDistinctionKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hyphen {
    pub id: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tie {
    pub id: NodeId,
    pub kind: TieKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Right,
    Left,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandSign {
    pub id: NodeId,
    pub hand: Hand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClefSign {
    G,
    C,
    F,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clef {
    pub id: NodeId,
    pub sign: ClefSign,
    pub line: Option<u8>,
    pub staff: Option<u8>,
}

impl Clef {
    pub fn new(id: NodeId, sign: ClefSign) -> Self {
        Self {
            id,
            sign,
            line: None,
            staff: None,
        }
    }

    pub fn line(&self) -> u8 {
        self.line.unwrap_or(match self.sign {
            ClefSign::G => 2,
            ClefSign::C => 3,
            ClefSign::F => 4,
        })
    }
}

/// Repeat sign standing for earlier material.
#[derive(Clone, Debug, PartialEq)]
pub struct Simile {
    pub id: NodeId,
    pub octave_spec: Option<u8>,
    pub count: u32,
    /// Filled by value disambiguation.
    pub duration: Rational,
}

impl Simile {
    pub fn new(id: NodeId, count: u32) -> Self {
        Self {
            id,
            octave_spec: None,
            count,
            duration: Rational::zero(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarlineKind {
    BeginRepeat,
    EndRepeat,
    EndPart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barline {
    pub id: NodeId,
    pub kind: BarlineKind,
}

/// Start of a tuplet span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TupletStart {
    pub id: NodeId,
    number: u32,
    simple_triplet: bool,
    doubled: bool,
}

impl TupletStart {
    pub fn new(id: NodeId, number: u32, doubled: bool) -> Self {
        Self {
            id,
            number,
            simple_triplet: false,
            doubled,
        }
    }

    /// The abbreviated one-cell triplet sign.
    pub fn simple_triplet(id: NodeId, doubled: bool) -> Self {
        Self {
            id,
            number: 3,
            simple_triplet: true,
            doubled,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn is_simple_triplet(&self) -> bool {
        self.simple_triplet
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }
}

/// Any sign that can occur inside a partial voice.
#[derive(Clone, Debug, PartialEq)]
pub enum Sign {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    MovingNote(MovingNote),
    ValueDistinction(ValueDistinction),
    Hyphen(Hyphen),
    Tie(Tie),
    TupletStart(TupletStart),
    HandSign(HandSign),
    Clef(Clef),
    Simile(Simile),
    Barline(Barline),
}

impl Sign {
    pub fn id(&self) -> NodeId {
        match self {
            Sign::Note(note) => note.id,
            Sign::Rest(rest) => rest.id,
            Sign::Chord(chord) => chord.id,
            Sign::MovingNote(moving) => moving.id,
            Sign::ValueDistinction(distinction) => distinction.id,
            Sign::Hyphen(hyphen) => hyphen.id,
            Sign::Tie(tie) => tie.id,
            Sign::TupletStart(tuplet) => tuplet.id,
            Sign::HandSign(hand) => hand.id,
            Sign::Clef(clef) => clef.id,
            Sign::Simile(simile) => simile.id,
            Sign::Barline(barline) => barline.id,
        }
    }

    pub fn is_rhythmic(&self) -> bool {
        matches!(
            self,
            Sign::Note(_) | Sign::Rest(_) | Sign::Chord(_) | Sign::MovingNote(_)
        )
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Sign::Rest(_))
    }

    pub fn is_hyphen(&self) -> bool {
        matches!(self, Sign::Hyphen(_))
    }

    pub fn is_simile(&self) -> bool {
        matches!(self, Sign::Simile(_))
    }

    /// Shared rhythmic record of a rhythmic sign.
    pub fn rhythm(&self) -> Option<&Rhythm> {
        match self {
            Sign::Note(note) => Some(&note.rhythm),
            Sign::Rest(rest) => Some(&rest.rhythm),
            Sign::Chord(chord) => Some(&chord.base.rhythm),
            Sign::MovingNote(moving) => Some(&moving.base.rhythm),
            _ => None,
        }
    }

    pub fn rhythm_mut(&mut self) -> Option<&mut Rhythm> {
        match self {
            Sign::Note(note) => Some(&mut note.rhythm),
            Sign::Rest(rest) => Some(&mut rest.rhythm),
            Sign::Chord(chord) => Some(&mut chord.base.rhythm),
            Sign::MovingNote(moving) => Some(&mut moving.base.rhythm),
            _ => None,
        }
    }

    pub fn ambiguous_value(&self) -> AmbiguousValue {
        self.rhythm()
            .map(|r| r.ambiguous_value)
            .unwrap_or(AmbiguousValue::Unknown)
    }

    pub fn dots(&self) -> u32 {
        self.rhythm().map(|r| r.dots).unwrap_or(0)
    }

    /// Grace notes carry no measurable duration of their own.
    pub fn is_grace(&self) -> bool {
        match self {
            Sign::Note(note) => note.is_grace(),
            Sign::Chord(chord) => chord.base.is_grace(),
            Sign::MovingNote(moving) => moving.base.is_grace(),
            _ => false,
        }
    }

    /// Resolved duration of this sign; zero for auxiliary signs and before
    /// value disambiguation.
    pub fn duration(&self) -> Rational {
        match self {
            Sign::Note(_) | Sign::Rest(_) | Sign::Chord(_) | Sign::MovingNote(_) => {
                self.rhythm().map(|r| r.as_rational()).unwrap_or_default()
            }
            Sign::Simile(simile) => simile.duration,
            _ => Rational::zero(),
        }
    }
}
