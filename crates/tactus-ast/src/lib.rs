pub mod score;
pub mod sign;
pub mod unfolded;

pub use score::{
    KeyAndTimeSignature, Measure, MeasureRange, Paragraph, ParagraphElement, Part, PartialMeasure,
    PartialVoice, Score, Section, Voice,
};
pub use sign::{
    AmbiguousValue, Barline, BarlineKind, Chord, Clef, ClefSign, Hand, HandSign, Hyphen, Interval,
    MovingNote, Note, NotegroupMember, Pitch, Rest, Rhythm, Sign, Simile, Slur, SlurKind, Tie,
    TieKind, TupletStart, ValueDistinction, ValueDistinctionKind,
};
