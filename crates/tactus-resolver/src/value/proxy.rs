//! Value proxies: candidate interpretations of single signs.

use smallvec::SmallVec;
use tactus_ast::{AmbiguousValue, NotegroupMember, Sign};
use tactus_music::{augmentation_dots_factor, Rational};

/// The two duration families of braille music.
///
/// `Large` spans whole to eighth values, `Small` 16th to 128th.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Large,
    Small,
}

impl ValueCategory {
    fn base(self) -> usize {
        match self {
            ValueCategory::Large => 0,
            ValueCategory::Small => 4,
        }
    }
}

/// Undotted values, indexed by `category.base() + ambiguous_value.index()`.
const UNDOTTED: [Rational; 8] = [
    Rational::new_raw(1, 1),
    Rational::new_raw(1, 2),
    Rational::new_raw(1, 4),
    Rational::new_raw(1, 8),
    Rational::new_raw(1, 16),
    Rational::new_raw(1, 32),
    Rational::new_raw(1, 64),
    Rational::new_raw(1, 128),
];

/// What kind of sign a proxy stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyKind {
    /// Note, rest, chord or moving note with a chosen value family.
    Rhythmic,
    /// A rest assigned the full duration of the measure.
    WholeMeasureRest,
    /// A simile standing for repeated material.
    Simile,
}

/// A possible interpretation of one sign.
///
/// Proxies are plain data: they reference the proxied sign by its index
/// within the partial voice and remember everything needed to write the
/// interpretation back.  The search allocates them in bulk on candidate
/// stacks; only the proxies of the single winning interpretation ever call
/// [`ValueProxy::accept`].
#[derive(Clone, Debug)]
pub struct ValueProxy {
    sign_index: usize,
    kind: ProxyKind,
    value: AmbiguousValue,
    category: ValueCategory,
    /// Cached full duration: undotted value times dots factor times tuplet
    /// factor (or the literal duration for whole-measure rests and similes).
    pub duration: Rational,
    tuplet_factor: Rational,
    beam: NotegroupMember,
    tuplet_begin: SmallVec<[Rational; 2]>,
    tuplet_end: u32,
}

impl ValueProxy {
    /// Proxy for a rhythmic sign interpreted in `category` as `value`.
    ///
    /// Returns `None` for non-rhythmic signs and for signs whose ambiguous
    /// value the parser failed to record.
    pub fn rhythmic(
        sign: &Sign,
        sign_index: usize,
        category: ValueCategory,
        value: AmbiguousValue,
        tuplet_factor: Rational,
    ) -> Option<Self> {
        if !sign.is_rhythmic() || value == AmbiguousValue::Unknown {
            return None;
        }
        let undotted = UNDOTTED[category.base() + value.index()];
        let duration = undotted * augmentation_dots_factor(sign.dots()) * tuplet_factor;
        Some(Self {
            sign_index,
            kind: ProxyKind::Rhythmic,
            value,
            category,
            duration,
            tuplet_factor,
            beam: NotegroupMember::None,
            tuplet_begin: SmallVec::new(),
            tuplet_end: 0,
        })
    }

    /// Proxy assigning a rest the duration of the whole measure.
    pub fn whole_measure_rest(sign_index: usize, duration: Rational) -> Self {
        Self {
            sign_index,
            kind: ProxyKind::WholeMeasureRest,
            value: AmbiguousValue::WholeOr16th,
            category: ValueCategory::Large,
            duration,
            tuplet_factor: Rational::new_raw(1, 1),
            beam: NotegroupMember::None,
            tuplet_begin: SmallVec::new(),
            tuplet_end: 0,
        }
    }

    /// Proxy for a simile repeating `repeated` `count` times.
    pub fn simile(sign_index: usize, repeated: Rational, count: u32) -> Self {
        Self {
            sign_index,
            kind: ProxyKind::Simile,
            value: AmbiguousValue::Unknown,
            category: ValueCategory::Large,
            duration: repeated * Rational::from_integer(count.max(1) as i64),
            tuplet_factor: Rational::new_raw(1, 1),
            beam: NotegroupMember::None,
            tuplet_begin: SmallVec::new(),
            tuplet_end: 0,
        }
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    fn undotted_duration(&self) -> Rational {
        UNDOTTED[self.category.base() + self.value.index()]
    }

    pub fn set_tuplet_info(&mut self, tuplet_begin: &[Rational], tuplet_end: u32) {
        self.tuplet_begin = SmallVec::from_slice(tuplet_begin);
        self.tuplet_end = tuplet_end;
    }

    pub fn make_beam_begin(&mut self) {
        self.beam = NotegroupMember::Begin;
    }

    pub fn make_beam_continue(&mut self) {
        self.beam = NotegroupMember::Middle;
    }

    pub fn make_beam_end(&mut self) {
        self.beam = NotegroupMember::End;
    }

    /// Write this interpretation into the sign it proxies.
    pub fn accept(&self, signs: &mut [Sign]) {
        match self.kind {
            ProxyKind::Rhythmic => {
                if let Some(rhythm) = signs[self.sign_index].rhythm_mut() {
                    rhythm.resolved_type = self.undotted_duration();
                    if self.beam != NotegroupMember::None {
                        rhythm.notegroup_member = self.beam;
                    }
                    rhythm.factor = self.tuplet_factor;
                    rhythm.tuplet_begin = self.tuplet_begin.to_vec();
                    rhythm.tuplet_end = self.tuplet_end;
                }
            }
            ProxyKind::WholeMeasureRest => {
                if let Sign::Rest(rest) = &mut signs[self.sign_index] {
                    rest.rhythm.resolved_type = self.duration;
                    rest.whole_measure = true;
                }
            }
            ProxyKind::Simile => {
                if let Sign::Simile(simile) = &mut signs[self.sign_index] {
                    simile.duration = self.duration;
                }
            }
        }
    }
}
