//! Tuplet bookkeeping during the interpretation search.

use smallvec::SmallVec;
use tactus_ast::Sign;
use tactus_music::Rational;

/// A doubled tuplet whose ratio persists across the bar line until an
/// explicit same-number terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoubledTuplet {
    pub number: u32,
    pub factor: Rational,
}

/// Doubled tuplets active at the end of one partial voice.
pub type PartialVoiceDoubledTuplets = Vec<DoubledTuplet>;
/// Per partial voice of a partial measure.
pub type PartialMeasureDoubledTuplets = Vec<PartialVoiceDoubledTuplets>;
/// Per voice of a measure.
pub type MeasureDoubledTuplets = Vec<PartialMeasureDoubledTuplets>;

/// One level of the active tuplet stack.
#[derive(Clone, Debug)]
pub struct TupletLevel {
    pub number: u32,
    pub factor: Rational,
    /// The next proxied sign under this level records a tuplet begin.
    pub first_tuplet: bool,
    /// Rhythmic signs left under this level.
    pub ttl: u32,
    pub doubled: bool,
}

impl Default for TupletLevel {
    fn default() -> Self {
        Self {
            number: 1,
            factor: Rational::new_raw(1, 1),
            first_tuplet: true,
            ttl: 0,
            doubled: false,
        }
    }
}

pub type TupletState = SmallVec<[TupletLevel; 2]>;

/// Per-sign view of the tuplet stack.
#[derive(Clone, Debug)]
pub struct ActiveTuplet {
    pub factor: Rational,
    pub tuplet_begin: SmallVec<[Rational; 2]>,
    pub tuplet_end: u32,
    /// After the sign the position must be dyadic again (no level remains
    /// open past it).
    pub dyadic_next_position: bool,
}

/// Consume one rhythmic sign from every active tuplet level.
///
/// Returns the factor and begin/end markers the sign should carry.  An
/// exhausted innermost level is popped unless it is doubled.
pub fn process_tuplet_state(state: &mut TupletState) -> ActiveTuplet {
    let mut active = ActiveTuplet {
        factor: Rational::new_raw(1, 1),
        tuplet_begin: SmallVec::new(),
        tuplet_end: 0,
        dyadic_next_position: true,
    };

    for level in state.iter_mut() {
        if level.ttl > 0 {
            if level.first_tuplet {
                active.tuplet_begin.push(level.factor);
                level.first_tuplet = false;
            }
            if level.ttl == 1 {
                active.tuplet_end += 1;
            } else {
                active.dyadic_next_position = false;
            }
            active.factor *= level.factor;
            level.ttl -= 1;
        }
    }

    if let Some(last) = state.last() {
        if last.ttl == 0 && !last.doubled {
            state.pop();
        }
    }

    active
}

/// Doubled tuplets still on the stack, for cross-measure carry-over.
pub fn extract_doubled(state: &TupletState) -> PartialVoiceDoubledTuplets {
    state
        .iter()
        .filter(|level| level.doubled)
        .map(|level| DoubledTuplet {
            number: level.number,
            factor: level.factor,
        })
        .collect()
}

/// Allowable ratios per tuplet number.
pub fn tuplet_ratios(number: u32) -> &'static [Rational] {
    const R2: [Rational; 1] = [Rational::new_raw(3, 2)];
    const R3: [Rational; 1] = [Rational::new_raw(2, 3)];
    const R4: [Rational; 1] = [Rational::new_raw(3, 4)];
    const R5: [Rational; 2] = [Rational::new_raw(2, 5), Rational::new_raw(4, 5)];
    const R6: [Rational; 1] = [Rational::new_raw(2, 3)];
    const R7: [Rational; 2] = [Rational::new_raw(4, 7), Rational::new_raw(8, 7)];
    match number {
        2 => &R2,
        3 => &R3,
        4 => &R4,
        5 => &R5,
        6 => &R6,
        7 => &R7,
        _ => &[],
    }
}

pub fn count_rhythmic(signs: &[Sign]) -> u32 {
    signs.iter().filter(|sign| sign.is_rhythmic()).count() as u32
}

/// Index one past the span of a tuplet starting before `from`.
///
/// The span ends at a simile, at a simple triplet sign when the tuplet is a
/// simple triplet itself, or at any same-number tuplet start (same-number
/// tuplets never nest).
pub fn tuplet_end_index(signs: &[Sign], from: usize, in_number: u32, in_simple: bool) -> usize {
    let mut index = from;
    while index < signs.len() {
        match &signs[index] {
            Sign::Simile(_) => break,
            Sign::TupletStart(tuplet) => {
                if in_simple && tuplet.is_simple_triplet() {
                    break;
                }
                if !in_simple && in_number == tuplet.number() {
                    break;
                }
            }
            _ => {}
        }
        index += 1;
    }
    index
}
