//! Candidate structures above single signs and the measure-level search.
//!
//! Partial-voice interpretations stack into partial measures, those into
//! voices, and voices into measure candidates, each level enforcing the
//! equal-duration constraints.  Candidates stream through nested callbacks;
//! nothing is materialised beyond the stacks of the current combination, and
//! completed levels are shared via `Arc` across the combinations they appear
//! in.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use num_traits::Zero;
use tactus_ast::{Measure, PartialMeasure, Voice};
use tactus_core::NodeId;
use tactus_music::{rational, Rational, TimeSignature};

use super::interpreter::{PartialVoiceInterpreter, SearchState};
use super::proxy::ValueProxy;
use super::tuplet::{
    extract_doubled, DoubledTuplet, MeasureDoubledTuplets, PartialVoiceDoubledTuplets, TupletState,
};

/// One interpreted partial voice: its proxies, total duration, and the
/// doubled tuplets still active at its end.
pub(crate) struct ProxiedPartialVoice {
    pub proxies: Vec<ValueProxy>,
    pub duration: Rational,
    pub doubled_tuplets: PartialVoiceDoubledTuplets,
}

#[derive(Clone)]
pub(crate) struct ProxiedPartialMeasure {
    pub voices: Vec<Arc<ProxiedPartialVoice>>,
}

impl ProxiedPartialMeasure {
    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(|voice| voice.duration)
            .unwrap_or_else(Rational::zero)
    }
}

pub(crate) struct ProxiedVoice {
    pub partial_measures: Vec<Arc<ProxiedPartialMeasure>>,
    pub duration: Rational,
}

/// A complete candidate interpretation of a measure.
pub(crate) struct ProxiedMeasure {
    voices: Vec<Arc<ProxiedVoice>>,
    mean: Option<Rational>,
}

impl ProxiedMeasure {
    fn new(voices: Vec<Arc<ProxiedVoice>>) -> Self {
        Self { voices, mean: None }
    }

    pub fn duration(&self) -> Rational {
        self.voices
            .first()
            .map(|voice| voice.duration)
            .unwrap_or_else(Rational::zero)
    }

    fn proxies(&self) -> impl Iterator<Item = &ValueProxy> {
        self.voices
            .iter()
            .flat_map(|voice| voice.partial_measures.iter())
            .flat_map(|partial_measure| partial_measure.voices.iter())
            .flat_map(|partial_voice| partial_voice.proxies.iter())
    }

    /// Harmonic mean of all proxied durations.
    ///
    /// The harmonic mean tends strongly toward the smallest elements, so it
    /// rewards interpretations dominated by rhythmically dense notation.
    /// The sum of reciprocals is accumulated without intermediate gcd
    /// reduction; the single reduction happens when the result is built.
    pub fn harmonic_mean(&mut self) -> Rational {
        if let Some(mean) = self.mean {
            return mean;
        }
        let (mut numer, mut denom, mut count) = (0i64, 1i64, 0i64);
        for proxy in self.proxies() {
            numer = numer * proxy.duration.numer() + denom * proxy.duration.denom();
            denom *= proxy.duration.numer();
            count += 1;
        }
        let mean = if numer == 0 {
            Rational::zero()
        } else {
            Rational::new(count * denom, numer)
        };
        self.mean = Some(mean);
        mean
    }

    fn cached_mean(&self) -> Option<Rational> {
        self.mean
    }

    /// Transfer the chosen interpretation into the measure.
    ///
    /// Must only be called for the one winning candidate.
    pub fn accept(&self, measure: &mut Measure) {
        for (voice, proxied_voice) in measure.voices.iter_mut().zip(&self.voices) {
            let partial_measures = voice
                .partial_measures
                .iter_mut()
                .zip(&proxied_voice.partial_measures);
            for (partial_measure, proxied_partial) in partial_measures {
                let partial_voices = partial_measure
                    .voices
                    .iter_mut()
                    .zip(&proxied_partial.voices);
                for (partial_voice, proxied_partial_voice) in partial_voices {
                    for proxy in &proxied_partial_voice.proxies {
                        proxy.accept(&mut partial_voice.signs);
                    }
                }
            }
        }
    }

    /// Doubled tuplets crossing the bar line, per voice and partial voice.
    pub fn doubled_tuplets(&self) -> MeasureDoubledTuplets {
        self.voices
            .iter()
            .map(|voice| {
                voice
                    .partial_measures
                    .last()
                    .map(|partial_measure| {
                        partial_measure
                            .voices
                            .iter()
                            .map(|partial_voice| partial_voice.doubled_tuplets.clone())
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl fmt::Display for ProxiedMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for voice in &self.voices {
            write!(f, "[")?;
            for partial_measure in &voice.partial_measures {
                write!(f, "{{")?;
                for partial_voice in &partial_measure.voices {
                    write!(f, "(")?;
                    for proxy in &partial_voice.proxies {
                        write!(
                            f,
                            "<{}/{}>",
                            proxy.duration.numer(),
                            proxy.duration.denom()
                        )?;
                    }
                    write!(f, ")")?;
                }
                write!(f, "}}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

fn partial_measure_interpretations(
    partial_measure: &PartialMeasure,
    doubled: &[PartialVoiceDoubledTuplets],
    max_length: Rational,
    position: Rational,
    last_partial_measure: bool,
    state: &SearchState,
    yield_: &mut dyn FnMut(ProxiedPartialMeasure),
) {
    fn recurse(
        partial_measure: &PartialMeasure,
        index: usize,
        doubled: &[PartialVoiceDoubledTuplets],
        candidate: &mut Vec<Arc<ProxiedPartialVoice>>,
        length: Rational,
        position: Rational,
        last_partial_measure: bool,
        state: &SearchState,
        yield_: &mut dyn FnMut(ProxiedPartialMeasure),
    ) {
        if index == partial_measure.voices.len() {
            if !candidate.is_empty() {
                yield_(ProxiedPartialMeasure {
                    voices: candidate.clone(),
                });
            }
            return;
        }
        let carried: &[DoubledTuplet] = doubled
            .get(index)
            .map(|tuplets| tuplets.as_slice())
            .unwrap_or(&[]);
        let first = candidate.is_empty();
        let interpreter = PartialVoiceInterpreter::new(
            &partial_measure.voices[index],
            position,
            last_partial_measure,
            state,
        );
        let mut on_interpretation =
            |proxies: &[ValueProxy], duration: Rational, tuplet: &TupletState| {
                // The first partial voice sets the length; the others must
                // match it exactly.
                if first || duration == length {
                    candidate.push(Arc::new(ProxiedPartialVoice {
                        proxies: proxies.to_vec(),
                        duration,
                        doubled_tuplets: extract_doubled(tuplet),
                    }));
                    recurse(
                        partial_measure,
                        index + 1,
                        doubled,
                        candidate,
                        duration,
                        position,
                        last_partial_measure,
                        state,
                        yield_,
                    );
                    candidate.pop();
                }
            };
        interpreter.interpretations(carried, length, &mut on_interpretation);
    }

    let mut candidate = Vec::with_capacity(partial_measure.voices.len());
    recurse(
        partial_measure,
        0,
        doubled,
        &mut candidate,
        max_length,
        position,
        last_partial_measure,
        state,
        yield_,
    );
}

fn voice_interpretations(
    voice: &Voice,
    doubled: &[PartialVoiceDoubledTuplets],
    max_length: Rational,
    state: &SearchState,
    yield_: &mut dyn FnMut(ProxiedVoice),
) {
    fn recurse(
        voice: &Voice,
        index: usize,
        doubled: &[PartialVoiceDoubledTuplets],
        candidate: &mut Vec<Arc<ProxiedPartialMeasure>>,
        max_length: Rational,
        position: Rational,
        state: &SearchState,
        yield_: &mut dyn FnMut(ProxiedVoice),
    ) {
        if index == voice.partial_measures.len() {
            if !candidate.is_empty() {
                yield_(ProxiedVoice {
                    partial_measures: candidate.clone(),
                    duration: position,
                });
            }
            return;
        }
        // Doubled tuplets from the previous measure only seed the first
        // partial measure.
        let carried = if index == 0 { doubled } else { &[] };
        let last = index + 1 == voice.partial_measures.len();
        let mut on_partial_measure = |partial: ProxiedPartialMeasure| {
            let duration = partial.duration();
            candidate.push(Arc::new(partial));
            recurse(
                voice,
                index + 1,
                doubled,
                candidate,
                max_length - duration,
                position + duration,
                state,
                yield_,
            );
            candidate.pop();
        };
        partial_measure_interpretations(
            &voice.partial_measures[index],
            carried,
            max_length,
            position,
            last,
            state,
            &mut on_partial_measure,
        );
    }

    let mut candidate = Vec::with_capacity(voice.partial_measures.len());
    recurse(
        voice,
        0,
        doubled,
        &mut candidate,
        max_length,
        Rational::zero(),
        state,
        yield_,
    );
}

fn measure_search(
    measure: &Measure,
    doubled: &MeasureDoubledTuplets,
    state: &SearchState,
    yield_: &mut dyn FnMut(ProxiedMeasure, Rational),
) {
    fn recurse(
        measure: &Measure,
        index: usize,
        doubled: &MeasureDoubledTuplets,
        candidate: &mut Vec<Arc<ProxiedVoice>>,
        length: Rational,
        state: &SearchState,
        yield_: &mut dyn FnMut(ProxiedMeasure, Rational),
    ) {
        if index == measure.voices.len() {
            if !candidate.is_empty() {
                yield_(ProxiedMeasure::new(candidate.clone()), length);
            }
            return;
        }
        let carried: &[PartialVoiceDoubledTuplets] = doubled
            .get(index)
            .map(|tuplets| tuplets.as_slice())
            .unwrap_or(&[]);
        let first = candidate.is_empty();
        let mut on_voice = |voice: ProxiedVoice| {
            let duration = voice.duration;
            let keep = if first {
                !state.exact_match_found.get() || duration == length
            } else {
                duration == length
            };
            if keep {
                candidate.push(Arc::new(voice));
                recurse(measure, index + 1, doubled, candidate, duration, state, yield_);
                candidate.pop();
            }
        };
        voice_interpretations(&measure.voices[index], carried, length, state, &mut on_voice);
    }

    let mut candidate = Vec::with_capacity(measure.voices.len());
    recurse(
        measure,
        0,
        doubled,
        &mut candidate,
        state.time_signature,
        state,
        yield_,
    );
}

/// Minimum candidates per worker before scoring fans out.
const MIN_ITEMS_PER_THREAD: usize = 5000;
const MAX_SCORING_THREADS: usize = 4;

fn compute_means(items: &mut [ProxiedMeasure]) {
    let threads = (items.len() / MIN_ITEMS_PER_THREAD).min(MAX_SCORING_THREADS);
    if threads > 1 {
        let chunk_size = items.len().div_ceil(threads);
        std::thread::scope(|scope| {
            for chunk in items.chunks_mut(chunk_size) {
                scope.spawn(move || {
                    for item in chunk {
                        item.harmonic_mean();
                    }
                });
            }
        });
    } else {
        for item in items {
            item.harmonic_mean();
        }
    }
}

/// Every surviving interpretation of one measure.
pub(crate) struct MeasureInterpretations {
    items: Vec<ProxiedMeasure>,
    measure_id: NodeId,
    time_signature: Rational,
    exact_match_found: bool,
}

impl MeasureInterpretations {
    pub fn new(
        measure: &Measure,
        time_signature: TimeSignature,
        last_measure_duration: Rational,
        last_doubled_tuplets: &MeasureDoubledTuplets,
    ) -> Self {
        let state = SearchState {
            time_signature: time_signature.as_rational(),
            beat: time_signature.beat(),
            last_measure_duration,
            exact_match_found: Cell::new(false),
        };

        let mut items: Vec<ProxiedMeasure> = Vec::new();
        {
            let mut collect = |candidate: ProxiedMeasure, length: Rational| {
                if !state.exact_match_found.get() || length == state.time_signature {
                    if !state.exact_match_found.get() && length == state.time_signature {
                        // The first interpretation matching the time
                        // signature: this is not an anacrusis.  Drop the
                        // accumulated incomplete candidates and continue
                        // more efficiently.
                        items.clear();
                        state.exact_match_found.set(true);
                    }
                    items.push(candidate);
                }
            };
            measure_search(measure, last_doubled_tuplets, &state, &mut collect);
        }

        let mut interpretations = Self {
            items,
            measure_id: measure.id,
            time_signature: state.time_signature,
            exact_match_found: state.exact_match_found.get(),
        };
        interpretations.cleanup();
        interpretations
    }

    /// Drop interpretations scoring significantly below the unique best.
    fn cleanup(&mut self) {
        if !self.exact_match_found || self.items.len() < 2 {
            return;
        }
        compute_means(&mut self.items);

        let mut best = Rational::zero();
        let mut unique = false;
        for item in &mut self.items {
            let mean = item.harmonic_mean();
            if mean > best {
                best = mean;
                unique = true;
            } else if mean == best {
                unique = false;
            }
        }
        if unique {
            let margin = best * rational(3, 4);
            self.items
                .retain(|item| item.cached_mean().is_some_and(|mean| mean > margin));
        }
    }

    pub fn contains_complete_measure(&self) -> bool {
        self.exact_match_found
    }

    pub fn measure_id(&self) -> NodeId {
        self.measure_id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxiedMeasure> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProxiedMeasure> {
        self.items.iter_mut()
    }

    pub fn first(&self) -> Option<&ProxiedMeasure> {
        self.items.first()
    }

    /// True iff exactly one pairing of interpretations sums to the time
    /// signature.
    pub fn completes_uniquely(&self, other: &MeasureInterpretations) -> bool {
        let mut matches = 0;
        for lhs in &self.items {
            for rhs in &other.items {
                if lhs.duration() + rhs.duration() == self.time_signature {
                    matches += 1;
                }
            }
        }
        matches == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_ast::{AmbiguousValue, Note, PartialVoice, Rest, Sign};
    use tactus_music::Step;

    fn measure_of(signs: Vec<Sign>) -> Measure {
        Measure::new(
            NodeId::new(100),
            vec![Voice::new(
                NodeId::new(101),
                vec![PartialMeasure::new(
                    NodeId::new(102),
                    vec![PartialVoice::new(NodeId::new(103), signs)],
                )],
            )],
        )
    }

    fn interpretations_of(signs: Vec<Sign>, time: TimeSignature) -> MeasureInterpretations {
        let measure = measure_of(signs);
        MeasureInterpretations::new(&measure, time, Rational::zero(), &Vec::new())
    }

    #[test]
    fn test_two_rests_in_three_four() {
        let interpretations = interpretations_of(
            vec![
                Sign::Rest(Rest::new(NodeId::new(0), AmbiguousValue::HalfOr32nd)),
                Sign::Rest(Rest::new(NodeId::new(1), AmbiguousValue::QuarterOr64th)),
            ],
            TimeSignature::new(3, 4),
        );
        assert!(interpretations.contains_complete_measure());
        assert_eq!(interpretations.len(), 1);
        assert_eq!(
            interpretations.first().unwrap().duration(),
            rational(3, 4)
        );
    }

    #[test]
    fn test_incomplete_candidates_survive_without_complete_one() {
        let interpretations = interpretations_of(
            vec![Sign::Note(Note::new(
                NodeId::new(0),
                AmbiguousValue::EighthOr128th,
                Step::C,
            ))],
            TimeSignature::new(4, 4),
        );
        assert!(!interpretations.contains_complete_measure());
        assert_eq!(interpretations.len(), 2);
    }

    #[test]
    fn test_accept_resolves_measure() {
        let mut measure = measure_of(vec![
            Sign::Rest(Rest::new(NodeId::new(0), AmbiguousValue::HalfOr32nd)),
            Sign::Rest(Rest::new(NodeId::new(1), AmbiguousValue::QuarterOr64th)),
        ]);
        let interpretations = MeasureInterpretations::new(
            &measure,
            TimeSignature::new(3, 4),
            Rational::zero(),
            &Vec::new(),
        );
        interpretations.first().unwrap().accept(&mut measure);
        assert_eq!(measure.duration(), rational(3, 4));
        let signs = &measure.voices[0].partial_measures[0].voices[0].signs;
        assert_eq!(signs[0].duration(), rational(1, 2));
        assert_eq!(signs[1].duration(), rational(1, 4));
    }

    #[test]
    fn test_completes_uniquely() {
        let first = interpretations_of(
            vec![Sign::Note(Note::new(
                NodeId::new(0),
                AmbiguousValue::EighthOr128th,
                Step::C,
            ))],
            TimeSignature::new(4, 4),
        );
        let last = interpretations_of(
            vec![
                Sign::Note(Note::new(NodeId::new(1), AmbiguousValue::HalfOr32nd, Step::C)),
                Sign::Note(Note::new(NodeId::new(2), AmbiguousValue::QuarterOr64th, Step::D)),
                Sign::Note(Note::new(NodeId::new(3), AmbiguousValue::EighthOr128th, Step::E)),
            ],
            TimeSignature::new(4, 4),
        );
        assert!(!first.contains_complete_measure());
        assert!(!last.contains_complete_measure());
        // 1/8 pairs only with 1/2 + 1/4 + 1/8 = 7/8.
        assert!(first.completes_uniquely(&last));
    }
}
