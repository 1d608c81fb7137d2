//! Recursive enumeration of the rhythmic readings of one partial voice.
//!
//! Each recursion step looks at the next sign and pursues the applicable
//! disambiguation mode: note groups on a beat, same-category runs after a
//! value distinction, tuplet entry, whole-measure rests, similes, and the
//! plain large/small fallback.  Every complete assignment whose durations
//! fit the remaining budget is emitted through the yield callback together
//! with its total duration and the tuplet state at the end of the voice.

use std::cell::Cell;

use num_traits::{One, Zero};
use smallvec::SmallVec;
use tactus_ast::{AmbiguousValue, PartialVoice, Sign, ValueDistinctionKind};
use tactus_music::{is_dyadic, no_remainder, Rational};

use super::proxy::{ProxyKind, ValueCategory, ValueProxy};
use super::tuplet::{
    count_rhythmic, process_tuplet_state, tuplet_end_index, tuplet_ratios, DoubledTuplet,
    TupletLevel, TupletState,
};

/// Search-wide constants and the shared exact-match flag.
pub(crate) struct SearchState {
    pub time_signature: Rational,
    pub beat: Rational,
    pub last_measure_duration: Rational,
    /// Set once a complete (time-signature-filling) measure interpretation
    /// has been found; short candidates are suppressed from then on.
    pub exact_match_found: Cell<bool>,
}

/// Callback receiving one complete partial-voice interpretation.
pub(crate) type PartialVoiceYield<'a> = dyn FnMut(&[ValueProxy], Rational, &TupletState) + 'a;

pub(crate) struct PartialVoiceInterpreter<'a> {
    signs: &'a [Sign],
    start_position: Rational,
    last_partial_measure: bool,
    state: &'a SearchState,
}

impl<'a> PartialVoiceInterpreter<'a> {
    pub fn new(
        partial_voice: &'a PartialVoice,
        start_position: Rational,
        last_partial_measure: bool,
        state: &'a SearchState,
    ) -> Self {
        Self {
            signs: &partial_voice.signs,
            start_position,
            last_partial_measure,
            state,
        }
    }

    /// Enumerate every interpretation fitting into `max_duration`.
    ///
    /// `doubled` are the doubled tuplets carried over the bar line; they are
    /// re-armed with a ttl covering the head of this voice.
    pub fn interpretations(
        &self,
        doubled: &[DoubledTuplet],
        max_duration: Rational,
        yield_: &mut PartialVoiceYield,
    ) {
        let mut tuplet = TupletState::new();
        for carried in doubled {
            let end = tuplet_end_index(self.signs, 0, carried.number, true);
            tuplet.push(TupletLevel {
                number: carried.number,
                factor: carried.factor,
                first_tuplet: true,
                ttl: count_rhythmic(&self.signs[..end]),
                doubled: true,
            });
        }

        let mut stack = Vec::with_capacity(self.signs.len());
        self.recurse(
            0,
            &mut stack,
            max_duration,
            self.start_position,
            &tuplet,
            yield_,
        );
    }

    fn on_beat(&self, position: Rational) -> bool {
        no_remainder(position, self.state.beat)
    }

    fn recurse(
        &self,
        index: usize,
        stack: &mut Vec<ValueProxy>,
        max_duration: Rational,
        position: Rational,
        tuplet: &TupletState,
        yield_: &mut PartialVoiceYield,
    ) {
        if index == self.signs.len() {
            let suppress = self.last_partial_measure
                && self.state.exact_match_found.get()
                && !max_duration.is_zero();
            if !suppress {
                yield_(stack, position - self.start_position, tuplet);
            }
            return;
        }

        // Note groups, longest prefix first.
        let group_end = notegroup_end(self.signs, index);
        if self.on_beat(position) && group_end > index {
            let mut tail = group_end;
            while tail - index >= 3 {
                let mut t = tuplet.clone();
                if let Some(group) = build_notegroup(&self.signs[index..tail], index, &mut t) {
                    if group.duration <= max_duration {
                        let next_position = position + group.duration;
                        if self.on_beat(next_position) {
                            let mark = stack.len();
                            stack.extend(group.proxies);
                            self.recurse(
                                tail,
                                stack,
                                max_duration - group.duration,
                                next_position,
                                &t,
                                yield_,
                            );
                            stack.truncate(mark);
                        }
                    }
                }
                tail -= 1;
            }

            self.large_and_small(index, stack, max_duration, position, tuplet, yield_);
            return;
        }

        // Homogeneous runs behind an explicit value distinction.
        if let Some(tail) = same_category_end(self.signs, index, ValueDistinctionKind::LargeFollows)
        {
            self.same_category(
                index,
                tail,
                ValueCategory::Large,
                stack,
                max_duration,
                position,
                tuplet,
                yield_,
            );
            return;
        }
        if let Some(tail) = same_category_end(self.signs, index, ValueDistinctionKind::SmallFollows)
        {
            self.same_category(
                index,
                tail,
                ValueCategory::Small,
                stack,
                max_duration,
                position,
                tuplet,
                yield_,
            );
            return;
        }

        if let Sign::TupletStart(start) = &self.signs[index] {
            self.tuplet_start(
                index,
                start.number(),
                start.is_simple_triplet(),
                start.is_doubled(),
                stack,
                max_duration,
                position,
                tuplet,
                yield_,
            );
            return;
        }

        self.large_and_small(index, stack, max_duration, position, tuplet, yield_);

        if stack.is_empty()
            && position.is_zero()
            && self.state.time_signature != Rational::one()
            && maybe_whole_measure_rest(&self.signs[index])
        {
            stack.push(ValueProxy::whole_measure_rest(
                index,
                self.state.time_signature,
            ));
            self.recurse(
                index + 1,
                stack,
                Rational::zero(),
                position + self.state.time_signature,
                tuplet,
                yield_,
            );
            stack.pop();
        }
    }

    /// Try the common large and small variants of one sign.
    ///
    /// Durationless signs contribute no proxy and recursion just moves on.
    fn large_and_small(
        &self,
        index: usize,
        stack: &mut Vec<ValueProxy>,
        max_duration: Rational,
        position: Rational,
        tuplet: &TupletState,
        yield_: &mut PartialVoiceYield,
    ) {
        if !self.try_sign(index, stack, max_duration, position, tuplet, yield_) {
            self.recurse(index + 1, stack, max_duration, position, tuplet, yield_);
        }
    }

    fn try_sign(
        &self,
        index: usize,
        stack: &mut Vec<ValueProxy>,
        max_duration: Rational,
        position: Rational,
        tuplet: &TupletState,
        yield_: &mut PartialVoiceYield,
    ) -> bool {
        let sign = &self.signs[index];
        match sign {
            Sign::Note(_) | Sign::Rest(_) | Sign::Chord(_) | Sign::MovingNote(_) => {
                if sign.is_grace() {
                    return false;
                }
                let mut t = tuplet.clone();
                let active = process_tuplet_state(&mut t);
                let value = sign.ambiguous_value();
                for category in [ValueCategory::Large, ValueCategory::Small] {
                    let Some(mut proxy) =
                        ValueProxy::rhythmic(sign, index, category, value, active.factor)
                    else {
                        return false;
                    };
                    if proxy.duration <= max_duration {
                        let next_position = position + proxy.duration;
                        // A closing tuplet only makes sense on a dyadic
                        // position.
                        if !active.dyadic_next_position || is_dyadic(next_position) {
                            proxy.set_tuplet_info(&active.tuplet_begin, active.tuplet_end);
                            let remaining = max_duration - proxy.duration;
                            stack.push(proxy);
                            self.recurse(index + 1, stack, remaining, next_position, &t, yield_);
                            stack.pop();
                        }
                    }
                }
                true
            }
            Sign::Simile(simile) => {
                if position.is_zero() {
                    // Full-measure simile: the previous measure, count times.
                    let step = self.state.last_measure_duration;
                    if step > Rational::zero() && step <= max_duration {
                        stack.push(ValueProxy::simile(index, step, simile.count));
                        self.recurse(
                            index + 1,
                            stack,
                            max_duration - step,
                            position + step,
                            tuplet,
                            yield_,
                        );
                        stack.pop();
                    }
                } else if self.on_beat(position) {
                    // Partial-measure simile: everything since the start of
                    // the measure, not reaching through an earlier simile.
                    let mut repeated = Rational::zero();
                    for proxy in stack.iter() {
                        if proxy.kind() == ProxyKind::Simile {
                            repeated = Rational::zero();
                        } else {
                            repeated += proxy.duration;
                        }
                    }
                    let proxy = ValueProxy::simile(index, repeated, simile.count);
                    let duration = proxy.duration;
                    if duration <= max_duration {
                        let mut t = tuplet.clone();
                        if let Some(last) = t.last_mut() {
                            if last.doubled {
                                last.first_tuplet = true;
                                let end = tuplet_end_index(
                                    self.signs,
                                    index + 1,
                                    last.number,
                                    true,
                                );
                                last.ttl = count_rhythmic(&self.signs[index + 1..end]);
                            }
                        }
                        stack.push(proxy);
                        self.recurse(
                            index + 1,
                            stack,
                            max_duration - duration,
                            position + duration,
                            &t,
                            yield_,
                        );
                        stack.pop();
                    }
                }
                true
            }
            _ => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn same_category(
        &self,
        index: usize,
        end: usize,
        category: ValueCategory,
        stack: &mut Vec<ValueProxy>,
        max_duration: Rational,
        position: Rational,
        tuplet: &TupletState,
        yield_: &mut PartialVoiceYield,
    ) {
        let proxies: Vec<ValueProxy> = self.signs[index..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, sign)| {
                ValueProxy::rhythmic(
                    sign,
                    index + offset,
                    category,
                    sign.ambiguous_value(),
                    Rational::one(),
                )
            })
            .collect();
        let duration: Rational = proxies.iter().map(|proxy| proxy.duration).sum();
        if duration <= max_duration {
            let mark = stack.len();
            stack.extend(proxies);
            self.recurse(
                end,
                stack,
                max_duration - duration,
                position + duration,
                tuplet,
                yield_,
            );
            stack.truncate(mark);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn tuplet_start(
        &self,
        index: usize,
        number: u32,
        simple: bool,
        doubled: bool,
        stack: &mut Vec<ValueProxy>,
        max_duration: Rational,
        position: Rational,
        tuplet: &TupletState,
        yield_: &mut PartialVoiceYield,
    ) {
        let tail = index + 1;
        let mut t = tuplet.clone();
        let parent_ttl = t.last().map(|level| level.ttl).unwrap_or(0);

        let terminates_doubled = matches!(
            t.last(),
            Some(last) if last.doubled && !doubled && last.number == number
        );

        let span = tuplet_end_index(self.signs, tail, number, simple);
        let full_ttl = count_rhythmic(&self.signs[tail..span]);

        if terminates_doubled {
            let last_index = t.len() - 1;
            t[last_index].doubled = false;
            t[last_index].first_tuplet = true;
            for ttl in (1..=full_ttl).rev() {
                t[last_index].ttl = ttl;
                self.recurse(tail, stack, max_duration, position, &t, yield_);
            }
            return;
        }

        if t.is_empty() || t.last().map(|level| level.ttl > 0).unwrap_or(false) {
            t.push(TupletLevel::default());
        }
        let last_index = t.len() - 1;
        t[last_index].number = number;
        t[last_index].first_tuplet = true;
        t[last_index].doubled = doubled;

        // A nested tuplet cannot outlast the tuplet containing it.
        let mut ttl = full_ttl;
        if parent_ttl > 0 && parent_ttl < ttl {
            ttl = parent_ttl;
        }

        if doubled {
            t[last_index].ttl = ttl;
            for &ratio in tuplet_ratios(number) {
                t[last_index].factor = ratio;
                self.recurse(tail, stack, max_duration, position, &t, yield_);
            }
        } else {
            for ttl_value in (1..=ttl).rev() {
                t[last_index].ttl = ttl_value;
                for &ratio in tuplet_ratios(number) {
                    t[last_index].factor = ratio;
                    self.recurse(tail, stack, max_duration, position, &t, yield_);
                }
            }
        }
    }
}

fn maybe_whole_measure_rest(sign: &Sign) -> bool {
    match sign {
        Sign::Rest(rest) => {
            rest.rhythm.ambiguous_value == AmbiguousValue::WholeOr16th && rest.rhythm.dots == 0
        }
        _ => false,
    }
}

/// Find the end of a note group.
///
/// Returns `begin` when no group starts here.  A group needs a rhythmic
/// leader outside the eighth/128th class followed by eighth/128th signs that
/// are neither rests nor dotted, and at least three members in total.
fn notegroup_end(signs: &[Sign], begin: usize) -> usize {
    if signs[begin].is_rhythmic()
        && signs[begin].ambiguous_value() != AmbiguousValue::EighthOr128th
    {
        let mut index = begin + 1;
        while index < signs.len()
            && signs[index].ambiguous_value() == AmbiguousValue::EighthOr128th
            && !signs[index].is_rest()
            && signs[index].dots() == 0
            && !signs[index].is_hyphen()
        {
            index += 1;
        }
        if index - begin > 2 {
            return index;
        }
    }
    begin
}

struct Notegroup {
    proxies: SmallVec<[ValueProxy; 8]>,
    duration: Rational,
}

/// Proxy a note group: every member small, sharing the leader's class.
fn build_notegroup(signs: &[Sign], base_index: usize, tuplet: &mut TupletState) -> Option<Notegroup> {
    let mut shared = AmbiguousValue::Unknown;
    let mut proxies: SmallVec<[ValueProxy; 8]> = SmallVec::new();
    for (offset, sign) in signs.iter().enumerate() {
        if !sign.is_rhythmic() {
            continue;
        }
        if shared == AmbiguousValue::Unknown {
            shared = sign.ambiguous_value();
        }
        let active = process_tuplet_state(tuplet);
        let mut proxy = ValueProxy::rhythmic(
            sign,
            base_index + offset,
            ValueCategory::Small,
            shared,
            active.factor,
        )?;
        proxy.set_tuplet_info(&active.tuplet_begin, active.tuplet_end);
        proxies.push(proxy);
    }
    if proxies.len() < 2 {
        return None;
    }

    let last = proxies.len() - 1;
    proxies[0].make_beam_begin();
    for proxy in &mut proxies[1..last] {
        proxy.make_beam_continue();
    }
    proxies[last].make_beam_end();

    let duration = proxies.iter().map(|proxy| proxy.duration).sum();
    Some(Notegroup { proxies, duration })
}

/// End of the homogeneous rhythmic run behind a value distinction of `kind`.
fn same_category_end(
    signs: &[Sign],
    begin: usize,
    kind: ValueDistinctionKind,
) -> Option<usize> {
    match &signs[begin] {
        Sign::ValueDistinction(distinction) if distinction.kind == kind => {}
        _ => return None,
    }
    let mut index = begin + 1;
    if index >= signs.len() || !signs[index].is_rhythmic() {
        return None;
    }
    let initial = signs[index].ambiguous_value();
    index += 1;
    while index < signs.len()
        && signs[index].is_rhythmic()
        && signs[index].ambiguous_value() == initial
    {
        index += 1;
    }
    Some(index)
}
