//! End-to-end tests driving the full pass pipeline.

use tactus_ast::unfolded;
use tactus_ast::{
    AmbiguousValue, Measure, Note, NotegroupMember, Paragraph, ParagraphElement, PartialMeasure,
    PartialVoice, Rest, Score, Section, Sign, Simile, Voice,
};
use tactus_core::{NodeId, NodeIdGen};
use tactus_music::{rational, KeySignature, Rational, Step, TimeSignature};
use tactus_resolver::{compile, compile_to_diagnostics, CompileError, Compiler};

struct Builder {
    ids: NodeIdGen,
}

impl Builder {
    fn new() -> Self {
        Self {
            ids: NodeIdGen::new(),
        }
    }

    fn id(&mut self) -> NodeId {
        self.ids.fresh()
    }

    fn note(&mut self, value: AmbiguousValue, step: Step) -> Sign {
        Sign::Note(Note::new(self.id(), value, step))
    }

    fn marked_note(&mut self, value: AmbiguousValue, step: Step, octave: u8) -> Sign {
        let mut note = Note::new(self.id(), value, step);
        note.pitch.octave_spec = Some(octave);
        Sign::Note(note)
    }

    fn rest(&mut self, value: AmbiguousValue) -> Sign {
        Sign::Rest(Rest::new(self.id(), value))
    }

    fn measure(&mut self, signs: Vec<Sign>) -> Measure {
        let voice = Voice::new(
            self.id(),
            vec![PartialMeasure::new(
                self.id(),
                vec![PartialVoice::new(self.id(), signs)],
            )],
        );
        Measure::new(self.id(), vec![voice])
    }

    fn score(&mut self, time: Option<TimeSignature>, measures: Vec<Measure>) -> Score {
        let elements = measures
            .into_iter()
            .map(ParagraphElement::Measure)
            .collect();
        let paragraph = Paragraph::new(self.id(), elements);
        let section = Section::new(self.id(), vec![paragraph]);
        Score::new(KeySignature::default(), time, vec![vec![section]])
    }
}

fn first_measure(score: &Score) -> &Measure {
    match &score.parts[0][0].paragraphs[0].elements[0] {
        ParagraphElement::Measure(measure) => measure,
        _ => panic!("expected a measure"),
    }
}

fn measure_at(score: &Score, index: usize) -> &Measure {
    match &score.parts[0][0].paragraphs[0].elements[index] {
        ParagraphElement::Measure(measure) => measure,
        _ => panic!("expected a measure"),
    }
}

fn signs_of(measure: &Measure) -> &[Sign] {
    &measure.voices[0].partial_measures[0].voices[0].signs
}

fn resolved_types(measure: &Measure) -> Vec<Rational> {
    signs_of(measure)
        .iter()
        .filter_map(|sign| sign.rhythm().map(|rhythm| rhythm.resolved_type))
        .collect()
}

fn compile_ok(score: &mut Score) {
    let (ok, diagnostics) = compile_to_diagnostics(score);
    assert!(
        ok,
        "compilation failed: {:?}",
        diagnostics.iter().map(|d| &d.message).collect::<Vec<_>>()
    );
}

#[test]
fn test_half_and_quarter_rest_in_three_four() {
    let mut builder = Builder::new();
    let half = builder.rest(AmbiguousValue::HalfOr32nd);
    let quarter = builder.rest(AmbiguousValue::QuarterOr64th);
    let measure = builder.measure(vec![half, quarter]);
    let mut score = builder.score(Some(TimeSignature::new(3, 4)), vec![measure]);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    assert_eq!(measure.duration(), rational(3, 4));
    assert_eq!(resolved_types(measure), vec![rational(1, 2), rational(1, 4)]);
    match &signs_of(measure)[0] {
        Sign::Rest(rest) => assert!(!rest.whole_measure),
        _ => unreachable!(),
    }
}

#[test]
fn test_whole_measure_rest() {
    let mut builder = Builder::new();
    let rest = builder.rest(AmbiguousValue::WholeOr16th);
    let measure = builder.measure(vec![rest]);
    let mut score = builder.score(Some(TimeSignature::new(3, 4)), vec![measure]);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    match &signs_of(measure)[0] {
        Sign::Rest(rest) => {
            assert!(rest.whole_measure);
            assert_eq!(rest.rhythm.as_rational(), rational(3, 4));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_notegroup_with_closing_half_note() {
    // A 16th-class leader, seven eighth-class notes and a closing half in
    // common time: the group resolves to eight 16ths plus a half note.
    let mut builder = Builder::new();
    let steps = [
        Step::C,
        Step::E,
        Step::F,
        Step::G,
        Step::A,
        Step::B,
        Step::C,
        Step::D,
    ];
    let mut signs = Vec::new();
    signs.push(builder.marked_note(AmbiguousValue::WholeOr16th, steps[0], 4));
    for step in &steps[1..] {
        signs.push(builder.note(AmbiguousValue::EighthOr128th, *step));
    }
    signs.push(builder.note(AmbiguousValue::HalfOr32nd, Step::C));
    let measure = builder.measure(signs);
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![measure]);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    let types = resolved_types(measure);
    assert_eq!(types.len(), 9);
    for value in &types[..8] {
        assert_eq!(*value, rational(1, 16));
    }
    assert_eq!(types[8], rational(1, 2));
    assert_eq!(measure.duration(), rational(1, 1));

    // Beaming information is restored for the group.
    let rhythms: Vec<NotegroupMember> = signs_of(measure)
        .iter()
        .filter_map(|sign| sign.rhythm().map(|rhythm| rhythm.notegroup_member))
        .collect();
    assert_eq!(rhythms[0], NotegroupMember::Begin);
    assert_eq!(rhythms[7], NotegroupMember::End);
    assert!(rhythms[1..7]
        .iter()
        .all(|member| *member == NotegroupMember::Middle));
    assert_eq!(rhythms[8], NotegroupMember::None);
}

#[test]
fn test_simple_triplets() {
    // Two quarters and two eighth triplets fill a common-time measure; all
    // six triplet members carry factor 2/3.
    let mut builder = Builder::new();
    let mut signs = Vec::new();
    signs.push(builder.marked_note(AmbiguousValue::QuarterOr64th, Step::C, 4));
    signs.push(builder.note(AmbiguousValue::QuarterOr64th, Step::D));
    signs.push(Sign::TupletStart(tactus_ast::TupletStart::simple_triplet(
        builder.id(),
        false,
    )));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::E));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::F));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::G));
    signs.push(Sign::TupletStart(tactus_ast::TupletStart::simple_triplet(
        builder.id(),
        false,
    )));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::A));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::B));
    signs.push(builder.note(AmbiguousValue::EighthOr128th, Step::C));
    let measure = builder.measure(signs);
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![measure]);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    assert_eq!(measure.duration(), rational(1, 1));

    let rhythms: Vec<_> = signs_of(measure)
        .iter()
        .filter_map(|sign| sign.rhythm())
        .collect();
    assert_eq!(rhythms.len(), 8);
    for rhythm in &rhythms[..2] {
        assert_eq!(rhythm.resolved_type, rational(1, 4));
        assert_eq!(rhythm.factor, rational(1, 1));
    }
    for rhythm in &rhythms[2..] {
        assert_eq!(rhythm.resolved_type, rational(1, 8));
        assert_eq!(rhythm.factor, rational(2, 3));
    }
    // Tuplet spans are marked on their first and last members.
    assert_eq!(rhythms[2].tuplet_begin, vec![rational(2, 3)]);
    assert_eq!(rhythms[4].tuplet_end, 1);
    assert_eq!(rhythms[5].tuplet_begin, vec![rational(2, 3)]);
    assert_eq!(rhythms[7].tuplet_end, 1);
}

#[test]
fn test_anacrusis_pairing() {
    // An eighth-note pickup in common time pairs with a closing measure of
    // seven eighths' worth; together they fill the time signature once.
    let mut builder = Builder::new();
    let pickup = {
        let sign = builder.marked_note(AmbiguousValue::EighthOr128th, Step::G, 4);
        builder.measure(vec![sign])
    };
    let middle = {
        let sign = builder.marked_note(AmbiguousValue::WholeOr16th, Step::C, 4);
        builder.measure(vec![sign])
    };
    let closing = {
        let half = builder.marked_note(AmbiguousValue::HalfOr32nd, Step::C, 4);
        let quarter = builder.note(AmbiguousValue::QuarterOr64th, Step::E);
        let eighth = builder.note(AmbiguousValue::EighthOr128th, Step::G);
        builder.measure(vec![half, quarter, eighth])
    };
    let mut score = builder.score(
        Some(TimeSignature::new(4, 4)),
        vec![pickup, middle, closing],
    );

    compile_ok(&mut score);

    assert_eq!(measure_at(&score, 0).duration(), rational(1, 8));
    assert_eq!(measure_at(&score, 1).duration(), rational(1, 1));
    assert_eq!(measure_at(&score, 2).duration(), rational(7, 8));
    assert_eq!(
        measure_at(&score, 0).duration() + measure_at(&score, 2).duration(),
        rational(1, 1)
    );
}

#[test]
fn test_unterminated_anacrusis_is_reported() {
    let mut builder = Builder::new();
    let pickup = {
        let sign = builder.marked_note(AmbiguousValue::EighthOr128th, Step::G, 4);
        builder.measure(vec![sign])
    };
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![pickup]);

    // A lone short measure with two surviving readings never finds its
    // counterpart.
    let mut reported = Vec::new();
    let ok = compile(&mut score, |node, message| {
        reported.push((node, message.to_string()));
    });
    assert!(!ok);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].1.contains("anacrusis"));
}

#[test]
fn test_no_interpretation_is_reported() {
    // Five whole-class signs cannot squeeze into a 1/4 measure even as
    // 16ths, so no reading exists at all.
    let mut builder = Builder::new();
    let measure = {
        let mut signs = Vec::new();
        for _ in 0..5 {
            let sign = builder.marked_note(AmbiguousValue::WholeOr16th, Step::C, 4);
            signs.push(sign);
        }
        builder.measure(signs)
    };
    let mut score = builder.score(Some(TimeSignature::new(1, 4)), vec![measure]);

    let mut reported = Vec::new();
    let ok = compile(&mut score, |node, message| {
        reported.push((node, message.to_string()));
    });
    assert!(!ok);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].1.contains("no possible interpretations"));
}

#[test]
fn test_octaves_and_alterations_flow_through_compile() {
    let mut builder = Builder::new();
    let measure = {
        let c = builder.marked_note(AmbiguousValue::QuarterOr64th, Step::C, 4);
        let f = builder.note(AmbiguousValue::QuarterOr64th, Step::F);
        let g = builder.note(AmbiguousValue::QuarterOr64th, Step::G);
        let b = builder.note(AmbiguousValue::QuarterOr64th, Step::B);
        builder.measure(vec![c, f, g, b])
    };
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![measure]);
    // D major: F and C sharp.
    score.key_sig = KeySignature::new(2);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    let notes: Vec<&Note> = signs_of(measure)
        .iter()
        .filter_map(|sign| match sign {
            Sign::Note(note) => Some(note),
            _ => None,
        })
        .collect();
    assert_eq!(notes[0].pitch.octave, 4);
    assert_eq!(notes[1].pitch.octave, 4);
    assert_eq!(notes[3].pitch.octave, 4);
    assert_eq!(notes[0].pitch.alter, 1);
    assert_eq!(notes[1].pitch.alter, 1);
    assert_eq!(notes[2].pitch.alter, 0);
}

#[test]
fn test_full_measure_simile_through_compile_and_unfold() {
    let mut builder = Builder::new();
    let first = {
        let half = builder.marked_note(AmbiguousValue::HalfOr32nd, Step::C, 4);
        let quarter = builder.note(AmbiguousValue::QuarterOr64th, Step::D);
        builder.measure(vec![half, quarter])
    };
    let repeat = {
        let simile = Sign::Simile(Simile::new(builder.id(), 1));
        builder.measure(vec![simile])
    };
    let mut score = builder.score(Some(TimeSignature::new(3, 4)), vec![first, repeat]);

    compile_ok(&mut score);

    match &signs_of(measure_at(&score, 1))[0] {
        Sign::Simile(simile) => assert_eq!(simile.duration, rational(3, 4)),
        _ => unreachable!(),
    }

    // The unfolder replaced the simile with a literal copy.
    let staff = &score.unfolded_parts[0][0];
    assert_eq!(staff.elements.len(), 2);
    for element in &staff.elements {
        match element {
            unfolded::StaffElement::Measure(measure) => {
                assert_eq!(measure.duration(), rational(3, 4));
            }
            _ => unreachable!(),
        }
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let mut builder = Builder::new();
    let measure = {
        let half = builder.marked_note(AmbiguousValue::HalfOr32nd, Step::C, 4);
        let quarter = builder.note(AmbiguousValue::QuarterOr64th, Step::D);
        let eighth_one = builder.note(AmbiguousValue::EighthOr128th, Step::E);
        let eighth_two = builder.note(AmbiguousValue::EighthOr128th, Step::F);
        builder.measure(vec![half, quarter, eighth_one, eighth_two])
    };
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![measure]);

    compile_ok(&mut score);
    let first_pass = format!("{:?}", first_measure(&score));

    compile_ok(&mut score);
    let second_pass = format!("{:?}", first_measure(&score));
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_voices_share_measure_duration() {
    // Full-measure in-accord: a whole-class voice against four quarters.
    let mut builder = Builder::new();
    let upper = {
        let sign = builder.marked_note(AmbiguousValue::WholeOr16th, Step::C, 5);
        Voice::new(
            builder.id(),
            vec![PartialMeasure::new(
                builder.id(),
                vec![PartialVoice::new(builder.id(), vec![sign])],
            )],
        )
    };
    let lower = {
        let mut signs = Vec::new();
        signs.push(builder.marked_note(AmbiguousValue::QuarterOr64th, Step::C, 3));
        signs.push(builder.note(AmbiguousValue::QuarterOr64th, Step::E));
        signs.push(builder.note(AmbiguousValue::QuarterOr64th, Step::G));
        signs.push(builder.note(AmbiguousValue::QuarterOr64th, Step::E));
        Voice::new(
            builder.id(),
            vec![PartialMeasure::new(
                builder.id(),
                vec![PartialVoice::new(builder.id(), signs)],
            )],
        )
    };
    let measure = Measure::new(builder.id(), vec![upper, lower]);
    let mut score = builder.score(Some(TimeSignature::new(4, 4)), vec![measure]);

    compile_ok(&mut score);

    let measure = first_measure(&score);
    assert_eq!(measure.voices[0].duration(), rational(1, 1));
    assert_eq!(measure.voices[1].duration(), rational(1, 1));
}

#[test]
fn test_third_staff_is_rejected() {
    let mut builder = Builder::new();
    let mut staves = Vec::new();
    for _ in 0..3 {
        let measure = {
            let rest = builder.rest(AmbiguousValue::WholeOr16th);
            builder.measure(vec![rest])
        };
        staves.push(Paragraph::new(
            builder.id(),
            vec![ParagraphElement::Measure(measure)],
        ));
    }
    let section = Section::new(builder.id(), staves);
    let mut score = Score::new(
        KeySignature::default(),
        Some(TimeSignature::new(3, 4)),
        vec![vec![section]],
    );

    let mut compiler = Compiler::new(|_, _: &str| {});
    assert!(!compiler.compile(&mut score));
    let (_, diagnostics) = compile_to_diagnostics(&mut score);
    assert!(diagnostics
        .iter()
        .any(|diagnostic| diagnostic.message.contains("staves")));
}

#[test]
fn test_error_type_accessors() {
    let error = CompileError::MissingOctaveMark {
        node: NodeId::new(7),
    };
    assert_eq!(error.node(), NodeId::new(7));
    assert_eq!(error.to_string(), "missing octave mark");
}
