// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;
use oqp_passes::analysis::{analyze_program, ShotsSignature};
use oqp_passes::duration::{resolve_durations, ClockReport};
use oqp_passes::timing::{check_timing, TimingConfig, TimingWarningKind};
use oqp_semantics::asg::*;
use oqp_semantics::builtins::GeneratorRegistry;
use oqp_semantics::types::{IsConst, Type};

fn resolve(program: Program) -> (Program, ClockReport) {
    init_logger();
    let mut program = analyzed(program);
    let report = resolve_durations(&mut program, &GeneratorRegistry::zi(), SAMPLE_RATE).unwrap();
    (program, report)
}

fn on_frame1(body: Vec<Stmt>) -> Program {
    Program::from_stmts(vec![
        grammar(),
        cal(vec![port("ch1"), frame("frame1", "ch1")]),
        cal(body),
    ])
}

fn ones(samples: i64) -> Expr {
    Expr::call("ones", vec![Expr::int(samples)])
}

fn warning_kinds(body: Vec<Stmt>) -> Vec<TimingWarningKind> {
    let (_, report) = resolve(on_frame1(body));
    check_timing(&report, &TimingConfig::default())
        .iter()
        .map(|w| w.kind())
        .collect()
}

#[test]
fn short_misaligned_waveform_gets_both_warnings() {
    assert_eq!(
        warning_kinds(vec![play("frame1", ones(20))]),
        vec![
            TimingWarningKind::BelowMinimumLength { minimum: 32 },
            TimingWarningKind::Misaligned { granularity: 16 },
        ]
    );
}

#[test]
fn aligned_waveform_is_accepted() {
    assert!(warning_kinds(vec![play("frame1", ones(48))]).is_empty());
}

#[test]
fn misaligned_delay_is_reported() {
    assert_eq!(
        warning_kinds(vec![delay(dt(40.0), &["frame1"])]),
        vec![TimingWarningKind::Misaligned { granularity: 16 }]
    );
}

#[test]
fn zero_duration_is_exempt() {
    assert!(warning_kinds(vec![delay(dt(0.0), &["frame1"])]).is_empty());
}

#[test]
fn loop_reports_each_statement_once() {
    let (_, report) = resolve(on_frame1(vec![for_range(
        "i",
        0,
        3,
        vec![play("frame1", ones(20))],
    )]));
    assert_eq!(report.events.len(), 4);
    assert_eq!(check_timing(&report, &TimingConfig::default()).len(), 2);
}

#[test]
fn configured_constraints_are_used() {
    let (_, report) = resolve(on_frame1(vec![play("frame1", ones(20))]));
    let config = TimingConfig {
        minimum_length: 16,
        granularity: 4,
    };
    assert!(check_timing(&report, &config).is_empty());
}

#[test]
fn warnings_point_at_their_statement() {
    let (program, report) = resolve(on_frame1(vec![
        play("frame1", ones(48)),
        delay(dt(8.0), &["frame1"]),
    ]));
    let warnings = check_timing(&report, &TimingConfig::default());
    let delay_id = report.events[1].stmt;
    assert!(warnings.iter().all(|w| w.stmt() == delay_id && w.duration() == 8));
    assert_eq!(warnings.len(), 2);
    assert_eq!(program.stmts().len(), 3);
}

#[test]
fn shots_default_to_one() {
    let (program, report) = resolve(two_variable_delays());
    let summary = analyze_program(&program, &report);
    assert_eq!(summary.shots, ShotsSignature::default());
    assert_eq!(summary.repetitions, 1);
    assert_eq!(summary.max_measure_delay, None);
    assert_eq!(summary.frame_elapsed.get("frame1"), Some(&8));
}

#[test]
fn shots_and_steps_are_read_from_constants() {
    let steps = DeclareClassical::new(
        id("n_steps"),
        Type::Array(Box::new(Type::Int(None, IsConst::True)), 2),
        Some(Expr::ArrayLiteral(vec![Expr::int(5), Expr::int(3)])),
    )
    .to_stmt();
    let (program, report) = resolve(Program::from_stmts(vec![const_int("n_shots", 1000), steps]));
    let summary = analyze_program(&program, &report);
    assert_eq!(
        summary.shots,
        ShotsSignature {
            shots: 1000,
            steps: vec![5, 3],
        }
    );
}

#[test]
fn repetitions_multiply_along_loop_nests() {
    let inner = for_range("j", 0, 2, vec![delay(dt(32.0), &["frame1"])]);
    let (program, report) = resolve(on_frame1(vec![
        for_range("i", 0, 1, vec![inner]),
        for_range("k", 0, 4, vec![delay(dt(32.0), &["frame1"])]),
    ]));
    let summary = analyze_program(&program, &report);
    assert_eq!(summary.repetitions, 6);
    assert_eq!(report.clock("frame1"), Some((6 + 5) * 32));
}

#[test]
fn max_measure_delay_counts_invoked_defcals() {
    let (program, report) = resolve(Program::from_stmts(vec![
        grammar(),
        cal(vec![port("ro"), frame("readout", "ro")]),
        measure_defcal(
            0,
            vec![
                delay(dt(96.0), &["readout"]),
                capture("readout", ones(64)),
            ],
        ),
        measure_defcal(1, vec![delay(dt(512.0), &["readout"])]),
        measure(0),
    ]));
    let summary = analyze_program(&program, &report);
    assert_eq!(summary.max_measure_delay, Some(96));
}
