// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;
use oqp_passes::duration::{resolve_durations, ClockReport, TimedKind};
use oqp_passes::timing::TimingWarningKind;
use oqp_semantics::asg::*;
use oqp_semantics::builtins::GeneratorRegistry;
use oqp_semantics::semantic_error::SemanticErrorKind;
use oqp_semantics::types::{IsConst, Type};

fn resolve(program: &mut Program) -> ClockReport {
    init_logger();
    resolve_durations(program, &GeneratorRegistry::zi(), SAMPLE_RATE).unwrap()
}

fn resolve_err(program: Program) -> SemanticErrorKind {
    let mut program = analyzed(program);
    resolve_durations(&mut program, &GeneratorRegistry::zi(), SAMPLE_RATE)
        .unwrap_err()
        .kind()
        .clone()
}

fn frames_cal(frames: &[(&str, &str)]) -> Stmt {
    let mut stmts: Vec<Stmt> = frames.iter().map(|(_, p)| port(p)).collect();
    stmts.extend(frames.iter().map(|(f, p)| frame(f, p)));
    cal(stmts)
}

fn program_with(body: Vec<Stmt>) -> Program {
    Program::from_stmts(vec![
        grammar(),
        frames_cal(&[("frame1", "ch1"), ("frame2", "ch2")]),
        cal(body),
    ])
}

fn find<'a>(program: &'a Program, pred: impl Fn(&Stmt) -> bool) -> Vec<&'a Stmt> {
    let mut found = Vec::new();
    walk_stmts(program.stmts(), &mut |stmt| {
        if pred(stmt) {
            found.push(stmt);
        }
    });
    found
}

#[test]
fn two_variable_delays_are_equalized_at_the_barrier() {
    let mut program = analyzed(two_variable_delays());
    let report = resolve(&mut program);
    // 4ns at 2 GSa/s.
    assert_eq!(report.clock("frame1"), Some(8));
    assert_eq!(report.clock("frame2"), Some(8));

    let delays = find(&program, |s| matches!(s.kind(), StmtKind::Delay(_)));
    let durations: Vec<_> = delays.iter().map(|s| s.duration()).collect();
    assert_eq!(
        durations,
        vec![Some(ResolvedDuration::fixed(8)), Some(ResolvedDuration::fixed(4))]
    );

    let barriers = find(&program, |s| matches!(s.kind(), StmtKind::Barrier(_)));
    let StmtKind::Barrier(barrier) = barriers[0].kind() else {
        unreachable!()
    };
    assert_eq!(barrier.sync_times(), &[8]);
    // frame2 waited 4 samples.
    assert_eq!(barriers[0].duration(), Some(ResolvedDuration::fixed(4)));
    assert_eq!(report.barriers[0].padding, 4);
}

#[test]
fn unsupplied_input_duration_is_unresolved() {
    assert!(matches!(
        resolve_err(unresolved_input()),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}

#[test]
fn unqualified_barrier_synchronizes_every_frame() {
    let mut program = analyzed(program_with(vec![
        delay(dt(32.0), &["frame1"]),
        StmtKind::Barrier(Barrier::new(None)).to_stmt(),
        delay(dt(16.0), &["frame2"]),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(32));
    assert_eq!(report.clock("frame2"), Some(48));
}

#[test]
fn delay_without_frames_delays_every_frame() {
    let mut program = analyzed(program_with(vec![
        delay(dt(32.0), &["frame1"]),
        delay(dt(16.0), &[]),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(48));
    assert_eq!(report.clock("frame2"), Some(16));
}

#[test]
fn play_takes_the_waveform_length() {
    let mut program = analyzed(program_with(vec![
        play("frame1", gauss(64)),
        play(
            "frame2",
            Expr::binary(
                BinaryOp::ConcatenationOp,
                Expr::call("ones", vec![Expr::int(32)]),
                Expr::ArrayLiteral(vec![Expr::float(0.0); 16]),
            ),
        ),
        capture("frame1", Expr::call("placeholder", vec![Expr::int(96)])),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(160));
    assert_eq!(report.clock("frame2"), Some(48));
    let kinds: Vec<_> = report.events.iter().map(|e| (e.kind, e.start)).collect();
    assert_eq!(
        kinds,
        vec![
            (TimedKind::Play, 0),
            (TimedKind::Play, 0),
            (TimedKind::Capture, 64)
        ]
    );
    assert_eq!(report.waveforms.len(), 3);
}

#[test]
fn loops_are_iterated() {
    let mut program = analyzed(program_with(vec![for_range(
        "i",
        0,
        3,
        vec![delay(dt(32.0), &["frame1"])],
    )]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(128));
    let loops = find(&program, |s| matches!(s.kind(), StmtKind::ForStmt(_)));
    assert_eq!(loops[0].duration(), Some(ResolvedDuration::fixed(128)));
    assert_eq!(report.loop_trips.get(&loops[0].id()), Some(&4));
}

#[test]
fn loop_variable_feeds_durations() {
    // for int i in [1:3] { delay[i * 16dt] frame1; }
    let body = vec![delay(
        Expr::binary(BinaryOp::ArithOp(ArithOp::Mul), Expr::ident("i"), dt(16.0)),
        &["frame1"],
    )];
    let mut program = analyzed(program_with(vec![for_range("i", 1, 3, body)]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(96));
    let delays = find(&program, |s| matches!(s.kind(), StmtKind::Delay(_)));
    assert_eq!(
        delays[0].duration(),
        Some(ResolvedDuration { min: 16, max: 48 })
    );
}

#[test]
fn constants_are_folded() {
    let mut program = Program::from_stmts(vec![
        grammar(),
        DeclareClassical::new(
            id("wait"),
            Type::Duration(IsConst::True),
            Some(ns(100.0)),
        )
        .to_stmt(),
        frames_cal(&[("frame1", "ch1")]),
        cal(vec![delay(
            Expr::binary(BinaryOp::ArithOp(ArithOp::Mul), Expr::int(2), Expr::ident("wait")),
            &["frame1"],
        )]),
    ]);
    program = analyzed(program);
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(400));
}

#[test]
fn defcal_arguments_are_bound() {
    let pulse = DefCal::new(
        id("pulse"),
        vec![Param::new(id("n"), int_type())],
        vec![QubitOperand::Hardware(0)],
        None,
        Block::new(vec![play(
            "frame1",
            Expr::call("ones", vec![Expr::ident("n")]),
        )]),
    )
    .to_stmt();
    let call = |n| GateCall::new(id("pulse"), vec![Expr::int(n)], vec![QubitOperand::Hardware(0)]);
    let mut program = analyzed(Program::from_stmts(vec![
        grammar(),
        frames_cal(&[("frame1", "ch1")]),
        pulse,
        call(48).to_stmt(),
        call(32).to_stmt(),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(80));
    let calls = find(&program, |s| matches!(s.kind(), StmtKind::GateCall(_)));
    assert_eq!(calls[0].duration(), Some(ResolvedDuration::fixed(48)));
    assert_eq!(calls[1].duration(), Some(ResolvedDuration::fixed(32)));
    let plays = find(&program, |s| matches!(s.kind(), StmtKind::Play(_)));
    assert_eq!(plays[0].duration(), Some(ResolvedDuration { min: 32, max: 48 }));
}

#[test]
fn frame_parameters_follow_the_argument() {
    let pulse = DefCal::new(
        id("pulse"),
        vec![Param::new(id("f"), Type::Frame)],
        vec![QubitOperand::Hardware(0)],
        None,
        Block::new(vec![play("f", gauss(32))]),
    )
    .to_stmt();
    let mut program = analyzed(Program::from_stmts(vec![
        grammar(),
        frames_cal(&[("frame1", "ch1"), ("frame2", "ch2")]),
        pulse,
        GateCall::new(
            id("pulse"),
            vec![Expr::ident("frame2")],
            vec![QubitOperand::Hardware(0)],
        )
        .to_stmt(),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(0));
    assert_eq!(report.clock("frame2"), Some(32));
}

#[test]
fn recursion_is_unresolved() {
    let recursive = DefStmt::new(
        id("again"),
        vec![],
        None,
        Block::new(vec![StmtKind::ExprStmt(Expr::call("again", vec![])).to_stmt()]),
    )
    .to_stmt();
    let program = Program::from_stmts(vec![
        recursive,
        StmtKind::ExprStmt(Expr::call("again", vec![])).to_stmt(),
    ]);
    let SemanticErrorKind::UnresolvedDuration(message) = resolve_err(program) else {
        panic!("recursion must be unresolved");
    };
    assert!(message.contains("recursive"));
}

fn dynamic_if(then_samples: f64, else_samples: f64) -> Program {
    Program::from_stmts(vec![
        grammar(),
        IODeclaration::new(id("flag"), Type::Bool(IsConst::False)).to_input_stmt(),
        frames_cal(&[("frame1", "ch1")]),
        cal(vec![If::new(
            Expr::ident("flag"),
            Block::new(vec![delay(dt(then_samples), &["frame1"])]),
            Some(Block::new(vec![delay(dt(else_samples), &["frame1"])])),
        )
        .to_stmt()]),
    ])
}

#[test]
fn dynamic_if_with_equal_branches_is_resolved() {
    let mut program = analyzed(dynamic_if(32.0, 32.0));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(32));
}

#[test]
fn dynamic_if_with_unequal_branches_is_unresolved() {
    assert!(matches!(
        resolve_err(dynamic_if(32.0, 16.0)),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}

#[test]
fn static_if_takes_one_branch() {
    let mut program = analyzed(program_with(vec![If::new(
        Expr::binary(BinaryOp::CmpOp(CmpOp::Lt), Expr::int(1), Expr::int(2)),
        Block::new(vec![delay(dt(32.0), &["frame1"])]),
        Some(Block::new(vec![delay(dt(16.0), &["frame1"])])),
    )
    .to_stmt()]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(32));
}

#[test]
fn while_with_timed_body_is_unresolved() {
    let program = Program::from_stmts(vec![
        grammar(),
        IODeclaration::new(id("flag"), Type::Bool(IsConst::False)).to_input_stmt(),
        frames_cal(&[("frame1", "ch1")]),
        cal(vec![While::new(
            Expr::ident("flag"),
            Block::new(vec![delay(dt(32.0), &["frame1"])]),
        )
        .to_stmt()]),
    ]);
    assert!(matches!(
        resolve_err(program),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}

#[test]
fn non_integral_durations_are_rounded_with_a_warning() {
    let mut program = analyzed(program_with(vec![delay(ns(1.0), &["frame1"])]));
    init_logger();
    let report = resolve_durations(&mut program, &GeneratorRegistry::zi(), 2.4e9).unwrap();
    assert_eq!(report.clock("frame1"), Some(2));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0].kind(),
        TimingWarningKind::NonIntegralDuration
    );
}

#[test]
fn frame_updates_take_no_time() {
    let mut program = analyzed(program_with(vec![
        FrameUpdate::new(FrameOp::ShiftPhase, id("frame1"), Expr::float(0.5)).to_stmt(),
        FrameUpdate::new(FrameOp::SetFrequency, id("frame1"), Expr::float(6e9)).to_stmt(),
    ]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(0));
    let state = report.frame_states["frame1"];
    assert_eq!(state.frequency, Some(6e9));
    assert_eq!(state.phase, Some(0.5));
}

#[test]
fn range_ending_at_the_largest_integer_is_iterated() {
    let mut program = analyzed(program_with(vec![for_range(
        "i",
        i64::MAX - 1,
        i64::MAX,
        vec![delay(dt(16.0), &["frame1"])],
    )]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(32));
}

#[test]
fn timed_loop_with_too_many_trips_is_unresolved() {
    let program = program_with(vec![for_range(
        "i",
        0,
        i64::MAX,
        vec![delay(dt(16.0), &["frame1"])],
    )]);
    assert!(matches!(
        resolve_err(program),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}

#[test]
fn untimed_loop_with_too_many_trips_is_skipped() {
    let mut program = analyzed(program_with(vec![for_range("i", 0, i64::MAX, vec![])]));
    let report = resolve(&mut program);
    assert_eq!(report.clock("frame1"), Some(0));
}

#[test]
fn clock_overflow_is_unresolved() {
    let program = program_with(vec![
        delay(dt(1.6e19), &["frame1"]),
        delay(dt(1.6e19), &["frame1"]),
    ]);
    assert!(matches!(
        resolve_err(program),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}
