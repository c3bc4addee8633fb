// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;
use oqp_passes::command_table::{assign_resources, DEFAULT_CAPACITY};
use oqp_passes::duration::{resolve_durations, ClockReport};
use oqp_passes::waveform::WaveformKey;
use oqp_semantics::asg::*;
use oqp_semantics::builtins::GeneratorRegistry;
use oqp_semantics::semantic_error::SemanticErrorKind;

fn resolve(program: Program) -> (Program, ClockReport) {
    init_logger();
    let mut program = analyzed(program);
    let report = resolve_durations(&mut program, &GeneratorRegistry::zi(), SAMPLE_RATE).unwrap();
    (program, report)
}

fn with_frame(body: Vec<Stmt>) -> Program {
    let mut decls = vec![port("ch1"), frame("frame1", "ch1")];
    decls.extend(body);
    Program::from_stmts(vec![grammar(), cal(decls)])
}

fn table_indices(program: &Program) -> Vec<(String, Option<u16>)> {
    let mut indices = Vec::new();
    walk_stmts(program.stmts(), &mut |stmt| {
        if let StmtKind::DeclareWaveform(decl) = stmt.kind() {
            indices.push((decl.name.name().to_string(), decl.table_index()));
        }
    });
    indices
}

#[test]
fn equal_waveforms_share_an_entry() {
    let (mut program, report) = resolve(with_frame(vec![
        waveform("a", gauss(64)),
        waveform("b", gauss(64)),
        waveform("c", Expr::call("ones", vec![Expr::int(32)])),
        play("frame1", Expr::ident("a")),
        play("frame1", Expr::ident("b")),
    ]));
    let table = assign_resources(&mut program, &report, DEFAULT_CAPACITY).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table_indices(&program),
        vec![
            ("a".to_string(), Some(0)),
            ("b".to_string(), Some(0)),
            ("c".to_string(), Some(1)),
        ]
    );
    let key = WaveformKey::generated("gauss", &["64.0", "0.5", "32.0", "8.0"].map(String::from));
    assert_eq!(table.get(&key), Some(0));
    assert_eq!(table.entries()[1].samples, 32);
}

#[test]
fn placeholders_are_distinct_by_name() {
    let placeholder = || Expr::call("placeholder", vec![Expr::int(64)]);
    let (mut program, report) = resolve(with_frame(vec![
        waveform("p", placeholder()),
        waveform("q", placeholder()),
    ]));
    let table = assign_resources(&mut program, &report, DEFAULT_CAPACITY).unwrap();
    let keys: Vec<&str> = table.entries().iter().map(|e| e.waveform.as_str()).collect();
    assert_eq!(keys, vec!["placeholder:p", "placeholder:q"]);
}

#[test]
fn inline_waveforms_get_entries() {
    let (mut program, report) = resolve(with_frame(vec![
        play("frame1", Expr::call("ones", vec![Expr::int(32)])),
        capture("frame1", Expr::ArrayLiteral(vec![Expr::float(0.5); 16])),
    ]));
    let table = assign_resources(&mut program, &report, DEFAULT_CAPACITY).unwrap();
    let samples: Vec<u64> = table.entries().iter().map(|e| e.samples).collect();
    assert_eq!(samples, vec![32, 16]);
    assert_eq!(table.entries()[0].index, 0);
    assert_eq!(table.entries()[1].index, 1);
}

#[test]
fn waveforms_in_loops_are_assigned_once_per_value() {
    // for int i in [1:3] { play(frame1, ones(i * 16)); }
    let body = vec![play(
        "frame1",
        Expr::call(
            "ones",
            vec![Expr::binary(
                BinaryOp::ArithOp(ArithOp::Mul),
                Expr::ident("i"),
                Expr::int(16),
            )],
        ),
    )];
    let (mut program, report) = resolve(with_frame(vec![for_range("i", 1, 3, body)]));
    let table = assign_resources(&mut program, &report, DEFAULT_CAPACITY).unwrap();
    let samples: Vec<u64> = table.entries().iter().map(|e| e.samples).collect();
    assert_eq!(samples, vec![16, 32, 48]);
}

#[test]
fn table_overflow_is_an_error() {
    let waveforms: Vec<Stmt> = (1..=DEFAULT_CAPACITY as i64 + 1)
        .map(|n| waveform(&format!("w{n}"), Expr::call("ones", vec![Expr::int(n)])))
        .collect();
    let (mut program, report) = resolve(with_frame(waveforms));
    let err = assign_resources(&mut program, &report, DEFAULT_CAPACITY).unwrap_err();
    assert_eq!(
        err.kind(),
        &SemanticErrorKind::CommandTableCapacityExceeded {
            capacity: DEFAULT_CAPACITY
        }
    );
}

#[test]
fn table_at_capacity_is_accepted() {
    let waveforms: Vec<Stmt> = (1..=4)
        .map(|n| waveform(&format!("w{n}"), Expr::call("ones", vec![Expr::int(n)])))
        .collect();
    let (mut program, report) = resolve(with_frame(waveforms));
    let table = assign_resources(&mut program, &report, 4).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.capacity(), 4);
}
