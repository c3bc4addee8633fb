// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Programs shared by the pass tests, built the way a parser would build them.

#![allow(dead_code)]

use oqp_semantics::analyzer::analyze;
use oqp_semantics::asg::*;
use oqp_semantics::builtins::GeneratorRegistry;
use oqp_semantics::types::{IsConst, Type};
use oqp_setup::SetupConfig;

pub const SAMPLE_RATE: f64 = 2e9;

pub const SETUP: &str = r#"{
    "Instruments": {
        "hdawg1": { "type": "HDAWG8", "serial": "DEV8835" },
        "shfqa1": { "type": "SHFQA2", "serial": "DEV12345" }
    },
    "Ports": {
        "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 1, "channels": [1] } },
        "ch2": { "instrument": "hdawg1", "core": { "type": "HD", "index": 2, "channels": [1] } },
        "ro":  { "instrument": "shfqa1", "core": { "type": "QA", "index": 1, "channels": [1] } }
    }
}"#;

pub fn setup() -> SetupConfig {
    SetupConfig::from_json(SETUP).unwrap()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(name: &str) -> Identifier {
    Identifier::new(name)
}

pub fn ns(value: f64) -> Expr {
    Expr::duration(value, TimeUnit::NanoSecond)
}

pub fn dt(value: f64) -> Expr {
    Expr::duration(value, TimeUnit::Dt)
}

pub fn cal(stmts: Vec<Stmt>) -> Stmt {
    StmtKind::Cal(Block::new(stmts)).to_stmt()
}

pub fn grammar() -> Stmt {
    StmtKind::CalibrationGrammar("openpulse".into()).to_stmt()
}

pub fn port(name: &str) -> Stmt {
    DeclarePort::new(id(name)).to_stmt()
}

pub fn frame(name: &str, port: &str) -> Stmt {
    DeclareFrame::new(id(name), id(port), Expr::float(5e9), Expr::float(0.0)).to_stmt()
}

pub fn waveform(name: &str, value: Expr) -> Stmt {
    DeclareWaveform::new(id(name), value).to_stmt()
}

pub fn gauss(samples: i64) -> Expr {
    Expr::call(
        "gauss",
        vec![
            Expr::int(samples),
            Expr::float(0.5),
            Expr::int(samples / 2),
            Expr::float(8.0),
        ],
    )
}

pub fn delay(duration: Expr, frames: &[&str]) -> Stmt {
    Delay::new(duration, frames.iter().map(|f| id(f)).collect()).to_stmt()
}

pub fn play(frame: &str, waveform: Expr) -> Stmt {
    PulseOp::new(id(frame), waveform).to_play_stmt()
}

pub fn capture(frame: &str, waveform: Expr) -> Stmt {
    PulseOp::new(id(frame), waveform).to_capture_stmt()
}

pub fn barrier(frames: &[&str]) -> Stmt {
    Barrier::new(Some(frames.iter().map(|f| id(f)).collect())).to_stmt()
}

pub fn int_type() -> Type {
    Type::Int(None, IsConst::False)
}

pub fn const_int(name: &str, value: i64) -> Stmt {
    DeclareClassical::new(id(name), Type::Int(None, IsConst::True), Some(Expr::int(value)))
        .to_stmt()
}

pub fn for_range(var: &str, start: i64, stop: i64, body: Vec<Stmt>) -> Stmt {
    ForStmt::new(
        id(var),
        int_type(),
        ForIterable::Range {
            start: Expr::int(start),
            step: None,
            stop: Expr::int(stop),
        },
        Block::new(body),
    )
    .to_stmt()
}

pub fn measure_defcal(qubit: u32, body: Vec<Stmt>) -> Stmt {
    DefCal::new(
        id("measure"),
        vec![],
        vec![QubitOperand::Hardware(qubit)],
        None,
        Block::new(body),
    )
    .to_stmt()
}

pub fn measure(qubit: u32) -> Stmt {
    GateCall::new(id("measure"), vec![], vec![QubitOperand::Hardware(qubit)]).to_stmt()
}

pub fn analyzed(mut program: Program) -> Program {
    analyze(&mut program, &GeneratorRegistry::zi()).unwrap();
    program
}

// Two frames delayed by different amounts, then synchronized.
pub fn two_variable_delays() -> Program {
    Program::from_stmts(vec![
        grammar(),
        cal(vec![
            port("ch1"),
            port("ch2"),
            frame("frame1", "ch1"),
            frame("frame2", "ch2"),
        ]),
        cal(vec![
            delay(ns(4.0), &["frame1"]),
            delay(ns(2.0), &["frame2"]),
            barrier(&["frame1", "frame2"]),
        ]),
    ])
}

// `measure $0` drives `ch1`, `measure $1` reads out on `ro`. Both are invoked through
// one subroutine, so after splitting each core only keeps its own calibration.
pub fn split_measure() -> Program {
    Program::from_stmts(vec![
        grammar(),
        cal(vec![
            port("ch1"),
            port("ro"),
            frame("drive", "ch1"),
            frame("readout", "ro"),
            waveform("drive_wf", gauss(64)),
            waveform("readout_wf", Expr::call("ones", vec![Expr::int(128)])),
        ]),
        measure_defcal(0, vec![play("drive", Expr::ident("drive_wf"))]),
        measure_defcal(1, vec![capture("readout", Expr::ident("readout_wf"))]),
        DefStmt::new(
            id("measure_all"),
            vec![],
            None,
            Block::new(vec![
                measure(0),
                barrier(&["drive", "readout"]),
                measure(1),
            ]),
        )
        .to_stmt(),
        StmtKind::ExprStmt(Expr::call("measure_all", vec![])).to_stmt(),
    ])
}

// A delay whose length is a program input that is never supplied.
pub fn unresolved_input() -> Program {
    Program::from_stmts(vec![
        grammar(),
        IODeclaration::new(id("wait"), Type::Duration(IsConst::False)).to_input_stmt(),
        cal(vec![port("ch1"), frame("frame1", "ch1")]),
        cal(vec![delay(Expr::ident("wait"), &["frame1"])]),
    ])
}

fn drive_and_readout() -> Stmt {
    cal(vec![
        port("ch1"),
        port("ro"),
        frame("drive", "ch1"),
        frame("readout", "ro"),
    ])
}

// `pulse` takes its frame as a parameter and is only called on `drive`.
pub fn frame_parameter_call() -> Program {
    Program::from_stmts(vec![
        grammar(),
        drive_and_readout(),
        DefCal::new(
            id("pulse"),
            vec![Param::new(id("f"), Type::Frame)],
            vec![QubitOperand::Hardware(0)],
            None,
            Block::new(vec![delay(ns(32.0), &["f"])]),
        )
        .to_stmt(),
        GateCall::new(
            id("pulse"),
            vec![Expr::ident("drive")],
            vec![QubitOperand::Hardware(0)],
        )
        .to_stmt(),
        cal(vec![delay(ns(32.0), &["readout"])]),
    ])
}

// `double` computes a value and takes no time.
pub fn value_subroutine() -> Program {
    let twice = Expr::binary(
        BinaryOp::ArithOp(ArithOp::Mul),
        Expr::int(2),
        Expr::ident("a"),
    );
    Program::from_stmts(vec![
        grammar(),
        drive_and_readout(),
        DefStmt::new(
            id("double"),
            vec![Param::new(id("a"), int_type())],
            Some(int_type()),
            Block::new(vec![StmtKind::Return(Some(twice)).to_stmt()]),
        )
        .to_stmt(),
        StmtKind::ExprStmt(Expr::call("double", vec![Expr::int(3)])).to_stmt(),
        cal(vec![
            delay(ns(32.0), &["drive"]),
            delay(ns(32.0), &["readout"]),
        ]),
    ])
}
