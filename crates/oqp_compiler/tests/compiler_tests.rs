// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use oqp_compiler::{CompileCache, Compiler, CompilerConfig};
use oqp_passes::{EliminationPolicy, TimingWarningKind};
use oqp_semantics::asg::*;
use oqp_semantics::inputs::{InputValue, Inputs};
use oqp_semantics::semantic_error::SemanticErrorKind;
use oqp_semantics::types::{IsConst, Type};
use oqp_setup::{Core, CoreKind, SetupConfig};

const SETUP: &str = r#"{
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

fn setup() -> SetupConfig {
    SetupConfig::from_json(SETUP).unwrap()
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(name: &str) -> Identifier {
    Identifier::new(name)
}

fn cal(stmts: Vec<Stmt>) -> Stmt {
    StmtKind::Cal(Block::new(stmts)).to_stmt()
}

fn grammar() -> Stmt {
    StmtKind::CalibrationGrammar("openpulse".into()).to_stmt()
}

fn port(name: &str) -> Stmt {
    DeclarePort::new(id(name)).to_stmt()
}

fn frame(name: &str, port: &str) -> Stmt {
    DeclareFrame::new(id(name), id(port), Expr::float(5e9), Expr::float(0.0)).to_stmt()
}

fn ns(value: f64) -> Expr {
    Expr::duration(value, TimeUnit::NanoSecond)
}

fn two_delays() -> Program {
    Program::from_stmts(vec![
        grammar(),
        cal(vec![
            port("ch1"),
            port("ch2"),
            frame("frame1", "ch1"),
            frame("frame2", "ch2"),
        ]),
        cal(vec![
            Delay::new(ns(4.0), vec![id("frame1")]).to_stmt(),
            Delay::new(ns(2.0), vec![id("frame2")]).to_stmt(),
            Barrier::new(Some(vec![id("frame1"), id("frame2")])).to_stmt(),
        ]),
    ])
}

fn measure_defcal(qubit: u32, body: Stmt) -> Stmt {
    DefCal::new(
        id("measure"),
        vec![],
        vec![QubitOperand::Hardware(qubit)],
        None,
        Block::new(vec![body]),
    )
    .to_stmt()
}

fn measure(qubit: u32) -> Stmt {
    GateCall::new(id("measure"), vec![], vec![QubitOperand::Hardware(qubit)]).to_stmt()
}

fn split_measure() -> Program {
    let gauss = Expr::call(
        "gauss",
        vec![Expr::int(64), Expr::float(0.5), Expr::int(32), Expr::float(8.0)],
    );
    let decls = vec![
        port("ch1"),
        port("ro"),
        frame("drive", "ch1"),
        frame("readout", "ro"),
        DeclareWaveform::new(id("drive_wf"), gauss).to_stmt(),
        DeclareWaveform::new(id("readout_wf"), Expr::call("ones", vec![Expr::int(128)])).to_stmt(),
    ];
    Program::from_stmts(vec![
        grammar(),
        cal(decls),
        measure_defcal(0, PulseOp::new(id("drive"), Expr::ident("drive_wf")).to_play_stmt()),
        measure_defcal(
            1,
            PulseOp::new(id("readout"), Expr::ident("readout_wf")).to_capture_stmt(),
        ),
        DefStmt::new(
            id("measure_all"),
            vec![],
            None,
            Block::new(vec![
                measure(0),
                Barrier::new(Some(vec![id("drive"), id("readout")])).to_stmt(),
                measure(1),
            ]),
        )
        .to_stmt(),
        StmtKind::ExprStmt(Expr::call("measure_all", vec![])).to_stmt(),
    ])
}

fn input_delay() -> Program {
    Program::from_stmts(vec![
        grammar(),
        IODeclaration::new(id("wait"), Type::Duration(IsConst::False)).to_input_stmt(),
        cal(vec![port("ch1"), frame("frame1", "ch1")]),
        cal(vec![Delay::new(Expr::ident("wait"), vec![id("frame1")]).to_stmt()]),
    ])
}

fn compile(program: Program, config: CompilerConfig, inputs: &Inputs) -> oqp_compiler::Compilation {
    init_logger();
    Compiler::new(config).compile(program, &setup(), inputs)
}

fn error_kind(compilation: &oqp_compiler::Compilation) -> &SemanticErrorKind {
    assert!(compilation.any_errors());
    assert!(compilation.cores.is_empty());
    compilation.diagnostics.errors[0].kind()
}

#[test]
fn split_measure_compiles_per_core() {
    let compilation = compile(split_measure(), CompilerConfig::default(), &Inputs::new());
    assert!(compilation.diagnostics.is_empty());
    let cores: Vec<&Core> = compilation.cores.keys().collect();
    assert_eq!(
        cores,
        vec![
            &Core::new("hdawg1", 1, CoreKind::Output),
            &Core::new("shfqa1", 1, CoreKind::Input),
        ]
    );

    let drive = compilation
        .core(&Core::new("hdawg1", 1, CoreKind::Output))
        .unwrap();
    assert_eq!(drive.elimination.removed, vec!["readout_wf", "call `measure $1`"]);
    assert_eq!(drive.command_table.len(), 1);
    assert_eq!(drive.command_table.entries()[0].samples, 64);
    let mut indices = Vec::new();
    walk_stmts(drive.program.stmts(), &mut |stmt| {
        if let StmtKind::DeclareWaveform(decl) = stmt.kind() {
            indices.push((decl.name.name().to_string(), decl.table_index()));
        }
    });
    assert_eq!(indices, vec![("drive_wf".to_string(), Some(0))]);

    let readout = compilation
        .core(&Core::new("shfqa1", 1, CoreKind::Input))
        .unwrap();
    assert_eq!(readout.command_table.entries()[0].samples, 128);
    assert_eq!(compilation.report.frame_elapsed.get("drive"), Some(&64));
    assert_eq!(compilation.report.frame_elapsed.get("readout"), Some(&192));
}

#[test]
fn short_delays_are_warned_about() {
    let compilation = compile(two_delays(), CompilerConfig::default(), &Inputs::new());
    assert!(!compilation.any_errors());
    assert_eq!(compilation.cores.len(), 2);
    let kinds: Vec<TimingWarningKind> =
        compilation.diagnostics.warnings.iter().map(|w| w.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TimingWarningKind::BelowMinimumLength { minimum: 32 },
            TimingWarningKind::Misaligned { granularity: 16 },
            TimingWarningKind::BelowMinimumLength { minimum: 32 },
            TimingWarningKind::Misaligned { granularity: 16 },
        ]
    );
}

#[test]
fn strict_mode_promotes_warnings() {
    let config = CompilerConfig {
        warnings_as_errors: true,
        ..CompilerConfig::default()
    };
    let compilation = compile(two_delays(), config, &Inputs::new());
    assert_eq!(error_kind(&compilation), &SemanticErrorKind::WarningsPromoted(4));
    assert_eq!(compilation.diagnostics.warnings.len(), 4);
}

#[test]
fn unsupplied_input_duration_is_unresolved() {
    let compilation = compile(input_delay(), CompilerConfig::default(), &Inputs::new());
    assert!(matches!(
        error_kind(&compilation),
        SemanticErrorKind::UnresolvedDuration(_)
    ));
}

#[test]
fn supplied_input_duration_is_used() {
    let mut inputs = Inputs::new();
    inputs.insert("wait".to_string(), InputValue::Float(16e-9));
    let compilation = compile(input_delay(), CompilerConfig::default(), &inputs);
    assert!(compilation.diagnostics.is_empty());
    assert_eq!(compilation.report.frame_elapsed.get("frame1"), Some(&32));
}

#[test]
fn output_declarations_are_rejected() {
    let program = Program::from_stmts(vec![IODeclaration::new(
        id("result"),
        Type::Int(None, IsConst::False),
    )
    .to_output_stmt()]);
    let compilation = compile(program, CompilerConfig::default(), &Inputs::new());
    assert!(matches!(
        error_kind(&compilation),
        SemanticErrorKind::InvalidInput(_)
    ));
}

#[test]
fn unmapped_port_is_an_error() {
    init_logger();
    let setup = SetupConfig::from_json(
        r#"{
            "Instruments": { "hdawg1": { "type": "HDAWG8", "serial": "DEV8835" } },
            "Ports": { "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 1, "channels": [1] } } }
        }"#,
    )
    .unwrap();
    let compilation =
        Compiler::new(CompilerConfig::default()).compile(split_measure(), &setup, &Inputs::new());
    assert_eq!(
        error_kind(&compilation),
        &SemanticErrorKind::MissingSetupMapping("ro".to_string())
    );
}

#[test]
fn bounded_elimination_is_configurable() {
    let config = CompilerConfig {
        elimination: EliminationPolicy::Bounded(1),
        ..CompilerConfig::default()
    };
    let compilation = compile(split_measure(), config, &Inputs::new());
    for core in compilation.cores.values() {
        assert_eq!(core.elimination.passes, 1);
        assert!(!core.elimination.converged);
    }
}

#[test]
fn cache_returns_the_stored_compilation() {
    init_logger();
    let setup = setup();
    let compiler = Compiler::new(CompilerConfig::default());
    let mut cache = CompileCache::new();

    let first = cache
        .compile(&compiler, split_measure(), &setup, &Inputs::new())
        .unwrap();
    let second = cache
        .compile(&compiler, split_measure(), &setup, &Inputs::new())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!((cache.hits(), cache.misses(), cache.len()), (1, 1, 1));

    let strict = Compiler::new(CompilerConfig {
        verify_split: false,
        ..CompilerConfig::default()
    });
    cache
        .compile(&strict, split_measure(), &setup, &Inputs::new())
        .unwrap();
    assert_eq!((cache.hits(), cache.misses(), cache.len()), (1, 2, 2));
}

#[test]
fn failed_compilations_are_not_cached() {
    init_logger();
    let compiler = Compiler::new(CompilerConfig::default());
    let mut cache = CompileCache::new();
    let compilation = cache
        .compile(&compiler, input_delay(), &setup(), &Inputs::new())
        .unwrap();
    assert!(compilation.any_errors());
    assert!(cache.is_empty());
}

#[test]
fn frame_argument_calls_compile_per_core() {
    let program = Program::from_stmts(vec![
        grammar(),
        cal(vec![
            port("ch1"),
            port("ro"),
            frame("drive", "ch1"),
            frame("readout", "ro"),
        ]),
        DefCal::new(
            id("pulse"),
            vec![Param::new(id("f"), Type::Frame)],
            vec![QubitOperand::Hardware(0)],
            None,
            Block::new(vec![Delay::new(ns(32.0), vec![id("f")]).to_stmt()]),
        )
        .to_stmt(),
        GateCall::new(
            id("pulse"),
            vec![Expr::ident("drive")],
            vec![QubitOperand::Hardware(0)],
        )
        .to_stmt(),
        cal(vec![Delay::new(ns(32.0), vec![id("readout")]).to_stmt()]),
    ]);
    let compilation = compile(program, CompilerConfig::default(), &Inputs::new());
    assert!(compilation.diagnostics.is_empty());
    assert_eq!(compilation.cores.len(), 2);
    assert_eq!(compilation.report.frame_elapsed.get("drive"), Some(&64));
    let readout = compilation
        .core(&Core::new("shfqa1", 1, CoreKind::Input))
        .unwrap();
    assert_eq!(readout.elimination.removed, vec!["pulse"]);
}
