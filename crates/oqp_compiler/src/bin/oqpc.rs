// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use oqp_compiler::{inputs_from_json, Compilation, Compiler, CompilerConfig};
use oqp_semantics::asg::*;
use oqp_semantics::inputs::Inputs;
use oqp_semantics::types::{IsConst, Type};
use oqp_setup::SetupConfig;

#[derive(Parser)]
#[command(name = "oqpc")]
#[command(about = "Demo of the OpenPulse multi-core compiler on built-in programs.")]
#[command(long_about = "
Demo of the OpenPulse multi-core compiler on built-in programs.

Parsing OpenPulse text is not part of this compiler, so the demo compiles programs
built in. `print` shows a program. `compile` splits it for the cores of a setup and
prints the program, elimination report and command table of each core.
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a built-in program
    Print {
        #[arg(value_enum)]
        demo: Demo,
    },

    /// Compile a built-in program
    Compile {
        #[arg(value_enum)]
        demo: Demo,

        /// Setup JSON file. A two-instrument setup is used if omitted.
        #[arg(long, value_name = "FILENAME")]
        setup: Option<PathBuf>,

        /// JSON object of input values
        #[arg(long, value_name = "FILENAME")]
        inputs: Option<PathBuf>,

        /// Compiler configuration JSON file
        #[arg(long, value_name = "FILENAME")]
        config: Option<PathBuf>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Demo {
    /// Two frames delayed by different amounts, then synchronized
    TwoDelays,
    /// A measurement split between a drive core and a readout core
    SplitMeasure,
    /// A delay whose length is an `input`
    InputDelay,
}

const DEFAULT_SETUP: &str = r#"{
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

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Print { demo } => {
            print!("{}", demo_program(demo));
            ExitCode::SUCCESS
        }

        Commands::Compile {
            demo,
            setup,
            inputs,
            config,
            json,
        } => match compile(demo, setup, inputs, config) {
            Ok(compilation) => {
                print_compilation(&compilation, json);
                if compilation.any_errors() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn compile(
    demo: Demo,
    setup: Option<PathBuf>,
    inputs: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<Compilation, String> {
    let setup = match setup {
        Some(path) => SetupConfig::from_path(path),
        None => SetupConfig::from_json(DEFAULT_SETUP),
    }
    .map_err(|err| err.to_string())?;
    let inputs = match inputs {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
            inputs_from_json(&json).map_err(|err| err.to_string())?
        }
        None => Inputs::new(),
    };
    let config = match config {
        Some(path) => CompilerConfig::from_path(path).map_err(|err| err.to_string())?,
        None => CompilerConfig::default(),
    };
    let compiler = Compiler::new(config);
    Ok(compiler.compile(demo_program(demo), &setup, &inputs))
}

fn print_compilation(compilation: &Compilation, json: bool) {
    // Demo programs have no source text to point into.
    for error in compilation.diagnostics.errors.iter() {
        eprintln!("error: {}", error.message());
    }
    for warning in compilation.diagnostics.warnings.iter() {
        eprintln!("warning: {warning}");
    }
    if compilation.any_errors() {
        return;
    }
    if json {
        let report = serde_json::json!({
            "report": compilation.report,
            "cores": compilation.cores.values().map(|core| serde_json::json!({
                "core": core.core,
                "elimination": core.elimination,
                "command_table": core.command_table,
            })).collect::<Vec<_>>(),
        });
        println!("{report:#}");
        return;
    }
    println!("{:#?}", compilation.report);
    for core in compilation.cores.values() {
        println!("// {}", core.core);
        print!("{}", core.program);
        println!("// removed: {:?}", core.elimination.removed);
        for entry in core.command_table.entries() {
            println!("// {:4} {} ({} samples)", entry.index, entry.waveform, entry.samples);
        }
        println!();
    }
}

fn id(name: &str) -> Identifier {
    Identifier::new(name)
}

fn frame(name: &str, port: &str) -> Stmt {
    DeclareFrame::new(id(name), id(port), Expr::float(5e9), Expr::float(0.0)).to_stmt()
}

fn cal(stmts: Vec<Stmt>) -> Stmt {
    StmtKind::Cal(Block::new(stmts)).to_stmt()
}

fn grammar() -> Stmt {
    StmtKind::CalibrationGrammar("openpulse".into()).to_stmt()
}

fn delay(duration: Expr, frame: &str) -> Stmt {
    Delay::new(duration, vec![id(frame)]).to_stmt()
}

fn barrier(frames: &[&str]) -> Stmt {
    Barrier::new(Some(frames.iter().map(|f| id(f)).collect())).to_stmt()
}

fn measure_defcal(qubit: u32, body: Vec<Stmt>) -> Stmt {
    DefCal::new(id("measure"), vec![], vec![QubitOperand::Hardware(qubit)], None, Block::new(body))
        .to_stmt()
}

fn measure(qubit: u32) -> Stmt {
    GateCall::new(id("measure"), vec![], vec![QubitOperand::Hardware(qubit)]).to_stmt()
}

fn demo_program(demo: Demo) -> Program {
    let ports = |names: &[&str]| -> Vec<Stmt> {
        names.iter().map(|name| DeclarePort::new(id(name)).to_stmt()).collect()
    };
    match demo {
        Demo::TwoDelays => {
            let mut decls = ports(&["ch1", "ch2"]);
            decls.extend([frame("frame1", "ch1"), frame("frame2", "ch2")]);
            Program::from_stmts(vec![
                grammar(),
                cal(decls),
                cal(vec![
                    delay(Expr::duration(4.0, TimeUnit::NanoSecond), "frame1"),
                    delay(Expr::duration(2.0, TimeUnit::NanoSecond), "frame2"),
                    barrier(&["frame1", "frame2"]),
                ]),
            ])
        }
        Demo::SplitMeasure => {
            let gauss = Expr::call(
                "gauss",
                vec![Expr::int(64), Expr::float(0.5), Expr::int(32), Expr::float(8.0)],
            );
            let mut decls = ports(&["ch1", "ro"]);
            decls.extend([
                frame("drive", "ch1"),
                frame("readout", "ro"),
                DeclareWaveform::new(id("drive_wf"), gauss).to_stmt(),
                DeclareWaveform::new(id("readout_wf"), Expr::call("ones", vec![Expr::int(128)]))
                    .to_stmt(),
            ]);
            Program::from_stmts(vec![
                grammar(),
                cal(decls),
                measure_defcal(
                    0,
                    vec![PulseOp::new(id("drive"), Expr::ident("drive_wf")).to_play_stmt()],
                ),
                measure_defcal(
                    1,
                    vec![PulseOp::new(id("readout"), Expr::ident("readout_wf")).to_capture_stmt()],
                ),
                DefStmt::new(
                    id("measure_all"),
                    vec![],
                    None,
                    Block::new(vec![measure(0), barrier(&["drive", "readout"]), measure(1)]),
                )
                .to_stmt(),
                StmtKind::ExprStmt(Expr::call("measure_all", vec![])).to_stmt(),
            ])
        }
        Demo::InputDelay => {
            let mut decls = ports(&["ch1"]);
            decls.push(frame("frame1", "ch1"));
            Program::from_stmts(vec![
                grammar(),
                IODeclaration::new(id("wait"), Type::Duration(IsConst::False)).to_input_stmt(),
                cal(decls),
                cal(vec![delay(Expr::ident("wait"), "frame1")]),
            ])
        }
    }
}
