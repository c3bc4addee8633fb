// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use crate::config::CompilerConfig;
use crate::diagnostics::Diagnostics;
use itertools::Itertools;
use oqp_passes::duration::ClockReport;
use oqp_passes::{
    analyze_program, assign_resources, check_timing, remove_unused, replay, resolve_durations,
    split_by_core, CommandTable, EliminationReport, ProgramReport, TimingWarning,
};
use oqp_semantics::analyzer::analyze;
use oqp_semantics::asg::Program;
use oqp_semantics::builtins::GeneratorRegistry;
use oqp_semantics::inputs::{resolve_inputs, Inputs};
use oqp_semantics::semantic_error::{SemanticError, SemanticErrorKind, SemanticResult};
use oqp_setup::{Core, Setup};
use oqp_source_file::{ErrorTrait, TextRange};
use std::collections::BTreeMap;

/// The program of one core, after elimination and resource assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreProgram {
    pub core: Core,
    pub program: Program,
    pub command_table: CommandTable,
    pub elimination: EliminationReport,
}

/// Result of compiling one program. If `diagnostics` has errors, `cores` is empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compilation {
    pub cores: BTreeMap<Core, CoreProgram>,
    pub report: ProgramReport,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn any_errors(&self) -> bool {
        self.diagnostics.any_errors()
    }

    pub fn core(&self, core: &Core) -> Option<&CoreProgram> {
        self.cores.get(core)
    }
}

pub struct Compiler {
    config: CompilerConfig,
    registry: GeneratorRegistry,
}

impl Compiler {
    /// A compiler with the ZI waveform generators.
    pub fn new(config: CompilerConfig) -> Compiler {
        Compiler::with_registry(config, GeneratorRegistry::zi())
    }

    pub fn with_registry(config: CompilerConfig, registry: GeneratorRegistry) -> Compiler {
        Compiler { config, registry }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Compile `program`, which has not been analyzed, for the cores of `setup`.
    pub fn compile(&self, program: Program, setup: &dyn Setup, inputs: &Inputs) -> Compilation {
        let mut compilation = Compilation::default();
        if let Err(err) = self.run(program, setup, inputs, &mut compilation) {
            log::debug!("compilation failed: {}", err.message());
            compilation.cores.clear();
            compilation.diagnostics.errors.push(err);
        }
        compilation
    }

    fn run(
        &self,
        mut program: Program,
        setup: &dyn Setup,
        inputs: &Inputs,
        compilation: &mut Compilation,
    ) -> SemanticResult<()> {
        let sample_rate = self.config.sample_rate;

        let resolved = resolve_inputs(&mut program, inputs)?;
        log::info!("resolved {} input(s)", resolved.len());
        analyze(&mut program, &self.registry)?;
        let clocks = resolve_durations(&mut program, &self.registry, sample_rate)?;
        log::info!("program takes {} samples", clocks.total_duration());

        let mut warnings = clocks.warnings.clone();
        warnings.extend(check_timing(&clocks, &self.config.timing));
        compilation.diagnostics.warnings = warnings;
        self.promote_warnings(&compilation.diagnostics.warnings)?;

        compilation.report = analyze_program(&program, &clocks);

        let split = split_by_core(&program, setup)?;
        log::info!("split into {}", split.keys().join(", "));
        for (core, core_program) in split {
            let compiled = self.compile_core(core.clone(), core_program, &clocks)?;
            compilation.cores.insert(core, compiled);
        }
        Ok(())
    }

    fn promote_warnings(&self, warnings: &[TimingWarning]) -> SemanticResult<()> {
        if !self.config.warnings_as_errors {
            return Ok(());
        }
        match warnings.first() {
            Some(first) => Err(SemanticError::new(
                SemanticErrorKind::WarningsPromoted(warnings.len()),
                ErrorTrait::range(first),
            )),
            None => Ok(()),
        }
    }

    fn compile_core(
        &self,
        core: Core,
        mut program: Program,
        clocks: &ClockReport,
    ) -> SemanticResult<CoreProgram> {
        let elimination = remove_unused(&mut program, self.config.elimination);
        log::debug!(
            "{core}: removed {} item(s) in {} pass(es)",
            elimination.removed.len(),
            elimination.passes
        );
        if self.config.verify_split {
            self.verify(&core, &program, clocks)?;
        }
        let command_table =
            assign_resources(&mut program, clocks, self.config.command_table_capacity)?;
        log::debug!("{core}: {} command table entries", command_table.len());
        Ok(CoreProgram {
            core,
            program,
            command_table,
            elimination,
        })
    }

    // Every frame of the split program must end where it ended in the source program.
    fn verify(&self, core: &Core, program: &Program, clocks: &ClockReport) -> SemanticResult<()> {
        let label = core.to_string();
        let replayed = replay(program, &self.registry, self.config.sample_rate, &label)?;
        let diverged = replayed
            .final_clocks
            .iter()
            .find(|(frame, clock)| clocks.clock(frame) != Some(**clock));
        match diverged {
            Some((frame, clock)) => {
                log::debug!(
                    "{label}: `{frame}` ends at {clock}, source ends at {:?}",
                    clocks.clock(frame)
                );
                Err(SemanticError::new(
                    SemanticErrorKind::SplitTimingMismatch { core: label },
                    TextRange::default(),
                ))
            }
            None => Ok(()),
        }
    }
}
