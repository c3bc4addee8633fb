// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! The semantic analyzer.
//!
//! A single pre-order traversal of the program that
//! * numbers every statement,
//! * binds every declaration in the scope table,
//! * resolves every identifier and records the symbol on the `Identifier` node,
//! * checks that each statement is legal in the scope it appears in,
//! * checks arity and declared parameter types of subroutine, generator and defcal calls.
//!
//! The first error aborts the traversal.

use crate::asg::*;
use crate::builtins::GeneratorRegistry;
use crate::context::Context;
use crate::mangle::{mangle_defcal, match_score};
use crate::semantic_error::SemanticErrorKind::*;
use crate::semantic_error::{SemanticError, SemanticResult};
use crate::symbols::{ScopeKind, Signature, StmtClass, SymbolKind, SymbolTable};
use crate::types::{IsConst, Type};
use crate::with_scope;

/// Analyze `program` in place, returning the populated symbol table for inspection.
pub fn analyze(program: &mut Program, registry: &GeneratorRegistry) -> SemanticResult<SymbolTable> {
    let mut context = Context::new(registry)?;
    analyze_stmts(program.stmts_mut(), &mut context)?;
    log::debug!(
        "semantic analysis done: {} symbols",
        context.symbol_table().symbols().count()
    );
    Ok(context.into_symbol_table())
}

fn analyze_stmts(stmts: &mut [Stmt], context: &mut Context) -> SemanticResult<()> {
    for stmt in stmts.iter_mut() {
        analyze_stmt(stmt, context)?;
    }
    Ok(())
}

/// The keyword used in diagnostics, and the placement class, of each statement kind.
fn classify(kind: &StmtKind) -> (&'static str, StmtClass) {
    use StmtClass::*;
    match kind {
        StmtKind::CalibrationGrammar(_) => ("defcalgrammar", TopLevel),
        StmtKind::DeclarePort(_) => ("port", Calibration),
        StmtKind::DeclareFrame(_) => ("frame", Calibration),
        StmtKind::DeclareWaveform(_) => ("waveform", Calibration),
        StmtKind::DeclareClassical(_) => ("declaration", Anywhere),
        StmtKind::InputDeclaration(_) => ("input", TopLevel),
        StmtKind::OutputDeclaration(_) => ("output", TopLevel),
        StmtKind::DefStmt(_) => ("def", TopLevel),
        StmtKind::DefCal(_) => ("defcal", TopLevel),
        StmtKind::Cal(_) => ("cal", TopLevel),
        StmtKind::GateCall(_) => ("gate call", Anywhere),
        StmtKind::ExprStmt(_) => ("expression", Anywhere),
        StmtKind::Assignment(_) => ("assignment", Anywhere),
        StmtKind::Return(_) => ("return", Return),
        StmtKind::ForStmt(_) => ("for", Anywhere),
        StmtKind::While(_) => ("while", Anywhere),
        StmtKind::If(_) => ("if", Anywhere),
        StmtKind::Delay(_) => ("delay", Calibration),
        StmtKind::Play(_) => ("play", Calibration),
        StmtKind::Capture(_) => ("capture", Calibration),
        StmtKind::Barrier(_) => ("barrier", Anywhere),
        StmtKind::FrameUpdate(update) => (update.op.name(), Calibration),
    }
}

fn analyze_stmt(stmt: &mut Stmt, context: &mut Context) -> SemanticResult<()> {
    let id = context.next_stmt_id();
    stmt.set_id(id);
    let range = stmt.range();

    let (keyword, class) = classify(stmt.kind());
    if !context.symbol_table.allows(class) {
        return Err(SemanticError::new(
            IllegalScopeForStatement {
                statement: keyword,
                scope: context.symbol_table.scope_state().enclosing,
            },
            range,
        ));
    }

    match stmt.kind_mut() {
        StmtKind::CalibrationGrammar(_) => {}

        StmtKind::DeclarePort(decl) => {
            context.declare(&mut decl.name, SymbolKind::Port)?;
        }

        StmtKind::DeclareFrame(decl) => {
            expect_type(&mut decl.port, &Type::Port, context)?;
            resolve_expr(&mut decl.frequency, context)?;
            resolve_expr(&mut decl.phase, context)?;
            context.declare(&mut decl.name, SymbolKind::Frame)?;
        }

        StmtKind::DeclareWaveform(decl) => {
            let ty = resolve_expr(&mut decl.value, context)?;
            check_assignable(decl.name.name(), &ty, &Type::Waveform, range)?;
            context.declare(&mut decl.name, SymbolKind::Waveform)?;
        }

        StmtKind::DeclareClassical(decl) => {
            // The initializer is evaluated before the name is bound.
            if let Some(init) = decl.initializer.as_mut() {
                let ty = resolve_expr(init, context)?;
                check_assignable(decl.name.name(), &ty, &decl.ty, range)?;
            }
            context.declare(&mut decl.name, kind_for_type(&decl.ty))?;
        }

        StmtKind::InputDeclaration(decl) | StmtKind::OutputDeclaration(decl) => {
            context.declare(&mut decl.name, kind_for_type(&decl.ty))?;
        }

        StmtKind::DefStmt(def) => {
            let signature = signature_of(&def.params, def.return_type.clone());
            // Bound before the body so that recursive calls resolve.
            context.declare(&mut def.name, SymbolKind::Subroutine(signature))?;
            let DefStmt { params, body, .. } = def;
            with_scope!(context, ScopeKind::Subroutine, range, {
                declare_params(params, context)
                    .and_then(|_| analyze_stmts(body.statements_mut(), context))
            })?;
        }

        StmtKind::DefCal(defcal) => {
            let signature = signature_of(&defcal.params, defcal.return_type.clone());
            let mangled = mangle_defcal(
                defcal.name.name(),
                defcal.params.len(),
                defcal.qubits.as_slice(),
            );
            let symbol_id = context
                .symbol_table
                .declare(&mangled, SymbolKind::DefCal(signature.clone()))
                .map_err(|_| {
                    SemanticError::new(DuplicateDeclaration(describe_defcal(defcal)), range)
                })?;
            defcal.name.set_symbol(symbol_id);
            let name = defcal.name.name().to_string();
            context.record_defcal(&name, &defcal.qubits, symbol_id, signature);
            let DefCal {
                params,
                qubits,
                body,
                ..
            } = defcal;
            with_scope!(context, ScopeKind::DefCal, range, {
                declare_params(params, context)
                    .and_then(|_| declare_qubits(qubits, context))
                    .and_then(|_| analyze_stmts(body.statements_mut(), context))
            })?;
        }

        StmtKind::Cal(block) => {
            context.symbol_table.enter_calibration();
            analyze_stmts(block.statements_mut(), context)?;
            context.leave_calibration(range)?;
        }

        StmtKind::GateCall(call) => analyze_gate_call(call, range, context)?,

        StmtKind::ExprStmt(expr) => {
            resolve_expr(expr, context)?;
        }

        StmtKind::Assignment(assign) => {
            let target_ty = expect_classical(&mut assign.target, context)?;
            let ty = resolve_expr(&mut assign.value, context)?;
            check_assignable(assign.target.name(), &ty, &target_ty, range)?;
        }

        StmtKind::Return(value) => {
            if let Some(value) = value {
                resolve_expr(value, context)?;
            }
        }

        StmtKind::ForStmt(for_stmt) => {
            match &mut for_stmt.iterable {
                ForIterable::Range { start, step, stop } => {
                    resolve_expr(start, context)?;
                    if let Some(step) = step {
                        resolve_expr(step, context)?;
                    }
                    resolve_expr(stop, context)?;
                }
                ForIterable::Set(values) => {
                    for value in values {
                        resolve_expr(value, context)?;
                    }
                }
            }
            let ForStmt { var, ty, body, .. } = for_stmt;
            with_scope!(context, ScopeKind::Local, range, {
                context
                    .declare(var, SymbolKind::Classical(ty.clone()))
                    .and_then(|_| analyze_stmts(body.statements_mut(), context))
            })?;
        }

        StmtKind::While(while_stmt) => {
            resolve_expr(&mut while_stmt.condition, context)?;
            let body = &mut while_stmt.body;
            with_scope!(context, ScopeKind::Local, range, {
                analyze_stmts(body.statements_mut(), context)
            })?;
        }

        StmtKind::If(if_stmt) => {
            resolve_expr(&mut if_stmt.condition, context)?;
            let then_branch = &mut if_stmt.then_branch;
            with_scope!(context, ScopeKind::Local, range, {
                analyze_stmts(then_branch.statements_mut(), context)
            })?;
            if let Some(else_branch) = if_stmt.else_branch.as_mut() {
                with_scope!(context, ScopeKind::Local, range, {
                    analyze_stmts(else_branch.statements_mut(), context)
                })?;
            }
        }

        StmtKind::Delay(delay) => {
            let ty = resolve_expr(&mut delay.duration, context)?;
            check_assignable("delay", &ty, &Type::Duration(IsConst::False), range)?;
            for frame in delay.frames.iter_mut() {
                expect_type(frame, &Type::Frame, context)?;
            }
        }

        StmtKind::Play(op) | StmtKind::Capture(op) => {
            expect_type(&mut op.frame, &Type::Frame, context)?;
            let ty = resolve_expr(&mut op.waveform, context)?;
            check_assignable(keyword, &ty, &Type::Waveform, range)?;
        }

        StmtKind::Barrier(barrier) => {
            if let Some(frames) = barrier.frames.as_mut() {
                for frame in frames.iter_mut() {
                    expect_type(frame, &Type::Frame, context)?;
                }
            }
        }

        StmtKind::FrameUpdate(update) => {
            expect_type(&mut update.frame, &Type::Frame, context)?;
            resolve_expr(&mut update.value, context)?;
        }
    }
    Ok(())
}

fn kind_for_type(ty: &Type) -> SymbolKind {
    match ty {
        Type::Port => SymbolKind::Port,
        Type::Frame => SymbolKind::Frame,
        Type::Waveform => SymbolKind::Waveform,
        Type::Qubit => SymbolKind::Qubit,
        _ => SymbolKind::Classical(ty.clone()),
    }
}

fn signature_of(params: &[Param], return_type: Option<Type>) -> Signature {
    let params = params
        .iter()
        .map(|p| (p.name.name().to_string(), p.ty.clone()))
        .collect();
    Signature::new(params, return_type)
}

fn declare_params(params: &mut [Param], context: &mut Context) -> SemanticResult<()> {
    for param in params.iter_mut() {
        let kind = kind_for_type(&param.ty);
        context.declare(&mut param.name, kind)?;
    }
    Ok(())
}

fn declare_qubits(qubits: &mut [QubitOperand], context: &mut Context) -> SemanticResult<()> {
    for qubit in qubits.iter_mut() {
        if let QubitOperand::Named(ident) = qubit {
            context.declare(ident, SymbolKind::Qubit)?;
        }
    }
    Ok(())
}

fn describe_defcal(defcal: &DefCal) -> String {
    let qubits: Vec<String> = defcal.qubits.iter().map(|q| q.to_string()).collect();
    format!("defcal {} {}", defcal.name.name(), qubits.join(", "))
}

fn check_assignable(
    name: &str,
    found: &Type,
    expected: &Type,
    range: crate::TextRange,
) -> SemanticResult<()> {
    if found.is_assignable_to(expected) {
        Ok(())
    } else {
        Err(SemanticError::new(
            TypeMismatch {
                name: name.to_string(),
                expected: expected.clone(),
                found: found.clone(),
            },
            range,
        ))
    }
}

/// Resolve `ident` and require its symbol to have type `expected`.
fn expect_type(ident: &mut Identifier, expected: &Type, context: &mut Context) -> SemanticResult<()> {
    let symbol_id = context.resolve(ident)?;
    let found = context.symbol_table[&symbol_id].symbol_type();
    check_assignable(ident.name(), &found, expected, ident.range())
}

/// Resolve an assignment target, which must be a classical variable.
fn expect_classical(ident: &mut Identifier, context: &mut Context) -> SemanticResult<Type> {
    let symbol_id = context.resolve(ident)?;
    match context.symbol_table[&symbol_id].kind() {
        SymbolKind::Classical(ty) if !ty.is_const() => Ok(ty.clone()),
        other => Err(SemanticError::new(
            TypeMismatch {
                name: ident.name().to_string(),
                expected: other.symbol_type().without_const(),
                found: other.symbol_type(),
            },
            ident.range(),
        )),
    }
}

fn analyze_gate_call(
    call: &mut GateCall,
    range: crate::TextRange,
    context: &mut Context,
) -> SemanticResult<()> {
    for arg in call.args.iter_mut() {
        resolve_expr(arg, context)?;
    }
    for qubit in call.qubits.iter_mut() {
        if let QubitOperand::Named(ident) = qubit {
            expect_type(ident, &Type::Qubit, context)?;
        }
    }
    let name = call.name.name().to_string();
    let overloads = context
        .defcals
        .get(&name)
        .ok_or_else(|| SemanticError::new(UndeclaredIdentifier(name.clone()), range))?;
    let call_qubits: Vec<Option<u32>> = call.qubits.iter().map(QubitOperand::hardware_index).collect();

    let same_arity: Vec<_> = overloads
        .iter()
        .filter(|o| o.signature.num_params() == call.args.len())
        .collect();
    if same_arity.is_empty() {
        return Err(SemanticError::new(
            ArityMismatch {
                name,
                expected: overloads[0].signature.num_params(),
                found: call.args.len(),
            },
            range,
        ));
    }
    // The first best-scoring overload wins.
    let mut best = None;
    for overload in same_arity {
        if let Some(score) = match_score(&overload.qubits, &call_qubits) {
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, overload));
            }
        }
    }
    let (_, overload) = best.ok_or_else(|| {
        let qubits: Vec<String> = call.qubits.iter().map(|q| q.to_string()).collect();
        SemanticError::new(
            UndeclaredIdentifier(format!("{} {}", name, qubits.join(", "))),
            range,
        )
    })?;
    let symbol = overload.symbol;
    let signature = overload.signature.clone();
    log::trace!("gate call `{}` resolved to {:?}", name, symbol);
    call.name.set_symbol(symbol);
    check_arguments(&name, &signature, &call.args, range, context)
}

fn check_arguments(
    name: &str,
    signature: &Signature,
    args: &[Expr],
    range: crate::TextRange,
    context: &Context,
) -> SemanticResult<()> {
    if signature.num_params() != args.len() {
        return Err(SemanticError::new(
            ArityMismatch {
                name: name.to_string(),
                expected: signature.num_params(),
                found: args.len(),
            },
            range,
        ));
    }
    for ((param_name, param_ty), arg) in signature.params().iter().zip(args) {
        let found = expr_type(arg, context);
        check_assignable(param_name, &found, param_ty, range)?;
    }
    Ok(())
}

/// Resolve every identifier in `expr` and return the type of `expr`.
fn resolve_expr(expr: &mut Expr, context: &mut Context) -> SemanticResult<Type> {
    match expr {
        Expr::Literal(_) => {}
        Expr::Identifier(ident) => {
            context.resolve(ident)?;
        }
        Expr::BinaryExpr(binary) => {
            resolve_expr(&mut binary.left, context)?;
            resolve_expr(&mut binary.right, context)?;
        }
        Expr::UnaryExpr(unary) => {
            resolve_expr(&mut unary.operand, context)?;
        }
        Expr::Call(call) => {
            for arg in call.args.iter_mut() {
                resolve_expr(arg, context)?;
            }
            let symbol_id = context.resolve(&mut call.name)?;
            let signature = match context.symbol_table[&symbol_id].kind() {
                SymbolKind::Subroutine(sig) | SymbolKind::Generator(sig) => sig.clone(),
                _ => {
                    return Err(SemanticError::new(
                        NotCallable(call.name.name().to_string()),
                        call.name.range(),
                    ))
                }
            };
            check_arguments(
                call.name.name(),
                &signature,
                &call.args,
                call.name.range(),
                context,
            )?;
        }
        Expr::ArrayLiteral(elements) => {
            for element in elements.iter_mut() {
                resolve_expr(element, context)?;
            }
        }
    }
    Ok(expr_type(expr, context))
}

/// Type of an already resolved expression.
fn expr_type(expr: &Expr, context: &Context) -> Type {
    match expr {
        Expr::Literal(literal) => match literal {
            Literal::Bool(_) => Type::Bool(IsConst::True),
            Literal::Int(_) => Type::Int(None, IsConst::True),
            Literal::Float(_) => Type::Float(None, IsConst::True),
            Literal::Imaginary(_) => Type::Complex(None, IsConst::True),
            Literal::Duration(_) => Type::Duration(IsConst::True),
        },
        Expr::Identifier(ident) => match ident.symbol() {
            Some(symbol_id) => context.symbol_table[&symbol_id].symbol_type(),
            None => Type::Undefined,
        },
        Expr::BinaryExpr(binary) => match binary.op {
            BinaryOp::ArithOp(_) => {
                expr_type(&binary.left, context).promote(&expr_type(&binary.right, context))
            }
            BinaryOp::CmpOp(_) | BinaryOp::BoolOp(_) => Type::Bool(IsConst::False),
            BinaryOp::ConcatenationOp => Type::Waveform,
        },
        Expr::UnaryExpr(unary) => match unary.op {
            UnaryOp::Not => Type::Bool(IsConst::False),
            UnaryOp::Minus => expr_type(&unary.operand, context),
        },
        Expr::Call(call) => match call.name.symbol() {
            Some(symbol_id) => context.symbol_table[&symbol_id].symbol_type(),
            None => Type::Undefined,
        },
        Expr::ArrayLiteral(elements) => {
            let elem = elements
                .iter()
                .map(|e| expr_type(e, context))
                .reduce(|a, b| a.promote(&b))
                .unwrap_or(Type::Float(None, IsConst::True));
            Type::Array(Box::new(elem), elements.len())
        }
    }
}
