// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Print the ASG as OpenPulse source. Annotations are not printed.
// Used for debugging and for snapshot tests of transformed programs.

use crate::asg::*;
use std::fmt;

const INDENT: &str = "    ";

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in self.stmts() {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for stmt in block.statements() {
        write_stmt(f, stmt, depth + 1)?;
    }
    write!(f, "{}}}", INDENT.repeat(depth))
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn names(idents: &[Identifier]) -> String {
    idents
        .iter()
        .map(|ident| ident.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    write!(f, "{}", INDENT.repeat(depth))?;
    match stmt.kind() {
        StmtKind::CalibrationGrammar(grammar) => write!(f, "defcalgrammar \"{grammar}\";")?,
        StmtKind::DeclarePort(decl) => write!(f, "port {};", decl.name.name())?,
        StmtKind::DeclareFrame(decl) => write!(
            f,
            "frame {} = newframe({}, {}, {});",
            decl.name.name(),
            decl.port.name(),
            decl.frequency,
            decl.phase
        )?,
        StmtKind::DeclareWaveform(decl) => {
            write!(f, "waveform {} = {};", decl.name.name(), decl.value)?
        }
        StmtKind::DeclareClassical(decl) => match &decl.initializer {
            Some(init) => write!(f, "{} {} = {};", decl.ty, decl.name.name(), init)?,
            None => write!(f, "{} {};", decl.ty, decl.name.name())?,
        },
        StmtKind::InputDeclaration(decl) => write!(f, "input {} {};", decl.ty, decl.name.name())?,
        StmtKind::OutputDeclaration(decl) => {
            write!(f, "output {} {};", decl.ty, decl.name.name())?
        }
        StmtKind::DefStmt(def) => {
            write!(f, "def {}({})", def.name.name(), params(&def.params))?;
            if let Some(ty) = &def.return_type {
                write!(f, " -> {ty}")?;
            }
            write!(f, " ")?;
            write_block(f, &def.body, depth)?;
        }
        StmtKind::DefCal(defcal) => {
            write!(f, "defcal {}", defcal.name.name())?;
            if !defcal.params.is_empty() {
                write!(f, "({})", params(&defcal.params))?;
            }
            if !defcal.qubits.is_empty() {
                write!(f, " {}", join(&defcal.qubits))?;
            }
            if let Some(ty) = &defcal.return_type {
                write!(f, " -> {ty}")?;
            }
            write!(f, " ")?;
            write_block(f, &defcal.body, depth)?;
        }
        StmtKind::Cal(block) => {
            write!(f, "cal ")?;
            write_block(f, block, depth)?;
        }
        StmtKind::GateCall(call) => {
            write!(f, "{}", call.name.name())?;
            if !call.args.is_empty() {
                write!(f, "({})", join(&call.args))?;
            }
            if !call.qubits.is_empty() {
                write!(f, " {}", join(&call.qubits))?;
            }
            write!(f, ";")?;
        }
        StmtKind::ExprStmt(expr) => write!(f, "{expr};")?,
        StmtKind::Assignment(assign) => {
            let op = assign.op.map_or("", arith_symbol);
            write!(f, "{} {}= {};", assign.target.name(), op, assign.value)?;
        }
        StmtKind::Return(value) => match value {
            Some(value) => write!(f, "return {value};")?,
            None => write!(f, "return;")?,
        },
        StmtKind::ForStmt(for_stmt) => {
            write!(f, "for {} {} in ", for_stmt.ty, for_stmt.var.name())?;
            match &for_stmt.iterable {
                ForIterable::Range { start, step, stop } => match step {
                    Some(step) => write!(f, "[{start}:{step}:{stop}] ")?,
                    None => write!(f, "[{start}:{stop}] ")?,
                },
                ForIterable::Set(values) => write!(f, "{{{}}} ", join(values))?,
            }
            write_block(f, &for_stmt.body, depth)?;
        }
        StmtKind::While(while_stmt) => {
            write!(f, "while ({}) ", while_stmt.condition)?;
            write_block(f, &while_stmt.body, depth)?;
        }
        StmtKind::If(if_stmt) => {
            write!(f, "if ({}) ", if_stmt.condition)?;
            write_block(f, &if_stmt.then_branch, depth)?;
            if let Some(else_branch) = &if_stmt.else_branch {
                write!(f, " else ")?;
                write_block(f, else_branch, depth)?;
            }
        }
        StmtKind::Delay(delay) => write!(f, "delay[{}] {};", delay.duration, names(&delay.frames))?,
        StmtKind::Play(op) => write!(f, "play({}, {});", op.frame.name(), op.waveform)?,
        StmtKind::Capture(op) => write!(f, "capture({}, {});", op.frame.name(), op.waveform)?,
        StmtKind::Barrier(barrier) => match &barrier.frames {
            Some(frames) => write!(f, "barrier {};", names(frames))?,
            None => write!(f, "barrier;")?,
        },
        StmtKind::FrameUpdate(update) => write!(
            f,
            "{}({}, {});",
            update.op.name(),
            update.frame.name(),
            update.value
        )?,
    }
    writeln!(f)
}

fn arith_symbol(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::Mod => "%",
        ArithOp::Pow => "**",
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::ArithOp(op) => arith_symbol(*op),
            BinaryOp::CmpOp(op) => match op {
                CmpOp::Eq => "==",
                CmpOp::Neq => "!=",
                CmpOp::Lt => "<",
                CmpOp::Gt => ">",
                CmpOp::LtEq => "<=",
                CmpOp::GtEq => ">=",
            },
            BinaryOp::BoolOp(BoolOp::And) => "&&",
            BinaryOp::BoolOp(BoolOp::Or) => "||",
            BinaryOp::ConcatenationOp => "++",
        };
        write!(f, "{symbol}")
    }
}

// Nested binary operands are parenthesized.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::BinaryExpr(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => match literal {
                Literal::Bool(b) => write!(f, "{b}"),
                Literal::Int(i) => write!(f, "{i}"),
                Literal::Float(x) => write!(f, "{x}"),
                Literal::Imaginary(x) => write!(f, "{x}im"),
                Literal::Duration(d) => write!(f, "{}{}", d.value, d.unit.suffix()),
            },
            Expr::Identifier(ident) => write!(f, "{}", ident.name()),
            Expr::BinaryExpr(binary) => {
                write_operand(f, &binary.left)?;
                write!(f, " {} ", binary.op)?;
                write_operand(f, &binary.right)
            }
            Expr::UnaryExpr(unary) => {
                match unary.op {
                    UnaryOp::Minus => write!(f, "-")?,
                    UnaryOp::Not => write!(f, "!")?,
                }
                write_operand(f, &unary.operand)
            }
            Expr::Call(call) => write!(f, "{}({})", call.name.name(), join(&call.args)),
            Expr::ArrayLiteral(elements) => write!(f, "[{}]", join(elements)),
        }
    }
}
