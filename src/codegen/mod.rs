//! Generación de código.
//!
//! El generador recorre el AST una sola vez, en profundidad, y emite
//! instrucciones MIPS directamente sin representación intermedia ni
//! optimizaciones. Cada expresión deja su resultado en un único
//! registro temporal tomado de [`regs::Registers`].

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Ast, BinOp, Block, Declarator, Expr, Statement, UnOp},
    error::CompileError,
    lex::Identifier,
    source::{Located, Position},
    symbols::SymbolTable,
};

use emitter::Emitter;
use mips::Reg;
use regs::Registers;

pub mod emitter;
pub mod mips;
pub mod regs;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("out of registers: expression needs more than 8 live values")]
    OutOfRegisters,

    #[error("unknown function `{0}`, only `print_int` and `print_str` exist")]
    UnknownIntrinsic(Identifier),

    #[error("`{0}` takes exactly 1 argument, {1} given")]
    Arity(Identifier, usize),
}

/// Operaciones integradas que el lenguaje expone como llamadas.
#[derive(Copy, Clone, Debug)]
enum Intrinsic {
    PrintInt,
    PrintStr,
}

impl Intrinsic {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "print_int" => Some(Intrinsic::PrintInt),
            "print_str" => Some(Intrinsic::PrintStr),
            _ => None,
        }
    }

    /// Símbolo externo que implementa la operación.
    fn symbol(self) -> &'static str {
        match self {
            Intrinsic::PrintInt => "print_int",
            Intrinsic::PrintStr => "print_str",
        }
    }
}

type Generate<T> = Result<T, CompileError>;

/// Traduce un programa completo a ensamblador.
pub fn emit(ast: &Ast) -> Result<String, CompileError> {
    let mut generator = Generator::default();
    generator.function(ast)?;

    let Generator { symbols, out, .. } = generator;
    debug!(
        variables = symbols.len(),
        strings = out.interned(),
        "code generation finished"
    );

    Ok(out.finish())
}

/// Estado de una compilación: variables, registros y salida.
#[derive(Default)]
struct Generator {
    symbols: SymbolTable,
    regs: Registers,
    out: Emitter,
}

impl Generator {
    fn function(&mut self, ast: &Ast) -> Generate<()> {
        let frame_size = self.symbols.frame_size();

        mips::prologue(&mut self.out, frame_size);
        self.block(&ast.body)?;

        // Caer al final de `main` equivale a `return 0;`
        emit!(self.out, "move", "{}, {}", Reg::V0, Reg::ZERO);
        mips::epilogue(&mut self.out, frame_size);

        Ok(())
    }

    fn block(&mut self, Block(statements): &Block) -> Generate<()> {
        statements
            .iter()
            .try_for_each(|statement| self.statement(statement))
    }

    fn statement(&mut self, statement: &Statement) -> Generate<()> {
        match statement {
            Statement::Block(block) => self.block(block)?,

            Statement::Declaration(declarators) => {
                for Declarator { name, init } in declarators {
                    let offset = self.symbols.declare(name)?;

                    // Sin inicializador el contenido previo se conserva
                    if let Some(init) = init {
                        let reg = self.expr(init)?;
                        self.store(reg, offset);
                        self.regs.release(reg);
                    }
                }
            }

            Statement::Expr(expr) => {
                let reg = self.expr(expr)?;
                self.regs.release(reg);
            }

            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                let reg = self.expr(condition)?;
                let else_label = self.out.label("Lelse_");
                let end_label = self.out.label("Lend_");

                mips::branch_if_false(&mut self.out, reg, &else_label);
                self.regs.release(reg);

                self.statement(then)?;
                mips::jump(&mut self.out, &end_label);

                self.out.set_label(&else_label);
                if let Some(otherwise) = otherwise {
                    self.statement(otherwise)?;
                }

                self.out.set_label(&end_label);
            }

            Statement::While { condition, body } => {
                let cond_label = self.out.label("Lcond_");
                let end_label = self.out.label("Lend_");

                self.out.set_label(&cond_label);
                self.exit_unless(condition, &end_label)?;

                self.statement(body)?;
                mips::jump(&mut self.out, &cond_label);
                self.out.set_label(&end_label);
            }

            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.discard(init)?;
                }

                let cond_label = self.out.label("Lfcond_");
                let end_label = self.out.label("Lfend_");

                // Sin condición el ciclo es infinito
                self.out.set_label(&cond_label);
                if let Some(condition) = condition {
                    self.exit_unless(condition, &end_label)?;
                }

                self.statement(body)?;
                if let Some(step) = step {
                    self.discard(step)?;
                }

                mips::jump(&mut self.out, &cond_label);
                self.out.set_label(&end_label);
            }

            Statement::Return(value) => {
                match value {
                    Some(value) => {
                        let reg = self.expr(value)?;
                        emit!(self.out, "move", "{}, {}", Reg::V0, reg);
                        self.regs.release(reg);
                    }

                    None => emit!(self.out, "move", "{}, {}", Reg::V0, Reg::ZERO),
                }

                mips::jump(&mut self.out, mips::EPILOGUE);
            }
        }

        debug_assert_eq!(self.regs.live(), 0, "register leak after statement");
        Ok(())
    }

    fn expr(&mut self, expr: &Located<Expr>) -> Generate<Reg> {
        let location = expr.location();

        match expr.val() {
            Expr::Integer(value) => {
                let reg = self.take(location)?;
                emit!(self.out, "li", "{}, {}", reg, value);

                Ok(reg)
            }

            Expr::String(string) => {
                let label = self.out.intern(string);
                let reg = self.take(location)?;
                emit!(self.out, "la", "{}, {}", reg, label);

                Ok(reg)
            }

            Expr::Var(id) => {
                let offset = self.symbols.lookup(&Located::at(id.clone(), location))?;
                let reg = self.take(location)?;
                emit!(self.out, "lw", "{}, {}({})", reg, offset, Reg::FP);

                Ok(reg)
            }

            Expr::Unary(op, operand) => {
                let reg = self.expr(operand)?;
                match op {
                    UnOp::Plus => (),
                    UnOp::Negate => emit!(self.out, "sub", "{0}, {1}, {0}", reg, Reg::ZERO),
                }

                Ok(reg)
            }

            Expr::Binary(left, op, right) => self.binary(left, *op, right),

            Expr::Call { function, args } => self.call(function, args),

            Expr::Assign { target, value } => {
                let offset = self.symbols.lookup(target)?;
                let reg = self.expr(value)?;
                self.store(reg, offset);

                Ok(reg)
            }
        }
    }

    fn binary(
        &mut self,
        left: &Located<Expr>,
        op: BinOp,
        right: &Located<Expr>,
    ) -> Generate<Reg> {
        use BinOp::*;

        let l = self.expr(left)?;
        let r = self.expr(right)?;

        match op {
            Add => emit!(self.out, "add", "{0}, {0}, {1}", l, r),
            Sub => emit!(self.out, "sub", "{0}, {0}, {1}", l, r),
            Mul => emit!(self.out, "mul", "{0}, {0}, {1}", l, r),

            // Cociente en `lo`, residuo en `hi`
            Div | Mod => {
                emit!(self.out, "div", "{}, {}", l, r);
                let from = if op == Div { "mflo" } else { "mfhi" };
                emit!(self.out, from, "{}", l);
            }

            Less => emit!(self.out, "slt", "{0}, {0}, {1}", l, r),
            Greater => emit!(self.out, "slt", "{0}, {1}, {0}", l, r),

            // `a <= b` es `!(b < a)` y `a >= b` es `!(a < b)`
            LessOrEqual | GreaterOrEqual => {
                if op == LessOrEqual {
                    emit!(self.out, "slt", "{0}, {1}, {0}", l, r);
                } else {
                    emit!(self.out, "slt", "{0}, {0}, {1}", l, r);
                }

                emit!(self.out, "xori", "{0}, {0}, 1", l);
            }

            // La diferencia solo se compara contra cero, por lo cual
            // `subu` evita la excepción de overflow de `sub`
            Equal => {
                emit!(self.out, "subu", "{0}, {0}, {1}", l, r);
                emit!(self.out, "sltiu", "{0}, {0}, 1", l);
            }

            NotEqual => {
                emit!(self.out, "subu", "{0}, {0}, {1}", l, r);
                emit!(self.out, "sltu", "{0}, {1}, {0}", l, Reg::ZERO);
            }
        }

        self.regs.release(r);
        Ok(l)
    }

    /// Invoca una operación integrada.
    ///
    /// Los registros temporales no se preservan alrededor de `jal`: un
    /// valor que siga vivo durante la llamada, como el `1` de
    /// `1 + print_int(2)`, se pierde sin diagnóstico.
    fn call(&mut self, function: &Located<Identifier>, args: &[Located<Expr>]) -> Generate<Reg> {
        let location = function.location();
        let name = function.val();

        let intrinsic = match Intrinsic::lookup(name.as_ref()) {
            Some(intrinsic) => intrinsic,
            None => return fail(CodegenError::UnknownIntrinsic(name.clone()), location),
        };

        let argument = match args {
            [argument] => argument,
            _ => return fail(CodegenError::Arity(name.clone(), args.len()), location),
        };

        let reg = self.expr(argument)?;
        emit!(self.out, "move", "{}, {}", Reg::A0, reg);
        emit!(self.out, "jal", "{}", intrinsic.symbol());
        emit!(self.out, "nop");
        self.regs.release(reg);

        // El valor de una llamada siempre es cero
        let result = self.take(location)?;
        emit!(self.out, "move", "{}, {}", result, Reg::ZERO);

        Ok(result)
    }

    /// Evalúa una condición y salta a `label` si resulta falsa.
    fn exit_unless(&mut self, condition: &Located<Expr>, label: &str) -> Generate<()> {
        let reg = self.expr(condition)?;
        mips::branch_if_false(&mut self.out, reg, label);
        self.regs.release(reg);

        Ok(())
    }

    /// Evalúa una expresión solo por sus efectos.
    fn discard(&mut self, expr: &Located<Expr>) -> Generate<()> {
        let reg = self.expr(expr)?;
        self.regs.release(reg);

        Ok(())
    }

    fn store(&mut self, reg: Reg, offset: i32) {
        emit!(self.out, "sw", "{}, {}({})", reg, offset, Reg::FP);
    }

    fn take(&mut self, location: Position) -> Generate<Reg> {
        self.regs
            .take()
            .or_else(|error| fail(error, location))
    }
}

fn fail<T>(error: CodegenError, location: Position) -> Generate<T> {
    Err(Located::at(error, location).into())
}
