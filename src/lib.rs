//! Compilador de un subconjunto mínimo de C a ensamblador MIPS.
//!
//! # Front end
//! Cada programa deriva de un único archivo de código fuente con
//! exactamente una función, `int main()`. Este archivo se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene un
//! flujo de tokens. El flujo de tokens se dispone en un AST ([`ast`])
//! por medio de análisis sintáctico en [`parse`].
//!
//! # Back end
//! El AST se recorre una única vez en [`codegen`], asignando cada
//! variable a una posición fija del stack frame por medio de
//! [`symbols`] y cada valor intermedio a uno de ocho registros
//! temporales. No existe representación intermedia ni optimización.
//! El resultado es un archivo de texto ensamblador listo para un
//! ensamblador o simulador MIPS que provea `print_int` y `print_str`.
//!
//! # Errores
//! La compilación se detiene en el primer error de cualquier fase;
//! ver [`error::CompileError`].

#[macro_use]
mod macros;

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lex;
pub mod parse;
pub mod source;
pub mod symbols;

use error::CompileError;
use lex::Lexer;

/// Compila código fuente completo a texto ensamblador.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    let ast = parse::parse(&tokens)?;

    codegen::emit(&ast)
}
