//! Errores de compilación.
//!
//! Toda fase se detiene en su primer error, por lo cual una
//! compilación fallida produce exactamente un [`CompileError`].

use thiserror::Error;

use crate::{
    codegen::CodegenError, lex::LexerError, parse::ParserError, source::{Located, Position},
    symbols::NameError,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("{}: lexical error: {}", .0.location(), .0.val())]
    Lex(Located<LexerError>),

    #[error("{}: syntax error: {}", .0.location(), .0.val())]
    Parse(Located<ParserError>),

    #[error("{}: name error: {}", .0.location(), .0.val())]
    Name(Located<NameError>),

    #[error("{}: codegen error: {}", .0.location(), .0.val())]
    Codegen(Located<CodegenError>),
}

impl CompileError {
    /// Nombre de la fase que originó el error.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "lexical error",
            CompileError::Parse(_) => "syntax error",
            CompileError::Name(_) => "name error",
            CompileError::Codegen(_) => "codegen error",
        }
    }

    /// Posición en el código fuente donde ocurrió el error.
    pub fn location(&self) -> Position {
        match self {
            CompileError::Lex(error) => error.location(),
            CompileError::Parse(error) => error.location(),
            CompileError::Name(error) => error.location(),
            CompileError::Codegen(error) => error.location(),
        }
    }
}

impl From<Located<LexerError>> for CompileError {
    fn from(error: Located<LexerError>) -> Self {
        CompileError::Lex(error)
    }
}

impl From<Located<ParserError>> for CompileError {
    fn from(error: Located<ParserError>) -> Self {
        CompileError::Parse(error)
    }
}

impl From<Located<NameError>> for CompileError {
    fn from(error: Located<NameError>) -> Self {
        CompileError::Name(error)
    }
}

impl From<Located<CodegenError>> for CompileError {
    fn from(error: Located<CodegenError>) -> Self {
        CompileError::Codegen(error)
    }
}
