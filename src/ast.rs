//! Árbol sintáctico abstracto.
//!
//! Cada nodo es dueño exclusivo de sus hijos. El árbol es acíclico y
//! su raíz es el bloque que forma el cuerpo de `main`.

use crate::{lex::Identifier, source::Located};

/// Programa completo: el cuerpo de `int main()`.
#[derive(Debug)]
pub struct Ast {
    pub body: Block,
}

/// Secuencia ordenada de sentencias entre llaves.
#[derive(Debug, Default)]
pub struct Block(pub Vec<Statement>);

#[derive(Debug)]
pub enum Statement {
    Block(Block),

    /// `int a, b = expr, ...;`
    Declaration(Vec<Declarator>),

    Expr(Located<Expr>),

    If {
        condition: Located<Expr>,
        then: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },

    While {
        condition: Located<Expr>,
        body: Box<Statement>,
    },

    For {
        init: Option<Located<Expr>>,
        condition: Option<Located<Expr>>,
        step: Option<Located<Expr>>,
        body: Box<Statement>,
    },

    Return(Option<Located<Expr>>),
}

/// Un nombre declarado con su inicializador opcional.
#[derive(Debug)]
pub struct Declarator {
    pub name: Located<Identifier>,
    pub init: Option<Located<Expr>>,
}

#[derive(Debug)]
pub enum Expr {
    Integer(i32),
    String(String),
    Var(Identifier),
    Unary(UnOp, Box<Located<Expr>>),
    Binary(Box<Located<Expr>>, BinOp, Box<Located<Expr>>),

    Call {
        function: Located<Identifier>,
        args: Vec<Located<Expr>>,
    },

    /// El destino siempre es una variable.
    Assign {
        target: Located<Identifier>,
        value: Box<Located<Expr>>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Negate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}
