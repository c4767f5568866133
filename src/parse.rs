//! Análisis sintáctico.
//!
//! Parser recursivo descendente con un token de lookahead. La
//! gramática de expresiones, de mayor a menor precedencia, es:
//!
//! 1. Primarias: enteros, strings, variables, llamadas y paréntesis.
//! 2. Unarias: `+` y `-` prefijos, asociativas a la derecha.
//! 3. Multiplicativas: `*`, `/`, `%`.
//! 4. Aditivas: `+`, `-`.
//! 5. Comparaciones: `==`, `!=`, `<`, `<=`, `>`, `>=`.
//! 6. Asignación, asociativa a la derecha.
//!
//! Los niveles 3 a 5 son asociativos a la izquierda, por lo cual
//! `a < b < c` equivale a `(a < b) < c`. La asignación solo aplica
//! cuando el lado izquierdo es una variable desnuda.
//!
//! No hay recuperación de errores: el primer token inesperado
//! termina el análisis. La profundidad de anidamiento de sentencias
//! y expresiones está acotada por [`MAX_NESTING`].

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Ast, BinOp, Block, Declarator, Expr, Statement, UnOp},
    lex::{Identifier, Keyword, Token},
    source::{Located, Position},
};

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("only int main() supported")]
    OnlyMain,

    #[error("expected {0}, found {1}")]
    UnexpectedToken(Token, Token),

    #[error("expected identifier, found {0}")]
    ExpectedId(Token),

    #[error("expected an expression, found {0}")]
    ExpectedExpr(Token),

    #[error("integer literal `{0}` does not fit in 32 bits")]
    IntOutOfRange(String),

    #[error("unexpected {0} after the body of main")]
    TrailingInput(Token),

    #[error("nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

/// Máximo anidamiento de sentencias, expresiones y operadores unarios.
pub const MAX_NESTING: usize = 128;

type Parse<T> = Result<T, Located<ParserError>>;

/// Construye el AST de un programa de la forma `int main() { ... }`.
///
/// `tokens` debería provenir de [`crate::lex::Lexer::tokenize()`]; si
/// la secuencia no termina en [`Token::Eof`] se asume uno implícito.
pub fn parse(tokens: &[Located<Token>]) -> Result<Ast, Located<ParserError>> {
    let eof_location = tokens
        .last()
        .map(Located::location)
        .unwrap_or_default();

    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
        eof: Located::at(Token::Eof, eof_location),
    };

    let ast = parser.program()?;
    debug!(statements = ast.body.0.len(), "parsing finished");

    Ok(ast)
}

struct Parser<'a> {
    tokens: &'a [Located<Token>],
    position: usize,
    depth: usize,
    eof: Located<Token>,
}

impl<'a> Parser<'a> {
    fn program(&mut self) -> Parse<Ast> {
        self.header()?;
        let body = self.block()?;

        match self.next().split() {
            (_, Token::Eof) => Ok(Ast { body }),
            (location, found) => fail(ParserError::TrailingInput(found), location),
        }
    }

    /// `int main ( )`
    fn header(&mut self) -> Parse<()> {
        let expected = [
            Token::Keyword(Keyword::Int),
            Token::Id(Identifier::new("main")),
            Token::OpenParen,
            Token::CloseParen,
        ];

        for token in expected {
            let (location, found) = self.next().split();
            if found != token {
                return fail(ParserError::OnlyMain, location);
            }
        }

        Ok(())
    }

    fn block(&mut self) -> Parse<Block> {
        self.expect(Token::OpenCurly)?;

        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Token::CloseCurly => break,
                Token::Eof => self.expect(Token::CloseCurly)?,
                _ => statements.push(self.statement()?),
            }
        }

        self.expect(Token::CloseCurly)?;
        Ok(Block(statements))
    }

    fn statement(&mut self) -> Parse<Statement> {
        self.nested(|parser| match parser.peek() {
            Token::Keyword(Keyword::Int) => parser.declaration(),
            Token::Keyword(Keyword::If) => parser.if_statement(),
            Token::Keyword(Keyword::While) => parser.while_statement(),
            Token::Keyword(Keyword::For) => parser.for_statement(),
            Token::Keyword(Keyword::Return) => parser.return_statement(),
            Token::OpenCurly => parser.block().map(Statement::Block),

            _ => {
                let expr = parser.expr()?;
                parser.expect(Token::Semicolon)?;

                Ok(Statement::Expr(expr))
            }
        })
    }

    fn declaration(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::Int)?;
        let declarators = self.comma_separated(Parser::declarator)?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Declaration(declarators))
    }

    fn declarator(&mut self) -> Parse<Declarator> {
        let name = self.id()?;
        let init = if self.eat(&Token::Assign) {
            Some(self.expr()?)
        } else {
            None
        };

        Ok(Declarator { name, init })
    }

    fn if_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::If)?;
        let condition = self.condition()?;
        let then = Box::new(self.statement()?);

        // El `else` se asocia al `if` más cercano sin cerrar
        let otherwise = if self.eat(&Token::Keyword(Keyword::Else)) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then,
            otherwise,
        })
    }

    fn while_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::While)?;
        let condition = self.condition()?;
        let body = Box::new(self.statement()?);

        Ok(Statement::While { condition, body })
    }

    fn for_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::For)?;
        self.expect(Token::OpenParen)?;

        let init = self.optional_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;

        let condition = self.optional_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;

        let step = self.optional_expr(&Token::CloseParen)?;
        self.expect(Token::CloseParen)?;

        let body = Box::new(self.statement()?);

        Ok(Statement::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn return_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::Return)?;
        let value = self.optional_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Return(value))
    }

    /// `( expr )` de `if` y `while`.
    fn condition(&mut self) -> Parse<Located<Expr>> {
        self.expect(Token::OpenParen)?;
        let condition = self.expr()?;
        self.expect(Token::CloseParen)?;

        Ok(condition)
    }

    fn expr(&mut self) -> Parse<Located<Expr>> {
        self.nested(Parser::assignment)
    }

    fn assignment(&mut self) -> Parse<Located<Expr>> {
        let (location, left) = self.comparison()?.split();

        match left {
            Expr::Var(target) if *self.peek() == Token::Assign => {
                self.next();
                let value = self.expr()?;

                let target = Located::at(target, location);
                let value = Box::new(value);

                Ok(Located::at(Expr::Assign { target, value }, location))
            }

            left => Ok(Located::at(left, location)),
        }
    }

    fn comparison(&mut self) -> Parse<Located<Expr>> {
        self.left_fold(Parser::additive, |token| match token {
            Token::Equal => Some(BinOp::Equal),
            Token::NotEqual => Some(BinOp::NotEqual),
            Token::Less => Some(BinOp::Less),
            Token::LessOrEqual => Some(BinOp::LessOrEqual),
            Token::Greater => Some(BinOp::Greater),
            Token::GreaterOrEqual => Some(BinOp::GreaterOrEqual),
            _ => None,
        })
    }

    fn additive(&mut self) -> Parse<Located<Expr>> {
        self.left_fold(Parser::multiplicative, |token| match token {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Parse<Located<Expr>> {
        self.left_fold(Parser::unary, |token| match token {
            Token::Times => Some(BinOp::Mul),
            Token::Div => Some(BinOp::Div),
            Token::Mod => Some(BinOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> Parse<Located<Expr>> {
        let op = match self.peek() {
            Token::Plus => UnOp::Plus,
            Token::Minus => UnOp::Negate,
            _ => return self.primary(),
        };

        let location = self.next().location();
        let operand = Box::new(self.nested(Parser::unary)?);

        Ok(Located::at(Expr::Unary(op, operand), location))
    }

    fn primary(&mut self) -> Parse<Located<Expr>> {
        let (location, token) = self.next().split();
        let expr = match token {
            Token::IntLiteral(digits) => match digits.parse::<i32>() {
                Ok(value) => Expr::Integer(value),
                Err(_) => return fail(ParserError::IntOutOfRange(digits), location),
            },

            Token::StrLiteral(string) => Expr::String(string),

            Token::Id(function) if *self.peek() == Token::OpenParen => {
                self.next();
                let args = if self.eat(&Token::CloseParen) {
                    Vec::new()
                } else {
                    let args = self.comma_separated(Parser::expr)?;
                    self.expect(Token::CloseParen)?;
                    args
                };

                let function = Located::at(function, location);
                Expr::Call { function, args }
            }

            Token::Id(id) => Expr::Var(id),

            Token::OpenParen => {
                let inner = self.expr()?;
                self.expect(Token::CloseParen)?;

                return Ok(inner);
            }

            found => return fail(ParserError::ExpectedExpr(found), location),
        };

        Ok(Located::at(expr, location))
    }

    /// Secuencia de operandos separados por operadores del mismo nivel.
    fn left_fold<F, O>(&mut self, mut operand: F, operator: O) -> Parse<Located<Expr>>
    where
        F: FnMut(&mut Self) -> Parse<Located<Expr>>,
        O: Fn(&Token) -> Option<BinOp>,
    {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek()) {
            self.next();
            let right = operand(self)?;

            let location = left.location();
            left = Located::at(Expr::Binary(Box::new(left), op, Box::new(right)), location);
        }

        Ok(left)
    }

    /// Aplica `rule` un nivel de anidamiento más adentro.
    fn nested<T, F>(&mut self, rule: F) -> Parse<T>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        if self.depth >= MAX_NESTING {
            let location = self.location();
            return fail(ParserError::NestingTooDeep(MAX_NESTING), location);
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;

        result
    }

    fn optional_expr(&mut self, terminator: &Token) -> Parse<Option<Located<Expr>>> {
        if self.peek() == terminator {
            Ok(None)
        } else {
            self.expr().map(Some)
        }
    }

    fn comma_separated<T, F>(&mut self, mut rule: F) -> Parse<Vec<T>>
    where
        F: FnMut(&mut Self) -> Parse<T>,
    {
        let mut items = vec![rule(self)?];
        while self.eat(&Token::Comma) {
            items.push(rule(self)?);
        }

        Ok(items)
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (location, token) = self.next().split();
        match token {
            Token::Id(id) => Ok(Located::at(id, location)),
            found => fail(ParserError::ExpectedId(found), location),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Parse<()> {
        self.expect(Token::Keyword(keyword))
    }

    fn expect(&mut self, token: Token) -> Parse<()> {
        let (location, found) = self.next().split();
        if found == token {
            Ok(())
        } else {
            fail(ParserError::UnexpectedToken(token, found), location)
        }
    }

    /// Consume el siguiente token solo si es igual a `token`.
    fn eat(&mut self, token: &Token) -> bool {
        let matches = self.peek() == token;
        if matches {
            self.next();
        }

        matches
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof).val()
    }

    fn location(&self) -> Position {
        self.tokens.get(self.position).unwrap_or(&self.eof).location()
    }

    fn next(&mut self) -> Located<Token> {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                token.clone()
            }

            None => self.eof.clone(),
        }
    }
}

fn fail<T>(error: ParserError, location: Position) -> Parse<T> {
    Err(Located::at(error, location))
}
