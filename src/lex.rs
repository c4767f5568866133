//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente
//! en unidades léxicas denominadas tokens. Los espacios en blanco y los
//! comentarios (`// ...` y `/* ... */`) se descartan durante esta
//! operación. Cada token emitido está asociado a la posición de su
//! primer carácter en el código fuente original.
//!
//! # Contenido de un token
//! Operadores, puntuación y palabras clave se identifican por el hecho
//! de lo que son y no incluyen lexemas. Los identificadores y las
//! constantes literales sí incluyen su lexema. Las constantes enteras
//! conservan su texto original; su interpretación numérica ocurre en
//! [`crate::parse`].
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores tienen la forma `[A-Za-z_][A-Za-z0-9_]*`.
//! - El lenguaje es case-sensitive: `int` es palabra clave, `Int` no.
//! - Dentro de un string, `\n` es un salto de línea y cualquier otro
//!   carácter precedido por `\` se toma literalmente.
//! - Un comentario de bloque sin cerrar se absorbe hasta el final.
//! - Son espacios en blanco `' '`, `\t`, `\n`, `\r`, `\x0B` y `\x0C`.
//!
//! # Errores
//! El lexer se detiene en el primer error. El flujo de tokens exitoso
//! siempre termina con [`Token::Eof`].

use crate::source::{Located, Position};
use std::{
    fmt::{self, Display},
    iter::Peekable,
    str::{Chars, FromStr},
    sync::Arc,
};

use thiserror::Error;
use tracing::debug;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("unknown character {0:?}")]
    BadChar(char),

    /// Se alcanzó el final de la entrada dentro de un string.
    #[error("unterminated string literal")]
    UnterminatedString,
}

/// Un identificador.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Construye un identificador a partir de su lexema.
    pub fn new(name: &str) -> Self {
        Identifier(Arc::from(name))
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Fin de la entrada. Siempre es el último token.
    Eof,

    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero, sin interpretar.
    IntLiteral(String),

    /// Literal de string, con escapes ya resueltos.
    StrLiteral(String),

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// `,`
    Comma,

    /// `;`
    Semicolon,

    /// `=`
    Assign,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Div,

    /// `%`
    Mod,

    /// `==`
    Equal,

    /// `!=`
    NotEqual,

    /// `<`
    Less,

    /// `<=`
    LessOrEqual,

    /// `>`
    Greater,

    /// `>=`
    GreaterOrEqual,
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Eof => fmt.write_str("end of input"),
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            StrLiteral(string) => write!(fmt, "literal {:?}", string),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            OpenCurly => fmt.write_str("`{`"),
            CloseCurly => fmt.write_str("`}`"),
            Comma => fmt.write_str("`,`"),
            Semicolon => fmt.write_str("`;`"),
            Assign => fmt.write_str("`=`"),
            Plus => fmt.write_str("`+`"),
            Minus => fmt.write_str("`-`"),
            Times => fmt.write_str("`*`"),
            Div => fmt.write_str("`/`"),
            Mod => fmt.write_str("`%`"),
            Equal => fmt.write_str("`==`"),
            NotEqual => fmt.write_str("`!=`"),
            Less => fmt.write_str("`<`"),
            LessOrEqual => fmt.write_str("`<=`"),
            Greater => fmt.write_str("`>`"),
            GreaterOrEqual => fmt.write_str("`>=`"),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Int,
    If,
    Else,
    While,
    For,
    Return,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Keyword::*;
        let string = match self {
            Int    => "int",
            If     => "if",
            Else   => "else",
            While  => "while",
            For    => "for",
            Return => "return",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use Keyword::*;

        const KEYWORDS: &[(&str, Keyword)] = &[
            ("int",    Int),
            ("if",     If),
            ("else",   Else),
            ("while",  While),
            ("for",    For),
            ("return", Return),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<'a> {
    source: Peekable<Chars<'a>>,
    state: State,
    start: Position,
    next: Position,
    finished: bool,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido
    /// sin consumir la entrada actual.
    Complete(Token),

    /// Se encontró `/`. Puede iniciar un comentario o ser división.
    Slash,

    /// Comentario de línea.
    ///
    /// Este estado vuelve a [`State::Start`] al encontrar `'\n'`.
    LineComment,

    /// Comentario de bloque.
    BlockComment,

    /// Se encontró `*` dentro de un comentario de bloque.
    BlockCommentStar,

    /// Se encontró uno de `=`, `!`, `<`, `>`. Puede seguir `=`.
    Relational(char),

    /// Constante entera.
    Integer(String),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),

    /// Contenido de un string literal.
    Str(String),

    /// Se encontró `\` dentro de un string literal.
    StrEscape(String),
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial a partir de texto fuente.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.chars().peekable(),
            state: State::Start,
            start: Position::default(),
            next: Position::default(),
            finished: false,
        }
    }

    /// Reduce la entrada completa a una secuencia de tokens terminada
    /// en [`Token::Eof`], o al primer error encontrado.
    pub fn tokenize(self) -> Result<Vec<Located<Token>>, Located<LexerError>> {
        let tokens = self.collect::<Result<Vec<_>, _>>()?;
        debug!(count = tokens.len(), "lexing finished");

        Ok(tokens)
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Result<Token, LexerError> {
        use State::*;

        loop {
            let next_char = self.source.peek().copied();

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                self.start = self.next;
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                // Tokens triviales
                (Start, None) => return Ok(Token::Eof),
                (Start, Some('(')) => self.state = Complete(Token::OpenParen),
                (Start, Some(')')) => self.state = Complete(Token::CloseParen),
                (Start, Some('{')) => self.state = Complete(Token::OpenCurly),
                (Start, Some('}')) => self.state = Complete(Token::CloseCurly),
                (Start, Some(',')) => self.state = Complete(Token::Comma),
                (Start, Some(';')) => self.state = Complete(Token::Semicolon),
                (Start, Some('+')) => self.state = Complete(Token::Plus),
                (Start, Some('-')) => self.state = Complete(Token::Minus),
                (Start, Some('*')) => self.state = Complete(Token::Times),
                (Start, Some('%')) => self.state = Complete(Token::Mod),
                (Start, Some('/')) => self.state = Slash,
                (Start, Some('"')) => self.state = Str(String::new()),
                (Start, Some(c @ ('=' | '!' | '<' | '>'))) => self.state = Relational(c),

                // Identificadores, palabras clave y constantes. No se
                // consume el primer carácter, ya que esta lógica ya está
                // implementada en el respectivo estado de acumulación.
                (Start, Some(c)) if c.is_ascii_alphabetic() || c == '_' => {
                    self.state = Word(String::new());
                    continue;
                }

                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(String::new());
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(c)) if c.is_ascii_whitespace() || c == '\x0B' => (),
                (Start, Some(c)) => return Err(LexerError::BadChar(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(token), _) => return Ok(std::mem::replace(token, Token::Eof)),

                // `/` inicia un comentario o es división
                (Slash, Some('/')) => self.state = LineComment,
                (Slash, Some('*')) => self.state = BlockComment,
                (Slash, _) => return Ok(Token::Div),

                (LineComment, Some('\n')) | (LineComment, None) => self.state = Start,
                (LineComment, Some(_)) => (),

                // Un comentario de bloque sin cerrar termina con la entrada
                (BlockComment, None) | (BlockCommentStar, None) => self.state = Start,
                (BlockComment, Some('*')) => self.state = BlockCommentStar,
                (BlockComment, Some(_)) => (),
                (BlockCommentStar, Some('/')) => self.state = Start,
                (BlockCommentStar, Some('*')) => (),
                (BlockCommentStar, Some(_)) => self.state = BlockComment,

                // Operadores de dos caracteres tienen prioridad
                (Relational(first), Some('=')) => {
                    let token = match first {
                        '=' => Token::Equal,
                        '!' => Token::NotEqual,
                        '<' => Token::LessOrEqual,
                        _ => Token::GreaterOrEqual,
                    };

                    self.state = Complete(token);
                }

                (Relational(first), _) => {
                    return match first {
                        '=' => Ok(Token::Assign),
                        '<' => Ok(Token::Less),
                        '>' => Ok(Token::Greater),
                        c => Err(LexerError::BadChar(*c)),
                    }
                }

                // Acumulación dígito por dígito de constantes enteras
                (Integer(digits), Some(c)) if c.is_ascii_digit() => digits.push(c),
                (Integer(digits), _) => return Ok(Token::IntLiteral(std::mem::take(digits))),

                // Extensión de términos
                (Word(word), Some(c)) if is_word_char(c) => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => {
                    return Ok(match Keyword::from_str(word) {
                        Ok(keyword) => Token::Keyword(keyword),
                        Err(()) => Token::Id(Identifier::new(word)),
                    });
                }

                (Str(_), None) | (StrEscape(_), None) => {
                    return Err(LexerError::UnterminatedString)
                }

                (Str(string), Some('"')) => {
                    self.state = Complete(Token::StrLiteral(std::mem::take(string)))
                }

                (Str(string), Some('\\')) => self.state = StrEscape(std::mem::take(string)),
                (Str(string), Some(c)) => string.push(c),

                (StrEscape(string), Some(c)) => {
                    string.push(if c == 'n' { '\n' } else { c });
                    self.state = Str(std::mem::take(string));
                }
            }

            // Si no hubo `continue`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            if let Some(c) = self.source.next() {
                self.next = self.next.after(c);
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.lex();
        self.state = State::Start;

        match result {
            Ok(token) => {
                self.finished = token == Token::Eof;
                Some(Ok(Located::at(token, self.start)))
            }

            Err(error) => {
                self.finished = true;
                Some(Err(Located::at(error, self.start)))
            }
        }
    }
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
