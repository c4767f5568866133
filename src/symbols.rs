//! Asignación de variables a posiciones en el stack frame.
//!
//! Cada variable declarada recibe un desplazamiento fijo y negativo
//! relativo a `$fp`. Los primeros 8 bytes bajo `$fp` guardan la
//! dirección de retorno y el `$fp` anterior, por lo cual la primera
//! variable vive en `-12($fp)` y las siguientes descienden de 4 en 4
//! en orden de primera declaración.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::{lex::Identifier, source::Located};

/// Tamaño fijo del frame de `main`, en bytes.
pub const FRAME_SIZE: u32 = 256;

/// Tamaño de una palabra.
pub const WORD_SIZE: u32 = 4;

/// Desplazamiento de la primera variable.
const FIRST_SLOT: i32 = -12;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("variable `{0}` is not declared")]
    Undeclared(Identifier),

    #[error("no stack slot left for `{0}`, the frame holds at most {1} variables")]
    FrameOverflow(Identifier, usize),
}

/// Tabla de símbolos de una compilación.
#[derive(Debug)]
pub struct SymbolTable {
    offsets: HashMap<Identifier, i32>,
    next: i32,
    frame_size: u32,
}

impl SymbolTable {
    /// Crea una tabla para un frame de `frame_size` bytes.
    pub fn with_frame_size(frame_size: u32) -> Self {
        SymbolTable {
            offsets: HashMap::new(),
            next: FIRST_SLOT,
            frame_size,
        }
    }

    /// Obtiene el desplazamiento de una variable, asignando uno nuevo
    /// si es la primera vez que se declara.
    ///
    /// Redeclarar un nombre reutiliza su posición original. Falla si
    /// el frame ya no tiene espacio.
    pub fn declare(&mut self, id: &Located<Identifier>) -> Result<i32, Located<NameError>> {
        if let Some(&offset) = self.offsets.get(id.val()) {
            return Ok(offset);
        }

        let offset = self.next;
        if offset < -(self.frame_size as i32) {
            let error = NameError::FrameOverflow(id.val().clone(), self.capacity());
            return Err(Located::at(error, id.location()));
        }

        trace!(name = %id.val(), offset, "stack slot allocated");

        self.next -= WORD_SIZE as i32;
        self.offsets.insert(id.val().clone(), offset);

        Ok(offset)
    }

    /// Obtiene el desplazamiento de una variable ya declarada.
    pub fn lookup(&self, id: &Located<Identifier>) -> Result<i32, Located<NameError>> {
        self.offsets.get(id.val()).copied().ok_or_else(|| {
            Located::at(NameError::Undeclared(id.val().clone()), id.location())
        })
    }

    /// Tamaño del frame, independiente de la cantidad de variables.
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    /// Cantidad de variables declaradas.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Cantidad máxima de variables que caben en el frame.
    pub fn capacity(&self) -> usize {
        let usable = self.frame_size as i32 + FIRST_SLOT + WORD_SIZE as i32;
        (usable.max(0) as u32 / WORD_SIZE) as usize
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::with_frame_size(FRAME_SIZE)
    }
}
