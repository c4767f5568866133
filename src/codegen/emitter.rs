//! Acumulación de código ensamblador.
//!
//! El [`Emitter`] mantiene por separado las secciones `.data` y
//! `.text`, ya que los strings literales se descubren durante el
//! recorrido del árbol pero deben declararse antes del código. También
//! es la única fuente de etiquetas nuevas durante una compilación.

use std::{collections::HashMap, fmt};

use tracing::trace;

/// Secciones de salida, contador de etiquetas y caché de strings.
#[derive(Default)]
pub struct Emitter {
    data: String,
    text: String,
    next_label: u32,
    strings: HashMap<String, String>,
}

impl Emitter {
    /// Genera una etiqueta nueva de la forma `<tag><n>`.
    ///
    /// El contador es compartido por todos los prefijos, por lo cual
    /// dos llamadas nunca producen la misma etiqueta.
    pub fn label(&mut self, tag: &str) -> String {
        let label = format!("{}{}", tag, self.next_label);
        self.next_label += 1;

        trace!(%label, "new label");
        label
    }

    /// Coloca una etiqueta en la posición actual de la sección de texto.
    pub fn set_label(&mut self, label: &str) {
        self.text.push_str(label);
        self.text.push_str(":\n");
    }

    /// Agrega una línea ya formateada a la sección de texto.
    ///
    /// Normalmente se invoca a través de `emit!()`.
    pub fn instruction(&mut self, line: fmt::Arguments<'_>) {
        self.text.push_str(&line.to_string());
        self.text.push('\n');
    }

    /// Obtiene la etiqueta de datos de un string literal.
    ///
    /// La primera aparición de un contenido dado declara un `.asciiz`
    /// nuevo; las siguientes reutilizan la misma etiqueta.
    pub fn intern(&mut self, literal: &str) -> String {
        if let Some(label) = self.strings.get(literal) {
            return label.clone();
        }

        let label = format!("str_{}", self.strings.len());
        self.data.push_str(&format!("{}:\t.asciiz \"{}\"\n", label, escape(literal)));
        self.strings.insert(literal.to_owned(), label.clone());

        label
    }

    /// Cantidad de strings distintos declarados.
    pub fn interned(&self) -> usize {
        self.strings.len()
    }

    /// Produce el archivo ensamblador completo.
    pub fn finish(self) -> String {
        let mut output = String::new();
        if !self.data.is_empty() {
            output.push_str(".data\n");
            output.push_str(&self.data);
        }

        output.push_str("\n.text\n.globl main\n");
        output.push_str(&self.text);
        output
    }
}

/// Escapa un string para `.asciiz`.
fn escape(string: &str) -> String {
    let mut escaped = String::with_capacity(string.len());
    for c in string.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }

    escaped
}
