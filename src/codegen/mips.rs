//! Implementación para MIPS32.
//!
//! Se sigue la convención usual de la ABI o32: `$a0` para el primer
//! argumento, `$v0` para el valor de retorno, `$t0`-`$t7` como
//! registros temporales. Todo salto, branch o llamada va seguido de
//! un `nop` que ocupa el delay slot.

use super::emitter::Emitter;
use crate::symbols::WORD_SIZE;
use std::fmt;

/// Etiqueta del epílogo compartido por todo `return`.
pub const EPILOGUE: &str = "__epilogue";

/// Registro de procesador, por número.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reg(u8);

impl Reg {
    pub const ZERO: Reg = Reg(0);
    pub const V0: Reg = Reg(2);
    pub const A0: Reg = Reg(4);
    pub const SP: Reg = Reg(29);
    pub const FP: Reg = Reg(30);
    pub const RA: Reg = Reg(31);

    /// Registros temporales disponibles para evaluar expresiones.
    pub const FILE: &'static [Reg] = &[
        Reg(8),
        Reg(9),
        Reg(10),
        Reg(11),
        Reg(12),
        Reg(13),
        Reg(14),
        Reg(15),
    ];
}

impl fmt::Display for Reg {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Reg(number) = *self;
        match number {
            0 => formatter.write_str("$zero"),
            2 => formatter.write_str("$v0"),
            4 => formatter.write_str("$a0"),
            8..=15 => write!(formatter, "$t{}", number - 8),
            29 => formatter.write_str("$sp"),
            30 => formatter.write_str("$fp"),
            31 => formatter.write_str("$ra"),
            _ => write!(formatter, "${}", number),
        }
    }
}

/// Reserva el frame y preserva `$ra` y `$fp` en sus dos palabras superiores.
pub fn prologue(out: &mut Emitter, frame_size: u32) {
    let (ra_offset, fp_offset) = saved_offsets(frame_size);

    out.set_label("main");
    emit!(out, "addi", "{0}, {0}, -{1}", Reg::SP, frame_size);
    emit!(out, "sw", "{}, {}({})", Reg::RA, ra_offset, Reg::SP);
    emit!(out, "sw", "{}, {}({})", Reg::FP, fp_offset, Reg::SP);
    emit!(out, "addi", "{}, {}, {}", Reg::FP, Reg::SP, frame_size);
}

/// Revierte al estado justo antes de la llamada a `main`.
pub fn epilogue(out: &mut Emitter, frame_size: u32) {
    let (ra_offset, fp_offset) = saved_offsets(frame_size);

    out.set_label(EPILOGUE);
    emit!(out, "lw", "{}, {}({})", Reg::RA, ra_offset, Reg::SP);
    emit!(out, "lw", "{}, {}({})", Reg::FP, fp_offset, Reg::SP);
    emit!(out, "addi", "{0}, {0}, {1}", Reg::SP, frame_size);
    emit!(out, "jr", "{}", Reg::RA);
    emit!(out, "nop");
}

/// Salto incondicional con su delay slot.
pub fn jump(out: &mut Emitter, label: &str) {
    emit!(out, "j", "{}", label);
    emit!(out, "nop");
}

/// Salta a `label` si `reg` es cero.
pub fn branch_if_false(out: &mut Emitter, reg: Reg, label: &str) {
    emit!(out, "beq", "{}, {}, {}", reg, Reg::ZERO, label);
    emit!(out, "nop");
}

/// Posiciones de `$ra` y `$fp` relativas a `$sp`.
fn saved_offsets(frame_size: u32) -> (u32, u32) {
    (frame_size - WORD_SIZE, frame_size - 2 * WORD_SIZE)
}
