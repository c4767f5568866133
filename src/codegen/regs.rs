//! Pool de registros temporales.
//!
//! Cada expresión evaluada toma exactamente un registro para su
//! resultado y lo entrega a quien la evaluó, que queda a cargo de
//! liberarlo. No existe spilling a memoria: si se agotan los
//! registros la compilación falla con [`CodegenError::OutOfRegisters`].

use super::{mips::Reg, CodegenError};
use tracing::trace;

/// Lista libre de registros temporales.
pub struct Registers {
    free: Vec<Reg>,
}

impl Registers {
    /// Toma el registro libre de menor número.
    pub fn take(&mut self) -> Result<Reg, CodegenError> {
        let reg = self.free.pop().ok_or(CodegenError::OutOfRegisters)?;
        trace!(%reg, live = self.live(), "register taken");

        Ok(reg)
    }

    /// Devuelve un registro al pool.
    pub fn release(&mut self, reg: Reg) {
        debug_assert!(!self.free.contains(&reg), "double release of {}", reg);
        debug_assert!(Reg::FILE.contains(&reg), "{} is not a scratch register", reg);

        self.free.push(reg);
    }

    /// Cantidad de registros actualmente en uso.
    pub fn live(&self) -> usize {
        Reg::FILE.len() - self.free.len()
    }
}

impl Default for Registers {
    fn default() -> Self {
        // El tope de la pila es `$t0`
        let free = Reg::FILE.iter().rev().copied().collect();
        Registers { free }
    }
}
