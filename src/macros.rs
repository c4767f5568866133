/// Emite una instrucción en la sección de texto de un [`Emitter`].
///
/// El opcode se alinea a una columna fija y los operandos se
/// formatean como en `format!()`.
///
/// [`Emitter`]: crate::codegen::emitter::Emitter
macro_rules! emit {
    ($emitter:expr, $opcode:expr) => {
        $emitter.instruction(format_args!("\t{}", $opcode))
    };

    ($emitter:expr, $opcode:expr, $($format:tt)*) => {
        $emitter.instruction(format_args!("\t{:8}{}", $opcode, format_args!($($format)*)))
    };
}
