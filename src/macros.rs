/// Escribe una instrucción de IR en forma textual.
///
/// El código de operación se alinea a ocho columnas; los operandos,
/// si los hay, siguen con la sintaxis de `write!`.
macro_rules! emit {
    ($output:expr, $opcode:expr) => {
        writeln!($output, "\t{}", $opcode)
    };

    ($output:expr, $opcode:expr, $($format:tt)*) => {{
        write!($output, "\t{:8}", $opcode)?;
        writeln!($output, $($format)*)
    }};
}
