//! Ejecución ordenada de las fases.
//!
//! Cada fase consume por completo la salida de la anterior. La
//! generación de IR solo ocurre si ninguna fase previa reportó
//! errores, por lo que un llamador recibe un módulo o una lista de
//! diagnósticos, nunca ambos.

use std::{
    fmt::{self, Display},
    io::BufRead,
};

use log::debug;

use crate::{
    error::Diagnostics,
    ir::{self, GenError, Module},
    lex::{Lexer, Token},
    parse::{self, ast::Program},
    semantic::scope::SymbolTable,
    source::{self, Located, Location},
};

/// Motivo por el cual una compilación no produjo un módulo.
#[derive(Debug)]
pub enum Failure {
    /// El programa es inválido.
    Rejected(Diagnostics),

    /// Defecto del compilador.
    Internal(GenError),
}

impl From<Diagnostics> for Failure {
    fn from(diagnostics: Diagnostics) -> Self {
        Failure::Rejected(diagnostics)
    }
}

impl From<GenError> for Failure {
    fn from(error: GenError) -> Self {
        Failure::Internal(error)
    }
}

impl Display for Failure {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Rejected(diagnostics) => diagnostics.fmt(fmt),
            Failure::Internal(error) => writeln!(fmt, "internal compiler error: {}", error),
        }
    }
}

/// Flujo completo de tokens de una unidad de traducción.
#[derive(Debug)]
pub struct Tokens {
    pub start: Location,
    pub tokens: Vec<Located<Token>>,
}

pub fn tokenize<R: BufRead>(reader: R, name: &str) -> Result<Tokens, Diagnostics> {
    let (start, stream) = source::consume(reader, name);
    let tokens = Lexer::new(start.clone(), stream).try_exhaustive()?;

    debug!("lexed {} tokens from {}", tokens.len(), name);
    Ok(Tokens { start, tokens })
}

pub fn parse(tokens: &Tokens) -> Result<Program, Diagnostics> {
    let program = parse::parse(tokens.tokens.iter(), tokens.start.clone())?;

    debug!("parsed {} top-level items", program.items.len());
    Ok(program)
}

/// Análisis léxico, sintáctico y semántico.
pub fn check<R: BufRead>(reader: R, name: &str) -> Result<(Program, SymbolTable), Diagnostics> {
    let tokens = tokenize(reader, name)?;
    let mut program = parse(&tokens)?;
    let symbols = program.analyze()?;

    Ok((program, symbols))
}

pub fn compile<R: BufRead>(reader: R, name: &str) -> Result<Module, Failure> {
    let (program, symbols) = check(reader, name)?;
    let module = ir::generate(&program, &symbols)?;

    debug!(
        "generated {} functions and {} globals",
        module.functions.len(),
        module.globals.len()
    );

    Ok(module)
}

/// Compila un programa en memoria.
pub fn compile_str(source: &str) -> Result<Module, Failure> {
    compile(source.as_bytes(), "<input>")
}
