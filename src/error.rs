//! Diagnósticos estructurados.
//!
//! Cada fase reporta sus errores como `Located<E>`, donde `E` es
//! el tipo de error propio de la fase. Los diagnósticos se acumulan
//! en orden de descubrimiento dentro de [`Diagnostics`], el cual es
//! el único medio por el que el compilador comunica errores de
//! usuario. La presentación en terminal es responsabilidad del driver.

use crate::source::{Located, Location};
use std::{
    error::Error,
    fmt::{self, Display},
};

mod sealed {
    pub trait Sealed {}
}

/// Taxonomía de errores visibles al usuario.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Carácter o literal fuera de la gramática léxica.
    Lexical,

    /// Violación de la gramática.
    Syntax,

    /// Declaración duplicada en un mismo ámbito.
    Redeclaration,

    /// Uso de un identificador sin declaración visible.
    Undeclared,

    /// Incompatibilidad de tipos o uso indebido de un constructo.
    Type,

    /// Cantidad incorrecta de argumentos en una llamada.
    Arity,
}

impl Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Redeclaration => "redeclaration error",
            ErrorKind::Undeclared => "undeclared error",
            ErrorKind::Type => "type error",
            ErrorKind::Arity => "arity error",
        };

        fmt.write_str(string)
    }
}

/// Clasificación de un error de fase dentro de [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Un error de usuario con una ubicación asociada.
pub trait LocatedError: sealed::Sealed + fmt::Debug {
    fn kind(&self) -> ErrorKind;
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
}

/// Secuencia ordenada de errores reportados por una compilación.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    /// Cantidad de errores.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Determina si no hay errores.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Itera en orden de descubrimiento.
    pub fn iter(&self) -> impl Iterator<Item = &dyn LocatedError> {
        self.errors.iter().map(|error| &**error)
    }

    /// Clases de cada error, en orden.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.iter().map(LocatedError::kind).collect()
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let errors: Box<dyn LocatedError> = Box::new(error);
                errors
            })
            .collect();

        Diagnostics { errors }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", error.kind(), error.source())?;

            let location = error.location();
            writeln!(fmt, " --> {}", location)?;

            let digits = location.end().line().to_string().chars().count();
            writeln!(fmt, "{:digits$} |", "", digits = digits)?;

            for line_number in location.start().line()..=location.end().line() {
                location.source().with_line(line_number, |line| {
                    writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)
                })?
            }

            // Rangos de varias líneas solo se subrayan desde su inicio
            let from = location.start().column();
            let to = if location.end().line() == location.start().line() {
                location.end().column().saturating_sub(1).max(from)
            } else {
                from
            };

            let skip = (from - 1) as usize;
            let highlight = (to - from + 1) as usize;

            writeln!(
                fmt,
                "{:digits$} | {:skip$}{:^<highlight$}",
                "",
                "",
                "",
                digits = digits,
                skip = skip,
                highlight = highlight
            )?;

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

impl<E: Error + Classify> sealed::Sealed for Located<E> {}

impl<E: Error + Classify> LocatedError for Located<E> {
    fn kind(&self) -> ErrorKind {
        self.val().kind()
    }

    fn source(&self) -> &dyn Error {
        self.val()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}
