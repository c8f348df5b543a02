//! Ubicaciones en el código fuente.
//!
//! Todo token, nodo del árbol y error del compilador lleva consigo
//! un rango de posiciones dentro de la unidad de traducción. Esto
//! permite que los diagnósticos señalen la línea y columna exactas
//! donde algo salió mal, además de citar el texto original.

use std::{
    cell::RefCell,
    fmt::{self, Debug, Display, Formatter},
    io::{self, BufRead},
    ops::Range,
    rc::Rc,
    vec,
};

/// Ancho de los divisores de tabulador.
const TAB_STOP: u32 = 4;

/// Un flujo de entrada, carácter por carácter.
///
/// Cada carácter viene acompañado por la ubicación del carácter que
/// le sigue.
pub trait InputStream: Iterator<Item = Result<(char, Location), io::Error>> {}

impl<I> InputStream for I where I: Iterator<Item = Result<(char, Location), io::Error>> {}

/// Un valor junto con la región de código de la que proviene.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    pub fn val(&self) -> &T {
        &self.value
    }

    /// Acceso mutable al valor; la ubicación no cambia.
    pub fn val_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }
}

/// Rango semiabierto de posiciones dentro de un origen.
#[derive(Clone)]
pub struct Location {
    from: Rc<Source>,
    position: Range<Position>,
}

impl Location {
    /// Rango desde el inicio de `from` hasta el final de `to`.
    ///
    /// Ambas ubicaciones deben pertenecer al mismo origen.
    pub fn span(from: Location, to: &Location) -> Self {
        Location {
            from: from.from,
            position: from.position.start..to.position.end,
        }
    }

    pub fn start(&self) -> Position {
        self.position.start
    }

    /// Posición inmediatamente posterior al rango.
    pub fn end(&self) -> Position {
        self.position.end
    }

    pub fn source(&self) -> &Source {
        &self.from
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.from, &other.from) && self.position == other.position
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.from.name)?;

        let Range { start, end } = self.position;
        if end == start.advance() || end.line() != start.line() {
            write!(formatter, "{}", start)
        } else {
            write!(formatter, "[{}-{}]", start, end.back())
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Línea y columna, ambas a partir de 1.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn advance(self) -> Position {
        Position {
            column: self.column + 1,
            ..self
        }
    }

    /// Retrocede una columna, sin bajar de la primera.
    pub fn back(self) -> Position {
        Position {
            column: self.column.saturating_sub(1).max(1),
            ..self
        }
    }

    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Salta a la siguiente columna de tabulador.
    pub fn tab(self) -> Position {
        Position {
            column: 1 + ((self.column - 1) / TAB_STOP + 1) * TAB_STOP,
            ..self
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Abre un origen de código para su lectura carácter por carácter.
///
/// La ubicación retornada corresponde al primer carácter. Cada línea
/// se entrega terminada en `'\n'`, incluso la última, y queda
/// registrada en el [`Source`] para que los diagnósticos la puedan
/// citar. Un error de E/S se reporta una sola vez y finaliza el flujo.
pub fn consume<R, S>(reader: R, name: S) -> (Location, impl InputStream)
where
    R: BufRead,
    S: Into<String>,
{
    let source = Rc::new(Source {
        name: name.into(),
        lines: RefCell::default(),
    });

    let here = Position::default();
    let start = Location {
        from: Rc::clone(&source),
        position: here..here.advance(),
    };

    let chars = Chars {
        lines: Some(reader.lines()),
        source,
        pending: Vec::new().into_iter(),
        here,
    };

    (start, chars)
}

/// Iterador detrás de [`consume`].
struct Chars<R> {
    lines: Option<io::Lines<R>>,
    source: Rc<Source>,
    pending: vec::IntoIter<char>,
    here: Position,
}

impl<R: BufRead> Iterator for Chars<R> {
    type Item = Result<(char, Location), io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(c) = self.pending.next() {
                self.here = match c {
                    '\n' => self.here.newline(),
                    '\t' => self.here.tab(),
                    _ => self.here.advance(),
                };

                let location = Location {
                    from: Rc::clone(&self.source),
                    position: self.here..self.here.advance(),
                };

                return Some(Ok((c, location)));
            }

            match self.lines.as_mut()?.next() {
                None => self.lines = None,

                Some(Ok(line)) => {
                    let mut chars: Vec<char> = line.chars().collect();
                    chars.push('\n');

                    self.source.lines.borrow_mut().push(line);
                    self.pending = chars.into_iter();
                }

                Some(Err(error)) => {
                    self.lines = None;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Nombre de un origen y las líneas leídas hasta el momento.
pub struct Source {
    name: String,
    lines: RefCell<Vec<String>>,
}

impl Source {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opera sobre el texto de una línea ya leída.
    ///
    /// Las líneas que todavía no se han leído, o que no existen,
    /// se observan como vacías.
    pub fn with_line<R, F>(&self, line: u32, callback: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let lines = self.lines.borrow();
        let text = (line as usize)
            .checked_sub(1)
            .and_then(|index| lines.get(index))
            .map(String::as_str)
            .unwrap_or("");

        callback(text)
    }
}
