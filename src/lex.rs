//! Tokens de uC.
//!
//! # Escaneo
//! Un [`Lexer`] recorre un [`InputStream`] y agrupa sus caracteres en
//! tokens de uC, descartando espacios y comentarios. A cada token se le
//! adjunta el rango de código que lo originó, y ese rango viaja después
//! con los nodos del árbol y con los diagnósticos.
//!
//! Los tokens se producen bajo demanda. Un lexer agotado no se reinicia;
//! volver a escanear requiere abrir de nuevo el código.
//!
//! # Representación
//! Palabras clave, operadores y puntuación son variantes sin datos.
//! Los identificadores conservan su nombre y los literales ya vienen
//! evaluados: enteros, flotantes, caracteres y cadenas sin escapes.
//!
//! # Recuperación
//! Un error invalida el resto de su línea. El escaneo continúa en la
//! línea siguiente, de modo que una sola corrida puede reportar varios
//! errores léxicos. Ninguna fase posterior se ejecuta si hubo alguno.

use crate::{
    error::{Classify, ErrorKind},
    source::{InputStream, Located, Location},
};

use std::{
    fmt::{self, Display},
    rc::Rc,
    str::FromStr,
};

use thiserror::Error;

/// Mayor valor que admite un literal `int`.
const INT_MAX: i32 = i32::MAX;

/// Falla de escaneo en un punto del código.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// El flujo de entrada falló al leer.
    #[error("I/O error")]
    Input(#[from] std::io::Error),

    /// Carácter que no inicia ningún token de uC.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),

    /// Falta un carácter obligatorio, como el segundo `&` de `&&`.
    #[error("Expected {0:?}")]
    Expected(char),

    /// El literal no cabe en un `int`.
    #[error("Integer literal overflow, valid range is [0, {INT_MAX}]")]
    IntOverflow,

    /// Secuencia de escape desconocida.
    #[error("Unknown escape sequence '\\{0}'")]
    BadEscape(char),

    /// Literal de carácter sin contenido.
    #[error("Empty character literal")]
    EmptyChar,

    /// Literal de cadena sin cerrar antes del final de línea.
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Comentario de bloque sin cerrar antes del final de la entrada.
    #[error("Unterminated block comment")]
    UnterminatedComment,
}

impl Classify for LexerError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Lexical
    }
}

/// Nombre de una variable o función.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Rc<str>);

impl Identifier {
    /// Construye un identificador a partir de su lexema.
    pub fn new(name: &str) -> Self {
        Identifier(Rc::from(name))
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

/// Unidad léxica de uC.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Id(Identifier),
    Keyword(Keyword),
    IntLiteral(i32),

    /// Literal de punto flotante.
    FloatLiteral(f64),

    /// Literal de carácter.
    CharLiteral(char),

    /// Literal de cadena, ya sin escapes.
    StrLiteral(Rc<str>),

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Divide,

    /// `%`
    Modulo,

    /// `++`
    Increment,

    /// `--`
    Decrement,

    /// `=`
    Assign,

    /// `+=`
    PlusAssign,

    /// `-=`
    MinusAssign,

    /// `*=`
    TimesAssign,

    /// `/=`
    DivideAssign,

    /// `%=`
    ModuloAssign,

    /// `==`
    Equal,

    /// `!=`
    NotEqual,

    /// `<`
    Less,

    /// `<=`
    LessEqual,

    /// `>`
    Greater,

    /// `>=`
    GreaterEqual,

    /// `&&`
    And,

    /// `||`
    Or,

    /// `!`
    Not,

    /// `,`
    Comma,

    /// `;`
    Semicolon,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `[`
    OpenSquare,

    /// `]`
    CloseSquare,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        let punctuation = match self {
            Id(id) => return write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => return write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => return write!(fmt, "literal `{}`", integer),
            FloatLiteral(float) => return write!(fmt, "literal `{:?}`", float),
            CharLiteral(c) => return write!(fmt, "literal {:?}", c),
            StrLiteral(string) => return write!(fmt, "literal {:?}", string),
            Plus => "+",
            Minus => "-",
            Times => "*",
            Divide => "/",
            Modulo => "%",
            Increment => "++",
            Decrement => "--",
            Assign => "=",
            PlusAssign => "+=",
            MinusAssign => "-=",
            TimesAssign => "*=",
            DivideAssign => "/=",
            ModuloAssign => "%=",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            And => "&&",
            Or => "||",
            Not => "!",
            Comma => ",",
            Semicolon => ";",
            OpenParen => "(",
            CloseParen => ")",
            OpenSquare => "[",
            CloseSquare => "]",
            OpenCurly => "{",
            CloseCurly => "}",
        };

        write!(fmt, "`{}`", punctuation)
    }
}

/// Palabras reservadas. uC distingue mayúsculas de minúsculas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Assert,
    Bool,
    Break,
    Char,
    Else,
    False,
    Float,
    For,
    If,
    Int,
    Print,
    Read,
    Return,
    True,
    Void,
    While,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("assert", Keyword::Assert),
    ("bool",   Keyword::Bool),
    ("break",  Keyword::Break),
    ("char",   Keyword::Char),
    ("else",   Keyword::Else),
    ("false",  Keyword::False),
    ("float",  Keyword::Float),
    ("for",    Keyword::For),
    ("if",     Keyword::If),
    ("int",    Keyword::Int),
    ("print",  Keyword::Print),
    ("read",   Keyword::Read),
    ("return", Keyword::Return),
    ("true",   Keyword::True),
    ("void",   Keyword::Void),
    ("while",  Keyword::While),
];

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == *self)
            .map(|&(name, _)| name)
            .unwrap_or("?");

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Escáner de uC.
///
/// Funciona como autómata: cada paso observa un carácter por
/// adelantado y, según el estado vigente, decide si lo consume,
/// si cambia de estado o si emite un token sin consumirlo.
pub struct Lexer<S: Iterator> {
    source: std::iter::Peekable<S>,
    state: State,
    start: Location,
    next: Location,
}

enum State {
    /// Entre tokens.
    Start,

    /// Descartando el resto de una línea con errores.
    Error,

    /// El token ya está decidido y se emite en el siguiente paso,
    /// tras consumir su último carácter.
    Complete(Token),

    /// Se encontró un primer carácter de un operador que puede
    /// extenderse. Se emite `single` a menos que siga alguno de
    /// los caracteres de `longer`.
    Operator {
        single: Token,
        longer: &'static [(char, Token)],
    },

    /// Se encontró `&`, debe seguir otro `&`.
    Ampersand,

    /// Se encontró `|`, debe seguir otro `|`.
    Pipe,

    /// Se encontró `/`. Puede iniciar un comentario.
    Slash,

    /// Dentro de `// ...`, hasta el fin de línea.
    LineComment,

    /// Comentario de bloque. El booleano indica si el último
    /// carácter fue `*`.
    BlockComment(bool),

    /// Dígitos de un literal, acumulados en decimal.
    Integer(i32),

    /// Parte fraccionaria de una constante de punto flotante.
    Fraction(String),

    /// Se encontró `.`, debe seguir un dígito.
    Dot,

    /// Tras la comilla de apertura de un literal de carácter.
    CharOpen,

    /// Tras `\` dentro de un literal de carácter.
    CharEscape,

    /// Contenido ya leído, se espera la comilla de cierre.
    CharClose(char),

    /// Contenido de una cadena.
    Str(String),

    /// Tras `\` dentro de una cadena.
    StrEscape(String),

    /// Identificador o palabra clave, aún sin distinguir.
    Word(String),
}

impl<S: InputStream> Lexer<S> {
    /// `start` es la ubicación del primer carácter de `source`.
    pub fn new(start: Location, source: S) -> Self {
        let next = start.clone();
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start,
            next,
        }
    }

    /// Escanea la entrada completa.
    ///
    /// Retorna todos los tokens, o bien todos los errores si hubo al
    /// menos uno. Tras el primer error los tokens válidos restantes
    /// se descartan.
    pub fn try_exhaustive(self) -> Result<Vec<Located<Token>>, Vec<Located<LexerError>>> {
        let mut outcome = Ok(Vec::new());

        for result in self {
            match (&mut outcome, result) {
                (Ok(tokens), Ok(token)) => tokens.push(token),
                (Ok(_), Err(error)) => outcome = Err(vec![error]),
                (Err(errors), Err(error)) => errors.push(error),
                (Err(_), Ok(_)) => (),
            }
        }

        outcome
    }

    /// Avanza hasta completar un token, un error o el final.
    fn lex(&mut self) -> Result<Option<(Token, Location)>, LexerError> {
        use {State::*, Token::*};

        let mut last_accepted = self.start.clone();
        let token = loop {
            // Lookahead de un carácter; un error de E/S se consume y aborta
            let next_char = match self.source.peek() {
                None => None,
                Some(Ok((c, _))) => Some(*c),
                Some(Err(_)) => match self.source.next() {
                    Some(Err(error)) => break Err(error.into()),
                    _ => None,
                },
            };

            // Ningún token ha comenzado todavía
            if let Start = self.state {
                self.start = self.next.clone();
            }

            match (&mut self.state, next_char) {
                // Recuperación al final de la línea
                (Error, Some('\n')) => self.state = Start,
                (Error, Some(_)) => (),
                (Error, None) | (Start, None) => return Ok(None),

                // Puntuación
                (Start, Some(',')) => self.state = Complete(Comma),
                (Start, Some(';')) => self.state = Complete(Semicolon),
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('[')) => self.state = Complete(OpenSquare),
                (Start, Some(']')) => self.state = Complete(CloseSquare),
                (Start, Some('{')) => self.state = Complete(OpenCurly),
                (Start, Some('}')) => self.state = Complete(CloseCurly),

                // Operadores de uno o dos caracteres
                (Start, Some('+')) => {
                    self.state = Operator {
                        single: Plus,
                        longer: &[('+', Increment), ('=', PlusAssign)],
                    }
                }

                (Start, Some('-')) => {
                    self.state = Operator {
                        single: Minus,
                        longer: &[('-', Decrement), ('=', MinusAssign)],
                    }
                }

                (Start, Some('*')) => {
                    self.state = Operator {
                        single: Times,
                        longer: &[('=', TimesAssign)],
                    }
                }

                (Start, Some('%')) => {
                    self.state = Operator {
                        single: Modulo,
                        longer: &[('=', ModuloAssign)],
                    }
                }

                (Start, Some('=')) => {
                    self.state = Operator {
                        single: Assign,
                        longer: &[('=', Equal)],
                    }
                }

                (Start, Some('!')) => {
                    self.state = Operator {
                        single: Not,
                        longer: &[('=', NotEqual)],
                    }
                }

                (Start, Some('<')) => {
                    self.state = Operator {
                        single: Less,
                        longer: &[('=', LessEqual)],
                    }
                }

                (Start, Some('>')) => {
                    self.state = Operator {
                        single: Greater,
                        longer: &[('=', GreaterEqual)],
                    }
                }

                (Start, Some('&')) => self.state = Ampersand,
                (Start, Some('|')) => self.state = Pipe,
                (Start, Some('/')) => self.state = Slash,
                (Start, Some('.')) => self.state = Dot,
                (Start, Some('\'')) => self.state = CharOpen,
                (Start, Some('"')) => self.state = Str(String::new()),

                (Start, Some(c)) if c.is_ascii_alphabetic() || c == '_' => {
                    self.state = Word(c.to_string())
                }

                // El primer dígito lo acumula el estado `Integer`
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(0);
                    continue;
                }

                (Start, Some(c)) if c.is_ascii_whitespace() => (),
                (Start, Some(c)) => break Err(LexerError::BadChar(c)),

                (Complete(token), _) => break Ok(std::mem::replace(token, Plus)),

                (Operator { single, longer }, c) => {
                    match longer.iter().find(|(follow, _)| Some(*follow) == c) {
                        Some((_, token)) => self.state = Complete(token.clone()),
                        None => break Ok(std::mem::replace(single, Plus)),
                    }
                }

                (Ampersand, Some('&')) => self.state = Complete(And),
                (Ampersand, _) => break Err(LexerError::Expected('&')),
                (Pipe, Some('|')) => self.state = Complete(Or),
                (Pipe, _) => break Err(LexerError::Expected('|')),

                // `/` puede ser división, `/=` o iniciar un comentario
                (Slash, Some('/')) => self.state = LineComment,
                (Slash, Some('*')) => self.state = BlockComment(false),
                (Slash, Some('=')) => self.state = Complete(DivideAssign),
                (Slash, _) => break Ok(Divide),

                // Los comentarios de línea descartan la línea donde ocurren
                (LineComment, Some('\n')) => self.state = Start,
                (LineComment, Some(_)) => (),
                (LineComment, None) => self.state = Start,

                (BlockComment(true), Some('/')) => self.state = Start,
                (BlockComment(star), Some(c)) => *star = c == '*',
                (BlockComment(_), None) => break Err(LexerError::UnterminatedComment),

                (Integer(value), Some(c)) if c.is_ascii_digit() => match shift_digit(*value, c) {
                    Some(shifted) => *value = shifted,
                    None => break Err(LexerError::IntOverflow),
                },

                (Integer(value), Some('.')) => self.state = Fraction(format!("{}.", value)),
                (Integer(value), _) => break Ok(IntLiteral(*value)),

                (Dot, Some(digit)) if digit.is_ascii_digit() => {
                    self.state = Fraction(String::from("0."));
                    continue;
                }

                (Dot, _) => break Err(LexerError::BadChar('.')),

                (Fraction(digits), Some(digit)) if digit.is_ascii_digit() => digits.push(digit),
                (Fraction(digits), _) => match digits.parse() {
                    Ok(float) => break Ok(FloatLiteral(float)),
                    Err(_) => break Err(LexerError::BadChar('.')),
                },

                // Literales de carácter
                (CharOpen, Some('\'')) => break Err(LexerError::EmptyChar),
                (CharOpen, Some('\\')) => self.state = CharEscape,
                (CharOpen, Some('\n')) | (CharOpen, None) => {
                    break Err(LexerError::Expected('\''))
                }

                (CharOpen, Some(c)) => self.state = CharClose(c),
                (CharEscape, Some(c)) => match escape(c) {
                    Some(c) => self.state = CharClose(c),
                    None => break Err(LexerError::BadEscape(c)),
                },

                (CharEscape, None) => break Err(LexerError::Expected('\'')),
                (CharClose(c), Some('\'')) => self.state = Complete(CharLiteral(*c)),
                (CharClose(_), _) => break Err(LexerError::Expected('\'')),

                // Literales de cadena
                (Str(string), Some('"')) => {
                    let string = Rc::from(std::mem::take(string).as_str());
                    self.state = Complete(StrLiteral(string));
                }

                (Str(string), Some('\\')) => self.state = StrEscape(std::mem::take(string)),
                (Str(_), Some('\n')) | (Str(_), None) => {
                    break Err(LexerError::UnterminatedString)
                }

                (Str(string), Some(c)) => string.push(c),
                (StrEscape(string), Some(c)) => match escape(c) {
                    Some(c) => {
                        string.push(c);
                        self.state = Str(std::mem::take(string));
                    }

                    None => break Err(LexerError::BadEscape(c)),
                },

                (StrEscape(_), None) => break Err(LexerError::UnterminatedString),

                (Word(word), Some(c)) if is_word_char(c) => word.push(c),
                (Word(word), _) => {
                    break Ok(match self::Keyword::from_str(word) {
                        Ok(keyword) => Keyword(keyword),
                        Err(()) => Id(Identifier::new(word)),
                    });
                }
            }

            // El carácter observado pasa a formar parte del token
            if let Some(Ok((_, after))) = self.source.next() {
                last_accepted = std::mem::replace(&mut self.next, after);
            }
        };

        token.map(|token| Some((token, last_accepted)))
    }
}

impl<S: InputStream> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.lex() {
            Ok(None) => return None,
            Ok(Some((token, end))) => {
                self.state = State::Start;
                Ok(Located::at(token, Location::span(self.start.clone(), &end)))
            }

            Err(error) => {
                self.state = State::Error;
                Err(Located::at(error, self.next.clone()))
            }
        };

        Some(item)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Agrega un dígito decimal a la derecha de `value`, si cabe.
fn shift_digit(value: i32, digit: char) -> Option<i32> {
    let digit = digit.to_digit(10)? as i32;
    value.checked_mul(10)?.checked_add(digit)
}

/// Resuelve el carácter que sigue a `\` en un literal.
fn escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}
