//! Árbol sintáctico abstracto.
//!
//! Cada nodo es dueño exclusivo de sus hijos. El análisis semántico
//! muta el árbol en sitio: toda expresión recibe un tipo resuelto y
//! todo uso de un identificador recibe un [`SymbolId`] que indexa la
//! arena de símbolos de [`crate::semantic::scope::SymbolTable`].

use crate::{
    lex::Identifier,
    semantic::scope::SymbolId,
    source::Located,
    types::Type,
};

use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// Raíz de una unidad de traducción.
#[derive(Debug)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Declaración de nivel superior.
#[derive(Debug)]
pub enum Item {
    Function(FunctionDef),
    Global(Vec<Declaration>),
}

/// Definición de una función con cuerpo.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: Located<Identifier>,

    /// Siempre [`Type::Function`].
    pub typ: Located<Type>,

    pub params: Vec<Declaration>,
    pub body: Block,
    pub symbol: Option<SymbolId>,
}

/// Declaración de una variable, un parámetro o un prototipo.
#[derive(Debug)]
pub struct Declaration {
    pub name: Located<Identifier>,
    pub typ: Located<Type>,
    pub init: Option<Located<Initializer>>,
    pub symbol: Option<SymbolId>,
}

#[derive(Debug)]
pub enum Initializer {
    Expr(Located<Expr>),
    List(Vec<Located<Initializer>>),
}

/// Secuencia de declaraciones y sentencias entre llaves.
#[derive(Debug, Default)]
pub struct Block {
    pub items: Vec<Located<Statement>>,
}

#[derive(Debug)]
pub enum Statement {
    Declaration(Vec<Declaration>),
    Expr(Located<Expr>),
    Empty,
    Block(Block),

    If {
        condition: Located<Expr>,
        then: Box<Located<Statement>>,
        otherwise: Option<Box<Located<Statement>>>,
    },

    While {
        condition: Located<Expr>,
        body: Box<Located<Statement>>,
    },

    For {
        init: Option<ForInit>,
        condition: Option<Located<Expr>>,
        step: Option<Located<Expr>>,
        body: Box<Located<Statement>>,
    },

    Break,
    Return(Option<Located<Expr>>),
    Assert(Located<Expr>),
    Print(Vec<Located<Expr>>),
    Read(Vec<Located<Expr>>),
}

#[derive(Debug)]
pub enum ForInit {
    Declaration(Vec<Declaration>),
    Expr(Located<Expr>),
}

/// Una expresión junto con su tipo resuelto.
///
/// `typ` es `None` hasta que el análisis semántico lo asigna.
#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub typ: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr { kind, typ: None }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Literal(Literal),

    Id {
        name: Identifier,
        symbol: Option<SymbolId>,
    },

    Binary(Box<Located<Expr>>, BinOp, Box<Located<Expr>>),
    Unary(UnOp, Box<Located<Expr>>),

    /// `target = value` o una asignación compuesta como `target += value`.
    Assign {
        op: Option<BinOp>,
        target: Box<Located<Expr>>,
        value: Box<Located<Expr>>,
    },

    Call {
        function: Located<Identifier>,
        args: Vec<Located<Expr>>,
        symbol: Option<SymbolId>,
    },

    Index(Box<Located<Expr>>, Box<Located<Expr>>),
    Cast(Located<Type>, Box<Located<Expr>>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f64),
    Char(char),
    Bool(bool),
    Str(Rc<str>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

impl BinOp {
    /// Determina si el operador produce `bool` a partir de operandos comparables.
    pub fn is_comparison(self) -> bool {
        use BinOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessOrEqual | Greater | GreaterOrEqual
        )
    }

    /// Determina si el operador es `&&` o `||`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl Display for BinOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinOp::*;

        let string = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessOrEqual => "<=",
            Greater => ">",
            GreaterOrEqual => ">=",
            And => "&&",
            Or => "||",
        };

        fmt.write_str(string)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Plus,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnOp {
    /// Determina si el operador escribe sobre su operando.
    pub fn mutates(self) -> bool {
        use UnOp::*;
        matches!(
            self,
            PreIncrement | PreDecrement | PostIncrement | PostDecrement
        )
    }
}

impl Display for UnOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnOp::*;

        let string = match self {
            Negate => "-",
            Plus => "+",
            Not => "!",
            PreIncrement | PostIncrement => "++",
            PreDecrement | PostDecrement => "--",
        };

        fmt.write_str(string)
    }
}
