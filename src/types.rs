//! Sistema de tipos de uC.
//!
//! Los tipos básicos se distinguen por el conjunto de operadores que
//! admiten, el cual se expresa como [`Ops`]. Los arreglos y funciones
//! se construyen por declaración y se comparan estructuralmente.

use bitflags::bitflags;
use std::{
    fmt::{self, Display},
    rc::Rc,
};

bitflags! {
    /// Operadores admitidos por un tipo.
    pub struct Ops: u32 {
        const ADD = 1 << 0;
        const SUB = 1 << 1;
        const MUL = 1 << 2;
        const DIV = 1 << 3;
        const MOD = 1 << 4;

        const EQ = 1 << 5;
        const NE = 1 << 6;
        const LT = 1 << 7;
        const LE = 1 << 8;
        const GT = 1 << 9;
        const GE = 1 << 10;

        const AND = 1 << 11;
        const OR  = 1 << 12;
        const NOT = 1 << 13;

        const NEG = 1 << 14;
        const PLUS = 1 << 15;
        const INC = 1 << 16;
        const DEC = 1 << 17;

        /// Asignación simple, `=`.
        const ASSIGN = 1 << 18;

        const ARITHMETIC = Self::ADD.bits | Self::SUB.bits | Self::MUL.bits | Self::DIV.bits;
        const EQUALITY = Self::EQ.bits | Self::NE.bits;
        const ORDER = Self::LT.bits | Self::LE.bits | Self::GT.bits | Self::GE.bits;
        const SIGN = Self::NEG.bits | Self::PLUS.bits | Self::INC.bits | Self::DEC.bits;
    }
}

/// Tamaño en bytes de un `int`.
pub const INT_SIZE: u32 = 4;

/// Tamaño en bytes de un `float`.
pub const FLOAT_SIZE: u32 = 8;

/// Un tipo estático.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Char,
    Bool,
    Void,

    /// Arreglo de elementos, con tamaño estático opcional.
    Array(Box<Type>, Option<u32>),

    /// Tipo de una función.
    Function(Rc<Signature>),
}

/// Firma de una función: tipos de parámetros y de retorno.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Type {
    /// Operadores que el tipo admite.
    pub fn ops(&self) -> Ops {
        match self {
            Type::Int => Type::Float.ops() | Ops::MOD,
            Type::Float => {
                Ops::ARITHMETIC | Ops::EQUALITY | Ops::ORDER | Ops::SIGN | Ops::ASSIGN
            }

            Type::Char => Ops::EQUALITY | Ops::ASSIGN,
            Type::Bool => Ops::AND | Ops::OR | Ops::NOT | Ops::EQUALITY | Ops::ASSIGN,
            Type::Void | Type::Array(..) | Type::Function(_) => Ops::empty(),
        }
    }

    /// Determina si el tipo es `int` o `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Determina si el tipo es escalar y no es `void`.
    pub fn is_basic(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Char | Type::Bool)
    }

    /// Determina si el tipo es un arreglo de `char`, es decir, una cadena.
    pub fn is_string(&self) -> bool {
        matches!(self, Type::Array(element, _) if **element == Type::Char)
    }

    /// Tipo de los elementos, si se trata de un arreglo.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(element, _) => Some(element),
            _ => None,
        }
    }

    /// Firma, si se trata de una función.
    pub fn signature(&self) -> Option<&Rc<Signature>> {
        match self {
            Type::Function(signature) => Some(signature),
            _ => None,
        }
    }

    /// Tamaño en bytes de un valor de este tipo.
    ///
    /// Los arreglos sin tamaño conocido y las funciones no tienen
    /// tamaño; esto se reporta como `None`.
    pub fn size(&self) -> Option<u32> {
        match self {
            Type::Int => Some(INT_SIZE),
            Type::Float => Some(FLOAT_SIZE),
            Type::Char | Type::Bool => Some(1),
            Type::Void => Some(0),
            Type::Array(element, Some(length)) => {
                element.size().and_then(|size| size.checked_mul(*length))
            }

            Type::Array(_, None) | Type::Function(_) => None,
        }
    }

    /// Tipo común de dos operandos numéricos.
    ///
    /// `int` se promueve a `float` cuando los operandos difieren. Nunca
    /// ocurre la conversión inversa.
    pub fn promote(lhs: &Type, rhs: &Type) -> Option<Type> {
        match (lhs, rhs) {
            (Type::Int, Type::Int) => Some(Type::Int),
            (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => {
                Some(Type::Float)
            }

            _ => None,
        }
    }

    /// Determina si un valor de tipo `from` puede almacenarse en `self`.
    ///
    /// Se admiten tipos idénticos, ensanchamiento de `int` a `float` y
    /// arreglos de tamaño conocido hacia arreglos sin tamaño con el
    /// mismo tipo de elemento.
    pub fn accepts(&self, from: &Type) -> bool {
        match (self, from) {
            (Type::Float, Type::Int) => true,
            (Type::Array(to, None), Type::Array(from, _)) => to == from,
            (to, from) => to == from,
        }
    }

    /// Determina si existe un cast explícito de `from` a `self`.
    pub fn casts_from(&self, from: &Type) -> bool {
        matches!(
            (self, from),
            (Type::Int, Type::Int)
                | (Type::Float, Type::Float)
                | (Type::Char, Type::Char)
                | (Type::Int, Type::Float)
                | (Type::Float, Type::Int)
                | (Type::Int, Type::Char)
                | (Type::Char, Type::Int)
        )
    }
}

impl Display for Type {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => fmt.write_str("int"),
            Type::Float => fmt.write_str("float"),
            Type::Char => fmt.write_str("char"),
            Type::Bool => fmt.write_str("bool"),
            Type::Void => fmt.write_str("void"),
            Type::Array(element, Some(length)) => write!(fmt, "{}[{}]", element, length),
            Type::Array(element, None) => write!(fmt, "{}[]", element),
            Type::Function(signature) => signature.fmt(fmt),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}(", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                fmt.write_str(", ")?;
            }

            write!(fmt, "{}", param)?;
        }

        fmt.write_str(")")
    }
}
