//! Representación intermedia.
//!
//! La IR es de tres direcciones sobre registros virtuales. Cada
//! función es un grafo de bloques básicos; todo bloque termina en
//! exactamente una instrucción terminadora ([`Instruction::Jump`],
//! [`Instruction::Branch`] o [`Instruction::Ret`]) y ninguna otra
//! instrucción del bloque es terminadora.
//!
//! Los registros tienen un [`RegType`]: contienen un valor de un tipo
//! de uC o la dirección de un objeto de ese tipo. Las variables locales
//! viven en memoria obtenida por `alloc`, por lo que los registros
//! se asignan una única vez.

use std::{
    fmt::{self, Display},
    rc::Rc,
};

use thiserror::Error;

use crate::{lex::Identifier, types::Type};

pub mod builder;
pub mod gen;

pub use gen::generate;

/// Índice de un bloque básico dentro de su función.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

/// Registro virtual, local a una función.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reg(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum RegType {
    Value(Type),
    Address(Type),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Constant {
    Int(i32),
    Float(f64),
    Char(char),
    Bool(bool),
}

impl Constant {
    /// Cero del tipo indicado, si el tipo es escalar.
    pub fn zero(typ: &Type) -> Option<Constant> {
        match typ {
            Type::Int => Some(Constant::Int(0)),
            Type::Float => Some(Constant::Float(0.0)),
            Type::Char => Some(Constant::Char('\0')),
            Type::Bool => Some(Constant::Bool(false)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Reg(Reg),
    Const(Constant),

    /// Dirección de una variable global.
    Global(Rc<str>),
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<Constant> for Operand {
    fn from(constant: Constant) -> Self {
        Operand::Const(constant)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    IntToFloat,
    FloatToInt,
    CharToInt,
    IntToChar,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Reserva memoria para un objeto de tipo `typ`; `dest` es su dirección.
    Alloc { dest: Reg, typ: Type },

    Load { dest: Reg, address: Operand },
    Store { value: Operand, address: Operand },

    /// `dest = base + bytes`, aritmética de direcciones.
    Offset { dest: Reg, base: Operand, bytes: Operand },

    Binary {
        dest: Reg,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },

    Compare {
        dest: Reg,
        op: CompareOp,
        lhs: Operand,
        rhs: Operand,
    },

    Unary {
        dest: Reg,
        op: UnaryOp,
        operand: Operand,
    },

    Convert {
        dest: Reg,
        conversion: Conversion,
        operand: Operand,
    },

    /// Argumento para la siguiente llamada, en orden de parámetros.
    Param(Operand),

    /// Consume las `args` instrucciones `param` previas.
    Call {
        dest: Option<Reg>,
        function: Rc<str>,
        args: u32,
    },

    Print { value: Operand, typ: Type },
    Read { address: Operand, typ: Type },

    Jump(Label),

    Branch {
        condition: Operand,
        then: Label,
        otherwise: Label,
    },

    Ret(Option<Operand>),
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump(_) | Instruction::Branch { .. } | Instruction::Ret(_)
        )
    }

    /// Bloques a los que puede transferir control.
    pub fn successors(&self) -> Vec<Label> {
        match self {
            Instruction::Jump(target) => vec![*target],
            Instruction::Branch {
                then, otherwise, ..
            } => vec![*then, *otherwise],
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .filter(|instruction| instruction.is_terminator())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: Rc<str>,
    pub params: Vec<Type>,
    pub ret: Type,

    /// Tipos de los registros, indexados por [`Reg`].
    pub registers: Vec<RegType>,

    /// El bloque de entrada es siempre el primero.
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, Label(label): Label) -> &Block {
        &self.blocks[label as usize]
    }

    pub fn register_type(&self, Reg(reg): Reg) -> &RegType {
        &self.registers[reg as usize]
    }
}

/// Contenido inicial de una global.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Scalar(Constant),

    /// Elementos escalares en orden de fila, agrupados en corridas.
    Array(Vec<Run>),

    Str(Rc<str>),
}

/// `count` copias consecutivas de un mismo valor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Run {
    pub value: Constant,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    pub name: Rc<str>,
    pub typ: Type,
    pub init: Option<Data>,
}

/// Salida de la generación de código intermedio.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

/// Invariante interna violada durante la generación de IR.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Block `{block}` in function `{function}` does not end in a terminator")]
    Unterminated { function: Rc<str>, block: String },

    #[error("Block `{block}` in function `{function}` has a terminator before its end")]
    EarlyTerminator { function: Rc<str>, block: String },

    #[error("Function `{function}` branches to nonexistent block {label}")]
    BadLabel { function: Rc<str>, label: u32 },

    #[error("Expression reached code generation without a resolved type")]
    Untyped,

    #[error("Identifier `{0}` reached code generation without a resolved symbol")]
    Unresolved(Identifier),

    #[error("`break` reached code generation outside of a loop")]
    BreakOutsideLoop,

    #[error("Initializer for global `{0}` is not constant")]
    NonConstant(Identifier),

    #[error("Value of a `void` expression was used")]
    VoidValue,

    #[error("Malformed tree reached code generation: {0}")]
    Malformed(&'static str),
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions
            .iter()
            .find(|function| &*function.name == name)
    }

    /// Verifica la invariante de terminadores y la validez de las etiquetas.
    pub fn verify(&self) -> Result<(), GenError> {
        for function in &self.functions {
            let count = function.blocks.len() as u32;

            for block in &function.blocks {
                let error = |unterminated: bool| {
                    let function = function.name.clone();
                    let block = block.name.clone();

                    if unterminated {
                        GenError::Unterminated { function, block }
                    } else {
                        GenError::EarlyTerminator { function, block }
                    }
                };

                let (last, rest) = match block.instructions.split_last() {
                    Some(split) => split,
                    None => return Err(error(true)),
                };

                if !last.is_terminator() {
                    return Err(error(true));
                } else if rest.iter().any(Instruction::is_terminator) {
                    return Err(error(false));
                }

                for Label(label) in last.successors() {
                    if label >= count {
                        return Err(GenError::BadLabel {
                            function: function.name.clone(),
                            label,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Display for Module {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            write!(fmt, "@{} = global {}", global.name, global.typ)?;
            match &global.init {
                None => writeln!(fmt)?,
                Some(Data::Scalar(constant)) => writeln!(fmt, " {}", constant)?,
                Some(Data::Str(string)) => writeln!(fmt, " {:?}", string)?,
                Some(Data::Array(runs)) => {
                    fmt.write_str(" {")?;
                    for (i, run) in runs.iter().enumerate() {
                        if i > 0 {
                            fmt.write_str(", ")?;
                        }

                        match run.count {
                            1 => write!(fmt, "{}", run.value)?,
                            count => write!(fmt, "{} x {}", run.value, count)?,
                        }
                    }

                    writeln!(fmt, "}}")?;
                }
            }
        }

        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 || !self.globals.is_empty() {
                writeln!(fmt)?;
            }

            write!(fmt, "function {} @{}(", function.ret, function.name)?;
            for (i, param) in function.params.iter().enumerate() {
                if i > 0 {
                    fmt.write_str(", ")?;
                }

                write!(fmt, "{} %{}", param, i)?;
            }

            writeln!(fmt, ") {{")?;
            for block in &function.blocks {
                writeln!(fmt, "{}:", block.name)?;
                for instruction in &block.instructions {
                    instruction.write(fmt, function)?;
                }
            }

            writeln!(fmt, "}}")?;
        }

        Ok(())
    }
}

impl Instruction {
    fn write(&self, fmt: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result {
        use Instruction::*;

        let label = |label: &Label| function.block(*label).name.as_str();

        match self {
            Alloc { dest, typ } => emit!(fmt, "alloc", "{}, {}", dest, typ),
            Load { dest, address } => emit!(fmt, "load", "{}, {}", dest, address),
            Store { value, address } => emit!(fmt, "store", "{}, {}", value, address),
            Offset { dest, base, bytes } => emit!(fmt, "offset", "{}, {}, {}", dest, base, bytes),

            Binary { dest, op, lhs, rhs } => {
                let opcode = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => "mul",
                    BinaryOp::Div => "div",
                    BinaryOp::Mod => "mod",
                };

                emit!(fmt, opcode, "{}, {}, {}", dest, lhs, rhs)
            }

            Compare { dest, op, lhs, rhs } => {
                let opcode = match op {
                    CompareOp::Eq => "eq",
                    CompareOp::Ne => "ne",
                    CompareOp::Lt => "lt",
                    CompareOp::Le => "le",
                    CompareOp::Gt => "gt",
                    CompareOp::Ge => "ge",
                };

                emit!(fmt, opcode, "{}, {}, {}", dest, lhs, rhs)
            }

            Unary { dest, op, operand } => {
                let opcode = match op {
                    UnaryOp::Neg => "neg",
                    UnaryOp::Not => "not",
                };

                emit!(fmt, opcode, "{}, {}", dest, operand)
            }

            Convert {
                dest,
                conversion,
                operand,
            } => {
                let opcode = match conversion {
                    Conversion::IntToFloat => "sitofp",
                    Conversion::FloatToInt => "fptosi",
                    Conversion::CharToInt => "zext",
                    Conversion::IntToChar => "trunc",
                };

                emit!(fmt, opcode, "{}, {}", dest, operand)
            }

            Param(value) => emit!(fmt, "param", "{}", value),

            Call {
                dest: Some(dest),
                function,
                args,
            } => emit!(fmt, "call", "{}, @{}, {}", dest, function, args),

            Call {
                dest: None,
                function,
                args,
            } => emit!(fmt, "call", "@{}, {}", function, args),

            Print { value, typ } => emit!(fmt, "print", "{} {}", typ, value),
            Read { address, typ } => emit!(fmt, "read", "{} {}", typ, address),
            Jump(target) => emit!(fmt, "jump", "{}", label(target)),

            Branch {
                condition,
                then,
                otherwise,
            } => emit!(
                fmt,
                "branch",
                "{}, {}, {}",
                condition,
                label(then),
                label(otherwise)
            ),

            Ret(Some(value)) => emit!(fmt, "ret", "{}", value),
            Ret(None) => emit!(fmt, "ret"),
        }
    }
}

impl Display for Reg {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "%{}", self.0)
    }
}

impl Display for Constant {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(integer) => write!(fmt, "{}", integer),
            Constant::Float(float) => write!(fmt, "{:?}", float),
            Constant::Char(c) => write!(fmt, "{:?}", c),
            Constant::Bool(boolean) => write!(fmt, "{}", boolean),
        }
    }
}

impl Display for Operand {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => reg.fmt(fmt),
            Operand::Const(constant) => constant.fmt(fmt),
            Operand::Global(name) => write!(fmt, "@{}", name),
        }
    }
}

impl Display for RegType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegType::Value(typ) => typ.fmt(fmt),
            RegType::Address(typ) => write!(fmt, "{}*", typ),
        }
    }
}
