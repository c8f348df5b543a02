//! Construcción incremental de funciones.
//!
//! [`FunctionBuilder`] mantiene la disciplina de bloques: toda
//! instrucción se agrega al bloque actual, y agregar una terminadora
//! cierra ese bloque. Código inalcanzable que no sea una terminadora
//! abre un bloque `dead.N` nuevo; una terminadora sin bloque abierto
//! se descarta, ya que ningún camino la alcanza.

use std::rc::Rc;

use super::{Block, Function, Instruction, Label, Reg, RegType};
use crate::types::Type;

pub struct FunctionBuilder {
    name: Rc<str>,
    params: Vec<Type>,
    ret: Type,
    registers: Vec<RegType>,
    blocks: Vec<Block>,
    allocs: Vec<Instruction>,
    current: Option<Label>,
    counter: u32,
}

impl FunctionBuilder {
    /// Inicia una función con su bloque `entry` abierto.
    ///
    /// Los parámetros ocupan los registros `%0..%n-1`. Los arreglos se
    /// reciben por dirección.
    pub fn new(name: Rc<str>, params: Vec<Type>, ret: Type) -> Self {
        let registers = params
            .iter()
            .map(|param| match param {
                Type::Array(..) => RegType::Address(param.clone()),
                _ => RegType::Value(param.clone()),
            })
            .collect();

        let entry = Block {
            name: String::from("entry"),
            instructions: Vec::new(),
        };

        FunctionBuilder {
            name,
            params,
            ret,
            registers,
            blocks: vec![entry],
            allocs: Vec::new(),
            current: Some(Label(0)),
            counter: 0,
        }
    }

    pub fn param(&self, index: usize) -> Reg {
        Reg(index as u32)
    }

    pub fn ret(&self) -> &Type {
        &self.ret
    }

    pub fn register(&mut self, typ: RegType) -> Reg {
        let reg = Reg(self.registers.len() as u32);
        self.registers.push(typ);
        reg
    }

    /// Reserva memoria en el bloque de entrada, sin importar el bloque actual.
    pub fn alloc(&mut self, typ: Type) -> Reg {
        let dest = self.register(RegType::Address(typ.clone()));
        self.allocs.push(Instruction::Alloc { dest, typ });
        dest
    }

    /// Siguiente número de la secuencia de etiquetas.
    pub fn next_id(&mut self) -> u32 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    /// Crea un bloque vacío sin cambiar el bloque actual.
    pub fn block(&mut self, name: String) -> Label {
        let label = Label(self.blocks.len() as u32);
        self.blocks.push(Block {
            name,
            instructions: Vec::new(),
        });

        label
    }

    pub fn switch_to(&mut self, label: Label) {
        self.current = Some(label);
    }

    /// Determina si el bloque actual ya fue cerrado.
    pub fn is_terminated(&self) -> bool {
        self.current.is_none()
    }

    pub fn push(&mut self, instruction: Instruction) {
        let label = match self.current {
            Some(label) => label,
            None if instruction.is_terminator() => return,
            None => {
                let id = self.next_id();
                let label = self.block(format!("dead.{}", id));
                self.switch_to(label);
                label
            }
        };

        if instruction.is_terminator() {
            self.current = None;
        }

        self.blocks[label.0 as usize].instructions.push(instruction);
    }

    pub fn finish(self) -> Function {
        let FunctionBuilder {
            name,
            params,
            ret,
            registers,
            mut blocks,
            allocs,
            ..
        } = self;

        blocks[0].instructions.splice(0..0, allocs);

        Function {
            name,
            params,
            ret,
            registers,
            blocks,
        }
    }
}
