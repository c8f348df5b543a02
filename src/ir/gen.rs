//! Generación de IR a partir del árbol anotado.
//!
//! Esta fase asume un árbol sin errores semánticos: todo nodo de
//! expresión tiene tipo y todo identificador tiene símbolo. Cualquier
//! violación de esto es un defecto del compilador y se reporta como
//! [`GenError`], nunca como error de usuario.

use std::{collections::HashMap, rc::Rc};

use log::trace;

use super::{
    builder::FunctionBuilder, BinaryOp, CompareOp, Constant, Conversion, Data, Function,
    GenError, Global, Instruction, Label, Module, Operand, Reg, RegType, Run, UnaryOp,
};

use crate::{
    lex::Identifier,
    parse::ast::{self, *},
    semantic::scope::{SymbolId, SymbolTable},
    source::Located,
    types::Type,
};

type Gen<T> = Result<T, GenError>;

/// Colas de ceros de hasta este largo se escriben sin ciclo.
const UNROLLED_ZEROS: u32 = 16;

const OUT_OF_RANGE: GenError = GenError::Malformed("byte count exceeds the range of `int`");

/// Traduce un programa verificado a un módulo de IR.
///
/// El módulo resultante ya fue verificado con [`Module::verify`].
pub fn generate(program: &Program, symbols: &SymbolTable) -> Gen<Module> {
    let mut module = ModuleGen {
        symbols,
        globals: Vec::new(),
        strings: 0,
        asserts: 0,
    };

    let mut functions = Vec::new();
    for item in &program.items {
        match item {
            Item::Global(declarations) => {
                for declaration in declarations {
                    if declaration.typ.val().signature().is_none() {
                        module.global(declaration)?;
                    }
                }
            }

            Item::Function(function) => functions.push(module.function(function)?),
        }
    }

    let module = Module {
        globals: module.globals,
        functions,
    };

    module.verify()?;
    Ok(module)
}

struct ModuleGen<'a> {
    symbols: &'a SymbolTable,
    globals: Vec<Global>,
    strings: u32,
    asserts: u32,
}

impl ModuleGen<'_> {
    fn global(&mut self, declaration: &Declaration) -> Gen<()> {
        let name = declaration.name.val();
        let typ = declaration.typ.val().clone();

        let init = match &declaration.init {
            Some(init) => Some(data(init, &typ, name)?),
            None => None,
        };

        self.globals.push(Global {
            name: symbol_name(name),
            typ,
            init,
        });

        Ok(())
    }

    fn string_literal(&mut self, text: &Rc<str>) -> Operand {
        let name = format!(".str.{}", self.strings);
        self.strings += 1;

        self.intern(name, text.clone())
    }

    fn assert_message(&mut self, text: String) -> (Operand, Type) {
        let name = format!(".assert.{}", self.asserts);
        self.asserts += 1;

        let typ = string_type(&text);
        (self.intern(name, Rc::from(text)), typ)
    }

    fn intern(&mut self, name: String, text: Rc<str>) -> Operand {
        let name: Rc<str> = Rc::from(name);
        self.globals.push(Global {
            name: name.clone(),
            typ: string_type(&text),
            init: Some(Data::Str(text)),
        });

        Operand::Global(name)
    }

    fn function(&mut self, function: &FunctionDef) -> Gen<Function> {
        let signature = match function.typ.val().signature() {
            Some(signature) => signature.clone(),
            None => return Err(GenError::Untyped),
        };

        let name = symbol_name(function.name.val());
        trace!("lowering function `{}`", name);

        let builder = FunctionBuilder::new(name, signature.params.clone(), signature.ret.clone());
        let mut context = Context {
            module: self,
            builder,
            slots: HashMap::new(),
            loops: Vec::new(),
        };

        for (index, param) in function.params.iter().enumerate() {
            let id = resolved(param.symbol, param.name.val())?;
            let reg = context.builder.param(index);

            // Los arreglos se reciben por dirección y se usan en sitio
            let address = match param.typ.val() {
                Type::Array(..) => reg,
                typ => {
                    let slot = context.builder.alloc(typ.clone());
                    context.builder.push(Instruction::Store {
                        value: reg.into(),
                        address: slot.into(),
                    });

                    slot
                }
            };

            context.slots.insert(id, address);
        }

        context.block(&function.body)?;

        if !context.builder.is_terminated() {
            let value = Constant::zero(&signature.ret).map(Operand::Const);
            context.builder.push(Instruction::Ret(value));
        }

        Ok(context.builder.finish())
    }
}

struct Context<'g, 'a> {
    module: &'g mut ModuleGen<'a>,
    builder: FunctionBuilder,
    slots: HashMap<SymbolId, Reg>,
    loops: Vec<Label>,
}

impl Context<'_, '_> {
    fn block(&mut self, block: &ast::Block) -> Gen<()> {
        for statement in &block.items {
            self.statement(statement)?;
        }

        Ok(())
    }

    fn statement(&mut self, statement: &Located<Statement>) -> Gen<()> {
        match statement.val() {
            Statement::Declaration(declarations) => {
                for declaration in declarations {
                    self.local(declaration)?;
                }
            }

            Statement::Expr(expr) => self.effect(expr)?,
            Statement::Empty => (),
            Statement::Block(block) => self.block(block)?,

            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                let id = self.builder.next_id();
                let condition = self.expr(condition)?;

                let then_label = self.builder.block(format!("if.then.{}", id));
                let else_label = match otherwise {
                    Some(_) => Some(self.builder.block(format!("if.else.{}", id))),
                    None => None,
                };

                let end = self.builder.block(format!("if.end.{}", id));

                self.builder.push(Instruction::Branch {
                    condition,
                    then: then_label,
                    otherwise: else_label.unwrap_or(end),
                });

                self.builder.switch_to(then_label);
                self.statement(then)?;
                self.builder.push(Instruction::Jump(end));

                if let (Some(otherwise), Some(else_label)) = (otherwise, else_label) {
                    self.builder.switch_to(else_label);
                    self.statement(otherwise)?;
                    self.builder.push(Instruction::Jump(end));
                }

                self.builder.switch_to(end);
            }

            Statement::While { condition, body } => {
                let id = self.builder.next_id();
                let header = self.builder.block(format!("while.cond.{}", id));
                let body_label = self.builder.block(format!("while.body.{}", id));
                let end = self.builder.block(format!("while.end.{}", id));

                self.builder.push(Instruction::Jump(header));
                self.builder.switch_to(header);

                let condition = self.expr(condition)?;
                self.builder.push(Instruction::Branch {
                    condition,
                    then: body_label,
                    otherwise: end,
                });

                self.builder.switch_to(body_label);
                self.loop_body(body, end)?;
                self.builder.push(Instruction::Jump(header));

                self.builder.switch_to(end);
            }

            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                match init {
                    Some(ForInit::Declaration(declarations)) => {
                        for declaration in declarations {
                            self.local(declaration)?;
                        }
                    }

                    Some(ForInit::Expr(expr)) => self.effect(expr)?,
                    None => (),
                }

                let id = self.builder.next_id();
                let header = self.builder.block(format!("for.cond.{}", id));
                let body_label = self.builder.block(format!("for.body.{}", id));
                let end = self.builder.block(format!("for.end.{}", id));

                self.builder.push(Instruction::Jump(header));
                self.builder.switch_to(header);

                match condition {
                    Some(condition) => {
                        let condition = self.expr(condition)?;
                        self.builder.push(Instruction::Branch {
                            condition,
                            then: body_label,
                            otherwise: end,
                        });
                    }

                    None => self.builder.push(Instruction::Jump(body_label)),
                }

                self.builder.switch_to(body_label);
                self.loop_body(body, end)?;

                if let Some(step) = step {
                    self.effect(step)?;
                }

                self.builder.push(Instruction::Jump(header));
                self.builder.switch_to(end);
            }

            Statement::Break => {
                let target = *self.loops.last().ok_or(GenError::BreakOutsideLoop)?;
                self.builder.push(Instruction::Jump(target));
            }

            Statement::Return(None) => self.builder.push(Instruction::Ret(None)),

            Statement::Return(Some(value)) => {
                let typ = type_of(value)?;
                let value = if *typ == Type::Void {
                    self.effect(value)?;
                    None
                } else {
                    let ret = self.builder.ret().clone();
                    let result = self.expr(value)?;
                    Some(self.convert(result, typ, &ret))
                };

                self.builder.push(Instruction::Ret(value));
            }

            Statement::Assert(condition) => {
                let id = self.builder.next_id();
                let condition = self.expr(condition)?;

                let success = self.builder.block(format!("assert.true.{}", id));
                let failure = self.builder.block(format!("assert.false.{}", id));

                self.builder.push(Instruction::Branch {
                    condition,
                    then: success,
                    otherwise: failure,
                });

                self.builder.switch_to(failure);

                let message = format!("assertion_fail on {}", statement.location().start());
                let (value, typ) = self.module.assert_message(message);
                self.builder.push(Instruction::Print { value, typ });

                let zero = Constant::zero(self.builder.ret()).map(Operand::Const);
                self.builder.push(Instruction::Ret(zero));

                self.builder.switch_to(success);
            }

            Statement::Print(values) => {
                if values.is_empty() {
                    self.builder.push(Instruction::Print {
                        value: Constant::Char('\n').into(),
                        typ: Type::Char,
                    });
                }

                for value in values {
                    let typ = type_of(value)?.clone();
                    let value = self.expr(value)?;
                    self.builder.push(Instruction::Print { value, typ });
                }
            }

            Statement::Read(targets) => {
                for target in targets {
                    let typ = type_of(target)?.clone();
                    let address = self.address(target)?;
                    self.builder.push(Instruction::Read { address, typ });
                }
            }
        }

        Ok(())
    }

    fn loop_body(&mut self, body: &Located<Statement>, end: Label) -> Gen<()> {
        self.loops.push(end);
        let result = self.statement(body);
        self.loops.pop();

        result
    }

    fn local(&mut self, declaration: &Declaration) -> Gen<()> {
        let id = resolved(declaration.symbol, declaration.name.val())?;
        let typ = declaration.typ.val();

        let slot = self.builder.alloc(typ.clone());
        self.slots.insert(id, slot);

        if let Some(init) = &declaration.init {
            self.initialize(slot.into(), typ, init)?;
        }

        Ok(())
    }

    fn initialize(
        &mut self,
        address: Operand,
        typ: &Type,
        init: &Located<Initializer>,
    ) -> Gen<()> {
        match (typ, init.val()) {
            (Type::Array(element, size), Initializer::List(items)) => {
                let stride = stride(element)?;
                let filled = items.len() as u32;

                for (index, item) in (0..filled).zip(items) {
                    let element_address = self.offset(address.clone(), index * stride, element)?;
                    self.initialize(element_address, element, item)?;
                }

                // Los elementos sin inicializador forman una cola contigua de ceros
                let missing = size.unwrap_or(filled).saturating_sub(filled);
                if missing > 0 {
                    let (scalar, per_element) = scalars(element)?;
                    let count = per_element.checked_mul(missing).ok_or(OUT_OF_RANGE)?;

                    let tail = self.offset(address, filled * stride, scalar)?;
                    self.zero_run(tail, scalar, count)?;
                }
            }

            (Type::Array(_, size), Initializer::Expr(expr)) => {
                let text = match &expr.val().kind {
                    ExprKind::Literal(Literal::Str(text)) => text,
                    _ => return Err(GenError::Malformed("array initialized from an expression")),
                };

                let written = text.chars().count() as u32;
                for (index, c) in (0..written).zip(text.chars()) {
                    let char_address = self.offset(address.clone(), index, &Type::Char)?;
                    self.builder.push(Instruction::Store {
                        value: Constant::Char(c).into(),
                        address: char_address,
                    });
                }

                let missing = size.unwrap_or(written).saturating_sub(written);
                if missing > 0 {
                    let tail = self.offset(address, written, &Type::Char)?;
                    self.zero_run(tail, &Type::Char, missing)?;
                }
            }

            (typ, Initializer::Expr(expr)) => {
                let value = self.expr(expr)?;
                let value = self.convert(value, type_of(expr)?, typ);

                self.builder.push(Instruction::Store { value, address });
            }

            (_, Initializer::List(_)) => {
                return Err(GenError::Malformed("initializer list for a scalar"))
            }
        }

        Ok(())
    }

    /// Escribe `count` ceros consecutivos de tipo `scalar` a partir de `address`.
    ///
    /// Las colas cortas se escriben una por una; las largas, con un ciclo.
    fn zero_run(&mut self, address: Operand, scalar: &Type, count: u32) -> Gen<()> {
        let zero = Constant::zero(scalar).ok_or(GenError::Untyped)?;
        let size = stride(scalar)?;

        if count <= UNROLLED_ZEROS {
            for index in 0..count {
                let address = self.offset(address.clone(), index * size, scalar)?;
                self.builder.push(Instruction::Store {
                    value: zero.into(),
                    address,
                });
            }

            return Ok(());
        }

        let counter = self.builder.alloc(Type::Int);
        self.builder.push(Instruction::Store {
            value: Constant::Int(0).into(),
            address: counter.into(),
        });

        let id = self.builder.next_id();
        let header = self.builder.block(format!("fill.cond.{}", id));
        let body = self.builder.block(format!("fill.body.{}", id));
        let end = self.builder.block(format!("fill.end.{}", id));

        self.builder.push(Instruction::Jump(header));
        self.builder.switch_to(header);

        let index = self.load(counter.into(), &Type::Int);
        let more = self.builder.register(RegType::Value(Type::Bool));
        self.builder.push(Instruction::Compare {
            dest: more,
            op: CompareOp::Lt,
            lhs: index.clone(),
            rhs: Constant::Int(int(count)?).into(),
        });

        self.builder.push(Instruction::Branch {
            condition: more.into(),
            then: body,
            otherwise: end,
        });

        self.builder.switch_to(body);

        let bytes = self.builder.register(RegType::Value(Type::Int));
        self.builder.push(Instruction::Binary {
            dest: bytes,
            op: BinaryOp::Mul,
            lhs: index.clone(),
            rhs: Constant::Int(int(size)?).into(),
        });

        let target = self.builder.register(RegType::Address(scalar.clone()));
        self.builder.push(Instruction::Offset {
            dest: target,
            base: address,
            bytes: bytes.into(),
        });

        self.builder.push(Instruction::Store {
            value: zero.into(),
            address: target.into(),
        });

        let next = self.builder.register(RegType::Value(Type::Int));
        self.builder.push(Instruction::Binary {
            dest: next,
            op: BinaryOp::Add,
            lhs: index,
            rhs: Constant::Int(1).into(),
        });

        self.builder.push(Instruction::Store {
            value: next.into(),
            address: counter.into(),
        });

        self.builder.push(Instruction::Jump(header));
        self.builder.switch_to(end);

        Ok(())
    }

    /// Evalúa una expresión únicamente por sus efectos.
    fn effect(&mut self, expr: &Located<Expr>) -> Gen<()> {
        match &expr.val().kind {
            ExprKind::Call {
                function,
                args,
                symbol,
            } => {
                self.call(function, args, *symbol)?;
            }

            _ => {
                self.expr(expr)?;
            }
        }

        Ok(())
    }

    fn expr(&mut self, expr: &Located<Expr>) -> Gen<Operand> {
        let typ = type_of(expr)?;

        match &expr.val().kind {
            ExprKind::Literal(literal) => {
                let constant = match literal {
                    Literal::Int(integer) => Constant::Int(*integer),
                    Literal::Float(float) => Constant::Float(*float),
                    Literal::Char(c) => Constant::Char(*c),
                    Literal::Bool(boolean) => Constant::Bool(*boolean),
                    Literal::Str(text) => return Ok(self.module.string_literal(text)),
                };

                Ok(constant.into())
            }

            // Un arreglo se evalúa a su dirección
            ExprKind::Id { .. } | ExprKind::Index(..) => {
                let address = self.address(expr)?;
                match typ {
                    Type::Array(..) => Ok(address),
                    _ => Ok(self.load(address, typ)),
                }
            }

            ExprKind::Binary(lhs, op, rhs) if op.is_logical() => self.logical(*op, lhs, rhs),

            ExprKind::Binary(lhs, op, rhs) => {
                let lhs_value = self.expr(lhs)?;
                let rhs_value = self.expr(rhs)?;

                let (result, _) =
                    self.binary(*op, lhs_value, type_of(lhs)?, rhs_value, type_of(rhs)?)?;

                Ok(result)
            }

            ExprKind::Unary(op, operand) => self.unary(*op, operand, typ),

            ExprKind::Assign { op, target, value } => {
                // El destino se evalúa antes que el valor
                let address = self.address(target)?;
                let target_type = type_of(target)?;

                let mut result = self.expr(value)?;
                let mut result_type = type_of(value)?.clone();

                if let Some(op) = op {
                    let current = self.load(address.clone(), target_type);
                    let (combined, combined_type) =
                        self.binary(*op, current, target_type, result, &result_type)?;

                    result = combined;
                    result_type = combined_type;
                }

                let stored = self.convert(result, &result_type, target_type);
                self.builder.push(Instruction::Store {
                    value: stored.clone(),
                    address,
                });

                Ok(stored)
            }

            ExprKind::Call {
                function,
                args,
                symbol,
            } => self
                .call(function, args, *symbol)?
                .map(Operand::Reg)
                .ok_or(GenError::VoidValue),

            ExprKind::Cast(target, operand) => {
                let value = self.expr(operand)?;
                Ok(self.convert(value, type_of(operand)?, target.val()))
            }
        }
    }

    /// Dirección de un lvalue o de un arreglo.
    fn address(&mut self, expr: &Located<Expr>) -> Gen<Operand> {
        match &expr.val().kind {
            ExprKind::Id { name, symbol } => {
                let id = resolved(*symbol, name)?;
                if let Some(slot) = self.slots.get(&id) {
                    return Ok((*slot).into());
                }

                let symbol = self.module.symbols.symbol(id);
                if symbol.is_global() {
                    Ok(Operand::Global(symbol_name(&symbol.name)))
                } else {
                    Err(GenError::Unresolved(name.clone()))
                }
            }

            ExprKind::Index(base, index) => {
                let element = type_of(expr)?;
                let base = self.expr(base)?;
                let index = self.expr(index)?;

                let bytes = self.builder.register(RegType::Value(Type::Int));
                self.builder.push(Instruction::Binary {
                    dest: bytes,
                    op: BinaryOp::Mul,
                    lhs: index,
                    rhs: Constant::Int(int(stride(element)?)?).into(),
                });

                let dest = self.builder.register(RegType::Address(element.clone()));
                self.builder.push(Instruction::Offset {
                    dest,
                    base,
                    bytes: bytes.into(),
                });

                Ok(dest.into())
            }

            _ => Err(GenError::Malformed("address of a non-lvalue")),
        }
    }

    fn unary(&mut self, op: UnOp, operand: &Located<Expr>, typ: &Type) -> Gen<Operand> {
        let negation = match op {
            UnOp::Plus => return self.expr(operand),
            UnOp::Negate => Some(UnaryOp::Neg),
            UnOp::Not => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(negation) = negation {
            let value = self.expr(operand)?;
            let dest = self.builder.register(RegType::Value(typ.clone()));

            self.builder.push(Instruction::Unary {
                dest,
                op: negation,
                operand: value,
            });

            return Ok(dest.into());
        }

        let address = self.address(operand)?;
        let old = self.load(address.clone(), typ);

        let one = match typ {
            Type::Float => Constant::Float(1.0),
            _ => Constant::Int(1),
        };

        let step = match op {
            UnOp::PreIncrement | UnOp::PostIncrement => BinaryOp::Add,
            _ => BinaryOp::Sub,
        };

        let new = self.builder.register(RegType::Value(typ.clone()));
        self.builder.push(Instruction::Binary {
            dest: new,
            op: step,
            lhs: old.clone(),
            rhs: one.into(),
        });

        self.builder.push(Instruction::Store {
            value: new.into(),
            address,
        });

        match op {
            UnOp::PreIncrement | UnOp::PreDecrement => Ok(new.into()),
            _ => Ok(old),
        }
    }

    fn binary(
        &mut self,
        op: BinOp,
        lhs: Operand,
        lhs_type: &Type,
        rhs: Operand,
        rhs_type: &Type,
    ) -> Gen<(Operand, Type)> {
        let common = match Type::promote(lhs_type, rhs_type) {
            Some(common) => common,
            None => lhs_type.clone(),
        };

        let lhs = self.convert(lhs, lhs_type, &common);
        let rhs = self.convert(rhs, rhs_type, &common);

        let arithmetic = match op {
            BinOp::Add => Some(BinaryOp::Add),
            BinOp::Sub => Some(BinaryOp::Sub),
            BinOp::Mul => Some(BinaryOp::Mul),
            BinOp::Div => Some(BinaryOp::Div),
            BinOp::Mod => Some(BinaryOp::Mod),
            _ => None,
        };

        if let Some(arithmetic) = arithmetic {
            let dest = self.builder.register(RegType::Value(common.clone()));
            self.builder.push(Instruction::Binary {
                dest,
                op: arithmetic,
                lhs,
                rhs,
            });

            return Ok((dest.into(), common));
        }

        let comparison = match op {
            BinOp::Equal => CompareOp::Eq,
            BinOp::NotEqual => CompareOp::Ne,
            BinOp::Less => CompareOp::Lt,
            BinOp::LessOrEqual => CompareOp::Le,
            BinOp::Greater => CompareOp::Gt,
            BinOp::GreaterOrEqual => CompareOp::Ge,
            _ => return Err(GenError::Malformed("eager logical operator")),
        };

        let dest = self.builder.register(RegType::Value(Type::Bool));
        self.builder.push(Instruction::Compare {
            dest,
            op: comparison,
            lhs,
            rhs,
        });

        Ok((dest.into(), Type::Bool))
    }

    /// `&&` y `||` con cortocircuito.
    ///
    /// El resultado se acumula en una ranura de memoria: el operando
    /// izquierdo se guarda siempre y el derecho solo se evalúa, y
    /// sobrescribe la ranura, cuando el izquierdo no decide el resultado.
    fn logical(&mut self, op: BinOp, lhs: &Located<Expr>, rhs: &Located<Expr>) -> Gen<Operand> {
        let prefix = match op {
            BinOp::And => "and",
            _ => "or",
        };

        let id = self.builder.next_id();
        let slot = self.builder.alloc(Type::Bool);

        let lhs = self.expr(lhs)?;
        self.builder.push(Instruction::Store {
            value: lhs.clone(),
            address: slot.into(),
        });

        let rhs_label = self.builder.block(format!("{}.rhs.{}", prefix, id));
        let end = self.builder.block(format!("{}.end.{}", prefix, id));

        let (then, otherwise) = match op {
            BinOp::And => (rhs_label, end),
            _ => (end, rhs_label),
        };

        self.builder.push(Instruction::Branch {
            condition: lhs,
            then,
            otherwise,
        });

        self.builder.switch_to(rhs_label);
        let rhs = self.expr(rhs)?;
        self.builder.push(Instruction::Store {
            value: rhs,
            address: slot.into(),
        });

        self.builder.push(Instruction::Jump(end));
        self.builder.switch_to(end);

        Ok(self.load(slot.into(), &Type::Bool))
    }

    fn call(
        &mut self,
        function: &Located<Identifier>,
        args: &[Located<Expr>],
        symbol: Option<SymbolId>,
    ) -> Gen<Option<Reg>> {
        let id = resolved(symbol, function.val())?;
        let signature = match self.module.symbols.symbol(id).typ.signature() {
            Some(signature) => signature.clone(),
            None => return Err(GenError::Unresolved(function.val().clone())),
        };

        // Todos los argumentos se evalúan antes de pasar el primero
        let mut values = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(signature.params.iter()) {
            let value = self.expr(arg)?;
            values.push(self.convert(value, type_of(arg)?, param));
        }

        for value in values {
            self.builder.push(Instruction::Param(value));
        }

        let dest = match &signature.ret {
            Type::Void => None,
            ret => Some(self.builder.register(RegType::Value(ret.clone()))),
        };

        self.builder.push(Instruction::Call {
            dest,
            function: symbol_name(function.val()),
            args: args.len() as u32,
        });

        Ok(dest)
    }

    fn load(&mut self, address: Operand, typ: &Type) -> Operand {
        let dest = self.builder.register(RegType::Value(typ.clone()));
        self.builder.push(Instruction::Load { dest, address });

        dest.into()
    }

    fn offset(&mut self, base: Operand, bytes: u32, element: &Type) -> Gen<Operand> {
        let bytes = Constant::Int(int(bytes)?).into();
        let dest = self.builder.register(RegType::Address(element.clone()));
        self.builder.push(Instruction::Offset { dest, base, bytes });

        Ok(dest.into())
    }

    fn convert(&mut self, value: Operand, from: &Type, to: &Type) -> Operand {
        let conversion = match (from, to) {
            (Type::Int, Type::Float) => Conversion::IntToFloat,
            (Type::Float, Type::Int) => Conversion::FloatToInt,
            (Type::Char, Type::Int) => Conversion::CharToInt,
            (Type::Int, Type::Char) => Conversion::IntToChar,
            _ => return value,
        };

        let dest = self.builder.register(RegType::Value(to.clone()));
        self.builder.push(Instruction::Convert {
            dest,
            conversion,
            operand: value,
        });

        dest.into()
    }
}

fn type_of(expr: &Located<Expr>) -> Gen<&Type> {
    expr.val().typ.as_ref().ok_or(GenError::Untyped)
}

fn resolved(symbol: Option<SymbolId>, name: &Identifier) -> Gen<SymbolId> {
    symbol.ok_or_else(|| GenError::Unresolved(name.clone()))
}

fn symbol_name(name: &Identifier) -> Rc<str> {
    let name: &str = name.as_ref();
    Rc::from(name)
}

fn string_type(text: &str) -> Type {
    Type::Array(Box::new(Type::Char), Some(text.chars().count() as u32))
}

fn stride(element: &Type) -> Gen<u32> {
    element.size().ok_or(GenError::Untyped)
}

/// Conteo de bytes como constante `int`.
fn int(bytes: u32) -> Gen<i32> {
    i32::try_from(bytes).map_err(|_| OUT_OF_RANGE)
}

/// Tipo escalar de un arreglo y cantidad de escalares que contiene.
fn scalars(typ: &Type) -> Gen<(&Type, u32)> {
    match typ {
        Type::Array(element, Some(length)) => {
            let (scalar, count) = scalars(element)?;
            Ok((scalar, count.checked_mul(*length).ok_or(OUT_OF_RANGE)?))
        }

        Type::Array(_, None) | Type::Function(_) => Err(GenError::Untyped),
        scalar => Ok((scalar, 1)),
    }
}

/// Contenido inicial de una global a partir de su inicializador constante.
fn data(init: &Located<Initializer>, typ: &Type, name: &Identifier) -> Gen<Data> {
    if let (Type::Array(element, _), Initializer::Expr(expr)) = (typ, init.val()) {
        if **element == Type::Char {
            if let ExprKind::Literal(Literal::Str(text)) = &expr.val().kind {
                return Ok(Data::Str(text.clone()));
            }
        }
    }

    let non_constant = || GenError::NonConstant(name.clone());
    match (typ, init.val()) {
        (Type::Array(..), _) => {
            let mut runs = Vec::new();
            flatten(init, typ, name, &mut runs)?;
            Ok(Data::Array(runs))
        }

        (typ, Initializer::Expr(expr)) => {
            constant(expr, typ).map(Data::Scalar).ok_or_else(non_constant)
        }

        (_, Initializer::List(_)) => Err(non_constant()),
    }
}

fn flatten(
    init: &Located<Initializer>,
    typ: &Type,
    name: &Identifier,
    out: &mut Vec<Run>,
) -> Gen<()> {
    let non_constant = || GenError::NonConstant(name.clone());

    match (typ, init.val()) {
        (Type::Array(element, size), Initializer::List(items)) => {
            for item in items {
                flatten(item, element, name, out)?;
            }

            let missing = size.unwrap_or(0).saturating_sub(items.len() as u32);
            if missing > 0 {
                let (scalar, per_element) = scalars(element)?;
                let zero = Constant::zero(scalar).ok_or(GenError::Untyped)?;
                let count = per_element.checked_mul(missing).ok_or(OUT_OF_RANGE)?;

                push_run(out, zero, count);
            }
        }

        (Type::Array(_, size), Initializer::Expr(expr)) => {
            let text = match &expr.val().kind {
                ExprKind::Literal(Literal::Str(text)) => text,
                _ => return Err(non_constant()),
            };

            let written = text.chars().count() as u32;
            let length = size.unwrap_or(written);

            for c in text.chars().take(length as usize) {
                push_run(out, Constant::Char(c), 1);
            }

            push_run(out, Constant::Char('\0'), length.saturating_sub(written));
        }

        (typ, Initializer::Expr(expr)) => {
            let value = constant(expr, typ).ok_or_else(non_constant)?;
            push_run(out, value, 1);
        }

        (_, Initializer::List(_)) => return Err(non_constant()),
    }

    Ok(())
}

/// Agrega `count` copias de `value`, fusionando con la corrida anterior si es igual.
fn push_run(out: &mut Vec<Run>, value: Constant, count: u32) {
    if count == 0 {
        return;
    }

    match out.last_mut() {
        Some(last) if last.value == value => last.count += count,
        _ => out.push(Run { value, count }),
    }
}

/// Valor de una constante, posiblemente con signo, convertida a `typ`.
fn constant(expr: &Located<Expr>, typ: &Type) -> Option<Constant> {
    let value = match &expr.val().kind {
        ExprKind::Literal(Literal::Int(integer)) => Constant::Int(*integer),
        ExprKind::Literal(Literal::Float(float)) => Constant::Float(*float),
        ExprKind::Literal(Literal::Char(c)) => Constant::Char(*c),
        ExprKind::Literal(Literal::Bool(boolean)) => Constant::Bool(*boolean),
        ExprKind::Unary(UnOp::Plus, operand) => constant(operand, typ)?,
        ExprKind::Unary(UnOp::Negate, operand) => match constant(operand, typ)? {
            Constant::Int(integer) => Constant::Int(integer.wrapping_neg()),
            Constant::Float(float) => Constant::Float(-float),
            _ => return None,
        },

        _ => return None,
    };

    match (typ, value) {
        (Type::Float, Constant::Int(integer)) => Some(Constant::Float(f64::from(integer))),
        _ => Some(value),
    }
}
