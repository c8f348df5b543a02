//! Análisis semántico.
//!
//! El análisis ocurre en dos fases. La primera registra en el ámbito
//! global todas las variables globales y firmas de funciones, de modo
//! que los cuerpos puedan referirse a funciones definidas más
//! adelante. La segunda recorre cada cuerpo, resuelve identificadores
//! y anota cada expresión con su tipo.
//!
//! Cada subexpresión se verifica aunque otra parte de la misma
//! expresión haya fallado, de modo que una sola corrida reporta todos
//! los errores independientes. Una expresión sin tipo a causa de un
//! error ya reportado no provoca errores adicionales en sus ancestros.

use log::{debug, trace};
use thiserror::Error;

use crate::{
    error::{Classify, ErrorKind},
    lex::Identifier,
    parse::ast::*,
    source::{Located, Location},
    types::{Ops, Type},
};

pub mod scope;

use scope::{SymbolId, SymbolKind, SymbolTable};

pub type Semantic<T> = Result<T, Located<SemanticError>>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Symbol `{0}` is undeclared")]
    Undeclared(Identifier),

    #[error("Redeclaration of `{0}` in the same scope")]
    Redeclaration(Identifier),

    #[error("Function `{name}` takes {expected} argument(s), but {found} were supplied")]
    Arity {
        name: Identifier,
        expected: usize,
        found: usize,
    },

    #[error("Type mismatch: expected `{expected}`, found `{found}`")]
    ExpectedType { expected: Type, found: Type },

    #[error("Operator `{op}` is not defined for `{lhs}` and `{rhs}`")]
    UnsupportedBinary { op: BinOp, lhs: Type, rhs: Type },

    #[error("Operator `{op}` is not defined for `{operand}`")]
    UnsupportedUnary { op: UnOp, operand: Type },

    #[error("Values of type `{0}` cannot be assigned")]
    NotAssignable(Type),

    #[error("Expression is not assignable")]
    NotAnLvalue,

    #[error("`{0}` is not a function")]
    NotAFunction(Identifier),

    #[error("`{0}` is a function, not a variable")]
    NotAVariable(Identifier),

    #[error("Type `{0}` cannot be indexed")]
    NotIndexable(Type),

    #[error("Index {index} is out of bounds for an array of length {length}")]
    IndexOutOfBounds { index: i64, length: u32 },

    #[error("Values of type `{0}` cannot be printed")]
    NotPrintable(Type),

    #[error("Values of type `{0}` cannot be read")]
    NotReadable(Type),

    #[error("Cannot cast `{from}` to `{to}`")]
    BadCast { from: Type, to: Type },

    #[error("Function returns `{expected}`, but this returns `{found}`")]
    ReturnMismatch { expected: Type, found: Type },

    #[error("`break` outside of a loop")]
    BreakOutsideLoop,

    #[error("Initializers of global variables must be constant")]
    NonConstantInitializer,

    #[error("Initializer has {found} elements, but the array holds {expected}")]
    InitializerSize { expected: u32, found: u32 },

    #[error("Initializer list used for scalar type `{0}`")]
    ListForScalar(Type),

    #[error("Size of array `{0}` is unknown")]
    UnknownArraySize(Identifier),

    #[error("Variable `{0}` declared void")]
    VoidVariable(Identifier),

    #[error("Array `{0}` exceeds 2147483647 bytes")]
    ArrayTooLarge(Identifier),
}

impl Classify for SemanticError {
    fn kind(&self) -> ErrorKind {
        match self {
            SemanticError::Undeclared(_) => ErrorKind::Undeclared,
            SemanticError::Redeclaration(_) => ErrorKind::Redeclaration,
            SemanticError::Arity { .. } => ErrorKind::Arity,
            _ => ErrorKind::Type,
        }
    }
}

impl Program {
    /// Verifica el programa y anota el árbol en sitio.
    ///
    /// En caso de éxito se retorna la tabla de símbolos, cuya arena
    /// indexan las anotaciones `symbol` del árbol.
    pub fn analyze(&mut self) -> Result<SymbolTable, Vec<Located<SemanticError>>> {
        let mut analyzer = Analyzer {
            table: SymbolTable::new(),
            errors: Vec::new(),
            loops: 0,
            ret: Type::Void,
        };

        for item in &mut self.items {
            analyzer.register(item);
        }

        for item in &mut self.items {
            if let Item::Function(function) = item {
                analyzer.function(function);
            }
        }

        debug!(
            "semantic analysis finished with {} error(s)",
            analyzer.errors.len()
        );

        if analyzer.errors.is_empty() {
            Ok(analyzer.table)
        } else {
            Err(analyzer.errors)
        }
    }
}

struct Analyzer {
    table: SymbolTable,
    errors: Vec<Located<SemanticError>>,
    loops: u32,
    ret: Type,
}

impl Analyzer {
    fn register(&mut self, item: &mut Item) {
        match item {
            Item::Global(declarations) => {
                for declaration in declarations {
                    if declaration.typ.val().signature().is_some() {
                        let result =
                            self.declare_function(&declaration.name, declaration.typ.val(), false);

                        declaration.symbol = self.report(result);
                    } else {
                        self.variable(declaration, SymbolKind::Variable, true);
                    }
                }
            }

            Item::Function(function) => {
                let result = self.declare_function(&function.name, function.typ.val(), true);
                function.symbol = self.report(result);
            }
        }
    }

    /// Declara una función, admitiendo un prototipo previo idéntico.
    fn declare_function(
        &mut self,
        name: &Located<Identifier>,
        typ: &Type,
        defining: bool,
    ) -> Semantic<SymbolId> {
        let previous = match self.table.lookup_local(name.val()) {
            Some(previous) => previous,
            None => {
                let kind = SymbolKind::Function { defined: defining };
                return self.table.declare(name, kind, typ.clone());
            }
        };

        let symbol = self.table.symbol_mut(previous);
        if let SymbolKind::Function { defined } = symbol.kind {
            if symbol.typ == *typ && !(defined && defining) {
                symbol.kind = SymbolKind::Function {
                    defined: defined || defining,
                };

                return Ok(previous);
            }
        }

        Err(Located::at(
            SemanticError::Redeclaration(name.val().clone()),
            name.location().clone(),
        ))
    }

    fn function(&mut self, function: &mut FunctionDef) {
        let ret = match function.typ.val().signature() {
            Some(signature) => signature.ret.clone(),
            None => return,
        };

        trace!("checking body of `{}`", function.name.val());
        self.ret = ret;

        // Los parámetros comparten ámbito con el bloque más externo
        let scope = self.table.enter_scope();
        for param in &mut function.params {
            self.variable(param, SymbolKind::Parameter, false);
        }

        self.block_items(&mut function.body);
        self.table.exit_scope(scope);
    }

    fn variable(&mut self, declaration: &mut Declaration, kind: SymbolKind, constant: bool) {
        let Declaration {
            name,
            typ,
            init,
            symbol,
        } = declaration;

        if base_type(typ.val()) == &Type::Void {
            self.error(SemanticError::VoidVariable(name.val().clone()), name.location());
        }

        if let Some(init) = init {
            let result = self.initializer(typ.val_mut(), init, constant);
            self.report(result);
        }

        // Solo la dimensión externa de un parámetro puede omitirse
        let outer_unsized = kind != SymbolKind::Parameter && typ.val().size().is_none();
        let inner_unsized = typ
            .val()
            .element()
            .map_or(false, |element| element.size().is_none());

        if oversized(typ.val()) {
            self.error(SemanticError::ArrayTooLarge(name.val().clone()), name.location());
        } else if init.is_none() && (outer_unsized || inner_unsized) {
            self.error(SemanticError::UnknownArraySize(name.val().clone()), name.location());
        }

        let result = self.table.declare(name, kind, typ.val().clone());
        *symbol = self.report(result);
    }

    fn initializer(
        &mut self,
        typ: &mut Type,
        init: &mut Located<Initializer>,
        constant: bool,
    ) -> Semantic<()> {
        let location = init.location().clone();

        match (typ, init.val_mut()) {
            (Type::Array(element, size), Initializer::List(items)) => {
                for item in items.iter_mut() {
                    let result = self.initializer(element, item, constant);
                    self.report(result);
                }

                fit(size, items.len() as u32, &location)
            }

            (Type::Array(element, size), Initializer::Expr(expr)) if **element == Type::Char => {
                let found = match self.expr(expr) {
                    Some(found) => found,
                    None => return Ok(()),
                };

                match found {
                    Type::Array(_, Some(length)) if is_string_literal(expr) => {
                        fit(size, length, &location)
                    }

                    found => {
                        let expected = Type::Array(element.clone(), *size);
                        fail(SemanticError::ExpectedType { expected, found }, &location)
                    }
                }
            }

            (typ, Initializer::List(_)) => {
                fail(SemanticError::ListForScalar(typ.clone()), &location)
            }

            (typ, Initializer::Expr(expr)) => {
                if constant && !is_constant(expr) {
                    return fail(SemanticError::NonConstantInitializer, expr.location());
                }

                let found = match self.expr(expr) {
                    Some(found) => found,
                    None => return Ok(()),
                };

                if typ.is_basic() && typ.accepts(&found) {
                    Ok(())
                } else {
                    let expected = typ.clone();
                    fail(SemanticError::ExpectedType { expected, found }, &location)
                }
            }
        }
    }

    fn block_items(&mut self, block: &mut Block) {
        for statement in &mut block.items {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &mut Located<Statement>) {
        let location = statement.location().clone();

        match statement.val_mut() {
            Statement::Declaration(declarations) => {
                for declaration in declarations {
                    self.variable(declaration, SymbolKind::Variable, false);
                }
            }

            Statement::Expr(expr) => {
                self.expr(expr);
            }

            Statement::Empty => (),

            Statement::Block(block) => {
                let scope = self.table.enter_scope();
                self.block_items(block);
                self.table.exit_scope(scope);
            }

            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                self.condition(condition);
                self.statement(then);

                if let Some(otherwise) = otherwise {
                    self.statement(otherwise);
                }
            }

            Statement::While { condition, body } => {
                self.condition(condition);
                self.loop_body(body);
            }

            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                let scope = self.table.enter_scope();

                match init {
                    Some(ForInit::Declaration(declarations)) => {
                        for declaration in declarations {
                            self.variable(declaration, SymbolKind::Variable, false);
                        }
                    }

                    Some(ForInit::Expr(expr)) => {
                        self.expr(expr);
                    }

                    None => (),
                }

                if let Some(condition) = condition {
                    self.condition(condition);
                }

                if let Some(step) = step {
                    self.expr(step);
                }

                self.loop_body(body);
                self.table.exit_scope(scope);
            }

            Statement::Break => {
                if self.loops == 0 {
                    self.error(SemanticError::BreakOutsideLoop, &location);
                }
            }

            Statement::Return(value) => {
                let result = self.return_value(value.as_mut(), &location);
                self.report(result);
            }

            Statement::Assert(condition) => self.condition(condition),

            Statement::Print(values) => {
                for value in values {
                    match self.expr(value) {
                        Some(typ) if !typ.is_basic() && !typ.is_string() => {
                            self.error(SemanticError::NotPrintable(typ), value.location());
                        }

                        _ => (),
                    }
                }
            }

            Statement::Read(targets) => {
                for target in targets {
                    let typ = self.expr(target);
                    let result = lvalue(target).and_then(|()| match typ {
                        Some(typ) if !typ.is_basic() => {
                            fail(SemanticError::NotReadable(typ), target.location())
                        }

                        _ => Ok(()),
                    });

                    self.report(result);
                }
            }
        }
    }

    fn loop_body(&mut self, body: &mut Located<Statement>) {
        self.loops += 1;
        self.statement(body);
        self.loops -= 1;
    }

    fn condition(&mut self, condition: &mut Located<Expr>) {
        if let Some(typ) = self.expr(condition) {
            let result = expect_type(&Type::Bool, typ, condition.location());
            self.report(result);
        }
    }

    fn return_value(
        &mut self,
        value: Option<&mut Located<Expr>>,
        location: &Location,
    ) -> Semantic<()> {
        let expected = self.ret.clone();

        let (found, location) = match value {
            Some(value) => match self.expr(value) {
                Some(found) => (found, value.location()),
                None => return Ok(()),
            },

            None => (Type::Void, location),
        };

        let accepted = match (&expected, &found) {
            (Type::Void, Type::Void) => true,
            (Type::Void, _) | (_, Type::Void) => false,
            (expected, found) => expected.accepts(found),
        };

        if accepted {
            Ok(())
        } else {
            fail(SemanticError::ReturnMismatch { expected, found }, location)
        }
    }

    /// Verifica una expresión y anota su tipo.
    ///
    /// Los errores se reportan conforme aparecen. `None` indica que la
    /// expresión quedó sin tipo por un error ya reportado en ella o en
    /// alguna subexpresión.
    fn expr(&mut self, expr: &mut Located<Expr>) -> Option<Type> {
        let location = expr.location().clone();
        let Expr { kind, typ } = expr.val_mut();

        let result = self.resolve(kind, &location);
        let resolved = self.report(result).flatten();

        *typ = resolved.clone();
        resolved
    }

    /// Tipo de un nodo. `Ok(None)` significa que algún hijo ya falló.
    fn resolve(&mut self, kind: &mut ExprKind, location: &Location) -> Semantic<Option<Type>> {
        let resolved = match kind {
            ExprKind::Literal(literal) => literal_type(literal),

            ExprKind::Id { name, symbol } => {
                let id = self.table.lookup(&Located::at(name.clone(), location.clone()))?;
                let declared = self.table.symbol(id);

                if let SymbolKind::Function { .. } = declared.kind {
                    return fail(SemanticError::NotAVariable(name.clone()), location);
                }

                *symbol = Some(id);
                declared.typ.clone()
            }

            ExprKind::Binary(lhs, op, rhs) => {
                let (lhs_type, rhs_type) = match (self.expr(lhs), self.expr(rhs)) {
                    (Some(lhs_type), Some(rhs_type)) => (lhs_type, rhs_type),
                    _ => return Ok(None),
                };

                match binary_type(*op, &lhs_type, &rhs_type) {
                    Some(typ) => typ,
                    None => {
                        let error = SemanticError::UnsupportedBinary {
                            op: *op,
                            lhs: lhs_type,
                            rhs: rhs_type,
                        };

                        return fail(error, location);
                    }
                }
            }

            ExprKind::Unary(op, operand) => {
                let operand_type = self.expr(operand);
                if op.mutates() {
                    lvalue(operand)?;
                }

                let operand_type = match operand_type {
                    Some(operand_type) => operand_type,
                    None => return Ok(None),
                };

                match unary_type(*op, &operand_type) {
                    Some(typ) => typ,
                    None => {
                        let error = SemanticError::UnsupportedUnary {
                            op: *op,
                            operand: operand_type,
                        };

                        return fail(error, location);
                    }
                }
            }

            ExprKind::Assign { op, target, value } => {
                let target_type = self.expr(target);
                let value_type = self.expr(value);
                lvalue(target)?;

                let (target_type, value_type) = match (target_type, value_type) {
                    (Some(target_type), Some(value_type)) => (target_type, value_type),
                    _ => return Ok(None),
                };

                if !target_type.ops().contains(Ops::ASSIGN) {
                    return fail(SemanticError::NotAssignable(target_type), target.location());
                }

                let stored = match op {
                    None => value_type,
                    Some(op) => match binary_type(*op, &target_type, &value_type) {
                        Some(result) => result,
                        None => {
                            let error = SemanticError::UnsupportedBinary {
                                op: *op,
                                lhs: target_type,
                                rhs: value_type,
                            };

                            return fail(error, location);
                        }
                    },
                };

                if !target_type.accepts(&stored) {
                    let error = SemanticError::ExpectedType {
                        expected: target_type,
                        found: stored,
                    };

                    return fail(error, value.location());
                }

                target_type
            }

            ExprKind::Call {
                function,
                args,
                symbol,
            } => {
                // Los argumentos se verifican aunque la función no exista
                let callee = self.table.lookup(function);
                let found: Vec<Option<Type>> = args.iter_mut().map(|arg| self.expr(arg)).collect();

                let id = callee?;
                let signature = match self.table.symbol(id).typ.signature() {
                    Some(signature) => signature.clone(),
                    None => {
                        let error = SemanticError::NotAFunction(function.val().clone());
                        return fail(error, function.location());
                    }
                };

                *symbol = Some(id);

                if args.len() != signature.params.len() {
                    let error = SemanticError::Arity {
                        name: function.val().clone(),
                        expected: signature.params.len(),
                        found: args.len(),
                    };

                    self.error(error, location);
                } else {
                    let checks = args.iter().zip(&signature.params).zip(found);
                    for ((arg, param), found) in checks {
                        match found {
                            Some(found) if !param.accepts(&found) => {
                                let expected = param.clone();
                                let error = SemanticError::ExpectedType { expected, found };
                                self.error(error, arg.location());
                            }

                            _ => (),
                        }
                    }
                }

                signature.ret.clone()
            }

            ExprKind::Index(base, index) => {
                let base_type = self.expr(base);
                let index_type = self.expr(index);

                let (element, length) = match base_type {
                    Some(Type::Array(element, length)) => (*element, length),
                    Some(other) => return fail(SemanticError::NotIndexable(other), base.location()),
                    None => return Ok(None),
                };

                if let Some(index_type) = index_type {
                    expect_type(&Type::Int, index_type, index.location())?;
                }

                if let (Some(length), Some(constant)) = (length, constant_int(index)) {
                    if constant < 0 || constant >= i64::from(length) {
                        let error = SemanticError::IndexOutOfBounds {
                            index: constant,
                            length,
                        };

                        return fail(error, index.location());
                    }
                }

                element
            }

            ExprKind::Cast(target, operand) => {
                if let Some(from) = self.expr(operand) {
                    if !target.val().casts_from(&from) {
                        let error = SemanticError::BadCast {
                            from,
                            to: target.val().clone(),
                        };

                        return fail(error, location);
                    }
                }

                target.val().clone()
            }
        };

        Ok(Some(resolved))
    }

    fn error(&mut self, error: SemanticError, location: &Location) {
        self.errors.push(Located::at(error, location.clone()));
    }

    fn report<T>(&mut self, result: Semantic<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}

/// Ajusta o verifica el tamaño de un arreglo contra su inicializador.
fn fit(size: &mut Option<u32>, length: u32, location: &Location) -> Semantic<()> {
    match size {
        Some(expected) if length > *expected => {
            let error = SemanticError::InitializerSize {
                expected: *expected,
                found: length,
            };

            fail(error, location)
        }

        Some(_) => Ok(()),

        None => {
            *size = Some(length);
            Ok(())
        }
    }
}

fn lvalue(expr: &Located<Expr>) -> Semantic<()> {
    match &expr.val().kind {
        ExprKind::Id { .. } | ExprKind::Index(..) => Ok(()),
        _ => fail(SemanticError::NotAnLvalue, expr.location()),
    }
}

fn expect_type(expected: &Type, found: Type, location: &Location) -> Semantic<()> {
    if *expected == found {
        Ok(())
    } else {
        let expected = expected.clone();
        fail(SemanticError::ExpectedType { expected, found }, location)
    }
}

fn fail<T>(error: SemanticError, location: &Location) -> Semantic<T> {
    Err(Located::at(error, location.clone()))
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Int(_) => Type::Int,
        Literal::Float(_) => Type::Float,
        Literal::Char(_) => Type::Char,
        Literal::Bool(_) => Type::Bool,
        Literal::Str(string) => {
            Type::Array(Box::new(Type::Char), Some(string.chars().count() as u32))
        }
    }
}

/// Determina si algún nivel de un arreglo excede el rango de `int` en bytes.
///
/// Los desplazamientos de la IR son constantes `int`, así que ningún
/// objeto ni elemento puede ocupar más que eso.
fn oversized(mut typ: &Type) -> bool {
    let limit = u64::from(i32::MAX.unsigned_abs());

    while let Type::Array(element, _) = typ {
        if saturating_size(typ).map_or(false, |bytes| bytes > limit) {
            return true;
        }

        typ = &**element;
    }

    false
}

/// Tamaño en bytes sin desbordamiento; `None` si alguna dimensión falta.
fn saturating_size(typ: &Type) -> Option<u64> {
    match typ {
        Type::Array(element, Some(length)) => {
            Some(saturating_size(element)?.saturating_mul(u64::from(*length)))
        }

        Type::Array(_, None) => None,
        typ => typ.size().map(u64::from),
    }
}

fn base_type(mut typ: &Type) -> &Type {
    while let Type::Array(element, _) = typ {
        typ = &**element;
    }

    typ
}

fn is_string_literal(expr: &Located<Expr>) -> bool {
    matches!(expr.val().kind, ExprKind::Literal(Literal::Str(_)))
}

/// Determina si una expresión es una constante, posiblemente con signo.
fn is_constant(expr: &Located<Expr>) -> bool {
    match &expr.val().kind {
        ExprKind::Literal(_) => true,
        ExprKind::Unary(UnOp::Negate | UnOp::Plus, operand) => {
            matches!(
                operand.val().kind,
                ExprKind::Literal(Literal::Int(_) | Literal::Float(_))
            )
        }

        _ => false,
    }
}

/// Valor de un índice entero conocido estáticamente.
fn constant_int(expr: &Located<Expr>) -> Option<i64> {
    match &expr.val().kind {
        ExprKind::Literal(Literal::Int(value)) => Some(i64::from(*value)),
        ExprKind::Unary(UnOp::Negate, operand) => constant_int(operand).map(|value| -value),
        _ => None,
    }
}

fn binary_flag(op: BinOp) -> Ops {
    match op {
        BinOp::Add => Ops::ADD,
        BinOp::Sub => Ops::SUB,
        BinOp::Mul => Ops::MUL,
        BinOp::Div => Ops::DIV,
        BinOp::Mod => Ops::MOD,
        BinOp::Equal => Ops::EQ,
        BinOp::NotEqual => Ops::NE,
        BinOp::Less => Ops::LT,
        BinOp::LessOrEqual => Ops::LE,
        BinOp::Greater => Ops::GT,
        BinOp::GreaterOrEqual => Ops::GE,
        BinOp::And => Ops::AND,
        BinOp::Or => Ops::OR,
    }
}

/// Tipo del resultado de un operador binario, si está definido.
pub fn binary_type(op: BinOp, lhs: &Type, rhs: &Type) -> Option<Type> {
    let common = if lhs.is_numeric() && rhs.is_numeric() {
        Type::promote(lhs, rhs)?
    } else if lhs == rhs {
        lhs.clone()
    } else {
        return None;
    };

    if !common.ops().contains(binary_flag(op)) {
        None
    } else if op.is_comparison() {
        Some(Type::Bool)
    } else {
        Some(common)
    }
}

/// Tipo del resultado de un operador unario, si está definido.
pub fn unary_type(op: UnOp, operand: &Type) -> Option<Type> {
    let flag = match op {
        UnOp::Negate => Ops::NEG,
        UnOp::Plus => Ops::PLUS,
        UnOp::Not => Ops::NOT,
        UnOp::PreIncrement | UnOp::PostIncrement => Ops::INC,
        UnOp::PreDecrement | UnOp::PostDecrement => Ops::DEC,
    };

    operand.ops().contains(flag).then(|| operand.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_yield_bool() {
        assert_eq!(binary_type(BinOp::Less, &Type::Int, &Type::Float), Some(Type::Bool));
        assert_eq!(binary_type(BinOp::Equal, &Type::Char, &Type::Char), Some(Type::Bool));
        assert_eq!(binary_type(BinOp::Less, &Type::Char, &Type::Char), None);
    }

    #[test]
    fn arithmetic_promotes() {
        assert_eq!(binary_type(BinOp::Add, &Type::Int, &Type::Float), Some(Type::Float));
        assert_eq!(binary_type(BinOp::Mod, &Type::Int, &Type::Int), Some(Type::Int));
        assert_eq!(binary_type(BinOp::Mod, &Type::Float, &Type::Int), None);
        assert_eq!(binary_type(BinOp::Add, &Type::Bool, &Type::Bool), None);
    }

    #[test]
    fn logical_operators_need_bool() {
        assert_eq!(binary_type(BinOp::And, &Type::Bool, &Type::Bool), Some(Type::Bool));
        assert_eq!(binary_type(BinOp::Or, &Type::Int, &Type::Int), None);
        assert_eq!(unary_type(UnOp::Not, &Type::Bool), Some(Type::Bool));
        assert_eq!(unary_type(UnOp::Not, &Type::Int), None);
        assert_eq!(unary_type(UnOp::PreIncrement, &Type::Char), None);
    }
}
