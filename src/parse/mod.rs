//! Análisis sintáctico.
//!
//! El parser es predictivo: decide cada producción a partir de a lo
//! sumo dos tokens de lookahead. Las expresiones binarias se resuelven
//! por precedencia ascendente con asociatividad izquierda, mientras
//! que las asignaciones asocian a la derecha. Un `else` se asocia al
//! `if` más cercano.
//!
//! # Recuperación de errores
//! Al fallar una sentencia se registra el error y se descartan tokens
//! hasta un punto de sincronización (`;`, `}` o el inicio de una
//! sentencia o declaración), tras lo cual el análisis continúa. De
//! esta forma una misma pasada puede reportar varios errores
//! independientes.

use std::{iter::Peekable, marker::PhantomData, rc::Rc};
use thiserror::Error;

use crate::{
    error::{Classify, ErrorKind},
    lex::{Identifier, Keyword, Token},
    source::{Located, Location},
    types::{Signature, Type},
};

pub mod ast;

use ast::*;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Expected token {0}, found {1} instead")]
    UnexpectedToken(Token, Token),

    #[error("Expected token {0}, none was found instead")]
    MissingToken(Token),

    #[error("Expected {0}, found {1} instead")]
    Expected(&'static str, Token),

    #[error("Array sizes must be positive integer literals")]
    BadArraySize,

    #[error("Functions may only be declared at file scope")]
    LocalFunction,

    #[error("Called object is not a function name")]
    NotCallable,

    #[error("Abrupt end of program")]
    UnexpectedEof,
}

impl Classify for ParserError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Syntax
    }
}

pub trait TokenStream<'a>: Iterator<Item = &'a Located<Token>> + Clone {}

impl<'a, I> TokenStream<'a> for I where I: Iterator<Item = &'a Located<Token>> + Clone {}

/// Construye el árbol sintáctico de una unidad de traducción.
///
/// `start` es la ubicación de inicio del flujo, la cual se utiliza
/// para reportar errores en programas vacíos o truncados.
pub fn parse<'a>(
    tokens: impl TokenStream<'a>,
    start: Location,
) -> Result<Program, Vec<Located<ParserError>>> {
    let mut parser = Parser {
        tokens: tokens.peekable(),
        last_known: start,
        consumed: 0,
        boundary: false,
        errors: Vec::new(),
        lifetime_hack: PhantomData,
    };

    let program = parser.program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

struct Parser<'a, I: TokenStream<'a>> {
    tokens: Peekable<I>,
    last_known: Location,
    consumed: usize,
    boundary: bool,
    errors: Vec<Located<ParserError>>,
    lifetime_hack: PhantomData<&'a ()>,
}

type Parse<T> = Result<T, Located<ParserError>>;

/// Resultado intermedio de un declarador.
struct Declarator {
    name: Located<Identifier>,
    typ: Located<Type>,
    params: Option<Vec<Declaration>>,
}

impl<'a, I: TokenStream<'a>> Parser<'a, I> {
    fn program(&mut self) -> Program {
        let mut items = Vec::new();
        while self.peek().is_some() {
            let consumed = self.consumed;
            match self.external() {
                Ok(item) => items.push(item),
                Err(error) => {
                    self.errors.push(error);
                    self.recover_file_scope(consumed);
                }
            }
        }

        Program { items }
    }

    fn external(&mut self) -> Parse<Item> {
        let base = self.type_specifier()?;
        let first = self.declarator(&base, true)?;

        if first.params.is_some() && self.peek() == Some(&Token::OpenCurly) {
            let body = self.block()?;
            let Declarator { name, typ, params } = first;

            return Ok(Item::Function(FunctionDef {
                name,
                typ,
                params: params.unwrap_or_default(),
                body,
                symbol: None,
            }));
        }

        let declarations = self.init_declarators(&base, first, true)?;
        Ok(Item::Global(declarations))
    }

    fn declaration(&mut self, file_scope: bool) -> Parse<Vec<Declaration>> {
        let base = self.type_specifier()?;
        let first = self.declarator(&base, file_scope)?;

        self.init_declarators(&base, first, file_scope)
    }

    fn init_declarators(
        &mut self,
        base: &Located<Type>,
        first: Declarator,
        file_scope: bool,
    ) -> Parse<Vec<Declaration>> {
        let mut declarations = vec![self.init_declarator(first)?];
        while self.eat(&Token::Comma) {
            let declarator = self.declarator(base, file_scope)?;
            declarations.push(self.init_declarator(declarator)?);
        }

        self.expect(Token::Semicolon)?;
        Ok(declarations)
    }

    fn init_declarator(&mut self, declarator: Declarator) -> Parse<Declaration> {
        let init = if self.eat(&Token::Assign) {
            Some(self.initializer()?)
        } else {
            None
        };

        Ok(Declaration {
            name: declarator.name,
            typ: declarator.typ,
            init,
            symbol: None,
        })
    }

    fn declarator(&mut self, base: &Located<Type>, file_scope: bool) -> Parse<Declarator> {
        let name = self.id()?;

        if self.peek() == Some(&Token::OpenParen) {
            self.next()?;
            let params = self.parameters()?;
            self.expect(Token::CloseParen)?;

            if !file_scope {
                return self.fail(ParserError::LocalFunction);
            }

            let signature = Signature {
                params: params.iter().map(|param| param.typ.val().clone()).collect(),
                ret: base.val().clone(),
            };

            let location = Location::span(base.location().clone(), &self.last_known);
            return Ok(Declarator {
                name,
                typ: Located::at(Type::Function(Rc::new(signature)), location),
                params: Some(params),
            });
        }

        let typ = self.array_suffix(base)?;
        Ok(Declarator {
            name,
            typ,
            params: None,
        })
    }

    fn array_suffix(&mut self, base: &Located<Type>) -> Parse<Located<Type>> {
        let mut dimensions = Vec::new();
        while self.eat(&Token::OpenSquare) {
            match self.next()?.into_inner() {
                Token::CloseSquare => dimensions.push(None),
                Token::IntLiteral(size) if size > 0 => {
                    dimensions.push(Some(size as u32));
                    self.expect(Token::CloseSquare)?;
                }

                _ => return self.fail(ParserError::BadArraySize),
            }
        }

        if dimensions.is_empty() {
            return Ok(base.clone());
        }

        // `int m[2][3]` es un arreglo de dos arreglos de tres enteros
        let typ = dimensions
            .into_iter()
            .rev()
            .fold(base.val().clone(), |element, size| {
                Type::Array(Box::new(element), size)
            });

        let location = Location::span(base.location().clone(), &self.last_known);
        Ok(Located::at(typ, location))
    }

    fn parameters(&mut self) -> Parse<Vec<Declaration>> {
        match (self.peek(), self.peek_second()) {
            (Some(Token::CloseParen), _) => Ok(Vec::new()),
            (Some(Token::Keyword(Keyword::Void)), Some(Token::CloseParen)) => {
                self.next()?;
                Ok(Vec::new())
            }

            _ => self.comma_separated(Parser::parameter),
        }
    }

    fn parameter(&mut self) -> Parse<Declaration> {
        let base = self.type_specifier()?;
        let name = self.id()?;
        let typ = self.array_suffix(&base)?;

        Ok(Declaration {
            name,
            typ,
            init: None,
            symbol: None,
        })
    }

    fn type_specifier(&mut self) -> Parse<Located<Type>> {
        let (location, token) = self.next()?.split();
        let typ = match token {
            Token::Keyword(keyword) => match keyword_type(keyword) {
                Some(typ) => typ,
                None => return self.fail(ParserError::Expected("a type", token)),
            },

            found => return self.fail(ParserError::Expected("a type", found)),
        };

        Ok(Located::at(typ, location))
    }

    fn initializer(&mut self) -> Parse<Located<Initializer>> {
        if self.peek() != Some(&Token::OpenCurly) {
            let expr = self.assignment()?;
            let location = expr.location().clone();
            return Ok(Located::at(Initializer::Expr(expr), location));
        }

        self.next()?;
        let start = self.last_known.clone();

        let mut items = Vec::new();
        loop {
            items.push(self.initializer()?);
            if !self.eat(&Token::Comma) || self.peek() == Some(&Token::CloseCurly) {
                break;
            }
        }

        self.expect(Token::CloseCurly)?;
        Ok(Located::at(
            Initializer::List(items),
            Location::span(start, &self.last_known),
        ))
    }

    fn block(&mut self) -> Parse<Block> {
        self.expect(Token::OpenCurly)?;

        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::CloseCurly) => {
                    self.next()?;
                    break Ok(Block { items });
                }

                None => break self.fail(ParserError::MissingToken(Token::CloseCurly)),

                Some(_) => {
                    let consumed = self.consumed;
                    match self.block_item() {
                        Ok(item) => items.push(item),
                        Err(error) => {
                            self.errors.push(error);
                            self.synchronize(consumed);
                        }
                    }
                }
            }
        }
    }

    fn block_item(&mut self) -> Parse<Located<Statement>> {
        match self.peek() {
            Some(Token::Keyword(keyword)) if keyword_type(*keyword).is_some() => {
                self.located(|s| s.declaration(false).map(Statement::Declaration))
            }

            _ => self.statement(),
        }
    }

    fn statement(&mut self) -> Parse<Located<Statement>> {
        self.located(|s| match s.peek() {
            Some(Token::OpenCurly) => s.block().map(Statement::Block),

            Some(Token::Semicolon) => {
                s.next()?;
                Ok(Statement::Empty)
            }

            Some(Token::Keyword(Keyword::If)) => s.if_statement(),
            Some(Token::Keyword(Keyword::While)) => s.while_statement(),
            Some(Token::Keyword(Keyword::For)) => s.for_statement(),

            Some(Token::Keyword(Keyword::Break)) => {
                s.next()?;
                s.expect(Token::Semicolon)?;
                Ok(Statement::Break)
            }

            Some(Token::Keyword(Keyword::Return)) => {
                s.next()?;
                let value = match s.peek() {
                    Some(Token::Semicolon) => None,
                    _ => Some(s.expr()?),
                };

                s.expect(Token::Semicolon)?;
                Ok(Statement::Return(value))
            }

            Some(Token::Keyword(Keyword::Assert)) => {
                s.next()?;
                let condition = s.expr()?;
                s.expect(Token::Semicolon)?;

                Ok(Statement::Assert(condition))
            }

            Some(Token::Keyword(Keyword::Print)) => {
                s.next()?;
                s.expect(Token::OpenParen)?;

                let values = match s.peek() {
                    Some(Token::CloseParen) => Vec::new(),
                    _ => s.comma_separated(Parser::assignment)?,
                };

                s.expect(Token::CloseParen)?;
                s.expect(Token::Semicolon)?;
                Ok(Statement::Print(values))
            }

            Some(Token::Keyword(Keyword::Read)) => {
                s.next()?;
                s.expect(Token::OpenParen)?;
                let targets = s.comma_separated(Parser::assignment)?;
                s.expect(Token::CloseParen)?;
                s.expect(Token::Semicolon)?;

                Ok(Statement::Read(targets))
            }

            _ => {
                let expr = s.expr()?;
                s.expect(Token::Semicolon)?;
                Ok(Statement::Expr(expr))
            }
        })
    }

    fn if_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::If)?;
        let condition = self.parenthesized()?;
        let then = Box::new(self.statement()?);

        let otherwise = if self.eat(&Token::Keyword(Keyword::Else)) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then,
            otherwise,
        })
    }

    fn while_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::While)?;
        let condition = self.parenthesized()?;
        let body = Box::new(self.statement()?);

        Ok(Statement::While { condition, body })
    }

    fn for_statement(&mut self) -> Parse<Statement> {
        self.keyword(Keyword::For)?;
        self.expect(Token::OpenParen)?;

        let init = match self.peek() {
            Some(Token::Semicolon) => {
                self.next()?;
                None
            }

            Some(Token::Keyword(keyword)) if keyword_type(*keyword).is_some() => {
                Some(ForInit::Declaration(self.declaration(false)?))
            }

            _ => {
                let expr = self.expr()?;
                self.expect(Token::Semicolon)?;
                Some(ForInit::Expr(expr))
            }
        };

        let condition = self.optional_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;

        let step = self.optional_expr(&Token::CloseParen)?;
        self.expect(Token::CloseParen)?;

        let body = Box::new(self.statement()?);
        Ok(Statement::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn parenthesized(&mut self) -> Parse<Located<Expr>> {
        self.expect(Token::OpenParen)?;
        let expr = self.expr()?;
        self.expect(Token::CloseParen)?;

        Ok(expr)
    }

    fn optional_expr(&mut self, terminator: &Token) -> Parse<Option<Located<Expr>>> {
        if self.peek() == Some(terminator) {
            Ok(None)
        } else {
            self.expr().map(Some)
        }
    }

    fn expr(&mut self) -> Parse<Located<Expr>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Parse<Located<Expr>> {
        let target = self.binary(1)?;

        let op = match self.peek() {
            Some(Token::Assign) => None,
            Some(Token::PlusAssign) => Some(BinOp::Add),
            Some(Token::MinusAssign) => Some(BinOp::Sub),
            Some(Token::TimesAssign) => Some(BinOp::Mul),
            Some(Token::DivideAssign) => Some(BinOp::Div),
            Some(Token::ModuloAssign) => Some(BinOp::Mod),
            _ => return Ok(target),
        };

        self.next()?;
        let value = self.assignment()?;

        let location = Location::span(target.location().clone(), value.location());
        let kind = ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        };

        Ok(Located::at(Expr::new(kind), location))
    }

    fn binary(&mut self, min_precedence: u8) -> Parse<Located<Expr>> {
        let mut lhs = self.cast()?;

        loop {
            let op = match self.peek().and_then(binary_operator) {
                Some(op) if precedence(op) >= min_precedence => op,
                _ => break Ok(lhs),
            };

            self.next()?;
            let rhs = self.binary(precedence(op) + 1)?;

            let location = Location::span(lhs.location().clone(), rhs.location());
            let kind = ExprKind::Binary(Box::new(lhs), op, Box::new(rhs));
            lhs = Located::at(Expr::new(kind), location);
        }
    }

    fn cast(&mut self) -> Parse<Located<Expr>> {
        let is_cast = self.peek() == Some(&Token::OpenParen)
            && matches!(
                self.peek_second(),
                Some(Token::Keyword(keyword)) if keyword_type(*keyword).is_some()
            );

        if !is_cast {
            return self.unary();
        }

        self.next()?;
        let start = self.last_known.clone();

        let typ = self.type_specifier()?;
        self.expect(Token::CloseParen)?;
        let operand = self.cast()?;

        let location = Location::span(start, operand.location());
        let kind = ExprKind::Cast(typ, Box::new(operand));
        Ok(Located::at(Expr::new(kind), location))
    }

    fn unary(&mut self) -> Parse<Located<Expr>> {
        let op = match self.peek() {
            Some(Token::Increment) => UnOp::PreIncrement,
            Some(Token::Decrement) => UnOp::PreDecrement,
            Some(Token::Minus) => UnOp::Negate,
            Some(Token::Plus) => UnOp::Plus,
            Some(Token::Not) => UnOp::Not,
            _ => return self.postfix(),
        };

        self.next()?;
        let start = self.last_known.clone();

        let operand = match op {
            UnOp::PreIncrement | UnOp::PreDecrement => self.unary()?,
            _ => self.cast()?,
        };

        let location = Location::span(start, operand.location());
        Ok(Located::at(
            Expr::new(ExprKind::Unary(op, Box::new(operand))),
            location,
        ))
    }

    fn postfix(&mut self) -> Parse<Located<Expr>> {
        let mut expr = self.primary()?;

        loop {
            let kind = match self.peek() {
                Some(Token::OpenSquare) => {
                    self.next()?;
                    let index = self.expr()?;
                    self.expect(Token::CloseSquare)?;

                    ExprKind::Index(Box::new(expr), Box::new(index))
                }

                Some(Token::OpenParen) => {
                    self.next()?;

                    let (location, callee) = expr.split();
                    let function = match callee.kind {
                        ExprKind::Id { name, .. } => Located::at(name, location),
                        _ => return self.fail(ParserError::NotCallable),
                    };

                    let args = match self.peek() {
                        Some(Token::CloseParen) => Vec::new(),
                        _ => self.comma_separated(Parser::assignment)?,
                    };

                    self.expect(Token::CloseParen)?;
                    let start = function.location().clone();
                    let kind = ExprKind::Call {
                        function,
                        args,
                        symbol: None,
                    };

                    expr = Located::at(Expr::new(kind), Location::span(start, &self.last_known));
                    continue;
                }

                Some(Token::Increment) => {
                    self.next()?;
                    ExprKind::Unary(UnOp::PostIncrement, Box::new(expr))
                }

                Some(Token::Decrement) => {
                    self.next()?;
                    ExprKind::Unary(UnOp::PostDecrement, Box::new(expr))
                }

                _ => break Ok(expr),
            };

            let start = match &kind {
                ExprKind::Index(base, _) | ExprKind::Unary(_, base) => base.location().clone(),
                _ => self.last_known.clone(),
            };

            expr = Located::at(Expr::new(kind), Location::span(start, &self.last_known));
        }
    }

    fn primary(&mut self) -> Parse<Located<Expr>> {
        let (location, token) = self.next()?.split();

        let literal = match token {
            Token::Id(name) => {
                let kind = ExprKind::Id { name, symbol: None };
                return Ok(Located::at(Expr::new(kind), location));
            }

            Token::IntLiteral(integer) => Literal::Int(integer),
            Token::FloatLiteral(float) => Literal::Float(float),
            Token::CharLiteral(c) => Literal::Char(c),
            Token::StrLiteral(string) => Literal::Str(string),
            Token::Keyword(Keyword::True) => Literal::Bool(true),
            Token::Keyword(Keyword::False) => Literal::Bool(false),

            Token::OpenParen => {
                let inner = self.expr()?;
                self.expect(Token::CloseParen)?;

                let location = Location::span(location, &self.last_known);
                return Ok(Located::at(inner.into_inner(), location));
            }

            found => return self.fail(ParserError::Expected("an expression", found)),
        };

        Ok(Located::at(Expr::new(ExprKind::Literal(literal)), location))
    }

    /// Descarta tokens hasta un punto de sincronización dentro de un bloque.
    fn synchronize(&mut self, consumed: usize) {
        if self.consumed == consumed {
            let _ = self.next();
        }

        if self.boundary {
            return;
        }

        while let Some(token) = self.peek() {
            match token {
                Token::Semicolon => {
                    let _ = self.next();
                    break;
                }

                Token::CloseCurly => break,
                Token::Keyword(keyword) if starts_statement(*keyword) => break,
                _ => {
                    let _ = self.next();
                }
            }
        }
    }

    /// Descarta tokens hasta el final de la declaración global actual.
    fn recover_file_scope(&mut self, consumed: usize) {
        if self.consumed == consumed {
            let _ = self.next();
        }

        if self.boundary {
            return;
        }

        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::OpenCurly => depth += 1,

                Token::CloseCurly if depth <= 1 => {
                    let _ = self.next();
                    break;
                }

                Token::CloseCurly => depth -= 1,

                Token::Semicolon if depth == 0 => {
                    let _ = self.next();
                    break;
                }

                Token::Keyword(keyword) if depth == 0 && keyword_type(*keyword).is_some() => break,
                _ => (),
            }

            let _ = self.next();
        }
    }

    fn located<T, F>(&mut self, rule: F) -> Parse<Located<T>>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        let start = match self.tokens.peek() {
            Some(token) => token.location().clone(),
            None => self.last_known.clone(),
        };

        let value = rule(self)?;
        Ok(Located::at(value, Location::span(start, &self.last_known)))
    }

    fn comma_separated<T, F>(&mut self, mut rule: F) -> Parse<Vec<T>>
    where
        F: FnMut(&mut Self) -> Parse<T>,
    {
        let mut items = vec![rule(self)?];
        while self.eat(&Token::Comma) {
            items.push(rule(self)?);
        }

        Ok(items)
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (location, token) = self.next()?.split();
        match token {
            Token::Id(id) => Ok(Located::at(id, location)),
            found => self.fail(ParserError::Expected("an identifier", found)),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Parse<()> {
        self.expect(Token::Keyword(keyword))
    }

    fn eat(&mut self, token: &Token) -> bool {
        let matches = self.peek() == Some(token);
        if matches {
            let _ = self.next();
        }

        matches
    }

    /// Consume el token esperado. Un token distinto no se consume, de
    /// modo que la recuperación lo puede tomar como frontera.
    fn expect(&mut self, token: Token) -> Parse<()> {
        match self.tokens.peek().copied() {
            Some(found) if found.val() == &token => self.next().map(drop),
            Some(found) => {
                let error = ParserError::UnexpectedToken(token, found.val().clone());
                Err(Located::at(error, found.location().clone()))
            }

            None => self.fail(ParserError::MissingToken(token)),
        }
    }

    fn peek(&mut self) -> Option<&'a Token> {
        self.tokens.peek().copied().map(Located::val)
    }

    fn peek_second(&self) -> Option<&'a Token> {
        self.tokens.clone().nth(1).map(Located::val)
    }

    fn next(&mut self) -> Parse<Located<Token>> {
        match self.tokens.next() {
            Some(token) => {
                self.last_known = token.location().clone();
                self.consumed += 1;
                self.boundary = token.val() == &Token::Semicolon;

                Ok(token.clone())
            }

            None => self.fail(ParserError::UnexpectedEof),
        }
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Located::at(error, self.last_known.clone()))
    }
}

/// Tipo básico nombrado por una palabra clave.
fn keyword_type(keyword: Keyword) -> Option<Type> {
    match keyword {
        Keyword::Int => Some(Type::Int),
        Keyword::Float => Some(Type::Float),
        Keyword::Char => Some(Type::Char),
        Keyword::Bool => Some(Type::Bool),
        Keyword::Void => Some(Type::Void),
        _ => None,
    }
}

fn starts_statement(keyword: Keyword) -> bool {
    use Keyword::*;
    keyword_type(keyword).is_some()
        || matches!(
            keyword,
            If | While | For | Return | Break | Assert | Print | Read
        )
}

fn binary_operator(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Or => BinOp::Or,
        Token::And => BinOp::And,
        Token::Equal => BinOp::Equal,
        Token::NotEqual => BinOp::NotEqual,
        Token::Less => BinOp::Less,
        Token::LessEqual => BinOp::LessOrEqual,
        Token::Greater => BinOp::Greater,
        Token::GreaterEqual => BinOp::GreaterOrEqual,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Times => BinOp::Mul,
        Token::Divide => BinOp::Div,
        Token::Modulo => BinOp::Mod,
        _ => return None,
    };

    Some(op)
}

fn precedence(op: BinOp) -> u8 {
    use BinOp::*;

    match op {
        Or => 1,
        And => 2,
        Equal | NotEqual => 3,
        Less | LessOrEqual | Greater | GreaterOrEqual => 4,
        Add | Sub => 5,
        Mul | Div | Mod => 6,
    }
}
