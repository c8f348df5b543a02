use ucc::{
    compile,
    error::{Diagnostics, ErrorKind},
    parse::ast::*,
    types::Type,
};

fn parse(text: &str) -> Result<Program, Diagnostics> {
    let tokens = compile::tokenize(text.as_bytes(), "test")?;
    compile::parse(&tokens)
}

fn body(program: &Program) -> &[ucc::source::Located<Statement>] {
    match &program.items[0] {
        Item::Function(function) => &function.body.items,
        item => panic!("expected a function, found {:?}", item),
    }
}

fn returned(program: &Program) -> &Expr {
    match body(program).last().map(|statement| statement.val()) {
        Some(Statement::Return(Some(value))) => value.val(),
        other => panic!("expected a return, found {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse("int f() { return 1 + 2 * 3; }").unwrap();

    match &returned(&program).kind {
        ExprKind::Binary(lhs, BinOp::Add, rhs) => {
            assert!(matches!(lhs.val().kind, ExprKind::Literal(Literal::Int(1))));
            assert!(matches!(rhs.val().kind, ExprKind::Binary(_, BinOp::Mul, _)));
        }

        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn subtraction_is_left_associative() {
    let program = parse("int f() { return 8 - 4 - 2; }").unwrap();

    match &returned(&program).kind {
        ExprKind::Binary(lhs, BinOp::Sub, rhs) => {
            assert!(matches!(lhs.val().kind, ExprKind::Binary(_, BinOp::Sub, _)));
            assert!(matches!(rhs.val().kind, ExprKind::Literal(Literal::Int(2))));
        }

        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn logical_and_binds_tighter_than_or() {
    let program = parse("bool f(bool a, bool b, bool c) { return a || b && c; }").unwrap();

    match &returned(&program).kind {
        ExprKind::Binary(_, BinOp::Or, rhs) => {
            assert!(matches!(rhs.val().kind, ExprKind::Binary(_, BinOp::And, _)));
        }

        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn assignment_is_right_associative() {
    let program = parse("void f() { int a; int b; a = b = 3; }").unwrap();

    let statement = body(&program)[2].val();
    let value = match statement {
        Statement::Expr(expr) => match &expr.val().kind {
            ExprKind::Assign { op: None, value, .. } => value,
            other => panic!("unexpected tree {:?}", other),
        },

        other => panic!("unexpected statement {:?}", other),
    };

    assert!(matches!(value.val().kind, ExprKind::Assign { op: None, .. }));
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    let source = "void f(bool a, bool b) { int x; if (a) if (b) x = 1; else x = 2; }";
    let program = parse(source).unwrap();

    match body(&program)[1].val() {
        Statement::If {
            then, otherwise, ..
        } => {
            assert!(otherwise.is_none());
            assert!(matches!(
                then.val(),
                Statement::If {
                    otherwise: Some(_),
                    ..
                }
            ));
        }

        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn declarators_build_types() {
    let program = parse("int m[2][3]; float g = 1.5, h; int f(int v[], char c);").unwrap();
    assert_eq!(program.items.len(), 3);

    match &program.items[0] {
        Item::Global(declarations) => {
            let row = Type::Array(Box::new(Type::Int), Some(3));
            assert_eq!(declarations[0].typ.val(), &Type::Array(Box::new(row), Some(2)));
        }

        item => panic!("unexpected item {:?}", item),
    }

    match &program.items[1] {
        Item::Global(declarations) => {
            assert_eq!(declarations.len(), 2);
            assert!(declarations[0].init.is_some());
            assert!(declarations[1].init.is_none());
        }

        item => panic!("unexpected item {:?}", item),
    }

    match &program.items[2] {
        Item::Global(declarations) => {
            let signature = declarations[0].typ.val().signature().unwrap();
            assert_eq!(signature.ret, Type::Int);
            assert_eq!(signature.params[0], Type::Array(Box::new(Type::Int), None));
            assert_eq!(signature.params[1], Type::Char);
        }

        item => panic!("unexpected item {:?}", item),
    }
}

#[test]
fn for_loop_parts_are_optional() {
    let program = parse("void f() { for (;;) break; for (int i = 0; i < 3; i++) ; }").unwrap();
    let items = body(&program);

    assert!(matches!(
        items[0].val(),
        Statement::For {
            init: None,
            condition: None,
            step: None,
            ..
        }
    ));

    assert!(matches!(
        items[1].val(),
        Statement::For {
            init: Some(ForInit::Declaration(_)),
            condition: Some(_),
            step: Some(_),
            ..
        }
    ));
}

#[test]
fn casts_and_calls() {
    let program = parse("int g(float x) { return (int) x + g(1.0, 2); }").unwrap();

    match &returned(&program).kind {
        ExprKind::Binary(lhs, BinOp::Add, rhs) => {
            assert!(matches!(lhs.val().kind, ExprKind::Cast(..)));

            match &rhs.val().kind {
                ExprKind::Call { function, args, .. } => {
                    assert_eq!(function.val().to_string(), "g");
                    assert_eq!(args.len(), 2);
                }

                other => panic!("unexpected tree {:?}", other),
            }
        }

        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn recovery_reports_every_broken_statement() {
    let diagnostics = parse("int main() { int x = ; x = 1 +; return 0; }").unwrap_err();
    assert_eq!(diagnostics.kinds(), vec![ErrorKind::Syntax, ErrorKind::Syntax]);
}

#[test]
fn recovery_continues_with_following_functions() {
    let source = "int f() { return ) ; }\nint g() { return 1 }\nint h() { return 0; }\n";
    let diagnostics = parse(source).unwrap_err();

    assert_eq!(diagnostics.len(), 2);

    let lines: Vec<u32> = diagnostics
        .iter()
        .map(|error| error.location().start().line())
        .collect();

    assert_eq!(lines, vec![1, 2]);
}

#[test]
fn missing_brace_at_end_of_input() {
    let diagnostics = parse("int main() { return 0;").unwrap_err();
    assert_eq!(diagnostics.kinds(), vec![ErrorKind::Syntax]);
}

#[test]
fn functions_cannot_nest() {
    let diagnostics = parse("int main() { int f(int x); return 0; }").unwrap_err();
    assert_eq!(diagnostics.kinds(), vec![ErrorKind::Syntax]);
}
