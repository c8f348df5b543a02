use ucc::{
    compile::{self, Failure},
    error::ErrorKind,
    ir::*,
    types::Type,
};

fn compile(text: &str) -> Module {
    match compile::compile_str(text) {
        Ok(module) => module,
        Err(failure) => panic!("compilation failed:\n{}", failure),
    }
}

fn main_of(module: &Module) -> &Function {
    module.function("main").expect("module has no `main`")
}

fn names(function: &Function) -> Vec<&str> {
    function.blocks.iter().map(|block| block.name.as_str()).collect()
}

fn instructions(function: &Function) -> impl Iterator<Item = &Instruction> {
    function.blocks.iter().flat_map(|block| block.instructions.iter())
}

/// Bloques alcanzables desde la entrada, siguiendo solo la rama tomada
/// cuando la condición es constante.
fn reachable(function: &Function) -> Vec<bool> {
    let mut seen = vec![false; function.blocks.len()];
    let mut pending = vec![0usize];

    while let Some(index) = pending.pop() {
        if std::mem::replace(&mut seen[index], true) {
            continue;
        }

        let successors = match function.blocks[index].terminator() {
            Some(Instruction::Branch {
                condition: Operand::Const(Constant::Bool(taken)),
                then,
                otherwise,
            }) => vec![if *taken { *then } else { *otherwise }],

            Some(terminator) => terminator.successors(),
            None => Vec::new(),
        };

        pending.extend(successors.into_iter().map(|Label(label)| label as usize));
    }

    seen
}

fn calls(block: &Block, name: &str) -> bool {
    block.instructions.iter().any(|instruction| {
        matches!(instruction, Instruction::Call { function, .. } if &**function == name)
    })
}

// ============================================================================
// Escenarios de extremo a extremo
// ============================================================================

#[test]
fn addition_of_constants_is_stored_and_returned() {
    let module = compile("int main(){ int x; x = 2 + 3; return x; }");
    let main = main_of(&module);

    assert_eq!(main.blocks.len(), 1);
    let code = &main.blocks[0].instructions;

    let x = match &code[0] {
        Instruction::Alloc { dest, typ: Type::Int } => *dest,
        other => panic!("expected the slot of `x`, found {:?}", other),
    };

    let sum = match &code[1] {
        Instruction::Binary {
            dest,
            op: BinaryOp::Add,
            lhs: Operand::Const(Constant::Int(2)),
            rhs: Operand::Const(Constant::Int(3)),
        } => *dest,
        other => panic!("expected `2 + 3`, found {:?}", other),
    };

    assert_eq!(
        code[2],
        Instruction::Store {
            value: Operand::Reg(sum),
            address: Operand::Reg(x),
        }
    );

    let loaded = match &code[3] {
        Instruction::Load {
            dest,
            address: Operand::Reg(address),
        } if *address == x => *dest,
        other => panic!("expected a load of `x`, found {:?}", other),
    };

    assert_eq!(code[4], Instruction::Ret(Some(Operand::Reg(loaded))));
    assert_eq!(code.len(), 5);
}

#[test]
fn undeclared_identifier_produces_no_module() {
    match compile::compile_str("int main(){ return y; }") {
        Err(Failure::Rejected(diagnostics)) => {
            assert_eq!(diagnostics.kinds(), vec![ErrorKind::Undeclared]);
        }

        other => panic!("expected a rejection, found {:?}", other),
    }
}

#[test]
fn while_loop_adds_header_body_and_exit() {
    let module = compile("int main(){ int i; i = 0; while (i < 10) { i = i + 1; } return i; }");
    let main = main_of(&module);

    assert_eq!(
        names(main),
        vec!["entry", "while.cond.0", "while.body.0", "while.end.0"]
    );

    let header = Label(1);
    assert_eq!(main.blocks[0].terminator(), Some(&Instruction::Jump(header)));

    match main.block(header).terminator() {
        Some(Instruction::Branch {
            then, otherwise, ..
        }) => {
            assert_eq!(*then, Label(2));
            assert_eq!(*otherwise, Label(3));
        }

        other => panic!("expected a branch, found {:?}", other),
    }

    assert_eq!(main.blocks[2].terminator(), Some(&Instruction::Jump(header)));
    assert!(matches!(main.blocks[3].terminator(), Some(Instruction::Ret(Some(_)))));
}

#[test]
fn short_circuit_and_skips_the_call() {
    let module = compile(
        "bool side(){ print(\"called\"); return true; }
         int main(){ if (false && side()) { print(1); } return 0; }",
    );

    let main = main_of(&module);
    let seen = reachable(main);

    let with_call: Vec<usize> = (0..main.blocks.len())
        .filter(|&index| calls(&main.blocks[index], "side"))
        .collect();

    assert_eq!(with_call.len(), 1);
    assert_eq!(main.blocks[with_call[0]].name, "and.rhs.1");
    assert!(!seen[with_call[0]]);
}

#[test]
fn short_circuit_or_skips_the_call() {
    let module = compile(
        "bool side(){ return false; }
         int main(){ bool b; b = true || side(); return 0; }",
    );

    let main = main_of(&module);
    let seen = reachable(main);

    for (index, block) in main.blocks.iter().enumerate() {
        if calls(block, "side") {
            assert!(block.name.starts_with("or.rhs"));
            assert!(!seen[index]);
        }
    }
}

// ============================================================================
// Control de flujo
// ============================================================================

#[test]
fn if_else_blocks() {
    let module = compile("int main(){ int x; x = 1; if (x > 0) x = 2; else x = 3; return x; }");
    let main = main_of(&module);

    assert_eq!(names(main), vec!["entry", "if.then.0", "if.else.0", "if.end.0"]);
    assert_eq!(main.blocks[1].terminator(), Some(&Instruction::Jump(Label(3))));
    assert_eq!(main.blocks[2].terminator(), Some(&Instruction::Jump(Label(3))));
}

#[test]
fn if_without_else_branches_to_end() {
    let module = compile("int main(){ int x; x = 1; if (x > 0) x = 2; return x; }");
    let main = main_of(&module);

    assert_eq!(names(main), vec!["entry", "if.then.0", "if.end.0"]);
    assert!(matches!(
        main.blocks[0].terminator(),
        Some(Instruction::Branch {
            then: Label(1),
            otherwise: Label(2),
            ..
        })
    ));
}

#[test]
fn for_loop_runs_step_after_body() {
    let module =
        compile("int main(){ int s; s = 0; for (int i = 0; i < 3; i++) s += i; return s; }");
    let main = main_of(&module);

    assert_eq!(names(main), vec!["entry", "for.cond.0", "for.body.0", "for.end.0"]);

    let body = &main.blocks[2].instructions;
    let stores = body
        .iter()
        .filter(|instruction| matches!(instruction, Instruction::Store { .. }))
        .count();

    // `s += i` y luego `i++`
    assert_eq!(stores, 2);
    assert_eq!(body.last(), Some(&Instruction::Jump(Label(1))));
}

#[test]
fn infinite_for_jumps_straight_to_body() {
    let module = compile("int main(){ for (;;) { break; } return 0; }");
    let main = main_of(&module);

    assert_eq!(main.blocks[1].terminator(), Some(&Instruction::Jump(Label(2))));
    assert_eq!(main.blocks[2].terminator(), Some(&Instruction::Jump(Label(3))));
}

#[test]
fn code_after_return_lands_in_a_dead_block() {
    let module = compile("int main(){ return 1; print(2); }");
    let main = main_of(&module);

    assert_eq!(names(main), vec!["entry", "dead.0"]);
    assert_eq!(
        main.blocks[1].terminator(),
        Some(&Instruction::Ret(Some(Operand::Const(Constant::Int(0)))))
    );
}

#[test]
fn missing_return_yields_zero_value() {
    let module = compile("float f(){ } void g(){ } int main(){ g(); return 0; }");

    let f = module.function("f").unwrap();
    assert_eq!(
        f.blocks[0].terminator(),
        Some(&Instruction::Ret(Some(Operand::Const(Constant::Float(0.0)))))
    );

    let g = module.function("g").unwrap();
    assert_eq!(g.blocks[0].terminator(), Some(&Instruction::Ret(None)));
}

#[test]
fn assert_prints_its_position_and_returns() {
    let module = compile("int main(){\nassert true;\nreturn 0; }");
    let main = main_of(&module);

    assert_eq!(names(main), vec!["entry", "assert.true.0", "assert.false.0"]);

    let failure = &main.blocks[2].instructions;
    assert_eq!(
        failure[0],
        Instruction::Print {
            value: Operand::Global(".assert.0".into()),
            typ: Type::Array(Box::new(Type::Char), Some(21)),
        }
    );

    let message = module
        .globals
        .iter()
        .find(|global| &*global.name == ".assert.0")
        .unwrap();

    assert_eq!(message.init, Some(Data::Str("assertion_fail on 2:1".into())));
}

// ============================================================================
// Datos
// ============================================================================

#[test]
fn array_access_computes_an_address() {
    let module = compile("int main(){ int a[3]; a[1] = 5; return a[1]; }");
    let main = main_of(&module);
    let code: Vec<&Instruction> = instructions(main).collect();

    let array = match code[0] {
        Instruction::Alloc { dest, typ } => {
            assert_eq!(typ, &Type::Array(Box::new(Type::Int), Some(3)));
            *dest
        }

        other => panic!("expected the array slot, found {:?}", other),
    };

    assert!(matches!(
        code[1],
        Instruction::Binary {
            op: BinaryOp::Mul,
            lhs: Operand::Const(Constant::Int(1)),
            rhs: Operand::Const(Constant::Int(4)),
            ..
        }
    ));

    let element = match code[2] {
        Instruction::Offset {
            dest,
            base: Operand::Reg(base),
            ..
        } if *base == array => *dest,
        other => panic!("expected an offset, found {:?}", other),
    };

    assert_eq!(
        code[3],
        &Instruction::Store {
            value: Operand::Const(Constant::Int(5)),
            address: Operand::Reg(element),
        }
    );

    assert!(matches!(main.register_type(element), RegType::Address(Type::Int)));
    assert!(matches!(code[6], Instruction::Load { .. }));
}

#[test]
fn array_parameters_are_used_in_place() {
    let module = compile(
        "int first(int v[]){ return v[0]; }
         int main(){ int a[2] = {7, 8}; return first(a); }",
    );

    let first = module.function("first").unwrap();
    assert!(matches!(first.register_type(Reg(0)), RegType::Address(_)));
    assert!(!instructions(first)
        .any(|instruction| matches!(instruction, Instruction::Alloc { .. })));

    let main = main_of(&module);
    let array = match &main.blocks[0].instructions[0] {
        Instruction::Alloc { dest, .. } => *dest,
        other => panic!("expected the array slot, found {:?}", other),
    };

    let pass_array = Instruction::Param(Operand::Reg(array));
    assert!(instructions(main).any(|instruction| instruction == &pass_array));
}

#[test]
fn calls_marshal_arguments() {
    let module = compile(
        "int add(int a, float b){ return a; }
         void hello(){ print(); }
         int main(){ hello(); return add(1, 2); }",
    );

    let main = main_of(&module);
    let code: Vec<&Instruction> = instructions(main).collect();

    assert_eq!(
        code[0],
        &Instruction::Call {
            dest: None,
            function: "hello".into(),
            args: 0
        }
    );

    // El entero se convierte antes de pasarse como `float`
    assert!(matches!(
        code[1],
        Instruction::Convert {
            conversion: Conversion::IntToFloat,
            operand: Operand::Const(Constant::Int(2)),
            ..
        }
    ));

    assert_eq!(code[2], &Instruction::Param(Operand::Const(Constant::Int(1))));
    assert!(matches!(code[3], Instruction::Param(Operand::Reg(_))));
    assert!(matches!(
        code[4],
        Instruction::Call {
            dest: Some(_),
            args: 2,
            ..
        }
    ));

    let add = module.function("add").unwrap();
    assert_eq!(add.params, vec![Type::Int, Type::Float]);
    assert_eq!(add.register_type(Reg(1)), &RegType::Value(Type::Float));

    let hello = module.function("hello").unwrap();
    assert_eq!(
        hello.blocks[0].instructions[0],
        Instruction::Print {
            value: Operand::Const(Constant::Char('\n')),
            typ: Type::Char
        }
    );
}

#[test]
fn globals_carry_constant_data() {
    let module = compile(
        "int g = 3; int v[3] = {1}; char s[] = \"hi\"; float f = -2; bool b;
         int main(){ print(\"hello\"); return g; }",
    );

    let data: Vec<(&str, Option<&Data>)> = module
        .globals
        .iter()
        .map(|global| (&*global.name, global.init.as_ref()))
        .collect();

    assert_eq!(
        data,
        vec![
            ("g", Some(&Data::Scalar(Constant::Int(3)))),
            (
                "v",
                Some(&Data::Array(vec![
                    Run {
                        value: Constant::Int(1),
                        count: 1
                    },
                    Run {
                        value: Constant::Int(0),
                        count: 2
                    },
                ]))
            ),
            ("s", Some(&Data::Str("hi".into()))),
            ("f", Some(&Data::Scalar(Constant::Float(-2.0)))),
            ("b", None),
            (".str.0", Some(&Data::Str("hello".into()))),
        ]
    );

    assert_eq!(module.globals[2].typ, Type::Array(Box::new(Type::Char), Some(2)));

    let main = main_of(&module);
    assert!(instructions(main).any(|instruction| matches!(
        instruction,
        Instruction::Load {
            address: Operand::Global(name),
            ..
        } if &**name == "g"
    )));
}

#[test]
fn local_initializers_zero_fill() {
    let module = compile("int main(){ int a[3] = {4}; return a[2]; }");
    let main = main_of(&module);

    let stored: Vec<&Operand> = instructions(main)
        .filter_map(|instruction| match instruction {
            Instruction::Store { value, .. } => Some(value),
            _ => None,
        })
        .collect();

    assert_eq!(
        stored,
        vec![
            &Operand::Const(Constant::Int(4)),
            &Operand::Const(Constant::Int(0)),
            &Operand::Const(Constant::Int(0)),
        ]
    );
}

#[test]
fn large_global_zero_tails_stay_compact() {
    let module = compile(
        "char big[10000000] = {'a'}; int m[1000][1000] = {{1, 1}, {2}};
         int main(){ return m[1][0]; }",
    );

    let runs = |name: &str| match module.globals.iter().find(|global| &*global.name == name) {
        Some(Global {
            init: Some(Data::Array(runs)),
            ..
        }) => runs.clone(),
        other => panic!("unexpected global: {:?}", other),
    };

    let run = |value, count| Run { value, count };
    assert_eq!(
        runs("big"),
        vec![run(Constant::Char('a'), 1), run(Constant::Char('\0'), 9_999_999)]
    );

    assert_eq!(
        runs("m"),
        vec![
            run(Constant::Int(1), 2),
            run(Constant::Int(0), 998),
            run(Constant::Int(2), 1),
            run(Constant::Int(0), 999 + 998 * 1000),
        ]
    );

    assert!(module.to_string().contains("@big = global char[10000000] {'a', '\\0' x 9999999}"));
}

#[test]
fn large_local_zero_tails_use_a_loop() {
    let module = compile("int main(){ char l[1000000] = {'a'}; int a[20] = {7}; return a[3]; }");
    let main = main_of(&module);

    assert!(instructions(main).count() < 100);
    assert_eq!(
        names(main)
            .iter()
            .filter(|name| name.starts_with("fill.cond."))
            .count(),
        2
    );

    let bounds: Vec<&Operand> = instructions(main)
        .filter_map(|instruction| match instruction {
            Instruction::Compare {
                op: CompareOp::Lt,
                rhs,
                ..
            } => Some(rhs),
            _ => None,
        })
        .collect();

    assert_eq!(
        bounds,
        vec![
            &Operand::Const(Constant::Int(999_999)),
            &Operand::Const(Constant::Int(19)),
        ]
    );

    assert!(module.verify().is_ok());
}

#[test]
fn implicit_and_explicit_conversions() {
    let module = compile("int main(){ float f; f = 1; return (int) f; }");
    let conversions: Vec<Conversion> = instructions(main_of(&module))
        .filter_map(|instruction| match instruction {
            Instruction::Convert { conversion, .. } => Some(*conversion),
            _ => None,
        })
        .collect();

    assert_eq!(conversions, vec![Conversion::IntToFloat, Conversion::FloatToInt]);
}

#[test]
fn module_text() {
    let module = compile("int g; int main(){ g = 1; return g; }");
    let text = module.to_string();

    assert!(text.starts_with("@g = global int\n"));
    assert!(text.contains("function int @main() {\nentry:\n"));
    assert!(text.contains("\tstore   1, @g\n"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn every_block_ends_in_one_terminator() {
    let module = compile(
        "int fib(int n){ if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
         int main(){
             int i; int v[5];
             for (i = 0; i < 5; i++) { v[i] = fib(i); if (v[i] > 2 && i != 4) break; }
             while (true) { if (i == 0 || false) { return 1; } else { i--; } }
         }",
    );

    assert!(module.verify().is_ok());
    for function in &module.functions {
        for block in &function.blocks {
            let (last, rest) = block.instructions.split_last().unwrap();
            assert!(last.is_terminator(), "{} in {}", block.name, function.name);
            assert!(!rest.iter().any(Instruction::is_terminator));
        }
    }
}
