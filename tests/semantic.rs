use ucc::{
    compile::{self, Failure},
    error::{ErrorKind, LocatedError},
    parse::ast::*,
    semantic::scope::SymbolKind,
    types::Type,
};

use ErrorKind::*;

fn errors(text: &str) -> Vec<ErrorKind> {
    match compile::check(text.as_bytes(), "test") {
        Ok(_) => Vec::new(),
        Err(diagnostics) => diagnostics.kinds(),
    }
}

fn accepts(text: &str) {
    if let Err(diagnostics) = compile::check(text.as_bytes(), "test") {
        panic!("program was rejected:\n{}", diagnostics);
    }
}

// ============================================================================
// Identificadores y ámbitos
// ============================================================================

#[test]
fn undeclared_identifier_is_named_once() {
    let diagnostics = match compile::compile_str("int main(){ return y; }") {
        Err(Failure::Rejected(diagnostics)) => diagnostics,
        other => panic!("expected a rejection, found {:?}", other),
    };

    assert_eq!(diagnostics.kinds(), vec![Undeclared]);

    let error = diagnostics.iter().next().unwrap();
    assert!(error.source().to_string().contains("`y`"));
    assert_eq!(error.location().start().column(), 20);
}

#[test]
fn every_bad_statement_is_reported() {
    assert_eq!(
        errors("int main(){ a = 1; b = 2; return c; }"),
        vec![Undeclared, Undeclared, Undeclared]
    );
}

fn messages(text: &str) -> Vec<String> {
    match compile::compile_str(text) {
        Err(Failure::Rejected(diagnostics)) => {
            diagnostics.iter().map(|error| error.source().to_string()).collect()
        }
        other => panic!("expected a rejection, found {:?}", other),
    }
}

#[test]
fn every_operand_is_checked() {
    let found = messages("int main(){ return y + z; }");
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|message| message.contains("`y`")));
    assert!(found.iter().any(|message| message.contains("`z`")));

    let found = messages("int main(){ g(h); return 0; }");
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|message| message.contains("`g`")));
    assert!(found.iter().any(|message| message.contains("`h`")));
}

#[test]
fn failed_operands_do_not_cascade() {
    assert_eq!(errors("int main(){ int a; a = -(y * 2) + 1; return a; }"), vec![Undeclared]);
    assert_eq!(errors("int main(){ if (y < 1 && true) return 1; return 0; }"), vec![Undeclared]);
}

#[test]
fn redeclaration_in_one_scope() {
    assert_eq!(errors("int main(){ int x; int x; return 0; }"), vec![Redeclaration]);
    assert_eq!(errors("int g; float g; int main(){ return 0; }"), vec![Redeclaration]);
}

#[test]
fn shadowing_in_nested_scope_is_legal() {
    accepts("int x; int main(){ int x; { float x; x = 1.5; } x = 2; return x; }");
    accepts("int main(){ for (int i = 0; i < 3; i++) { int i; i = 7; } return 0; }");
}

#[test]
fn parameters_share_the_body_scope() {
    assert_eq!(errors("int f(int a){ int a; return a; }"), vec![Redeclaration]);
    accepts("int f(int a){ { int a; a = 1; } return a; }");
}

#[test]
fn names_die_with_their_scope() {
    assert_eq!(errors("int main(){ { int t; } return t; }"), vec![Undeclared]);
    assert_eq!(
        errors("int main(){ for (int i = 0; i < 3; i++) ; return i; }"),
        vec![Undeclared]
    );
}

#[test]
fn functions_may_be_called_before_their_definition() {
    accepts("int main(){ return twice(4); } int twice(int n){ return n * 2; }");
}

#[test]
fn prototypes_must_match_definitions() {
    accepts("int f(int x); int main(){ return f(1); } int f(int x){ return x; }");
    assert_eq!(errors("int f(float x); int f(int x){ return x; }"), vec![Redeclaration]);
    assert_eq!(errors("int f(){ return 0; } int f(){ return 1; }"), vec![Redeclaration]);
}

#[test]
fn functions_and_variables_are_not_interchangeable() {
    assert_eq!(errors("int main(){ int x; return x(); }"), vec![Type]);
    assert_eq!(errors("int f(){ return 0; } int main(){ return f + 1; }"), vec![Type]);
}

// ============================================================================
// Tipos
// ============================================================================

#[test]
fn arity_mismatch() {
    assert_eq!(
        errors("int f(int a){ return a; } int main(){ return f(1, 2); }"),
        vec![Arity]
    );

    assert_eq!(
        errors("int f(int a){ return a; } int main(){ return f(1, q); }"),
        vec![Undeclared, Arity]
    );
}

#[test]
fn argument_types_are_checked() {
    assert_eq!(
        errors("int f(int a){ return a; } int main(){ return f(true); }"),
        vec![Type]
    );

    accepts("float half(float a){ return a / 2; } int main(){ float h; h = half(3); return 0; }");
}

#[test]
fn assignment_never_narrows() {
    assert_eq!(errors("int main(){ int x; x = 1.5; return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ int x; x = true; return 0; }"), vec![Type]);
    accepts("int main(){ float y; y = 1; y += 2; return 0; }");
}

#[test]
fn conditions_must_be_bool() {
    assert_eq!(errors("int main(){ if (1) return 1; return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ while (0) {} return 0; }"), vec![Type]);
    accepts("int main(){ int i; i = 0; while (i < 10 && !false) i++; assert i == 10; return 0; }");
}

#[test]
fn logical_operators_need_bool() {
    assert_eq!(errors("int main(){ bool b; b = 1 && true; return 0; }"), vec![Type]);
}

#[test]
fn return_types_are_checked() {
    assert_eq!(errors("void f(){ return 1; }"), vec![Type]);
    assert_eq!(errors("int f(){ return; }"), vec![Type]);
    accepts("float f(){ return 1; } void g(){ return; }");
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    let (program, _) = compile::check("float f(){ return 1 + 2.0; }".as_bytes(), "test").unwrap();

    let function = match &program.items[0] {
        Item::Function(function) => function,
        item => panic!("unexpected item {:?}", item),
    };

    match function.body.items[0].val() {
        Statement::Return(Some(value)) => assert_eq!(value.val().typ, Some(Type::Float)),
        statement => panic!("unexpected statement {:?}", statement),
    }
}

#[test]
fn casts_between_numeric_types() {
    accepts("int main(){ float f; f = 2.5; return (int) f; }");
    assert_eq!(errors("int main(){ bool b; b = true; return (int) b + 0 * (int) 'a'; }").len(), 1);
}

// ============================================================================
// Arreglos
// ============================================================================

#[test]
fn constant_indices_are_bounds_checked() {
    assert_eq!(errors("int main(){ int a[3]; a[3] = 1; return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ int a[3]; a[-1] = 1; return 0; }"), vec![Type]);
    accepts("int main(){ int a[3]; a[2] = 1; return a[0]; }");
}

#[test]
fn indices_must_be_int() {
    assert_eq!(errors("int main(){ int a[3]; return a[1.0]; }"), vec![Type]);
    assert_eq!(errors("int main(){ int a; return a[0]; }"), vec![Type]);
}

#[test]
fn arrays_need_a_size() {
    assert_eq!(errors("int main(){ int a[]; return 0; }"), vec![Type]);
}

#[test]
fn arrays_fit_in_the_int_range() {
    assert_eq!(errors("bool m[1][3][1000000000]; int main(){ return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ int a[600000000]; return 0; }"), vec![Type]);
    assert_eq!(errors("int f(int p[][1073741824]){ return 0; }"), vec![Type]);
    accepts("char c[2147483647]; int main(){ return 0; }");
    accepts("int main(){ int a[] = {1, 2, 3}; char s[] = \"abc\"; return a[2]; }");
}

#[test]
fn initializers_must_fit() {
    assert_eq!(errors("int a[2] = {1, 2, 3};"), vec![Type]);
    assert_eq!(errors("char s[2] = \"abc\";"), vec![Type]);
    assert_eq!(errors("int x = {1};"), vec![Type]);
    accepts("int a[4] = {1, 2}; int m[2][2] = {{1, 2}, {3, 4}};");
}

#[test]
fn unsized_array_parameters_take_any_length() {
    accepts(
        "int sum(int v[], int n){ int s; s = 0; for (int i = 0; i < n; i++) s += v[i]; return s; }
         int main(){ int a[4] = {1, 2, 3, 4}; return sum(a, 4); }",
    );

    assert_eq!(errors("int f(int m[][]){ return 0; }"), vec![Type]);
}

#[test]
fn whole_arrays_are_not_assignable() {
    assert_eq!(errors("int main(){ int a[2]; int b[2]; a = b; return 0; }"), vec![Type]);
}

// ============================================================================
// Otras reglas
// ============================================================================

#[test]
fn global_initializers_are_constant() {
    assert_eq!(errors("int a = 1; int b = a;"), vec![Type]);
    accepts("int a = -1; float f = 2; char c = 'x'; bool t = true;");
}

#[test]
fn break_requires_a_loop() {
    assert_eq!(errors("int main(){ break; return 0; }"), vec![Type]);
    accepts("int main(){ while (true) { if (true) break; } return 0; }");
}

#[test]
fn void_variables_are_rejected() {
    assert_eq!(errors("int main(){ void v; return 0; }"), vec![Type]);
}

#[test]
fn only_lvalues_are_written() {
    assert_eq!(errors("int main(){ int x; x + 1 = 2; return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ 3++; return 0; }"), vec![Type]);
    assert_eq!(errors("int main(){ read(4); return 0; }"), vec![Type]);
}

#[test]
fn print_accepts_scalars_and_strings() {
    accepts("int main(){ int x; x = 4; print(\"x = \", x, 2.5, 'c', true); print(); return 0; }");
    assert_eq!(errors("int main(){ int a[2]; print(a); return 0; }"), vec![Type]);
}

#[test]
fn symbol_table_records_functions() {
    let (_, symbols) = compile::check(
        "int g; int f(int a); int main(){ return f(g); } int f(int a){ return a; }".as_bytes(),
        "test",
    )
    .unwrap();

    let f = symbols
        .symbols()
        .map(|(_, symbol)| symbol)
        .find(|symbol| symbol.name.to_string() == "f")
        .unwrap();

    assert_eq!(f.kind, SymbolKind::Function { defined: true });
    assert!(f.is_global());

    let a = symbols
        .symbols()
        .map(|(_, symbol)| symbol)
        .find(|symbol| symbol.name.to_string() == "a")
        .unwrap();

    assert_eq!(a.kind, SymbolKind::Parameter);
    assert!(!a.is_global());
}
