use moonc_lang_parser::parse_source;

use super::generate;
use crate::result::BackendError;
use crate::vm::run_source;

fn generate_source(source: &str) -> Result<crate::Program, BackendError> {
    let mut ast = parse_source(source).ast.expect("parsed");
    let elaboration = moonc_lang_elaborator::elaborate(&mut ast);
    assert!(!elaboration.has_errors(), "{:?}", elaboration.errors);
    generate(&ast, &elaboration.tables)
}

#[test]
fn writes_a_sum() {
    let source = "func main() -> void { let x: integer; let y: integer; write(1 + 5); }";
    assert_eq!(run_source(source, &[]), "6\n");
}

#[test]
fn program_layout() {
    let source = "func main() -> void { let x: integer; x = 7; }";
    let program = generate_source(source).unwrap();
    let text = program.to_string();
    assert!(text.starts_with("% Main:\n% main\n            entry\n            addi r14, r0, topaddr\n"), "{text}");
    assert!(text.contains("% Data:\nbuf         res 20\n"), "{text}");
    assert!(program.data.iter().any(|line| line.starts_with("x_0 ")), "{:?}", program.data);
    assert_eq!(program.code.last().map(|line| line.trim()), Some("hlt"));
}

#[test]
fn arithmetic_and_precedence() {
    let source = "func main() -> void {
        let a: integer;
        let b: integer;
        a = 7;
        b = 3;
        write(a * b - 4 / 2);
        write(-a + 10);
        write((a + b) * 2);
    }";
    assert_eq!(run_source(source, &[]), "19\n3\n20\n");
}

#[test]
fn relational_and_logical_operators() {
    let source = "func main() -> void {
        write(1 < 2);
        write(2 <= 1);
        write(3 == 3);
        write(3 <> 3);
        write(1 & 0);
        write(1 | 0);
        write(!0);
    }";
    assert_eq!(run_source(source, &[]), "1\n0\n1\n0\n0\n1\n1\n");
}

#[test]
fn control_flow() {
    let source = "func main() -> void {
        let i: integer;
        let sum: integer;
        i = 1;
        sum = 0;
        while (i <= 10) {
            sum = sum + i;
            i = i + 1;
        };
        if (sum > 50) then write(sum); else write(0);;
        if (sum < 50) then { write(1); } else { write(2); };
    }";
    assert_eq!(run_source(source, &[]), "55\n2\n");
}

#[test]
fn arrays_are_row_major() {
    let source = "func main() -> void {
        let m: integer[3][4];
        let i: integer;
        let j: integer;
        i = 0;
        while (i < 3) {
            j = 0;
            while (j < 4) {
                m[i][j] = i * 10 + j;
                j = j + 1;
            };
            i = i + 1;
        };
        write(m[2][3]);
        write(m[1][0] + m[0][2]);
    }";
    assert_eq!(run_source(source, &[]), "23\n12\n");
}

#[test]
fn struct_fields_and_inheritance() {
    let source = "
        struct A { public let a: integer; public let pad: integer[2]; };
        struct B inherits A { public let b: integer; };
        func main() -> void {
            let v: B[2];
            v[1].a = 4;
            v[1].b = 5;
            v[0].b = 1;
            write(v[1].a * v[1].b + v[0].b);
        }
    ";
    assert_eq!(run_source(source, &[]), "21\n");
}

#[test]
fn free_functions_with_static_frames() {
    let source = "
        func square(x: integer) -> integer { return (x * x); }
        func show(x: integer, y: integer) -> void { write(x - y); }
        func main() -> void {
            let r: integer;
            r = square(3) + square(4);
            write(r);
            show(r, 5);
        }
    ";
    assert_eq!(run_source(source, &[]), "25\n20\n");
}

#[test]
fn read_stores_input() {
    let source = "func main() -> void { let a: integer[2]; read(a[1]); write(a[1] * 2); }";
    assert_eq!(run_source(source, &[21]), "42\n");
}

#[test]
fn registers_are_all_released() {
    let source = "
        func f(x: integer) -> integer { return (x + 1); }
        func main() -> void { let a: integer[4]; a[f(1)] = f(f(2)); write(a[2]); }
    ";
    assert_eq!(run_source(source, &[]), "4\n");
}

#[test]
fn missing_main() {
    let source = "func helper() -> void { }";
    assert_eq!(generate_source(source), Err(BackendError::MissingMain));
}

#[test]
fn floats_are_rejected() {
    let source = "func main() -> void { let f: float; f = 1.5; }";
    match generate_source(source) {
        Err(BackendError::Unsupported { what, line, .. }) => {
            assert_eq!((what.as_str(), line), ("Float value", 1));
        }
        other => panic!("expected an unsupported construct, got {other:?}"),
    }
}

#[test]
fn integer_literals_must_fit_a_word() {
    let source = "func main() -> void {\n  write(2147483647);\n  write(99999999999);\n}";
    match generate_source(source) {
        Err(BackendError::Unsupported { what, line, .. }) => {
            assert_eq!((what.as_str(), line), ("Integer literal outside the 32-bit range", 3));
        }
        other => panic!("expected an unsupported construct, got {other:?}"),
    }
}

#[test]
fn method_calls_are_rejected() {
    let source = "
        struct P { public func get() -> integer; };
        impl P { func get() -> integer { return (1); } }
        func main() -> void { let p: P; write(p.get()); }
    ";
    assert!(matches!(generate_source(source), Err(BackendError::Unsupported { .. })));
}
