use std::path::Path;

use crate::*;

const PROGRAM: &str = "func main() -> void {
    let x: integer;
    x = 2 * 21;
    write(x);
}
";

fn database(text: &str) -> Database {
    let mut source = InMemorySource::new();
    source.insert("prog.src", text);
    Database::from_source(source)
}

#[test]
fn build_writes_every_artifact_in_debug_mode() {
    let mut db = database(PROGRAM);
    let mut target = InMemorySource::new();
    let written = db
        .write_artifacts(Path::new("prog.src"), Phase::Build, true, &mut target, Path::new("out"))
        .unwrap();
    assert_eq!(written.len(), 8);
    assert_eq!(target.get(Path::new("out/prog.outlexerrors")), Some(""));
    assert_eq!(target.get(Path::new("out/prog.outsemanticerrors")), Some(""));
    let assembly = target.get(Path::new("out/prog.moon")).unwrap();
    assert!(assembly.starts_with("% Main:\n"), "{assembly}");
    assert!(assembly.contains("% Data:\n"), "{assembly}");
    let ast = target.get(Path::new("out/prog.outast")).unwrap();
    assert!(ast.starts_with("Prog"), "{ast}");
    assert!(db.errors(Path::new("prog.src"), Phase::Build).unwrap().is_empty());
}

#[test]
fn lex_only_writes_token_listings() {
    let mut db = database("x = 1;\n@");
    let mut target = InMemorySource::new();
    let written = db
        .write_artifacts(Path::new("prog.src"), Phase::Lex, false, &mut target, Path::new(""))
        .unwrap();
    assert_eq!(written, vec![Path::new("prog.outlextokens"), Path::new("prog.outlexerrors")]);
    assert_eq!(
        target.get(Path::new("prog.outlexerrors")),
        Some("Lexical error: Invalid character: \"@\": line 2.\n")
    );
    assert!(db.parsed.is_stale(Path::new("prog.src")));
}

#[test]
fn lexical_errors_keep_the_program_from_semantic_analysis() {
    let mut db = database("func main() -> void { let x: integer; x = 1 @ 2; }");
    let path = Path::new("prog.src");
    let errors = db.errors(path, Phase::Build).unwrap();
    assert!(matches!(errors.first(), Some(MainError::Lexical(_))), "{errors:?}");
    assert!(db.checked(path).unwrap().is_none());
    assert_eq!(db.render(path, Artifact::SymbolTables).unwrap(), None);
}

#[test]
fn syntax_errors_skip_semantic_analysis() {
    let mut db = database("func main() -> void { let x: integer x = 1; }");
    let path = Path::new("prog.src");
    let errors = db.errors(path, Phase::Build).unwrap();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|err| matches!(err, MainError::Parser(_))), "{errors:?}");
    assert!(db.checked(path).unwrap().is_none());
    assert!(db.render(path, Artifact::SyntaxErrors).unwrap().is_some_and(|text| text.starts_with("Syntax error")));
    assert_eq!(db.render(path, Artifact::Ast).unwrap(), None);
}

#[test]
fn semantic_errors_skip_code_generation() {
    let mut db = database("func main() -> void { let x: integer; x = y; }");
    let path = Path::new("prog.src");
    let errors = db.errors(path, Phase::Build).unwrap();
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(messages, vec!["Semantic error: Use of undeclared identifier 'y': line 1.".to_owned()]);
    assert!(db.assembly(path).unwrap().is_none());
    assert_eq!(db.render(path, Artifact::Assembly).unwrap(), None);
    assert!(db.render(path, Artifact::SymbolTables).unwrap().is_some());
}

#[test]
fn warnings_do_not_count_as_errors() {
    let source = "
        struct S {
            public func get(x: integer) -> void;
            public func get(x: float) -> void;
        };
        impl S {
            func get(x: integer) -> void { }
            func get(x: float) -> void { }
        }
        func main() -> void { write(1); }
    ";
    let mut db = database(source);
    let errors = db.errors(Path::new("prog.src"), Phase::Build).unwrap();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(MainError::is_warning), "{errors:?}");
    assert!(db.render(Path::new("prog.src"), Artifact::Assembly).unwrap().is_some());
}

#[test]
fn rewriting_a_source_invalidates_its_phases() {
    let mut db = database("func main() -> void { write(1); }");
    let path = Path::new("prog.src");
    assert!(db.errors(path, Phase::Build).unwrap().is_empty());
    db.write_source(path, "func main() -> void { write(y); }").unwrap();
    assert!(db.checked.is_stale(path));
    assert_eq!(db.errors(path, Phase::Build).unwrap().len(), 1);
}

#[test]
fn missing_input() {
    let mut db = Database::in_memory();
    let err = db.errors(Path::new("nope.src"), Phase::Lex).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn errors_render_with_their_source() {
    let mut db = database("func main() -> void { x = 1; }");
    let path = Path::new("prog.src");
    let errors = db.errors(path, Phase::Build).unwrap();
    let reports = db.pretty_errors(path, errors);
    let text = render_reports_to_string(&reports, moonc_lang_printer::ColorChoice::Never);
    assert!(text.contains("S-002"), "{text}");
    assert!(text.contains("prog.src"), "{text}");
}

#[test]
fn artifact_names() {
    assert_eq!(artifact_name(Path::new("dir/bubblesort.src")), "bubblesort");
    assert_eq!(artifact_name(Path::new("stdin")), "stdin");
}
