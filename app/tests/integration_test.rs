use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

const PROGRAM: &str = "func main() -> void {
    let x: integer;
    x = 6 * 7;
    write(x);
}
";

fn moonc_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("moonc");
    cmd.env("MOONC_COLORIZE", "never");
    cmd
}

/// A temporary working directory holding `prog.src`.
fn workspace(source: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("prog.src"), source).unwrap();
    dir
}

/// Check that "moonc --version" works correctly
#[test]
fn version_command() {
    let assert = moonc_cmd().arg("--version").assert();
    assert.success().stdout("moonc 0.1.0\n");
}

#[test]
fn build_writes_artifacts_to_outdir() {
    let dir = workspace(PROGRAM);
    moonc_cmd().current_dir(dir.path()).args(["build", "prog.src", "-d", "out"]).assert().success();

    let out = dir.path().join("out");
    let assembly = fs::read_to_string(out.join("prog.moon")).unwrap();
    assert!(assembly.starts_with("% Main:\n"), "{assembly}");
    assert!(out.join("prog.outsymboltables").exists());
    assert_eq!(fs::read_to_string(out.join("prog.outsemanticerrors")).unwrap(), "");
    assert!(!out.join("prog.outlextokens").exists());
}

#[test]
fn debug_flag_writes_earlier_artifacts() {
    let dir = workspace(PROGRAM);
    moonc_cmd().current_dir(dir.path()).args(["build", "prog.src", "-D"]).assert().success();
    for extension in ["outlextokens", "outlexerrors", "outderivation", "outsyntaxerrors", "outast"] {
        assert!(dir.path().join(format!("prog.{extension}")).exists(), "missing {extension}");
    }
}

#[test]
fn lex_from_stdin_to_stdout() {
    moonc_cmd()
        .args(["lex", "-o", "-"])
        .write_stdin("x = 1;\ny")
        .assert()
        .success()
        .stdout("[id, x, 1] [assign, =, 1] [intnum, 1, 1] [semi, ;, 1]\n[id, y, 2]\n");
}

#[test]
fn lexical_errors_fail_the_command() {
    let dir = workspace("x = 1 @ 2;");
    moonc_cmd().current_dir(dir.path()).args(["lex", "prog.src"]).assert().code(1);
    let errors = fs::read_to_string(dir.path().join("prog.outlexerrors")).unwrap();
    assert_eq!(errors, "Lexical error: Invalid character: \"@\": line 1.\n");
}

#[test]
fn semantic_errors_fail_the_build() {
    let dir = workspace("func main() -> void { x = 1; }");
    let assert = moonc_cmd().current_dir(dir.path()).args(["build", "prog.src"]).assert();
    let output = assert.code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("S-002"), "{stderr}");
    assert!(!dir.path().join("prog.moon").exists());
    let errors = fs::read_to_string(dir.path().join("prog.outsemanticerrors")).unwrap();
    assert_eq!(errors, "Semantic error: Use of undeclared identifier 'x': line 1.\n");
}

#[test]
fn several_inputs_in_input_order() {
    let dir = workspace(PROGRAM);
    fs::write(dir.path().join("other.src"), "func main() -> void { write(1); }").unwrap();
    let assert = moonc_cmd()
        .current_dir(dir.path())
        .args(["parse", "prog.src", "other.src", "-o", "-"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let roots: Vec<usize> = stdout.match_indices("Prog\n").map(|(idx, _)| idx).collect();
    assert_eq!(roots.len(), 2, "{stdout}");
    let x = stdout.find("Id: x").unwrap();
    assert!(roots[0] < x && x < roots[1], "{stdout}");
}

#[test]
fn missing_input_file() {
    moonc_cmd().args(["build", "does-not-exist.src"]).assert().code(66);
}

#[test]
fn uncreatable_output_file() {
    let dir = workspace(PROGRAM);
    moonc_cmd()
        .current_dir(dir.path())
        .args(["build", "prog.src", "-o", "missing/dir/prog.moon"])
        .assert()
        .code(73);
}

#[test]
fn fmt_prints_the_source() {
    let dir = workspace("func main()->void{let x:integer;x=1;}");
    let assert = moonc_cmd().current_dir(dir.path()).args(["fmt", "prog.src"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("func main() -> void"), "{stdout}");
    assert!(stdout.contains("let x: integer;"), "{stdout}");
}
