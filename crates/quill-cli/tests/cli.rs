//! Integration tests for the quill CLI
//!
//! Documents, libraries and configuration are written to a temporary
//! directory and compiled through the same entry points the binary uses.

use std::fs;

use quill_cli::{compile_command, exit_code, CompileArgs, TargetFormat, EXIT_NO_SOURCE};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn args(dir: &TempDir, input: std::path::PathBuf) -> CompileArgs {
    let mut args = CompileArgs::new(input);
    args.output = dir.path().join("out");
    args
}

#[test]
fn test_compile_html_with_media() {
    let dir = TempDir::new().unwrap();
    write(&dir, "cat.png", "not really a png");
    let input = write(
        &dir,
        "guide.md",
        ".docname {Guide}\n\n# Cats\n\n![A cat](cat.png \"Whiskers\") {#cat}\n",
    );

    let output = compile_command(&args(&dir, input)).unwrap();
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let index = fs::read_to_string(dir.path().join("out/index.html")).unwrap();
    assert!(index.starts_with("<!DOCTYPE html>"));
    assert!(index.contains("<title>Guide</title>"));

    let media: Vec<_> = fs::read_dir(dir.path().join("out/media"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(media.len(), 1);
    assert!(media[0].starts_with("cat@") && media[0].ends_with(".png"));
}

#[test]
fn test_compile_text_with_config_and_library() {
    let dir = TempDir::new().unwrap();
    write(&dir, "quill.toml", "wrap_output = false\ndefault_locale = \"de\"\n");
    let library = write(&dir, "macros.md", ".function {shout} {text: .uppercase {.text}!}\n");
    let input = write(
        &dir,
        "notes.md",
        ".include {macros}\n.doctype {paged}\n\n# Start {#start}\n\n.shout {hello}, see .ref {start}.\n",
    );

    let mut args = args(&dir, input);
    args.target = TargetFormat::Text;
    args.libraries.push(library);
    let output = compile_command(&args).unwrap();

    let text = fs::read_to_string(dir.path().join("out/document.txt")).unwrap();
    assert_eq!(text, "1 Start\n\nHELLO!, see Abschnitt 1.\n");
    assert_eq!(output.rendered, text);
}

#[test]
fn test_bibliography_is_read_next_to_the_source() {
    let dir = TempDir::new().unwrap();
    write(&dir, "refs.bib", "@misc{web, title = {The Web}, year = {1991}}\n");
    let input = write(&dir, "paper.md", "Read .cite {web}.\n\n.bibliography {refs.bib}\n");

    let mut args = args(&dir, input);
    args.target = TargetFormat::Text;
    args.no_wrap = true;
    let output = compile_command(&args).unwrap();
    assert_eq!(output.rendered, "Read [1].\n\nBibliography\n[1] The Web. 1991.\n");
}

#[test]
fn test_lenient_and_strict_call_errors() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "broken.md", ".nosuchfunction {x}\n\nStill here\n");

    let output = compile_command(&args(&dir, input.clone())).unwrap();
    assert!(output.has_errors());
    assert!(output.rendered.ends_with("<p>Still here</p>\n"));

    let mut strict = args(&dir, input);
    strict.strict = true;
    let err = compile_command(&strict).unwrap_err();
    assert_eq!(exit_code(&err), 70);
}

#[test]
fn test_conversion_error_exit_code() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bad.md", ".sum {one} {2}\n");
    let err = compile_command(&args(&dir, input)).unwrap_err();
    assert_eq!(exit_code(&err), 64);
}

#[test]
fn test_missing_source() {
    let dir = TempDir::new().unwrap();
    let err = compile_command(&args(&dir, dir.path().join("missing.md"))).unwrap_err();
    assert_eq!(exit_code(&err), EXIT_NO_SOURCE);
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "quill.toml", "strict = \"very\"\n");
    let input = write(&dir, "doc.md", "text\n");
    let err = compile_command(&args(&dir, input)).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid config"));
}
