//! Plain-text rendering through the pipeline with the standard library

use quill_core::render::UNRESOLVED_PLACEHOLDER;
use quill_core::{CompilationOutput, Context, MemoryLoader, Pipeline, PipelineOptions};
use quill_plaintext::PlainTextTarget;

fn compile_with(ctx: &mut Context, source: &str, wrap_output: bool) -> CompilationOutput {
    let options = PipelineOptions {
        wrap_output,
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new(options, PlainTextTarget).with_library(quill_stdlib::library());
    pipeline.attach(ctx).unwrap();
    pipeline.execute(ctx, source).unwrap()
}

fn compile(source: &str) -> String {
    compile_with(&mut Context::default(), source, false).rendered
}

#[test]
fn test_numbered_headings_and_cross_references() {
    let text = compile(".doctype {paged}\n\n# Intro\n\n## Scope {#scope}\n\nSee .ref {scope}.\n");
    assert_eq!(text, "1 Intro\n\n1.1 Scope\n\nSee Section 1.1.\n");
}

#[test]
fn test_localized_reference_text() {
    let text = compile(".doctype {paged}\n.doclang {it}\n\n# Intro {#intro}\n\nVedi .ref {intro}.\n");
    assert!(text.ends_with("Vedi Sezione 1.\n"), "{text}");
}

#[test]
fn test_unresolved_reference() {
    let output = compile_with(&mut Context::default(), "See .ref {nowhere}.\n", false);
    assert_eq!(output.rendered, format!("See {UNRESOLVED_PLACEHOLDER}.\n"));
    assert_eq!(output.diagnostics.len(), 1);
}

#[test]
fn test_lists_and_tasks() {
    let text = compile("- [x] done\n- [ ] todo\n\n3. three\n4. four\n");
    assert_eq!(text, "- [x] done\n- [ ] todo\n\n3. three\n4. four\n");
}

#[test]
fn test_table_with_caption() {
    let text = compile(".doctype {slides}\n\n| a | bb |\n|---|---|\n| 1 | 2 |\n\"Values\" {#values}\n");
    assert_eq!(text, "a | bb\n--+---\n1 | 2\nTable 1: Values\n");
}

#[test]
fn test_box_and_citation() {
    let bib = "@article{turing, author = {Alan Turing}, title = {Computing Machinery and Intelligence}, journal = {Mind}, year = 1950}\n";
    let mut ctx = Context::new(MemoryLoader::new().with("refs.bib", bib));
    let output = compile_with(
        &mut ctx,
        ".box {Note}\n  Machines .cite {turing}.\n\n.bibliography {refs.bib} title:{References}\n",
        false,
    );
    assert_eq!(
        output.rendered,
        "Note\n| Machines [1].\n\nReferences\n[1] Alan Turing. Computing Machinery and Intelligence. Mind, 1950.\n"
    );
}

#[test]
fn test_citations_across_bibliographies() {
    let loader = MemoryLoader::new()
        .with("a.bib", "@book{knuth, title = {TAOCP}}\n@book{dijkstra, title = {EWD}}\n")
        .with("b.bib", "@book{wirth, title = {AD}}\n");
    let mut ctx = Context::new(loader);
    let output = compile_with(
        &mut ctx,
        "See .cite {wirth} and .cite {knuth}.\n\n.bibliography {a.bib} title:{Classics}\n\n.bibliography {b.bib} title:{Pascal}\n",
        false,
    );
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(
        output.rendered,
        "See [1] and [2].\n\nClassics\n[2] TAOCP.\n[3] EWD.\n\nPascal\n[1] AD.\n"
    );
}

#[test]
fn test_speaker_notes_are_dropped() {
    let text = compile(".doctype {slides}\n\n# Hello\n\n.speakernote\n  Smile.\n\nBye\n");
    assert_eq!(text, "Hello\n\nBye\n");
}

#[test]
fn test_named_document_resource() {
    let output = compile_with(
        &mut Context::default(),
        ".docname {Guide}\n.docauthor {Ada}\n\nBody\n",
        true,
    );
    assert_eq!(output.resources.len(), 1);
    assert_eq!(output.resources[0].name, "Guide.txt");
    assert_eq!(
        output.resources[0].as_text(),
        Some("Guide\n=====\nAda\n\nBody\n")
    );
}

#[test]
fn test_unnamed_document_resource() {
    let output = compile_with(&mut Context::default(), "Body\n", true);
    assert_eq!(output.resources[0].name, "document.txt");
    assert_eq!(output.resources[0].as_text(), Some("Body\n"));
}
