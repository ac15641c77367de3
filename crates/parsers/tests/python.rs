use ir::NodeKind;
use parsers::{parse_file, parse_snippet, parse_source, Language, ParseError};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_py(src: &str) -> ir::SyntaxTree {
    parse_source(Path::new("test.py"), Language::Python, src.to_string()).unwrap()
}

#[test]
fn lowers_concatenated_query_call() {
    let tree = parse_py("cursor.execute(\"SELECT \" + username + \"'\")\n");
    let call = &tree.root.children[0];
    assert_eq!(call.kind, NodeKind::Call);
    assert_eq!(call.children[0].kind, NodeKind::MemberAccess);
    assert_eq!(call.children[0].children[0].value.as_deref(), Some("cursor"));
    assert_eq!(call.children[0].children[1].value.as_deref(), Some("execute"));

    let args = &call.children[1];
    assert_eq!(args.kind, NodeKind::Arguments);
    assert_eq!(args.children.len(), 1);
    let outer = &args.children[0];
    assert_eq!(outer.kind, NodeKind::BinaryExpression);
    assert_eq!(outer.value.as_deref(), Some("+"));
    assert_eq!(outer.children[0].kind, NodeKind::BinaryExpression);
    assert_eq!(outer.children[1].value.as_deref(), Some("'"));
}

#[test]
fn keyword_arguments_keep_name_and_value() {
    let tree = parse_py("subprocess.check_output(cmd, shell=True)\n");
    let args = &tree.root.children[0].children[1];
    let kw = &args.children[1];
    assert_eq!(kw.kind, NodeKind::KeywordArgument);
    assert_eq!(kw.children[0].value.as_deref(), Some("shell"));
    assert_eq!(kw.children[1].kind, NodeKind::BooleanLiteral);
    assert_eq!(kw.children[1].value.as_deref(), Some("True"));
}

#[test]
fn spans_are_one_based() {
    let tree = parse_py("x = 1\nos.system(x)\n");
    let call = &tree.root.children[1];
    assert_eq!(call.span.start.line, 2);
    assert_eq!(call.span.start.column, 1);
    assert_eq!(tree.text(call), "os.system(x)");
}

#[test]
fn equivalent_forms_lower_identically() {
    let a = parse_py("f('x', (y))\n");
    let b = parse_py("f(\"x\", y)  # trailing comment\n");
    assert!(a.root.structurally_eq(&b.root));
}

#[test]
fn comments_are_dropped() {
    let tree = parse_py("# header\nx = 1\n");
    assert_eq!(tree.root.children.len(), 1);
    assert_eq!(tree.root.children[0].kind, NodeKind::Assignment);
}

#[test]
fn reports_syntax_errors_with_location() {
    let err = parse_source(
        Path::new("bad.py"),
        Language::Python,
        "def broken(:\n    pass\n".into(),
    )
    .unwrap_err();
    match err {
        ParseError::Syntax { line, .. } => assert_eq!(line, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn parse_file_rejects_unknown_extensions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello")?;
    assert!(matches!(
        parse_file(&path),
        Err(ParseError::Unsupported(_))
    ));
    Ok(())
}

#[test]
fn parse_file_reads_python() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("app.py");
    fs::write(&path, "import yaml\nconfig = yaml.load(data)\n")?;
    let tree = parse_file(&path)?;
    assert_eq!(tree.path, path);
    assert_eq!(tree.root.children[0].kind, NodeKind::Import);
    assert_eq!(tree.root.children[1].kind, NodeKind::Assignment);
    Ok(())
}

#[test]
fn snippets_parse_placeholders_as_identifiers() {
    let node = parse_snippet(Language::Python, "__mv_X.execute(__ellipsis__)").unwrap();
    assert_eq!(node.kind, NodeKind::Module);
    let call = &node.children[0];
    assert_eq!(call.children[0].children[0].value.as_deref(), Some("__mv_X"));
    assert_eq!(
        call.children[1].children[0].value.as_deref(),
        Some("__ellipsis__")
    );
}

#[test]
fn f_string_keeps_interpolated_expressions() {
    let tree = parse_py("template = f'<h1>{name}</h1>'\n");
    let literal = &tree.root.children[0].children[1];
    assert_eq!(literal.kind, NodeKind::StringLiteral);
    assert_eq!(literal.value.as_deref(), Some("<h1>{name}</h1>"));
    assert_eq!(literal.children.len(), 1);
    assert_eq!(literal.children[0].kind, NodeKind::Identifier);
    assert_eq!(literal.children[0].value.as_deref(), Some("name"));
}

#[test]
fn plain_strings_have_no_children() {
    let tree = parse_py("x = 'a{b}c'\n");
    let literal = &tree.root.children[0].children[1];
    assert_eq!(literal.kind, NodeKind::StringLiteral);
    assert!(literal.children.is_empty());
}
