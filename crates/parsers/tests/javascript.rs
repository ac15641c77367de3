use ir::NodeKind;
use parsers::{parse_source, Language};
use std::path::Path;

#[test]
fn lowers_javascript_calls_and_members() {
    let tree = parse_source(
        Path::new("app.js"),
        Language::JavaScript,
        "db.query(\"SELECT * FROM t WHERE id = \" + id);\n".into(),
    )
    .unwrap();
    assert_eq!(tree.root.kind, NodeKind::Module);
    let call = &tree.root.children[0];
    assert_eq!(call.kind, NodeKind::Call);
    assert_eq!(call.children[0].kind, NodeKind::MemberAccess);
    assert_eq!(call.children[1].kind, NodeKind::Arguments);
    assert_eq!(
        call.children[1].children[0].kind,
        NodeKind::BinaryExpression
    );
}

#[test]
fn javascript_quotes_are_equivalent() {
    let a = parse_source(Path::new("a.js"), Language::JavaScript, "eval('x');".into()).unwrap();
    let b = parse_source(Path::new("b.js"), Language::JavaScript, "eval(\"x\")".into()).unwrap();
    assert!(a.root.structurally_eq(&b.root));
}

#[test]
fn typescript_uses_the_same_categories() {
    let tree = parse_source(
        Path::new("a.ts"),
        Language::TypeScript,
        "const q: string = \"a\" + b;\nrun(q);\n".into(),
    )
    .unwrap();
    let call = tree
        .root
        .preorder()
        .find(|n| n.kind == NodeKind::Call)
        .expect("call node");
    assert_eq!(call.children[0].value.as_deref(), Some("run"));
    assert!(tree
        .root
        .preorder()
        .any(|n| n.kind == NodeKind::Assignment));
}

#[test]
fn template_substitutions_are_children() {
    let tree = parse_source(
        Path::new("a.js"),
        Language::JavaScript,
        "db.query(`SELECT * FROM t WHERE id = ${req.query.id}`);\n".into(),
    )
    .unwrap();
    let literal = tree
        .root
        .preorder()
        .find(|n| n.kind == NodeKind::StringLiteral)
        .unwrap();
    assert_eq!(literal.children.len(), 1);
    assert_eq!(literal.children[0].kind, NodeKind::MemberAccess);
}
