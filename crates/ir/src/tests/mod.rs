use super::*;

fn span(start_byte: usize, end_byte: usize) -> Span {
    Span {
        start: Position::new(1, start_byte + 1),
        end: Position::new(1, end_byte + 1),
        start_byte,
        end_byte,
    }
}

fn ident(name: &str, start: usize) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Identifier, span(start, start + name.len())).with_value(name)
}

fn call(func: SyntaxNode, args: Vec<SyntaxNode>, sp: Span) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Call, sp).with_children(vec![
        func,
        SyntaxNode::new(NodeKind::Arguments, sp).with_children(args),
    ])
}

#[test]
fn preorder_visits_parents_first() {
    // f(a, b)
    let root = call(ident("f", 0), vec![ident("a", 2), ident("b", 5)], span(0, 7));
    let kinds: Vec<String> = root.preorder().map(|n| n.kind.to_string()).collect();
    assert_eq!(
        kinds,
        vec!["Call", "Identifier", "Arguments", "Identifier", "Identifier"]
    );
}

#[test]
fn tree_assigns_preorder_ids() {
    let root = SyntaxNode::new(NodeKind::Module, span(0, 7)).with_children(vec![call(
        ident("f", 0),
        vec![ident("a", 2)],
        span(0, 4),
    )]);
    let tree = SyntaxTree::new("x.py", "python", "f(a)".into(), root);
    let ids: Vec<usize> = tree.root.preorder().map(|n| n.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[test]
fn structural_equality_ignores_position() {
    let a = call(ident("f", 0), vec![ident("a", 2)], span(0, 4));
    let b = call(ident("f", 10), vec![ident("a", 12)], span(10, 14));
    let c = call(ident("f", 0), vec![ident("b", 2)], span(0, 4));
    assert!(a.structurally_eq(&b));
    assert!(!a.structurally_eq(&c));
}

#[test]
fn span_containment_and_cover() {
    let outer = span(0, 10);
    let inner = span(2, 4);
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    let covered = span(2, 4).cover(&span(6, 12));
    assert_eq!(covered.byte_range(), 2..12);
}

#[test]
fn line_text_handles_out_of_range() {
    let root = SyntaxNode::new(NodeKind::Module, span(0, 3));
    let tree = SyntaxTree::new("x.py", "python", "a\nb\n".into(), root);
    assert_eq!(tree.line_text(2), "b");
    assert_eq!(tree.line_text(0), "");
    assert_eq!(tree.line_text(9), "");
}

#[test]
fn syntax_node_serialization_keeps_kind_and_value() {
    let node = ident("cursor", 0);
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["kind"], "Identifier");
    assert_eq!(json["value"], "cursor");
    let back: SyntaxNode = serde_json::from_value(json).unwrap();
    assert!(back.structurally_eq(&node));
}
