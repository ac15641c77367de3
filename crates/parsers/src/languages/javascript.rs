//! JavaScript and TypeScript share one table: the TypeScript grammar is a
//! superset and its extra kinds (type annotations, interfaces) stay `Other`.

use ir::NodeKind;

use crate::lower::{Grammar, Lowering};

pub(crate) fn grammar() -> Grammar {
    Grammar {
        language: tree_sitter_javascript::language,
        classify,
    }
}

pub(crate) fn typescript_grammar() -> Grammar {
    Grammar {
        language: tree_sitter_typescript::language_typescript,
        classify,
    }
}

fn classify(kind: &str) -> Lowering {
    match kind {
        "program" => Lowering::Keep(NodeKind::Module),
        "statement_block" => Lowering::Keep(NodeKind::Block),
        "call_expression" | "new_expression" => Lowering::Keep(NodeKind::Call),
        "arguments" => Lowering::Keep(NodeKind::Arguments),
        "member_expression" => Lowering::Keep(NodeKind::MemberAccess),
        "identifier" | "property_identifier" | "shorthand_property_identifier" => {
            Lowering::Keep(NodeKind::Identifier)
        }
        "string" | "template_string" => Lowering::StringLiteral,
        "number" => Lowering::Keep(NodeKind::NumberLiteral),
        "true" | "false" => Lowering::Keep(NodeKind::BooleanLiteral),
        "null" | "undefined" => Lowering::Keep(NodeKind::NullLiteral),
        "binary_expression" => Lowering::Keep(NodeKind::BinaryExpression),
        "unary_expression" => Lowering::Keep(NodeKind::UnaryExpression),
        "assignment_expression" | "augmented_assignment_expression" | "variable_declarator" => {
            Lowering::Keep(NodeKind::Assignment)
        }
        "function_declaration" | "function" | "function_expression" | "arrow_function"
        | "method_definition" => Lowering::Keep(NodeKind::FunctionDefinition),
        "class_declaration" | "class" => Lowering::Keep(NodeKind::ClassDefinition),
        "return_statement" => Lowering::Keep(NodeKind::Return),
        "if_statement" => Lowering::Keep(NodeKind::If),
        "for_statement" | "for_in_statement" | "while_statement" | "do_statement" => {
            Lowering::Keep(NodeKind::Loop)
        }
        "import_statement" => Lowering::Keep(NodeKind::Import),
        "expression_statement" | "parenthesized_expression" => Lowering::Transparent,
        "comment" => Lowering::Skip,
        other => Lowering::Keep(NodeKind::Other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarators_are_assignments() {
        assert_eq!(
            classify("variable_declarator"),
            Lowering::Keep(NodeKind::Assignment)
        );
        assert_eq!(classify("template_string"), Lowering::StringLiteral);
    }
}
