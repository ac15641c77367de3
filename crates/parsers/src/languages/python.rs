use ir::NodeKind;

use crate::lower::{Grammar, Lowering};

pub(crate) fn grammar() -> Grammar {
    Grammar {
        language: tree_sitter_python::language,
        classify,
    }
}

fn classify(kind: &str) -> Lowering {
    match kind {
        "module" => Lowering::Keep(NodeKind::Module),
        "block" => Lowering::Keep(NodeKind::Block),
        "call" => Lowering::Keep(NodeKind::Call),
        "argument_list" => Lowering::Keep(NodeKind::Arguments),
        "keyword_argument" => Lowering::Keep(NodeKind::KeywordArgument),
        "attribute" => Lowering::Keep(NodeKind::MemberAccess),
        "identifier" => Lowering::Keep(NodeKind::Identifier),
        "string" => Lowering::StringLiteral,
        "integer" | "float" => Lowering::Keep(NodeKind::NumberLiteral),
        "true" | "false" => Lowering::Keep(NodeKind::BooleanLiteral),
        "none" => Lowering::Keep(NodeKind::NullLiteral),
        "binary_operator" | "boolean_operator" | "comparison_operator" => {
            Lowering::Keep(NodeKind::BinaryExpression)
        }
        "unary_operator" | "not_operator" => Lowering::Keep(NodeKind::UnaryExpression),
        "assignment" | "augmented_assignment" => Lowering::Keep(NodeKind::Assignment),
        "function_definition" | "lambda" => Lowering::Keep(NodeKind::FunctionDefinition),
        "class_definition" => Lowering::Keep(NodeKind::ClassDefinition),
        "return_statement" => Lowering::Keep(NodeKind::Return),
        "if_statement" => Lowering::Keep(NodeKind::If),
        "for_statement" | "while_statement" => Lowering::Keep(NodeKind::Loop),
        "import_statement" | "import_from_statement" => Lowering::Keep(NodeKind::Import),
        "expression_statement" | "parenthesized_expression" => Lowering::Transparent,
        "comment" => Lowering::Skip,
        other => Lowering::Keep(NodeKind::Other(other.to_string())),
    }
}
