//! Visitor-based pretty-printer; round-trips with the reference parser.

use std::sync::Arc;

use crate::domain::arena::{NodeId, NodeKind, SlotName, SyntaxTree};
use crate::domain::visitor::{accept, SyntaxVisitor};

/// Printer function installed on a source root: renders one unit to text.
pub type Printer = Arc<dyn Fn(&SyntaxTree) -> String>;

/// The default printer collaborator.
pub fn default_printer() -> Printer {
    Arc::new(|tree| PrettyPrinter::default().print(tree))
}

pub struct PrettyPrinter {
    out: String,
    depth: usize,
    indent_width: usize,
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl PrettyPrinter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            indent_width,
        }
    }

    pub fn print(mut self, tree: &SyntaxTree) -> String {
        accept(&mut self, tree, tree.root());
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth * self.indent_width {
            self.out.push(' ');
        }
    }
}

impl SyntaxVisitor for PrettyPrinter {
    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(pkg) = tree.child(id, SlotName::Package) {
            accept(self, tree, pkg);
            self.out.push('\n');
        }

        let imports = tree.children_of(id, SlotName::Imports);
        for import in &imports {
            accept(self, tree, *import);
        }
        if !imports.is_empty() {
            self.out.push('\n');
        }

        for (i, ty) in tree.children_of(id, SlotName::Types).iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            accept(self, tree, *ty);
        }
    }

    fn visit_package_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(NodeKind::PackageDecl { name }) = tree.kind(id) {
            self.out.push_str("package ");
            self.out.push_str(name);
            self.out.push('\n');
        }
    }

    fn visit_import_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(NodeKind::ImportDecl { path }) = tree.kind(id) {
            self.out.push_str("import ");
            self.out.push_str(path);
            self.out.push('\n');
        }
    }

    fn visit_type_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(NodeKind::TypeDecl { name }) = tree.kind(id) {
            self.out.push_str("type ");
            self.out.push_str(name);
            self.out.push('\n');
            self.depth += 1;
            for member in tree.children_of(id, SlotName::Members) {
                accept(self, tree, member);
            }
            self.depth -= 1;
            self.out.push_str("end\n");
        }
    }

    fn visit_field_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(NodeKind::FieldDecl { name }) = tree.kind(id) {
            self.indent();
            self.out.push_str("field ");
            self.out.push_str(name);
            self.out.push_str(" = ");
            if let Some(value) = tree.child(id, SlotName::Value) {
                accept(self, tree, value);
            }
            self.out.push('\n');
        }
    }

    fn visit_literal(&mut self, tree: &SyntaxTree, id: NodeId) {
        if let Some(NodeKind::Literal { text }) = tree.kind(id) {
            self.out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::parser::UnitParser;

    #[test]
    fn given_built_unit_when_printing_then_round_trips_through_parser() {
        // Arrange
        let mut tree = SyntaxTree::new();
        tree.set_package("com.acme").expect("set package");
        tree.add_import("com.acme.util").expect("add import");
        let button = tree.add_type("Button").expect("add type");
        tree.add_field(button, "label", "Ok").expect("add field");

        // Act
        let text = PrettyPrinter::default().print(&tree);
        let reparsed = UnitParser::new().parse(&text, &ParserConfig::default());

        // Assert
        assert!(reparsed.is_successful(), "problems: {:?}", reparsed.problems());
        let copy = reparsed.tree().expect("tree");
        assert_eq!(copy.package_name(), tree.package_name());
        assert_eq!(copy.imports(), tree.imports());
        assert_eq!(copy.type_names(), tree.type_names());
    }

    #[test]
    fn given_custom_indent_when_printing_then_fields_indented() {
        let mut tree = SyntaxTree::new();
        let ty = tree.add_type("T").expect("add type");
        tree.add_field(ty, "x", "1").expect("add field");

        let text = PrettyPrinter::new(2).print(&tree);

        assert!(text.contains("\n  field x = 1\n"));
    }
}
