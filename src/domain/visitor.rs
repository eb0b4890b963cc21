//! Exhaustive visitor over the closed set of node kinds.
//!
//! The single extension point for tree-consuming algorithms: printing,
//! validation, and transformation all implement [`SyntaxVisitor`] instead
//! of extending the node model. Dispatch in [`accept`] matches on
//! [`NodeKind`], so adding a kind is a compile error until every algorithm
//! handles it. Algorithm state lives in the visitor value itself.

use crate::domain::arena::{NodeId, NodeKind, SyntaxTree};

/// One method per node kind; defaults walk into children.
pub trait SyntaxVisitor {
    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_package_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_import_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_type_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_field_decl(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }

    fn visit_literal(&mut self, tree: &SyntaxTree, id: NodeId) {
        walk_children(self, tree, id);
    }
}

/// Dispatch `visitor` on the node's concrete kind. Stale ids are ignored.
pub fn accept<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, id: NodeId) {
    let Some(kind) = tree.kind(id) else {
        return;
    };
    match kind {
        NodeKind::CompilationUnit => visitor.visit_compilation_unit(tree, id),
        NodeKind::PackageDecl { .. } => visitor.visit_package_decl(tree, id),
        NodeKind::ImportDecl { .. } => visitor.visit_import_decl(tree, id),
        NodeKind::TypeDecl { .. } => visitor.visit_type_decl(tree, id),
        NodeKind::FieldDecl { .. } => visitor.visit_field_decl(tree, id),
        NodeKind::Literal { .. } => visitor.visit_literal(tree, id),
    }
}

/// Visit every child of `id` in slot order.
pub fn walk_children<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, id: NodeId) {
    for child in tree.children(id) {
        accept(visitor, tree, child);
    }
}
