//! Domain layer: the mutable syntax tree model
//!
//! Independent of I/O and configuration; roots and routers build on top.

pub mod arena;
pub mod visitor;

pub use arena::{ChangeListener, ChildSlot, NodeId, NodeKind, SlotName, SlotValue, SyntaxNode, SyntaxTree};
pub use visitor::{accept, walk_children, SyntaxVisitor};
