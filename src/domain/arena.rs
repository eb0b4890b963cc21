//! Arena-based mutable syntax tree with ownership invariants.
//!
//! Every node lives in a generational arena owned by its [`SyntaxTree`].
//! A node holds a closed [`NodeKind`], an optional parent back-reference
//! (navigation only, never lifetime), and a kind-determined set of named
//! child slots. Invariants maintained by every public mutation:
//!
//! - a node is referenced by at most one slot at a time (exclusive ownership)
//! - a node's parent pointer names the node whose slot currently holds it
//! - the ownership relation is acyclic

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::errors::{Error, Result};

/// Handle to a node inside a [`SyntaxTree`].
pub type NodeId = Index;

/// Names of the child slots that node kinds expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotName {
    Package,
    Imports,
    Types,
    Members,
    Value,
}

impl SlotName {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotName::Package => "package",
            SlotName::Imports => "imports",
            SlotName::Types => "types",
            SlotName::Members => "members",
            SlotName::Value => "value",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of node kinds. Scalar payloads are copied by value on
/// duplication; children live in slots, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    CompilationUnit,
    PackageDecl { name: String },
    ImportDecl { path: String },
    TypeDecl { name: String },
    FieldDecl { name: String },
    Literal { text: String },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "compilation unit",
            NodeKind::PackageDecl { .. } => "package declaration",
            NodeKind::ImportDecl { .. } => "import declaration",
            NodeKind::TypeDecl { .. } => "type declaration",
            NodeKind::FieldDecl { .. } => "field declaration",
            NodeKind::Literal { .. } => "literal",
        }
    }

    /// The slot layout for this kind. Fixed at node creation.
    fn slots(&self) -> Vec<ChildSlot> {
        match self {
            NodeKind::CompilationUnit => vec![
                ChildSlot::single(SlotName::Package, false),
                ChildSlot::many(SlotName::Imports),
                ChildSlot::many(SlotName::Types),
            ],
            NodeKind::TypeDecl { .. } => vec![ChildSlot::many(SlotName::Members)],
            NodeKind::FieldDecl { .. } => vec![ChildSlot::single(SlotName::Value, true)],
            NodeKind::PackageDecl { .. }
            | NodeKind::ImportDecl { .. }
            | NodeKind::Literal { .. } => vec![],
        }
    }
}

/// Contents of a child slot: one optional owning reference, or an ordered
/// list of owning references.
#[derive(Debug, Clone)]
pub enum SlotValue {
    Single { required: bool, child: Option<NodeId> },
    Many(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub struct ChildSlot {
    pub name: SlotName,
    pub value: SlotValue,
}

impl ChildSlot {
    fn single(name: SlotName, required: bool) -> Self {
        Self {
            name,
            value: SlotValue::Single {
                required,
                child: None,
            },
        }
    }

    fn many(name: SlotName) -> Self {
        Self {
            name,
            value: SlotValue::Many(Vec::new()),
        }
    }
}

/// A node in the arena. Slots are only mutated through [`SyntaxTree`]
/// operations so the ownership invariants hold.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    slots: Vec<ChildSlot>,
}

impl SyntaxNode {
    fn new(kind: NodeKind) -> Self {
        let slots = kind.slots();
        Self {
            kind,
            parent: None,
            slots,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn slots(&self) -> &[ChildSlot] {
        &self.slots
    }

    pub fn slot(&self, name: SlotName) -> Option<&SlotValue> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.value)
    }

    fn slot_mut(&mut self, name: SlotName) -> Option<&mut SlotValue> {
        self.slots
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| &mut s.value)
    }
}

/// Callback invoked synchronously, before mutation, with
/// `(slot, old_child, new_child)`.
pub type ChangeListener = Box<dyn FnMut(SlotName, Option<NodeId>, Option<NodeId>)>;

/// A mutable syntax tree for one compilation unit.
///
/// The root node is always a [`NodeKind::CompilationUnit`]. Detached nodes
/// stay in the arena until removed or until the tree is dropped.
pub struct SyntaxTree {
    arena: Arena<SyntaxNode>,
    root: NodeId,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("nodes", &self.arena.len())
            .field("root", &self.root)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Cloning performs a deep [`duplicate`](SyntaxTree::duplicate): fresh node
/// identities, no shared state, listeners not carried over.
impl Clone for SyntaxTree {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(SyntaxNode::new(NodeKind::CompilationUnit));
        Self {
            arena,
            root,
            listeners: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node. It owns nothing and is owned by nothing
    /// until attached via [`set_child`](Self::set_child) or
    /// [`push_child`](Self::push_child).
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.arena.insert(SyntaxNode::new(kind))
    }

    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.arena.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.arena.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    /// Attach a change listener. Listeners fire in attachment order,
    /// synchronously, before each mutation.
    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    /// Set the occupant of a single slot.
    ///
    /// No-op (without notification) when `new` is already the occupant.
    /// Clearing a required slot is an error. Attaching a node that is held
    /// elsewhere steals it from its current parent.
    pub fn set_child(&mut self, owner: NodeId, slot: SlotName, new: Option<NodeId>) -> Result<()> {
        let (kind, required, current) = {
            let node = self.arena.get(owner).ok_or(Error::StaleNode)?;
            let kind = node.kind.name();
            match node.slot(slot) {
                Some(SlotValue::Single { required, child }) => (kind, *required, *child),
                Some(SlotValue::Many(_)) => return Err(Error::SlotShape { kind, slot }),
                None => return Err(Error::UnknownSlot { kind, slot }),
            }
        };

        // The non-null precondition comes before the identity shortcut:
        // clearing a required slot is an error even when it is still empty.
        if new.is_none() && required {
            return Err(Error::RequiredSlot { kind, slot });
        }
        if new == current {
            return Ok(());
        }
        if let Some(n) = new {
            if self.arena.get(n).is_none() {
                return Err(Error::StaleNode);
            }
            self.ensure_acyclic(owner, n)?;
        }

        self.notify(slot, current, new);

        if let Some(old) = current {
            if let Some(node) = self.arena.get_mut(old) {
                node.parent = None;
            }
        }
        if let Some(n) = new {
            self.steal(n);
        }
        if let Some(node) = self.arena.get_mut(owner) {
            if let Some(SlotValue::Single { child, .. }) = node.slot_mut(slot) {
                *child = new;
            }
        }
        if let Some(n) = new {
            if let Some(node) = self.arena.get_mut(n) {
                node.parent = Some(owner);
            }
        }
        Ok(())
    }

    /// Append to a many-slot, stealing ownership if the child is attached
    /// elsewhere. Appending a child already in this slot is a no-op.
    pub fn push_child(&mut self, owner: NodeId, slot: SlotName, child: NodeId) -> Result<()> {
        {
            let node = self.arena.get(owner).ok_or(Error::StaleNode)?;
            let kind = node.kind.name();
            match node.slot(slot) {
                Some(SlotValue::Many(children)) => {
                    if children.contains(&child) {
                        return Ok(());
                    }
                }
                Some(SlotValue::Single { .. }) => {
                    return Err(Error::SlotShape { kind, slot });
                }
                None => return Err(Error::UnknownSlot { kind, slot }),
            }
        }

        if self.arena.get(child).is_none() {
            return Err(Error::StaleNode);
        }
        self.ensure_acyclic(owner, child)?;

        self.notify(slot, None, Some(child));

        self.steal(child);
        if let Some(node) = self.arena.get_mut(owner) {
            if let Some(SlotValue::Many(children)) = node.slot_mut(slot) {
                children.push(child);
            }
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(owner);
        }
        Ok(())
    }

    /// Remove `target` from its parent slot. Detaching from a required
    /// single slot is an error; detaching an already-detached node is a
    /// no-op. The root cannot be detached.
    pub fn detach(&mut self, target: NodeId) -> Result<()> {
        if target == self.root {
            return Err(Error::RootRemoval);
        }
        let Some(parent) = self.arena.get(target).ok_or(Error::StaleNode)?.parent else {
            return Ok(());
        };

        let (kind, slot, required) = {
            let node = self.arena.get(parent).ok_or(Error::StaleNode)?;
            let holding = node
                .slots
                .iter()
                .find(|s| slot_holds(&s.value, target))
                .ok_or(Error::StaleNode)?;
            let required = matches!(holding.value, SlotValue::Single { required: true, .. });
            (node.kind.name(), holding.name, required)
        };
        if required {
            return Err(Error::RequiredSlot { kind, slot });
        }

        self.notify(slot, Some(target), None);

        self.remove_from_slot(parent, target);
        if let Some(node) = self.arena.get_mut(target) {
            node.parent = None;
        }
        Ok(())
    }

    /// Swap `target` for `replacement` within `owner`'s own slots.
    /// Returns `Ok(false)` when no slot of `owner` holds `target`.
    pub fn replace_in(
        &mut self,
        owner: NodeId,
        target: NodeId,
        replacement: NodeId,
    ) -> Result<bool> {
        let found = {
            let node = self.arena.get(owner).ok_or(Error::StaleNode)?;
            node.slots
                .iter()
                .find(|s| slot_holds(&s.value, target))
                .map(|s| (s.name, matches!(s.value, SlotValue::Single { .. })))
        };
        let Some((slot, is_single)) = found else {
            return Ok(false);
        };

        if is_single {
            self.set_child(owner, slot, Some(replacement))?;
            return Ok(true);
        }

        if replacement == target {
            return Ok(true);
        }
        if self.arena.get(replacement).is_none() {
            return Err(Error::StaleNode);
        }
        self.ensure_acyclic(owner, replacement)?;

        self.notify(slot, Some(target), Some(replacement));

        self.steal(replacement);
        if let Some(node) = self.arena.get_mut(owner) {
            if let Some(SlotValue::Many(children)) = node.slot_mut(slot) {
                if let Some(pos) = children.iter().position(|&c| c == target) {
                    children[pos] = replacement;
                }
            }
        }
        if let Some(node) = self.arena.get_mut(target) {
            node.parent = None;
        }
        if let Some(node) = self.arena.get_mut(replacement) {
            node.parent = Some(owner);
        }
        Ok(true)
    }

    /// Substitute an arbitrary attached node without knowing which slot
    /// holds it: asks the node's parent. Returns `Ok(false)` for detached
    /// targets.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> Result<bool> {
        match self.arena.get(target).ok_or(Error::StaleNode)?.parent {
            Some(parent) => self.replace_in(parent, target, replacement),
            None => Ok(false),
        }
    }

    /// Detach `target` and reclaim its whole subtree from the arena.
    pub fn remove(&mut self, target: NodeId) -> Result<()> {
        self.detach(target)?;
        let mut stack = vec![target];
        while let Some(id) = stack.pop() {
            stack.extend(self.children(id));
            self.arena.remove(id);
        }
        Ok(())
    }

    /// All children of a node, in slot declaration order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(node) = self.arena.get(id) {
            for slot in &node.slots {
                match &slot.value {
                    SlotValue::Single { child, .. } => out.extend(*child),
                    SlotValue::Many(children) => out.extend(children.iter().copied()),
                }
            }
        }
        out
    }

    /// Occupant of a single slot.
    pub fn child(&self, id: NodeId, slot: SlotName) -> Option<NodeId> {
        match self.arena.get(id)?.slot(slot)? {
            SlotValue::Single { child, .. } => *child,
            SlotValue::Many(_) => None,
        }
    }

    /// Children of a many-slot, in order.
    pub fn children_of(&self, id: NodeId, slot: SlotName) -> Vec<NodeId> {
        match self.arena.get(id).and_then(|n| n.slot(slot)) {
            Some(SlotValue::Many(children)) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Deep copy with entirely fresh node identities. Detached nodes and
    /// listeners are not carried over.
    #[instrument(level = "trace", skip(self))]
    pub fn duplicate(&self) -> SyntaxTree {
        let mut dst = SyntaxTree::new();
        let dst_root = dst.root;
        self.copy_children(self.root, &mut dst, dst_root);
        dst
    }

    fn copy_children(&self, src: NodeId, dst: &mut SyntaxTree, dst_id: NodeId) {
        let Some(node) = self.arena.get(src) else {
            return;
        };
        for slot in &node.slots {
            match &slot.value {
                SlotValue::Single {
                    child: Some(child), ..
                } => {
                    if let Some(copy) = self.copy_node(*child, dst) {
                        dst.attach_single_raw(dst_id, slot.name, copy);
                        self.copy_children(*child, dst, copy);
                    }
                }
                SlotValue::Single { child: None, .. } => {}
                SlotValue::Many(children) => {
                    for &child in children {
                        if let Some(copy) = self.copy_node(child, dst) {
                            dst.attach_many_raw(dst_id, slot.name, copy);
                            self.copy_children(child, dst, copy);
                        }
                    }
                }
            }
        }
    }

    fn copy_node(&self, src: NodeId, dst: &mut SyntaxTree) -> Option<NodeId> {
        let kind = self.arena.get(src)?.kind.clone();
        Some(dst.create(kind))
    }

    // Internal attach used by duplicate(): shapes are known to match, no
    // notification, no steal needed.
    fn attach_single_raw(&mut self, owner: NodeId, slot: SlotName, child: NodeId) {
        if let Some(node) = self.arena.get_mut(owner) {
            if let Some(SlotValue::Single { child: c, .. }) = node.slot_mut(slot) {
                *c = Some(child);
            }
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(owner);
        }
    }

    fn attach_many_raw(&mut self, owner: NodeId, slot: SlotName, child: NodeId) {
        if let Some(node) = self.arena.get_mut(owner) {
            if let Some(SlotValue::Many(children)) = node.slot_mut(slot) {
                children.push(child);
            }
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(owner);
        }
    }

    /// Preorder traversal from the root.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            tree: self,
            stack: vec![self.root],
        }
    }

    fn notify(&mut self, slot: SlotName, old: Option<NodeId>, new: Option<NodeId>) {
        for listener in &mut self.listeners {
            listener(slot, old, new);
        }
    }

    // The candidate child must not be the owner or one of its ancestors.
    fn ensure_acyclic(&self, owner: NodeId, candidate: NodeId) -> Result<()> {
        if candidate == owner {
            return Err(Error::Cycle);
        }
        let mut cursor = self.parent(owner);
        while let Some(ancestor) = cursor {
            if ancestor == candidate {
                return Err(Error::Cycle);
            }
            cursor = self.parent(ancestor);
        }
        Ok(())
    }

    // Remove `child` from whichever slot of its current parent holds it.
    fn steal(&mut self, child: NodeId) {
        let Some(parent) = self.arena.get(child).and_then(|n| n.parent) else {
            return;
        };
        self.remove_from_slot(parent, child);
    }

    fn remove_from_slot(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.arena.get_mut(parent) {
            for slot in &mut node.slots {
                match &mut slot.value {
                    SlotValue::Single { child: c, .. } => {
                        if *c == Some(child) {
                            *c = None;
                        }
                    }
                    SlotValue::Many(children) => children.retain(|&c| c != child),
                }
            }
        }
    }
}

// Unit-level convenience accessors for the compilation-unit root.
impl SyntaxTree {
    /// The declared package name, if any.
    pub fn package_name(&self) -> Option<String> {
        let pkg = self.child(self.root, SlotName::Package)?;
        match self.kind(pkg)? {
            NodeKind::PackageDecl { name } => Some(name.clone()),
            _ => None,
        }
    }

    /// Declare (or replace) the unit's package.
    pub fn set_package(&mut self, name: &str) -> Result<NodeId> {
        let id = self.create(NodeKind::PackageDecl { name: name.into() });
        self.set_child(self.root, SlotName::Package, Some(id))?;
        Ok(id)
    }

    pub fn add_import(&mut self, path: &str) -> Result<NodeId> {
        let id = self.create(NodeKind::ImportDecl { path: path.into() });
        self.push_child(self.root, SlotName::Imports, id)?;
        Ok(id)
    }

    pub fn add_type(&mut self, name: &str) -> Result<NodeId> {
        let id = self.create(NodeKind::TypeDecl { name: name.into() });
        self.push_child(self.root, SlotName::Types, id)?;
        Ok(id)
    }

    /// Add a field with a literal value to a type declaration.
    pub fn add_field(&mut self, type_decl: NodeId, name: &str, value: &str) -> Result<NodeId> {
        let field = self.create(NodeKind::FieldDecl { name: name.into() });
        let literal = self.create(NodeKind::Literal { text: value.into() });
        self.set_child(field, SlotName::Value, Some(literal))?;
        self.push_child(type_decl, SlotName::Members, field)?;
        Ok(field)
    }

    pub fn imports(&self) -> Vec<String> {
        self.children_of(self.root, SlotName::Imports)
            .into_iter()
            .filter_map(|id| match self.kind(id)? {
                NodeKind::ImportDecl { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn type_names(&self) -> Vec<String> {
        self.children_of(self.root, SlotName::Types)
            .into_iter()
            .filter_map(|id| match self.kind(id)? {
                NodeKind::TypeDecl { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn find_type(&self, name: &str) -> Option<NodeId> {
        self.children_of(self.root, SlotName::Types)
            .into_iter()
            .find(|&id| matches!(self.kind(id), Some(NodeKind::TypeDecl { name: n }) if n == name))
    }

    /// Name of the first declared type; used to derive a filename when a
    /// unit is added without one.
    pub fn primary_type_name(&self) -> Option<String> {
        self.type_names().into_iter().next()
    }
}

fn slot_holds(value: &SlotValue, target: NodeId) -> bool {
    match value {
        SlotValue::Single { child, .. } => *child == Some(target),
        SlotValue::Many(children) => children.contains(&target),
    }
}

pub struct TreeIter<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = (NodeId, &'a SyntaxNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id)?;
        // Push children in reverse order for left-to-right traversal
        for child in self.tree.children(id).into_iter().rev() {
            self.stack.push(child);
        }
        Some((id, node))
    }
}
