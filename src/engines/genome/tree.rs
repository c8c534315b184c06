//! Structural tree used for every mutable test artefact
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Each node
//! has at most one parent and an ordered list of children; ownership is a
//! tree, never a DAG. Node 0 is the root the tree was created with.
//!
//! Two trees built by copying one another share no memory, but they share
//! *shape*: [`GenomeTree::find`] uses the positional index path of a node in
//! one tree to locate the node at the same position in another. This is how
//! a change decided on one copy of a test is re-targeted onto another copy.

use crate::error::{Result, RestgenError};
use std::sync::Once;

static PARENT_COPY_WARNING: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload stored at each node of a [`GenomeTree`]
pub trait Genome: Clone {
    /// Reconcile a freshly copied value with the value it was copied from.
    /// Runs after the structural copy, once the shapes are known to match.
    fn post_copy(&mut self, _template: &Self) {}
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct GenomeTree<T> {
    nodes: Vec<Node<T>>,
}

impl<T: Genome> GenomeTree<T> {
    pub fn new(root: T) -> Self {
        Self {
            nodes: vec![Node {
                value: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Build a tree whose root owns the given subtrees, in order
    pub fn from_parts(root: T, children: Vec<GenomeTree<T>>) -> Self {
        let mut tree = Self::new(root);
        let root = tree.root();
        for child in children {
            tree.append_subtree(root, None, &child, child.root());
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id.0].value
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id.0].value
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Allocate a node with no parent. Attach it with [`GenomeTree::add_child`].
    pub fn insert(&mut self, value: T) -> NodeId {
        self.nodes.push(Node {
            value,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a node and append it to `parent`'s children
    pub fn push_child(&mut self, parent: NodeId, value: T) -> Result<NodeId> {
        let child = self.insert(value);
        self.add_child(parent, child)?;
        Ok(child)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let at = self.nodes.get(parent.0).map(|n| n.children.len()).unwrap_or(0);
        self.insert_child(parent, at, child)
    }

    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for &child in children {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Attach a parentless node at position `index` among `parent`'s children.
    ///
    /// A node that already has a parent is refused: sharing it would leave
    /// the old parent listing a child whose parent pointer is elsewhere.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_id(parent)?;
        self.check_id(child)?;
        if child == self.root() {
            return Err(RestgenError::Structure(
                "the root of a tree cannot be attached under another node".to_string(),
            ));
        }
        if let Some(owner) = self.nodes[child.0].parent {
            return Err(RestgenError::Structure(format!(
                "node {} is already owned by node {}",
                child.0, owner.0
            )));
        }
        if self.ancestry(parent).contains(&child) {
            return Err(RestgenError::Structure(format!(
                "attaching node {} under node {} would create a cycle",
                child.0, parent.0
            )));
        }
        let siblings = self.nodes[parent.0].children.len();
        if index > siblings {
            return Err(RestgenError::Structure(format!(
                "cannot insert at index {} into node {} which has {} children",
                index, parent.0, siblings
            )));
        }
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Copy the subtree rooted at `source_node` of `source` under `parent`,
    /// at `index` (or at the end). Returns the id of the grafted root.
    pub fn graft(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        source: &GenomeTree<T>,
        source_node: NodeId,
    ) -> Result<NodeId> {
        self.check_id(parent)?;
        source.check_id(source_node)?;
        let siblings = self.nodes[parent.0].children.len();
        if let Some(at) = index {
            if at > siblings {
                return Err(RestgenError::Structure(format!(
                    "cannot graft at index {} into node {} which has {} children",
                    at, parent.0, siblings
                )));
            }
        }
        Ok(self.append_subtree(parent, index, source, source_node))
    }

    fn append_subtree(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        source: &GenomeTree<T>,
        source_node: NodeId,
    ) -> NodeId {
        let top = self.insert(source.get(source_node).clone());
        self.nodes[top.0].parent = Some(parent);
        match index {
            Some(at) => self.nodes[parent.0].children.insert(at, top),
            None => self.nodes[parent.0].children.push(top),
        }

        let mut pending = vec![(source_node, top)];
        while let Some((from, to)) = pending.pop() {
            for &child in source.children(from) {
                let copied = self.insert(source.get(child).clone());
                self.nodes[copied.0].parent = Some(to);
                self.nodes[to.0].children.push(copied);
                pending.push((child, copied));
            }
        }
        top
    }

    /// Walk parent links up to the top
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    /// Nodes from `id` up to its root, `id` first
    fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Positional indices from the root down to `id`.
    ///
    /// For `Root -> A -> B` where `A` is the second child of `Root` and `B`
    /// the first child of `A`, the result is `[1, 0]`.
    pub fn traverse_back_index(&self, id: NodeId) -> Result<Vec<usize>> {
        self.check_id(id)?;
        let mut back = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            let index = self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == current)
                .ok_or_else(|| {
                    RestgenError::Structure(format!(
                        "cannot find node {} in its parent {}",
                        current.0, parent.0
                    ))
                })?;
            back.push(index);
            current = parent;
        }
        back.reverse();
        Ok(back)
    }

    /// Deep copy of the subtree at `id` into a fresh tree. No reconciliation.
    pub fn copy_content(&self, id: NodeId) -> GenomeTree<T> {
        let mut copy = GenomeTree::new(self.get(id).clone());
        let mut pending = vec![(id, copy.root())];
        while let Some((from, to)) = pending.pop() {
            for &child in self.children(from) {
                let copied = copy.insert(self.get(child).clone());
                copy.nodes[copied.0].parent = Some(to);
                copy.nodes[to.0].children.push(copied);
                pending.push((child, copied));
            }
        }
        copy
    }

    /// Reconcile `node` (and its subtree) with `template_node` of `template`.
    /// Shapes must agree at every level.
    pub fn post_copy(
        &mut self,
        node: NodeId,
        template: &GenomeTree<T>,
        template_node: NodeId,
    ) -> Result<()> {
        let mut pending = vec![(node, template_node)];
        while let Some((mine, theirs)) = pending.pop() {
            let own = self.children(mine).len();
            let other = template.children(theirs).len();
            if own != other {
                return Err(RestgenError::Structure(format!(
                    "copy and its template have different size of children, e.g., copy ({}) vs. template ({})",
                    own, other
                )));
            }
            self.get_mut(mine).post_copy(template.get(theirs));
            pending.extend(
                self.children(mine)
                    .iter()
                    .copied()
                    .zip(template.children(theirs).iter().copied()),
            );
        }
        Ok(())
    }

    /// Deep copy of the subtree at `id`. The copy is always a new root.
    pub fn copy(&self, id: NodeId) -> Result<GenomeTree<T>> {
        self.check_id(id)?;
        if self.parent(id).is_some() {
            PARENT_COPY_WARNING.call_once(|| {
                log::warn!("copying a node that has a parent: the copy does not keep its ancestry");
            });
        }
        let mut copy = self.copy_content(id);
        let root = copy.root();
        copy.post_copy(root, self, id)?;
        Ok(copy)
    }

    /// Locate in this tree the node at the position `template_node` holds in
    /// `template`, searching from `node`.
    ///
    /// `node`'s own index path must be a prefix of the template's path;
    /// otherwise `node` cannot contain the requested position.
    pub fn find(
        &self,
        node: NodeId,
        template: &GenomeTree<T>,
        template_node: NodeId,
    ) -> Result<NodeId> {
        let own = self.traverse_back_index(node)?;
        let start = own.len();
        let target = template.traverse_back_index(template_node)?;

        if target.len() < start {
            return Err(RestgenError::InvalidArgument(format!(
                "cannot find ancestor element (levels, current: {} vs. target: {})",
                start,
                target.len()
            )));
        }
        if target[..start] != own[..] {
            return Err(RestgenError::InvalidArgument(
                "this does not contain requested target".to_string(),
            ));
        }
        if target.len() == start {
            return Ok(node);
        }
        self.target_with_index(node, &target[start..])
    }

    /// Descend from `node` following child indices
    pub fn target_with_index(&self, node: NodeId, path: &[usize]) -> Result<NodeId> {
        self.check_id(node)?;
        let mut target = node;
        for &index in path {
            let children = self.children(target);
            target = *children.get(index).ok_or_else(|| {
                RestgenError::Structure(format!(
                    "cannot get the children at index {} for node {} which has {} children",
                    index,
                    target.0,
                    children.len()
                ))
            })?;
        }
        Ok(target)
    }

    /// Pre-order walk of the subtree at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            order.push(current);
            pending.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    fn check_id(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RestgenError::Structure(format!(
                "node {} does not belong to a tree of {} nodes",
                id.0,
                self.nodes.len()
            )))
        }
    }
}
