use super::binding::BindingContext;
use crate::catalog::action::{
    freeze_path_parameters_of, header_of, header_of_mut, path_values_of, resolved_path_of,
};
use crate::catalog::{ActionHeader, BoundAction};
use crate::engines::genome::{Element, Gene, GenomeTree, NodeId};
use crate::error::{Result, RestgenError};
use crate::types::SampleType;
use std::fmt::Write;

/// Ordered actions handed to the search engine, together with the bindings
/// made while sampling them.
///
/// Actions are subtrees under a [`Element::Sequence`] root. Node ids of
/// actions stay valid when others are inserted in front of them.
#[derive(Debug, Clone)]
pub struct TestSequence {
    tree: GenomeTree<Element>,
    sample_type: SampleType,
    bindings: BindingContext,
}

impl TestSequence {
    pub fn new(sample_type: SampleType) -> Self {
        Self {
            tree: GenomeTree::new(Element::Sequence),
            sample_type,
            bindings: BindingContext::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions().is_empty()
    }

    /// Action nodes in execution order
    pub fn actions(&self) -> &[NodeId] {
        self.tree.children(self.tree.root())
    }

    pub fn action_at(&self, index: usize) -> Option<NodeId> {
        self.actions().get(index).copied()
    }

    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.actions().iter().position(|&a| a == node)
    }

    pub fn header(&self, node: NodeId) -> Result<&ActionHeader> {
        header_of(&self.tree, node)
    }

    pub fn header_mut(&mut self, node: NodeId) -> Result<&mut ActionHeader> {
        header_of_mut(&mut self.tree, node)
    }

    pub fn push(&mut self, action: BoundAction) -> Result<NodeId> {
        let root = self.tree.root();
        self.tree.graft(root, None, action.tree(), action.root())
    }

    pub fn insert(&mut self, index: usize, action: BoundAction) -> Result<NodeId> {
        let root = self.tree.root();
        self.tree.graft(root, Some(index), action.tree(), action.root())
    }

    /// Mark the path parameters of every action immutable
    pub fn freeze_path_parameters(&mut self) {
        let actions = self.actions().to_vec();
        for action in actions {
            freeze_path_parameters_of(&mut self.tree, action);
        }
    }

    pub fn path_values(&self, node: NodeId) -> Result<Vec<(String, Gene)>> {
        self.check_action(node)?;
        path_values_of(&self.tree, node)
    }

    pub fn resolved_path(&self, node: NodeId) -> Result<String> {
        self.check_action(node)?;
        resolved_path_of(&self.tree, node)
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub(crate) fn set_sample_type(&mut self, sample_type: SampleType) {
        self.sample_type = sample_type;
    }

    pub fn bindings(&self) -> &BindingContext {
        &self.bindings
    }

    pub(crate) fn set_bindings(&mut self, bindings: BindingContext) {
        self.bindings = bindings;
    }

    pub fn tree(&self) -> &GenomeTree<Element> {
        &self.tree
    }

    /// Mutable access for the search engine. Mutations must keep every
    /// root child an action.
    pub fn tree_mut(&mut self) -> &mut GenomeTree<Element> {
        &mut self.tree
    }

    /// One line per action, e.g. `a1 GET /items/17 [no-auth] <- items`
    pub fn describe(&self) -> Result<String> {
        let mut out = String::new();
        for &action in self.actions() {
            let header = self.header(action)?;
            let id = header
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(
                out,
                "{} {} {} [{}]",
                id,
                header.verb,
                self.resolved_path(action)?,
                header.auth
            );
            if header.save_location {
                let _ = write!(out, " -> {}", header.path.creation_location_id());
            }
            if let Some(location) = &header.location_id {
                let _ = write!(out, " <- {}", location);
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn check_action(&self, node: NodeId) -> Result<()> {
        if self.position(node).is_none() {
            return Err(RestgenError::InvalidArgument(format!(
                "node {} is not an action of this sequence",
                node.index()
            )));
        }
        Ok(())
    }
}
