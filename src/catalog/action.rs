use super::auth::AuthContext;
use super::path::ResourcePath;
use crate::engines::genome::{Element, Gene, GenomeTree, NodeId, ParamHeader};
use crate::error::{Result, RestgenError};
use crate::types::{HttpVerb, ParamLocation};
use rand::Rng;
use std::fmt;

/// Identifier of a bound action within one sampling call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionHeader {
    pub id: Option<ActionId>,
    pub verb: HttpVerb,
    pub path: ResourcePath,
    pub auth: AuthContext,
    /// Use the location created by the action that saved it under this key
    pub location_id: Option<String>,
    /// Persist the location this action creates under its creation key
    pub save_location: bool,
}

impl ActionHeader {
    pub fn new(verb: HttpVerb, path: ResourcePath) -> Self {
        Self {
            id: None,
            verb,
            path,
            auth: AuthContext::NoAuth,
            location_id: None,
            save_location: false,
        }
    }

    pub fn signature(&self) -> String {
        format!("{}:{}", self.verb, self.path)
    }
}

/// Immutable blueprint of one API operation
#[derive(Debug, Clone)]
pub struct ActionTemplate {
    tree: GenomeTree<Element>,
}

impl ActionTemplate {
    /// `params` are trees rooted at [`Element::Param`], see
    /// [`crate::engines::genome::param_tree`]
    pub fn new(verb: HttpVerb, path: ResourcePath, params: Vec<GenomeTree<Element>>) -> Result<Self> {
        for param in &params {
            check_param_shape(param, param.root())?;
        }
        let tree = GenomeTree::from_parts(Element::Action(ActionHeader::new(verb, path)), params);
        Ok(Self { tree })
    }

    pub fn tree(&self) -> &GenomeTree<Element> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn header(&self) -> &ActionHeader {
        match self.tree.get(self.tree.root()) {
            Element::Action(header) => header,
            _ => unreachable!("template root is always an action"),
        }
    }

    pub fn signature(&self) -> String {
        self.header().signature()
    }

    pub fn verb(&self) -> HttpVerb {
        self.header().verb
    }

    pub fn path(&self) -> &ResourcePath {
        &self.header().path
    }

    pub fn parameters(&self) -> Vec<NodeId> {
        parameters_of(&self.tree, self.tree.root())
    }
}

/// A value-filled copy of a template, not yet placed in a sequence
#[derive(Debug, Clone)]
pub struct BoundAction {
    tree: GenomeTree<Element>,
}

impl BoundAction {
    pub fn from_template(template: &ActionTemplate) -> Result<Self> {
        Self::from_subtree(template.tree(), template.root())
    }

    /// Copy the action rooted at `node`, dropping its identity and
    /// location wiring so it can be bound afresh
    pub fn from_subtree(tree: &GenomeTree<Element>, node: NodeId) -> Result<Self> {
        let mut copy = tree.copy(node)?;
        let root = copy.root();
        let header = header_of_mut(&mut copy, root)?;
        header.id = None;
        header.location_id = None;
        header.save_location = false;
        Ok(Self { tree: copy })
    }

    pub fn tree(&self) -> &GenomeTree<Element> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn header(&self) -> &ActionHeader {
        match self.tree.get(self.tree.root()) {
            Element::Action(header) => header,
            _ => unreachable!("bound action root is always an action"),
        }
    }

    pub fn header_mut(&mut self) -> &mut ActionHeader {
        let root = self.tree.root();
        match self.tree.get_mut(root) {
            Element::Action(header) => header,
            _ => unreachable!("bound action root is always an action"),
        }
    }

    pub fn parameters(&self) -> Vec<NodeId> {
        parameters_of(&self.tree, self.tree.root())
    }

    pub fn param_header(&self, param: NodeId) -> Option<&ParamHeader> {
        self.tree.get(param).as_param()
    }

    /// Value gene of a parameter node
    pub fn param_gene(&self, param: NodeId) -> Result<NodeId> {
        param_gene_of(&self.tree, param)
    }

    pub fn gene(&self, node: NodeId) -> Option<&Gene> {
        self.tree.get(node).as_gene()
    }

    pub fn gene_mut(&mut self, node: NodeId) -> Option<&mut Gene> {
        self.tree.get_mut(node).as_gene_mut()
    }

    /// Randomize every gene under `node`
    pub fn randomize<R: Rng>(&mut self, node: NodeId, rng: &mut R) {
        for id in self.tree.descendants(node) {
            if let Element::Gene(gene) = self.tree.get_mut(id) {
                gene.randomize(rng);
            }
        }
    }

    pub fn path_values(&self) -> Result<Vec<(String, Gene)>> {
        path_values_of(&self.tree, self.tree.root())
    }

    /// Path parameter declared for the variable `name`
    pub fn path_parameter(&self, name: &str) -> Option<NodeId> {
        self.parameters().into_iter().find(|&param| {
            self.param_header(param)
                .map_or(false, |h| h.location == ParamLocation::Path && h.name == name)
        })
    }

    /// Give path parameters the values `target_path` was resolved with.
    ///
    /// Variables pair up by position, so `/items/{id}` and
    /// `/items/{itemId}/tags` share their first identifier. A value of
    /// another kind is taken over through its textual form; one that does
    /// not parse leaves the parameter as it was.
    pub fn bind_to_same_path_resolution(
        &mut self,
        target_path: &ResourcePath,
        target: &[(String, Gene)],
    ) -> Result<()> {
        let own_path = self.header().path.clone();
        let target_names = target_path.variable_names();

        for (position, own_name) in own_path.variable_names().into_iter().enumerate() {
            let Some(target_name) = target_names.get(position) else { break };
            let Some((_, value)) = target.iter().find(|(name, _)| name.as_str() == *target_name)
            else {
                continue;
            };
            let Some(param) = self.path_parameter(own_name) else { continue };
            let gene = self.param_gene(param)?;
            let Some(own) = self.gene_mut(gene) else { continue };

            if own.accepts_values_of(value) {
                own.copy_value_from(value)?;
            } else if let Err(err) = own.set_raw_value(&value.raw_value()) {
                log::debug!("Path parameter {} keeps its own value: {}", own_name, err);
            }
        }
        Ok(())
    }

    pub fn freeze_path_parameters(&mut self) {
        let root = self.tree.root();
        freeze_path_parameters_of(&mut self.tree, root);
    }

    pub fn resolved_path(&self) -> Result<String> {
        resolved_path_of(&self.tree, self.tree.root())
    }
}

pub(crate) fn header_of(tree: &GenomeTree<Element>, node: NodeId) -> Result<&ActionHeader> {
    tree.get(node)
        .as_action()
        .ok_or_else(|| RestgenError::Structure(format!("node {} is not an action", node.index())))
}

pub(crate) fn header_of_mut(tree: &mut GenomeTree<Element>, node: NodeId) -> Result<&mut ActionHeader> {
    tree.get_mut(node)
        .as_action_mut()
        .ok_or_else(|| RestgenError::Structure(format!("node {} is not an action", node.index())))
}

pub(crate) fn parameters_of(tree: &GenomeTree<Element>, action: NodeId) -> Vec<NodeId> {
    tree.children(action)
        .iter()
        .copied()
        .filter(|&child| tree.get(child).as_param().is_some())
        .collect()
}

pub(crate) fn param_gene_of(tree: &GenomeTree<Element>, param: NodeId) -> Result<NodeId> {
    tree.children(param)
        .first()
        .copied()
        .filter(|&gene| tree.get(gene).as_gene().is_some())
        .ok_or_else(|| {
            RestgenError::Structure(format!("parameter node {} has no value gene", param.index()))
        })
}

pub(crate) fn path_values_of(tree: &GenomeTree<Element>, action: NodeId) -> Result<Vec<(String, Gene)>> {
    let mut values = Vec::new();
    for param in parameters_of(tree, action) {
        let Some(header) = tree.get(param).as_param() else { continue };
        if header.location != ParamLocation::Path {
            continue;
        }
        let gene = param_gene_of(tree, param)?;
        if let Some(value) = tree.get(gene).as_gene() {
            values.push((header.name.clone(), value.clone()));
        }
    }
    Ok(values)
}

pub(crate) fn freeze_path_parameters_of(tree: &mut GenomeTree<Element>, action: NodeId) {
    for param in parameters_of(tree, action) {
        let is_path = tree
            .get(param)
            .as_param()
            .map_or(false, |h| h.location == ParamLocation::Path);
        if !is_path {
            continue;
        }
        for id in tree.descendants(param) {
            if let Element::Gene(gene) = tree.get_mut(id) {
                gene.mutable = false;
            }
        }
    }
}

pub(crate) fn resolved_path_of(tree: &GenomeTree<Element>, action: NodeId) -> Result<String> {
    let header = header_of(tree, action)?;
    let values = path_values_of(tree, action)?;
    Ok(header.path.resolve(|name| {
        values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, gene)| gene.raw_value())
    }))
}

fn check_param_shape(tree: &GenomeTree<Element>, node: NodeId) -> Result<()> {
    if tree.get(node).as_param().is_none() {
        return Err(RestgenError::Catalog(
            "action parameters must be rooted at a parameter node".to_string(),
        ));
    }
    if tree.children(node).len() != 1 {
        return Err(RestgenError::Catalog(format!(
            "parameter must hold exactly one value gene, found {}",
            tree.children(node).len()
        )));
    }
    param_gene_of(tree, node).map(|_| ())
}
