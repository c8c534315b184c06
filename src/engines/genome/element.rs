use super::gene::Gene;
use super::tree::{Genome, GenomeTree};
use crate::catalog::action::ActionHeader;
use crate::types::ParamLocation;

/// Payload of every node in a sampled artefact
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Root of a test sequence; children are actions
    Sequence,
    /// An API call; children are its parameters
    Action(ActionHeader),
    /// A request parameter; its single child is the value gene
    Param(ParamHeader),
    Gene(Gene),
}

impl Genome for Element {}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamHeader {
    pub name: String,
    pub location: ParamLocation,
}

impl Element {
    pub fn as_action(&self) -> Option<&ActionHeader> {
        match self {
            Element::Action(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_action_mut(&mut self) -> Option<&mut ActionHeader> {
        match self {
            Element::Action(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&ParamHeader> {
        match self {
            Element::Param(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_gene(&self) -> Option<&Gene> {
        match self {
            Element::Gene(gene) => Some(gene),
            _ => None,
        }
    }

    pub fn as_gene_mut(&mut self) -> Option<&mut Gene> {
        match self {
            Element::Gene(gene) => Some(gene),
            _ => None,
        }
    }
}

pub fn gene_tree(gene: Gene) -> GenomeTree<Element> {
    GenomeTree::new(Element::Gene(gene))
}

pub fn object_tree(name: impl Into<String>, fields: Vec<GenomeTree<Element>>) -> GenomeTree<Element> {
    GenomeTree::from_parts(Element::Gene(Gene::object(name)), fields)
}

pub fn param_tree(
    name: impl Into<String>,
    location: ParamLocation,
    gene: GenomeTree<Element>,
) -> GenomeTree<Element> {
    let header = ParamHeader {
        name: name.into(),
        location,
    };
    GenomeTree::from_parts(Element::Param(header), vec![gene])
}
