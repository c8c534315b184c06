pub mod element;
pub mod gene;
pub mod tree;

pub use element::{gene_tree, object_tree, param_tree, Element, ParamHeader};
pub use gene::{Gene, GeneKind, GeneValue};
pub use tree::{Genome, GenomeTree, NodeId};
