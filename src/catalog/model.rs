use crate::engines::genome::{object_tree, Element, Gene, GeneKind, GenomeTree};
use crate::error::{Result, RestgenError};
use rand::Rng;
use std::collections::BTreeMap;

/// A data shape previously observed in the API (a schema definition)
#[derive(Debug, Clone)]
pub struct ObjectModel {
    name: String,
    tree: GenomeTree<Element>,
}

impl ObjectModel {
    /// `fields` are gene trees; the field name is the gene name
    pub fn new(name: impl Into<String>, fields: Vec<GenomeTree<Element>>) -> Result<Self> {
        let name = name.into();
        for field in &fields {
            if field.get(field.root()).as_gene().is_none() {
                return Err(RestgenError::Catalog(format!(
                    "field of model {} is not a gene",
                    name
                )));
            }
        }
        let tree = object_tree(name.clone(), fields);
        Ok(Self { name, tree })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &GenomeTree<Element> {
        &self.tree
    }

    /// Top-level fields, in declaration order
    pub fn fields(&self) -> Vec<&Gene> {
        field_genes(&self.tree)
    }

    pub fn field(&self, name: &str) -> Option<&Gene> {
        self.fields().into_iter().find(|f| f.name == name)
    }

    pub fn has_field_of_kind(&self, kind: GeneKind) -> bool {
        self.fields().iter().any(|f| f.kind() == kind)
    }

    /// Fresh copy of the model with every gene randomized
    pub fn instantiate<R: Rng>(&self, rng: &mut R) -> Result<Vec<Gene>> {
        let mut copy = self.tree.copy(self.tree.root())?;
        let root = copy.root();
        for id in copy.descendants(root) {
            if let Element::Gene(gene) = copy.get_mut(id) {
                gene.randomize(rng);
            }
        }
        Ok(field_genes(&copy).into_iter().cloned().collect())
    }
}

fn field_genes(tree: &GenomeTree<Element>) -> Vec<&Gene> {
    tree.children(tree.root())
        .iter()
        .filter_map(|&id| tree.get(id).as_gene())
        .collect()
}

/// Every object model known for the target API, by name
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, ObjectModel>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: ObjectModel) -> Result<()> {
        if self.models.contains_key(model.name()) {
            return Err(RestgenError::Catalog(format!(
                "duplicate model {}",
                model.name()
            )));
        }
        self.models.insert(model.name().to_string(), model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ObjectModel> {
        self.models.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
