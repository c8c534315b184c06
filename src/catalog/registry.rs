use super::action::ActionTemplate;
use crate::error::{Result, RestgenError};
use crate::types::HttpVerb;
use std::collections::BTreeMap;

/// Operation templates of the target API, keyed by signature (`VERB:/path`)
///
/// Ordered so that iterating it, and every random draw made over it, is
/// reproducible for a given seed.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: BTreeMap<String, ActionTemplate>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: ActionTemplate) -> Result<()> {
        let signature = template.signature();
        if self.actions.contains_key(&signature) {
            return Err(RestgenError::Catalog(format!(
                "duplicate operation {}",
                signature
            )));
        }
        self.actions.insert(signature, template);
        Ok(())
    }

    pub fn get(&self, signature: &str) -> Option<&ActionTemplate> {
        self.actions.get(signature)
    }

    pub fn templates(&self) -> impl Iterator<Item = &ActionTemplate> {
        self.actions.values()
    }

    pub fn with_verb(&self, verb: HttpVerb) -> Vec<&ActionTemplate> {
        self.templates().filter(|t| t.verb() == verb).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
