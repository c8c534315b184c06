use crate::catalog::ActionId;
use crate::engines::genome::Gene;
use crate::error::{Result, RestgenError};
use std::collections::HashMap;

/// Randomized copy of an object model that parameter values were taken from
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: String,
    pub fields: Vec<Gene>,
}

impl ModelInstance {
    pub fn field(&self, name: &str) -> Option<&Gene> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// `(action, parameter)` took its value from `(model, field)` of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub action: ActionId,
    pub parameter: String,
    pub model: String,
    pub field: String,
    pub instance: usize,
}

/// State of one sampling call: action ids handed out, model instances
/// drawn, and which parameter was bound from which field.
///
/// A fresh context is created for every sampling call and ends up owned by
/// the resulting sequence.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    next_action: u32,
    instances: Vec<ModelInstance>,
    bindings: Vec<Binding>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_action_id(&mut self) -> ActionId {
        let id = ActionId(self.next_action);
        self.next_action += 1;
        id
    }

    pub fn add_instance(&mut self, model: impl Into<String>, fields: Vec<Gene>) -> usize {
        self.instances.push(ModelInstance {
            model: model.into(),
            fields,
        });
        self.instances.len() - 1
    }

    pub fn instance(&self, index: usize) -> Option<&ModelInstance> {
        self.instances.get(index)
    }

    pub fn record(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn bindings_for(&self, action: ActionId) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.action == action)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Make every parameter of `action` bound from the same model use the
    /// first instance drawn for it. Returns the parameter values to rewrite.
    pub fn reconcile(&mut self, action: ActionId) -> Vec<(String, Gene)> {
        let mut canonical: HashMap<String, usize> = HashMap::new();
        let mut rewrites = Vec::new();

        for binding in self.bindings.iter_mut().filter(|b| b.action == action) {
            let chosen = *canonical
                .entry(binding.model.clone())
                .or_insert(binding.instance);
            if chosen == binding.instance {
                continue;
            }
            if let Some(value) = self.instances[chosen].field(&binding.field) {
                rewrites.push((binding.parameter.clone(), value.clone()));
                binding.instance = chosen;
            }
        }
        rewrites
    }

    /// Every binding refers to a known instance of its model, and within an
    /// action all bindings to one model share a single instance.
    pub fn coherence_check(&self) -> Result<()> {
        let mut seen: HashMap<(ActionId, &str), usize> = HashMap::new();
        for binding in &self.bindings {
            let instance = self.instances.get(binding.instance).ok_or_else(|| {
                RestgenError::Invariant(format!(
                    "binding of {} on {} refers to unknown instance {}",
                    binding.parameter, binding.action, binding.instance
                ))
            })?;
            if instance.model != binding.model || instance.field(&binding.field).is_none() {
                return Err(RestgenError::Invariant(format!(
                    "binding of {} on {} does not match instance of {}",
                    binding.parameter, binding.action, instance.model
                )));
            }
            let first = *seen
                .entry((binding.action, binding.model.as_str()))
                .or_insert(binding.instance);
            if first != binding.instance {
                return Err(RestgenError::Invariant(format!(
                    "{} on {} is bound to two different {} instances",
                    binding.parameter, binding.action, binding.model
                )));
            }
        }
        Ok(())
    }
}
