use super::binding::{Binding, BindingContext};
use crate::catalog::{BoundAction, ModelCatalog};
use crate::engines::genome::Gene;
use crate::error::{Result, RestgenError};
use rand::Rng;
use std::sync::Arc;

/// A model field a parameter could take its value from
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub model: String,
    pub field: String,
    /// Normalized: all candidates of one parameter sum to 1
    pub probability: f64,
}

/// Longest contiguous substring shared by `a` and `b`
pub fn longest_common_substring(a: &str, b: &str) -> String {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let (mut best_len, mut best_end) = (0, 0);

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            current[j] = if a[i - 1] == b[j - 1] {
                previous[j - 1] + 1
            } else {
                0
            };
            if current[j] > best_len {
                best_len = current[j];
                best_end = i;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    a[best_end - best_len..best_end].iter().collect()
}

/// Case-insensitive overlap of `parameter` with `model + field`, scaled by
/// the longer of the two names
pub fn similarity(parameter: &str, model: &str, field: &str) -> f64 {
    let extended = format!("{}{}", model, field);
    let longest = parameter.chars().count().max(extended.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let common = longest_common_substring(&parameter.to_lowercase(), &extended.to_lowercase());
    common.chars().count() as f64 / longest as f64
}

/// Assigns parameter values from fields of known object models, favouring
/// fields whose qualified name resembles the parameter name.
#[derive(Debug, Clone)]
pub struct FieldBinder {
    models: Arc<ModelCatalog>,
}

impl FieldBinder {
    pub fn new(models: Arc<ModelCatalog>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    /// Candidate fields for the parameter `parameter` holding `gene`, most
    /// likely first. A field qualifies when every value it can take fits
    /// `gene`, so enum fields need options the parameter knows.
    pub fn likelihoods(&self, parameter: &str, gene: &Gene) -> Vec<Candidate> {
        let kind = gene.kind();
        if !kind.is_bindable() {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate> = self
            .models
            .iter()
            .filter(|model| model.has_field_of_kind(kind))
            .flat_map(|model| {
                model
                    .fields()
                    .into_iter()
                    .filter(|field| gene.accepts_values_of(field))
                    .map(|field| Candidate {
                        model: model.name().to_string(),
                        field: field.name.clone(),
                        probability: similarity(parameter, model.name(), &field.name),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        if candidates.is_empty() {
            return candidates;
        }

        let total: f64 = candidates.iter().map(|c| c.probability).sum();
        let uniform = 1.0 / candidates.len() as f64;
        for candidate in &mut candidates {
            candidate.probability = if total > 0.0 {
                candidate.probability / total
            } else {
                uniform
            };
        }

        candidates.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }

    /// Roulette draw over `candidates` in order, or the first one when not
    /// `probabilistic`
    pub fn pick<'c, R: Rng>(
        candidates: &'c [Candidate],
        probabilistic: bool,
        rng: &mut R,
    ) -> Option<&'c Candidate> {
        let first = candidates.first()?;
        if !probabilistic {
            return Some(first);
        }

        let spin = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for candidate in candidates {
            cumulative += candidate.probability;
            if spin <= cumulative {
                return Some(candidate);
            }
        }
        candidates.last()
    }

    /// Fill every parameter of `action`: bindable ones from a model field,
    /// the rest with random values. Assigns the action an id if it has none.
    pub fn bind_action<R: Rng>(
        &self,
        action: &mut BoundAction,
        ctx: &mut BindingContext,
        probabilistic: bool,
        rng: &mut R,
    ) -> Result<()> {
        let action_id = match action.header().id {
            Some(id) => id,
            None => {
                let id = ctx.next_action_id();
                action.header_mut().id = Some(id);
                id
            }
        };

        let mut genes = Vec::new();
        for param in action.parameters() {
            let gene = action.param_gene(param)?;
            let name = action
                .param_header(param)
                .map(|h| h.name.clone())
                .unwrap_or_default();
            genes.push((name, gene));
        }

        for (parameter, gene) in &genes {
            let current = action
                .gene(*gene)
                .ok_or_else(|| RestgenError::Structure(format!("{} has no value gene", parameter)))?;
            let candidates = self.likelihoods(parameter, current);
            let Some(chosen) = Self::pick(&candidates, probabilistic, rng) else {
                action.randomize(*gene, rng);
                continue;
            };

            let model = self.models.get(&chosen.model).ok_or_else(|| {
                RestgenError::Invariant(format!("unknown model {}", chosen.model))
            })?;
            let fields = model.instantiate(rng)?;
            let value = fields
                .iter()
                .find(|f| f.name == chosen.field)
                .cloned()
                .ok_or_else(|| {
                    RestgenError::Invariant(format!(
                        "model {} has no field {}",
                        chosen.model, chosen.field
                    ))
                })?;

            if let Some(target) = action.gene_mut(*gene) {
                target.copy_value_from(&value)?;
            }
            let instance = ctx.add_instance(model.name(), fields);
            ctx.record(Binding {
                action: action_id,
                parameter: parameter.clone(),
                model: chosen.model.clone(),
                field: chosen.field.clone(),
                instance,
            });
        }

        for (parameter, value) in ctx.reconcile(action_id) {
            if let Some((_, gene)) = genes.iter().find(|(name, _)| *name == parameter) {
                if let Some(target) = action.gene_mut(*gene) {
                    target.copy_value_from(&value)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionTemplate, ObjectModel, ResourcePath};
    use crate::engines::genome::{gene_tree, param_tree};
    use crate::types::{HttpVerb, ParamLocation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn models() -> Arc<ModelCatalog> {
        let mut catalog = ModelCatalog::new();
        catalog
            .insert(
                ObjectModel::new(
                    "User",
                    vec![
                        gene_tree(Gene::string("name")),
                        gene_tree(Gene::string("email")),
                        gene_tree(Gene::integer("id", 1, 99)),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        catalog
            .insert(
                ObjectModel::new(
                    "Order",
                    vec![
                        gene_tree(Gene::integer("id", 100, 199)),
                        gene_tree(Gene::boolean("paid")),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_lcs_is_symmetric_in_length() {
        let forward = longest_common_substring("username", "usermodelname");
        let backward = longest_common_substring("usermodelname", "username");
        assert_eq!(forward.len(), 4);
        assert_eq!(backward.len(), 4);
        assert!(["user", "name"].contains(&forward.as_str()));
    }

    #[test]
    fn test_lcs_edge_cases() {
        assert_eq!(longest_common_substring("", "abc"), "");
        assert_eq!(longest_common_substring("abc", "xyz"), "");
        assert_eq!(longest_common_substring("orderId", "orderId"), "orderId");
    }

    #[test]
    fn test_similarity_score() {
        let score = similarity("userName", "user", "modelname");
        assert!((score - 4.0 / 13.0).abs() < 1e-9);
        assert!((similarity("UserName", "User", "Name") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_likelihoods_sum_to_one() {
        let binder = FieldBinder::new(models());
        for (name, gene) in [
            ("userName", Gene::string("userName")),
            ("orderId", Gene::integer("orderId", 0, 500)),
            ("zzz", Gene::integer("zzz", 0, 1)),
            ("paid", Gene::boolean("paid")),
        ] {
            let candidates = binder.likelihoods(name, &gene);
            assert!(!candidates.is_empty());
            let total: f64 = candidates.iter().map(|c| c.probability).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", name, total);
        }
    }

    #[test]
    fn test_likelihoods_restricted_by_kind() {
        let binder = FieldBinder::new(models());
        let candidates = binder.likelihoods("userId", &Gene::integer("userId", 0, 500));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].model, "User");
        assert!(binder.likelihoods("ratio", &Gene::float("ratio", 0.0, 1.0)).is_empty());
        assert!(binder.likelihoods("body", &Gene::object("body")).is_empty());
    }

    #[test]
    fn test_deterministic_pick_is_best() {
        let binder = FieldBinder::new(models());
        let candidates = binder.likelihoods("orderId", &Gene::integer("orderId", 0, 500));
        let mut rng = StdRng::seed_from_u64(3);
        let best = FieldBinder::pick(&candidates, false, &mut rng).unwrap();
        assert_eq!((best.model.as_str(), best.field.as_str()), ("Order", "id"));
    }

    #[test]
    fn test_probabilistic_pick_reaches_every_candidate() {
        let candidates = vec![
            Candidate { model: "A".into(), field: "x".into(), probability: 0.5 },
            Candidate { model: "B".into(), field: "y".into(), probability: 0.5 },
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen_a = false;
        let mut seen_b = false;
        for _ in 0..200 {
            match FieldBinder::pick(&candidates, true, &mut rng).unwrap().model.as_str() {
                "A" => seen_a = true,
                _ => seen_b = true,
            }
        }
        assert!(seen_a && seen_b);
        assert!(FieldBinder::pick(&[], true, &mut rng).is_none());
    }

    #[test]
    fn test_bind_action_records_bindings() {
        let binder = FieldBinder::new(models());
        let template = ActionTemplate::new(
            HttpVerb::Get,
            ResourcePath::parse("/users/{userId}").unwrap(),
            vec![
                param_tree("userId", ParamLocation::Path, gene_tree(Gene::integer("userId", 0, 500))),
                param_tree("ratio", ParamLocation::Query, gene_tree(Gene::float("ratio", 0.0, 1.0))),
            ],
        )
        .unwrap();
        let mut action = BoundAction::from_template(&template).unwrap();
        let mut ctx = BindingContext::new();
        let mut rng = StdRng::seed_from_u64(5);

        binder.bind_action(&mut action, &mut ctx, false, &mut rng).unwrap();

        let id = action.header().id.unwrap();
        let bindings: Vec<_> = ctx.bindings_for(id).collect();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].parameter, "userId");
        assert_eq!((bindings[0].model.as_str(), bindings[0].field.as_str()), ("User", "id"));

        let bound = ctx.instance(bindings[0].instance).unwrap().field("id").unwrap().raw_value();
        let values = action.path_values().unwrap();
        assert_eq!(values[0].1.raw_value(), bound);
        assert!(ctx.coherence_check().is_ok());
    }

    #[test]
    fn test_enum_with_foreign_options_is_randomized() {
        let mut catalog = ModelCatalog::new();
        catalog
            .insert(
                ObjectModel::new(
                    "Pet",
                    vec![gene_tree(Gene::enumeration("status", vec!["new".into(), "sold".into()]))],
                )
                .unwrap(),
            )
            .unwrap();
        let binder = FieldBinder::new(Arc::new(catalog));
        let options = vec!["available".to_string(), "pending".to_string()];
        assert!(binder
            .likelihoods("status", &Gene::enumeration("status", options.clone()))
            .is_empty());

        let template = ActionTemplate::new(
            HttpVerb::Get,
            ResourcePath::parse("/pets").unwrap(),
            vec![param_tree(
                "status",
                ParamLocation::Query,
                gene_tree(Gene::enumeration("status", options.clone())),
            )],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for probabilistic in [true, false] {
            let mut action = BoundAction::from_template(&template).unwrap();
            let mut ctx = BindingContext::new();
            binder.bind_action(&mut action, &mut ctx, probabilistic, &mut rng).unwrap();

            assert!(ctx.is_empty());
            let param = action.parameters()[0];
            let value = action.gene(action.param_gene(param).unwrap()).unwrap().raw_value();
            assert!(options.contains(&value));
        }
    }

    #[test]
    fn test_enum_with_known_options_is_bound() {
        let mut catalog = ModelCatalog::new();
        catalog
            .insert(
                ObjectModel::new(
                    "Pet",
                    vec![gene_tree(Gene::enumeration("status", vec!["pending".into()]))],
                )
                .unwrap(),
            )
            .unwrap();
        let binder = FieldBinder::new(Arc::new(catalog));
        let candidates = binder.likelihoods(
            "status",
            &Gene::enumeration("status", vec!["available".into(), "pending".into()]),
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].field, "status");
    }
}
