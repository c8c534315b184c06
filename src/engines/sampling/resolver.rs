use super::binding::BindingContext;
use super::field_binder::FieldBinder;
use super::sequence::TestSequence;
use crate::catalog::{ActionCatalog, ActionTemplate, AuthContext, BoundAction, ResourcePath};
use crate::engines::genome::{Gene, NodeId};
use crate::error::{Result, RestgenError};
use crate::types::HttpVerb;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Prepends the creating calls an action needs, closest ancestor first.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    catalog: Arc<ActionCatalog>,
    binder: FieldBinder,
    max_sequence_size: usize,
}

impl DependencyResolver {
    pub fn new(catalog: Arc<ActionCatalog>, binder: FieldBinder, max_sequence_size: usize) -> Self {
        Self {
            catalog,
            binder,
            max_sequence_size,
        }
    }

    pub fn max_sequence_size(&self) -> usize {
        self.max_sequence_size
    }

    /// Insert at the front of `sequence` the POST chain that creates the
    /// resource `target` works on, and wire locations between them.
    ///
    /// `Ok(false)` when there is no room left or no POST can create the
    /// resource. Actions inserted before a failure stay in the sequence.
    pub fn create_resources_for<R: Rng>(
        &self,
        target: NodeId,
        sequence: &mut TestSequence,
        ctx: &mut BindingContext,
        rng: &mut R,
    ) -> Result<bool> {
        if sequence.len() >= self.max_sequence_size {
            log::debug!(
                "No room for dependencies: sequence already holds {} actions",
                sequence.len()
            );
            return Ok(false);
        }

        let target_header = sequence.header(target)?.clone();
        let candidates = self.choose_closest_ancestor(&target_header.signature(), &target_header.path);
        if candidates.is_empty() {
            log::debug!("No POST can create the resource of {}", target_header.signature());
            return Ok(false);
        }
        let template = Self::choose_longest_path(&candidates, rng)?;

        let values = sequence.path_values(target)?;
        let post = self.create_action_for(
            template,
            &target_header.auth,
            &target_header.path,
            &values,
            ctx,
            rng,
        )?;
        let post_path = post.header().path.clone();
        let post_node = sequence.insert(0, post)?;
        log::debug!(
            "Prepended {} for {}",
            template.signature(),
            target_header.signature()
        );

        let needs_parent = (post_path.has_variable_path_parameters()
            && !post_path.is_last_element_a_parameter())
            || post_path.variable_names().len() >= 2;
        if needs_parent && !self.create_resources_for(post_node, sequence, ctx, rng)? {
            return Ok(false);
        }

        if !post_path.is_equivalent(&target_header.path) {
            sequence.header_mut(post_node)?.save_location = true;
            sequence.header_mut(target)?.location_id = Some(post_path.creation_location_id());
        } else {
            let inherited = sequence.header(post_node)?.location_id.clone();
            sequence.header_mut(target)?.location_id = inherited;
        }
        Ok(true)
    }

    /// POST templates whose path is an ancestor of (or the same shape as)
    /// `path`, other than the operation `signature` itself
    pub fn choose_closest_ancestor(
        &self,
        signature: &str,
        path: &ResourcePath,
    ) -> Vec<&ActionTemplate> {
        self.catalog
            .with_verb(HttpVerb::Post)
            .into_iter()
            .filter(|t| t.signature() != signature && t.path().is_ancestor_of(path))
            .collect()
    }

    /// Candidate with the most path levels; ties are broken at random
    pub fn choose_longest_path<'a, R: Rng>(
        candidates: &[&'a ActionTemplate],
        rng: &mut R,
    ) -> Result<&'a ActionTemplate> {
        let longest = candidates
            .iter()
            .map(|t| t.path().levels())
            .max()
            .ok_or_else(|| {
                RestgenError::Invariant("cannot choose a path among no candidates".to_string())
            })?;
        let tied: Vec<&'a ActionTemplate> = candidates
            .iter()
            .copied()
            .filter(|t| t.path().levels() == longest)
            .collect();
        tied.choose(rng).copied().ok_or_else(|| {
            RestgenError::Invariant("no candidate has the longest path".to_string())
        })
    }

    /// Fresh action from `template`, bound probabilistically, running as
    /// `auth`, with path parameters set to the `target_values` that resolve
    /// `target_path`
    pub fn create_action_for<R: Rng>(
        &self,
        template: &ActionTemplate,
        auth: &AuthContext,
        target_path: &ResourcePath,
        target_values: &[(String, Gene)],
        ctx: &mut BindingContext,
        rng: &mut R,
    ) -> Result<BoundAction> {
        let mut action = BoundAction::from_template(template)?;
        self.binder.bind_action(&mut action, ctx, true, rng)?;
        action.header_mut().auth = auth.clone();
        action.bind_to_same_path_resolution(target_path, target_values)?;
        Ok(action)
    }
}
