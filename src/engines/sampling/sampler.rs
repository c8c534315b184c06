use super::binding::BindingContext;
use super::field_binder::FieldBinder;
use super::resolver::DependencyResolver;
use super::sequence::TestSequence;
use crate::catalog::{
    ActionCatalog, ActionTemplate, AuthContext, AuthenticationInfo, BoundAction, ModelCatalog,
};
use crate::config::{ConfigSection, SamplingConfig};
use crate::error::{Result, RestgenError};
use crate::types::{HttpVerb, SampleType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Chance that a PUT is sampled on its own, as a create-or-update call
pub const PUT_ALONE_PROBABILITY: f64 = 0.2;

/// Chance that a PATCH is followed by a second one on the same resource
pub const REPEATED_PATCH_PROBABILITY: f64 = 0.5;

/// Produces test sequences for the search engine.
///
/// Until the seed pool is used up, every smart sample is a single call on
/// one endpoint (once per endpoint and authentication). After that, smart
/// samples start from a random action and prepend whatever POSTs it needs.
pub struct SmartSampler {
    catalog: Arc<ActionCatalog>,
    binder: FieldBinder,
    resolver: DependencyResolver,
    authentications: Vec<AuthenticationInfo>,
    config: SamplingConfig,
    seeds: Vec<BoundAction>,
    rng: StdRng,
}

impl SmartSampler {
    pub fn new(
        catalog: ActionCatalog,
        models: ModelCatalog,
        authentications: Vec<AuthenticationInfo>,
        config: SamplingConfig,
    ) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(catalog, models, authentications, config, rng)
    }

    pub fn with_rng(
        catalog: ActionCatalog,
        models: ModelCatalog,
        authentications: Vec<AuthenticationInfo>,
        config: SamplingConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(RestgenError::Catalog(
                "cannot sample from an empty action catalog".to_string(),
            ));
        }

        let catalog = Arc::new(catalog);
        let binder = FieldBinder::new(Arc::new(models));
        let resolver =
            DependencyResolver::new(Arc::clone(&catalog), binder.clone(), config.max_sequence_size);

        let mut sampler = Self {
            catalog,
            binder,
            resolver,
            authentications,
            config,
            seeds: Vec::new(),
            rng,
        };
        sampler.reset_seed_pool()?;

        log::debug!(
            "Sampler ready: {} operations, {} users, {} seeds",
            sampler.catalog.len(),
            sampler.authentications.len(),
            sampler.seeds.len()
        );
        Ok(sampler)
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn pending_seeds(&self) -> usize {
        self.seeds.len()
    }

    /// Seeds first, then smart or random according to `prob_of_smart_sampling`
    pub fn sample(&mut self) -> Result<TestSequence> {
        if self.has_pending_seed() {
            return self.smart_sample();
        }
        if self.rng.gen_bool(self.config.prob_of_smart_sampling) {
            self.smart_sample()
        } else {
            self.sample_at_random()
        }
    }

    pub fn has_pending_seed(&self) -> bool {
        !self.seeds.is_empty() && self.config.prob_of_smart_sampling > 0.0
    }

    /// Refill the pool with one call per endpoint, for no authentication
    /// and then for each user
    pub fn reset_seed_pool(&mut self) -> Result<()> {
        self.seeds.clear();
        let mut contexts = vec![AuthContext::NoAuth];
        contexts.extend(self.authentications.iter().cloned().map(AuthContext::User));

        for auth in contexts {
            for template in self.catalog.templates() {
                let mut seed = BoundAction::from_template(template)?;
                seed.header_mut().auth = auth.clone();
                self.seeds.push(seed);
            }
        }
        // consumed from the back
        self.seeds.reverse();
        Ok(())
    }

    /// Between 1 and `max_sequence_size` unrelated random actions
    pub fn sample_at_random(&mut self) -> Result<TestSequence> {
        let n = self.rng.gen_range(1..=self.config.max_sequence_size);
        let mut ctx = BindingContext::new();
        let mut sequence = TestSequence::new(SampleType::Random);
        for _ in 0..n {
            let action = self.sample_random_action(self.config.no_auth_probability, &mut ctx)?;
            sequence.push(action)?;
        }
        self.finish(sequence, ctx)
    }

    pub fn smart_sample(&mut self) -> Result<TestSequence> {
        if let Some(seed) = self.seeds.pop() {
            return self.sample_seed(seed);
        }
        if self.config.max_sequence_size <= 1 {
            return self.sample_at_random();
        }

        let mut ctx = BindingContext::new();
        let action = self.sample_random_action(0.0, &mut ctx)?;
        self.smart_sample_with(action, ctx)
    }

    /// Smart sample starting from the operation `signature`
    pub fn sample_from(&mut self, signature: &str) -> Result<TestSequence> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .get(signature)
            .ok_or_else(|| RestgenError::Catalog(format!("unknown operation {}", signature)))?;

        let mut ctx = BindingContext::new();
        let action = self.bind_fresh(template, 0.0, &mut ctx)?;
        self.smart_sample_with(action, ctx)
    }

    fn smart_sample_with(&mut self, action: BoundAction, mut ctx: BindingContext) -> Result<TestSequence> {
        log::debug!("Smart sampling from {}", action.header().signature());
        let verb = action.header().verb;
        let sequence = match verb {
            HttpVerb::Get => self.handle_smart_get(action, &mut ctx)?,
            HttpVerb::Post => self.handle_smart_post(action)?,
            HttpVerb::Put => self.handle_smart_put(action, &mut ctx)?,
            HttpVerb::Delete => self.handle_smart_delete(action, &mut ctx)?,
            HttpVerb::Patch => self.handle_smart_patch(action, &mut ctx)?,
            HttpVerb::Head | HttpVerb::Options | HttpVerb::Trace => {
                return self.sample_at_random();
            }
        };
        self.finish(sequence, ctx)
    }

    fn handle_smart_post(&mut self, post: BoundAction) -> Result<TestSequence> {
        let mut sequence = TestSequence::new(SampleType::Smart);
        sequence.push(post)?;
        Ok(sequence)
    }

    fn handle_smart_get(&mut self, get: BoundAction, ctx: &mut BindingContext) -> Result<TestSequence> {
        let mut sequence = TestSequence::new(SampleType::Smart);
        let node = sequence.push(get)?;
        let (lone, lone_ctx) = (sequence.clone(), ctx.clone());

        let created = self
            .resolver
            .create_resources_for(node, &mut sequence, ctx, &mut self.rng)?;
        if !created {
            // read-only API, or nothing creates this resource
            *ctx = lone_ctx;
            return Ok(lone);
        }
        sequence.freeze_path_parameters();

        let get_header = sequence.header(node)?.clone();
        if get_header.path.is_last_element_a_parameter() || sequence.len() < 2 {
            return Ok(sequence);
        }
        let last_post = sequence
            .action_at(sequence.len() - 2)
            .ok_or_else(|| RestgenError::Invariant("GET lost its creating POST".to_string()))?;
        let post_header = sequence.header(last_post)?.clone();
        let available = self.config.max_sequence_size.saturating_sub(sequence.len());

        if post_header.path.is_equivalent(&get_header.path) && available > 0 {
            let k = 1 + self.rng.gen_range(0..available);
            let catalog = Arc::clone(&self.catalog);
            let template = catalog.get(&post_header.signature()).ok_or_else(|| {
                RestgenError::Catalog(format!("unknown operation {}", post_header.signature()))
            })?;
            let values = sequence.path_values(node)?;

            for _ in 0..k {
                let mut create = self.resolver.create_action_for(
                    template,
                    &get_header.auth,
                    &get_header.path,
                    &values,
                    ctx,
                    &mut self.rng,
                )?;
                create.freeze_path_parameters();
                create.header_mut().location_id = post_header.location_id.clone();
                let before_get = sequence.len() - 1;
                sequence.insert(before_get, create)?;
            }
            log::debug!("Collection GET {}: {} extra POSTs", get_header.path, k);
            sequence.set_sample_type(SampleType::SmartGetCollection);
        }
        Ok(sequence)
    }

    fn handle_smart_put(&mut self, put: BoundAction, ctx: &mut BindingContext) -> Result<TestSequence> {
        if self.rng.gen_bool(PUT_ALONE_PROBABILITY) {
            let mut sequence = TestSequence::new(SampleType::Smart);
            sequence.push(put)?;
            return Ok(sequence);
        }
        self.create_write_operation_after_a_post(put, ctx)
    }

    fn handle_smart_delete(&mut self, delete: BoundAction, ctx: &mut BindingContext) -> Result<TestSequence> {
        self.create_write_operation_after_a_post(delete, ctx)
    }

    fn handle_smart_patch(&mut self, patch: BoundAction, ctx: &mut BindingContext) -> Result<TestSequence> {
        self.create_write_operation_after_a_post(patch, ctx)
    }

    /// PUT, DELETE or PATCH preceded by the POSTs creating its resource
    fn create_write_operation_after_a_post(
        &mut self,
        write: BoundAction,
        ctx: &mut BindingContext,
    ) -> Result<TestSequence> {
        let mut sequence = TestSequence::new(SampleType::Smart);
        let node = sequence.push(write)?;
        let created = self
            .resolver
            .create_resources_for(node, &mut sequence, ctx, &mut self.rng)?;
        if !created {
            log::debug!("No creating POST found for {}", sequence.header(node)?.signature());
        }

        let header = sequence.header(node)?.clone();
        if header.verb == HttpVerb::Patch
            && self.config.max_sequence_size >= sequence.len() + 1
            && self.rng.gen_bool(REPEATED_PATCH_PROBABILITY)
        {
            let catalog = Arc::clone(&self.catalog);
            let template = catalog.get(&header.signature()).ok_or_else(|| {
                RestgenError::Catalog(format!("unknown operation {}", header.signature()))
            })?;
            let values = sequence.path_values(node)?;
            let mut second = self.resolver.create_action_for(
                template,
                &header.auth,
                &header.path,
                &values,
                ctx,
                &mut self.rng,
            )?;
            second.header_mut().location_id = header.location_id.clone();
            sequence.push(second)?;
        }

        sequence.freeze_path_parameters();
        Ok(sequence)
    }

    fn sample_seed(&mut self, mut seed: BoundAction) -> Result<TestSequence> {
        let mut ctx = BindingContext::new();
        self.binder.bind_action(&mut seed, &mut ctx, false, &mut self.rng)?;
        let mut sequence = TestSequence::new(SampleType::Smart);
        sequence.push(seed)?;
        self.finish(sequence, ctx)
    }

    fn sample_random_action(
        &mut self,
        no_auth_probability: f64,
        ctx: &mut BindingContext,
    ) -> Result<BoundAction> {
        let catalog = Arc::clone(&self.catalog);
        let templates: Vec<&ActionTemplate> = catalog.templates().collect();
        let template = templates
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| RestgenError::Catalog("action catalog is empty".to_string()))?;
        self.bind_fresh(template, no_auth_probability, ctx)
    }

    fn bind_fresh(
        &mut self,
        template: &ActionTemplate,
        no_auth_probability: f64,
        ctx: &mut BindingContext,
    ) -> Result<BoundAction> {
        let mut action = BoundAction::from_template(template)?;
        self.binder.bind_action(&mut action, ctx, true, &mut self.rng)?;
        action.header_mut().auth = self.random_auth(no_auth_probability);
        Ok(action)
    }

    fn random_auth(&mut self, no_auth_probability: f64) -> AuthContext {
        if self.authentications.is_empty() || self.rng.gen_bool(no_auth_probability) {
            return AuthContext::NoAuth;
        }
        self.authentications
            .choose(&mut self.rng)
            .cloned()
            .map(AuthContext::User)
            .unwrap_or_default()
    }

    fn finish(&self, mut sequence: TestSequence, ctx: BindingContext) -> Result<TestSequence> {
        ctx.coherence_check()?;
        sequence.set_bindings(ctx);
        log::debug!(
            "Sampled {} sequence of {} actions",
            sequence.sample_type(),
            sequence.len()
        );
        Ok(sequence)
    }
}
