use super::traits::{check_probability, ConfigSection};
use crate::error::RestgenError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Upper bound on the actions of one sampled sequence
    pub max_sequence_size: usize,
    /// Chance that `sample()` goes the smart way once seeds are used up
    pub prob_of_smart_sampling: f64,
    /// Chance that a randomly drawn action runs without authentication
    pub no_auth_probability: f64,
    pub seed: Option<u64>,
    /// Operation signatures (`VERB:/path`) left out of the catalog
    pub endpoints_to_skip: Vec<String>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_sequence_size: 10,
            prob_of_smart_sampling: 0.5,
            no_auth_probability: 0.05,
            seed: None,
            endpoints_to_skip: Vec::new(),
        }
    }
}

impl ConfigSection for SamplingConfig {
    fn section_name() -> &'static str {
        "sampling"
    }

    fn validate(&self) -> Result<(), RestgenError> {
        if self.max_sequence_size < 1 {
            return Err(RestgenError::Configuration(
                "Max sequence size must be at least 1".to_string(),
            ));
        }
        check_probability(Self::section_name(), "prob_of_smart_sampling", self.prob_of_smart_sampling)?;
        check_probability(Self::section_name(), "no_auth_probability", self.no_auth_probability)?;
        Ok(())
    }
}
