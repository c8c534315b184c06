use super::traits::ConfigSection;
use crate::catalog::{AuthenticationHeader, AuthenticationInfo};
use crate::error::RestgenError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Users the sampler may act as, each a named set of headers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub users: Vec<AuthenticationInfo>,
}

impl AuthConfig {
    /// Usable users. Entries with a blank name, and headers with a blank
    /// name or value, are dropped with a warning.
    pub fn contexts(&self) -> Vec<AuthenticationInfo> {
        let mut contexts = Vec::with_capacity(self.users.len());
        for user in &self.users {
            if user.name.trim().is_empty() {
                log::warn!("Skipping authentication entry with a blank name");
                continue;
            }
            let headers: Vec<AuthenticationHeader> = user
                .headers
                .iter()
                .filter(|h| {
                    let usable = !h.name.trim().is_empty() && !h.value.trim().is_empty();
                    if !usable {
                        log::warn!("Skipping blank authentication header of user {}", user.name);
                    }
                    usable
                })
                .cloned()
                .collect();
            contexts.push(AuthenticationInfo {
                name: user.name.clone(),
                headers,
            });
        }
        contexts
    }
}

impl ConfigSection for AuthConfig {
    fn section_name() -> &'static str {
        "auth"
    }

    fn validate(&self) -> Result<(), RestgenError> {
        let mut seen = HashSet::new();
        for user in &self.users {
            let name = user.name.trim();
            if !name.is_empty() && !seen.insert(name) {
                return Err(RestgenError::Configuration(format!(
                    "Authentication user {} is declared twice",
                    name
                )));
            }
        }
        Ok(())
    }
}
