use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationHeader {
    pub name: String,
    pub value: String,
}

/// A named set of headers identifying one user of the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationInfo {
    pub name: String,
    #[serde(default)]
    pub headers: Vec<AuthenticationHeader>,
}

/// Authentication attached to a bound action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    NoAuth,
    User(AuthenticationInfo),
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthContext::NoAuth => f.write_str("no-auth"),
            AuthContext::User(info) => f.write_str(&info.name),
        }
    }
}
