use crate::error::RestgenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One `/`-separated element of a URL template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Literal(String),
    /// `{name}`; the name is metadata and plays no part in path relations
    Variable(String),
}

impl PathSegment {
    pub fn name(&self) -> &str {
        match self {
            PathSegment::Literal(name) | PathSegment::Variable(name) => name,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, PathSegment::Variable(_))
    }

    /// Literal matches an equal literal, variable matches any variable
    fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (PathSegment::Literal(a), PathSegment::Literal(b)) => a == b,
            (PathSegment::Variable(_), PathSegment::Variable(_)) => true,
            _ => false,
        }
    }
}

/// URL template such as `/items/{id}/tags`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    pub fn parse(path: &str) -> Result<Self, RestgenError> {
        let trimmed = path.trim();
        if !trimmed.starts_with('/') {
            return Err(RestgenError::InvalidPath(format!(
                "path must start with '/': {}",
                path
            )));
        }

        let mut segments = Vec::new();
        for token in trimmed.split('/').filter(|t| !t.is_empty()) {
            let segment = match token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
                Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    PathSegment::Variable(name.to_string())
                }
                _ if token.contains(['{', '}']) => {
                    return Err(RestgenError::InvalidPath(format!(
                        "unsupported segment '{}' in {}",
                        token, path
                    )));
                }
                _ => PathSegment::Literal(token.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn levels(&self) -> usize {
        self.segments.len()
    }

    pub fn has_variable_path_parameters(&self) -> bool {
        self.segments.iter().any(PathSegment::is_variable)
    }

    pub fn is_last_element_a_parameter(&self) -> bool {
        self.segments.last().map_or(false, PathSegment::is_variable)
    }

    pub fn last_element(&self) -> Option<&str> {
        self.segments.last().map(PathSegment::name)
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter(|s| s.is_variable())
            .map(PathSegment::name)
            .collect()
    }

    /// `self` is a structural prefix of `other` (or the same shape)
    pub fn is_ancestor_of(&self, other: &ResourcePath) -> bool {
        self.levels() <= other.levels()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(mine, theirs)| mine.matches(theirs))
    }

    /// Same shape: equal length, matching segments position by position
    pub fn is_equivalent(&self, other: &ResourcePath) -> bool {
        self.levels() == other.levels() && self.is_ancestor_of(other)
    }

    /// Key under which a creating call on this path stores its location
    pub fn creation_location_id(&self) -> String {
        self.last_element()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }

    /// Render a concrete URL, substituting variables that `lookup` knows
    pub fn resolve<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Literal(name) => format!("/{}", name),
                PathSegment::Variable(name) => match lookup(name) {
                    Some(value) => format!("/{}", value),
                    None => format!("/{{{}}}", name),
                },
            })
            .collect()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolve(|_| None))
    }
}

impl FromStr for ResourcePath {
    type Err = RestgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = RestgenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.to_string()
    }
}
