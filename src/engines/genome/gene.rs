use crate::error::{Result, RestgenError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Long strings can still come out of mutation, but sampling keeps them short
const MAX_SAMPLED_STRING_LENGTH: usize = 16;

/// Value kind of a gene, used to match parameters against model fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneKind {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
    Object,
}

impl GeneKind {
    /// Whether a value of this kind can be copied from a model field
    pub fn is_bindable(&self) -> bool {
        !matches!(self, GeneKind::Object)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneValue {
    String {
        value: String,
        min_length: usize,
        max_length: usize,
    },
    Integer {
        value: i64,
        min: i64,
        max: i64,
    },
    Float {
        value: f64,
        min: f64,
        max: f64,
    },
    Boolean(bool),
    Enum {
        options: Vec<String>,
        index: usize,
    },
    /// Fields are the child nodes of the gene in its tree
    Object,
}

/// A named, typed value in a test artefact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub name: String,
    pub value: GeneValue,
    /// Cleared when the sampler fixes a value the search must not change
    pub mutable: bool,
}

impl Gene {
    pub fn new(name: impl Into<String>, value: GeneValue) -> Self {
        Self {
            name: name.into(),
            value,
            mutable: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(
            name,
            GeneValue::String {
                value: "foo".to_string(),
                min_length: 0,
                max_length: MAX_SAMPLED_STRING_LENGTH,
            },
        )
    }

    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, GeneValue::Integer { value: min.max(0).min(max), min, max })
    }

    pub fn float(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(name, GeneValue::Float { value: min, min, max })
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, GeneValue::Boolean(false))
    }

    pub fn enumeration(name: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(name, GeneValue::Enum { options, index: 0 })
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, GeneValue::Object)
    }

    pub fn kind(&self) -> GeneKind {
        match self.value {
            GeneValue::String { .. } => GeneKind::String,
            GeneValue::Integer { .. } => GeneKind::Integer,
            GeneValue::Float { .. } => GeneKind::Float,
            GeneValue::Boolean(_) => GeneKind::Boolean,
            GeneValue::Enum { .. } => GeneKind::Enum,
            GeneValue::Object => GeneKind::Object,
        }
    }

    /// Draw a new value within the gene's constraints. Object genes hold no
    /// value of their own; their fields are randomized as separate nodes.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        match &mut self.value {
            GeneValue::String {
                value,
                min_length,
                max_length,
            } => {
                let upper = (*max_length).min(MAX_SAMPLED_STRING_LENGTH).max(*min_length);
                let length = rng.gen_range(*min_length..=upper);
                *value = (0..length)
                    .map(|_| char::from(rng.sample(Alphanumeric)))
                    .collect();
            }
            GeneValue::Integer { value, min, max } => {
                *value = rng.gen_range(*min..=*max);
            }
            GeneValue::Float { value, min, max } => {
                *value = if min < max { rng.gen_range(*min..*max) } else { *min };
            }
            GeneValue::Boolean(value) => {
                *value = rng.gen_bool(0.5);
            }
            GeneValue::Enum { options, index } => {
                if !options.is_empty() {
                    *index = rng.gen_range(0..options.len());
                }
            }
            GeneValue::Object => {}
        }
    }

    /// Take over the concrete value of `other`, keeping own name and bounds
    pub fn copy_value_from(&mut self, other: &Gene) -> Result<()> {
        let (from, into) = (other.kind(), self.kind());
        let name = &self.name;
        match (&mut self.value, &other.value) {
            (GeneValue::String { value, .. }, GeneValue::String { value: v, .. }) => {
                *value = v.clone();
            }
            (GeneValue::Integer { value, .. }, GeneValue::Integer { value: v, .. }) => {
                *value = *v;
            }
            (GeneValue::Float { value, .. }, GeneValue::Float { value: v, .. }) => {
                *value = *v;
            }
            (GeneValue::Boolean(value), GeneValue::Boolean(v)) => {
                *value = *v;
            }
            (GeneValue::Enum { options, index }, GeneValue::Enum { .. }) => {
                let label = other.raw_value();
                *index = options.iter().position(|o| *o == label).ok_or_else(|| {
                    RestgenError::InvalidArgument(format!(
                        "enum gene {} has no option {}",
                        name, label
                    ))
                })?;
            }
            (GeneValue::Object, GeneValue::Object) => {}
            _ => {
                return Err(RestgenError::InvalidArgument(format!(
                    "cannot copy a {:?} value into {:?} gene {}",
                    from, into, name
                )));
            }
        }
        Ok(())
    }

    /// Whether any value `other` can hold is also valid here: same kind,
    /// and for enums every option of `other` is one of ours
    pub fn accepts_values_of(&self, other: &Gene) -> bool {
        match (&self.value, &other.value) {
            (GeneValue::Enum { options, .. }, GeneValue::Enum { options: theirs, .. }) => {
                !theirs.is_empty() && theirs.iter().all(|o| options.contains(o))
            }
            _ => self.kind() == other.kind(),
        }
    }

    /// Parse `raw` into this gene's kind, keeping name and bounds
    pub fn set_raw_value(&mut self, raw: &str) -> Result<()> {
        let invalid = |name: &str, kind: GeneKind| {
            RestgenError::InvalidArgument(format!("'{}' is not a {:?} value for gene {}", raw, kind, name))
        };
        let kind = self.kind();
        match &mut self.value {
            GeneValue::String { value, .. } => *value = raw.to_string(),
            GeneValue::Integer { value, .. } => {
                *value = raw.parse().map_err(|_| invalid(&self.name, kind))?;
            }
            GeneValue::Float { value, .. } => {
                *value = raw.parse().map_err(|_| invalid(&self.name, kind))?;
            }
            GeneValue::Boolean(value) => {
                *value = raw.parse().map_err(|_| invalid(&self.name, kind))?;
            }
            GeneValue::Enum { options, index } => {
                *index = options
                    .iter()
                    .position(|o| o == raw)
                    .ok_or_else(|| invalid(&self.name, kind))?;
            }
            GeneValue::Object => return Err(invalid(&self.name, kind)),
        }
        Ok(())
    }

    pub fn raw_value(&self) -> String {
        match &self.value {
            GeneValue::String { value, .. } => value.clone(),
            GeneValue::Integer { value, .. } => value.to_string(),
            GeneValue::Float { value, .. } => value.to_string(),
            GeneValue::Boolean(value) => value.to_string(),
            GeneValue::Enum { options, index } => options.get(*index).cloned().unwrap_or_default(),
            GeneValue::Object => String::new(),
        }
    }
}
