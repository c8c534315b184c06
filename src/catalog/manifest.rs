//! JSON description of an API, as produced by schema introspection.
//!
//! ```json
//! {
//!   "endpoints": [
//!     { "verb": "POST", "path": "/items",
//!       "parameters": [ { "name": "body", "in": "body",
//!                         "gene": { "type": "object", "fields": [] } } ] },
//!     { "verb": "GET", "path": "/items/{id}" }
//!   ],
//!   "models": [
//!     { "name": "Item", "fields": [ { "name": "id", "gene": { "type": "integer" } } ] }
//!   ]
//! }
//! ```

use super::action::ActionTemplate;
use super::model::{ModelCatalog, ObjectModel};
use super::path::ResourcePath;
use super::registry::ActionCatalog;
use crate::engines::genome::{gene_tree, object_tree, param_tree, Element, Gene, GeneValue, GenomeTree};
use crate::error::{Result, RestgenError};
use crate::types::{HttpVerb, ParamLocation};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiManifest {
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub verb: HttpVerb,
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    pub gene: GeneSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub gene: GeneSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneSpec {
    String {
        #[serde(default)]
        min_length: usize,
        #[serde(default = "default_max_length")]
        max_length: usize,
    },
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Float {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Boolean,
    Enum {
        values: Vec<String>,
    },
    Object {
        #[serde(default)]
        fields: Vec<FieldSpec>,
    },
}

fn default_max_length() -> usize {
    16
}

const DEFAULT_INTEGER_RANGE: (i64, i64) = (-1_000, 1_000);
const DEFAULT_FLOAT_RANGE: (f64, f64) = (-1_000.0, 1_000.0);

impl GeneSpec {
    /// Build the gene tree this entry describes, named `name`
    pub fn build(&self, name: &str) -> Result<GenomeTree<Element>> {
        let gene = match self {
            GeneSpec::String {
                min_length,
                max_length,
            } => {
                if min_length > max_length {
                    return Err(invalid_bounds(name, min_length, max_length));
                }
                let length = (*min_length).max(3).min(*max_length);
                Gene::new(
                    name,
                    GeneValue::String {
                        value: "foo".chars().cycle().take(length).collect(),
                        min_length: *min_length,
                        max_length: *max_length,
                    },
                )
            }
            GeneSpec::Integer { min, max } => {
                let min = min.unwrap_or(DEFAULT_INTEGER_RANGE.0);
                let max = max.unwrap_or(DEFAULT_INTEGER_RANGE.1.max(min));
                if min > max {
                    return Err(invalid_bounds(name, min, max));
                }
                Gene::integer(name, min, max)
            }
            GeneSpec::Float { min, max } => {
                let min = min.unwrap_or(DEFAULT_FLOAT_RANGE.0);
                let max = max.unwrap_or(DEFAULT_FLOAT_RANGE.1.max(min));
                if min > max || min.is_nan() || max.is_nan() {
                    return Err(invalid_bounds(name, min, max));
                }
                Gene::float(name, min, max)
            }
            GeneSpec::Boolean => Gene::boolean(name),
            GeneSpec::Enum { values } => {
                if values.is_empty() {
                    return Err(RestgenError::Catalog(format!(
                        "enum {} declares no values",
                        name
                    )));
                }
                Gene::enumeration(name, values.clone())
            }
            GeneSpec::Object { fields } => {
                let fields = fields
                    .iter()
                    .map(|f| f.gene.build(&f.name))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(object_tree(name, fields));
            }
        };
        Ok(gene_tree(gene))
    }
}

fn invalid_bounds<T: std::fmt::Display>(name: &str, min: T, max: T) -> RestgenError {
    RestgenError::Catalog(format!("gene {} has min {} above max {}", name, min, max))
}

impl ApiManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl EndpointSpec {
    pub fn signature(&self) -> String {
        format!("{}:{}", self.verb, self.path)
    }

    /// Build the template; path variables with no declared parameter get a
    /// string path parameter of the same name
    pub fn build(&self) -> Result<ActionTemplate> {
        let path = ResourcePath::parse(&self.path)?;
        let mut params = Vec::with_capacity(self.parameters.len());
        for param in &self.parameters {
            params.push(param_tree(
                param.name.clone(),
                param.location,
                param.gene.build(&param.name)?,
            ));
        }

        for variable in path.variable_names() {
            let declared = self
                .parameters
                .iter()
                .any(|p| p.location == ParamLocation::Path && p.name == variable);
            if !declared {
                log::debug!("{}: adding undeclared path parameter {}", self.signature(), variable);
                params.push(param_tree(
                    variable,
                    ParamLocation::Path,
                    gene_tree(Gene::string(variable)),
                ));
            }
        }

        ActionTemplate::new(self.verb, path, params)
    }
}

impl ActionCatalog {
    /// Catalog of every endpoint of `manifest` whose signature is not in `skip`
    pub fn from_manifest(manifest: &ApiManifest, skip: &[String]) -> Result<Self> {
        let mut catalog = ActionCatalog::new();
        for endpoint in &manifest.endpoints {
            let signature = endpoint.signature();
            if skip.iter().any(|s| *s == signature) {
                log::warn!("Skipping endpoint {}", signature);
                continue;
            }
            catalog.insert(endpoint.build()?)?;
        }
        Ok(catalog)
    }
}

impl ModelCatalog {
    pub fn from_manifest(manifest: &ApiManifest) -> Result<Self> {
        let mut catalog = ModelCatalog::new();
        for model in &manifest.models {
            let fields = model
                .fields
                .iter()
                .map(|f| f.gene.build(&f.name))
                .collect::<Result<Vec<_>>>()?;
            catalog.insert(ObjectModel::new(model.name.clone(), fields)?)?;
        }
        Ok(catalog)
    }
}
