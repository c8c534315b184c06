//! Sampling of REST API test sequences for search-based test generation.
//!
//! Operation templates and object models come in through [`catalog`];
//! [`engines::sampling::SmartSampler`] turns them into [`TestSequence`]s
//! whose creating calls are resolved and whose parameters are bound to
//! model fields. Every artefact is a [`engines::genome::GenomeTree`], so a
//! search engine can copy trees and map nodes between copies.

pub mod catalog;
pub mod config;
pub mod engines;
pub mod error;
pub mod types;

pub use catalog::{ActionCatalog, ApiManifest, ModelCatalog};
pub use config::{AppConfig, ConfigManager, SamplingConfig};
pub use engines::sampling::{SmartSampler, TestSequence};
pub use error::{RestgenError, Result};
pub use types::{HttpVerb, ParamLocation, SampleType};
