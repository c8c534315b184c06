pub mod binding;
pub mod field_binder;
pub mod resolver;
pub mod sampler;
pub mod sequence;

pub use binding::{Binding, BindingContext, ModelInstance};
pub use field_binder::{longest_common_substring, similarity, Candidate, FieldBinder};
pub use resolver::DependencyResolver;
pub use sampler::{SmartSampler, PUT_ALONE_PROBABILITY, REPEATED_PATCH_PROBABILITY};
pub use sequence::TestSequence;
