pub mod genome;
pub mod sampling;
