pub mod auth;
pub mod manager;
pub mod sampling;
pub mod traits;

pub use auth::AuthConfig;
pub use manager::{AppConfig, ConfigManager};
pub use sampling::SamplingConfig;
pub use traits::ConfigSection;
