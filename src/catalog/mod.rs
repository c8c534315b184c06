pub mod action;
pub mod auth;
pub mod manifest;
pub mod model;
pub mod path;
pub mod registry;

pub use action::{ActionHeader, ActionId, ActionTemplate, BoundAction};
pub use auth::{AuthContext, AuthenticationHeader, AuthenticationInfo};
pub use manifest::ApiManifest;
pub use model::{ModelCatalog, ObjectModel};
pub use path::{PathSegment, ResourcePath};
pub use registry::ActionCatalog;
