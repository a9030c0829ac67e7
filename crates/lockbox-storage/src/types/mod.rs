//! Type definitions for lockbox storage.

mod category_shares;
mod credentials;
mod groups;
mod ids;
mod roles;

// Re-export all types from submodules
pub use category_shares::*;
pub use credentials::*;
pub use groups::*;
pub use ids::*;
pub use roles::*;
