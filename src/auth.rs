//! Credential value types: tokens, user identity, and permission sets.

pub mod credential;
pub mod id;
pub mod permission;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use permission::*;
pub use secret::*;
