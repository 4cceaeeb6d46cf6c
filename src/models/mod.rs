//! Domain models for users and roles.

pub mod role;
pub mod user;

pub use role::RoleName;
pub use user::User;
