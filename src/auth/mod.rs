//! Authentication: register, login, JWT, role bootstrap.

mod jwt;
mod handlers;
mod password;
mod service;

pub use handlers::{login, me, register, AuthResponse};
pub use jwt::{Claims, JwtSecret, TokenIdentity};
pub use service::{AuthOutcome, AuthService, NewUser};
