//! Authentication gate: credential verification, lockout and middleware

pub mod login_guard;
pub mod middleware;
pub mod provider;

pub use login_guard::{LoginGuard, LoginGuardConfig};
pub use middleware::auth_middleware;
pub use provider::{AuthError, AuthProvider, Principal, StaticAuthProvider};
