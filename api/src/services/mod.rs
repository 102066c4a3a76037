//! In-memory services backing the scoped routes

pub mod password;
pub mod providers;
pub mod tokens;
pub mod usage;
pub mod users;

pub use password::PasswordPolicy;
pub use providers::{LlmProvider, ProviderStore};
pub use tokens::{TokenKind, TokenPair, TokenService};
pub use usage::UsageMeter;
pub use users::{User, UserStore};
