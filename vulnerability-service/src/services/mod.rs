pub mod database;
pub mod jwt;
pub mod memory;
pub mod metrics;
mod store;

pub use database::Database;
pub use jwt::{TokenVerifier, UserClaims};
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::VulnerabilityStore;
