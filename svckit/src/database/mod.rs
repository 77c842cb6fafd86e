pub mod factory;
pub mod gateway;
pub mod scylla;

pub use self::factory::{DatabaseDriver, DatabaseFactory};
pub use self::gateway::SessionGateway;
pub use self::scylla::ScyllaConnection;
