pub mod config;
pub mod grant;
pub mod keyspace;
pub mod lookup;
pub mod manifest;
pub mod registry;
pub mod role;
pub mod translator;

pub use grant::{GrantConfig, GrantReconciler, GrantScope};
pub use keyspace::{KeyspaceConfig, KeyspaceReconciler};
pub use lookup::{Existence, Reconciled};
pub use registry::{Drift, Resource, ResourceKind, ResourceRegistry};
pub use role::{RoleConfig, RoleReconciler};
pub use translator::ReplicationStrategy;
