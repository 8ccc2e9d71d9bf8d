//! Infrastructure layer: stores (in-memory and Postgres), schema bootstrap and
//! the services that compose them.

pub mod audit_recorder;
pub mod catalog;
pub mod coordinator;
pub mod credentials;
pub mod schema;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use audit_recorder::AuditRecorder;
pub use catalog::{CatalogError, PartCatalog};
pub use coordinator::{MovementError, StockMutationCoordinator};
pub use credentials::{CredentialError, CredentialVerifier};
pub use schema::{ensure_schema, seed_demo_data, DemoUser, DEMO_USERS};
pub use store::{
    AuditStore, InMemoryStore, InventoryStore, NewUser, PostgresStore, StoreError, UserStore,
};
