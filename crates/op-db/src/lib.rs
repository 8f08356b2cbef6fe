//! # op-db
//!
//! Persistence layer for OpenProject RS.
//!
//! The work package request handler talks to storage only through the
//! [`WorkPackageStore`] trait. Two adapters implement it:
//!
//! - [`PgWorkPackageStore`]: PostgreSQL via SQLx
//! - [`MemoryWorkPackageStore`]: in-process, for tests and database-less runs
//!
//! [`PgAttachmentStore`] and [`PgNotificationStore`] keep attachment records
//! and notifications in the same database.
//!
//! ## Example
//!
//! ```ignore
//! use op_db::{Database, DatabaseConfig, PgWorkPackageStore, WorkPackageStore};
//!
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//! let store = PgWorkPackageStore::new(db.pool().clone());
//! let work_package = store.find_work_package(1).await?;
//! ```

pub mod attachments;
pub mod memory;
pub mod notifications;
pub mod pool;
pub mod postgres;
pub mod repository;
pub mod store;

pub use attachments::PgAttachmentStore;
pub use memory::MemoryWorkPackageStore;
pub use notifications::PgNotificationStore;
pub use pool::{Database, DatabaseConfig, PoolStats};
pub use postgres::PgWorkPackageStore;
pub use repository::{RepositoryError, RepositoryResult};
pub use store::{PlanningElementScope, WorkPackageStore};

#[cfg(any(test, feature = "mocks"))]
pub use store::MockWorkPackageStore;
