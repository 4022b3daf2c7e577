/// Library crate entry point.
/// Exposes the reconciliation engine and its backends for integration tests.
/// Production binary uses src/main.rs.

pub mod allocator;
pub mod applicant;
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod eviction;
pub mod gateway;
pub mod metrics;
pub mod reconcile;
pub mod store;
pub mod subject;

pub use allocator::SlotAllocator;
pub use applicant::DeniedApplicant;
pub use error::{ReconcileError, ReconcileResult};
pub use reconcile::Reconciler;
pub use subject::Subject;
