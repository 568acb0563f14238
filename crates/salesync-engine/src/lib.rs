pub mod error;
pub mod plan;
pub mod reconcile;

pub use error::EngineError;
pub use plan::{plan_product, LockWrite, ProductPlan};
pub use reconcile::{Engine, EngineSettings, ReconcileOutcome, ReconcileSummary};
