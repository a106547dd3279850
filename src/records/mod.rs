//! Per-user record families: compliance, health, finance, training, and
//! gamification. Create appends and list filters by owner; health records
//! additionally support update and delete, finance supports delete.

pub mod compliance;
pub mod finance;
pub mod gamification;
pub mod health;
pub mod training;

use crate::store::StoreError;

/// Error shared by the record-family services.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub use compliance::{compliance_router, ComplianceKind, ComplianceRecord, ComplianceService};
pub use finance::{finance_router, FinanceService, Transaction, TransactionKind};
pub use gamification::{gamification_router, GamificationService, GamificationState};
pub use health::{health_router, HealthRecord, HealthService, HealthStatus, RecordKind};
pub use training::{training_router, ModuleProgress, TrainingService};
